use std::sync::Arc;

use parley::ChatWidget;
use parley::chat::Message;
use parley::input::next_input_line;
use parley::settings::{SettingsOrigin, SettingsStore};
use parley_storage::{JsonFileStore, KeyValueStore, MemoryStore};
use tokio::io::BufReader;

/// Terminal host for the chat widget.
///
/// Every stdin line is submitted as a message; replies are printed as they settle.
/// History and session id persist in the profile file between runs.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(error) = run().await {
        tracing::error!("parley exited with error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings_store = SettingsStore::open_default();
    let settings = settings_store.settings();
    if settings_store.origin() == SettingsOrigin::Defaults && !settings.is_configured() {
        match settings_store.write_template() {
            Ok(true) => tracing::info!(
                path = ?settings_store.path(),
                "wrote settings template; set webhook_url to connect"
            ),
            Ok(false) => {}
            Err(error) => tracing::warn!("could not write settings template: {error}"),
        }
    }

    let profile_path = settings.resolved_profile_path();
    let storage: Arc<dyn KeyValueStore> = match JsonFileStore::open(&profile_path) {
        Ok(store) => Arc::new(store),
        Err(error) => {
            tracing::warn!(
                "profile store unavailable at {:?}, history will not survive restart: {}",
                profile_path,
                error
            );
            Arc::new(MemoryStore::new())
        }
    };

    let mut widget = ChatWidget::mount(settings, storage)?;
    widget.open();
    tracing::info!(session_id = widget.session_id(), "chat widget mounted");

    for message in widget.history() {
        print_message(message);
    }

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut line_buffer = Vec::new();
    let mut stdin_open = true;

    while stdin_open || widget.pending_count() > 0 {
        tokio::select! {
            line = next_input_line(&mut stdin, &mut line_buffer), if stdin_open => match line {
                Ok(Some(line)) => {
                    widget.set_input(line);
                    if widget.submit().is_none() {
                        widget.set_input(String::new());
                    }
                }
                Ok(None) => stdin_open = false,
                Err(error) => {
                    tracing::warn!("stopped reading input: {error}");
                    stdin_open = false;
                }
            },
            settled = widget.next_reply(), if widget.pending_count() > 0 => {
                if settled.is_some()
                    && let Some(reply) = widget.history().last()
                {
                    print_message(reply);
                }
            }
        }
    }

    Ok(())
}

fn print_message(message: &Message) {
    let label = match message.role() {
        parley::chat::Role::User => "you",
        parley::chat::Role::Assistant => "ai",
    };
    for block in message.blocks() {
        println!("{label}> {block}");
    }
}
