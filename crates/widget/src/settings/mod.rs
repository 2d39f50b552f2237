pub mod state;

pub use state::{SettingsError, SettingsOrigin, SettingsStore, WidgetSettings};
