use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use parley_storage::{StorageError, write_json_atomically};
use parley_webhook::WebhookConfig;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

pub const SETTINGS_DIRECTORY_NAME: &str = "parley";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const PROFILE_FILE_NAME: &str = "profile.json";
/// Environment variables with this prefix override the settings file.
pub const ENV_PREFIX: &str = "PARLEY_";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSettings {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub api_key: String,
    /// `None` or `0` disables the request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<PathBuf>,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            profile_path: None,
        }
    }
}

impl WidgetSettings {
    pub fn is_configured(&self) -> bool {
        !self.webhook_url.trim().is_empty()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn to_webhook_config(&self) -> WebhookConfig {
        let config = WebhookConfig::new(&self.webhook_url, Some(self.api_key.clone()));
        match self.request_timeout() {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }

    /// Location of the durable profile store holding session id and history.
    pub fn resolved_profile_path(&self) -> PathBuf {
        self.profile_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
                .unwrap_or_else(|| PathBuf::from(".parley"))
                .join(PROFILE_FILE_NAME)
        })
    }

    pub fn normalized(mut self) -> Self {
        self.webhook_url = self.webhook_url.trim().to_string();
        self.api_key = self.api_key.trim().to_string();
        self.profile_path = self
            .profile_path
            .filter(|path| !path.as_os_str().is_empty());
        self
    }
}

/// Which layers produced the effective settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOrigin {
    /// No settings file; defaults plus environment.
    Defaults,
    File,
    /// The file could not be used; defaults plus environment were applied instead.
    Fallback,
}

/// Read-only view of the host configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings: WidgetSettings,
    origin: SettingsOrigin,
    path: PathBuf,
}

impl SettingsStore {
    /// `<config dir>/parley/settings.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_DIRECTORY_NAME)
            .join(SETTINGS_FILE_NAME)
    }

    pub fn open_default() -> Self {
        Self::open(Self::default_path())
    }

    /// Resolves defaults, then the JSON file at `path` if present, then `PARLEY_*` variables.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_present = path.is_file();

        let resolved = layers(file_present.then_some(path.as_path())).extract::<WidgetSettings>();
        let (settings, origin) = match resolved {
            Ok(settings) if file_present => (settings, SettingsOrigin::File),
            Ok(settings) => (settings, SettingsOrigin::Defaults),
            Err(error) => {
                tracing::warn!(
                    path = ?path,
                    error = %error,
                    "settings file unusable, continuing with defaults and environment"
                );
                let settings = layers(None).extract::<WidgetSettings>().unwrap_or_else(|error| {
                    tracing::warn!(error = %error, "environment overrides rejected");
                    WidgetSettings::default()
                });
                (settings, SettingsOrigin::Fallback)
            }
        };

        tracing::debug!(
            path = ?path,
            ?origin,
            configured = settings.is_configured(),
            "settings resolved"
        );
        Self {
            settings: settings.normalized(),
            origin,
            path,
        }
    }

    pub fn settings(&self) -> &WidgetSettings {
        &self.settings
    }

    pub fn origin(&self) -> SettingsOrigin {
        self.origin
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a settings file holding the defaults, unless one already exists.
    ///
    /// Returns whether a file was written. Environment overrides never reach
    /// the template, so secrets passed through `PARLEY_API_KEY` stay off disk.
    pub fn write_template(&self) -> Result<bool, SettingsError> {
        if self.path.exists() {
            return Ok(false);
        }

        write_json_atomically(&self.path, &WidgetSettings::default()).context(
            WriteTemplateSnafu {
                stage: "write-settings-template",
                path: self.path.clone(),
            },
        )?;
        Ok(true)
    }
}

fn layers(file: Option<&Path>) -> Figment {
    let figment = Figment::from(Serialized::defaults(WidgetSettings::default()));
    let figment = match file {
        Some(path) => figment.merge(Json::file(path)),
        None => figment,
    };
    figment.merge(Env::prefixed(ENV_PREFIX))
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("could not write settings template {path:?} on `{stage}`: {source}"))]
    WriteTemplate {
        stage: &'static str,
        path: PathBuf,
        source: StorageError,
    },
}

fn default_request_timeout_secs() -> Option<u64> {
    Some(DEFAULT_REQUEST_TIMEOUT_SECS)
}
