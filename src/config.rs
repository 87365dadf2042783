//! Configuration file handling for the expense tracker.
//!
//! The configuration file is stored at `$EXPENSES_HOME/config.json` and contains the settings
//! for the classification service and the per-category budget limits.

use crate::summary::Budgets;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use url::Url;

const APP_NAME: &str = "expenses";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const STORE: &str = "store";
const API_KEY: &str = "api_key";
const CONFIG_JSON: &str = "config.json";
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable that holds the classifier credential. Takes precedence over the
/// `api_key_path` file.
pub const API_KEY_ENV: &str = "EXPENSES_API_KEY";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSES_HOME` and from there it loads `$EXPENSES_HOME/config.json`. It provides
/// paths to other items that are expected in a certain location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    store: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory, its subdirectories and an initial `config.json` file with
    /// default settings. An existing `config.json` is left alone and loaded instead.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/expenses`
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expenses home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        utils::make_dir(root.join(STORE)).await?;
        utils::make_dir(root.join(SECRETS)).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.is_file() {
            debug!(
                "A config file already exists at {}, keeping it",
                config_path.display()
            );
        } else {
            ConfigFile::default().save(&config_path).await?;
        }
        Self::load(root).await
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - validate that the store and secrets directories exist
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The expenses home directory is missing, run 'expenses init'")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            store: root.join(STORE),
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
        };
        if !config.store.is_dir() {
            bail!(
                "The store directory is missing '{}'",
                config.store.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The directory that the `FileStore` keeps its values in.
    pub fn store(&self) -> &Path {
        &self.store
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn classifier(&self) -> &ClassifierSettings {
        &self.config_file.classifier
    }

    pub fn budgets(&self) -> &Budgets {
        &self.config_file.budgets
    }

    /// Returns the stored `api_key_path` if it is absolute, otherwise resolves the relative path.
    pub fn api_key_path(&self) -> PathBuf {
        let p = self.config_file.api_key_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Looks up the classifier credential: `EXPENSES_API_KEY` first, then the contents of the
    /// file at `api_key_path`. `None` if neither is present.
    pub async fn api_key(&self) -> Option<String> {
        self.resolve_api_key(std::env::var(API_KEY_ENV).ok()).await
    }

    /// `api_key` with the environment value passed in.
    async fn resolve_api_key(&self, from_env: Option<String>) -> Option<String> {
        if let Some(key) = from_env
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            trace!("Using the classifier credential from {API_KEY_ENV}");
            return Some(key);
        }
        let path = self.api_key_path();
        if !path.is_file() {
            debug!("No classifier credential found at {}", path.display());
            return None;
        }
        match utils::read(&path).await {
            Ok(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                debug!("{e:#}");
                None
            }
        }
    }
}

/// Settings for the remote classification service.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ClassifierSettings {
    /// The chat completions URL.
    endpoint: String,

    /// The model name sent with each request.
    model: String,

    /// How long to wait for a reply before falling back to `Other`.
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClassifierSettings {
    /// Parses the configured endpoint.
    pub fn endpoint(&self) -> Result<Url> {
        Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid classifier endpoint '{}'", self.endpoint))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expenses",
///   "config_version": 1,
///   "classifier": {
///     "endpoint": "https://api.openai.com/v1/chat/completions",
///     "model": "gpt-3.5-turbo",
///     "timeout_secs": 30
///   },
///   "budgets": {
///     "Food": "200",
///     "Transport": "100"
///   },
///   "api_key_path": ".secrets/api_key"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expenses"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// How to reach the classification service
    #[serde(default)]
    classifier: ClassifierSettings,

    /// Spending limits per category
    #[serde(default)]
    budgets: Budgets,

    /// Path to the file holding the classifier credential (optional, relative to the home
    /// directory or absolute). Defaults to $EXPENSES_HOME/.secrets/api_key if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            classifier: ClassifierSettings::default(),
            budgets: Budgets::default(),
            api_key_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        let _ = config.classifier.endpoint()?;

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the credential path. Relative paths are relative to the home directory.
    fn api_key_path(&self) -> PathBuf {
        self.api_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(API_KEY))
    }
}
