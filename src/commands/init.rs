use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and an initial `config.json` file with default
/// settings.
///
/// # Arguments
/// - `expenses_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/expenses`
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(expenses_home: &Path) -> Result<Out<()>> {
    let config = Config::create(expenses_home)
        .await
        .context("Unable to create the data directory and configs")?;
    let mut message = format!(
        "Successfully created the expenses directory at {}",
        config.root().display()
    );
    if config.api_key().await.is_none() {
        message.push_str(&format!(
            "\nNo classifier credential was found. Set {} or write it to {} so that new expenses \
            can be categorized.",
            crate::config::API_KEY_ENV,
            config.api_key_path().display()
        ));
    }
    Ok(message.into())
}
