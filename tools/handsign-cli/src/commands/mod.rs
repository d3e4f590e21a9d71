pub mod config;
pub mod inspect;
pub mod list;
pub mod lookup;
pub mod replay;
pub mod search;
pub mod voices;

use handsign_common::config::AppConfig;
use handsign_sign_model::dictionary::SignDictionary;
use handsign_sign_model::sign::SignEntry;

/// The configured dictionary, or the built-in one.
pub fn load_dictionary(config: &AppConfig) -> anyhow::Result<SignDictionary> {
    let dictionary = match &config.dictionary {
        Some(path) => SignDictionary::load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load dictionary {}: {e}", path.display()))?,
        None => SignDictionary::builtin()
            .map_err(|e| anyhow::anyhow!("Built-in dictionary is invalid: {e}"))?,
    };
    Ok(dictionary)
}

/// One-line listing used by `list` and `search`.
pub fn entry_line(entry: &SignEntry) -> String {
    format!(
        "  {:<10} {:<10} {:<9} {}",
        entry.id, entry.name, entry.category, entry.description
    )
}
