//! List dictionary entries.

use handsign_common::config::AppConfig;
use handsign_sign_model::sign::SignCategory;

use super::{entry_line, load_dictionary};

pub fn run(config: &AppConfig, category: Option<SignCategory>) -> anyhow::Result<()> {
    let dictionary = load_dictionary(config)?;
    println!(
        "Sign dictionary v{} ({} signs)",
        dictionary.version(),
        dictionary.len()
    );

    let categories = match category {
        Some(category) => vec![category],
        None => SignCategory::ALL.to_vec(),
    };

    for category in categories {
        let entries: Vec<_> = dictionary.category(category).collect();
        println!();
        println!("{category} ({}):", entries.len());
        for entry in entries {
            println!("{}", entry_line(entry));
        }
    }
    Ok(())
}
