//! Search sign descriptions.

use handsign_common::config::AppConfig;

use super::{entry_line, load_dictionary};

pub fn run(config: &AppConfig, query: &str) -> anyhow::Result<()> {
    let dictionary = load_dictionary(config)?;
    let hits = dictionary.search_description(query);

    if hits.is_empty() {
        println!("No signs match \"{query}\".");
        return Ok(());
    }

    println!("{} sign(s) match \"{query}\":", hits.len());
    for entry in hits {
        println!("{}", entry_line(entry));
    }
    Ok(())
}
