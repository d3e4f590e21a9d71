//! Show one dictionary entry.

use handsign_common::config::AppConfig;

use super::load_dictionary;

pub fn run(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    let dictionary = load_dictionary(config)?;
    let entry = dictionary
        .get(id)
        .or_else(|| dictionary.get(&id.to_uppercase()))
        .ok_or_else(|| anyhow::anyhow!("No sign with id '{id}'"))?;

    println!("Sign: {}", entry.id);
    println!("  Name: {}", entry.name);
    println!("  Category: {}", entry.category);
    println!("  Description: {}", entry.description);
    println!("  Baseline confidence: {:.2}", entry.baseline_confidence);
    if entry.reference_pattern.is_empty() {
        println!("  Reference pattern: none (never matched)");
    } else {
        println!("  Reference pattern:");
        for (x, y) in &entry.reference_pattern {
            println!("    ({x:.3}, {y:.3})");
        }
    }

    Ok(())
}
