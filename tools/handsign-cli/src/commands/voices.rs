//! List synthesizer voices.

use handsign_common::config::AppConfig;
use handsign_translator::speech::{CommandSynthesizer, SpeechSynthesizer};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let synthesizer = CommandSynthesizer::from_config(&config.speech);
    let voices = synthesizer.voices()?;

    println!("Voices from {} ({}):", synthesizer.program(), voices.len());
    for voice in &voices {
        println!("  {:<12} {}", voice.language, voice.name);
    }
    if let Some(selected) = &config.speech.voice {
        if !voices.iter().any(|v| v.matches(selected)) {
            println!();
            println!("[WARN] Configured voice '{selected}' is not available");
        }
    }
    Ok(())
}
