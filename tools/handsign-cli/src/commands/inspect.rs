//! Show what the recognizer sees in each frame of a recording.

use std::path::PathBuf;

use handsign_common::clock::SessionClock;
use handsign_common::config::AppConfig;
use handsign_recognition_core::{
    normalize, FeatureExtractor, FingerCountClassifier, HandClassifier, SimilarityMatcher,
};
use handsign_sign_model::landmark::parse_frame_line;

use super::load_dictionary;

pub fn run(config: &AppConfig, input: PathBuf, show_features: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&input)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", input.display()))?;
    let dictionary = load_dictionary(config)?;
    let extractor = FeatureExtractor::new();
    let matcher = SimilarityMatcher::new(config.recognition.confidence_threshold);
    let fingers = FingerCountClassifier::new();

    println!("Inspecting: {}", input.display());
    println!(
        "Dictionary v{} ({} signs), threshold {:.2}",
        dictionary.version(),
        dictionary.len(),
        matcher.threshold()
    );
    println!();

    let mut frames = 0usize;
    let mut malformed = 0usize;
    for (index, line) in content.lines().enumerate() {
        let frame = match parse_frame_line(line) {
            None => continue,
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                malformed += 1;
                println!("line {:>4}: [ERROR] {e}", index + 1);
                continue;
            }
        };
        frames += 1;

        let time = frame
            .timestamp_ns
            .map(|t| format!("{:>9.3}s", SessionClock::ns_to_ms(t) / 1000.0))
            .unwrap_or_else(|| "        -".to_string());
        let Some(hand) = frame.hands.first_hand() else {
            println!("line {:>4} {time}: no hands", index + 1);
            continue;
        };

        let bounds = match hand.bounding_box() {
            Some(b) => format!(
                "box ({:.2},{:.2}) {:.2}x{:.2}{}",
                b.x,
                b.y,
                b.width,
                b.height,
                if hand.is_in_frame() { "" } else { " [out of frame]" }
            ),
            None => "no box".to_string(),
        };

        let Some(features) = extractor.extract(hand).map(|f| normalize(&f)) else {
            println!(
                "line {:>4} {time}: {} hand(s), {bounds}, malformed ({} points)",
                index + 1,
                frame.hands.hand_count(),
                hand.len()
            );
            continue;
        };

        let best = match matcher.best_scored(&features, &dictionary) {
            Some((entry, score)) => format!(
                "best {} {:.3}{}",
                entry.id,
                score,
                if score > matcher.threshold() { "" } else { " (below threshold)" }
            ),
            None => "no match".to_string(),
        };
        let counted = fingers
            .classify(hand)
            .map_or_else(|| "-".to_string(), |c| c.sign_id);
        println!(
            "line {:>4} {time}: {} hand(s), {bounds}, {best}, fingers {counted}",
            index + 1,
            frame.hands.hand_count()
        );

        if show_features {
            let values: Vec<String> = features.values().iter().map(|v| format!("{v:.3}")).collect();
            println!("           features [{}]", values.join(", "));
        }
    }

    println!();
    println!("{frames} frame(s), {malformed} malformed line(s)");
    Ok(())
}
