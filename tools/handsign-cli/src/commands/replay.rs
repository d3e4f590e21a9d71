//! Translate a landmark recording into text.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use handsign_common::clock::SessionClock;
use handsign_common::config::AppConfig;
use handsign_recognition_core::{SessionConfig, TranslationSession};
use handsign_translator::{
    BackgroundSource, CommandSynthesizer, EventLogHeader, EventWriter, JsonlSource, LandmarkSource, StampedEvent,
    Translator, TranslatorEvent,
};
use tokio::sync::mpsc::UnboundedReceiver;

use super::load_dictionary;

pub struct ReplayOptions {
    pub input: PathBuf,
    pub events: Option<PathBuf>,
    pub speak: bool,
    pub voice: Option<String>,
    pub json: bool,
}

pub async fn run(config: &AppConfig, options: ReplayOptions) -> anyhow::Result<()> {
    let dictionary = Arc::new(load_dictionary(config)?);
    let dictionary_version = dictionary.version().to_string();

    // A stalled pipe must not block the run loop, or Ctrl+C goes unnoticed.
    let source: Box<dyn LandmarkSource> = if options.input == Path::new("-") {
        Box::new(BackgroundSource::new(Box::new(JsonlSource::stdin())))
    } else {
        Box::new(JsonlSource::from_path(options.input.clone()))
    };
    let source_name = source.name().to_string();

    let session = TranslationSession::new(dictionary, SessionConfig::from(&config.recognition));
    let mut translator = Translator::new(source, session, config.speech.clone());
    if options.speak || options.voice.is_some() {
        translator = translator.with_synthesizer(Box::new(CommandSynthesizer::from_config(
            &config.speech,
        )));
    }
    if let Some(voice) = &options.voice {
        let selected = translator.select_voice(voice)?;
        tracing::info!(voice = %selected.name, language = %selected.language, "Using voice");
    }

    let writer = match &options.events {
        Some(path) => {
            let header = EventLogHeader::new(
                SessionClock::start().epoch_wall(),
                dictionary_version,
                source_name.clone(),
            );
            Some(EventWriter::new(path.clone(), &header)?)
        }
        None => None,
    };
    let consumer = tokio::spawn(consume_events(translator.subscribe(), writer, !options.json));

    let stop_flag = translator.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop_flag.store(true, Ordering::SeqCst);
        }
    });

    if !options.json {
        println!("Replaying frames from: {source_name}");
        println!();
    }

    let summary = translator.run().await?;
    if options.speak && !translator.speak()? {
        println!("Nothing to speak.");
    }

    // Dropping the translator closes the event channel.
    drop(translator);
    let written = consumer.await??;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("Frames: {} ({} with hands)", summary.frames, summary.hands_seen);
    println!("Signs confirmed: {}", summary.confirmed);
    println!("Transcript: {}", summary.transcript.trim_end());
    if let Some(path) = &options.events {
        println!("Events written to: {} ({written} events)", path.display());
    }

    Ok(())
}

/// Print detections as they arrive and log every event. Returns the
/// number of events written.
async fn consume_events(
    mut rx: UnboundedReceiver<StampedEvent>,
    mut writer: Option<EventWriter>,
    print: bool,
) -> anyhow::Result<u64> {
    while let Some(stamped) = rx.recv().await {
        if let Some(writer) = writer.as_mut() {
            writer.write_event(&stamped)?;
        }
        if !print {
            continue;
        }
        match &stamped.event {
            TranslatorEvent::SignDetected {
                name,
                sign_id,
                confidence,
                transcript,
            } => println!(
                "  [{:>9.3}s] {name} ({sign_id}, confidence {confidence:.2}) -> \"{transcript}\"",
                SessionClock::ns_to_ms(stamped.t) / 1000.0
            ),
            TranslatorEvent::Error { message } => println!("  [WARN] {message}"),
            TranslatorEvent::Speaking { text } => println!("  Speaking: {text}"),
            _ => {}
        }
    }

    match writer {
        Some(mut writer) => {
            writer.flush()?;
            Ok(writer.events_written())
        }
        None => Ok(0),
    }
}
