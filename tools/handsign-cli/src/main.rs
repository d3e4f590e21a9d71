//! handsign CLI: replay landmark recordings and browse the sign dictionary.
//!
//! Usage:
//!   handsign replay <FILE|->       Translate recorded frames into text
//!   handsign inspect <FILE>        Show per-frame features and best matches
//!   handsign lookup <ID>           Show one dictionary entry
//!   handsign search <QUERY>        Search sign descriptions
//!   handsign list                  List dictionary entries
//!   handsign voices                List speech synthesizer voices
//!   handsign config [--write]      Show or save the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use handsign_common::config::{AppConfig, RecognizerKind, RepeatPolicy};
use handsign_sign_model::sign::SignCategory;

mod commands;

#[derive(Parser)]
#[command(
    name = "handsign",
    about = "Sign language to text from hand landmark streams",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/handsign/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Custom sign dictionary (JSON)
    #[arg(long, global = true)]
    dictionary: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a JSONL landmark recording into text
    Replay {
        /// Recording path, or `-` for stdin
        input: PathBuf,

        /// Write translator events to this JSONL file
        #[arg(long)]
        events: Option<PathBuf>,

        /// Speak the transcript when the replay ends
        #[arg(long)]
        speak: bool,

        /// Voice name or language tag for speech
        #[arg(long)]
        voice: Option<String>,

        /// Minimum confidence a sign must exceed
        #[arg(long)]
        threshold: Option<f64>,

        /// Voting window size in frames
        #[arg(long)]
        window: Option<usize>,

        /// Minimum time between confirmed signs (milliseconds)
        #[arg(long)]
        cooldown_ms: Option<u64>,

        /// Per-hand recognizer: similarity or finger_count
        #[arg(long)]
        recognizer: Option<RecognizerKind>,

        /// Suppress repeats of the previous sign, or of any earlier sign
        #[arg(long)]
        repeat_policy: Option<RepeatPolicy>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show per-frame features, hand bounds, and the best dictionary match
    Inspect {
        /// Recording path
        input: PathBuf,

        /// Print the full normalized feature vector
        #[arg(long)]
        features: bool,
    },

    /// Show a dictionary entry by id
    Lookup {
        /// Sign id, e.g. `A` or `THANK_YOU`
        id: String,
    },

    /// Case-insensitive search over sign descriptions
    Search {
        /// Text to look for
        query: String,
    },

    /// List dictionary entries
    List {
        /// Only this category: alphabet, words, or numbers
        #[arg(long)]
        category: Option<SignCategory>,
    },

    /// List voices offered by the speech synthesizer
    Voices,

    /// Print the effective configuration as JSON
    Config {
        /// Save it to --config, or the standard location
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.dictionary.is_some() {
        config.dictionary = cli.dictionary.clone();
    }

    handsign_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Replay {
            input,
            events,
            speak,
            voice,
            threshold,
            window,
            cooldown_ms,
            recognizer,
            repeat_policy,
            json,
        } => {
            if let Some(threshold) = threshold {
                config.recognition.confidence_threshold = threshold;
            }
            if let Some(window) = window {
                config.recognition.buffer_size = window;
            }
            if let Some(cooldown_ms) = cooldown_ms {
                config.recognition.cooldown_ms = cooldown_ms;
            }
            if let Some(recognizer) = recognizer {
                config.recognition.recognizer = recognizer;
            }
            if let Some(repeat_policy) = repeat_policy {
                config.recognition.repeat_policy = repeat_policy;
            }
            config.recognition.validate()?;

            commands::replay::run(
                &config,
                commands::replay::ReplayOptions {
                    input,
                    events,
                    speak,
                    voice,
                    json,
                },
            )
            .await
        }
        Commands::Inspect { input, features } => commands::inspect::run(&config, input, features),
        Commands::Lookup { id } => commands::lookup::run(&config, &id),
        Commands::Search { query } => commands::search::run(&config, &query),
        Commands::List { category } => commands::list::run(&config, category),
        Commands::Voices => commands::voices::run(&config),
        Commands::Config { write } => commands::config::run(&config, cli.config.as_deref(), write),
    }
}
