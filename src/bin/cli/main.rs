mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "contextvocab-cli", about = "Review vocabulary in the sentences you found it in", version)]
struct Cli {
    /// Data directory (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config.toml into the data directory
    Init,

    /// Capture a word in the sentence it appeared in
    Capture {
        /// The word being learned
        word: String,
        /// Sentence containing the word
        #[arg(long)]
        sentence: String,
        /// Meaning of the word in this sentence
        #[arg(long)]
        meaning: String,
        /// Translation of the whole sentence
        #[arg(long)]
        translation: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Where it came from: manual, import:<tag> or video:<session>:<video-id>:<seconds>
        #[arg(long, default_value = "manual")]
        source: String,
    },

    /// List contexts due for review
    Due,

    /// Run an interactive review session
    Review,

    /// List words with their overall status
    Words {
        /// Filter by text in the word, its sentences or meanings
        #[arg(long)]
        query: Option<String>,
        /// Filter by tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show a word and all its contexts
    Show {
        /// Word text (case-insensitive prefix match)
        word: String,
    },

    /// Context counts by status
    Stats,

    /// List tags with counts
    Tags,

    /// Remove a word, or one of its contexts
    Remove {
        /// Word text (case-insensitive prefix match)
        word: String,
        /// Remove only this context (1-based, as listed by `show`)
        #[arg(long)]
        context: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.data_dir.as_deref())?;

    match cli.command {
        Command::Init => commands::init::run(&app)?,
        Command::Capture {
            word,
            sentence,
            meaning,
            translation,
            tags,
            source,
        } => {
            commands::capture::run(
                &app,
                &word,
                sentence,
                meaning,
                translation,
                tags.as_deref(),
                &source,
                &cli.format,
                use_color,
            )?;
        }
        Command::Due => commands::due::run(&app, &cli.format, use_color)?,
        Command::Review => commands::review::run(&app, use_color)?,
        Command::Words { query, tag } => {
            commands::words::run(&app, query.as_deref(), tag.as_deref(), &cli.format, use_color)?;
        }
        Command::Show { word } => commands::words::run_show(&app, &word, &cli.format, use_color)?,
        Command::Stats => commands::stats::run(&app, &cli.format)?,
        Command::Tags => commands::stats::run_tags(&app, &cli.format)?,
        Command::Remove { word, context } => commands::remove::run(&app, &word, context, use_color)?,
    }

    app.flush()?;
    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
