//! docket - split documents into narration-ready chapters

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docket::{DocketError, DocumentSource, NarrationConfig, Segmenter, source, translate};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "docket")]
#[command(about = "Split long-form documents into narration-ready chapters", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Segment a TXT or EPUB file and list its chapters
    Chapters {
        /// Path to the document
        file: PathBuf,

        /// Configuration file (default: user config, then built-in)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print chapters as JSON, content included
        #[arg(long)]
        json: bool,
    },
    /// Print the normalized text of a document
    Normalize {
        file: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print a document with boilerplate sections and running headers removed
    Clean {
        file: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show where configuration is read from and what it holds
    Show {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Write the effective configuration as TOML
    Dump {
        /// Output path (default: the user config path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    match &args.command {
        Commands::Chapters { file, config, json } => list_chapters(file, config.as_deref(), *json),
        Commands::Normalize { file, config } => {
            let config = load_config(config.as_deref())?;
            let segmenter = build_segmenter(&config);
            let text = read_text(file)?;
            println!("{}", segmenter.engine().normalize(&text));
            Ok(())
        }
        Commands::Clean { file, config } => {
            let config = load_config(config.as_deref())?;
            let text = read_text(file)?;
            println!("{}", docket::clean::clean(&text, &config.cleaning));
            Ok(())
        }
        Commands::Config { action } => handle_config_command(action),
    }
}

fn load_config(path: Option<&Path>) -> Result<NarrationConfig> {
    NarrationConfig::load(path).context("Failed to load configuration")
}

fn build_segmenter(config: &NarrationConfig) -> Segmenter {
    let segmenter = Segmenter::new(config);
    if !config.translation.enabled {
        return segmenter;
    }
    match translate::shared_backend(&config.translation) {
        Some(backend) => segmenter.with_translator(backend),
        None => segmenter,
    }
}

fn open_document(path: &Path) -> Result<Box<dyn DocumentSource>> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    source::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    let mut document = open_document(path)?;
    document
        .text()
        .with_context(|| format!("Failed to extract text from {}", path.display()))
}

fn list_chapters(path: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let segmenter = build_segmenter(&config);
    let mut document = open_document(path)?;
    if let Some(title) = document.title() {
        eprintln!("Book: \"{}\"", title);
    }

    let chapters = match segmenter.segment(document.as_mut()) {
        Ok(chapters) => chapters,
        Err(DocketError::NoContent(what)) => {
            anyhow::bail!("No text could be extracted from {}", what);
        }
        Err(e) => return Err(e).context("Segmentation failed"),
    };

    if chapters.is_empty() {
        eprintln!("No chapters found; the document would be narrated as a whole.");
        let text = document.text().context("Failed to extract text")?;
        let whole = segmenter.whole_document(&text);
        if json {
            println!("{}", serde_json::to_string_pretty(&[whole])?);
        } else {
            println!("  1. {} ({} words)", whole.title, whole.word_count);
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&chapters)?);
        return Ok(());
    }

    let total_words: usize = chapters.iter().map(|c| c.word_count).sum();
    eprintln!("Chapters: {}, Words: ~{}", chapters.len(), total_words);
    for chapter in &chapters {
        let part = if chapter.part_info.is_split() {
            format!(" [part {}/{}]", chapter.part_info.index, chapter.part_info.total)
        } else {
            String::new()
        };
        println!(
            "{:>3}. {}{} ({} words)",
            chapter.number, chapter.title, part, chapter.word_count
        );
    }
    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { config } => {
            let loaded = load_config(config.as_deref())?;
            match config {
                Some(path) => println!("Configuration file: {}", path.display()),
                None => println!("Configuration file: {:?}", NarrationConfig::config_path()?),
            }
            println!();
            println!(
                "min_chapter_word_count = {}",
                loaded.chapters.min_chapter_word_count
            );
            println!(
                "max_chapter_word_count = {}",
                loaded.chapters.max_chapter_word_count
            );
            println!(
                "section_markers = {}",
                loaded.cleaning.section_markers.len()
            );
            println!("normalization rules = {}", loaded.normalization.rules.len());
            println!(
                "bible_books = {}",
                loaded.normalization.tables.bible_books.len()
            );
            println!("translation = {}", loaded.translation.enabled);
        }
        ConfigAction::Dump { output, config } => {
            let loaded = load_config(config.as_deref())?;
            let path = match output {
                Some(path) => path.clone(),
                None => NarrationConfig::config_path()?,
            };
            loaded
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Configuration written to: {}", path.display());
        }
    }
    Ok(())
}
