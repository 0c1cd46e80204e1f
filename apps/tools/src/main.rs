use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use editor_core::{
    CharacterRoster, Editor, EditorPreferences, HttpSegmenter, LocalSegmenter, PinnedCharacters,
    StagedCharacter, TextSegmenter,
};
use storage::Storage;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Offline helpers for scenario project files")]
struct Cli {
    /// Preference store used for the character roster and pins.
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a project file against the import rules.
    Validate { file: PathBuf },
    /// Write the export view of a project file.
    Export {
        file: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build a project from blank-line separated text.
    Segment {
        text_file: PathBuf,
        /// JSON object mapping character names to ids.
        #[arg(long)]
        roster: Option<PathBuf>,
        /// Segmentation service base URL; segments locally when absent.
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List characters that appear on stage, in first-appearance order.
    Staged {
        file: PathBuf,
        #[arg(long)]
        roster: Option<PathBuf>,
    },
    /// Toggle a pinned character in the preference store.
    Pin { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage = match cli.database_url.as_deref() {
        Some(url) => Some(Storage::new(url).await?),
        None => None,
    };

    match cli.command {
        Command::Validate { file } => {
            let editor = open_project(&file, CharacterRoster::default())?;
            println!("{}", validation_summary(&file, &editor));
        }
        Command::Export { file, out } => {
            let editor = open_project(&file, CharacterRoster::default())?;
            write_output(out.as_deref(), &editor.export_json()?)?;
        }
        Command::Segment {
            text_file,
            roster,
            service,
            out,
        } => {
            let roster = resolve_roster(roster.as_deref(), storage.as_ref()).await?;
            let text = fs::read_to_string(&text_file)
                .with_context(|| format!("failed to read {}", text_file.display()))?;
            let segments = match service {
                Some(base_url) => HttpSegmenter::new(&base_url)?.segment(&text).await?,
                None => LocalSegmenter.segment(&text).await?,
            };
            info!(segments = segments.len(), "text segmented");

            let mut editor = Editor::default();
            editor.set_roster(roster);
            editor.open_from_segments(&segments);
            write_output(out.as_deref(), &editor.export_json()?)?;
        }
        Command::Staged { file, roster } => {
            let roster = resolve_roster(roster.as_deref(), storage.as_ref()).await?;
            let editor = open_project(&file, roster)?;
            for line in staged_lines(&editor.staged_characters()) {
                println!("{line}");
            }
        }
        Command::Pin { name } => {
            let storage = storage.context("pin needs --database-url")?;
            let mut pinned = PinnedCharacters::load(&storage).await?;
            let now_pinned = pinned.toggle(&name);
            pinned.save(&storage).await?;
            println!(
                "{name} {}; pinned: {}",
                if now_pinned { "pinned" } else { "unpinned" },
                pinned.names().join(", ")
            );
        }
    }

    Ok(())
}

fn open_project(file: &Path, roster: CharacterRoster) -> Result<Editor> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut editor = Editor::default();
    editor.set_roster(roster);
    editor
        .import_json(&raw)
        .with_context(|| format!("{} was rejected", file.display()))?;
    Ok(editor)
}

/// A roster file wins over the stored roster; with neither the roster is empty.
async fn resolve_roster(path: Option<&Path>, storage: Option<&Storage>) -> Result<CharacterRoster> {
    if let Some(path) = path {
        return read_roster(path);
    }
    match storage {
        Some(storage) => {
            debug!("using stored character roster");
            Ok(EditorPreferences::load(storage).await?.roster)
        }
        None => Ok(CharacterRoster::default()),
    }
}

fn read_roster(path: &Path) -> Result<CharacterRoster> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read roster {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("malformed roster {}", path.display()))
}

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "project written");
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn validation_summary(file: &Path, editor: &Editor) -> String {
    format!("{}: ok, {} actions", file.display(), editor.state().len())
}

fn staged_lines(staged: &[StagedCharacter]) -> Vec<String> {
    staged
        .iter()
        .map(|character| format!("{}\t{}", character.id.0, character.name))
        .collect()
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
