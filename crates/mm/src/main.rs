//! mm - MacroMaker CLI
//!
//! Inspect, import and replay input macros and manage shortcut bindings.
//! Playback goes through a dry-run device that prints each action as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use macromaker::prelude::*;
use macromaker::ShortcutEntry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mm")]
#[command(about = "MacroMaker - record, inspect and replay input macros")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a saved macro through the dry-run device
    Play {
        file: String,
        #[arg(short, long)]
        repeats: Option<u32>,
        #[arg(short, long)]
        speed: Option<f64>,
    },
    /// Record a macro from raw events (one JSON event per line)
    Record {
        /// Events file, or - for stdin
        #[arg(long)]
        from: String,
        #[arg(short, long, default_value = "macro")]
        name: String,
    },
    /// List saved macros
    List,
    /// Show macro info
    Show {
        file: String,
        #[arg(long)]
        all: bool,
    },
    /// Delete a macro
    Delete { file: String },
    /// Manage shortcut bindings
    Shortcuts {
        #[command(subcommand)]
        action: ShortcutsAction,
    },
}

#[derive(Subcommand)]
enum ShortcutsAction {
    List,
    Rebind { name: String, keys: String },
    Remove { name: String },
    /// Restore the default bindings
    Reset,
}

#[derive(Serialize)]
struct Output<'a, T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a Error>,
}

impl<'a, T: Serialize> Output<'a, T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl<'a> Output<'a, ()> {
    fn err(e: &'a Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(e),
        }
    }
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

/// Prints every injected action as one JSON line instead of touching the OS.
struct DryRunDevice;

impl OutputDevice for DryRunDevice {
    fn inject(&self, event: &InputEvent) -> macromaker::Result<()> {
        let line =
            serde_json::to_string(event).map_err(|e| Error::injection_failed(e.to_string()))?;
        let mut out = io::stdout().lock();
        writeln!(out, "{}", line).map_err(|e| Error::injection_failed(e.to_string()))
    }
}

/// Status on stderr so stdout stays machine readable.
struct StderrSink;

impl StatusSink for StderrSink {
    fn set_status(&self, text: &str) {
        eprintln!("{}", text);
    }

    fn update_progress(&self, fraction: f64) {
        tracing::debug!(progress = fraction, "playback progress");
    }

    fn show_message(&self, text: &str) {
        eprintln!("{}", text);
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play { file, repeats, speed } => play(&file, repeats, speed),
        Commands::Record { from, name } => record(&from, &name),
        Commands::List => list(),
        Commands::Show { file, all } => show(&file, all),
        Commands::Delete { file } => delete(&file),
        Commands::Shortcuts { action } => shortcuts(action),
    };

    if let Err(e) = result {
        match e.downcast_ref::<Error>() {
            Some(err) => {
                if print_json(&Output::<()>::err(err)).is_err() {
                    eprintln!("Error: {}", err);
                }
            }
            None => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}

fn paths() -> Result<Paths> {
    Ok(Paths::from_env()?)
}

fn storage() -> Result<MacroStorage> {
    Ok(MacroStorage::with_dir(paths()?.macros_dir())?)
}

fn load_settings() -> Result<(Paths, Settings)> {
    let paths = paths()?;
    let settings = Settings::load(&paths.settings_file())?;
    Ok((paths, settings))
}

// ── Macros ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PlaySummary {
    file: String,
    repetitions: u32,
    injected: usize,
    cancelled: bool,
}

fn play(file: &str, repeats: Option<u32>, speed: Option<f64>) -> Result<()> {
    let (_, settings) = load_settings()?;
    let macro_ = storage()?.load(file)?;

    let mut options = settings.playback_options();
    if let Some(repeats) = repeats {
        options.repeats = repeats;
    }
    if let Some(speed) = speed {
        options.speed = speed;
    }

    let scheduler = Arc::new(MacroScheduler::new(Arc::new(DryRunDevice), Arc::new(StderrSink)));
    let on_interrupt = scheduler.clone();
    ctrlc::set_handler(move || {
        if on_interrupt.stop() {
            tracing::info!("stop requested");
        }
    })?;

    let handle = scheduler.play(Some(Arc::new(macro_)), options)?;
    let report = handle.join()?;

    print_json(&Output::ok(PlaySummary {
        file: file.to_string(),
        repetitions: report.repetitions,
        injected: report.injected,
        cancelled: report.cancelled,
    }))
}

#[derive(Serialize)]
struct RecordSummary {
    path: PathBuf,
    actions: usize,
    duration_ms: u64,
}

fn read_events(reader: impl BufRead) -> macromaker::Result<Vec<RawEvent>> {
    let mut events = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: RawEvent = serde_json::from_str(&line)
            .map_err(|e| Error::deserialization(format!("line {}: {}", i + 1, e)))?;
        events.push(event);
    }
    Ok(events)
}

fn record(from: &str, name: &str) -> Result<()> {
    let events = if from == "-" {
        read_events(io::stdin().lock())?
    } else {
        read_events(BufReader::new(File::open(from).map_err(Error::from)?))?
    };

    let bus = EventBus::new();
    let mut recorder = EventRecorder::new();
    let start_ms = events.first().map_or(0, |e| e.time_ms);
    recorder.start_recording_at(&bus, start_ms)?;
    for event in &events {
        bus.dispatch(event);
    }
    let recorded = recorder.stop_recording(&bus)?;

    let path = storage()?.save(name, &recorded)?;
    print_json(&Output::ok(RecordSummary {
        path,
        actions: recorded.len(),
        duration_ms: recorded.duration_ms(),
    }))
}

fn list() -> Result<()> {
    print_json(&Output::ok(storage()?.list()?))
}

#[derive(Serialize)]
struct MacroInfo<'a> {
    file: &'a str,
    actions: usize,
    duration_ms: u64,
    summary: std::collections::BTreeMap<&'static str, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    events: Option<&'a [MacroAction]>,
}

fn show(file: &str, all: bool) -> Result<()> {
    let macro_ = storage()?.load(file)?;

    let mut summary = std::collections::BTreeMap::new();
    for action in macro_.actions() {
        *summary.entry(action.event.kind()).or_insert(0) += 1;
    }

    print_json(&Output::ok(MacroInfo {
        file,
        actions: macro_.len(),
        duration_ms: macro_.duration_ms(),
        summary,
        events: all.then(|| macro_.actions()),
    }))
}

fn delete(file: &str) -> Result<()> {
    storage()?.delete(file)?;
    print_json(&Output::ok(serde_json::json!({ "deleted": file })))
}

// ── Shortcuts ───────────────────────────────────────────────────────────────

fn shortcuts(action: ShortcutsAction) -> Result<()> {
    let (paths, mut settings) = load_settings()?;

    match action {
        ShortcutsAction::List => return print_json(&Output::ok(&settings.shortcuts)),
        ShortcutsAction::Rebind { name, keys } => {
            let mut registry = settings.registry();
            registry.rebind(&name, &keys)?;
            settings.set_registry(&registry);
        }
        ShortcutsAction::Remove { name } => {
            let mut registry = settings.registry();
            registry.remove(&name);
            settings.set_registry(&registry);
        }
        ShortcutsAction::Reset => settings.reset_shortcuts(),
    }

    settings.save(&paths.settings_file())?;
    let shortcuts: &[ShortcutEntry] = &settings.shortcuts;
    print_json(&Output::ok(shortcuts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_event_lines() {
        let input = "{\"at\":5,\"e\":\"kp\",\"k\":56}\n\n{\"at\":9,\"e\":\"s\",\"n\":-2}\n";
        let events = read_events(Cursor::new(input)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], RawEvent::new(9, InputEvent::Scroll { amount: -2 }));
    }

    #[test]
    fn bad_event_line_names_the_line() {
        let input = "{\"at\":5,\"e\":\"kp\",\"k\":56}\nnope\n";
        let err = read_events(Cursor::new(input)).unwrap_err();
        assert!(matches!(err, Error::Deserialization(ref m) if m.starts_with("line 2")));
    }

    #[test]
    fn error_output_shape() {
        let err = Error::not_found("control.nope");
        let json = serde_json::to_value(Output::<()>::err(&err)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn cli_parses_nested_commands() {
        let cli =
            Cli::try_parse_from(["mm", "shortcuts", "rebind", "control.play", "Ctrl+F5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Shortcuts {
                action: ShortcutsAction::Rebind { ref name, .. }
            } if name == "control.play"
        ));

        let cli = Cli::try_parse_from(["mm", "play", "a.jsonl", "--repeats", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Play {
                repeats: Some(3),
                speed: None,
                ..
            }
        ));
    }
}
