//! Batch Organizer - bulk file organization and image batch processing
//!
//! Command-line driver for the library operations: every subcommand maps to
//! exactly one library call whose result is printed as a summary or JSON.

use anyhow::Result;
use batch_organizer::{
    Cli, Command, Config, ExtractMode, Extension, OperationLog, ProgressEvent,
    count_extensions, extract_frames, find_duplicates, prune_empty_dirs, sort_by_extension,
    transcode,
};
use chrono::Local;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Colours and layout for terminal output

    use batch_organizer::ProgressEvent;
    use crossterm::{
        ExecutableCommand,
        cursor::MoveToColumn,
        style::{Color, Print, Stylize, style},
        terminal::{Clear, ClearType},
    };
    use std::io::{stderr, stdout};

    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(&format!("{}\n", "─".repeat(60))));
    }

    /// Centered, boxed title
    pub fn print_title(title: &str) {
        let width: usize = 60;
        let padding = width.saturating_sub(title.len()) / 2;
        let left_pad = " ".repeat(padding.saturating_sub(1));

        let _ = stdout().execute(Print(&format!(
            "{}{} {}{}\n",
            left_pad,
            "╔".bold().stylize(),
            title.bold().stylize(),
            "╗".bold().stylize(),
        )));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_stat(key: &str, value: &str, color: Color) {
        let key_styled = style(key).with(CliTheme::HINT);
        let value_styled = style(value).with(color).bold();
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// One log line, coloured by what it reports
    pub fn print_log_line(line: &str) {
        let (icon, color) = if line.starts_with("Error") || line.starts_with("Could not") {
            ("✗", CliTheme::ERROR)
        } else if line.starts_with("Duplicate found") || line.starts_with("Found empty") {
            ("≡", CliTheme::ACCENT)
        } else if line.starts_with("Skipped") {
            ("⊘", CliTheme::WARNING)
        } else {
            ("✓", CliTheme::SUCCESS)
        };

        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(icon).with(color).bold()));
        let _ = stdout().execute(Print(format!(" {}\n", line)));
    }

    /// Redraw the single progress line on stderr
    pub fn print_progress(event: &ProgressEvent) {
        let frame = event
            .frame
            .map(|f| format!(" frame {}", f.index + 1))
            .unwrap_or_default();
        let mut err = stderr();
        let _ = err.execute(MoveToColumn(0));
        let _ = err.execute(Clear(ClearType::CurrentLine));
        let counter = format!("[{}/{}]", event.current, event.total);
        let _ = err.execute(Print(style(counter).with(CliTheme::ACCENT)));
        let _ = err.execute(Print(format!(" {}{}", event.label, frame)));
    }

    /// Clear the progress line once an operation has finished
    pub fn finish_progress() {
        let mut err = stderr();
        let _ = err.execute(MoveToColumn(0));
        let _ = err.execute(Clear(ClearType::CurrentLine));
    }

    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print("\n"));
        let _ = stdout().execute(Print(style("  📁 ").with(CliTheme::ACCENT)));
        let _ = stdout().execute(Print(style("Log file: ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", path)));
    }

    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

/// Counters shown in the summary block
struct Summary<'a> {
    title: &'static str,
    stats: Vec<(&'static str, usize, crossterm::style::Color)>,
    log: &'a OperationLog,
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let exe_dir = get_executable_dir()?;

    // Writing a config file needs no logging
    if let Command::InitConfig { path, current } = &cli.command {
        if *current {
            load_config(&cli, &exe_dir)?.save_to_file(path)?;
            cli_output::print_hint(&format!("Current configuration written to {}", path.display()));
        } else {
            Config::write_sample(path)?;
            cli_output::print_hint(&format!("Sample configuration written to {}", path.display()));
        }
        return Ok(());
    }

    let config = load_config(&cli, &exe_dir)?;

    let log_dir = config
        .log_dir
        .clone()
        .unwrap_or_else(|| exe_dir.join("Log"));
    let log_path = get_log_path(&log_dir, &cli);
    let _guard = setup_logging(&cli, &config, &log_path)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = cli.command.name(),
        "Batch Organizer starting"
    );
    if config.verbose {
        info!(?config, "Configuration loaded");
    }
    info!(log_file = %log_path.display(), "Log file location");

    match run_command(&cli, &config, &log_path) {
        Ok(()) => {
            info!(log_file = %log_path.display(), "Processing complete. Log saved to");
            Ok(())
        }
        Err(e) => {
            cli_output::finish_progress();
            error!(error = %e, "Processing failed");
            cli_output::print_error(&format!("Error: {}", e));
            std::process::exit(1);
        }
    }
}

/// Dispatch one subcommand to its library operation and print the result
fn run_command(cli: &Cli, config: &Config, log_path: &Path) -> Result<()> {
    use cli_output::CliTheme;

    let show_progress = !cli.json;
    let progress = |event: &ProgressEvent| {
        if show_progress {
            cli_output::print_progress(event);
        }
    };

    match &cli.command {
        Command::Extensions { dir } => {
            let counts = count_extensions(dir)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&counts)?);
                return Ok(());
            }

            cli_output::print_separator();
            cli_output::print_title("File Types");
            cli_output::print_separator();
            if counts.is_empty() {
                cli_output::print_warning("No files found.");
            }
            for (extension, count) in &counts {
                cli_output::print_stat(extension.as_str(), &count.to_string(), CliTheme::ACCENT);
            }
            cli_output::print_log_path(&log_path.display().to_string());
        }
        Command::Sort { dir, extension } => {
            let extension = Extension::parse(extension)?;
            let result = sort_by_extension(dir, &extension, &progress)?;
            cli_output::finish_progress();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            print_summary(
                &Summary {
                    title: "Sorting Complete",
                    stats: vec![
                        ("Moved", result.succeeded, CliTheme::SUCCESS),
                        ("Failed", result.failed, CliTheme::ERROR),
                    ],
                    log: &result.log,
                    dry_run: false,
                },
                log_path,
            );
        }
        Command::Dedupe {
            reference, check, ..
        } => {
            let report = find_duplicates(reference, check, config.dry_run)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            print_summary(
                &Summary {
                    title: "Duplicate Scan Complete",
                    stats: vec![
                        ("Found", report.found, CliTheme::ACCENT),
                        ("Deleted", report.deleted, CliTheme::SUCCESS),
                        ("Failed", report.failed, CliTheme::ERROR),
                    ],
                    log: &report.log,
                    dry_run: config.dry_run,
                },
                log_path,
            );
        }
        Command::Prune { dir, .. } => {
            let result = prune_empty_dirs(dir, config.dry_run)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            let label = if config.dry_run { "Empty folders" } else { "Removed" };
            print_summary(
                &Summary {
                    title: "Cleanup Complete",
                    stats: vec![
                        (label, result.succeeded, CliTheme::SUCCESS),
                        ("Failed", result.failed, CliTheme::ERROR),
                    ],
                    log: &result.log,
                    dry_run: config.dry_run,
                },
                log_path,
            );
        }
        Command::Transcode {
            source,
            dest,
            quality,
            ..
        } => {
            let options = config.transcode.to_options();
            let result = transcode(source, dest, &options, &progress)?;
            cli_output::finish_progress();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            print_summary(
                &Summary {
                    title: "Image Processing Complete",
                    stats: vec![
                        ("Processed", result.succeeded, CliTheme::SUCCESS),
                        ("Failed", result.failed, CliTheme::ERROR),
                    ],
                    log: &result.log,
                    dry_run: false,
                },
                log_path,
            );
            if quality.is_some() && !options.format.uses_quality() {
                cli_output::print_hint(&format!(
                    "Quality applies to JPEG only; {} output ignores it",
                    options.format
                ));
            }
        }
        Command::Frames { input, output } => {
            let mode = if input.is_file() {
                ExtractMode::SingleFile
            } else {
                ExtractMode::Directory
            };
            let result = extract_frames(input, output, mode, &progress)?;
            cli_output::finish_progress();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            print_summary(
                &Summary {
                    title: "Frame Extraction Complete",
                    stats: vec![
                        ("Frames", result.succeeded, CliTheme::SUCCESS),
                        ("Failed", result.failed, CliTheme::ERROR),
                    ],
                    log: &result.log,
                    dry_run: false,
                },
                log_path,
            );
        }
        // Handled before logging starts
        Command::InitConfig { .. } => {}
    }

    Ok(())
}

fn print_summary(summary: &Summary<'_>, log_path: &Path) {
    use cli_output::*;

    print_separator();
    print_title(summary.title);
    print_separator();

    print_blank();
    for (key, value, color) in &summary.stats {
        print_stat(key, &value.to_string(), *color);
    }
    print_blank();

    if !summary.log.is_empty() {
        print_separator();
        for line in summary.log {
            print_log_line(line);
        }
    }

    if summary.dry_run {
        print_separator();
        print_warning("Dry run: nothing was deleted.");
    }

    print_separator();
    print_log_path(&log_path.display().to_string());
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Determine the log file path based on config file or command name
fn get_log_path(log_dir: &Path, cli: &Cli) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    if let Some(config_name) = cli.config_name() {
        let config_log_dir = log_dir.join(&config_name);
        let log_filename = format!("{}_{}_{}.log", config_name, cli.command.name(), timestamp);
        config_log_dir.join(log_filename)
    } else {
        let log_filename = format!("{}_{}.log", cli.command.name(), timestamp);
        log_dir.join(log_filename)
    }
}

/// Resolve config path - `-C work` finds `work.toml` here or in `Config/`
fn resolve_config_path(exe_dir: &Path, config_path: &Path) -> PathBuf {
    if config_path.exists() {
        return config_path.to_path_buf();
    }

    let with_extension = config_path.with_extension("toml");
    if config_path.extension().is_none() && with_extension.exists() {
        return with_extension;
    }

    let filename = config_path.file_name().unwrap_or(config_path.as_os_str());
    let mut in_config_dir = exe_dir.join("Config").join(filename);
    if in_config_dir.extension().is_none() {
        in_config_dir.set_extension("toml");
    }

    if in_config_dir.exists() {
        in_config_dir
    } else {
        config_path.to_path_buf()
    }
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli, exe_dir: &Path) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        let resolved_path = resolve_config_path(exe_dir, config_path);
        let file_config = Config::load_from_file(&resolved_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    Ok(config)
}

/// Setup logging (file + console)
fn setup_logging(cli: &Cli, config: &Config, log_path: &Path) -> Result<WorkerGuard> {
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // Console output stays quiet unless verbose; the summary covers results
    let console_level = if config.verbose { Level::DEBUG } else { Level::WARN };
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::from_level(console_level));

    // The console layer sits directly on the filtered registry so both file
    // layer variants stack on the same subscriber type
    let subscriber = tracing_subscriber::registry().with(env_filter).with(console);

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .init();
    }

    Ok(guard)
}
