//! `videofm-kit`: operator shell for the videofm worker.
//!
//! Without a subcommand the terminal UI starts. The subcommands are
//! maintenance helpers that run without the UI.

use clap::Parser;
use clap::Subcommand;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vfm_core::config::loader;
use vfm_core::config::AppPaths;
use vfm_core::config::AppSettings;
use vfm_core::launcher::resolve::WorkerInvocation;
use vfm_core::launcher::ProcessLauncher;
use vfm_core::lifecycle::cleanup;

#[derive(Parser, Debug)]
#[command(name = "videofm-kit", version, about = "Create videos from your Last.fm listening history")]
struct Cli {
    /// Application data directory (credentials, Videos, clips, cache).
    #[arg(long, env = "VIDEOFM_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Path to the videofm worker executable.
    #[arg(long, global = true)]
    worker: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `vfm_core=trace`. Defaults to `RUST_LOG`, then
    /// `info` for the UI and `warn` for subcommands.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove leftover clips and intermediate files.
    Cleanup,
    /// Remove cached search results.
    ClearCache,
    /// Print the resolved paths and settings as JSON.
    Config,
    /// Show how the worker would be launched.
    Locate,
}

fn env_filter(log_level: Option<&str>, default: &str) -> EnvFilter {
    match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
    }
}

/// The TUI owns the terminal, so logs go to `<data_dir>/videofm-kit.log`.
fn init_file_logging(paths: &AppPaths, log_level: Option<&str>) -> Result<()> {
    std::fs::create_dir_all(paths.data_dir())
        .wrap_err_with(|| format!("failed to create {}", paths.data_dir().display()))?;
    let log_path = paths.log_file();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .wrap_err_with(|| format!("failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level, "info"))
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();
    Ok(())
}

fn init_stderr_logging(log_level: Option<&str>) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level, "warn"))
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(paths: &AppPaths, worker: Option<PathBuf>) -> Result<AppSettings> {
    let mut settings = loader::load_settings(paths)?;
    if worker.is_some() {
        settings.worker.executable = worker;
    }
    Ok(settings)
}

fn run_cleanup(paths: &AppPaths) {
    let report = cleanup::cleanup_artifacts(paths);
    if report.is_clean() {
        println!(
            "{} Removed {} item(s) from {}",
            "✓".green(),
            report.removed,
            paths.data_dir().display()
        );
    } else {
        println!(
            "{} Removed {} item(s), {} could not be removed (see log)",
            "!".yellow(),
            report.removed,
            report.failures
        );
    }
}

fn run_clear_cache(paths: &AppPaths) -> Result<()> {
    cleanup::clear_cache(paths)
        .wrap_err_with(|| format!("failed to clear {}", paths.cache_dir().display()))?;
    println!("{} {}", "✓".green(), vfm_core::engine::CACHE_CLEARED);
    Ok(())
}

fn print_config(paths: &AppPaths, settings: &AppSettings) -> Result<()> {
    let value = serde_json::json!({
        "data_dir": paths.data_dir(),
        "config_file": paths.config_file(),
        "log_file": paths.log_file(),
        "videos_dir": paths.videos_dir(),
        "settings": settings,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn locate(paths: &AppPaths, settings: &AppSettings) {
    let launcher = ProcessLauncher::new(paths.clone(), settings);
    match launcher.invocation() {
        Ok(WorkerInvocation::Executable(path)) => {
            println!("{} {}", "executable".green().bold(), path.display());
        }
        Ok(WorkerInvocation::Script {
            interpreter,
            script,
        }) => {
            println!(
                "{} {} {}",
                "script".cyan().bold(),
                interpreter.display(),
                script.display()
            );
        }
        Err(e) => {
            println!("{} {}", "not found".red().bold(), e);
            if let vfm_core::launcher::LaunchError::WorkerNotFound { searched } = e {
                for path in searched {
                    println!("  {}", path.display().to_string().dimmed());
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let paths = AppPaths::resolve(cli.data_dir);
    let log_level = cli.log_level.as_deref();

    match cli.command {
        None => {
            init_file_logging(&paths, log_level)?;
            let settings = load_settings(&paths, cli.worker)?;
            tracing::info!(data_dir = %paths.data_dir().display(), "Starting operator shell");
            vfm_tui::run_app(paths, settings)
                .await
                .map_err(|e| color_eyre::eyre::eyre!(e))
        }
        Some(Command::Cleanup) => {
            init_stderr_logging(log_level);
            run_cleanup(&paths);
            Ok(())
        }
        Some(Command::ClearCache) => {
            init_stderr_logging(log_level);
            run_clear_cache(&paths)
        }
        Some(Command::Config) => {
            init_stderr_logging(log_level);
            let settings = load_settings(&paths, cli.worker)?;
            print_config(&paths, &settings)
        }
        Some(Command::Locate) => {
            init_stderr_logging(log_level);
            let settings = load_settings(&paths, cli.worker)?;
            locate(&paths, &settings);
            Ok(())
        }
    }
}
