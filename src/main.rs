// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, set up logging, open the session and
//   dispatch to a command.
// - Returns `anyhow::Result` so library errors print with context.

use anyhow::{Context, Result};
use catsnap::aws::AwsBackend;
use catsnap::backend::Handle;
use catsnap::document::{Document, Image, Tag};
use catsnap::prompt::DialoguerTerminal;
use catsnap::{Config, ConfigPaths};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Catalog and store funny pictures
#[derive(Parser, Debug)]
#[command(name = "catsnap", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Credentials file (default: ~/.boto)
    #[arg(long, global = true)]
    credentials_file: Option<PathBuf>,

    /// Settings file (default: ~/.catsnap)
    #[arg(long, global = true)]
    settings_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the bucket and the tag/image tables if they don't exist yet
    Setup,
    /// Print the configured bucket, table prefix and region
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // One spinner for the whole run; log lines pause it while they print.
    // Hidden until `with_spinner` starts it.
    let spinner = ProgressBar::new_spinner();
    spinner.set_draw_target(ProgressDrawTarget::hidden());
    init_logging(cli.verbose, &spinner);

    let defaults = ConfigPaths::default();
    let paths = ConfigPaths {
        credentials: cli.credentials_file.unwrap_or(defaults.credentials),
        settings: cli.settings_file.unwrap_or(defaults.settings),
    };

    let backend = AwsBackend::new()?;
    let config = Config::open(paths, backend, &DialoguerTerminal)
        .context("Failed to set up configuration")?;

    match cli.command {
        Command::Setup => setup(&config, &spinner),
        Command::Show => show(&config),
    }
}

/// `RUST_LOG` wins; otherwise the -v count picks the level.
fn init_logging(verbose: u8, spinner: &ProgressBar) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(SpinnerAwareStderr(spinner.clone()))
        .init();
}

/// stderr writer that hides the spinner while a log line goes out.
#[derive(Clone)]
struct SpinnerAwareStderr(ProgressBar);

impl Write for SpinnerAwareStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for SpinnerAwareStderr {
    type Writer = SpinnerAwareStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `work` with the spinner ticking. The spinner is cleared whether
/// `work` succeeds or fails, so errors don't print under a stale line.
fn with_spinner<T>(spinner: &ProgressBar, work: impl FnOnce(&ProgressBar) -> Result<T>) -> Result<T> {
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_draw_target(ProgressDrawTarget::stderr());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = work(spinner);
    spinner.finish_and_clear();
    result
}

fn setup(config: &Config<AwsBackend>, spinner: &ProgressBar) -> Result<()> {
    let (bucket, tags, images) = with_spinner(spinner, |spinner| {
        spinner.set_message("Checking bucket...");
        let bucket = config.bucket().context("Failed to get bucket")?;

        spinner.set_message("Checking tables...");
        let tags = Tag::create(config).context("Failed to create tag table")?;
        let images = Image::create(config).context("Failed to create image table")?;
        Ok((bucket, tags, images))
    })?;

    println!("Bucket: {}", bucket.name());
    println!("Tables: {}, {}", tags.name(), images.name());
    Ok(())
}

fn show(config: &Config<AwsBackend>) -> Result<()> {
    let settings = config.settings()?;
    println!("Bucket:       {}", settings.bucket);
    println!("Table prefix: {}", settings.table_prefix);
    println!("Region:       {}", settings.region);
    Ok(())
}
