mod console;

use anyhow::{Context, Result};
use clap::Parser;
use console::{Console, Flow, PROMPT};
use property_store::{Store, StoreConfig};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Property store console - create, inspect and update stored entities.
#[derive(Parser)]
#[command(name = "property-console", version)]
struct Cli {
    /// Durable store file [env: PROPERTY_STORE_FILE] [default: file.json]
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Directory for backups [env: PROPERTY_STORE_BACKUP_DIR] [default: next to the store file]
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Run a single command and exit, e.g. `create User`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl Cli {
    /// Flags win over the environment, the environment over defaults
    fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::from_env();
        if let Some(file) = &self.file {
            config.path = file.clone();
        }
        if let Some(dir) = &self.backup_dir {
            config.backup_dir = Some(dir.clone());
        }
        config
    }
}

fn main() -> Result<()> {
    init_tracing("warn");

    let cli = Cli::parse();
    let config = cli.store_config();

    let store = Store::open(config.clone())
        .with_context(|| format!("failed to load store from {}", config.path.display()))?;
    info!(path = %config.path.display(), objects = store.all().len(), "store ready");

    let mut console = Console::new(store);

    if cli.command.is_empty() {
        run_interactive(&mut console)
    } else {
        run_once(&mut console, &cli.command)
    }
}

fn run_once(console: &mut Console, command: &[String]) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    console.dispatch(command, &mut out)?;
    Ok(())
}

fn run_interactive(console: &mut Console) -> Result<()> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut lines = stdin.lock().lines();

    loop {
        if interactive {
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }

        let Some(line) = lines.next() else {
            // EOF
            if interactive {
                writeln!(out)?;
            }
            break;
        };
        let line = line.context("failed to read input")?;

        if console.execute(&line, &mut out)? == Flow::Quit {
            break;
        }
    }

    Ok(())
}

/// Logs go to stderr so command output stays clean; RUST_LOG overrides the level
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
