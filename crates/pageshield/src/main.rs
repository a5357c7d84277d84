//! PageShield - client-side hardening for web pages.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use pageshield::{Page, ShieldConfig, ShieldState};

/// PageShield - harden HTML pages against common client-side attacks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load an HTML file, install the shield and print the hardened page
    Harden {
        /// HTML file to harden
        file: PathBuf,

        /// Load the page inside a foreign frame
        #[arg(long)]
        framed: bool,

        /// Write the hardened HTML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the sanitized form of a text value
    Sanitize {
        /// Text to sanitize
        text: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    debug!("PageShield v{}", pageshield::VERSION);

    match args.command {
        Command::Harden {
            file,
            framed,
            output,
            config,
        } => harden(file, framed, output, config),
        Command::Sanitize { text } => {
            let result = shield_security::sanitize(&text);
            if result.stripped {
                debug!("input contained a script-injection pattern");
            }
            println!("{}", result.value);
            Ok(())
        }
    }
}

fn harden(
    file: PathBuf,
    framed: bool,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = match config {
        Some(path) => ShieldConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ShieldConfig::default(),
    };

    let html = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;

    let mut page = if framed {
        Page::load_framed(&html, config)?
    } else {
        Page::load(&html, config)?
    };

    let sanitized = page.sanitize_fields();
    page.flush_mutations();
    info!(fields = sanitized, "initial field values sanitized");

    for entry in page.console().entries() {
        eprintln!("{}", entry);
    }

    let hardened = page.serialize();
    match &output {
        Some(path) => {
            std::fs::write(path, &hardened)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Hardened page saved to: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(hardened.as_bytes())?;
            stdout.flush()?;
        }
    }

    if let ShieldState::Blocked(reason) = page.state() {
        bail!("{}", reason);
    }
    Ok(())
}
