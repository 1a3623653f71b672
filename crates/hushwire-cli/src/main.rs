//! Hushwire CLI
//!
//! Key management and message sealing for Hushwire encrypted chat

mod config;
mod keyring;
mod progress;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use hushwire_crypto::prime::generate_prime;
use hushwire_crypto::rsa::generate_key_pair;
use hushwire_crypto::{ChatLine, Envelope, RsaPrivateKey, RsaPublicKey};
use rand_core::OsRng;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use config::{Config, validate_bits};
use keyring::Keyring;
use progress::{KeygenProgress, format_duration};

/// Hushwire - RSA + Salsa20 end-to-end encrypted chat
#[derive(Parser)]
#[command(name = "hushwire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new RSA key pair
    Keygen {
        /// Account name used for the key file names
        #[arg(short, long, default_value = "id")]
        name: String,

        /// Modulus size in bits
        #[arg(short, long)]
        bits: Option<u64>,

        /// Output directory for the key files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a probable prime
    Prime {
        /// Prime size in bits
        #[arg(short, long)]
        bits: u64,
    },

    /// Manage the contact keyring
    Contact {
        #[command(subcommand)]
        action: ContactAction,
    },

    /// Encrypt a message for a recipient
    Seal {
        /// Recipient contact name
        #[arg(long, required_unless_present = "pubkey", conflicts_with = "pubkey")]
        to: Option<String>,

        /// Recipient public key file
        #[arg(long)]
        pubkey: Option<PathBuf>,

        /// Sender name; emits a chat line instead of bare JSON
        #[arg(long)]
        from: Option<String>,

        /// Message text
        #[arg(required = true)]
        message: String,
    },

    /// Decrypt an envelope or chat line
    Open {
        /// Private key file
        #[arg(short, long)]
        key: PathBuf,

        /// Envelope JSON or chat line (read from stdin when omitted)
        input: Option<String>,
    },

    /// Decrypt a file of chat lines
    History {
        /// Private key file
        #[arg(short, long)]
        key: PathBuf,

        /// Chat history file
        #[arg(required = true)]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum ContactAction {
    /// Add a contact's public key
    Add {
        /// Account name
        name: String,
        /// Public key string ("n,e")
        key: String,
    },
    /// Remove a contact
    Remove {
        /// Account name
        name: String,
    },
    /// List contacts
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_or_default()?,
    };

    // Validate configuration
    config.validate()?;

    init_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Keygen { name, bits, output } => {
            generate_keypair(&name, bits, output, &config)?;
        }
        Commands::Prime { bits } => {
            print_prime(bits)?;
        }
        Commands::Contact { action } => {
            manage_contacts(action, &config)?;
        }
        Commands::Seal {
            to,
            pubkey,
            from,
            message,
        } => {
            seal_message(to, pubkey, from, &message, &config)?;
        }
        Commands::Open { key, input } => {
            open_message(&key, input)?;
        }
        Commands::History { key, path } => {
            show_history(&key, &path)?;
        }
    }

    Ok(())
}

/// Initialize logging from config, overridden by `--verbose` and `RUST_LOG`
fn init_logging(config: &Config, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match &config.logging.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }

    Ok(())
}

/// Generate a new RSA key pair and write `<name>.key` / `<name>.pub`
fn generate_keypair(
    name: &str,
    bits: Option<u64>,
    output: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<()> {
    let bits = bits.unwrap_or(config.keys.bits);
    validate_bits(bits)?;

    let dir = output.unwrap_or_else(|| config.keys.directory.clone());
    fs::create_dir_all(&dir)?;

    tracing::info!("Generating {}-bit key pair for {}", bits, name);

    let progress = KeygenProgress::new(bits);
    let started = Instant::now();
    let (private, public) = match generate_key_pair(&mut OsRng, bits) {
        Ok(pair) => pair,
        Err(e) => {
            progress.abandon();
            return Err(e.into());
        }
    };
    progress.finish_with_message(format!(
        "Generated {}-bit key pair in {}",
        public.bits(),
        format_duration(started.elapsed())
    ));

    let private_path = dir.join(format!("{name}.key"));
    let public_path = dir.join(format!("{name}.pub"));

    let private_text = Zeroizing::new(private.to_string());
    write_private(&private_path, private_text.as_bytes())?;
    fs::write(&public_path, public.to_string())?;

    println!("Public key: {}", public_path.display());
    println!("Private key: {}", private_path.display());
    println!(
        "\n{}",
        style("Keep the .key file secure! It contains your private key.").yellow()
    );

    Ok(())
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    fs::write(path, contents)?;
    Ok(())
}

/// Print a probable prime of `bits` bits
fn print_prime(bits: u64) -> anyhow::Result<()> {
    let prime = generate_prime(&mut OsRng, bits)?;
    println!("{prime}");
    Ok(())
}

/// Keyring subcommands
fn manage_contacts(action: ContactAction, config: &Config) -> anyhow::Result<()> {
    let path = &config.keyring.path;
    let mut keyring = Keyring::load_or_default(path)?;

    match action {
        ContactAction::Add { name, key } => {
            keyring.add(&name, &key)?;
            keyring.save(path)?;
            println!("Added contact: {name}");
        }
        ContactAction::Remove { name } => {
            if !keyring.remove(&name) {
                anyhow::bail!("Unknown contact: {name}");
            }
            keyring.save(path)?;
            println!("Removed contact: {name}");
        }
        ContactAction::List => {
            if keyring.is_empty() {
                println!("No contacts");
                return Ok(());
            }
            println!("Contacts ({}):", keyring.len());
            for name in keyring.names() {
                println!("  {name}");
            }
        }
    }

    Ok(())
}

/// Seal a message and print envelope JSON or a chat line
fn seal_message(
    to: Option<String>,
    pubkey: Option<PathBuf>,
    from: Option<String>,
    message: &str,
    config: &Config,
) -> anyhow::Result<()> {
    let recipient = match (to, pubkey) {
        (Some(name), _) => Keyring::load_or_default(&config.keyring.path)?.get(&name)?,
        (None, Some(path)) => read_public_key(&path)?,
        (None, None) => anyhow::bail!("Either --to or --pubkey is required"),
    };

    tracing::debug!(bits = recipient.bits(), len = message.len(), "sealing message");

    match from {
        Some(sender) => println!("{}", ChatLine::seal(sender, message, &recipient)?),
        None => println!("{}", Envelope::seal(message, &recipient)?.to_json()?),
    }

    Ok(())
}

/// Decrypt one envelope or chat line
fn open_message(key: &Path, input: Option<String>) -> anyhow::Result<()> {
    let private = read_private_key(key)?;

    let input = match input {
        Some(text) => text,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let (sender, envelope) = parse_input(input.trim())?;
    let plaintext = envelope.open(&private)?;

    match sender {
        Some(sender) => println!("{sender}: {plaintext}"),
        None => println!("{plaintext}"),
    }

    Ok(())
}

/// Accept bare envelope JSON or a `sender: json` chat line
fn parse_input(input: &str) -> anyhow::Result<(Option<String>, Envelope)> {
    if input.starts_with('{') {
        Ok((None, Envelope::from_json(input)?))
    } else {
        let line: ChatLine = input.parse()?;
        Ok((Some(line.sender().to_string()), line.envelope().clone()))
    }
}

/// Decrypt a chat history file, showing undecryptable lines as-is
fn show_history(key: &Path, path: &Path) -> anyhow::Result<()> {
    let private = read_private_key(key)?;
    let history = fs::read_to_string(path)
        .with_context(|| format!("Failed to read history {}", path.display()))?;

    for (index, raw) in history.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }

        let decrypted = raw
            .parse::<ChatLine>()
            .and_then(|line| {
                line.open(&private)
                    .map(|text| format!("{}: {}", line.sender(), text))
            });

        match decrypted {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::warn!(line = index + 1, "could not decrypt message: {}", e);
                println!("{raw}");
            }
        }
    }

    Ok(())
}

fn read_public_key(path: &Path) -> anyhow::Result<RsaPublicKey> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read public key {}", path.display()))?;
    Ok(text.parse()?)
}

fn read_private_key(path: &Path) -> anyhow::Result<RsaPrivateKey> {
    let text = Zeroizing::new(
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read private key {}", path.display()))?,
    );
    Ok(text.parse()?)
}
