//! Command-line front end for the contacts store.
//!
//! # Responsibility
//! - Map one subcommand to one `ContactStore` call.
//! - Keep output line-oriented (or JSON for `list --json`) for scripting.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use contacts_core::{
    default_log_level, init_logging, Contact, ContactStore, StoreConfig, StoredContact,
    DEFAULT_DB_FILE_NAME,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "contacts", version, about = "Manage contacts stored in a SQLite file")]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, default_value = DEFAULT_DB_FILE_NAME)]
    db: PathBuf,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the contacts table if it does not exist.
    Init,
    /// Add a new contact.
    Add(ContactArgs),
    /// Remove the contact with this email.
    Remove { email: String },
    /// Print whether a contact with this email exists.
    Exists { email: String },
    /// Replace every field of the contact stored under OLD_EMAIL.
    Update {
        old_email: String,
        #[command(flatten)]
        contact: ContactArgs,
    },
    /// Show the contact with this email.
    Show { email: String },
    /// List every contact.
    List {
        /// Print a JSON array instead of one line per contact.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct ContactArgs {
    #[arg(long = "first")]
    first_name: String,
    #[arg(long = "last")]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: Option<String>,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Add(_) => "add",
            Self::Remove { .. } => "remove",
            Self::Exists { .. } => "exists",
            Self::Update { .. } => "update",
            Self::Show { .. } => "show",
            Self::List { .. } => "list",
        }
    }
}

impl From<ContactArgs> for Contact {
    fn from(args: ContactArgs) -> Self {
        Contact {
            first_name: args.first_name,
            last_name: args.last_name,
            phone: args.phone,
            email: args.email,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli, &mut std::io::stdout().lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs one command. `Ok(false)` means the addressed contact was not found.
fn run(cli: Cli, out: &mut impl Write) -> Result<bool> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    let store = ContactStore::open(StoreConfig::new(&cli.db))
        .with_context(|| format!("cannot open contacts database `{}`", cli.db.display()))?;
    info!(
        "event=cli_command module=cli status=start command={}",
        cli.command.name()
    );

    match cli.command {
        Command::Init => {
            writeln!(out, "initialized {}", cli.db.display())?;
        }
        Command::Add(args) => {
            let id = store.add(&args.into())?;
            writeln!(out, "added id={id}")?;
        }
        Command::Remove { email } => {
            return report(out, store.remove(&email)?, "removed");
        }
        Command::Exists { email } => {
            writeln!(out, "{}", store.exists(&email)?)?;
        }
        Command::Update { old_email, contact } => {
            return report(out, store.update(&old_email, &contact.into())?, "updated");
        }
        Command::Show { email } => match store.find(&email)? {
            Some(stored) => writeln!(out, "{}", format_line(&stored))?,
            None => {
                writeln!(out, "not found")?;
                return Ok(false);
            }
        },
        Command::List { json } => {
            let contacts = store.list_all()?;
            if json {
                serde_json::to_writer_pretty(&mut *out, &contacts)?;
                writeln!(out)?;
            } else {
                for stored in &contacts {
                    writeln!(out, "{}", format_line(stored))?;
                }
            }
        }
    }

    Ok(true)
}

fn report(out: &mut impl Write, found: bool, done: &str) -> Result<bool> {
    if found {
        writeln!(out, "{done}")?;
    } else {
        writeln!(out, "not found")?;
    }
    Ok(found)
}

fn format_line(stored: &StoredContact) -> String {
    let contact = &stored.contact;
    format!(
        "{}\t{} {}\t{}\t{}",
        stored.id,
        contact.first_name,
        contact.last_name,
        contact.phone.as_deref().unwrap_or("-"),
        contact.email
    )
}
