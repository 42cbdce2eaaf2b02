//! ksecret - path-addressed secrets store for Kubernetes deployments
//!
//! Commands:
//! - init: Create an empty store
//! - get: Print one field (or attachment) of a record
//! - set: Create or replace a record
//! - import: Create records from a JSON batch (existing ones are kept)
//! - export: Write all records as a JSON batch
//! - secrets: Write Kubernetes Secret manifests for annotated records
//! - list: Print all record paths

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ksecret::commands::{self, GetTarget, Session};
use ksecret::{Report, SecretOptions};
use ksecret_core::{Config, Paths};

#[derive(Parser)]
#[command(name = "ksecret")]
#[command(about = "Path-addressed secrets store that renders annotated records as Kubernetes Secrets")]
#[command(version)]
#[command(after_help = r#"PATHS:
    Records are addressed as /<group>/.../<title>, e.g. /prod/db/postgres.
    Missing groups are created by 'set' and 'import'.

ANNOTATIONS (one per line in the Notes field):
    secret-type=opaque|docker|tls
    secret-namespace=dev,prod        one manifest per namespace
    secret-tags=backend,db           matched by 'secrets --tag'
    secret-<key>=<Field>             opaque: data key <key> from field <Field>

GENERATED PASSWORDS:
    -f Password={h32}   h/H hex, L letters, A alphanumeric, S printable

EXAMPLES:
    ksecret init    -d team.ksdb -p 1234
    ksecret set     -d team.ksdb -p 1234 -e /prod/db -f UserName=admin -f Password={A24}
    ksecret get     -d team.ksdb -p 1234 -e /prod/db -f Password
    ksecret secrets -d team.ksdb -p 1234 -o secrets.yaml --tag backend
    ksecret export  -d team.ksdb -p 1234 -o export.json
    ksecret import  -d team.ksdb -p 1234 -i export.json --dry-run

The password can also be set via KSPASSWORD, the store via KSDATABASE."#)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Store file (default from config, then ~/.local/share/ksecret/vault.ksdb)
    #[arg(short = 'd', long = "database", env = "KSDATABASE", global = true)]
    database: Option<PathBuf>,

    /// Store password
    #[arg(short = 'p', long = "password", env = "KSPASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty store
    Init {
        /// Overwrite an existing store file
        #[arg(long)]
        force: bool,
    },

    /// Print a field value (without trailing newline) or an attachment
    Get {
        /// Record path, e.g. /prod/db
        #[arg(short = 'e', long = "entry")]
        entry: String,
        /// Field name
        #[arg(short = 'f', long = "field", required_unless_present = "attachment", conflicts_with = "attachment")]
        field: Option<String>,
        /// Attachment name
        #[arg(short = 'a', long = "attachment")]
        attachment: Option<String>,
    },

    /// Create a record, replacing all fields of an existing one
    Set {
        /// Record path, e.g. /prod/db
        #[arg(short = 'e', long = "entry")]
        entry: String,
        /// Field assignment NAME=VALUE (repeatable)
        #[arg(short = 'f', long = "field", required = true)]
        fields: Vec<String>,
        /// Attach a file as NAME=FILE (repeatable)
        #[arg(long = "attach", value_parser = parse_attachment)]
        attachments: Vec<(String, PathBuf)>,
        /// Do not write the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Create records from a JSON batch; existing records are kept
    Import {
        /// Input JSON file
        #[arg(short = 'i', long = "in")]
        input: PathBuf,
        /// Do not write the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Write all records as a JSON batch
    Export {
        /// Output JSON file
        #[arg(short = 'o', long = "out")]
        output: PathBuf,
    },

    /// Write Kubernetes Secret manifests for annotated records
    Secrets {
        /// Output YAML file
        #[arg(short = 'o', long = "out")]
        output: PathBuf,
        /// Only records tagged with TAG
        #[arg(short = 't', long = "tag")]
        tag: Option<String>,
    },

    /// Print every record path
    List,
}

fn parse_attachment(spec: &str) -> Result<(String, PathBuf), String> {
    match spec.split_once('=') {
        Some((name, file)) if !name.is_empty() && !file.is_empty() => {
            Ok((name.to_string(), PathBuf::from(file)))
        }
        _ => Err(format!("expected NAME=FILE, got '{}'", spec)),
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let paths = Paths::new();
    let config = Config::load_default(&paths)?;

    let database = cli
        .store
        .database
        .unwrap_or_else(|| config.database_or_default(&paths));
    let password = cli
        .store
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| anyhow!("missing -p/--password parameter"))?;

    tracing::debug!(database = %database.display(), "using store");
    let session = Session::new(&database, &password);

    let report = match cli.command {
        Commands::Init { force } => commands::cmd_init(&session, force)?,
        Commands::Get {
            entry,
            field,
            attachment,
        } => {
            let target = match attachment {
                Some(name) => GetTarget::Attachment(name),
                None => GetTarget::Field(field.unwrap_or_default()),
            };
            let value = commands::cmd_get(&session, &entry, &target)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&value)?;
            stdout.flush()?;
            return Ok(());
        }
        Commands::Set {
            entry,
            fields,
            attachments,
            dry_run,
        } => commands::cmd_set(&session.dry_run(dry_run), &entry, &fields, &attachments)?,
        Commands::Import { input, dry_run } => {
            commands::cmd_import(&session.dry_run(dry_run), &input)?
        }
        Commands::Export { output } => commands::cmd_export(&session, &output)?,
        Commands::Secrets { output, tag } => {
            let options = SecretOptions {
                tag,
                docker_email: config.docker_email.clone(),
            };
            commands::cmd_secrets(&session, &output, &options)?
        }
        Commands::List => {
            for path in commands::cmd_list(&session)? {
                println!("{}", path);
            }
            return Ok(());
        }
    };

    print_report(&report);
    Ok(())
}

fn print_report(report: &Report) {
    for line in report.transcript() {
        println!("{}", line);
    }
    for diagnostic in report.diagnostics() {
        eprintln!("{}", diagnostic);
    }
}
