//! Contactload CLI - Import and export contact CSV files
//!
//! # Main Commands
//!
//! ```bash
//! contactload serve                               # Start HTTP server (port 3000)
//! contactload import contacts.csv --owner u1      # Import into the data directory
//! contactload export --owner u1 -o contacts.csv   # Export stored contacts
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! contactload check contacts.csv   # Validate without storing
//! contactload parse contacts.csv   # Just tokenize CSV to JSON
//! ```

use clap::{Parser, Subcommand};
use contactload::{
    config::ServerConfig,
    contacts::export_for,
    decode_upload, import_upload, summarize, tokenize, ImportOptions, JsonFileStore, Owner,
    Upload, UploadPolicy,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contactload")]
#[command(about = "Import and export organisation contacts as CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (default: CONTACTLOAD_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Contact store directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Import a CSV file into the contact store
    Import {
        /// Input CSV file
        input: PathBuf,

        /// Owner id the contacts are stored under
        #[arg(long)]
        owner: String,

        /// Owner email, copied onto stored contacts
        #[arg(long, default_value = "")]
        email: String,

        /// Contact store directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Validate a CSV file without storing anything
    Check {
        /// Input CSV file
        input: PathBuf,
    },

    /// Tokenize a CSV file and output the rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export stored contacts as CSV
    Export {
        /// Only contacts owned by this id
        #[arg(long)]
        owner: Option<String>,

        /// Export every owner's contacts
        #[arg(long)]
        superuser: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Contact store directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port, data_dir } => cmd_serve(port, data_dir).await,

        Commands::Import {
            input,
            owner,
            email,
            data_dir,
        } => cmd_import(&input, Owner::new(owner, email), data_dir),

        Commands::Check { input } => cmd_check(&input),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Export {
            owner,
            superuser,
            output,
            data_dir,
        } => cmd_export(owner, superuser, output.as_deref(), data_dir),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(port: Option<u16>, data_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?
        .with_port(port)
        .with_data_dir(data_dir);

    contactload::server::start_server(config).await
}

fn cmd_import(input: &Path, owner: Owner, data_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?.with_data_dir(data_dir);
    let upload = read_upload(input)?;

    let options = ImportOptions {
        policy: UploadPolicy::with_max_bytes(config.max_upload_bytes),
        ..ImportOptions::default()
    };
    let store = JsonFileStore::new(&config.data_dir);

    let summary = import_upload(&upload, &options, &owner, &store)?;

    eprintln!("💾 Store: {}", store.path().display());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_check(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Checking: {}", input.display());

    let config = ServerConfig::from_env()?;
    let upload = read_upload(input)?;
    let decoded = UploadPolicy::with_max_bytes(config.max_upload_bytes).accept(&upload)?;
    eprintln!("   Encoding: {}", decoded.encoding);

    let plan = summarize(&decoded.text, &ImportOptions::default().aliases)?;
    eprintln!(
        "\n📊 Results: {} valid, {} invalid",
        plan.accepted.len(),
        plan.summary.skipped
    );

    println!("{}", serde_json::to_string_pretty(&plan)?);

    if plan.summary.skipped > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let bytes = fs::read(input)?;
    let decoded = decode_upload(&bytes);
    let rows = tokenize(&decoded.text);

    eprintln!("   Encoding: {}", decoded.encoding);
    if let Some(header) = rows.first() {
        eprintln!("   Columns: {}", header.join(", "));
    }
    eprintln!("✅ Parsed {} rows", rows.len());

    let json = serde_json::to_string_pretty(&rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_export(
    owner: Option<String>,
    superuser: bool,
    output: Option<&Path>,
    data_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let viewer = match (owner, superuser) {
        (_, true) => Owner::new("cli", "").superuser(),
        (Some(id), false) => Owner::new(id, ""),
        (None, false) => return Err("Pass --owner <id> or --superuser".into()),
    };

    let config = ServerConfig::from_env()?.with_data_dir(data_dir);
    let store = JsonFileStore::new(&config.data_dir);

    let csv = export_for(&viewer, &store)?;
    write_output(&csv, output)?;

    Ok(())
}

fn read_upload(input: &Path) -> Result<Upload, Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(Upload::new(file_name, bytes))
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
