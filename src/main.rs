use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webdav_session::{ResourceEntry, Scheme, SessionConfig, WebDAVSession};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "WEBDAV_HOST")]
    host: String,
    #[arg(long, env = "WEBDAV_PORT", default_value_t = 80)]
    port: u16,
    #[arg(long, env = "WEBDAV_USER", default_value_t = String::new())]
    user: String,
    #[arg(short, long, env = "WEBDAV_PASSWORD", default_value_t = String::new(), hide_env_values = true)]
    password: String,
    /// Connect with TLS.
    #[arg(long)]
    https: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the immediate children of a collection
    Ls { uri: String },
    /// List a collection and everything below it
    Tree { uri: String },
    /// Exit with 0 if the resource exists
    Exist { uri: String },
    /// Upload a local file
    Put { uri: String, local: PathBuf },
    /// Download a resource into a local file
    Get { uri: String, local: PathBuf },
    /// Create a collection
    Mkdir { uri: String },
    /// Delete a resource
    Rm { uri: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let scheme = if args.https { Scheme::Https } else { Scheme::Http };
    let config =
        SessionConfig::new(&args.host, args.port, &args.user, &args.password).with_scheme(scheme);
    let mut session = match WebDAVSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let ok = match &args.command {
        Command::Ls { uri } => {
            let list = session.list(uri).await;
            print_entries(&list);
            session.last_failure().is_none()
        }
        Command::Tree { uri } => {
            let list = session.tree(uri).await;
            print_entries(&list);
            session.last_failure().is_none()
        }
        Command::Exist { uri } => session.exists(uri).await,
        Command::Put { uri, local } => session.put(uri, local).await,
        Command::Get { uri, local } => session.get(uri, local).await,
        Command::Mkdir { uri } => session.mkdir(uri).await,
        Command::Rm { uri } => session.rm(uri).await,
    };

    let code = if ok {
        ExitCode::SUCCESS
    } else {
        let error = session.last_error();
        if !error.is_empty() {
            eprintln!("{}", error);
        }
        ExitCode::FAILURE
    };
    session.close();
    code
}

fn print_entries(list: &[ResourceEntry]) {
    for entry in list {
        let kind = if entry.is_directory() { 'd' } else { '-' };
        let content_type = if entry.content_type().is_empty() {
            "-"
        } else {
            entry.content_type()
        };
        println!(
            "{} {:<29} {:<24} {}",
            kind,
            entry.last_modified(),
            content_type,
            entry.path()
        );
    }
}
