use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use planner::config::{AppConfig, CliConfig, FileConfig};
use planner::planning::{PlanRequest, PlannerStore, RequestRole, SqlitePlannerStore, UserId};
use planner::SqliteMailOutbox;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser, Debug)]
#[command(version = VERSION, about = "Planner database maintenance")]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI ones.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding planner.db and mail_outbox.db.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates, validates and migrates both databases.
    Init,

    /// Shows the open requests a user is involved in, grouped by role.
    OpenRequests {
        #[clap(long)]
        user: UserId,
    },

    /// Lists the mail waiting for delivery.
    PendingMail,

    /// Marks an outbox mail as delivered.
    MarkDelivered { id: i64 },
}

fn print_requests(title: &str, requests: &[PlanRequest]) {
    println!("{} ({})", title, requests.len());
    for request in requests {
        println!(
            "  #{:<5} task {:<5} resource {:<5} {:<8} {}",
            request.id,
            request.task_id,
            request.resource_id,
            request.status_string(),
            request.priority_string()
        );
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir.clone(),
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    match cli_args.command {
        Command::Init => {
            info!("Opening planner database at {:?}...", config.planner_db_path());
            SqlitePlannerStore::new(config.planner_db_path())?;
            info!("Opening mail outbox at {:?}...", config.mail_db_path());
            SqliteMailOutbox::new(config.mail_db_path(), config.mail.clone())?;
            info!("Databases ready in {:?}", config.db_dir);
        }
        Command::OpenRequests { user } => {
            let store = SqlitePlannerStore::new(config.planner_db_path())?;
            for (title, role) in [
                ("As requester", RequestRole::Requester),
                ("As approver", RequestRole::Approver),
                ("As resource", RequestRole::Resource),
            ] {
                print_requests(title, &store.list_open_requests(role, user)?);
            }
        }
        Command::PendingMail => {
            let outbox = SqliteMailOutbox::new(config.mail_db_path(), config.mail.clone())?;
            let pending = outbox.pending()?;
            println!("{} pending mail(s)", pending.len());
            for message in pending {
                println!(
                    "  #{:<5} {} -> user {}: {}",
                    message.id,
                    message.mail.sender,
                    message.mail.recipient_id,
                    message.mail.subject
                );
            }
        }
        Command::MarkDelivered { id } => {
            let outbox = SqliteMailOutbox::new(config.mail_db_path(), config.mail.clone())?;
            if outbox.mark_delivered(id)? {
                println!("Mail {} marked as delivered", id);
            } else {
                println!("Mail {} not found or already delivered", id);
            }
        }
    }

    Ok(())
}
