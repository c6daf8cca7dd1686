use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "smoc")]
#[command(about = "Inline menu-order editing from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Persist one menu order through the field controller
    Update {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Record (post) id
        #[arg(long)]
        post_id: String,

        /// Per-record nonce
        #[arg(long)]
        nonce: Option<String>,

        /// Menu order currently stored for the record
        #[arg(long, default_value_t = 0)]
        current: i64,

        /// New menu order as typed by the operator
        #[arg(long)]
        value: String,
    },

    /// Interactive editing session over a list of records
    Session {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// YAML file listing the records (post_id, nonce, menu_order)
        #[arg(long)]
        fields: String,
    },
}

fn init_tracing() {
    // stdout belongs to command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent when absent.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let loaded = smoc_config::load_layered_yaml(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Update {
            config_paths,
            post_id,
            nonce,
            current,
            value,
        } => {
            commands::update::run(&config_paths, post_id, nonce, current, &value).await?;
        }

        Commands::Session {
            config_paths,
            fields,
        } => {
            commands::session::run(&config_paths, &fields).await?;
        }
    }

    Ok(())
}
