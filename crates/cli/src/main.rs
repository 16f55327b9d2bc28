//! PedidoFlex CLI - data seeding and account management.
//!
//! # Usage
//!
//! ```bash
//! # Seed a data directory with the starter catalog, entities, and news
//! pedidoflex-cli seed --data-dir ./data
//!
//! # Create an administrator account
//! pedidoflex-cli admin create --data-dir ./data \
//!     -e admin@pedidoflex.com.br -n "Admin" -p <password>
//! ```
//!
//! # Commands
//!
//! - `seed` - Write the starter data set into a snapshot data directory
//! - `admin create` - Create an administrator account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pedidoflex-cli")]
#[command(author, version, about = "PedidoFlex CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed a data directory with the starter data set
    Seed {
        /// Snapshot data directory (the portal's PORTAL_DATA_DIR)
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
    /// Manage administrator accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new administrator account
    Create {
        /// Snapshot data directory (the portal's PORTAL_DATA_DIR)
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Password for the new account
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { data_dir } => commands::seed::run(&data_dir).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                data_dir,
                email,
                name,
                password,
            } => commands::admin::create(&data_dir, &email, &name, &password).await?,
        },
    }
    Ok(())
}
