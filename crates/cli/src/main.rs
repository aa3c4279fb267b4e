//! Greenbasket CLI - Back-office chores against the hosted platform.
//!
//! # Usage
//!
//! ```bash
//! # List role assignments
//! gb-cli roles list
//!
//! # Make a user an admin
//! gb-cli roles grant -u 7c4b7a0e-4b7e-4d55-9d2b-0d3b1f1e8a11 -r admin
//!
//! # Move an order along
//! gb-cli orders status -o 2f1d0c8e-9a7b-4c3d-8e2f-1a0b9c8d7e6f -s shipped
//!
//! # Dashboard numbers
//! gb-cli stats
//!
//! # Products with 5 or fewer units left
//! gb-cli stock low -t 5
//! ```
//!
//! # Environment Variables
//!
//! - `PLATFORM_URL` - Base URL of the hosted platform
//! - `PLATFORM_ANON_KEY` - Public anonymous API key
//! - `PLATFORM_SERVICE_ROLE_KEY` - Service-role key (required)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use greenbasket_core::{OrderId, OrderStatus, Role, UserId};
use greenbasket_storefront::services::admin::LOW_STOCK_THRESHOLD;

mod commands;

#[derive(Parser)]
#[command(name = "gb-cli")]
#[command(author, version, about = "Greenbasket CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage user roles
    Roles {
        #[command(subcommand)]
        action: RolesAction,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Show dashboard counts and revenue
    Stats,
    /// Inspect stock levels
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
}

#[derive(Subcommand)]
enum RolesAction {
    /// List every role assignment
    List,
    /// Change a user's role
    Grant {
        /// User ID (UUID)
        #[arg(short, long)]
        user: UserId,

        /// Role to assign (`admin`, `customer`)
        #[arg(short, long)]
        role: Role,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Set an order's status
    Status {
        /// Order ID (UUID)
        #[arg(short, long)]
        order: OrderId,

        /// New status (`pending`, `processing`, `shipped`, `delivered`, `cancelled`)
        #[arg(short, long)]
        status: OrderStatus,
    },
}

#[derive(Subcommand)]
enum StockAction {
    /// List products at or below a stock threshold
    Low {
        /// Stock threshold
        #[arg(short, long, default_value_t = LOW_STOCK_THRESHOLD)]
        threshold: i32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let client = commands::service_client()?;

    match cli.command {
        Commands::Roles { action } => match action {
            RolesAction::List => commands::roles::list(&client).await?,
            RolesAction::Grant { user, role } => {
                commands::roles::grant(&client, user, &role).await?;
            }
        },
        Commands::Orders { action } => match action {
            OrdersAction::Status { order, status } => {
                commands::orders::set_status(&client, order, status).await?;
            }
        },
        Commands::Stats => commands::stats::show(&client).await?,
        Commands::Stock { action } => match action {
            StockAction::Low { threshold } => commands::stock::low(&client, threshold).await?,
        },
    }
    Ok(())
}
