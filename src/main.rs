use std::fs;
use std::sync::Arc;

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::Map;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use timekeeper::auth::{StoreIdentityProvider, TokenGenerator};
use timekeeper::config::ServerConfig;
use timekeeper::server::{AppState, create_router};
use timekeeper::store::{SqliteStore, Store};
use timekeeper::types::{ADMIN_ROLE, IdentityToken, User};

fn mint_token(generator: &TokenGenerator, email: &str) -> anyhow::Result<(IdentityToken, String)> {
    let (raw_token, lookup, hash) = generator.generate()?;
    let token = IdentityToken {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        token_hash: hash,
        token_lookup: lookup,
        created_at: Utc::now(),
        expires_at: None,
        last_used_at: None,
    };
    Ok((token, raw_token))
}

#[cfg(unix)]
fn set_restrictive_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "timekeeper")]
#[command(about = "Watch store backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "5000")]
        port: u16,

        /// Data directory for the database and admin token file
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and bootstrap admin)
    Init {
        /// Data directory for the database and admin token file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email for the bootstrap admin user
        #[arg(long, default_value = "admin@timekeeper.local")]
        email: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

fn run_init(data_dir: String, email: String, non_interactive: bool) -> anyhow::Result<()> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let db_path = data_path.join("timekeeper.db");
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    let token_file = data_path.join(".admin_token");

    if store.has_admin_user()? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    store.create_user(&User {
        email: email.clone(),
        role: Some(ADMIN_ROLE.to_string()),
        attributes: Map::new(),
    })?;

    let generator = TokenGenerator::new();
    let (token, raw_token) = mint_token(&generator, &email)?;
    store.create_identity_token(&token)?;
    fs::write(&token_file, &raw_token)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Admin user: {email}");
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    if !non_interactive {
        create_default_customer_prompt(&store, &generator)?;
    }

    Ok(())
}

fn create_default_customer_prompt(
    store: &SqliteStore,
    generator: &TokenGenerator,
) -> anyhow::Result<()> {
    let create_customer = inquire::Confirm::new("Would you like to create a default customer?")
        .with_default(false)
        .prompt()?;

    if !create_customer {
        return Ok(());
    }

    let email = inquire::Text::new("Email:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Err("Email cannot be empty".into())
            } else if !input.contains('@') || input.contains(char::is_whitespace) {
                Err("Email must be a single address".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;

    store.create_user(&User {
        email: email.clone(),
        role: None,
        attributes: Map::new(),
    })?;

    let (token, raw_token) = mint_token(generator, &email)?;
    store.create_identity_token(&token)?;

    println!();
    println!("========================================");
    println!("Created customer '{email}' with token:");
    println!();
    println!("  {raw_token}");
    println!();
    println!("========================================");
    println!();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("timekeeper=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                email,
                non_interactive,
            } => {
                run_init(data_dir, email, non_interactive)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
            };

            let token_file = config.admin_token_path();
            if !token_file.exists() {
                bail!(
                    "Server not initialized. Run 'timekeeper admin init' first to create the database and admin user."
                );
            }

            let store = Arc::new(SqliteStore::new(config.db_path())?);
            if !store.has_admin_user()? {
                bail!(
                    "Server not initialized. Run 'timekeeper admin init' first to create the database and admin user."
                );
            }

            let identity = Arc::new(StoreIdentityProvider::new(store.clone()));
            let state = Arc::new(AppState::new(store.clone(), identity));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            store.close()?;
            info!("Server stopped");
        }
    }

    Ok(())
}
