use std::sync::Arc;

use anyhow::Result;
use campus_auth::{AuthController, post_login_route};
use campus_cli::render;
use campus_cli::shell::{Portal, Shell};
use campus_client::{BackendClient, RemoteDirectory, RemoteObjectStorage, RemoteSessionStore};
use campus_config::{AuthConfig, BackendConfig};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "campus-cli")]
#[command(about = "Campus portal - terminal client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell (default)
    Shell,
    /// Sign in and save the session for later runs
    Login {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Show the signed-in user
    Whoami,
    /// Sign out and forget the saved session
    Logout,
}

fn init_tracing() {
    let filter = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command.unwrap_or(Commands::Shell)).await {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    let client = BackendClient::new(BackendConfig::from_env())?;
    let store = Arc::new(RemoteSessionStore::new(client.clone()));
    let directory = Arc::new(RemoteDirectory::new(client.clone()));
    let keeper = store.keep_fresh();
    let controller = AuthController::start(store, directory, AuthConfig::from_env());

    match command {
        Commands::Shell => {
            let storage = Arc::new(RemoteObjectStorage::new(client.clone()));
            let portal = Portal::new(client, storage);
            Shell::new(controller, portal).run().await?;
        }
        Commands::Login { email, password } => {
            handle_login(&controller, email, password).await?;
            controller.shutdown().await;
        }
        Commands::Whoami => {
            let state = controller.settled().await;
            println!("{}", render::whoami(&state));
            controller.shutdown().await;
        }
        Commands::Logout => {
            controller.settled().await;
            controller.sign_out().await;
            println!("✅ Signed out");
            controller.shutdown().await;
        }
    }
    keeper.abort();
    Ok(())
}

async fn handle_login(
    controller: &AuthController,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let state = controller.settled().await;
    if let Some(home) = post_login_route(&state) {
        println!("Already signed in. Your home page is {}.", home);
        return Ok(());
    }

    let email = match email {
        Some(email) => email,
        None => {
            tokio::task::spawn_blocking(|| {
                Input::<String>::new()
                    .with_prompt("Email address")
                    .interact_text()
            })
            .await??
        }
    };
    let password = match password {
        Some(password) => password,
        None => {
            tokio::task::spawn_blocking(|| Password::new().with_prompt("Password").interact())
                .await??
        }
    };

    controller.sign_in(&email, &password).await?;

    let state = controller
        .wait_until(|s| s.is_signed_in() && !s.loading())
        .await;
    println!("✅ Signed in");
    println!("{}", render::whoami(&state));
    if let Some(home) = post_login_route(&state) {
        println!("   Home page: {}", home);
    }
    Ok(())
}
