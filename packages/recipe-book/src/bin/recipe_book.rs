//! Command-line client for the recipe book.
//!
//! Each subcommand boots the application, dispatches one intent, waits for
//! every effect it triggers, and prints the resulting state slice as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recipe_book_core::domains::auth::{AuthAction, AuthCredentials};
use recipe_book_core::domains::recipes::RecipeAction;
use recipe_book_core::kernel::AppDeps;
use recipe_book_core::{App, AppAction, Config};

#[derive(Parser)]
#[command(name = "recipe-book")]
#[command(about = "Recipe book client backed by Firebase")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load recipes from the database
    Fetch,

    /// Load recipes, then write them back unchanged
    Store,

    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign in to an existing account
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the current session
    Logout,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,recipe_book_core=debug,reflux=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing::debug!(?config, "loaded configuration");

    let app = App::boot(AppDeps::from_config(&config));

    let intents: Vec<AppAction> = match &cli.command {
        Commands::Fetch => vec![RecipeAction::FetchRecipes.into()],
        Commands::Store => vec![
            RecipeAction::FetchRecipes.into(),
            RecipeAction::StoreRecipes.into(),
        ],
        Commands::Signup { email, password } => {
            vec![AuthAction::TrySignup(AuthCredentials::new(email, password)).into()]
        }
        Commands::Signin { email, password } => {
            vec![AuthAction::TrySignin(AuthCredentials::new(email, password)).into()]
        }
        Commands::Logout => vec![AuthAction::Logout.into()],
    };

    let mut outcome = Ok(());
    for intent in intents {
        let tag = reflux::Action::kind(&intent);
        outcome = app
            .store
            .dispatch_and_settle_timeout(intent, config.settle_timeout)
            .await
            .with_context(|| format!("{} did not complete", tag));
        if outcome.is_err() {
            break;
        }
    }

    let state = app.store.snapshot();
    match cli.command {
        Commands::Fetch | Commands::Store => print_json(&state.recipes)?,
        _ => print_json(&state.auth)?,
    }

    app.shutdown();

    match outcome {
        Ok(()) => {
            eprintln!("{}", "done".green());
            Ok(())
        }
        Err(err) => {
            eprintln!("{} {:#}", "failed:".red().bold(), err);
            std::process::exit(1)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize state")?;
    println!("{}", json);
    Ok(())
}
