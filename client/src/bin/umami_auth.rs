//! Drive the auth flow against a configured backend from the command line.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tokio::sync::watch;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use umami_client::domain::ports::{DocumentStore, IdentityGateway};
use umami_client::domain::{
    AuthOutcome, AuthSessionController, Credentials, ProfileState, ProfileSyncListener,
};
use umami_client::inbound::{Reaction, greeting};
use umami_client::outbound::InMemoryBackend;
use umami_client::outbound::rest::{BackendSettings, RestBackend, RestBackendConfig};

/// `umami-auth` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "umami-auth",
    about = "Exercise sign-up, sign-in, password reset and profile sync",
    version
)]
struct Cli {
    /// Backend to talk to.
    #[arg(long, value_enum, default_value_t = BackendKind::Rest)]
    backend: BackendKind,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Hosted services configured through `UMAMI_BACKEND_*`.
    Rest,
    /// Process-local backend; state is lost on exit.
    Memory,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account and its profile document.
    SignUp {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long = "confirm-password")]
        confirm_password: String,
    },
    /// Sign in with email and password.
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Request a password reset email.
    Reset {
        #[arg(long)]
        email: String,
    },
    /// Sign in and print the home greeting as the profile changes.
    Watch {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// How long to keep watching.
        #[arg(long, default_value_t = 30)]
        seconds: u64,
    },
}

struct Backends {
    gateway: Arc<dyn IdentityGateway>,
    store: Arc<dyn DocumentStore>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(cli))
}

fn backends(kind: BackendKind) -> Result<Backends> {
    match kind {
        BackendKind::Memory => {
            let backend = InMemoryBackend::new();
            Ok(Backends {
                gateway: Arc::new(backend.clone()),
                store: Arc::new(backend),
            })
        }
        BackendKind::Rest => {
            let settings = BackendSettings::load_from_iter([OsString::from("umami-auth")])
                .map_err(|error| eyre!("load backend settings: {error}"))?;
            let config = RestBackendConfig::try_from(&settings)?;
            let backend = RestBackend::connect(&config).wrap_err("build HTTP client")?;
            Ok(Backends {
                gateway: backend.identity,
                store: backend.documents,
            })
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Backends { gateway, store } = backends(cli.backend)?;
    let controller = AuthSessionController::new(Arc::clone(&gateway), Arc::clone(&store));

    match cli.command {
        Command::SignUp {
            name,
            email,
            username,
            password,
            confirm_password,
        } => {
            let credentials =
                Credentials::sign_up(name, email, username, password, confirm_password);
            report(&controller.sign_up(&credentials).await)
        }
        Command::SignIn { email, password } => {
            report(&controller.sign_in(&Credentials::sign_in(email, password)).await)
        }
        Command::Reset { email } => report(&controller.send_password_reset(&email).await),
        Command::Watch {
            email,
            password,
            seconds,
        } => {
            let mut listener = ProfileSyncListener::new(gateway, store);
            let watcher = listener.watch();
            listener.start();
            let outcome = controller
                .sign_in(&Credentials::sign_in(email, password))
                .await;
            report(&outcome)?;
            if !outcome.is_success() {
                return Ok(());
            }

            let deadline = tokio::time::sleep(Duration::from_secs(seconds));
            tokio::select! {
                () = listener.run_until(deadline) => Ok(()),
                printed = print_greetings(watcher) => printed,
            }
        }
    }
}

fn report(outcome: &AuthOutcome) -> Result<()> {
    let reaction = Reaction::from_outcome(outcome);
    let mut out = io::stdout().lock();
    if let Some(notice) = reaction.notice {
        writeln!(out, "{}: {}", notice.title, notice.message)?;
    }
    for (field, message) in &reaction.field_errors {
        writeln!(out, "{}: {message}", field.key())?;
    }
    if let Some(route) = reaction.navigate {
        writeln!(out, "-> {route:?}")?;
    }
    Ok(())
}

async fn print_greetings(mut watcher: watch::Receiver<ProfileState>) -> Result<()> {
    while watcher.changed().await.is_ok() {
        let line = format!("Welcome, {}!", greeting(&watcher.borrow_and_update()));
        writeln!(io::stdout().lock(), "{line}")?;
    }
    Ok(())
}
