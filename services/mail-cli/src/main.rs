//! Webmail command-line client
//!
//! Signs in once, keeps the token pair in a session file, and runs mailbox
//! commands through the authenticated client. Structured output goes to
//! stdout; logs and `--metrics` output go to stderr.

mod cli;
mod config;
mod metrics;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use mail_auth::{FileStorage, LoginRequest, SessionStore};
use mail_client::endpoints::{self, Page, email::EmailQuery};
use mail_client::{AuthenticatedClient, Error, FnHook, account};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, Invocation, PAGE_SIZE, USAGE};
use crate::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let invocation = match cli::parse(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    if invocation.command == Command::Help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let prometheus = if invocation.print_metrics {
        match metrics::install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "metrics disabled");
                None
            }
        }
    } else {
        None
    };

    // Set once the invalidation hook has told the user their session ended
    let notified = Arc::new(AtomicBool::new(false));
    let result = run(&invocation, notified.clone()).await;

    if let Some(handle) = prometheus {
        eprint!("{}", handle.render());
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<Error>() {
                Some(Error::SessionExpired) if notified.load(Ordering::SeqCst) => {}
                Some(client_error) => eprintln!("{}", client_error.user_message()),
                None => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(invocation: &Invocation, notified: Arc<AtomicBool>) -> Result<()> {
    let config_path = Config::resolve_path(invocation.config_path.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let session = SessionStore::restore(FileStorage::new(&config.session.storage_path))
        .await
        .with_context(|| {
            format!(
                "failed to restore session from {}",
                config.session.storage_path.display()
            )
        })?;
    let session = Arc::new(session);

    info!(
        base_url = %config.server.base_url,
        authenticated = session.is_authenticated(),
        "configuration loaded"
    );

    if invocation.command.needs_session() && !session.is_authenticated() {
        bail!("not signed in, run `mail-cli login` first");
    }

    let hook = FnHook::new(move || {
        if !notified.swap(true, Ordering::SeqCst) {
            eprintln!("{}", Error::SessionExpired.user_message());
        }
    });
    let client = AuthenticatedClient::connect(
        &config.server.base_url,
        session,
        config.server.request_timeout(),
    )?
    .refresh_timeout(config.server.refresh_timeout())
    .hook(hook)
    .build();

    match &invocation.command {
        Command::Login { username } => {
            let username = username
                .clone()
                .or_else(|| config.account.username.clone())
                .context("no username given and account.username is not set")?;
            let password = config
                .account
                .password
                .as_ref()
                .context("no password: set MAIL_PASSWORD or account.password_file")?;
            let user =
                account::login(&client, &LoginRequest::new(username, password.expose())).await?;
            print_json(&serde_json::to_value(&user)?)?;
        }
        Command::Logout => account::logout(&client).await?,
        Command::Whoami => match account::check_auth(&client).await? {
            Some(user) => print_json(&serde_json::to_value(&user)?)?,
            None => bail!("session is no longer valid, run `mail-cli login`"),
        },
        Command::Emails { page } => {
            let query = EmailQuery {
                page: Page::new(*page, PAGE_SIZE),
                ..EmailQuery::default()
            };
            let emails: Value = client.execute_json(endpoints::email::list(&query)).await?;
            print_json(&emails)?;
        }
        Command::Email { id } => {
            let email: Value = client.execute_json(endpoints::email::get(*id)).await?;
            print_json(&email)?;
        }
        Command::Download { id, output } => {
            let bytes = client
                .execute_bytes(endpoints::attachment::download(*id))
                .await?;
            tokio::fs::write(output, &bytes)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!(attachment = id, bytes = bytes.len(), path = %output.display(), "attachment saved");
        }
        Command::Aliases => {
            let aliases: Value = client
                .execute_json(endpoints::alias::list(Page::new(0, PAGE_SIZE), None))
                .await?;
            print_json(&aliases)?;
        }
        Command::Help => println!("{USAGE}"),
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
