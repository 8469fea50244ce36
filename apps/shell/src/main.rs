//! Headless lifecycle adapter.
//!
//! Stands in for the platform: each stdin line is translated into a
//! coordinator event (or a raw reachability observation, or an upload guard
//! call) so the whole state machine can be driven from a terminal or a script.

mod commands;

use anyhow::Context;
use clap::Parser;
use commands::{AuthVerdict, Command, HELP};
use lifeline_coordinator::{
    default_config_path, Collaborators, Coordinator, CoordinatorConfig, CoordinatorHandle,
    InMemoryBlogStore,
};
use lifeline_events::{LifecyclePhase, TracingEventBus};
use lifeline_notifications::{DeliveryContext, NullPushRegistrar};
use lifeline_reachability::{HttpProbe, ReachabilityNotifier, TargetKind};
use lifeline_session::{Authenticator, CheckError, Credentials, InMemoryCredentialStore};
use lifeline_uploads::{LoggingBackgroundExecution, UploadTicket};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Authenticator whose verdict is set from the command line.
struct ShellAuthenticator {
    verdict: Mutex<AuthVerdict>,
}

impl ShellAuthenticator {
    fn set(&self, verdict: AuthVerdict) {
        if let Ok(mut guard) = self.verdict.lock() {
            *guard = verdict;
        }
    }
}

#[async_trait::async_trait]
impl Authenticator for ShellAuthenticator {
    async fn verify(&self, credentials: &Credentials) -> Result<bool, CheckError> {
        let verdict = self
            .verdict
            .lock()
            .map(|guard| *guard)
            .unwrap_or(AuthVerdict::Fail);
        tracing::debug!(username = %credentials.username, ?verdict, "verifying credentials");
        match verdict {
            AuthVerdict::Accept => Ok(true),
            AuthVerdict::Reject => Ok(false),
            AuthVerdict::Fail => Err(CheckError::Transport("simulated transport failure".to_string())),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lifeline")]
#[command(about = "Drive the application-state coordinator from stdin", long_about = None)]
struct Args {
    /// Config file path (defaults to the per-user config location)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(default_config_path)
    }

    fn load_config(&self) -> anyhow::Result<CoordinatorConfig> {
        match self.config_path() {
            Some(path) => CoordinatorConfig::load_or_default(&path)
                .with_context(|| format!("loading {}", path.display())),
            None => Ok(CoordinatorConfig::default()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lifeline=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting lifeline shell");

    let config = args.load_config()?;
    let probe = HttpProbe::new(config.internet_probe_host.clone())
        .context("building reachability probe")?;

    let credentials = Arc::new(InMemoryCredentialStore::new());
    if let (Ok(username), Ok(secret)) = (
        std::env::var("LIFELINE_USERNAME"),
        std::env::var("LIFELINE_PASSWORD"),
    ) {
        credentials.store(Credentials::new(username, secret));
    }
    let authenticator = Arc::new(ShellAuthenticator {
        verdict: Mutex::new(AuthVerdict::Accept),
    });

    let collaborators = Collaborators {
        credentials,
        authenticator: authenticator.clone(),
        push: Arc::new(NullPushRegistrar),
        blogs: Arc::new(InMemoryBlogStore::default()),
        background: Arc::new(LoggingBackgroundExecution::default()),
        probe: Some(Arc::new(probe)),
        events: Arc::new(TracingEventBus),
        ..Collaborators::detached()
    };

    let mut coordinator = Coordinator::new(config, collaborators)?;
    let handle = coordinator.handle();
    let notifiers: Vec<(TargetKind, ReachabilityNotifier)> = TargetKind::ALL
        .iter()
        .map(|kind| (*kind, coordinator.notifier(*kind)))
        .collect();

    let shutdown = CancellationToken::new();
    let runner = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { coordinator.run(shutdown).await }
    });

    println!("{HELP}");
    let mut shell = Shell {
        handle,
        notifiers,
        authenticator,
        ticket: None,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(e) = shell.execute(command) {
                    eprintln!("error: {e:#}");
                }
            }
            Err(message) => eprintln!("{message}"),
        }
    }

    shell.handle.terminating()?;
    if tokio::time::timeout(std::time::Duration::from_secs(2), runner)
        .await
        .is_err()
    {
        shutdown.cancel();
    }
    Ok(())
}

struct Shell {
    handle: CoordinatorHandle,
    notifiers: Vec<(TargetKind, ReachabilityNotifier)>,
    authenticator: Arc<ShellAuthenticator>,
    ticket: Option<UploadTicket>,
}

impl Shell {
    fn execute(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Launch(payload) => self.handle.launched(payload)?,
            Command::Foreground => self.handle.entered_foreground()?,
            Command::Background => self.handle.entered_background()?,
            Command::UiReady => self.handle.ui_ready()?,
            Command::Push(payload) => {
                let context = if self.handle.snapshot().phase == LifecyclePhase::Foreground {
                    DeliveryContext::Foreground
                } else {
                    DeliveryContext::Background
                };
                self.handle.push_received(payload, context)?;
            }
            Command::Token(token) => self.handle.device_token_received(token)?,
            Command::Alert { title, message } => self.handle.show_alert(title, message)?,
            Command::Dismiss => self.handle.alert_dismissed()?,
            Command::Check => self.handle.check_authentication()?,
            Command::Auth(verdict) => self.authenticator.set(verdict),
            Command::Blog(blog) => self.handle.select_blog(blog)?,
            Command::Net {
                target,
                observation,
            } => {
                let notifier = self
                    .notifiers
                    .iter()
                    .find(|(kind, _)| *kind == target)
                    .map(|(_, notifier)| notifier)
                    .context("no notifier for target")?;
                if notifier.notify(observation).is_none() {
                    println!("no change (monitor stopped or state unchanged)");
                }
            }
            Command::UploadBegin => {
                let ticket = self.handle.begin_upload()?;
                println!("upload started: {}", ticket.id());
                self.ticket = Some(ticket);
            }
            Command::UploadEnd => match self.ticket.take() {
                Some(ticket) => {
                    let released = self.handle.end_upload(&ticket);
                    println!("upload ended (released: {released})");
                }
                None => println!("no upload ticket held"),
            },
            Command::Expire => match self.handle.expiration_warning() {
                Some(ticket) => println!("upload {ticket} force-ended"),
                None => println!("nothing to expire"),
            },
            Command::Wipe => self.handle.wipe_credentials()?,
            Command::Status => {
                let snapshot = self.handle.snapshot();
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                println!("usable: {}", snapshot.is_usable());
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
        Ok(())
    }
}
