use anyhow::Result;
use clap::Parser;
use client_core::{ClientConfig, ClientEvent, Credentials, ProvisioningClient};
use shared::domain::Phase;
use shared::protocol::DeploymentResult;
use tokio::sync::broadcast::{self, error::RecvError};

/// Provision a store instance and stream deployment progress.
#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the provisioning API; falls back to BACKEND_URL.
    #[arg(long)]
    api_url: Option<String>,
    /// Admin email for the new store.
    #[arg(long)]
    email: String,
    /// Admin password (min 8 chars with letters, numbers and special chars).
    #[arg(long)]
    password: String,
}

#[derive(Debug)]
enum Verdict {
    Deployed(DeploymentResult),
    Failed(String),
}

/// Renders progress lines until the stream yields a verdict. A lagged
/// receiver skips the dropped lines and keeps listening; only a closed
/// stream ends without a verdict.
async fn watch(events: &mut broadcast::Receiver<ClientEvent>) -> Option<Verdict> {
    loop {
        match events.recv().await {
            Ok(ClientEvent::PhaseChanged(phase)) => {
                if phase == Phase::Processing {
                    println!("Provisioning...");
                }
            }
            Ok(ClientEvent::ProgressUpdated(state)) => {
                let stage = state.stage.as_deref().unwrap_or("working");
                let server = state
                    .server_percent
                    .map(|p| format!(" (server: {p}%)"))
                    .unwrap_or_default();
                println!(
                    "  {:>3}%{server}  {stage}  ~{}s remaining",
                    state.percent, state.remaining_seconds
                );
            }
            Ok(ClientEvent::ResultDisclosed(result)) => return Some(Verdict::Deployed(result)),
            Ok(ClientEvent::DeploymentFailed(message)) => return Some(Verdict::Failed(message)),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = args.api_url {
        config.base_url = api_url;
    }

    let client = ProvisioningClient::new(config)?;
    let mut events = client.subscribe_events();

    client
        .deploy(Credentials {
            email: args.email,
            password: args.password,
        })
        .await?;

    match watch(&mut events).await {
        Some(Verdict::Deployed(result)) => {
            println!();
            println!("Store Successfully Deployed");
            println!("  Store URL:     {}", result.url);
            println!("  Admin Panel:   {}", result.admin_url);
            println!("  Email:         {}", result.admin_email);
            println!("  Password:      {}", result.admin_password);
            Ok(())
        }
        Some(Verdict::Failed(message)) => {
            eprintln!("Error: {message}");
            std::process::exit(1);
        }
        None => Ok(()),
    }
}
