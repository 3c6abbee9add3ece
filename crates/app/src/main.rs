//! Payql - Main Entry Point
//!
//! Command line client that exercises the SDK against a live payments API.

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use payql_application::{AuthManager, GraphqlClient};
use payql_domain::auth::token_preview;
use payql_domain::SdkConfig;
use payql_infrastructure::config::{ENV_ENDPOINT, ENV_TOKEN_ENDPOINT};
use payql_infrastructure::{ReqwestTransport, SystemClock, config_from_lookup};
use serde_json::Value;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, QueryArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli)?;
    debug!(endpoint = %config.endpoint, "configuration loaded");

    let transport = Arc::new(ReqwestTransport::new()?);
    let auth = Arc::new(AuthManager::from_config(
        &config,
        transport.clone(),
        Arc::new(SystemClock::new()),
    ));

    match cli.command {
        Commands::Token => {
            auth.refresh(None).await?;
            let token = auth.token().unwrap_or_default();
            println!("Bearer {}", token_preview(&token));
            println!("{}", auth.status().display_message());
        }
        Commands::Status => {
            for line in status_report(&auth).await {
                println!("{line}");
            }
        }
        Commands::Query(args) => {
            let client = GraphqlClient::new(&config, auth, transport)?;
            let data = run_query(&client, &args).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }

    Ok(())
}

/// Environment configuration with command line overrides.
fn load_config(cli: &Cli) -> Result<SdkConfig, Box<dyn std::error::Error>> {
    let config = config_from_lookup(|name| {
        let flag = match name {
            ENV_ENDPOINT => cli.endpoint.clone(),
            ENV_TOKEN_ENDPOINT => cli.token_endpoint.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(name).ok())
    })?;
    Ok(config)
}

/// Refreshes when due and describes the resulting token state.
async fn status_report(auth: &AuthManager) -> Vec<String> {
    let mut failure = None;
    if auth.should_refresh_token()
        && let Err(err) = auth.refresh(None).await
    {
        warn!(error = %err, "no access token could be obtained");
        failure = Some(err);
    }

    let mut lines = vec![auth.status().display_message()];
    if let Some(expires_at) = auth.token_expiration() {
        lines.push(format!("Expires at {}", expires_at.to_rfc3339()));
    }
    if let Some(err) = failure {
        lines.push(format!("Reason: {err}"));
    }
    lines
}

async fn run_query(
    client: &GraphqlClient,
    args: &QueryArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let document = if Path::new(&args.query).is_file() {
        std::fs::read_to_string(&args.query)?
    } else {
        args.query.clone()
    };
    let variables = args
        .variables
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()?;

    let data = client
        .raw(&document, variables.as_ref(), args.operation_name.as_deref())
        .await?;
    Ok(data)
}
