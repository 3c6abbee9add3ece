//! Command line definition.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for the `payql` binary.
///
/// Connection settings come from `PAYQL_*` environment variables; the flags
/// below override them.
#[derive(Debug, Parser)]
#[command(name = "payql", version, about = "Payql - payments GraphQL client")]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,

    /// GraphQL endpoint URL
    #[arg(long, global = true, env = "PAYQL_ENDPOINT")]
    pub endpoint: Option<String>,

    /// OAuth2 token endpoint URL
    #[arg(long, global = true, env = "PAYQL_TOKEN_ENDPOINT")]
    pub token_endpoint: Option<String>,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Subcommands.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Acquire a fresh access token and print a preview of it.
    Token,
    /// Acquire a token if needed and show its status.
    Status,
    /// Run a GraphQL document and print the `data` object.
    Query(QueryArgs),
}

/// Arguments of `payql query`.
#[derive(Clone, Debug, Args)]
pub struct QueryArgs {
    /// GraphQL document, or a path to a file containing one.
    #[arg(short, long)]
    pub query: String,
    /// Variables as a JSON object.
    #[arg(long)]
    pub variables: Option<String>,
    /// Operation to run when the document defines several.
    #[arg(long)]
    pub operation_name: Option<String>,
}
