//! CLI argument definitions and parsing.
//!
//! Responsibilities:
//! - Define the CLI structure using clap derive macros.
//! - Parse command-line arguments and environment variables.
//! - Parse `key=value` pairs for query parameters and form fields.
//!
//! Non-responsibilities:
//! - Does not execute commands (see `dispatch` module).
//! - Does not build the configuration (see `main`).

use clap::{Args, Parser, Subcommand};
use nuvem_fiscal_config::Environment;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nfiscal")]
#[command(about = "Nuvem Fiscal CLI - Call the Nuvem Fiscal API with cached OAuth2 credentials", long_about = None)]
#[command(version)]
#[command(
    after_help = "Examples:\n  nfiscal token\n  nfiscal get /cnpj/12345678000190\n  nfiscal get /empresas --query '$top=10'\n  nfiscal post /nfse --body-file nfse.json\n  nfiscal upload /empresas/12345678000190/certificado/upload cert.pfx --field password=s3nh4\n"
)]
pub struct Cli {
    /// OAuth2 client ID
    #[arg(long, global = true, env = "NUVEM_FISCAL_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth2 client secret
    #[arg(long, global = true, env = "NUVEM_FISCAL_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// API environment (production or sandbox); selects the default API URL
    #[arg(short, long, global = true, env = "NUVEM_FISCAL_ENVIRONMENT")]
    pub environment: Option<Environment>,

    /// Token endpoint URL (overrides the environment default)
    #[arg(long, global = true, env = "NUVEM_FISCAL_TOKEN_URL")]
    pub token_url: Option<String>,

    /// API root URL (overrides the environment default)
    #[arg(long, global = true, env = "NUVEM_FISCAL_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Space-separated OAuth2 scopes
    #[arg(long, global = true, env = "NUVEM_FISCAL_SCOPE")]
    pub scope: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "NUVEM_FISCAL_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Re-attempt a request once with a fresh token after a 401
    #[arg(long, global = true)]
    pub retry_on_unauthorized: bool,

    /// Path to a JSON configuration file.
    ///
    /// Can also be set via NUVEM_FISCAL_CONFIG_PATH environment variable.
    #[arg(long, global = true, env = "NUVEM_FISCAL_CONFIG_PATH", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// OTLP gRPC endpoint for exporting traces (e.g., http://localhost:4317)
    #[arg(long, global = true, env = "NUVEM_FISCAL_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Obtain an access token and report its expiry
    Token {
        /// Print the access token itself
        #[arg(long)]
        show: bool,
    },

    /// Send a GET request
    Get(RequestArgs),

    /// Send a POST request with a JSON body
    Post(RequestArgs),

    /// Send a PUT request with a JSON body
    Put(RequestArgs),

    /// Send a DELETE request
    Delete(RequestArgs),

    /// Upload a file as multipart/form-data (PUT)
    Upload {
        /// API path, e.g. /empresas/{cpf_cnpj}/certificado/upload
        path: String,

        /// File to upload
        file: PathBuf,

        /// Additional form field (repeatable)
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// API path, e.g. /empresas or /nfse/{id}
    pub path: String,

    /// Query parameter (repeatable)
    #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Inline JSON request body
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the JSON request body from a file
    #[arg(long, value_name = "FILE")]
    pub body_file: Option<PathBuf>,
}

/// Parse a `KEY=VALUE` argument. The value may itself contain `=`.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
