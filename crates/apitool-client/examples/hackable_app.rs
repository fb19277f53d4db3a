//! HackableApp API Demo
//!
//! This example shows how a domain-specific client is built on `ApiTool`:
//! it holds the tool, names its endpoints in configuration and adds one
//! method per API operation. It checks that the API is available, then
//! creates a user and deletes it again.
//!
//! # Usage
//!
//! ```bash
//! # With a configuration file
//! cargo run --example hackable_app -- --config config/default.json
//!
//! # Inline, through an interception proxy such as Burp Suite
//! cargo run --example hackable_app -- \
//!     --host https://api.hackableapp.com:3000 \
//!     --username developer --password 'sup3Rs3cr3t!!' \
//!     --proxy http://localhost:8080 --insecure
//! ```

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use serde::Deserialize;
use serde_json::{Value, json};

use apitool_client::{ApiClient, ApiTool, Auth, RequestOptions};
use apitool_common::{Config, ProxyConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "HackableApp API Demo")]
struct Args {
    /// Configuration file (JSON or TOML); overrides the other connection flags
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the API
    #[arg(long, default_value = "https://api.hackableapp.com:3000")]
    host: String,

    /// Username for Basic authentication
    #[arg(long, env = "HACKABLE_USERNAME", default_value = "developer")]
    username: String,

    /// Password for Basic authentication
    #[arg(long, env = "HACKABLE_PASSWORD", default_value = "sup3Rs3cr3t!!")]
    password: String,

    /// Route requests through this proxy
    #[arg(long)]
    proxy: Option<String>,

    /// Accept the proxy's TLS certificates without verification
    #[arg(long, requires = "proxy")]
    insecure: bool,
}

/// Availability reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Available,
    Unavailable,
}

impl Status {
    fn from_value(value: &Value) -> Self {
        match value.as_u64() {
            Some(1) => Self::Unavailable,
            _ => Self::Available,
        }
    }
}

#[derive(Debug, Deserialize)]
struct User {
    id: u64,
}

/// Client for the HackableApp API.
struct HackableAppApi {
    api: ApiTool,
}

impl ApiClient for HackableAppApi {
    fn api_tool(&self) -> &ApiTool {
        &self.api
    }
}

impl HackableAppApi {
    async fn create_user(&self, username: &str, password: &str, email: &str) -> Result<User> {
        let endpoint = self.endpoint("user")?;
        let options = RequestOptions::json(&json!({
            "username": username,
            "password": password,
            "email": email,
        }))?;

        let user = self
            .api
            .request_as(apitool_client::Method::POST, endpoint, Auth::Token, options)
            .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: u64) -> Result<Value> {
        let endpoint = format!("{}/{id}", self.endpoint("user")?);
        Ok(self
            .api
            .delete(&endpoint, Auth::Token, RequestOptions::default())
            .await?)
    }

    async fn status(&self) -> Result<Status> {
        let endpoint = self.endpoint("status")?;
        let body = self
            .api
            .get(endpoint, Auth::None, RequestOptions::default())
            .await?;
        Ok(Status::from_value(&body))
    }
}

fn build_config(args: &Args) -> Result<Config> {
    if let Some(path) = &args.config {
        return Ok(Config::load(path)?);
    }

    let mut config = Config::new(&args.host)
        .with_credentials(&args.username, &args.password)
        .with_endpoint("token", "/auth")
        .with_endpoint("user", "/user")
        .with_endpoint("status", "/status");

    if let Some(proxy) = &args.proxy {
        config = config.with_proxy(if args.insecure {
            ProxyConfig::intercepting(proxy)
        } else {
            ProxyConfig::new(proxy)
        });
    }

    Ok(config)
}

async fn create_and_delete_user(api: &HackableAppApi) -> Result<Value> {
    const USERNAME: &str = "hacker";
    const PASSWORD: &str = "letmein";
    const EMAIL: &str = "hacker@raxis.com";

    if api.status().await? == Status::Unavailable {
        bail!("The API is currently inaccessible.");
    }

    let user = api.create_user(USERNAME, PASSWORD, EMAIL).await?;
    log::info!("Created user {}", user.id);

    api.delete_user(user.id).await
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let api = HackableAppApi {
        api: ApiTool::new(build_config(&args)?)?,
    };

    match create_and_delete_user(&api).await {
        Ok(result) => println!("{result}"),
        Err(e) => eprintln!("{e:#}"),
    }

    Ok(())
}
