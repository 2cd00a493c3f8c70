//! One-shot command line client.
//!
//! Runs a single operation for one account and prints the tagged response as
//! pretty JSON. Exits with an error when the fetch produced no result.

use anyhow::{Context, Result, bail};
use clap::Parser;
use mys_api::{ClientConfig, Game, MysApi};
use mys_cache::{MemoryStore, MemoryStoreConfig};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "mys-fetch",
    about = "Query a miHoYo / HoYoLAB API operation for one account",
    version
)]
struct Args {
    /// Game account id
    #[arg(long, env = "MYS_UID")]
    uid: String,

    /// Account cookie
    #[arg(long, env = "MYS_COOKIE", hide_env_values = true)]
    cookie: String,

    /// Query Star Rail instead of Genshin
    #[arg(long)]
    star_rail: bool,

    /// Use the response cache. The store lives only for this process, so
    /// it only saves requests when combined with `--repeat`
    #[arg(long)]
    cache: bool,

    /// Run the operation this many times against the same store
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    repeat: u32,

    /// Operation parameters as a JSON object
    #[arg(long, default_value = "{}")]
    params: String,

    /// Proxy for overseas servers
    #[arg(long, env = "MYS_PROXY_ADDRESS")]
    proxy: Option<String>,

    /// Operation name, e.g. `note` or `bbs_sign_info`
    operation: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let params: serde_json::Value =
        serde_json::from_str(&args.params).context("--params must be valid JSON")?;

    let mut config = ClientConfig::from_env();
    if let Some(proxy) = args.proxy {
        config.proxy_address = Some(proxy);
    }
    config.validate()?;

    let game = if args.star_rail {
        Game::StarRail
    } else {
        Game::Genshin
    };

    let store = MemoryStore::new(MemoryStoreConfig::default())?;
    let api = MysApi::with_config(args.uid, args.cookie, game, config)?
        .with_store(Arc::new(store));

    tracing::debug!("Fetching {} for {} on {}", args.operation, api.uid(), api.server());

    for _ in 0..args.repeat {
        let Some(response) = api.fetch(&args.operation, params.clone(), args.cache).await else {
            bail!("{} returned no result", args.operation);
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}
