//! Configure command implementation.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use hubspot_core::{Config, ConfigOptions};

use crate::config_store;
use crate::output;

const REDACTED: &str = "[REDACTED]";

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// API key
    #[arg(long)]
    pub hapikey: Option<String>,

    /// OAuth access token (takes precedence over the API key)
    #[arg(long)]
    pub access_token: Option<String>,

    /// Portal id, required for event tracking
    #[arg(long)]
    pub portal_id: Option<String>,

    /// API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Event tracking base URL
    #[arg(long)]
    pub event_base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the stored configuration instead of changing it
    #[arg(long, conflicts_with_all = ["hapikey", "access_token", "portal_id", "base_url", "event_base_url", "timeout_secs"])]
    pub show: bool,
}

pub fn run(args: ConfigureArgs) -> Result<()> {
    if args.show {
        return show();
    }

    let mut options = config_store::load()?.unwrap_or_default();
    merge(&mut options, args);

    // Validate before writing anything.
    let config = Config::configure(options.clone()).context("Invalid configuration")?;
    let path = config_store::save(&options)?;

    output::success("Configuration saved");
    println!();
    output::field("Path", &path.display().to_string());
    output::field("Base URL", config.base_url().as_str());
    if let Some(portal_id) = config.portal_id() {
        output::field("Portal", portal_id);
    }

    Ok(())
}

fn merge(options: &mut ConfigOptions, args: ConfigureArgs) {
    let ConfigureArgs {
        hapikey,
        access_token,
        portal_id,
        base_url,
        event_base_url,
        timeout_secs,
        show: _,
    } = args;

    options.hapikey = hapikey.or(options.hapikey.take());
    options.access_token = access_token.or(options.access_token.take());
    options.portal_id = portal_id.or(options.portal_id.take());
    options.base_url = base_url.or(options.base_url.take());
    options.event_base_url = event_base_url.or(options.event_base_url.take());
    options.timeout_secs = timeout_secs.or(options.timeout_secs);
}

fn show() -> Result<()> {
    let options = config_store::load()?
        .context("No configuration found. Run 'hubspot configure' first.")?;
    output::json_pretty(&redacted(&options)?)
}

fn redacted(options: &ConfigOptions) -> Result<Value> {
    let mut value = serde_json::to_value(options)?;
    if let Some(object) = value.as_object_mut() {
        for key in ["hapikey", "access_token"] {
            if let Some(secret) = object.get_mut(key) {
                *secret = Value::String(REDACTED.to_string());
            }
        }
    }
    Ok(value)
}
