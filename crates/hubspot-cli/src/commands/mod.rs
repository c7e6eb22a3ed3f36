//! Subcommand implementations.

pub mod companies;
pub mod configure;
pub mod contacts;
pub mod events;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use hubspot_core::PageConfig;

use crate::output;

/// Paging flags shared by the listing commands.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Page size requested from the server
    #[arg(long)]
    pub limit: Option<u32>,

    /// Stop after this many records
    #[arg(long)]
    pub max: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl ListArgs {
    pub fn page_config<O>(&self) -> PageConfig<O> {
        let config = PageConfig::new();
        match self.limit {
            Some(limit) => config.limit(limit),
            None => config,
        }
    }
}

/// Print each record of a listing, one JSON object per line.
///
/// Pages are fetched only as records are consumed, so `max` bounds the
/// number of requests as well.
pub fn print_listing<T, I>(listing: I, max: Option<usize>, pretty: bool) -> Result<()>
where
    T: Serialize,
    I: Iterator<Item = hubspot_core::Result<T>>,
{
    let mut printed = 0;
    for record in listing.take(max.unwrap_or(usize::MAX)) {
        let record = record.context("Failed to fetch page")?;
        output::record(&record, pretty)?;
        printed += 1;
    }

    if printed == 0 {
        eprintln!("{}", "No records found.".dimmed());
    }

    Ok(())
}
