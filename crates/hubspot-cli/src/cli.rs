//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::companies::CompaniesCommand;
use crate::commands::configure::ConfigureArgs;
use crate::commands::contacts::ContactsCommand;
use crate::commands::events::EventsCommand;

/// HubSpot CRM CLI tool.
#[derive(Parser, Debug)]
#[command(name = "hubspot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store credentials and endpoints
    Configure(ConfigureArgs),

    /// Company operations
    Companies(CompaniesCommand),

    /// Contact operations
    Contacts(ContactsCommand),

    /// Event tracking
    Events(EventsCommand),
}
