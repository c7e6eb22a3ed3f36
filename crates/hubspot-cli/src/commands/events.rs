//! Event subcommands.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use crate::config_store;
use crate::output;

#[derive(Args, Debug)]
pub struct EventsCommand {
    #[command(subcommand)]
    pub command: EventsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum EventsSubcommand {
    /// Record an event completion for a contact
    Complete(CompleteArgs),
}

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Event id
    pub event_id: String,

    /// Contact email
    pub email: String,
}

pub fn handle(cmd: EventsCommand) -> Result<()> {
    let conn = config_store::connect()?;

    match cmd.command {
        EventsSubcommand::Complete(args) => {
            let completed = conn
                .events()
                .complete(&args.event_id, &args.email)
                .context("Failed to record event")?;
            if !completed {
                bail!("Tracking host rejected event {}", args.event_id);
            }
            output::success(&format!("Event {} recorded for {}", args.event_id, args.email));
            Ok(())
        }
    }
}
