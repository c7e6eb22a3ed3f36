//! Contact subcommands.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Subcommand};

use crate::commands::{ListArgs, print_listing};
use crate::config_store;
use crate::output;

#[derive(Args, Debug)]
pub struct ContactsCommand {
    #[command(subcommand)]
    pub command: ContactsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ContactsSubcommand {
    /// List every contact
    List(ListContactsArgs),

    /// Fetch a single contact
    Get(GetArgs),

    /// Full-text contact search
    Search(SearchArgs),
}

#[derive(Args, Debug)]
pub struct ListContactsArgs {
    /// Property to include; repeat for several
    #[arg(long = "property")]
    pub properties: Vec<String>,

    #[command(flatten)]
    pub list: ListArgs,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("lookup").required(true).args(["vid", "email", "utk"])))]
pub struct GetArgs {
    /// Contact id
    #[arg(long)]
    pub vid: Option<i64>,

    /// Contact email
    #[arg(long)]
    pub email: Option<String>,

    /// User token from the tracking cookie
    #[arg(long)]
    pub utk: Option<String>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    #[command(flatten)]
    pub list: ListArgs,
}

pub fn handle(cmd: ContactsCommand) -> Result<()> {
    let conn = config_store::connect()?;
    let contacts = conn.contacts();

    match cmd.command {
        ContactsSubcommand::List(args) => {
            let config = args
                .properties
                .iter()
                .fold(args.list.page_config(), |config, p| config.param("property", p.as_str()));
            let listing = contacts.all(config);
            print_listing(listing, args.list.max, args.list.pretty)
        }
        ContactsSubcommand::Get(args) => {
            let contact = match (args.vid, &args.email, &args.utk) {
                (Some(vid), _, _) => contacts.find(vid),
                (None, Some(email), _) => contacts.find_by_email(email),
                (None, None, Some(utk)) => contacts.find_by_user_token(utk),
                (None, None, None) => unreachable!("clap requires one lookup flag"),
            }
            .context("Failed to get contact")?;
            output::json_pretty(&contact)
        }
        ContactsSubcommand::Search(args) => {
            let listing = contacts.search(&args.query, args.list.page_config());
            print_listing(listing, args.list.max, args.list.pretty)
        }
    }
}
