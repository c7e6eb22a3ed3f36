//! Company subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::commands::{ListArgs, print_listing};
use crate::config_store;
use crate::output;

#[derive(Args, Debug)]
pub struct CompaniesCommand {
    #[command(subcommand)]
    pub command: CompaniesSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CompaniesSubcommand {
    /// List every company
    List(ListArgs),

    /// Fetch a single company
    Get(GetArgs),

    /// List companies with a matching domain
    SearchDomain(SearchDomainArgs),

    /// List the contact ids associated with a company
    ContactIds(ContactIdsArgs),
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Company id
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct SearchDomainArgs {
    /// Domain to match, e.g. example.com
    pub domain: String,

    #[command(flatten)]
    pub list: ListArgs,
}

#[derive(Args, Debug)]
pub struct ContactIdsArgs {
    /// Company id
    pub id: i64,

    /// Stop after this many ids
    #[arg(long)]
    pub max: Option<usize>,
}

pub fn handle(cmd: CompaniesCommand) -> Result<()> {
    let conn = config_store::connect()?;
    let companies = conn.companies();

    match cmd.command {
        CompaniesSubcommand::List(args) => {
            let listing = companies.all(args.page_config());
            print_listing(listing, args.max, args.pretty)
        }
        CompaniesSubcommand::Get(args) => {
            let company = companies
                .find(args.id)
                .with_context(|| format!("Failed to get company {}", args.id))?;
            output::json_pretty(&company)
        }
        CompaniesSubcommand::SearchDomain(args) => {
            let listing = companies.search_domain(&args.domain, args.list.page_config());
            print_listing(listing, args.list.max, args.list.pretty)
        }
        CompaniesSubcommand::ContactIds(args) => {
            let listing = companies.contact_ids(args.id, Default::default());
            for vid in listing.take(args.max.unwrap_or(usize::MAX)) {
                println!("{}", vid.context("Failed to fetch page")?);
            }
            Ok(())
        }
    }
}
