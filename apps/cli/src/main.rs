//! Command line front end for the instrument metadata search compiler
//!
//! Usage:
//!   instrumeta-cli compile devices --q '"soil moisture" -broken' --filter '[{"model":"CS655"}]'
//!   instrumeta-cli search devices --param q=probe --param 'page[size]=5' [--dry-run]

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use instrumeta::logging;
use instrumeta::search::{CollectionPage, RelationalFallback};
use instrumeta::{
    CollectionAdapter, Config, EntityRegistry, ListRequest, RequestUser, VisibilityRegistry,
};
use instrumeta_filter::{FilterParser, QueryBuilder};
use serde_json::json;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(name = "instrumeta-cli")]
#[clap(about = "Compile and run instrument metadata search requests")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the search index query for a free-text query and filter
    Compile {
        /// Resource name (devices, platforms, configurations, contacts, sites)
        resource: String,

        /// Free-text query
        #[clap(long)]
        q: Option<String>,

        /// Structured filter as JSON
        #[clap(long)]
        filter: Option<String>,

        /// Reject malformed filter elements instead of skipping them
        #[clap(long)]
        strict: bool,
    },
    /// List a resource through the collection adapter
    Search {
        resource: String,

        /// Request parameter as KEY=VALUE; may be repeated
        #[clap(short, long = "param")]
        params: Vec<String>,

        /// Run as this user id (anonymous otherwise)
        #[clap(long)]
        user: Option<String>,

        #[clap(long)]
        superuser: bool,

        /// Print the search request instead of executing it
        #[clap(long)]
        dry_run: bool,
    },
}

/// The CLI has no relational store to fall back to.
struct NoRelationalStore;

#[async_trait]
impl RelationalFallback for NoRelationalStore {
    async fn list(
        &self,
        resource: &str,
        _request: &ListRequest,
        _user: &RequestUser,
    ) -> instrumeta::Result<CollectionPage> {
        Err(instrumeta::Error::Relational(format!(
            "'{}' would be listed from the relational store, which is not available here",
            resource
        )))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Compile {
            resource,
            q,
            filter,
            strict,
        } => {
            logging::init_simple_logging();
            compile(&resource, q, filter, strict)
        }
        Command::Search {
            resource,
            params,
            user,
            superuser,
            dry_run,
        } => {
            let mut request = ListRequest::new();
            for param in &params {
                let (key, value) = param
                    .split_once('=')
                    .with_context(|| format!("parameter '{}' is not KEY=VALUE", param))?;
                request = request.with(key, value);
            }
            let mut requester = match user {
                Some(id) => RequestUser::authenticated(id),
                None => RequestUser::anonymous(),
            };
            if superuser {
                requester = requester.superuser();
            }
            search(&resource, &request, &requester, dry_run).await
        }
    }
}

fn compile(resource: &str, q: Option<String>, filter: Option<String>, strict: bool) -> Result<()> {
    let entities = EntityRegistry::new();
    let entity = entities
        .get(resource)
        .with_context(|| format!("unknown resource '{}'", resource))?;

    let parser = if strict {
        FilterParser::strict()
    } else {
        FilterParser::lenient()
    };
    let mut builder = QueryBuilder::new().with_parser(parser);
    if let Some(q) = q {
        builder.set_query(q);
    }
    if let Some(filter) = filter {
        let filter = serde_json::from_str(&filter).context("filter is not valid JSON")?;
        builder.set_filters(filter);
    }

    let query = match builder.compile(&entity.text_fields)? {
        Some(node) => node.render(),
        None => json!({"match_all": {}}),
    };
    println!("{}", serde_json::to_string_pretty(&query)?);
    Ok(())
}

async fn search(
    resource: &str,
    request: &ListRequest,
    user: &RequestUser,
    dry_run: bool,
) -> Result<()> {
    let config = Config::load().context("load configuration")?;
    let _guard = logging::init_logging(&config.logging)?;
    let adapter = CollectionAdapter::from_config(
        &config,
        Arc::new(EntityRegistry::new()),
        Arc::new(VisibilityRegistry::new()),
        Arc::new(NoRelationalStore),
    )?;

    if dry_run {
        match adapter.plan(resource, request, user)? {
            Some(plan) => println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "index": plan.index,
                    "body": plan.request.to_body(),
                }))?
            ),
            None => println!("relational"),
        }
        return Ok(());
    }

    let page = adapter.list(resource, request, user).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
