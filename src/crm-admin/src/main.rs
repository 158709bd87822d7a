//! CRM admin CLI: evaluate segment rules against a customer data file and
//! dry-run a campaign end to end over the in-memory stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use crm_campaigns::{CampaignEngine, CreateCampaignRequest};
use crm_core::store::CustomerStore;
use crm_core::types::{Customer, LogicalOperator, Order, Rule};
use crm_core::{AppConfig, CrmError};
use crm_segmentation::{predicates, CreateSegmentRequest, SegmentManager};
use crm_store::{
    InMemoryCampaignStore, InMemoryCustomerStore, InMemoryMessageLogStore, InMemorySegmentStore,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "crm-admin")]
#[command(about = "CRM segmentation and campaign administration tool")]
#[command(version)]
struct Cli {
    /// Deployment environment; `production` hides internal error details
    #[arg(long, global = true)]
    environment: Option<String>,

    /// Emit plain-text logs instead of JSON lines
    #[arg(long, global = true)]
    plain_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the customers matched by a rule file
    Evaluate {
        /// JSON file with `customers` and `orders`
        #[arg(short, long)]
        data: PathBuf,

        /// JSON file holding an array of rules
        #[arg(short, long)]
        rules: PathBuf,

        /// Combine rules with OR instead of AND
        #[arg(long)]
        or: bool,
    },

    /// Build a segment, create and start a campaign, print its progress
    DryRun {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        rules: PathBuf,

        /// Message body sent to every segment member
        #[arg(short, long)]
        message: String,

        /// Campaign name
        #[arg(long, default_value = "Dry run")]
        name: String,

        #[arg(long)]
        or: bool,
    },
}

/// Seed data. Orders are rolled into each customer's spend on load.
#[derive(Debug, Default, Deserialize)]
struct DataFile {
    #[serde(default)]
    customers: Vec<Customer>,
    #[serde(default)]
    orders: Vec<Order>,
}

fn main() {
    let cli = Cli::parse();

    let (mut config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Apply CLI overrides
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }
    if cli.plain_logs {
        config.logging.json = false;
    }

    init_tracing(&config);
    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let result = match cli.command {
        Commands::Evaluate { data, rules, or } => cmd_evaluate(&config, &data, &rules, or),
        Commands::DryRun {
            data,
            rules,
            message,
            name,
            or,
        } => cmd_dry_run(&config, &data, &rules, message, name, or),
    };

    if let Err(e) = result {
        let message = match e.downcast_ref::<CrmError>() {
            Some(crm) => crm.public_message(config.expose_internal_errors()),
            None => format!("{e:#}"),
        };
        eprintln!("Error: {message}");
        std::process::exit(1);
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter.as_str().into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_evaluate(config: &AppConfig, data: &Path, rules: &Path, or: bool) -> anyhow::Result<()> {
    let customers = load_customers(data)?;
    let rules = load_rules(rules)?;
    predicates::validate_rules(&rules, &config.segments)?;

    let filter = predicates::evaluate(&rules, operator(or));
    let matched = customers.find(&filter)?;
    info!(rules = rules.len(), matched = matched.len(), "Rules evaluated");
    println!("{}", serde_json::to_string_pretty(&matched)?);
    Ok(())
}

fn cmd_dry_run(
    config: &AppConfig,
    data: &Path,
    rules: &Path,
    message: String,
    name: String,
    or: bool,
) -> anyhow::Result<()> {
    let customers = load_customers(data)?;
    let rules = load_rules(rules)?;
    let segments = Arc::new(InMemorySegmentStore::new());
    let actor = Uuid::new_v4();

    let manager = SegmentManager::new(
        customers.clone(),
        customers.clone(),
        segments.clone(),
        config.segments.clone(),
    );
    let created = manager.create_segment(
        CreateSegmentRequest {
            name: format!("{name} audience"),
            description: None,
            rules,
            logical_operator: Some(operator(or)),
        },
        actor,
    )?;

    let engine = CampaignEngine::new(
        Arc::new(InMemoryCampaignStore::new()),
        segments,
        Arc::new(InMemoryMessageLogStore::new()),
        customers,
        config.campaigns.clone(),
    );
    let campaign = engine.create_campaign(
        CreateCampaignRequest {
            name,
            description: None,
            segment_id: created.segment.id,
            message,
            scheduled_for: Utc::now(),
        },
        actor,
    )?;
    engine.start_campaign(campaign.id)?;

    let report = engine.get_campaign_progress(campaign.id)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn operator(or: bool) -> LogicalOperator {
    if or {
        LogicalOperator::Or
    } else {
        LogicalOperator::And
    }
}

fn load_customers(path: &Path) -> anyhow::Result<Arc<InMemoryCustomerStore>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read data file {}", path.display()))?;
    let data: DataFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse data file {}", path.display()))?;

    let store = Arc::new(InMemoryCustomerStore::new());
    let (customers, orders) = (data.customers.len(), data.orders.len());
    for customer in data.customers {
        store.insert_customer(customer)?;
    }
    for order in data.orders {
        store.record_order(order)?;
    }
    info!(customers, orders, "Loaded data file");
    Ok(store)
}

fn load_rules(path: &Path) -> anyhow::Result<Vec<Rule>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse rules file {}", path.display()))
}
