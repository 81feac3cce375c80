//! `slidesync plan`: show the actions between two deck files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use slidesync_core::{ActionKind, ActionSummary};
use slidesync_reconcile::{reconcile_with, Plan, ReconcileOptions};

use super::{load_config, load_deck};

/// Arguments for `slidesync plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Deck as it is now.
    pub current: PathBuf,

    /// Deck as it should be.
    pub desired: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config()?;
        let current = load_deck(&self.current)?;
        let desired = load_deck(&self.desired)?;

        let options = ReconcileOptions {
            iteration_cap: config.matcher_iteration_cap,
        };
        let plan = reconcile_with(&current, &desired, options).context("planning failed")?;

        if self.json {
            print_json(&plan)
        } else {
            print_table(&plan);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct PlanJson {
    summary: PlanSummaryJson,
    actions: Vec<ActionSummary>,
}

#[derive(Serialize)]
struct PlanSummaryJson {
    appends: usize,
    updates: usize,
    deletes: usize,
    moves: usize,
    optimal: bool,
}

#[derive(Tabled)]
struct PlanTableRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "action")]
    action: String,
    #[tabled(rename = "index")]
    index: usize,
    #[tabled(rename = "to")]
    to: String,
    #[tabled(rename = "title")]
    title: String,
}

fn print_json(plan: &Plan) -> Result<()> {
    let payload = PlanJson {
        summary: PlanSummaryJson {
            appends: plan.count(ActionKind::Append),
            updates: plan.count(ActionKind::Update),
            deletes: plan.count(ActionKind::Delete),
            moves: plan.count(ActionKind::Move),
            optimal: plan.optimal,
        },
        actions: plan.iter().map(|action| action.summary()).collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize plan JSON")?
    );
    Ok(())
}

pub(crate) fn print_table(plan: &Plan) {
    if plan.is_empty() {
        println!("{} decks already match, nothing to do", "✓".green().bold());
        return;
    }

    println!(
        "{} action(s): {} append, {} update, {} delete, {} move",
        plan.len(),
        plan.count(ActionKind::Append),
        plan.count(ActionKind::Update),
        plan.count(ActionKind::Delete),
        plan.count(ActionKind::Move),
    );
    let rows: Vec<PlanTableRow> = plan
        .iter()
        .enumerate()
        .map(|(position, action)| {
            let summary = action.summary();
            PlanTableRow {
                position,
                action: kind_label(summary.kind),
                index: summary.index,
                to: summary.to.map(|to| to.to_string()).unwrap_or_default(),
                title: summary.title.unwrap_or_default(),
            }
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if !plan.optimal {
        println!(
            "{} matcher hit its iteration cap; plan is valid but may not be minimal",
            "!".yellow().bold()
        );
    }
}

fn kind_label(kind: ActionKind) -> String {
    let label = kind.to_string().to_uppercase();
    match kind {
        ActionKind::Append => label.green().to_string(),
        ActionKind::Update => label.yellow().to_string(),
        ActionKind::Delete => label.red().to_string(),
        ActionKind::Move => label.cyan().to_string(),
    }
}
