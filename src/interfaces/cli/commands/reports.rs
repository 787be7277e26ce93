//! Click report commands

use std::sync::Arc;

use colored::Colorize;

use crate::analytics::{Aggregator, CtrCalculator, parse_impressions};
use crate::errors::Result;
use crate::storage::{EventStore, format_timestamp};

fn no_data(what: &str) {
    println!("{} {}", "ℹ".bold().blue(), what);
}

pub fn templates(store: Arc<EventStore>) -> Result<()> {
    let rows = Aggregator::new(store).by_template()?;
    if rows.is_empty() {
        no_data("No clicks recorded");
        return Ok(());
    }

    println!("{}", "Clicks by template:".bold().green());
    println!();
    for row in &rows {
        println!(
            "  {:>8}  {}",
            row.clicks.to_string().green(),
            row.template_id.cyan()
        );
    }
    println!();
    let total: u64 = rows.iter().map(|r| r.clicks).sum();
    println!(
        "{} Total {} clicks across {} templates",
        "ℹ".bold().blue(),
        total.to_string().green(),
        rows.len()
    );
    Ok(())
}

pub fn daily(store: Arc<EventStore>, template_id: Option<&str>) -> Result<()> {
    let rows = Aggregator::new(store).by_day(template_id)?;
    if rows.is_empty() {
        no_data("No clicks recorded");
        return Ok(());
    }

    match template_id {
        Some(t) => println!("{} {}", "Clicks per day for".bold().green(), t.cyan()),
        None => println!("{}", "Clicks per day:".bold().green()),
    }
    println!();
    for row in &rows {
        println!("  {}  {:>8}", row.date, row.count.to_string().green());
    }
    Ok(())
}

pub fn detail(store: Arc<EventStore>, template_id: &str) -> Result<()> {
    let clicks = Aggregator::new(store).detail_for_template(template_id)?;
    if clicks.is_empty() {
        no_data(&format!("No clicks recorded for template {}", template_id));
        return Ok(());
    }

    println!("{} {}", "Clicks for".bold().green(), template_id.cyan());
    println!();
    for click in &clicks {
        println!(
            "  {}  {}",
            format_timestamp(&click.timestamp),
            click.account_id.as_deref().unwrap_or("-").dimmed()
        );
    }
    println!();
    println!(
        "{} Total {} clicks",
        "ℹ".bold().blue(),
        clicks.len().to_string().green()
    );
    Ok(())
}

pub fn accounts(store: Arc<EventStore>, template_id: Option<&str>) -> Result<()> {
    let rows = Aggregator::new(store).by_account(template_id)?;
    if rows.is_empty() {
        no_data("No clicks with an account recorded");
        return Ok(());
    }

    println!("{}", "Clicks by account:".bold().green());
    println!();
    for row in &rows {
        println!(
            "  {:>8}  {}",
            row.clicks.to_string().green(),
            row.account_id.cyan()
        );
    }
    Ok(())
}

pub fn ctr(store: Arc<EventStore>, template_id: &str, impressions: &str) -> Result<()> {
    let impressions = parse_impressions(Some(impressions))?;
    let report = CtrCalculator::new(store).compute_ctr(template_id, impressions)?;

    println!("{} {}", "Template:".bold(), report.template_id.cyan());
    println!("{} {}", "Clicks:".bold(), report.clicks);
    println!("{} {}", "Impressions:".bold(), report.impressions);
    println!("{} {}", "CTR:".bold(), report.ctr.to_string().green());
    Ok(())
}
