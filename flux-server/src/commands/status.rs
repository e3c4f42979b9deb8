//! Status command - show storage backend and record counts

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(data_dir: &Path, json: bool) -> Result<()> {
    let ctx = get_context(data_dir)?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Flux Financial Status".bold());
    println!("Storage: {}", status.backend);
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Users", &status.total_users.to_string()]);
    table.add_row(vec!["Total balance", &output::format_money(status.total_balance)]);
    table.add_row(vec!["Activity logs", &status.total_activity_logs.to_string()]);
    table.add_row(vec!["Beneficiaries", &status.total_beneficiaries.to_string()]);
    table.add_row(vec!["KYC requests", &status.total_kyc_requests.to_string()]);
    table.add_row(vec!["Pending KYC", &status.pending_kyc_requests.to_string()]);
    println!("{}", table);

    if status.high_risk_alerts > 0 {
        println!();
        output::warning(&format!("{} high-risk alerts", status.high_risk_alerts));
    }

    Ok(())
}
