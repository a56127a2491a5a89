// crates/divvy-cli/src/commands/replay.rs
//
// `divvy replay`: run a script of deposits and share movements against a
// fresh session and report the resulting dividend positions.

use serde::Serialize;
use tabled::Tabled;

use divvy_ledger::{AuditReport, InstrumentSummary};

use crate::config::CliConfig;
use crate::error::CliError;
use crate::output::{format_json, format_table, OutputFormat};
use crate::script::{Operation, Script};
use crate::shared::{Effect, LedgerSession, NamedStatement, SharedSession};

/// Result of one replayed operation.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepRecord>,
    pub holders: Vec<NamedStatement>,
    pub summary: InstrumentSummary,
    pub audit: AuditReport,
    pub paid_out: u64,
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    step: usize,
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Result")]
    result: String,
}

#[derive(Tabled)]
struct HolderRow {
    #[tabled(rename = "Holder")]
    name: String,
    #[tabled(rename = "Shares")]
    balance: u64,
    #[tabled(rename = "Accumulated")]
    accumulated: u64,
    #[tabled(rename = "Withdrawn")]
    withdrawn: u64,
    #[tabled(rename = "Withdrawable")]
    withdrawable: u64,
}

/// Replay `script` against a session built from `config`.
///
/// Rejected operations are recorded and skipped unless `stop_on_error` is
/// set, in which case replay halts and the rejection is returned alongside the
/// partial report. Any other failure always halts replay.
pub async fn replay(
    config: &CliConfig,
    script: &Script,
    stop_on_error: bool,
) -> Result<(ReplayReport, Option<CliError>), CliError> {
    let session: SharedSession = LedgerSession::from_config(config)?.into_shared();
    let mut steps = Vec::with_capacity(script.ops.len());
    let mut halted = None;

    for (index, op) in script.ops.iter().enumerate() {
        let step = index + 1;
        let result = session.lock().await.apply(op);
        match result {
            Ok(effect) => {
                tracing::debug!(step, %op, %effect, "Step applied");
                steps.push(StepRecord {
                    step,
                    operation: op.clone(),
                    effect: Some(effect),
                    error: None,
                });
            }
            Err(e) => {
                steps.push(StepRecord {
                    step,
                    operation: op.clone(),
                    effect: None,
                    error: Some(e.to_string()),
                });
                if !e.is_rejection() {
                    tracing::error!(step, %op, "Step failed: {}", e);
                    halted = Some(CliError::Failed { step, source: e });
                    break;
                }
                tracing::warn!(step, %op, "Step rejected: {}", e);
                if stop_on_error {
                    halted = Some(CliError::Rejected { step, source: e });
                    break;
                }
            }
        }
    }

    let session = session.lock().await;
    let report = ReplayReport {
        steps,
        holders: session.statements()?,
        summary: session.summary(),
        audit: session.audit()?,
        paid_out: session.payouts().total(),
    };
    Ok((report, halted))
}

/// Run the replay command.
pub async fn run(
    config: &CliConfig,
    script_path: &str,
    format: OutputFormat,
    stop_on_error: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let script = Script::load(script_path)?;
    tracing::info!(path = script_path, ops = script.ops.len(), "Replaying script");

    let (report, halted) = replay(config, &script, stop_on_error).await?;
    match format {
        OutputFormat::Json => println!("{}", format_json(&report)?),
        OutputFormat::Table => print_tables(&report),
    }

    match halted {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn print_tables(report: &ReplayReport) {
    let steps: Vec<StepRow> = report
        .steps
        .iter()
        .map(|s| StepRow {
            step: s.step,
            operation: s.operation.to_string(),
            result: match (&s.effect, &s.error) {
                (Some(effect), _) => effect.to_string(),
                (None, Some(error)) => format!("rejected: {}", error),
                (None, None) => String::new(),
            },
        })
        .collect();
    println!("{}", format_table(&steps));
    println!();

    let holders: Vec<HolderRow> = report
        .holders
        .iter()
        .map(|h| HolderRow {
            name: h.name.clone(),
            balance: h.statement.balance,
            accumulated: h.statement.accumulated,
            withdrawn: h.statement.withdrawn,
            withdrawable: h.statement.withdrawable,
        })
        .collect();
    println!("{}", format_table(&holders));
    println!();

    let summary = &report.summary;
    println!("Total deposited: {}", summary.total_deposited);
    println!("Pending pool:    {}", summary.pending_pool);
    println!("Total withdrawn: {}", summary.total_withdrawn);
    println!("Held value:      {}", summary.held_value);
    println!("Paid out:        {}", report.paid_out);
    println!("Outstanding:     {}", report.audit.outstanding);
    println!("Dust:            {}", report.audit.dust);
}
