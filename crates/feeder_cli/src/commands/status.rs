use clap::ValueEnum;
use feeder::feed::FeedSummary;
use feeder::{BookkeepingStore, OutcomeRecord, SqlStore, StoreSummary};
use serde::Serialize;

/// Output format for summaries.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// One labelled count.
#[derive(Debug, Clone, Serialize, tabled::Tabled)]
pub(crate) struct CountRow {
    #[tabled(rename = "Outcome")]
    pub outcome: &'static str,
    #[tabled(rename = "Count")]
    pub count: u64,
}

/// A failed item.
#[derive(Debug, Clone, Serialize, tabled::Tabled)]
pub(crate) struct FailureRow {
    #[tabled(rename = "Repository")]
    pub repository: String,
    #[tabled(rename = "Stage")]
    pub stage: String,
    #[tabled(rename = "Recorded At")]
    pub recorded_at: String,
}

impl From<OutcomeRecord> for FailureRow {
    fn from(record: OutcomeRecord) -> Self {
        Self {
            repository: record.item,
            stage: record
                .category
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            recorded_at: record.recorded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        }
    }
}

pub(crate) fn store_rows(summary: &StoreSummary) -> Vec<CountRow> {
    vec![
        CountRow {
            outcome: "Succeeded",
            count: summary.succeeded,
        },
        CountRow {
            outcome: "Clone failures",
            count: summary.clone_failures,
        },
        CountRow {
            outcome: "API failures",
            count: summary.api_failures,
        },
        CountRow {
            outcome: "Push failures",
            count: summary.push_failures,
        },
        CountRow {
            outcome: "Organizations",
            count: summary.organizations,
        },
    ]
}

pub(crate) fn run_rows(summary: &FeedSummary) -> Vec<CountRow> {
    let row = |outcome, count: usize| CountRow {
        outcome,
        count: count as u64,
    };
    vec![
        row("Queued", summary.queued),
        row("Skipped (already recorded)", summary.skipped),
        row("Malformed lines", summary.malformed),
        row("Succeeded", summary.succeeded),
        row("Clone failures", summary.clone_failures),
        row("API failures", summary.api_failures),
        row("Push failures", summary.push_failures),
        row("Cancelled", summary.cancelled),
        row("Not started", summary.unprocessed()),
    ]
}

pub(crate) fn print_table<T: tabled::Tabled>(rows: Vec<T>) {
    let mut table = tabled::Table::new(rows);
    table.with(tabled::settings::Style::rounded());
    println!("{}", table);
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatusReport {
    summary: StoreSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    failures: Option<Vec<OutcomeRecord>>,
}

/// Show what the bookkeeping store has recorded so far.
pub(crate) async fn handle_status(
    store: &SqlStore,
    output: OutputFormat,
    show_failures: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = store.summary().await?;
    let failures = if show_failures {
        Some(store.failures().await?)
    } else {
        None
    };

    match output {
        OutputFormat::Table => {
            print_table(store_rows(&summary));
            if let Some(failures) = failures {
                if failures.is_empty() {
                    println!("No failed repositories.");
                } else {
                    print_table(failures.into_iter().map(FailureRow::from).collect());
                }
            }
        }
        OutputFormat::Json => print_json(&StatusReport { summary, failures })?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use feeder::entity::outcome_status::OutcomeStatus;
    use feeder::error::FailureCategory;

    use super::*;

    #[test]
    fn store_rows_list_every_category() {
        let summary = StoreSummary {
            succeeded: 7,
            clone_failures: 1,
            api_failures: 2,
            push_failures: 3,
            organizations: 4,
        };
        let rows = store_rows(&summary);
        let counts: Vec<u64> = rows.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![7, 1, 2, 3, 4]);
    }

    #[test]
    fn run_rows_include_unstarted_items() {
        let summary = FeedSummary {
            queued: 10,
            succeeded: 4,
            push_failures: 1,
            cancelled: 2,
            ..FeedSummary::default()
        };
        let rows = run_rows(&summary);
        let not_started = rows
            .iter()
            .find(|r| r.outcome == "Not started")
            .expect("row present");
        assert_eq!(not_started.count, 3);
    }

    #[test]
    fn failure_row_shows_stage() {
        let record = OutcomeRecord {
            item: "octocat/hello".to_string(),
            status: OutcomeStatus::Failed,
            category: Some(FailureCategory::Push),
            organization: None,
            recorded_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        };
        let row = FailureRow::from(record);
        assert_eq!(row.repository, "octocat/hello");
        assert_eq!(row.stage, FailureCategory::Push.to_string());
        assert_eq!(row.recorded_at, "2026-03-01 12:00:00 UTC");
    }

    #[test]
    fn status_report_omits_failures_when_not_requested() {
        let report = StatusReport {
            summary: StoreSummary::default(),
            failures: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("failures").is_none());
        assert_eq!(json["summary"]["succeeded"], 0);
    }
}
