//! Import report rendering

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

use ferry_etl::report::{ImportReport, LoadOutcome, LoaderReport, RecordOutcome};

/// Human-readable report: a summary table, then one line per failed or
/// skipped record.
pub fn text(report: &ImportReport) -> String {
    let totals = report.totals();
    let mut lines = vec![
        "Import Report".cyan().bold().to_string(),
        format!("  Run:    {}", report.run_id),
        format!("  Source: {}", report.source),
    ];
    if let Some(finished) = report.finished_at {
        let elapsed = finished - report.started_at;
        lines.push(format!("  Time:   {} ms", elapsed.num_milliseconds()));
    }
    lines.push(String::new());
    lines.push(summary_table(report).to_string());

    let sections = [
        (
            "Failures:".red().bold(),
            notable(report, |o| matches!(o.outcome, LoadOutcome::Failed(_))),
        ),
        (
            "Skipped:".yellow().bold(),
            notable(report, |o| matches!(o.outcome, LoadOutcome::Skipped(_))),
        ),
    ];
    for (heading, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(heading.to_string());
        lines.extend(entries.into_iter().map(|line| format!("  {}", line)));
    }

    lines.push(String::new());
    lines.push(format!(
        "{} {} committed, {} skipped, {} failed",
        "Summary:".cyan().bold(),
        totals.committed,
        totals.skipped,
        totals.failed
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// The report as pretty-printed JSON
pub fn json(report: &ImportReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

fn summary_table(report: &ImportReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Entity", "Candidate", "Committed", "Skipped", "Failed"]);

    for loader in &report.loaders {
        let counts = loader.counts();
        table.add_row(vec![
            loader.entity.to_string(),
            candidate_label(loader),
            counts.committed.to_string(),
            counts.skipped.to_string(),
            counts.failed.to_string(),
        ]);
    }
    table
}

fn candidate_label(loader: &LoaderReport) -> String {
    match (&loader.candidate, loader.batch_failure()) {
        (Some(name), _) => name.clone(),
        (None, Some(_)) => "(aborted)".to_string(),
        (None, None) => "-".to_string(),
    }
}

fn notable(report: &ImportReport, keep: impl Fn(&RecordOutcome) -> bool) -> Vec<String> {
    let keep = &keep;
    report
        .loaders
        .iter()
        .flat_map(move |loader| {
            loader
                .outcomes
                .iter()
                .filter(move |o| keep(*o))
                .map(move |o| outcome_line(loader, o))
        })
        .collect()
}

fn outcome_line(loader: &LoaderReport, outcome: &RecordOutcome) -> String {
    let mut location = match outcome.position {
        Some(position) => format!("{} record {}", loader.entity, position),
        None => format!("{} batch", loader.entity),
    };
    if let Some(key) = &outcome.key {
        location.push_str(&format!(" (pk {})", key));
    }

    match &outcome.outcome {
        LoadOutcome::Failed(detail) => format!("{}: {}", location, detail),
        LoadOutcome::Skipped(reason) => format!("{}: {}", location, reason),
        LoadOutcome::Committed(committed) => format!("{}: committed as {}", location, committed),
    }
}
