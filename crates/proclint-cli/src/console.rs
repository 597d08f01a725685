//! Console rendering of lint reports

use colored::Colorize;
use proclint_core::findings::{Finding, Severity};
use proclint_core::report::{ProjectReport, SeverityCounts};

/// Print the report; SUCCESS findings are shown only in verbose mode
pub fn print_report(report: &ProjectReport, verbose: bool) {
    for plugin in &report.plugins {
        println!(
            "\n{} {} ({})",
            "Plugin".bold(),
            plugin.name.bold(),
            plugin.api_version
        );
        println!("  {}", plugin.source_class.dimmed());

        for finding in &plugin.findings {
            if finding.severity == Severity::Success && !verbose {
                continue;
            }
            println!("  {}", format_finding(finding));
        }
        if !plugin.leftovers.is_empty() {
            println!("  {}", "Unreferenced files:".bold());
            for leftover in &plugin.leftovers {
                println!("    {leftover}");
            }
        }
    }

    print_summary(&report.counts(), report.plugins.len());
}

fn format_finding(finding: &Finding) -> String {
    let severity = severity_label(finding.severity);
    let kind = serde_json::to_value(finding.kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let mut line = format!(
        "{severity} {} {} ({} in {})",
        kind.dimmed(),
        finding.description,
        finding.anchor,
        finding.file
    );
    if let Some(process_id) = &finding.process_id {
        line.push_str(&format!(" [{process_id}]"));
    }
    line
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Error => "error".red().bold().to_string(),
        Severity::Warn => "warn".yellow().bold().to_string(),
        Severity::Info => "info".blue().to_string(),
        Severity::Success => "ok".green().to_string(),
    }
}

fn print_summary(counts: &SeverityCounts, plugin_count: usize) {
    println!(
        "\n{} {} plugin{}: {}, {}, {}, {}",
        "Summary:".bold(),
        plugin_count,
        if plugin_count == 1 { "" } else { "s" },
        format!("{} error{}", counts.errors, plural(counts.errors)).red(),
        format!("{} warning{}", counts.warnings, plural(counts.warnings)).yellow(),
        format!("{} info", counts.infos).blue(),
        format!("{} passed", counts.successes).green(),
    );
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
