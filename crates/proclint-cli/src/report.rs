//! HTML and JSON report rendering
//!
//! Layout:
//! ```text
//! <report-dir>/
//! ├── index.html            aggregate across plugins
//! ├── <plugin-name>.html    per plugin
//! └── <plugin-name>.json    per plugin, when requested
//! ```

use anyhow::Context;
use html_escape::encode_text;
use proclint_core::findings::{Finding, Severity, Subsystem};
use proclint_core::report::{PluginReport, ProjectReport};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Write the requested report files, returning their paths
pub fn write_reports(
    report: &ProjectReport,
    dir: &Path,
    html: bool,
    json: bool,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating report directory {}", dir.display()))?;
    let mut written = Vec::new();

    if html {
        let index = dir.join("index.html");
        std::fs::write(&index, render_index(report))
            .with_context(|| format!("writing {}", index.display()))?;
        written.push(index);
        for plugin in &report.plugins {
            let path = dir.join(format!("{}.html", plugin.name));
            std::fs::write(&path, render_plugin(plugin))
                .with_context(|| format!("writing {}", path.display()))?;
            written.push(path);
        }
    }
    if json {
        for plugin in &report.plugins {
            let path = dir.join(format!("{}.json", plugin.name));
            let payload = serde_json::to_string_pretty(plugin)
                .context("serializing plugin report")?;
            std::fs::write(&path, payload)
                .with_context(|| format!("writing {}", path.display()))?;
            written.push(path);
        }
    }
    Ok(written)
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>\n\
         body {{ font-family: sans-serif; margin: 2rem; }}\n\
         table {{ border-collapse: collapse; width: 100%; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 0.4rem 0.6rem; text-align: left; }}\n\
         .error {{ color: #b00020; }}\n\
         .warn {{ color: #a06000; }}\n\
         .info {{ color: #005090; }}\n\
         .success {{ color: #207030; }}\n\
         </style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = encode_text(title),
    )
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warn => "warn",
        Severity::Info => "info",
        Severity::Success => "success",
    }
}

fn render_index(report: &ProjectReport) -> String {
    let mut body = String::from("<h1>Plugin lint report</h1>\n");
    body.push_str("<table>\n<tr><th>Plugin</th><th>API</th><th>Errors</th><th>Warnings</th><th>Info</th><th>Passed</th></tr>\n");
    for plugin in &report.plugins {
        let counts = plugin.counts();
        let _ = writeln!(
            body,
            "<tr><td><a href=\"{name}.html\">{name}</a></td><td>{api}</td>\
             <td class=\"error\">{e}</td><td class=\"warn\">{w}</td>\
             <td class=\"info\">{i}</td><td class=\"success\">{s}</td></tr>",
            name = encode_text(&plugin.name),
            api = plugin.api_version,
            e = counts.errors,
            w = counts.warnings,
            i = counts.infos,
            s = counts.successes,
        );
    }
    body.push_str("</table>\n");

    if !report.leftovers.is_empty() {
        body.push_str("<h2>Unreferenced files</h2>\n<ul>\n");
        for leftover in &report.leftovers {
            let _ = writeln!(body, "<li>{}</li>", encode_text(leftover));
        }
        body.push_str("</ul>\n");
    }
    page("Plugin lint report", &body)
}

fn render_plugin(plugin: &PluginReport) -> String {
    let mut body = format!(
        "<h1>{}</h1>\n<p>{} — API {}</p>\n<p><a href=\"index.html\">Back to index</a></p>\n",
        encode_text(&plugin.name),
        encode_text(&plugin.source_class),
        plugin.api_version,
    );
    for (subsystem, title) in [
        (Subsystem::PluginDefinition, "Plugin definition"),
        (Subsystem::Bpmn, "BPMN"),
        (Subsystem::Fhir, "FHIR"),
    ] {
        let findings = plugin.findings_for(subsystem);
        if findings.is_empty() {
            continue;
        }
        let _ = writeln!(body, "<h2>{title}</h2>");
        body.push_str("<table>\n<tr><th>Severity</th><th>Kind</th><th>Description</th><th>Anchor</th><th>File</th></tr>\n");
        for finding in findings {
            body.push_str(&render_finding_row(finding));
        }
        body.push_str("</table>\n");
    }
    page(&plugin.name, &body)
}

fn render_finding_row(finding: &Finding) -> String {
    let kind = serde_json::to_value(finding.kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    format!(
        "<tr><td class=\"{css}\">{severity}</td><td>{kind}</td><td>{description}</td>\
         <td>{anchor}</td><td>{file}</td></tr>\n",
        css = severity_class(finding.severity),
        severity = finding.severity,
        kind = encode_text(&kind),
        description = encode_text(&finding.description),
        anchor = encode_text(&finding.anchor),
        file = encode_text(&finding.file),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proclint_core::ApiVersion;
    use proclint_core::findings::FindingKind;

    fn sample_report() -> ProjectReport {
        ProjectReport {
            plugins: vec![PluginReport {
                name: "ping".to_string(),
                display_name: "ping".to_string(),
                api_version: ApiVersion::V1,
                source_class: "com.example.PingProcessPluginDefinition".to_string(),
                findings: vec![
                    Finding::of(FindingKind::ProcessIdEmpty, "ping.bpmn", "process"),
                    Finding::bpmn_success("ServiceTask has a name", "ping.bpmn", "t1"),
                ],
                leftovers: vec!["send.bpmn".to_string()],
            }],
            leftovers: vec!["send.bpmn".to_string()],
        }
    }

    #[test]
    fn reports_follow_the_layout() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_reports(&sample_report(), dir.path(), true, true).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["index.html", "ping.html", "ping.json"]);

        let json = std::fs::read_to_string(dir.path().join("ping.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["findings"][0]["kind"], "PROCESS_ID_EMPTY");
        assert_eq!(value["findings"][0]["severity"], "ERROR");
    }

    #[test]
    fn html_escapes_content() {
        let mut report = sample_report();
        report.plugins[0].findings[0].description = "<script>alert(1)</script>".to_string();
        let html = render_plugin(&report.plugins[0]);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
