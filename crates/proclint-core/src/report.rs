//! Typed lint results consumed by the report renderers

use crate::descriptor::ApiVersion;
use crate::findings::{Finding, Severity, Subsystem};
use serde::{Deserialize, Serialize};

/// Finding counts by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub successes: usize,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warn => self.warnings += 1,
            Severity::Info => self.infos += 1,
            Severity::Success => self.successes += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos + self.successes
    }

    pub fn of(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            counts.add(finding.severity);
        }
        counts
    }
}

/// Lint result for one discovered plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginReport {
    /// Unique, filesystem-sanitized plugin name
    pub name: String,
    /// Display name as declared by the descriptor
    pub display_name: String,
    pub api_version: ApiVersion,
    pub source_class: String,
    /// Findings in dispatch order: plugin definition, then BPMN, then FHIR
    pub findings: Vec<Finding>,
    /// Leftover files attributed to this plugin (leaf names)
    pub leftovers: Vec<String>,
}

impl PluginReport {
    pub fn counts(&self) -> SeverityCounts {
        SeverityCounts::of(&self.findings)
    }

    pub fn has_errors(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.severity == Severity::Error)
    }

    pub fn findings_for(&self, subsystem: Subsystem) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.subsystem() == subsystem)
            .collect()
    }
}

/// Aggregate lint result for one linted project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectReport {
    /// Per-plugin reports in discovery order
    pub plugins: Vec<PluginReport>,
    /// Project-wide leftover files (leaf names)
    pub leftovers: Vec<String>,
}

impl ProjectReport {
    pub fn counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for plugin in &self.plugins {
            for finding in &plugin.findings {
                counts.add(finding.severity);
            }
        }
        counts
    }

    pub fn has_errors(&self) -> bool {
        self.plugins.iter().any(|p| p.has_errors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::FindingKind;

    #[test]
    fn counts_partition_findings() {
        let findings = vec![
            Finding::of(FindingKind::ProcessIdEmpty, "m.bpmn", "p"),
            Finding::of(FindingKind::PluginNoFhirResources, "d", "d"),
            Finding::of(FindingKind::FhirTaskBusinessKeyCheckSkipped, "t.xml", "Task/t"),
            Finding::bpmn_success("ok", "m.bpmn", "t1"),
        ];
        let counts = SeverityCounts::of(&findings);
        assert_eq!(counts.errors, 1);
        assert_eq!(counts.warnings, 1);
        assert_eq!(counts.infos, 1);
        assert_eq!(counts.successes, 1);
        assert_eq!(counts.total(), findings.len());
    }
}
