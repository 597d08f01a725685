//! Process-level rules

use once_cell::sync::Lazy;
use proclint_core::bpmn::BpmnProcess;
use proclint_core::findings::{Finding, FindingKind};
use regex::Regex;

/// Process ids follow the `domain_processname` scheme
static PROCESS_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z0-9]+_[A-Za-z0-9]+$").expect("valid process id pattern"));

pub fn check_process(process: &BpmnProcess, file: &str, out: &mut Vec<Finding>) {
    if process.id.trim().is_empty() {
        out.push(Finding::of(FindingKind::ProcessIdEmpty, file, "process"));
        return;
    }
    if !PROCESS_ID_RE.is_match(&process.id) {
        out.push(
            Finding::of(FindingKind::ProcessIdPatternMismatch, file, process.id.clone())
                .with_process_id(process.id.clone())
                .with_value(process.id.clone()),
        );
    }
}
