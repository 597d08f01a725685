//! BPMN rule dispatch
//!
//! Walks the parsed model in declaration order and invokes the
//! element-typed rules. Findings preserve the walk order; the floating
//! element analysis runs last per process.

pub mod gateways;
pub mod listeners;
pub mod messaging;
pub mod process;
pub mod reachability;
pub mod service_task;
pub mod subprocess;
pub mod user_task;

use crate::context::RuleContext;
use proclint_core::bpmn::{BpmnElement, BpmnElementKind, BpmnModel};
use proclint_core::findings::{ElementIssue, Finding, FindingKind, Severity};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::debug;

/// Lint one parsed BPMN model
pub fn lint_model(model: &BpmnModel, file: &str, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for process in &model.processes {
        let pid = (!process.id.is_empty()).then_some(process.id.as_str());
        lint_scope(&process.elements, file, pid, ctx, &mut findings);
        process::check_process(process, file, &mut findings);
        reachability::check_floating(&process.elements, file, pid, &mut findings);
    }
    findings
}

fn lint_scope(
    elements: &[BpmnElement],
    file: &str,
    pid: Option<&str>,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    for element in elements {
        let before = out.len();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut scoped = Vec::new();
            dispatch_element(element, elements, file, pid, ctx, &mut scoped);
            scoped
        }));
        match result {
            Ok(scoped) => out.extend(scoped),
            Err(_) => {
                debug!("Rule panicked while checking element {}", element.id);
                out.truncate(before);
                out.push(tag(
                    Finding::of(FindingKind::Unknown, file, element.id.clone()),
                    pid,
                ));
            }
        }
        if element.kind == BpmnElementKind::SubProcess {
            subprocess::check_subprocess(element, file, pid, out);
            lint_scope(&element.children, file, pid, ctx, out);
        }
    }
}

fn dispatch_element(
    element: &BpmnElement,
    scope: &[BpmnElement],
    file: &str,
    pid: Option<&str>,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    match element.kind {
        BpmnElementKind::ServiceTask => service_task::check_service_task(element, file, pid, ctx, out),
        BpmnElementKind::SendTask | BpmnElementKind::IntermediateMessageThrowEvent => {
            messaging::check_send(element, file, pid, ctx, out)
        }
        BpmnElementKind::ReceiveTask
        | BpmnElementKind::IntermediateMessageCatchEvent
        | BpmnElementKind::MessageBoundaryEvent => {
            messaging::check_receive(element, file, pid, ctx, out)
        }
        BpmnElementKind::StartEvent if element.message_name.is_some() => {
            messaging::check_receive(element, file, pid, ctx, out)
        }
        BpmnElementKind::SignalIntermediateThrowEvent | BpmnElementKind::SignalEndEvent => {
            messaging::check_signal(element, file, pid, out)
        }
        BpmnElementKind::ExclusiveGateway | BpmnElementKind::InclusiveGateway => {
            gateways::check_gateway(element, scope, file, pid, out)
        }
        BpmnElementKind::SequenceFlow => check_flow(element, scope, file, pid, out),
        BpmnElementKind::UserTask => user_task::check_user_task(element, file, pid, ctx, out),
        _ => {}
    }
    listeners::check_execution_listeners(element, file, pid, ctx, out);
}

/// Every sequence flow must connect two nodes of its scope
fn check_flow(
    flow: &BpmnElement,
    scope: &[BpmnElement],
    file: &str,
    pid: Option<&str>,
    out: &mut Vec<Finding>,
) {
    let known = |id: &Option<String>| {
        id.as_deref()
            .is_some_and(|id| !id.is_empty() && scope.iter().any(|e| e.id == id))
    };
    if !known(&flow.source_ref) {
        out.push(tag(
            Finding::flow_element(
                Severity::Error,
                ElementIssue::SequenceFlowHasNoSourceNode,
                file,
                flow.id.clone(),
            ),
            pid,
        ));
    }
    if !known(&flow.target_ref) {
        out.push(tag(
            Finding::flow_element(
                Severity::Error,
                ElementIssue::SequenceFlowHasNoTargetNode,
                file,
                flow.id.clone(),
            ),
            pid,
        ));
    }
}

/// Attach the owning process id when known
pub(crate) fn tag(finding: Finding, pid: Option<&str>) -> Finding {
    match pid {
        Some(pid) => finding.with_process_id(pid),
        None => finding,
    }
}

/// Outgoing sequence flows of a node within its scope
pub(crate) fn outgoing_flows<'a>(scope: &'a [BpmnElement], node_id: &str) -> Vec<&'a BpmnElement> {
    scope
        .iter()
        .filter(|e| {
            e.kind == BpmnElementKind::SequenceFlow && e.source_ref.as_deref() == Some(node_id)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::{PluginFacts, RuleContext};
    use proclint_core::{ApiVersion, ClassIndex, CodeSystemCache};

    pub struct TestContext {
        pub classes: ClassIndex,
        pub code_systems: CodeSystemCache,
        pub facts: PluginFacts,
        pub api_version: ApiVersion,
    }

    impl TestContext {
        pub fn empty() -> Self {
            Self {
                classes: ClassIndex::new(),
                code_systems: CodeSystemCache::bootstrap(),
                facts: PluginFacts::default(),
                api_version: ApiVersion::V1,
            }
        }

        pub fn ctx(&self) -> RuleContext<'_> {
            RuleContext::new(
                self.api_version,
                &self.classes,
                &self.code_systems,
                &self.facts,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::TestContext;
    use super::*;
    use proclint_core::bpmn::parse_bpmn;

    #[test]
    fn dangling_flow_ends_are_errors() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <process id="dsfdev_x">
            <startEvent id="start"/>
            <sequenceFlow id="f1" sourceRef="start" targetRef="ghost"/>
          </process>
        </definitions>"#;
        let model = parse_bpmn(xml, "m.bpmn").unwrap();
        let test = TestContext::empty();
        let findings = lint_model(&model, "m.bpmn", &test.ctx());
        let dangling: Vec<_> = findings
            .iter()
            .filter(|f| f.subtype == Some(ElementIssue::SequenceFlowHasNoTargetNode))
            .collect();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].anchor, "f1");
        assert_eq!(dangling[0].severity, Severity::Error);
    }

    #[test]
    fn findings_carry_the_process_id() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <process id="dsfdev_x">
            <sequenceFlow id="f1"/>
          </process>
        </definitions>"#;
        let model = parse_bpmn(xml, "m.bpmn").unwrap();
        let test = TestContext::empty();
        let findings = lint_model(&model, "m.bpmn", &test.ctx());
        assert!(findings
            .iter()
            .filter(|f| f.kind == FindingKind::FlowElement)
            .all(|f| f.process_id.as_deref() == Some("dsfdev_x")));
    }
}
