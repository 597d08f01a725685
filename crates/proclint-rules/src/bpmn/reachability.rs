//! Floating element analysis
//!
//! After the rule walk, every node of a scope that is not reachable on a
//! path from one of the scope's start events is tagged as floating. Boundary
//! events are reachable through the node they attach to; subprocess scopes
//! are analyzed separately against their own start events.

use super::tag;
use proclint_core::bpmn::{BpmnElement, BpmnElementKind};
use proclint_core::findings::{ElementIssue, Finding, Severity};
use std::collections::{HashMap, HashSet, VecDeque};

pub fn check_floating(
    scope: &[BpmnElement],
    file: &str,
    pid: Option<&str>,
    out: &mut Vec<Finding>,
) {
    let reachable = reachable_nodes(scope);
    for element in scope {
        if element.kind == BpmnElementKind::SequenceFlow {
            continue;
        }
        if !reachable.contains(element.id.as_str()) {
            out.push(tag(
                Finding::floating_element(
                    Severity::Warn,
                    ElementIssue::ElementNotReachableFromStartEvent,
                    file,
                    element.id.clone(),
                ),
                pid,
            ));
        }
        if element.kind == BpmnElementKind::SubProcess {
            check_floating(&element.children, file, pid, out);
        }
    }
}

fn reachable_nodes(scope: &[BpmnElement]) -> HashSet<&str> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for element in scope {
        match element.kind {
            BpmnElementKind::SequenceFlow => {
                if let (Some(source), Some(target)) =
                    (element.source_ref.as_deref(), element.target_ref.as_deref())
                {
                    edges.entry(source).or_default().push(target);
                }
            }
            _ => {
                if let Some(host) = element.attached_to.as_deref() {
                    edges.entry(host).or_default().push(element.id.as_str());
                }
            }
        }
    }

    let mut reachable: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = scope
        .iter()
        .filter(|e| e.kind == BpmnElementKind::StartEvent)
        .map(|e| e.id.as_str())
        .collect();
    while let Some(current) = queue.pop_front() {
        if !reachable.insert(current) {
            continue;
        }
        if let Some(next) = edges.get(current) {
            for target in next {
                queue.push_back(target);
            }
        }
    }
    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use proclint_core::bpmn::parse_bpmn;

    #[test]
    fn disconnected_elements_are_floating() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <process id="dsfdev_t">
            <startEvent id="start"/>
            <sequenceFlow id="f1" sourceRef="start" targetRef="t1"/>
            <task id="t1"/>
            <task id="orphan"/>
          </process>
        </definitions>"#;
        let scope = parse_bpmn(xml, "m.bpmn").unwrap().processes[0].elements.clone();
        let mut out = Vec::new();
        check_floating(&scope, "m.bpmn", Some("dsfdev_t"), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].anchor, "orphan");
        assert_eq!(
            out[0].subtype,
            Some(ElementIssue::ElementNotReachableFromStartEvent)
        );
    }

    #[test]
    fn boundary_events_follow_their_host() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <process id="dsfdev_t">
            <startEvent id="start"/>
            <sequenceFlow id="f1" sourceRef="start" targetRef="t1"/>
            <task id="t1"/>
            <boundaryEvent id="b1" attachedToRef="t1">
              <messageEventDefinition/>
            </boundaryEvent>
          </process>
        </definitions>"#;
        let scope = parse_bpmn(xml, "m.bpmn").unwrap().processes[0].elements.clone();
        let mut out = Vec::new();
        check_floating(&scope, "m.bpmn", None, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn scope_without_start_event_floats_entirely() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <process id="dsfdev_t">
            <task id="t1"/>
            <task id="t2"/>
          </process>
        </definitions>"#;
        let scope = parse_bpmn(xml, "m.bpmn").unwrap().processes[0].elements.clone();
        let mut out = Vec::new();
        check_floating(&scope, "m.bpmn", None, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn subprocess_children_are_analyzed_in_their_own_scope() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <process id="dsfdev_t">
            <startEvent id="start"/>
            <sequenceFlow id="f1" sourceRef="start" targetRef="sub"/>
            <subProcess id="sub">
              <startEvent id="innerStart"/>
              <sequenceFlow id="f2" sourceRef="innerStart" targetRef="innerTask"/>
              <task id="innerTask"/>
              <task id="innerOrphan"/>
            </subProcess>
          </process>
        </definitions>"#;
        let scope = parse_bpmn(xml, "m.bpmn").unwrap().processes[0].elements.clone();
        let mut out = Vec::new();
        check_floating(&scope, "m.bpmn", None, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].anchor, "innerOrphan");
    }
}
