//! Gateway and outgoing-flow rules

use super::{outgoing_flows, tag};
use proclint_core::bpmn::{BpmnElement, BpmnElementKind};
use proclint_core::findings::{ElementIssue, Finding, Severity};

pub fn check_gateway(
    gateway: &BpmnElement,
    scope: &[BpmnElement],
    file: &str,
    pid: Option<&str>,
    out: &mut Vec<Finding>,
) {
    let outgoing = outgoing_flows(scope, &gateway.id);
    if outgoing.len() <= 1 {
        return;
    }

    let (gateway_label, empty_name_issue) = match gateway.kind {
        BpmnElementKind::InclusiveGateway => (
            "Inclusive gateway",
            ElementIssue::InclusiveGatewayHasMultipleOutgoingFlowsButNameIsEmpty,
        ),
        _ => (
            "Exclusive gateway",
            ElementIssue::ExclusiveGatewayHasMultipleOutgoingFlowsButNameIsEmpty,
        ),
    };

    if gateway.name_is_blank() {
        out.push(tag(
            Finding::floating_element(Severity::Warn, empty_name_issue, file, gateway.id.clone()),
            pid,
        ));
    } else {
        out.push(tag(
            Finding::bpmn_success(
                format!("{gateway_label} has multiple outgoing flows and a non-empty name"),
                file,
                gateway.id.clone(),
            ),
            pid,
        ));
    }

    for flow in outgoing {
        let is_default = gateway.default_flow.as_deref() == Some(flow.id.as_str());
        let has_condition = flow
            .condition
            .as_deref()
            .map(str::trim)
            .is_some_and(|c| !c.is_empty());
        if is_default {
            if has_condition {
                out.push(tag(
                    Finding::flow_element(
                        Severity::Error,
                        ElementIssue::SequenceFlowConditionOnDefaultFlow,
                        file,
                        flow.id.clone(),
                    ),
                    pid,
                ));
            } else {
                out.push(tag(
                    Finding::bpmn_success(
                        "Default sequence flow has no condition",
                        file,
                        flow.id.clone(),
                    ),
                    pid,
                ));
            }
        } else {
            if has_condition {
                out.push(tag(
                    Finding::bpmn_success(
                        "Sequence flow has a condition expression",
                        file,
                        flow.id.clone(),
                    ),
                    pid,
                ));
            } else {
                out.push(tag(
                    Finding::flow_element(
                        Severity::Error,
                        ElementIssue::SequenceFlowConditionMissing,
                        file,
                        flow.id.clone(),
                    ),
                    pid,
                ));
            }
            if flow.name_is_blank() {
                out.push(tag(
                    Finding::flow_element(
                        Severity::Info,
                        ElementIssue::SequenceFlowNameIsEmpty,
                        file,
                        flow.id.clone(),
                    ),
                    pid,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proclint_core::bpmn::parse_bpmn;
    use proclint_core::findings::FindingKind;

    fn gateway_scope(gateway_name: &str) -> Vec<BpmnElement> {
        let xml = format!(
            r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <process id="dsfdev_t">
            <exclusiveGateway id="gw" name="{gateway_name}" default="f_default"/>
            <sequenceFlow id="f_default" sourceRef="gw" targetRef="a"/>
            <sequenceFlow id="f_cond" name="positive" sourceRef="gw" targetRef="b">
              <conditionExpression>${{x&gt;0}}</conditionExpression>
            </sequenceFlow>
            <task id="a"/>
            <task id="b"/>
          </process>
        </definitions>"#
        );
        parse_bpmn(&xml, "m.bpmn").unwrap().processes[0].elements.clone()
    }

    #[test]
    fn well_formed_gateway_yields_three_successes() {
        let scope = gateway_scope("choose");
        let mut out = Vec::new();
        check_gateway(&scope[0], &scope, "m.bpmn", Some("dsfdev_t"), &mut out);
        let successes = out
            .iter()
            .filter(|f| f.severity == Severity::Success)
            .count();
        assert_eq!(successes, 3);
        assert!(out
            .iter()
            .all(|f| f.severity != Severity::Warn && f.severity != Severity::Error));
    }

    #[test]
    fn empty_gateway_name_becomes_floating_element_warning() {
        let scope = gateway_scope("");
        let mut out = Vec::new();
        check_gateway(&scope[0], &scope, "m.bpmn", None, &mut out);
        let finding = out
            .iter()
            .find(|f| f.kind == FindingKind::FloatingElement)
            .unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert_eq!(
            finding.subtype,
            Some(ElementIssue::ExclusiveGatewayHasMultipleOutgoingFlowsButNameIsEmpty)
        );
    }

    #[test]
    fn condition_on_default_flow_is_an_error() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <process id="dsfdev_t">
            <exclusiveGateway id="gw" name="choose" default="f1"/>
            <sequenceFlow id="f1" sourceRef="gw" targetRef="a">
              <conditionExpression>${oops}</conditionExpression>
            </sequenceFlow>
            <sequenceFlow id="f2" name="n" sourceRef="gw" targetRef="b">
              <conditionExpression>${ok}</conditionExpression>
            </sequenceFlow>
            <task id="a"/><task id="b"/>
          </process>
        </definitions>"#;
        let scope = parse_bpmn(xml, "m.bpmn").unwrap().processes[0].elements.clone();
        let mut out = Vec::new();
        check_gateway(&scope[0], &scope, "m.bpmn", None, &mut out);
        assert!(out
            .iter()
            .any(|f| f.subtype == Some(ElementIssue::SequenceFlowConditionOnDefaultFlow)));
    }

    #[test]
    fn missing_condition_on_branch_is_an_error() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <process id="dsfdev_t">
            <exclusiveGateway id="gw" name="choose"/>
            <sequenceFlow id="f1" name="a" sourceRef="gw" targetRef="a"/>
            <sequenceFlow id="f2" name="b" sourceRef="gw" targetRef="b">
              <conditionExpression>${ok}</conditionExpression>
            </sequenceFlow>
            <task id="a"/><task id="b"/>
          </process>
        </definitions>"#;
        let scope = parse_bpmn(xml, "m.bpmn").unwrap().processes[0].elements.clone();
        let mut out = Vec::new();
        check_gateway(&scope[0], &scope, "m.bpmn", None, &mut out);
        let missing = out
            .iter()
            .find(|f| f.subtype == Some(ElementIssue::SequenceFlowConditionMissing))
            .unwrap();
        assert_eq!(missing.anchor, "f1");
    }

    #[test]
    fn single_outgoing_flow_needs_nothing() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <process id="dsfdev_t">
            <exclusiveGateway id="gw"/>
            <sequenceFlow id="f1" sourceRef="gw" targetRef="a"/>
            <task id="a"/>
          </process>
        </definitions>"#;
        let scope = parse_bpmn(xml, "m.bpmn").unwrap().processes[0].elements.clone();
        let mut out = Vec::new();
        check_gateway(&scope[0], &scope, "m.bpmn", None, &mut out);
        assert!(out.is_empty());
    }
}
