//! Message send and receive rules
//!
//! Send tasks and message intermediate throw events share the send
//! contract: the implementation class checks plus the required field
//! injections (`profile`, `messageName`, `instantiatesCanonical`), all of
//! which must be literal strings. Receive-side elements must name a message
//! that corresponds to a declared ActivityDefinition or
//! StructureDefinition.

use super::service_task::check_implementation_class;
use super::tag;
use crate::api::ElementContract;
use crate::context::RuleContext;
use proclint_core::bpmn::{BpmnElement, BpmnElementKind, FieldValue};
use proclint_core::findings::{ElementIssue, Finding, FindingKind, Severity};

pub const VERSION_PLACEHOLDER: &str = "#{version}";

/// Field injections every message send must carry; the flagged ones must
/// contain the version placeholder
const REQUIRED_SEND_FIELDS: &[(&str, bool)] = &[
    ("profile", true),
    ("messageName", false),
    ("instantiatesCanonical", true),
];

pub fn check_send(
    element: &BpmnElement,
    file: &str,
    pid: Option<&str>,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    check_event_name(element, file, pid, out);

    if element.kind == BpmnElementKind::IntermediateMessageThrowEvent
        && element.message_name.is_some()
    {
        out.push(tag(
            Finding::of(
                FindingKind::MessageIntermediateThrowEventCarriesMessage,
                file,
                element.id.clone(),
            ),
            pid,
        ));
    }

    check_implementation_class(
        element,
        ElementContract::MessageSendTask,
        FindingKind::SendTaskImplementationMissing,
        FindingKind::SendTaskClassNotFound,
        FindingKind::SendTaskInterfaceNotImplemented,
        FindingKind::SendTaskBaseClassNotExtended,
        file,
        pid,
        ctx,
        out,
    );

    for (field_name, needs_version) in REQUIRED_SEND_FIELDS {
        match element.field(field_name) {
            None => out.push(tag(
                Finding::of(FindingKind::FieldInjectionMissing, file, element.id.clone())
                    .with_field_name(*field_name),
                pid,
            )),
            Some(field) => match &field.value {
                FieldValue::Expression(expr) => out.push(tag(
                    Finding::of(FindingKind::FieldInjectionNotLiteral, file, element.id.clone())
                        .with_field_name(*field_name)
                        .with_value(expr.clone()),
                    pid,
                )),
                FieldValue::Literal(value) => {
                    if *needs_version && !value.contains(VERSION_PLACEHOLDER) {
                        out.push(tag(
                            Finding::of(
                                FindingKind::FieldInjectionVersionPlaceholderMissing,
                                file,
                                element.id.clone(),
                            )
                            .with_field_name(*field_name)
                            .with_value(value.clone()),
                            pid,
                        ));
                    }
                }
            },
        }
    }
}

pub fn check_receive(
    element: &BpmnElement,
    file: &str,
    pid: Option<&str>,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    check_event_name(element, file, pid, out);

    let message = element.message_name.as_deref().map(str::trim).unwrap_or("");
    if message.is_empty() {
        out.push(tag(
            Finding::of(FindingKind::MessageNameEmpty, file, element.id.clone()),
            pid,
        ));
        return;
    }
    if !ctx.facts.declared_messages.contains(message) {
        out.push(tag(
            Finding::of(FindingKind::MessageNotDeclared, file, element.id.clone())
                .with_value(message),
            pid,
        ));
    }
}

pub fn check_signal(element: &BpmnElement, file: &str, pid: Option<&str>, out: &mut Vec<Finding>) {
    check_event_name(element, file, pid, out);
}

/// Message and signal event names must be non-empty
fn check_event_name(element: &BpmnElement, file: &str, pid: Option<&str>, out: &mut Vec<Finding>) {
    if !element.kind.is_event() {
        if element.kind == BpmnElementKind::SendTask && element.name_is_blank() {
            out.push(tag(
                Finding::floating_element(
                    Severity::Warn,
                    ElementIssue::SendTaskNameIsEmpty,
                    file,
                    element.id.clone(),
                ),
                pid,
            ));
        }
        return;
    }
    if element.name_is_blank() {
        out.push(tag(
            Finding::floating_element(
                Severity::Warn,
                ElementIssue::EventNameIsEmpty,
                file,
                element.id.clone(),
            ),
            pid,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestContext;
    use super::*;
    use proclint_core::bpmn::parse_bpmn;

    fn send_task_with_fields(fields: &str) -> BpmnElement {
        let xml = format!(
            r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL"
               xmlns:camunda="http://camunda.org/schema/1.0/bpmn">
              <process id="dsfdev_t">
                <sendTask id="send1" name="send" camunda:class="com.example.Send">
                  <extensionElements>{fields}</extensionElements>
                </sendTask>
              </process>
            </definitions>"#
        );
        parse_bpmn(&xml, "m.bpmn").unwrap().processes[0].elements[0].clone()
    }

    #[test]
    fn missing_field_injections_are_reported() {
        let test = TestContext::empty();
        let mut out = Vec::new();
        check_send(&send_task_with_fields(""), "m.bpmn", None, &test.ctx(), &mut out);
        let missing: Vec<_> = out
            .iter()
            .filter(|f| f.kind == FindingKind::FieldInjectionMissing)
            .filter_map(|f| f.extra.field_name.as_deref())
            .collect();
        assert_eq!(missing, vec!["profile", "messageName", "instantiatesCanonical"]);
    }

    #[test]
    fn expression_fields_are_rejected() {
        let element = send_task_with_fields(
            r#"<camunda:field name="messageName">
                 <camunda:expression>${messageName}</camunda:expression>
               </camunda:field>"#,
        );
        let test = TestContext::empty();
        let mut out = Vec::new();
        check_send(&element, "m.bpmn", None, &test.ctx(), &mut out);
        let finding = out
            .iter()
            .find(|f| f.kind == FindingKind::FieldInjectionNotLiteral)
            .unwrap();
        assert_eq!(finding.extra.field_name.as_deref(), Some("messageName"));
    }

    #[test]
    fn version_placeholder_is_required_on_profile() {
        let element = send_task_with_fields(
            r#"<camunda:field name="profile">
                 <camunda:string>http://dsf.dev/fhir/StructureDefinition/task-ping|1.0</camunda:string>
               </camunda:field>
               <camunda:field name="messageName">
                 <camunda:string>pingMessage</camunda:string>
               </camunda:field>
               <camunda:field name="instantiatesCanonical">
                 <camunda:string>http://dsf.dev/bpe/Process/ping|#{version}</camunda:string>
               </camunda:field>"#,
        );
        let test = TestContext::empty();
        let mut out = Vec::new();
        check_send(&element, "m.bpmn", None, &test.ctx(), &mut out);
        let placeholder: Vec<_> = out
            .iter()
            .filter(|f| f.kind == FindingKind::FieldInjectionVersionPlaceholderMissing)
            .filter_map(|f| f.extra.field_name.as_deref())
            .collect();
        assert_eq!(placeholder, vec!["profile"]);
    }

    #[test]
    fn receive_task_message_must_be_declared() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <message id="m1" name="pongMessage"/>
          <process id="dsfdev_t">
            <receiveTask id="recv" name="wait" messageRef="m1"/>
          </process>
        </definitions>"#;
        let element = parse_bpmn(xml, "m.bpmn").unwrap().processes[0].elements[0].clone();

        let mut test = TestContext::empty();
        let mut out = Vec::new();
        check_receive(&element, "m.bpmn", None, &test.ctx(), &mut out);
        assert!(out.iter().any(|f| f.kind == FindingKind::MessageNotDeclared));

        test.facts.declared_messages.insert("pongMessage".to_string());
        out.clear();
        check_receive(&element, "m.bpmn", None, &test.ctx(), &mut out);
        assert!(out.iter().all(|f| f.kind != FindingKind::MessageNotDeclared));
    }

    #[test]
    fn intermediate_throw_event_must_not_carry_a_message() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL"
            xmlns:camunda="http://camunda.org/schema/1.0/bpmn">
          <message id="m1" name="pingMessage"/>
          <process id="dsfdev_t">
            <intermediateThrowEvent id="throw1" name="send">
              <messageEventDefinition messageRef="m1"/>
            </intermediateThrowEvent>
          </process>
        </definitions>"#;
        let element = parse_bpmn(xml, "m.bpmn").unwrap().processes[0].elements[0].clone();
        let test = TestContext::empty();
        let mut out = Vec::new();
        check_send(&element, "m.bpmn", None, &test.ctx(), &mut out);
        assert!(out
            .iter()
            .any(|f| f.kind == FindingKind::MessageIntermediateThrowEventCarriesMessage));
    }

    #[test]
    fn empty_event_name_is_a_warning() {
        let xml = r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL">
          <message id="m1" name="x"/>
          <process id="dsfdev_t">
            <intermediateCatchEvent id="catch1">
              <messageEventDefinition messageRef="m1"/>
            </intermediateCatchEvent>
          </process>
        </definitions>"#;
        let element = parse_bpmn(xml, "m.bpmn").unwrap().processes[0].elements[0].clone();
        let test = TestContext::empty();
        let mut out = Vec::new();
        check_receive(&element, "m.bpmn", None, &test.ctx(), &mut out);
        assert!(out
            .iter()
            .any(|f| f.subtype == Some(ElementIssue::EventNameIsEmpty)));
    }
}
