//! Service task rules

use super::tag;
use crate::api::{ElementContract, expectation};
use crate::context::RuleContext;
use proclint_core::bpmn::BpmnElement;
use proclint_core::findings::{ElementIssue, Finding, FindingKind, Severity};

pub fn check_service_task(
    element: &BpmnElement,
    file: &str,
    pid: Option<&str>,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    if element.name_is_blank() {
        out.push(tag(
            Finding::floating_element(
                Severity::Warn,
                ElementIssue::ServiceTaskNameIsEmpty,
                file,
                element.id.clone(),
            ),
            pid,
        ));
    } else {
        out.push(tag(
            Finding::bpmn_success("ServiceTask has a name", file, element.id.clone()),
            pid,
        ));
    }

    check_implementation_class(
        element,
        ElementContract::ServiceTask,
        FindingKind::ServiceTaskImplementationMissing,
        FindingKind::ServiceTaskClassNotFound,
        FindingKind::ServiceTaskInterfaceNotImplemented,
        FindingKind::ServiceTaskBaseClassNotExtended,
        file,
        pid,
        ctx,
        out,
    );
}

/// Shared implementation-class rule for service-task-like elements: the
/// class must be present, resolvable, implement the expected interface, and
/// extend the expected base class for the active API version.
#[allow(clippy::too_many_arguments)]
pub(crate) fn check_implementation_class(
    element: &BpmnElement,
    contract: ElementContract,
    missing: FindingKind,
    not_found: FindingKind,
    no_interface: FindingKind,
    no_base: FindingKind,
    file: &str,
    pid: Option<&str>,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let class = element
        .implementation_class
        .as_deref()
        .map(str::trim)
        .unwrap_or("");
    if class.is_empty() {
        out.push(tag(Finding::of(missing, file, element.id.clone()), pid));
        return;
    }
    if !ctx.classes.exists(class) {
        out.push(tag(
            Finding::of(not_found, file, element.id.clone()).with_class_name(class),
            pid,
        ));
        return;
    }

    let expected = expectation(contract, ctx.api_version);
    let mut valid = true;
    if !ctx.classes.implements(class, expected.required_interface) {
        valid = false;
        out.push(tag(
            Finding::of(no_interface, file, element.id.clone())
                .with_class_name(class)
                .with_expected(expected.required_interface),
            pid,
        ));
    }
    if let Some(base) = expected.required_base {
        if !ctx.classes.is_subclass_of(class, base) {
            valid = false;
            out.push(tag(
                Finding::of(no_base, file, element.id.clone())
                    .with_class_name(class)
                    .with_expected(base),
                pid,
            ));
        }
    }
    if valid {
        out.push(tag(
            Finding::bpmn_success("Implementation class is valid", file, element.id.clone())
                .with_class_name(class),
            pid,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestContext;
    use super::*;
    use proclint_core::classfile::test_support::class_bytes;
    use proclint_core::classfile::parse_class;
    use proclint_core::classpath::{ClassEntry, ClassOrigin};
    use proclint_core::bpmn::BpmnElementKind;
    use std::path::PathBuf;

    fn service_task(class: Option<&str>, name: Option<&str>) -> BpmnElement {
        let xml = format!(
            r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL"
               xmlns:camunda="http://camunda.org/schema/1.0/bpmn">
              <process id="dsfdev_t">
                <serviceTask id="task1"{name}{class}/>
              </process>
            </definitions>"#,
            name = name.map(|n| format!(r#" name="{n}""#)).unwrap_or_default(),
            class = class
                .map(|c| format!(r#" camunda:class="{c}""#))
                .unwrap_or_default(),
        );
        let model = proclint_core::bpmn::parse_bpmn(&xml, "m.bpmn").unwrap();
        let element = model.processes[0].elements[0].clone();
        assert_eq!(element.kind, BpmnElementKind::ServiceTask);
        element
    }

    fn insert_class(test: &mut TestContext, name: &str, super_name: &str, interfaces: &[&str]) {
        let bytes = class_bytes(name, super_name, interfaces, &[], &[]);
        test.classes.insert_entry(ClassEntry {
            class: parse_class(&bytes, name).unwrap(),
            origin: ClassOrigin::ClassDir(PathBuf::from("target/classes")),
        });
    }

    #[test]
    fn missing_class_attribute() {
        let test = TestContext::empty();
        let mut out = Vec::new();
        check_service_task(&service_task(None, Some("Ping")), "m.bpmn", None, &test.ctx(), &mut out);
        assert!(out
            .iter()
            .any(|f| f.kind == FindingKind::ServiceTaskImplementationMissing));
    }

    #[test]
    fn unresolvable_class() {
        let test = TestContext::empty();
        let mut out = Vec::new();
        check_service_task(
            &service_task(Some("com.example.Ghost"), Some("Ping")),
            "m.bpmn",
            None,
            &test.ctx(),
            &mut out,
        );
        let finding = out
            .iter()
            .find(|f| f.kind == FindingKind::ServiceTaskClassNotFound)
            .unwrap();
        assert_eq!(finding.extra.class_name.as_deref(), Some("com.example.Ghost"));
    }

    #[test]
    fn valid_v1_service_task_is_a_success() {
        let mut test = TestContext::empty();
        insert_class(
            &mut test,
            "dev.dsf.bpe.v1.activity.AbstractServiceDelegate",
            "java.lang.Object",
            &["org.camunda.bpm.engine.delegate.JavaDelegate"],
        );
        insert_class(
            &mut test,
            "com.example.Ping",
            "dev.dsf.bpe.v1.activity.AbstractServiceDelegate",
            &[],
        );
        let mut out = Vec::new();
        check_service_task(
            &service_task(Some("com.example.Ping"), Some("Ping")),
            "m.bpmn",
            Some("dsfdev_ping"),
            &test.ctx(),
            &mut out,
        );
        assert!(out.iter().all(|f| f.severity == Severity::Success));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn wrong_interface_and_base_both_reported() {
        let mut test = TestContext::empty();
        insert_class(&mut test, "com.example.Plain", "java.lang.Object", &[]);
        let mut out = Vec::new();
        check_service_task(
            &service_task(Some("com.example.Plain"), Some("Ping")),
            "m.bpmn",
            None,
            &test.ctx(),
            &mut out,
        );
        assert!(out
            .iter()
            .any(|f| f.kind == FindingKind::ServiceTaskInterfaceNotImplemented));
        assert!(out
            .iter()
            .any(|f| f.kind == FindingKind::ServiceTaskBaseClassNotExtended));
    }

    #[test]
    fn blank_name_is_a_floating_element_warning() {
        let test = TestContext::empty();
        let mut out = Vec::new();
        check_service_task(
            &service_task(None, Some("  ")),
            "m.bpmn",
            None,
            &test.ctx(),
            &mut out,
        );
        let name_finding = out
            .iter()
            .find(|f| f.subtype == Some(ElementIssue::ServiceTaskNameIsEmpty))
            .unwrap();
        assert_eq!(name_finding.severity, Severity::Warn);
        assert_eq!(name_finding.kind, FindingKind::FloatingElement);
    }
}
