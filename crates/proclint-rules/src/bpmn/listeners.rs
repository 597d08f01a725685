//! Execution listener rules, applied to any element carrying listeners

use super::tag;
use crate::api::{ElementContract, expectation};
use crate::context::RuleContext;
use proclint_core::bpmn::BpmnElement;
use proclint_core::findings::{Finding, FindingKind};

pub fn check_execution_listeners(
    element: &BpmnElement,
    file: &str,
    pid: Option<&str>,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let expected = expectation(ElementContract::ExecutionListener, ctx.api_version);
    for listener in &element.execution_listeners {
        // Listeners configured via delegate expressions carry no class
        let Some(class) = listener.class_name.as_deref().map(str::trim).filter(|c| !c.is_empty())
        else {
            continue;
        };
        if !ctx.classes.exists(class) {
            out.push(tag(
                Finding::of(
                    FindingKind::ExecutionListenerClassNotFound,
                    file,
                    element.id.clone(),
                )
                .with_class_name(class),
                pid,
            ));
            continue;
        }
        if !ctx.classes.implements(class, expected.required_interface) {
            out.push(tag(
                Finding::of(
                    FindingKind::ExecutionListenerInterfaceNotImplemented,
                    file,
                    element.id.clone(),
                )
                .with_class_name(class)
                .with_expected(expected.required_interface),
                pid,
            ));
        }
    }
}
