//! User task rules

use super::tag;
use crate::api::{ElementContract, expectation};
use crate::context::RuleContext;
use proclint_core::bpmn::BpmnElement;
use proclint_core::findings::{ElementIssue, Finding, FindingKind, Severity};

/// Accepted formKey schemes
const EXTERNAL_PREFIXES: &[&str] = &["external:", "http://", "https://"];

pub fn check_user_task(
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
                ElementIssue::UserTaskNameIsEmpty,
                file,
                element.id.clone(),
            ),
            pid,
        ));
    } else {
        out.push(tag(
            Finding::bpmn_success("UserTask has a name", file, element.id.clone()),
            pid,
        ));
    }

    check_form_key(element, file, pid, ctx, out);
    check_task_listeners(element, file, pid, ctx, out);
}

fn check_form_key(
    element: &BpmnElement,
    file: &str,
    pid: Option<&str>,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let form_key = element.form_key.as_deref().map(str::trim).unwrap_or("");
    if form_key.is_empty() {
        out.push(tag(
            Finding::floating_element(
                Severity::Error,
                ElementIssue::UserTaskFormKeyIsEmpty,
                file,
                element.id.clone(),
            ),
            pid,
        ));
        return;
    }
    if !EXTERNAL_PREFIXES.iter().any(|p| form_key.starts_with(p)) {
        out.push(tag(
            Finding::of(FindingKind::UserTaskFormKeyNotExternal, file, element.id.clone())
                .with_value(form_key),
            pid,
        ));
        return;
    }
    out.push(tag(
        Finding::bpmn_success("formKey is an external form", file, element.id.clone()),
        pid,
    ));

    // Questionnaire existence can only be judged against declared ones
    if ctx.facts.questionnaire_urls.is_empty() {
        return;
    }
    let canonical = form_key.strip_prefix("external:").unwrap_or(form_key);
    let base = canonical.split('|').next().unwrap_or(canonical);
    let known = ctx.facts.questionnaire_urls.iter().any(|url| {
        url == base || url.ends_with(&format!("/{base}"))
    });
    if !known {
        out.push(tag(
            Finding::of(FindingKind::UserTaskQuestionnaireNotFound, file, element.id.clone())
                .with_value(form_key),
            pid,
        ));
    }
}

fn check_task_listeners(
    element: &BpmnElement,
    file: &str,
    pid: Option<&str>,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let expected = expectation(ElementContract::UserTaskListener, ctx.api_version);
    for listener in &element.task_listeners {
        let Some(class) = listener.class_name.as_deref().map(str::trim).filter(|c| !c.is_empty())
        else {
            out.push(tag(
                Finding::of(FindingKind::TaskListenerClassMissing, file, element.id.clone()),
                pid,
            ));
            continue;
        };
        if !ctx.classes.exists(class) {
            out.push(tag(
                Finding::of(FindingKind::TaskListenerClassNotFound, file, element.id.clone())
                    .with_class_name(class),
                pid,
            ));
            continue;
        }
        let extends_default = expected
            .required_base
            .is_some_and(|base| ctx.classes.is_subclass_of(class, base));
        let implements = ctx.classes.implements(class, expected.required_interface);
        if !extends_default && !implements {
            out.push(tag(
                Finding::of(FindingKind::TaskListenerInvalid, file, element.id.clone())
                    .with_class_name(class)
                    .with_expected(expected.required_interface),
                pid,
            ));
        }
    }
}
