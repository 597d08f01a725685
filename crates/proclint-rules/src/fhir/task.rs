//! Task rules
//!
//! The linted Tasks are authoring templates: status `draft`, placeholders
//! unresolved, exactly one `message-name` input. The `business-key` and
//! `correlation-key` inputs are status-dependent and therefore excluded from
//! the StructureDefinition cardinality comparison.

use super::{
    DATE_PLACEHOLDER, ORGANIZATION_IDENTIFIER_SYSTEM, ORGANIZATION_PLACEHOLDER,
    TASK_PROFILE_PREFIX, VERSION_PLACEHOLDER, meta_profiles,
};
use crate::context::RuleContext;
use proclint_core::fhir::{FhirNode, FhirResource};
use proclint_core::findings::{Finding, FindingKind};

const STATUS_REQUIRING_BUSINESS_KEY: &[&str] = &["in-progress", "completed", "failed"];
const STATUS_DEPENDENT_SLICES: &[&str] = &["business-key", "correlation-key"];

pub fn lint(resource: &FhirResource, file: &str, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut out = Vec::new();
    let anchor = resource.anchor();

    check_profile(resource, file, &anchor, &mut out);

    let status = resource.root.child_value("status").unwrap_or("");
    if status != "draft" {
        out.push(
            Finding::of(FindingKind::FhirTaskStatusInvalid, file, anchor.clone())
                .with_value(status)
                .with_expected("draft"),
        );
    }

    match resource.root.child_value("intent") {
        Some("order") => {}
        other => out.push(
            Finding::of(FindingKind::FhirTaskIntentInvalid, file, anchor.clone())
                .with_value(other.unwrap_or(""))
                .with_expected("order"),
        ),
    }

    check_identifier(
        resource.root.at_path(&["requester", "identifier"]),
        "requester",
        file,
        &anchor,
        &mut out,
    );
    check_identifier(
        resource
            .root
            .at_path(&["restriction", "recipient", "identifier"]),
        "restriction.recipient",
        file,
        &anchor,
        &mut out,
    );

    let authored_on = resource.root.child_value("authoredOn").unwrap_or("");
    if !authored_on.contains(DATE_PLACEHOLDER) {
        out.push(
            Finding::of(FindingKind::FhirTaskAuthoredOnPlaceholderMissing, file, anchor.clone())
                .with_value(authored_on)
                .with_expected(DATE_PLACEHOLDER),
        );
    }

    check_instantiates_canonical(resource, file, &anchor, ctx, &mut out);
    check_inputs(resource, status, file, &anchor, ctx, &mut out);
    out
}

fn check_profile(resource: &FhirResource, file: &str, anchor: &str, out: &mut Vec<Finding>) {
    let profiles = meta_profiles(resource);
    let Some(profile) = profiles.first() else {
        out.push(Finding::of(FindingKind::FhirTaskProfileMissing, file, anchor));
        return;
    };
    let valid = profile.starts_with(TASK_PROFILE_PREFIX)
        && profile.contains(&format!("|{VERSION_PLACEHOLDER}"));
    if !valid {
        out.push(
            Finding::of(FindingKind::FhirTaskProfileInvalid, file, anchor)
                .with_value(*profile)
                .with_expected(format!("{TASK_PROFILE_PREFIX}…|{VERSION_PLACEHOLDER}")),
        );
    }
}

fn check_identifier(
    identifier: Option<&FhirNode>,
    field: &str,
    file: &str,
    anchor: &str,
    out: &mut Vec<Finding>,
) {
    let system = identifier
        .and_then(|i| i.child_value("system"))
        .unwrap_or("");
    if system != ORGANIZATION_IDENTIFIER_SYSTEM {
        out.push(
            Finding::of(FindingKind::FhirTaskIdentifierSystemInvalid, file, anchor)
                .with_field_name(field)
                .with_value(system)
                .with_expected(ORGANIZATION_IDENTIFIER_SYSTEM),
        );
    }
    let value = identifier
        .and_then(|i| i.child_value("value"))
        .unwrap_or("");
    if !value.contains(ORGANIZATION_PLACEHOLDER) {
        out.push(
            Finding::of(FindingKind::FhirTaskOrganizationPlaceholderMissing, file, anchor)
                .with_field_name(field)
                .with_value(value)
                .with_expected(ORGANIZATION_PLACEHOLDER),
        );
    }
}

fn check_instantiates_canonical(
    resource: &FhirResource,
    file: &str,
    anchor: &str,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let canonical = resource
        .root
        .child_value("instantiatesCanonical")
        .unwrap_or("");
    if !canonical.contains(VERSION_PLACEHOLDER) {
        out.push(
            Finding::of(
                FindingKind::FhirTaskInstantiatesCanonicalPlaceholderMissing,
                file,
                anchor,
            )
            .with_value(canonical)
            .with_expected(VERSION_PLACEHOLDER),
        );
    }
    if ctx.facts.activity_definition_urls.is_empty() {
        return;
    }
    let base = canonical.split('|').next().unwrap_or(canonical);
    if !ctx.facts.activity_definition_urls.contains(base) {
        out.push(
            Finding::of(FindingKind::FhirTaskInstantiatesCanonicalUnknown, file, anchor)
                .with_value(canonical),
        );
    }
}

/// Code of an input's `type.coding`
fn input_coding(input: &FhirNode) -> Option<(&str, &str)> {
    let coding = input.at_path(&["type", "coding"])?;
    Some((
        coding.child_value("system").unwrap_or(""),
        coding.child_value("code").unwrap_or(""),
    ))
}

fn check_inputs(
    resource: &FhirResource,
    status: &str,
    file: &str,
    anchor: &str,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let inputs: Vec<&FhirNode> = resource.root.children_named("input").collect();

    let count_of = |slice: &str| {
        inputs
            .iter()
            .filter(|i| input_coding(i).map(|(_, code)| code) == Some(slice))
            .count()
    };

    for input in &inputs {
        let Some((system, code)) = input_coding(input) else {
            continue;
        };
        if !system.is_empty() && !code.is_empty() && ctx.code_systems.is_unknown(system, code) {
            out.push(
                Finding::of(FindingKind::FhirTaskCodingCodeUnknown, file, anchor)
                    .with_system(system)
                    .with_code(code),
            );
        }
    }

    let message_name_count = count_of("message-name");
    if message_name_count != 1 {
        out.push(
            Finding::of(FindingKind::FhirTaskMessageNameInputCountInvalid, file, anchor)
                .with_expected("1")
                .with_actual(message_name_count.to_string()),
        );
    }

    let has_business_key = count_of("business-key") > 0;
    let has_correlation_key = count_of("correlation-key") > 0;
    if STATUS_REQUIRING_BUSINESS_KEY.contains(&status) {
        if !has_business_key {
            out.push(Finding::of(FindingKind::FhirTaskBusinessKeyMissing, file, anchor));
        }
    } else if status == "draft" {
        if has_business_key {
            out.push(Finding::of(FindingKind::FhirTaskBusinessKeyPresent, file, anchor));
        }
        if has_correlation_key {
            out.push(Finding::of(FindingKind::FhirTaskCorrelationKeyPresent, file, anchor));
        }
    } else {
        out.push(
            Finding::of(FindingKind::FhirTaskBusinessKeyCheckSkipped, file, anchor)
                .with_value(status),
        );
    }

    for (slice, (min, max)) in &ctx.facts.task_input_cardinalities {
        if STATUS_DEPENDENT_SLICES.contains(&slice.as_str()) {
            continue;
        }
        let count = count_of(slice) as u32;
        let below = count < *min;
        let above = max.is_some_and(|max| count > max);
        if below || above {
            let bound = match max {
                Some(max) => format!("{min}..{max}"),
                None => format!("{min}..*"),
            };
            out.push(
                Finding::of(FindingKind::FhirTaskInputCardinalityInvalid, file, anchor)
                    .with_value(slice)
                    .with_expected(bound)
                    .with_actual(count.to_string()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::bpmn::test_support::TestContext;
    use super::*;
    use proclint_core::fhir::from_xml;

    fn task(status: &str, inputs: &str) -> String {
        format!(
            r##"<Task xmlns="http://hl7.org/fhir">
          <id value="task-ping"/>
          <meta>
            <profile value="http://dsf.dev/fhir/StructureDefinition/task-ping|#{{version}}"/>
          </meta>
          <instantiatesCanonical value="http://dsf.dev/bpe/Process/ping|#{{version}}"/>
          <status value="{status}"/>
          <intent value="order"/>
          <authoredOn value="#{{date}}"/>
          <requester>
            <identifier>
              <system value="http://dsf.dev/sid/organization-identifier"/>
              <value value="#{{organization}}"/>
            </identifier>
          </requester>
          <restriction>
            <recipient>
              <identifier>
                <system value="http://dsf.dev/sid/organization-identifier"/>
                <value value="#{{organization}}"/>
              </identifier>
            </recipient>
          </restriction>
          {inputs}
        </Task>"##
        )
    }

    fn input(code: &str) -> String {
        format!(
            r#"<input>
              <type><coding>
                <system value="http://dsf.dev/fhir/CodeSystem/bpmn-message"/>
                <code value="{code}"/>
              </coding></type>
              <value value="x"/>
            </input>"#
        )
    }

    #[test]
    fn valid_draft_task_passes() {
        let xml = task("draft", &input("message-name"));
        let resource = from_xml(&xml, "t.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "t.xml", &test.ctx());
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn business_key_presence_depends_on_status() {
        let test = TestContext::empty();
        // Required but absent
        for status in ["in-progress", "completed", "failed"] {
            let xml = task(status, &input("message-name"));
            let resource = from_xml(&xml, "t.xml").unwrap();
            let findings = lint(&resource, "t.xml", &test.ctx());
            assert!(
                findings
                    .iter()
                    .any(|f| f.kind == FindingKind::FhirTaskBusinessKeyMissing),
                "{status} without business-key must be an error"
            );
        }
        // Present in draft
        let xml = task("draft", &format!("{}{}", input("message-name"), input("business-key")));
        let resource = from_xml(&xml, "t.xml").unwrap();
        let findings = lint(&resource, "t.xml", &test.ctx());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirTaskBusinessKeyPresent));
        // Other statuses skip the check
        let xml = task("requested", &input("message-name"));
        let resource = from_xml(&xml, "t.xml").unwrap();
        let findings = lint(&resource, "t.xml", &test.ctx());
        let skipped = findings
            .iter()
            .find(|f| f.kind == FindingKind::FhirTaskBusinessKeyCheckSkipped)
            .unwrap();
        assert_eq!(skipped.extra.value.as_deref(), Some("requested"));
    }

    #[test]
    fn correlation_key_must_not_appear_in_draft() {
        let xml = task(
            "draft",
            &format!("{}{}", input("message-name"), input("correlation-key")),
        );
        let resource = from_xml(&xml, "t.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "t.xml", &test.ctx());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirTaskCorrelationKeyPresent));
    }

    #[test]
    fn exactly_one_message_name_input() {
        let xml = task(
            "draft",
            &format!("{}{}", input("message-name"), input("message-name")),
        );
        let resource = from_xml(&xml, "t.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "t.xml", &test.ctx());
        let finding = findings
            .iter()
            .find(|f| f.kind == FindingKind::FhirTaskMessageNameInputCountInvalid)
            .unwrap();
        assert_eq!(finding.extra.actual.as_deref(), Some("2"));
    }

    #[test]
    fn unknown_coding_codes_are_reported() {
        let xml = task("draft", &input("message-name")).replace(
            r#"<code value="message-name"/>"#,
            r#"<code value="mystery-code"/>"#,
        );
        let resource = from_xml(&xml, "t.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "t.xml", &test.ctx());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirTaskCodingCodeUnknown));
    }

    #[test]
    fn instantiates_canonical_must_reference_a_declared_activity_definition() {
        let mut test = TestContext::empty();
        test.facts
            .activity_definition_urls
            .insert("http://dsf.dev/bpe/Process/other".to_string());
        let xml = task("draft", &input("message-name"));
        let resource = from_xml(&xml, "t.xml").unwrap();
        let findings = lint(&resource, "t.xml", &test.ctx());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirTaskInstantiatesCanonicalUnknown));
    }

    #[test]
    fn slice_cardinalities_are_compared_against_the_structure_definition() {
        let mut test = TestContext::empty();
        test.facts
            .task_input_cardinalities
            .insert("extra-input".to_string(), (1, Some(2)));
        let xml = task("draft", &input("message-name"));
        let resource = from_xml(&xml, "t.xml").unwrap();
        let findings = lint(&resource, "t.xml", &test.ctx());
        let finding = findings
            .iter()
            .find(|f| f.kind == FindingKind::FhirTaskInputCardinalityInvalid)
            .unwrap();
        assert_eq!(finding.extra.value.as_deref(), Some("extra-input"));
        assert_eq!(finding.extra.expected.as_deref(), Some("1..2"));
        assert_eq!(finding.extra.actual.as_deref(), Some("0"));
    }

    #[test]
    fn wrong_identifier_system_and_placeholders() {
        let xml = task("draft", &input("message-name"))
            .replace("http://dsf.dev/sid/organization-identifier", "http://example.org/orgs")
            .replace("#{organization}", "Test Org")
            .replace("#{date}", "2024-01-01");
        let resource = from_xml(&xml, "t.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "t.xml", &test.ctx());
        assert_eq!(
            findings
                .iter()
                .filter(|f| f.kind == FindingKind::FhirTaskIdentifierSystemInvalid)
                .count(),
            2
        );
        assert_eq!(
            findings
                .iter()
                .filter(|f| f.kind == FindingKind::FhirTaskOrganizationPlaceholderMissing)
                .count(),
            2
        );
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirTaskAuthoredOnPlaceholderMissing));
    }
}
