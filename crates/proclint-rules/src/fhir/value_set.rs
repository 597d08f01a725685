//! ValueSet rules

use super::{DATE_PLACEHOLDER, VERSION_PLACEHOLDER, check_read_access_tag};
use crate::context::RuleContext;
use proclint_core::fhir::{FhirNode, FhirResource};
use proclint_core::findings::{Finding, FindingKind};
use std::collections::BTreeSet;

const REQUIRED_FIELDS: &[&str] = &["url", "name", "title", "publisher", "description"];

/// Read-access tags a ValueSet must carry
const ALLOWED_READ_ACCESS: &[&str] = &["ALL", "LOCAL"];

pub fn lint(resource: &FhirResource, file: &str, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut out = Vec::new();
    let anchor = resource.anchor();

    for field in REQUIRED_FIELDS {
        let present = resource
            .root
            .child_value(field)
            .is_some_and(|v| !v.trim().is_empty());
        if !present {
            out.push(
                Finding::of(FindingKind::FhirValueSetFieldMissing, file, anchor.clone())
                    .with_field_name(*field),
            );
        }
    }

    for (field, placeholder) in [("version", VERSION_PLACEHOLDER), ("date", DATE_PLACEHOLDER)] {
        let has_placeholder = resource
            .root
            .child_value(field)
            .is_some_and(|v| v.contains(placeholder));
        if !has_placeholder {
            out.push(
                Finding::of(FindingKind::FhirValueSetPlaceholderMissing, file, anchor.clone())
                    .with_field_name(field)
                    .with_expected(placeholder),
            );
        }
    }

    check_read_access_tag(resource, file, ctx, Some(ALLOWED_READ_ACCESS), &mut out);

    let includes: Vec<&FhirNode> = resource
        .root
        .child("compose")
        .map(|compose| compose.children_named("include").collect())
        .unwrap_or_default();
    if includes.is_empty() {
        out.push(Finding::of(
            FindingKind::FhirValueSetIncludeMissing,
            file,
            anchor.clone(),
        ));
    }
    for include in includes {
        check_include(include, file, &anchor, ctx, &mut out);
    }
    out
}

fn check_include(
    include: &FhirNode,
    file: &str,
    anchor: &str,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let system = include.child_value("system").unwrap_or("");
    if system.is_empty() {
        out.push(Finding::of(
            FindingKind::FhirValueSetIncludeSystemMissing,
            file,
            anchor,
        ));
    }

    if let Some(version) = include.child_value("version") {
        if !version.contains(VERSION_PLACEHOLDER) {
            out.push(
                Finding::of(FindingKind::FhirValueSetPlaceholderMissing, file, anchor)
                    .with_field_name("compose.include.version")
                    .with_expected(VERSION_PLACEHOLDER),
            );
        }
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for concept in include.children_named("concept") {
        let Some(code) = concept.child_value("code").filter(|c| !c.trim().is_empty()) else {
            out.push(Finding::of(
                FindingKind::FhirValueSetConceptCodeMissing,
                file,
                anchor,
            ));
            continue;
        };
        if !seen.insert(code) {
            out.push(
                Finding::of(FindingKind::FhirValueSetDuplicateCode, file, anchor)
                    .with_system(system)
                    .with_code(code),
            );
            continue;
        }
        if system.is_empty() {
            continue;
        }
        if !ctx.code_systems.is_unknown(system, code) {
            continue;
        }
        match ctx.code_systems.system_declaring(code) {
            Some(true_system) => out.push(
                Finding::of(FindingKind::FhirValueSetFalseUrlReferenced, file, anchor)
                    .with_description(format!(
                        "Concept code '{code}' is not declared by '{system}' but by '{true_system}'"
                    ))
                    .with_system(system)
                    .with_code(code)
                    .with_expected(true_system),
            ),
            None => out.push(
                Finding::of(FindingKind::FhirValueSetUnknownCode, file, anchor)
                    .with_system(system)
                    .with_code(code),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::bpmn::test_support::TestContext;
    use super::*;
    use proclint_core::fhir::from_xml;
    use proclint_core::findings::Severity;

    fn value_set(include: &str) -> String {
        format!(
            r##"<ValueSet xmlns="http://hl7.org/fhir">
          <id value="vs"/>
          <meta>
            <tag>
              <system value="http://dsf.dev/fhir/CodeSystem/read-access-tag"/>
              <code value="ALL"/>
            </tag>
          </meta>
          <url value="http://example.org/fhir/ValueSet/test"/>
          <version value="#{{version}}"/>
          <name value="Test"/>
          <title value="Test"/>
          <date value="#{{date}}"/>
          <publisher value="Example"/>
          <description value="Test value set"/>
          <compose>{include}</compose>
        </ValueSet>"##
        )
    }

    #[test]
    fn valid_value_set_passes() {
        let xml = value_set(
            r#"<include>
                 <system value="http://dsf.dev/fhir/CodeSystem/organization-role"/>
                 <concept><code value="DIC"/></concept>
               </include>"#,
        );
        let resource = from_xml(&xml, "vs.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "vs.xml", &test.ctx());
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn code_declared_elsewhere_points_at_the_true_system() {
        let test = TestContext::empty();
        test.code_systems
            .register("http://example.org/CodeSystem/real", ["abc"]);
        let xml = value_set(
            r#"<include>
                 <system value="http://wrong.system"/>
                 <concept><code value="abc"/></concept>
               </include>"#,
        );
        let resource = from_xml(&xml, "vs.xml").unwrap();
        let findings = lint(&resource, "vs.xml", &test.ctx());
        let false_url: Vec<_> = findings
            .iter()
            .filter(|f| f.kind == FindingKind::FhirValueSetFalseUrlReferenced)
            .collect();
        assert_eq!(false_url.len(), 1);
        assert_eq!(false_url[0].severity, Severity::Error);
        assert!(false_url[0]
            .description
            .contains("http://example.org/CodeSystem/real"));
    }

    #[test]
    fn unknown_code_everywhere_is_distinct() {
        let xml = value_set(
            r#"<include>
                 <system value="http://wrong.system"/>
                 <concept><code value="never-seen"/></concept>
               </include>"#,
        );
        let resource = from_xml(&xml, "vs.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "vs.xml", &test.ctx());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirValueSetUnknownCode));
    }

    #[test]
    fn duplicate_codes_within_one_include() {
        let xml = value_set(
            r#"<include>
                 <system value="http://dsf.dev/fhir/CodeSystem/organization-role"/>
                 <concept><code value="DIC"/></concept>
                 <concept><code value="DIC"/></concept>
               </include>"#,
        );
        let resource = from_xml(&xml, "vs.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "vs.xml", &test.ctx());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirValueSetDuplicateCode));
    }

    #[test]
    fn missing_fields_and_include() {
        let resource = from_xml(r#"<ValueSet><id value="vs"/></ValueSet>"#, "vs.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "vs.xml", &test.ctx());
        let missing: BTreeSet<_> = findings
            .iter()
            .filter(|f| f.kind == FindingKind::FhirValueSetFieldMissing)
            .filter_map(|f| f.extra.field_name.as_deref())
            .collect();
        assert_eq!(
            missing,
            BTreeSet::from(["url", "name", "title", "publisher", "description"])
        );
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirValueSetIncludeMissing));
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirReadAccessTagMissing));
    }

    #[test]
    fn read_access_tag_must_be_all_or_local() {
        let xml = value_set(
            r#"<include>
                 <system value="http://dsf.dev/fhir/CodeSystem/organization-role"/>
                 <concept><code value="DIC"/></concept>
               </include>"#,
        )
        .replace(r#"<code value="ALL"/>"#, r#"<code value="ROLE"/>"#);
        let resource = from_xml(&xml, "vs.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "vs.xml", &test.ctx());
        let invalid = findings
            .iter()
            .find(|f| f.kind == FindingKind::FhirReadAccessTagInvalid)
            .unwrap();
        assert_eq!(invalid.extra.expected.as_deref(), Some("ALL or LOCAL"));
    }
}
