//! CodeSystem rules

use super::{DATE_PLACEHOLDER, VERSION_PLACEHOLDER};
use crate::context::RuleContext;
use proclint_core::fhir::FhirResource;
use proclint_core::findings::{Finding, FindingKind};
use std::collections::BTreeSet;

const REQUIRED_FIELDS: &[&str] = &["url", "name", "title", "publisher", "content", "caseSensitive"];

pub fn lint(resource: &FhirResource, file: &str, _ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut out = Vec::new();
    let anchor = resource.anchor();

    for field in REQUIRED_FIELDS {
        let present = resource
            .root
            .child_value(field)
            .is_some_and(|v| !v.trim().is_empty());
        if !present {
            out.push(
                Finding::of(FindingKind::FhirCodeSystemFieldMissing, file, anchor.clone())
                    .with_field_name(*field),
            );
        }
    }

    match resource.root.child_value("status") {
        Some("unknown") => {}
        other => out.push(
            Finding::of(FindingKind::FhirCodeSystemStatusInvalid, file, anchor.clone())
                .with_value(other.unwrap_or(""))
                .with_expected("unknown"),
        ),
    }

    for (field, placeholder) in [("version", VERSION_PLACEHOLDER), ("date", DATE_PLACEHOLDER)] {
        let has_placeholder = resource
            .root
            .child_value(field)
            .is_some_and(|v| v.contains(placeholder));
        if !has_placeholder {
            out.push(
                Finding::of(FindingKind::FhirCodeSystemPlaceholderMissing, file, anchor.clone())
                    .with_field_name(field)
                    .with_expected(placeholder),
            );
        }
    }

    let concepts: Vec<_> = resource.root.children_named("concept").collect();
    if concepts.is_empty() {
        out.push(Finding::of(
            FindingKind::FhirCodeSystemConceptMissing,
            file,
            anchor.clone(),
        ));
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for concept in concepts {
        let code = concept.child_value("code").map(str::trim).unwrap_or("");
        let display = concept.child_value("display").map(str::trim).unwrap_or("");
        if code.is_empty() || display.is_empty() {
            out.push(
                Finding::of(FindingKind::FhirCodeSystemConceptIncomplete, file, anchor.clone())
                    .with_value(code),
            );
        }
        if !code.is_empty() && !seen.insert(code) {
            out.push(
                Finding::of(FindingKind::FhirCodeSystemDuplicateCode, file, anchor.clone())
                    .with_code(code),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::super::bpmn::test_support::TestContext;
    use super::*;
    use proclint_core::fhir::from_xml;

    fn code_system(concepts: &str) -> String {
        format!(
            r##"<CodeSystem xmlns="http://hl7.org/fhir">
          <id value="cs"/>
          <url value="http://example.org/fhir/CodeSystem/test"/>
          <version value="#{{version}}"/>
          <name value="Test"/>
          <title value="Test"/>
          <status value="unknown"/>
          <date value="#{{date}}"/>
          <publisher value="Example"/>
          <caseSensitive value="true"/>
          <content value="complete"/>
          {concepts}
        </CodeSystem>"##
        )
    }

    #[test]
    fn valid_code_system_passes() {
        let xml = code_system(
            r#"<concept><code value="a"/><display value="A"/></concept>
               <concept><code value="b"/><display value="B"/></concept>"#,
        );
        let resource = from_xml(&xml, "cs.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "cs.xml", &test.ctx());
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn concepts_need_code_and_display() {
        let xml = code_system(r#"<concept><code value="a"/></concept>"#);
        let resource = from_xml(&xml, "cs.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "cs.xml", &test.ctx());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirCodeSystemConceptIncomplete));
    }

    #[test]
    fn duplicate_codes_are_reported() {
        let xml = code_system(
            r#"<concept><code value="a"/><display value="A"/></concept>
               <concept><code value="a"/><display value="A again"/></concept>"#,
        );
        let resource = from_xml(&xml, "cs.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "cs.xml", &test.ctx());
        let duplicate = findings
            .iter()
            .find(|f| f.kind == FindingKind::FhirCodeSystemDuplicateCode)
            .unwrap();
        assert_eq!(duplicate.extra.code.as_deref(), Some("a"));
    }

    #[test]
    fn empty_code_system_reports_everything() {
        let resource = from_xml(r#"<CodeSystem><id value="cs"/></CodeSystem>"#, "cs.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "cs.xml", &test.ctx());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirCodeSystemConceptMissing));
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirCodeSystemStatusInvalid));
        assert_eq!(
            findings
                .iter()
                .filter(|f| f.kind == FindingKind::FhirCodeSystemFieldMissing)
                .count(),
            REQUIRED_FIELDS.len()
        );
    }
}
