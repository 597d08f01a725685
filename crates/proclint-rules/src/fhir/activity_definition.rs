//! ActivityDefinition rules

use super::{
    ACTIVITY_DEFINITION_PROFILE, ACTIVITY_DEFINITION_URL_PREFIX, PROCESS_AUTHORIZATION_EXTENSION,
    check_read_access_tag, meta_profiles,
};
use crate::context::RuleContext;
use proclint_core::code_systems::PROCESS_AUTHORIZATION_SYSTEM;
use proclint_core::fhir::{FhirNode, FhirResource};
use proclint_core::findings::{Finding, FindingKind};

pub fn lint(resource: &FhirResource, file: &str, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut out = Vec::new();
    let anchor = resource.anchor();

    match resource.root.child_value("url") {
        Some(url) if url.starts_with(ACTIVITY_DEFINITION_URL_PREFIX) => {}
        other => out.push(
            Finding::of(FindingKind::FhirActivityDefinitionUrlInvalid, file, anchor.clone())
                .with_value(other.unwrap_or(""))
                .with_expected(ACTIVITY_DEFINITION_URL_PREFIX),
        ),
    }

    match resource.root.child_value("status") {
        Some("unknown") => {}
        other => out.push(
            Finding::of(FindingKind::FhirActivityDefinitionStatusInvalid, file, anchor.clone())
                .with_value(other.unwrap_or(""))
                .with_expected("unknown"),
        ),
    }

    match resource.root.child_value("kind") {
        Some("Task") => {}
        other => out.push(
            Finding::of(FindingKind::FhirActivityDefinitionKindInvalid, file, anchor.clone())
                .with_value(other.unwrap_or(""))
                .with_expected("Task"),
        ),
    }

    check_read_access_tag(resource, file, ctx, None, &mut out);
    check_profile(resource, file, &anchor, &mut out);
    check_process_authorization(resource, file, &anchor, ctx, &mut out);
    out
}

fn check_profile(resource: &FhirResource, file: &str, anchor: &str, out: &mut Vec<Finding>) {
    let profiles = meta_profiles(resource);
    if profiles.is_empty() {
        out.push(Finding::of(FindingKind::FhirMetaProfileMissing, file, anchor));
        return;
    }
    if profiles.contains(&ACTIVITY_DEFINITION_PROFILE) {
        return;
    }
    if profiles
        .iter()
        .any(|p| p.starts_with(&format!("{ACTIVITY_DEFINITION_PROFILE}|")))
    {
        out.push(
            Finding::of(
                FindingKind::FhirActivityDefinitionProfileVersionSuffix,
                file,
                anchor,
            )
            .with_value(profiles[0]),
        );
        return;
    }
    out.push(
        Finding::of(FindingKind::FhirMetaProfileInvalid, file, anchor)
            .with_value(profiles[0])
            .with_expected(ACTIVITY_DEFINITION_PROFILE),
    );
}

fn check_process_authorization(
    resource: &FhirResource,
    file: &str,
    anchor: &str,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let extensions: Vec<&FhirNode> = resource
        .root
        .extensions_with_url(PROCESS_AUTHORIZATION_EXTENSION)
        .collect();
    if extensions.is_empty() {
        out.push(Finding::of(
            FindingKind::FhirProcessAuthorizationMissing,
            file,
            anchor,
        ));
        return;
    }
    for extension in extensions {
        for (role, invalid_kind) in [
            ("requester", FindingKind::FhirProcessAuthorizationRequesterInvalid),
            ("recipient", FindingKind::FhirProcessAuthorizationRecipientInvalid),
        ] {
            let nodes: Vec<&FhirNode> = extension.extensions_with_url(role).collect();
            if nodes.len() != 1 {
                out.push(
                    Finding::of(
                        FindingKind::FhirProcessAuthorizationCardinalityInvalid,
                        file,
                        anchor,
                    )
                    .with_field_name(role)
                    .with_expected("1")
                    .with_actual(nodes.len().to_string()),
                );
            }
            for node in nodes {
                let Some(coding) = node.child("valueCoding") else {
                    out.push(
                        Finding::of(invalid_kind, file, anchor)
                            .with_field_name(role)
                            .with_system(PROCESS_AUTHORIZATION_SYSTEM),
                    );
                    continue;
                };
                let system = coding.child_value("system").unwrap_or("");
                let code = coding.child_value("code").unwrap_or("");
                if ctx.code_systems.is_unknown(system, code) {
                    out.push(
                        Finding::of(invalid_kind, file, anchor)
                            .with_field_name(role)
                            .with_system(system)
                            .with_code(code),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::bpmn::test_support::TestContext;
    use super::*;
    use proclint_core::fhir::from_xml;

    fn valid_activity_definition() -> &'static str {
        r#"<ActivityDefinition xmlns="http://hl7.org/fhir">
          <id value="ping"/>
          <meta>
            <tag>
              <system value="http://dsf.dev/fhir/CodeSystem/read-access-tag"/>
              <code value="ALL"/>
            </tag>
            <profile value="http://dsf.dev/fhir/StructureDefinition/activity-definition"/>
          </meta>
          <extension url="http://dsf.dev/fhir/StructureDefinition/extension-process-authorization">
            <extension url="message-name"><valueString value="pingMessage"/></extension>
            <extension url="requester">
              <valueCoding>
                <system value="http://dsf.dev/fhir/CodeSystem/process-authorization"/>
                <code value="LOCAL_ALL"/>
              </valueCoding>
            </extension>
            <extension url="recipient">
              <valueCoding>
                <system value="http://dsf.dev/fhir/CodeSystem/process-authorization"/>
                <code value="REMOTE_ALL"/>
              </valueCoding>
            </extension>
          </extension>
          <url value="http://dsf.dev/fhir/ActivityDefinition/ping"/>
          <status value="unknown"/>
          <kind value="Task"/>
        </ActivityDefinition>"#
    }

    #[test]
    fn valid_resource_has_no_negative_findings() {
        let resource = from_xml(valid_activity_definition(), "ad.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "ad.xml", &test.ctx());
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn wrong_url_status_and_kind_are_reported() {
        let resource = from_xml(
            r#"<ActivityDefinition>
              <url value="http://example.org/other"/>
              <status value="active"/>
              <kind value="ServiceRequest"/>
            </ActivityDefinition>"#,
            "ad.xml",
        )
        .unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "ad.xml", &test.ctx());
        for kind in [
            FindingKind::FhirActivityDefinitionUrlInvalid,
            FindingKind::FhirActivityDefinitionStatusInvalid,
            FindingKind::FhirActivityDefinitionKindInvalid,
            FindingKind::FhirReadAccessTagMissing,
            FindingKind::FhirMetaProfileMissing,
            FindingKind::FhirProcessAuthorizationMissing,
        ] {
            assert!(
                findings.iter().any(|f| f.kind == kind),
                "missing {kind:?} in {findings:?}"
            );
        }
    }

    #[test]
    fn profile_version_suffix_is_rejected() {
        let xml = valid_activity_definition().replace(
            "http://dsf.dev/fhir/StructureDefinition/activity-definition\"",
            "http://dsf.dev/fhir/StructureDefinition/activity-definition|1.0\"",
        );
        let resource = from_xml(&xml, "ad.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "ad.xml", &test.ctx());
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::FhirActivityDefinitionProfileVersionSuffix));
    }

    #[test]
    fn requester_must_be_exactly_one_with_valid_code() {
        let xml = valid_activity_definition().replace("LOCAL_ALL", "EVERYBODY");
        let resource = from_xml(&xml, "ad.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint(&resource, "ad.xml", &test.ctx());
        let invalid = findings
            .iter()
            .find(|f| f.kind == FindingKind::FhirProcessAuthorizationRequesterInvalid)
            .unwrap();
        assert_eq!(invalid.extra.code.as_deref(), Some("EVERYBODY"));

        let xml = valid_activity_definition().replace(
            r#"<extension url="requester">
              <valueCoding>
                <system value="http://dsf.dev/fhir/CodeSystem/process-authorization"/>
                <code value="LOCAL_ALL"/>
              </valueCoding>
            </extension>"#,
            "",
        );
        let resource = from_xml(&xml, "ad.xml").unwrap();
        let findings = lint(&resource, "ad.xml", &test.ctx());
        let cardinality = findings
            .iter()
            .find(|f| f.kind == FindingKind::FhirProcessAuthorizationCardinalityInvalid)
            .unwrap();
        assert_eq!(cardinality.extra.field_name.as_deref(), Some("requester"));
        assert_eq!(cardinality.extra.actual.as_deref(), Some("0"));
    }
}
