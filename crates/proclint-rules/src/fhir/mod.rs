//! FHIR rule dispatch
//!
//! Parses a resource file (XML or JSON) into the uniform tree, detects the
//! resource type, and invokes the registered linter for that type. Types
//! without a registered linter produce a single INFO finding.

pub mod activity_definition;
pub mod code_system;
pub mod questionnaire;
pub mod structure_definition;
pub mod task;
pub mod value_set;

use crate::context::{PluginFacts, RuleContext};
use proclint_core::fhir::{FhirNode, FhirResource, parse_resource};
use proclint_core::findings::{Finding, FindingKind};
use std::path::Path;
use tracing::debug;

pub const VERSION_PLACEHOLDER: &str = "#{version}";
pub const DATE_PLACEHOLDER: &str = "#{date}";
pub const ORGANIZATION_PLACEHOLDER: &str = "#{organization}";

pub const ACTIVITY_DEFINITION_URL_PREFIX: &str = "http://dsf.dev/fhir/ActivityDefinition/";
pub const ACTIVITY_DEFINITION_PROFILE: &str =
    "http://dsf.dev/fhir/StructureDefinition/activity-definition";
pub const TASK_PROFILE_PREFIX: &str = "http://dsf.dev/fhir/StructureDefinition/";
pub const QUESTIONNAIRE_PROFILE: &str = "http://dsf.dev/fhir/StructureDefinition/questionnaire";
pub const ORGANIZATION_IDENTIFIER_SYSTEM: &str = "http://dsf.dev/sid/organization-identifier";
pub const PROCESS_AUTHORIZATION_EXTENSION: &str =
    "http://dsf.dev/fhir/StructureDefinition/extension-process-authorization";

/// Lint one resolved FHIR file
pub fn lint_file(path: &Path, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!("Unreadable FHIR file {}: {}", path.display(), e);
            return vec![Finding::of(FindingKind::UnparsableFhir, file.clone(), file)];
        }
    };
    let resource = match parse_resource(&file, &text) {
        Ok(resource) => resource,
        Err(e) => {
            debug!("Unparseable FHIR file {}: {}", path.display(), e);
            return vec![
                Finding::of(FindingKind::UnparsableFhir, file.clone(), file)
                    .with_description(e.to_string()),
            ];
        }
    };
    lint_resource(&resource, &file, ctx)
}

/// Dispatch a parsed resource to its registered linter
pub fn lint_resource(resource: &FhirResource, file: &str, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let findings = match resource.resource_type.as_str() {
        "ActivityDefinition" => activity_definition::lint(resource, file, ctx),
        "StructureDefinition" => structure_definition::lint(resource, file, ctx),
        "Task" => task::lint(resource, file, ctx),
        "ValueSet" => value_set::lint(resource, file, ctx),
        "CodeSystem" => code_system::lint(resource, file, ctx),
        "Questionnaire" => questionnaire::lint(resource, file, ctx),
        other => vec![
            Finding::of(FindingKind::FhirResourceTypeUnsupported, file, resource.anchor())
                .with_description(format!("No checks registered for resource type '{other}'")),
        ],
    };
    attach_resource_id(findings, resource)
}

fn attach_resource_id(findings: Vec<Finding>, resource: &FhirResource) -> Vec<Finding> {
    let Some(id) = resource.id() else {
        return findings;
    };
    findings
        .into_iter()
        .map(|f| {
            if f.resource_id.is_none() {
                f.with_resource_id(id)
            } else {
                f
            }
        })
        .collect()
}

/// `meta.profile` values of a resource
pub(crate) fn meta_profiles(resource: &FhirResource) -> Vec<&str> {
    resource
        .root
        .child("meta")
        .map(|meta| {
            meta.children_named("profile")
                .filter_map(FhirNode::value)
                .collect()
        })
        .unwrap_or_default()
}

/// Codes of `meta.tag` entries in the read-access-tag system
pub(crate) fn read_access_codes(resource: &FhirResource) -> Vec<&str> {
    resource
        .root
        .child("meta")
        .map(|meta| {
            meta.children_named("tag")
                .filter(|tag| {
                    tag.child_value("system")
                        == Some(proclint_core::code_systems::READ_ACCESS_TAG_SYSTEM)
                })
                .filter_map(|tag| tag.child_value("code"))
                .collect()
        })
        .unwrap_or_default()
}

/// Shared read-access-tag rule; `allowed` narrows the accepted codes
pub(crate) fn check_read_access_tag(
    resource: &FhirResource,
    file: &str,
    ctx: &RuleContext<'_>,
    allowed: Option<&[&str]>,
    out: &mut Vec<Finding>,
) {
    let codes = read_access_codes(resource);
    if codes.is_empty() {
        out.push(Finding::of(
            FindingKind::FhirReadAccessTagMissing,
            file,
            resource.anchor(),
        ));
        return;
    }
    for code in &codes {
        if ctx
            .code_systems
            .is_unknown(proclint_core::code_systems::READ_ACCESS_TAG_SYSTEM, code)
        {
            out.push(
                Finding::of(FindingKind::FhirReadAccessTagInvalid, file, resource.anchor())
                    .with_system(proclint_core::code_systems::READ_ACCESS_TAG_SYSTEM)
                    .with_code(*code),
            );
        }
    }
    if let Some(allowed) = allowed {
        if !codes.iter().any(|code| allowed.contains(code)) {
            out.push(
                Finding::of(FindingKind::FhirReadAccessTagInvalid, file, resource.anchor())
                    .with_system(proclint_core::code_systems::READ_ACCESS_TAG_SYSTEM)
                    .with_expected(allowed.join(" or ")),
            );
        }
    }
}

/// Gather the per-plugin facts the rules need from the resolved FHIR files
pub fn gather_facts(paths: &[std::path::PathBuf]) -> PluginFacts {
    let mut facts = PluginFacts::default();
    for path in paths {
        let file = path.to_string_lossy();
        let Ok(text) = std::fs::read_to_string(path) else {
            continue;
        };
        let Ok(resource) = parse_resource(&file, &text) else {
            continue;
        };
        collect_facts(&resource, &mut facts);
    }
    facts
}

/// Fold one parsed resource into the fact set
pub fn collect_facts(resource: &FhirResource, facts: &mut PluginFacts) {
    match resource.resource_type.as_str() {
        "ActivityDefinition" => {
            if let Some(url) = resource.root.child_value("url") {
                facts.activity_definition_urls.insert(url.to_string());
            }
            for ext in resource
                .root
                .extensions_with_url(PROCESS_AUTHORIZATION_EXTENSION)
            {
                for message in ext.extensions_with_url("message-name") {
                    if let Some(name) = message.child_value("valueString") {
                        facts.declared_messages.insert(name.to_string());
                    }
                }
            }
        }
        "StructureDefinition" => {
            for key in ["name", "id"] {
                if let Some(value) = resource.root.child_value(key) {
                    facts.declared_messages.insert(value.to_string());
                }
            }
            if let Some(id) = resource.id() {
                facts.declared_messages.insert(id.to_string());
            }
            if resource.root.child_value("type") == Some("Task") {
                collect_task_input_cardinalities(resource, facts);
            }
        }
        "Questionnaire" => {
            if let Some(url) = resource.root.child_value("url") {
                let base = url.split('|').next().unwrap_or(url);
                facts.questionnaire_urls.insert(base.to_string());
            }
        }
        _ => {}
    }
}

fn collect_task_input_cardinalities(resource: &FhirResource, facts: &mut PluginFacts) {
    let Some(differential) = resource.root.child("differential") else {
        return;
    };
    for element in differential.children_named("element") {
        let Some(id) = element.attr("id") else {
            continue;
        };
        let Some(slice) = id.strip_prefix("Task.input:") else {
            continue;
        };
        if slice.contains('.') {
            continue;
        }
        let min = element
            .child_value("min")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        let max = match element.child_value("max") {
            Some("*") | None => None,
            Some(value) => value.parse::<u32>().ok(),
        };
        facts
            .task_input_cardinalities
            .insert(slice.to_string(), (min, max));
    }
}

#[cfg(test)]
mod tests {
    use super::super::bpmn::test_support::TestContext;
    use super::*;
    use proclint_core::fhir::from_xml;

    #[test]
    fn unsupported_resource_type_is_a_single_info() {
        let resource = from_xml(r#"<Patient><id value="p"/></Patient>"#, "p.xml").unwrap();
        let test = TestContext::empty();
        let findings = lint_resource(&resource, "p.xml", &test.ctx());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::FhirResourceTypeUnsupported);
        assert!(findings[0].description.contains("Patient"));
        assert_eq!(findings[0].resource_id.as_deref(), Some("p"));
    }

    #[test]
    fn facts_collect_messages_questionnaires_and_cardinalities() {
        let ad = from_xml(
            r#"<ActivityDefinition>
                <url value="http://dsf.dev/fhir/ActivityDefinition/ping"/>
                <extension url="http://dsf.dev/fhir/StructureDefinition/extension-process-authorization">
                  <extension url="message-name"><valueString value="pingMessage"/></extension>
                </extension>
            </ActivityDefinition>"#,
            "ad.xml",
        )
        .unwrap();
        let sd = from_xml(
            r#"<StructureDefinition>
                <id value="task-ping"/>
                <name value="TaskPing"/>
                <type value="Task"/>
                <differential>
                  <element id="Task.input"><min value="2"/><max value="3"/></element>
                  <element id="Task.input:message-name"><min value="1"/><max value="1"/></element>
                </differential>
            </StructureDefinition>"#,
            "sd.xml",
        )
        .unwrap();
        let q = from_xml(
            r#"<Questionnaire><url value="http://dsf.dev/fhir/Questionnaire/ping|#{version}"/></Questionnaire>"#,
            "q.xml",
        )
        .unwrap();

        let mut facts = PluginFacts::default();
        collect_facts(&ad, &mut facts);
        collect_facts(&sd, &mut facts);
        collect_facts(&q, &mut facts);

        assert!(facts.declared_messages.contains("pingMessage"));
        assert!(facts.declared_messages.contains("TaskPing"));
        assert!(facts
            .activity_definition_urls
            .contains("http://dsf.dev/fhir/ActivityDefinition/ping"));
        assert!(facts
            .questionnaire_urls
            .contains("http://dsf.dev/fhir/Questionnaire/ping"));
        assert_eq!(
            facts.task_input_cardinalities.get("message-name"),
            Some(&(1, Some(1)))
        );
    }
}
