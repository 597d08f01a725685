//! Questionnaire rules

use super::{
    DATE_PLACEHOLDER, QUESTIONNAIRE_PROFILE, VERSION_PLACEHOLDER, check_read_access_tag,
    meta_profiles,
};
use crate::context::RuleContext;
use once_cell::sync::Lazy;
use proclint_core::fhir::{FhirNode, FhirResource};
use proclint_core::findings::{Finding, FindingKind};
use regex::Regex;
use std::collections::BTreeSet;

const VALID_STATUS: &[&str] = &["draft", "active", "retired", "unknown"];

/// The two items every user-task questionnaire must carry
const MANDATORY_ITEMS: &[&str] = &["business-key", "user-task-id"];

static KEBAB_CASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z0-9\\-]+$").expect("valid kebab case pattern"));

pub fn lint(resource: &FhirResource, file: &str, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut out = Vec::new();
    let anchor = resource.anchor();

    check_profile(resource, file, &anchor, &mut out);
    check_read_access_tag(resource, file, ctx, None, &mut out);

    match resource.root.child_value("status") {
        Some(status) if VALID_STATUS.contains(&status) => {}
        other => out.push(
            Finding::of(FindingKind::FhirQuestionnaireStatusInvalid, file, anchor.clone())
                .with_value(other.unwrap_or(""))
                .with_expected(VALID_STATUS.join("|")),
        ),
    }

    for (field, placeholder) in [("version", VERSION_PLACEHOLDER), ("date", DATE_PLACEHOLDER)] {
        let has_placeholder = resource
            .root
            .child_value(field)
            .is_some_and(|v| v.contains(placeholder));
        if !has_placeholder {
            out.push(
                Finding::of(
                    FindingKind::FhirQuestionnairePlaceholderMissing,
                    file,
                    anchor.clone(),
                )
                .with_field_name(field)
                .with_expected(placeholder),
            );
        }
    }

    let mut items = Vec::new();
    collect_items(&resource.root, &mut items);
    if items.is_empty() {
        out.push(Finding::of(
            FindingKind::FhirQuestionnaireItemMissing,
            file,
            anchor.clone(),
        ));
        return out;
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for item in &items {
        check_item(item, &mut seen, file, &anchor, &mut out);
    }
    check_mandatory_items(&items, file, &anchor, &mut out);
    out
}

fn check_profile(resource: &FhirResource, file: &str, anchor: &str, out: &mut Vec<Finding>) {
    let profiles = meta_profiles(resource);
    let Some(profile) = profiles.first() else {
        out.push(Finding::of(
            FindingKind::FhirQuestionnaireProfileMissing,
            file,
            anchor,
        ));
        return;
    };
    let base = profile.split('|').next().unwrap_or(profile);
    if base != QUESTIONNAIRE_PROFILE {
        out.push(
            Finding::of(FindingKind::FhirQuestionnaireProfileInvalid, file, anchor)
                .with_value(*profile)
                .with_expected(QUESTIONNAIRE_PROFILE),
        );
    }
}

fn collect_items<'a>(node: &'a FhirNode, items: &mut Vec<&'a FhirNode>) {
    for item in node.children_named("item") {
        items.push(item);
        collect_items(item, items);
    }
}

fn check_item<'a>(
    item: &'a FhirNode,
    seen: &mut BTreeSet<&'a str>,
    file: &str,
    anchor: &str,
    out: &mut Vec<Finding>,
) {
    let Some(link_id) = item.child_value("linkId").filter(|l| !l.trim().is_empty()) else {
        out.push(Finding::of(
            FindingKind::FhirQuestionnaireItemLinkIdMissing,
            file,
            anchor,
        ));
        return;
    };
    if !seen.insert(link_id) {
        out.push(
            Finding::of(FindingKind::FhirQuestionnaireItemLinkIdDuplicate, file, anchor)
                .with_value(link_id),
        );
    }
    if !KEBAB_CASE_RE.is_match(link_id) {
        out.push(
            Finding::of(FindingKind::FhirQuestionnaireItemLinkIdNotKebabCase, file, anchor)
                .with_value(link_id),
        );
    }
    if item.child_value("type").is_none() {
        out.push(
            Finding::of(FindingKind::FhirQuestionnaireItemTypeMissing, file, anchor)
                .with_value(link_id),
        );
    }
    if item.child_value("text").is_none() {
        out.push(
            Finding::of(FindingKind::FhirQuestionnaireItemTextMissing, file, anchor)
                .with_value(link_id),
        );
    }
}

fn check_mandatory_items(
    items: &[&FhirNode],
    file: &str,
    anchor: &str,
    out: &mut Vec<Finding>,
) {
    for link_id in MANDATORY_ITEMS {
        let Some(item) = items
            .iter()
            .find(|i| i.child_value("linkId") == Some(*link_id))
        else {
            out.push(
                Finding::of(FindingKind::FhirQuestionnaireMandatoryItemMissing, file, anchor)
                    .with_value(*link_id),
            );
            continue;
        };
        let valid = item.child_value("type") == Some("string")
            && item.child_value("required") == Some("true");
        if !valid {
            out.push(
                Finding::of(FindingKind::FhirQuestionnaireMandatoryItemInvalid, file, anchor)
                    .with_value(*link_id)
                    .with_expected("type=string, required=true"),
            );
        }
    }
}
