//! StructureDefinition rules
//!
//! Authoring sources ship differentials only; the snapshot is generated
//! downstream. Slice cardinalities are compared against their base element
//! within the differential.

use super::{DATE_PLACEHOLDER, VERSION_PLACEHOLDER};
use crate::context::RuleContext;
use proclint_core::fhir::{FhirNode, FhirResource};
use proclint_core::findings::{Finding, FindingKind};
use std::collections::{BTreeMap, BTreeSet};

pub fn lint(resource: &FhirResource, file: &str, _ctx: &RuleContext<'_>) -> Vec<Finding> {
    let mut out = Vec::new();
    let anchor = resource.anchor();

    for (field, placeholder) in [("version", VERSION_PLACEHOLDER), ("date", DATE_PLACEHOLDER)] {
        let has_placeholder = resource
            .root
            .child_value(field)
            .is_some_and(|v| v.contains(placeholder));
        if !has_placeholder {
            out.push(
                Finding::of(
                    FindingKind::FhirStructureDefinitionPlaceholderMissing,
                    file,
                    anchor.clone(),
                )
                .with_field_name(field)
                .with_expected(placeholder),
            );
        }
    }

    if resource.root.child("snapshot").is_some() {
        out.push(Finding::of(
            FindingKind::FhirStructureDefinitionSnapshotPresent,
            file,
            anchor.clone(),
        ));
    }

    let Some(differential) = resource.root.child("differential") else {
        out.push(Finding::of(
            FindingKind::FhirStructureDefinitionDifferentialMissing,
            file,
            anchor,
        ));
        return out;
    };

    let elements: Vec<&FhirNode> = differential.children_named("element").collect();
    check_element_ids(&elements, file, &anchor, &mut out);
    check_slices(&elements, file, &anchor, &mut out);
    out
}

fn check_element_ids(elements: &[&FhirNode], file: &str, anchor: &str, out: &mut Vec<Finding>) {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for element in elements {
        match element.attr("id") {
            None => out.push(
                Finding::of(FindingKind::FhirStructureDefinitionElementIdMissing, file, anchor)
                    .with_value(element.child_value("path").unwrap_or("")),
            ),
            Some(id) => {
                if !seen.insert(id) {
                    out.push(
                        Finding::of(
                            FindingKind::FhirStructureDefinitionElementIdDuplicate,
                            file,
                            anchor,
                        )
                        .with_value(id),
                    );
                }
            }
        }
    }
}

/// Cardinality bounds of one element; `None` max is unbounded
fn bounds(element: &FhirNode) -> (Option<u32>, Option<u32>) {
    let min = element.child_value("min").and_then(|v| v.parse().ok());
    let max = match element.child_value("max") {
        Some("*") => None,
        Some(value) => value.parse().ok(),
        None => None,
    };
    (min, max)
}

fn check_slices(elements: &[&FhirNode], file: &str, anchor: &str, out: &mut Vec<Finding>) {
    let by_id: BTreeMap<&str, &FhirNode> = elements
        .iter()
        .filter_map(|e| e.attr("id").map(|id| (id, *e)))
        .collect();

    // Sum of slice mins per base element id
    let mut slice_min_sums: BTreeMap<&str, u32> = BTreeMap::new();

    for element in elements {
        let Some(id) = element.attr("id") else {
            continue;
        };
        if element.child("sliceName").is_none() {
            continue;
        }
        let Some((base_id, _)) = id.rsplit_once(':') else {
            continue;
        };
        let Some(base) = by_id.get(base_id) else {
            continue;
        };
        let (slice_min, slice_max) = bounds(element);
        let (base_min, base_max) = bounds(base);

        if let Some(base_max) = base_max {
            let exceeds = match slice_max {
                None => true,
                Some(slice_max) => slice_max > base_max,
            };
            if exceeds {
                out.push(
                    Finding::of(
                        FindingKind::FhirStructureDefinitionSliceMaxExceedsBase,
                        file,
                        anchor,
                    )
                    .with_value(id)
                    .with_expected(base_max.to_string())
                    .with_actual(
                        slice_max.map(|m| m.to_string()).unwrap_or_else(|| "*".to_string()),
                    ),
                );
            }
        }

        if let (Some(slice_min), Some(base_min)) = (slice_min, base_min) {
            if slice_min < base_min {
                out.push(
                    Finding::of(
                        FindingKind::FhirStructureDefinitionSliceMinBelowBase,
                        file,
                        anchor,
                    )
                    .with_value(id)
                    .with_expected(base_min.to_string())
                    .with_actual(slice_min.to_string()),
                );
            }
        }
        *slice_min_sums.entry(base_id).or_insert(0) += slice_min.unwrap_or(0);
    }

    for (base_id, sum) in slice_min_sums {
        let Some(base) = by_id.get(base_id) else {
            continue;
        };
        let (Some(base_min), _) = bounds(base) else {
            continue;
        };
        if sum < base_min {
            out.push(
                Finding::of(
                    FindingKind::FhirStructureDefinitionSliceMinSumBelowBase,
                    file,
                    anchor,
                )
                .with_value(base_id)
                .with_expected(base_min.to_string())
                .with_actual(sum.to_string()),
            );
        } else if sum > base_min {
            out.push(
                Finding::of(
                    FindingKind::FhirStructureDefinitionSliceMinSumAboveBase,
                    file,
                    anchor,
                )
                .with_value(base_id)
                .with_expected(base_min.to_string())
                .with_actual(sum.to_string()),
            );
        }
    }
}
