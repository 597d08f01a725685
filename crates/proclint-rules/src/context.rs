//! Per-plugin rule context
//!
//! Rules are pure functions of `(model, context)`. The orchestrator builds
//! one context per plugin, carrying the active API version and borrowed
//! views of the class lookup, the code-system cache, and the facts gathered
//! from the plugin's resolved FHIR files.

use proclint_core::{ApiVersion, ClassLookup, CodeSystemCache};
use std::collections::{BTreeMap, BTreeSet};

/// Facts gathered from the plugin's valid FHIR files before rule dispatch
#[derive(Debug, Clone, Default)]
pub struct PluginFacts {
    /// Message names declared by ActivityDefinitions plus the names and ids
    /// of StructureDefinitions
    pub declared_messages: BTreeSet<String>,
    /// Canonical URLs of the plugin's Questionnaires, version suffix removed
    pub questionnaire_urls: BTreeSet<String>,
    /// Canonical URLs of the plugin's ActivityDefinitions
    pub activity_definition_urls: BTreeSet<String>,
    /// Task input slice cardinalities from the plugin's Task
    /// StructureDefinitions: slice name to `(min, max)`; `None` max is `*`
    pub task_input_cardinalities: BTreeMap<String, (u32, Option<u32>)>,
}

/// Borrowed context handed to every rule invocation
pub struct RuleContext<'a> {
    pub api_version: ApiVersion,
    pub classes: &'a dyn ClassLookup,
    pub code_systems: &'a CodeSystemCache,
    pub facts: &'a PluginFacts,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        api_version: ApiVersion,
        classes: &'a dyn ClassLookup,
        code_systems: &'a CodeSystemCache,
        facts: &'a PluginFacts,
    ) -> Self {
        Self {
            api_version,
            classes,
            code_systems,
            facts,
        }
    }
}
