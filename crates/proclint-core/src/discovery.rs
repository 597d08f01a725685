//! Process plugin descriptor discovery
//!
//! Descriptors are found through service-provider registrations first (API
//! V2 before V1), then by a class-file scan over the build outputs and
//! dependency archives. Candidates that fail to materialize are skipped and
//! logged at debug level; an empty overall result is fatal.

use crate::classpath::{ClassEntry, ClassIndex, ClassLookup};
use crate::descriptor::{ApiVersion, DescriptorHandle};
use crate::error::ProclintError;
use crate::result::Result;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Service name descriptors register under in the V2 API
pub const SERVICE_NAME_V2: &str = "dev.dsf.bpe.v2.ProcessPluginDefinition";
/// Service name descriptors register under in the V1 API
pub const SERVICE_NAME_V1: &str = "dev.dsf.bpe.v1.ProcessPluginDefinition";

const DESCRIPTOR_SUFFIX: &str = "ProcessPluginDefinition";

/// The closed method shape every descriptor exposes, regardless of version
const REQUIRED_METHODS: &[(&str, usize)] = &[
    ("getName", 0),
    ("getProcessModels", 0),
    ("getFhirResourcesByProcessId", 0),
];

/// Fixed diagnostic emitted when no descriptor is found
pub const DISCOVERY_HELP: &str = "\
No process plugin descriptor found. Likely causes:
  - the path does not point at a process plugin project or artifact
  - the project is a multi-module build and the plugin module was not selected
  - the artifact contains no class whose name ends with 'ProcessPluginDefinition'
  - the descriptor is not registered under META-INF/services";

static PROCESS_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z0-9]+_[A-Za-z0-9]+$").expect("valid process id pattern"));

/// Seam turning a descriptor candidate class into a handle.
///
/// The linter cannot run plugin bytecode, so the built-in implementation
/// extracts the declared references statically from the class's constant
/// pool. Embedders with a live runtime can substitute a precise source.
pub trait DescriptorSource {
    fn materialize(
        &self,
        entry: &ClassEntry,
        api_version: ApiVersion,
        service_registered: bool,
    ) -> Result<DescriptorHandle>;
}

/// Built-in static extraction from constant-pool strings
#[derive(Debug, Default)]
pub struct StaticDescriptorSource;

impl DescriptorSource for StaticDescriptorSource {
    fn materialize(
        &self,
        entry: &ClassEntry,
        api_version: ApiVersion,
        service_registered: bool,
    ) -> Result<DescriptorHandle> {
        let class = &entry.class;
        let strings = &class.string_constants;

        let mut process_models: Vec<String> = Vec::new();
        let mut fhir_refs: Vec<String> = Vec::new();
        let mut process_ids: Vec<String> = Vec::new();

        for s in strings {
            if s.ends_with(".bpmn") {
                if !process_models.contains(s) {
                    process_models.push(s.clone());
                }
            } else if is_fhir_shaped(s) {
                if !fhir_refs.contains(s) {
                    fhir_refs.push(s.clone());
                }
            } else if PROCESS_ID_RE.is_match(s) && !process_ids.contains(s) {
                process_ids.push(s.clone());
            }
        }

        // Process ids not declared as plain strings fall back to the model
        // file stems when those follow the naming scheme
        for model in &process_models {
            let stem = model
                .rsplit('/')
                .next()
                .unwrap_or(model)
                .trim_end_matches(".bpmn");
            if PROCESS_ID_RE.is_match(stem) && !process_ids.contains(&stem.to_string()) {
                process_ids.push(stem.to_string());
            }
        }

        let mut fhir_resources: IndexMap<String, Vec<String>> = IndexMap::new();
        for id in &process_ids {
            fhir_resources.insert(id.clone(), Vec::new());
        }
        for r in fhir_refs {
            let key = assign_process_id(&r, &process_ids);
            fhir_resources.entry(key).or_default().push(r);
        }
        fhir_resources.retain(|_, refs| !refs.is_empty());

        Ok(DescriptorHandle::new(
            display_name(class.simple_name()),
            api_version,
            class.name.clone(),
            process_models,
            fhir_resources,
            service_registered,
        ))
    }
}

fn is_fhir_shaped(s: &str) -> bool {
    if s.ends_with(".bpmn") || s.contains(' ') {
        return false;
    }
    let lower = s.to_ascii_lowercase();
    lower.contains("fhir/") || lower.ends_with(".xml") || lower.ends_with(".json")
}

/// Attach a FHIR reference to the process id whose name part occurs in the
/// reference path; fall back to the first declared process id.
fn assign_process_id(reference: &str, process_ids: &[String]) -> String {
    let lower = reference.to_ascii_lowercase();
    for id in process_ids {
        if let Some((_, name)) = id.split_once('_') {
            if lower.contains(&name.to_ascii_lowercase()) {
                return id.clone();
            }
        }
    }
    process_ids.first().cloned().unwrap_or_default()
}

/// Display name for a descriptor class: the simple name minus the
/// descriptor suffix, kebab-cased
fn display_name(simple_name: &str) -> String {
    let base = simple_name
        .strip_suffix(DESCRIPTOR_SUFFIX)
        .filter(|b| !b.is_empty())
        .unwrap_or(simple_name);
    let mut name = String::with_capacity(base.len() + 4);
    let mut prev_lower = false;
    for c in base.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                name.push('-');
            }
            name.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            name.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    name
}

/// Discover every descriptor in the index, in stable order
pub fn discover(index: &ClassIndex, source: &dyn DescriptorSource) -> Result<Vec<DescriptorHandle>> {
    let mut handles = Vec::new();

    for (service, version) in [
        (SERVICE_NAME_V2, ApiVersion::V2),
        (SERVICE_NAME_V1, ApiVersion::V1),
    ] {
        for fqn in index.service_registrations(service) {
            let Some(entry) = index.get(fqn) else {
                debug!("Registered descriptor {} not found on the classpath", fqn);
                continue;
            };
            match source.materialize(entry, version, true) {
                Ok(handle) => handles.push(handle),
                Err(e) => debug!("Skipping registered descriptor {}: {}", fqn, e),
            }
        }
    }

    if handles.is_empty() {
        for entry in index.classes() {
            let class = &entry.class;
            if !class.simple_name().ends_with(DESCRIPTOR_SUFFIX) || class.is_nested() {
                continue;
            }
            let conforms_v2 = index.implements(&class.name, SERVICE_NAME_V2);
            let conforms_v1 = index.implements(&class.name, SERVICE_NAME_V1);
            let shape_matches = REQUIRED_METHODS
                .iter()
                .all(|(name, arity)| class.has_method(name, *arity));
            let version = if conforms_v2 {
                ApiVersion::V2
            } else if conforms_v1 {
                ApiVersion::V1
            } else if shape_matches {
                ApiVersion::Unknown
            } else {
                debug!("Candidate {} does not conform to the descriptor contract", class.name);
                continue;
            };
            if !shape_matches {
                debug!("Candidate {} is missing required descriptor methods", class.name);
                continue;
            }
            let registered = index.is_service_registered(SERVICE_NAME_V2, &class.name)
                || index.is_service_registered(SERVICE_NAME_V1, &class.name);
            match source.materialize(entry, version, registered) {
                Ok(handle) => handles.push(handle),
                Err(e) => debug!("Skipping candidate {}: {}", class.name, e),
            }
        }
    }

    if handles.is_empty() {
        return Err(ProclintError::discovery_error(DISCOVERY_HELP));
    }
    Ok(handles)
}
