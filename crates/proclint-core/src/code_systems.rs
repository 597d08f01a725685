//! Registry of known code-system URIs and their code sets
//!
//! The cache is bootstrapped with the fixed table of code systems the rules
//! depend on and extended by scanning `src/main/resources/fhir/CodeSystem`
//! trees found under the linted project. Registration uses union semantics;
//! `register` and `is_unknown` may be called concurrently, but all writes
//! happen before or between rule dispatch phases.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const READ_ACCESS_TAG_SYSTEM: &str = "http://dsf.dev/fhir/CodeSystem/read-access-tag";
pub const PROCESS_AUTHORIZATION_SYSTEM: &str =
    "http://dsf.dev/fhir/CodeSystem/process-authorization";
pub const PRACTITIONER_ROLE_SYSTEM: &str = "http://dsf.dev/fhir/CodeSystem/practitioner-role";
pub const ORGANIZATION_ROLE_SYSTEM: &str = "http://dsf.dev/fhir/CodeSystem/organization-role";
pub const BPMN_MESSAGE_SYSTEM: &str = "http://dsf.dev/fhir/CodeSystem/bpmn-message";

/// Any system URI with this path suffix answers by the uppercase heuristic
const RESOURCE_TYPE_SUFFIX: &str = "/CodeSystem/resource-type";

const READ_ACCESS_TAG_CODES: &[&str] = &["LOCAL", "ORGANIZATION", "ROLE", "ALL"];
const PROCESS_AUTHORIZATION_CODES: &[&str] = &[
    "LOCAL_ORGANIZATION",
    "LOCAL_ORGANIZATION_PRACTITIONER",
    "REMOTE_ORGANIZATION",
    "LOCAL_ROLE",
    "LOCAL_ROLE_PRACTITIONER",
    "REMOTE_ROLE",
    "LOCAL_ALL",
    "LOCAL_ALL_PRACTITIONER",
    "REMOTE_ALL",
];
const PRACTITIONER_ROLE_CODES: &[&str] = &[
    "AMS_USER", "COS_USER", "CRR_USER", "DIC_USER", "DMS_USER", "DSF_ADMIN", "DTS_USER",
    "HRP_USER", "TTP_USER", "UAC_USER",
];
const ORGANIZATION_ROLE_CODES: &[&str] = &[
    "AMS", "COS", "CRR", "DIC", "DMS", "DTS", "HRP", "TTP", "UAC",
];
const BPMN_MESSAGE_CODES: &[&str] = &["message-name", "business-key", "correlation-key"];

/// Thread-safe registry mapping code-system URIs to their code sets
#[derive(Debug, Default)]
pub struct CodeSystemCache {
    systems: RwLock<BTreeMap<String, BTreeSet<String>>>,
}

impl CodeSystemCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache seeded with the fixed table of known code systems
    pub fn bootstrap() -> Self {
        let cache = Self::new();
        cache.register(READ_ACCESS_TAG_SYSTEM, READ_ACCESS_TAG_CODES.iter().copied());
        cache.register(
            PROCESS_AUTHORIZATION_SYSTEM,
            PROCESS_AUTHORIZATION_CODES.iter().copied(),
        );
        cache.register(PRACTITIONER_ROLE_SYSTEM, PRACTITIONER_ROLE_CODES.iter().copied());
        cache.register(ORGANIZATION_ROLE_SYSTEM, ORGANIZATION_ROLE_CODES.iter().copied());
        cache.register(BPMN_MESSAGE_SYSTEM, BPMN_MESSAGE_CODES.iter().copied());
        cache
    }

    /// Merge the given codes into the system's code set. Idempotent; a
    /// system URL seen twice yields the union of its code sets.
    pub fn register<I, S>(&self, system: &str, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut systems = self.systems.write().expect("code system cache poisoned");
        let entry = systems.entry(system.to_string()).or_default();
        for code in codes {
            entry.insert(code.into());
        }
    }

    /// Whether the system URI is registered
    pub fn knows_system(&self, system: &str) -> bool {
        self.systems
            .read()
            .expect("code system cache poisoned")
            .contains_key(system)
    }

    /// Returns `true` when the code is not valid for the given system.
    ///
    /// Entirely unknown systems answer `true`. A system URI ending in
    /// `/CodeSystem/resource-type` answers by the heuristic "first character
    /// uppercase".
    pub fn is_unknown(&self, system: &str, code: &str) -> bool {
        if system.ends_with(RESOURCE_TYPE_SUFFIX) {
            return !code.chars().next().is_some_and(|c| c.is_ascii_uppercase());
        }
        let systems = self.systems.read().expect("code system cache poisoned");
        match systems.get(system) {
            Some(codes) => !codes.contains(code),
            None => true,
        }
    }

    /// Find the first registered system (in URI order) declaring the code
    pub fn system_declaring(&self, code: &str) -> Option<String> {
        let systems = self.systems.read().expect("code system cache poisoned");
        systems
            .iter()
            .find(|(_, codes)| codes.contains(code))
            .map(|(system, _)| system.clone())
    }

    /// Walk the project tree and register every parseable CodeSystem found
    /// under a `src/main/resources/fhir/CodeSystem` directory. Unparseable
    /// files are skipped.
    pub fn seed_from_project(&self, root: &Path) {
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !is_code_system_seed(path) {
                continue;
            }
            match std::fs::read_to_string(path) {
                Ok(text) => {
                    if let Some((url, codes)) = parse_code_system(&text) {
                        debug!("Seeding code system {} from {}", url, path.display());
                        self.register(&url, codes);
                    }
                }
                Err(e) => warn!("Skipping unreadable seed file {}: {}", path.display(), e),
            }
        }
    }

    /// Drop every registered system. Test hook; invoke between runs only.
    pub fn clear_all(&self) {
        self.systems
            .write()
            .expect("code system cache poisoned")
            .clear();
    }
}

/// Matches `**/src/main/resources/fhir/CodeSystem/*.xml`, case-insensitive
/// on the extension
fn is_code_system_seed(path: &Path) -> bool {
    let has_xml_ext = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
    if !has_xml_ext {
        return false;
    }
    let Some(parent) = path.parent() else {
        return false;
    };
    let components: Vec<&str> = parent
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    components.ends_with(&["src", "main", "resources", "fhir", "CodeSystem"])
}

/// Extract `(url, concept codes)` when the document root is a CodeSystem
fn parse_code_system(text: &str) -> Option<(String, Vec<String>)> {
    let doc = match roxmltree::Document::parse(text) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("Ignoring unparseable code system seed: {}", e);
            return None;
        }
    };
    let root = doc.root_element();
    if root.tag_name().name() != "CodeSystem" {
        return None;
    }
    let url = root
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "url")
        .and_then(|n| n.attribute("value"))?
        .to_string();
    let codes = root
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "concept")
        .filter_map(|concept| {
            concept
                .children()
                .find(|n| n.is_element() && n.tag_name().name() == "code")
                .and_then(|n| n.attribute("value"))
                .map(str::to_string)
        })
        .collect();
    Some((url, codes))
}
