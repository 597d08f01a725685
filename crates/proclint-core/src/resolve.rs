//! Reference normalization and resolution with root discipline
//!
//! Each declared reference is normalized and probed in a fixed order: the
//! plugin's own resource root, every other legal resource root under the
//! project, then the dependency archives. Each probe namespaces its outcome,
//! so a reference resolves to exactly one [`ResolutionOutcome`] variant.

use crate::classpath::{CLASS_OUTPUT_DIRS, ClassIndex};
use crate::result::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Normalize a textual reference: strip the `classpath:` prefix, convert
/// backslashes to forward slashes, strip all leading slashes.
pub fn normalize_reference(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = trimmed.strip_prefix("classpath:").unwrap_or(trimmed);
    let forward = without_prefix.replace('\\', "/");
    forward.trim_start_matches('/').to_string()
}

/// Whether a normalized reference names a FHIR resource (as opposed to a
/// BPMN process model)
pub fn is_fhir_reference(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    lower.ends_with(".xml") || lower.ends_with(".json")
}

/// Where one reference resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    DiskInRoot(PathBuf),
    DiskOutsideRoot(PathBuf),
    FromDependencyArchive { path: PathBuf, archive: String },
    NotFound,
}

/// The partitioned result of resolving a reference set
#[derive(Debug, Default)]
pub struct ResolvedReferences {
    /// References resolved inside the plugin resource root
    pub valid_files: Vec<(String, PathBuf)>,
    /// References that could not be found anywhere
    pub missing: Vec<String>,
    /// References found under a different resource root
    pub outside_root: Vec<(String, PathBuf)>,
    /// References materialized from a dependency archive (ref, file, archive)
    pub from_dependency: Vec<(String, PathBuf, String)>,
}

/// Resolves references against disk roots and the dependency archives
pub struct ReferenceResolver<'a> {
    index: &'a ClassIndex,
    /// Directory receiving materialized dependency entries
    scratch: &'a Path,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(index: &'a ClassIndex, scratch: &'a Path) -> Self {
        Self { index, scratch }
    }

    /// Resolve every reference, partitioning the set by outcome
    pub fn resolve_strict(
        &self,
        references: &[String],
        plugin_root: &Path,
        project_dir: &Path,
    ) -> Result<ResolvedReferences> {
        let other_roots: Vec<PathBuf> = legal_resource_roots(project_dir)
            .into_iter()
            .filter(|root| root != plugin_root)
            .collect();

        let mut resolved = ResolvedReferences::default();
        for raw in references {
            let reference = normalize_reference(raw);
            match self.resolve_one(&reference, plugin_root, &other_roots)? {
                ResolutionOutcome::DiskInRoot(path) => {
                    resolved.valid_files.push((raw.clone(), path));
                }
                ResolutionOutcome::DiskOutsideRoot(path) => {
                    resolved.outside_root.push((raw.clone(), path));
                }
                ResolutionOutcome::FromDependencyArchive { path, archive } => {
                    resolved.from_dependency.push((raw.clone(), path, archive));
                }
                ResolutionOutcome::NotFound => resolved.missing.push(raw.clone()),
            }
        }
        Ok(resolved)
    }

    fn resolve_one(
        &self,
        reference: &str,
        plugin_root: &Path,
        other_roots: &[PathBuf],
    ) -> Result<ResolutionOutcome> {
        if let Some(path) = probe_root(plugin_root, reference) {
            return Ok(ResolutionOutcome::DiskInRoot(path));
        }
        for root in other_roots {
            if let Some(path) = probe_root(root, reference) {
                debug!(
                    "Reference '{}' resolved outside the plugin root: {}",
                    reference,
                    path.display()
                );
                return Ok(ResolutionOutcome::DiskOutsideRoot(path));
            }
        }
        if let Some(entry) = self.probe_dependencies(reference) {
            let archive = self.index.resource_archive(&entry).unwrap_or_default();
            let path = self.index.extract_resource(&entry, self.scratch)?;
            return Ok(ResolutionOutcome::FromDependencyArchive { path, archive });
        }
        Ok(ResolutionOutcome::NotFound)
    }

    /// Probe the indexed archive entries: exact path first, then path
    /// suffix, then leaf name
    fn probe_dependencies(&self, reference: &str) -> Option<String> {
        let leaf = leaf_of(reference);
        let mut suffix_hit = None;
        let mut leaf_hit = None;
        for (entry, _) in self.index.resource_entries() {
            if entry == reference {
                return Some(entry.clone());
            }
            if suffix_hit.is_none() && entry.ends_with(&format!("/{reference}")) {
                suffix_hit = Some(entry.clone());
            }
            if leaf_hit.is_none() && leaf_of(entry) == leaf {
                leaf_hit = Some(entry.clone());
            }
        }
        suffix_hit.or(leaf_hit)
    }
}

fn leaf_of(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Alternate leaf names accepted for a reference: the leaf itself plus the
/// `.xml`/`.json` twin for FHIR references
fn accepted_leaves(reference: &str) -> Vec<String> {
    let leaf = leaf_of(reference).to_string();
    let mut leaves = vec![leaf.clone()];
    if let Some(stem) = leaf.strip_suffix(".xml") {
        leaves.push(format!("{stem}.json"));
    } else if let Some(stem) = leaf.strip_suffix(".json") {
        leaves.push(format!("{stem}.xml"));
    }
    leaves
}

/// Probe one root for a reference, accepting the path form, the extension
/// twin, and the leaf form
fn probe_root(root: &Path, reference: &str) -> Option<PathBuf> {
    if !root.is_dir() {
        return None;
    }
    let direct = root.join(reference);
    if direct.is_file() {
        return Some(direct);
    }
    if is_fhir_reference(reference) {
        for leaf in accepted_leaves(reference).iter().skip(1) {
            let twin = root.join(Path::new(reference).with_file_name(leaf));
            if twin.is_file() {
                return Some(twin);
            }
        }
    }
    // Leaf form: the first match in walk order
    let leaves = accepted_leaves(reference);
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| leaves.iter().any(|l| l == name))
        })
        .map(|e| e.into_path())
}

/// Every legal resource root under the project: conventional resource
/// directories plus the build-output directories (classpath pollution)
pub fn legal_resource_roots(project_dir: &Path) -> Vec<PathBuf> {
    let mut roots = BTreeSet::new();
    for entry in WalkDir::new(project_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        let path = entry.path();
        let components: Vec<&str> = path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        if components.ends_with(&["src", "main", "resources"]) {
            roots.insert(path.to_path_buf());
        }
    }
    for dir in CLASS_OUTPUT_DIRS {
        let dir = project_dir.join(dir);
        if dir.is_dir() {
            roots.insert(dir);
        }
    }
    roots.into_iter().collect()
}

/// Choose the plugin-specific resource root: the deepest directory under the
/// project containing both the referenced BPMN and FHIR trees. Falls back to
/// the shared root when resolution is ambiguous or fails.
pub fn plugin_resource_root(
    bpmn_refs: &[String],
    fhir_refs: &[String],
    shared_root: &Path,
    project_dir: &Path,
) -> PathBuf {
    let mut candidates: Vec<PathBuf> = legal_resource_roots(project_dir);
    if !candidates.contains(&shared_root.to_path_buf()) {
        candidates.push(shared_root.to_path_buf());
    }

    let holds = |root: &Path, refs: &[String]| {
        refs.iter()
            .any(|r| probe_root(root, &normalize_reference(r)).is_some())
    };

    let mut matching: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|root| {
            (bpmn_refs.is_empty() || holds(root, bpmn_refs))
                && (fhir_refs.is_empty() || holds(root, fhir_refs))
                && !(bpmn_refs.is_empty() && fhir_refs.is_empty())
        })
        .collect();
    matching.sort();

    let max_depth = matching
        .iter()
        .map(|p| p.components().count())
        .max()
        .unwrap_or(0);
    let deepest: Vec<&PathBuf> = matching
        .iter()
        .filter(|p| p.components().count() == max_depth)
        .collect();
    match deepest.as_slice() {
        [single] => (*single).clone(),
        _ => shared_root.to_path_buf(),
    }
}

/// Files physically present under the roots that look like linted artifacts:
/// BPMN models anywhere, FHIR XML/JSON under a `fhir` directory
pub fn lintable_files(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = BTreeSet::new();
    for root in roots {
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
            let under_fhir = path
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .any(|c| c == "fhir");
            match ext.as_deref() {
                Some("bpmn") => {
                    files.insert(path.to_path_buf());
                }
                Some("xml") | Some("json") if under_fhir => {
                    files.insert(path.to_path_buf());
                }
                _ => {}
            }
        }
    }
    files.into_iter().collect()
}

/// Project-wide leftovers: lintable files minus the referenced paths
pub fn compute_leftovers(roots: &[PathBuf], referenced: &BTreeSet<PathBuf>) -> Vec<PathBuf> {
    lintable_files(roots)
        .into_iter()
        .filter(|path| {
            let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
            !referenced.contains(&canonical) && !referenced.contains(path)
        })
        .collect()
}
