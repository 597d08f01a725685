//! Per-plugin lint pipeline
//!
//! Drives the phases in a stable order for every discovered plugin:
//! reference resolution, plugin-definition findings, BPMN dispatch, FHIR
//! dispatch, and finally the project-wide leftover attribution. The active
//! API version travels in the explicit rule context, never in global state.

use crate::bpmn as bpmn_rules;
use crate::context::RuleContext;
use crate::fhir as fhir_rules;
use proclint_core::bpmn::parse_bpmn;
use proclint_core::classpath::{ClassIndex, ClassIndexCache};
use proclint_core::code_systems::CodeSystemCache;
use proclint_core::descriptor::DescriptorHandle;
use proclint_core::discovery::{self, DescriptorSource};
use proclint_core::findings::{Finding, FindingKind};
use proclint_core::project::ProjectSetup;
use proclint_core::report::{PluginReport, ProjectReport};
use proclint_core::resolve::{
    ReferenceResolver, ResolvedReferences, compute_leftovers, is_fhir_reference,
    plugin_resource_root,
};
use proclint_core::result::Result;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::info;

pub struct Orchestrator {
    class_cache: ClassIndexCache,
    code_systems: CodeSystemCache,
    /// Owns materialized dependency entries; removed on drop
    scratch: TempDir,
}

impl Orchestrator {
    pub fn new() -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("proclint-scratch-")
            .tempdir()
            .map_err(|e| proclint_core::ProclintError::io_error(std::env::temp_dir(), e))?;
        Ok(Self {
            class_cache: ClassIndexCache::new(),
            code_systems: CodeSystemCache::bootstrap(),
            scratch,
        })
    }

    pub fn code_systems(&self) -> &CodeSystemCache {
        &self.code_systems
    }

    /// Full pipeline: class index, cache seeding, discovery, per-plugin lint
    pub fn lint(
        &self,
        setup: &ProjectSetup,
        source: &dyn DescriptorSource,
    ) -> Result<ProjectReport> {
        let index = self.class_cache.get_or_build(&setup.project_root)?;
        let descriptors = discovery::discover(&index, source)?;
        self.lint_with_descriptors(setup, &index, descriptors)
    }

    /// Pipeline over already-discovered descriptors
    pub fn lint_with_descriptors(
        &self,
        setup: &ProjectSetup,
        index: &Arc<ClassIndex>,
        descriptors: Vec<DescriptorHandle>,
    ) -> Result<ProjectReport> {
        self.code_systems.seed_from_project(&setup.project_root);

        let names = unique_plugin_names(&descriptors);
        let resolver = ReferenceResolver::new(index, self.scratch.path());

        let mut plugins: Vec<PluginReport> = Vec::new();
        let mut plugin_roots: Vec<PathBuf> = Vec::new();
        let mut referenced: BTreeSet<PathBuf> = BTreeSet::new();

        for (descriptor, name) in descriptors.iter().zip(names) {
            info!("Linting plugin {} ({})", name, descriptor.api_version());
            let bpmn_refs = descriptor.process_models().to_vec();
            let fhir_refs = descriptor.fhir_references();
            let plugin_root = plugin_resource_root(
                &bpmn_refs,
                &fhir_refs,
                &setup.resource_root,
                &setup.project_root,
            );

            let all_refs = descriptor.all_references();
            let resolved =
                resolver.resolve_strict(&all_refs, &plugin_root, &setup.project_root)?;
            for (_, path) in &resolved.valid_files {
                referenced.insert(canonical(path));
            }
            for (_, path) in &resolved.outside_root {
                referenced.insert(canonical(path));
            }

            let mut findings = Vec::new();
            plugin_definition_findings(descriptor, &resolved, &setup.project_root, &mut findings);

            let (bpmn_files, fhir_files): (Vec<_>, Vec<_>) = resolved
                .valid_files
                .iter()
                .map(|(_, path)| path.clone())
                .partition(|path| !is_fhir_reference(&path.to_string_lossy()));

            let facts = fhir_rules::gather_facts(&fhir_files);
            let ctx = RuleContext::new(
                descriptor.api_version(),
                index.as_ref(),
                &self.code_systems,
                &facts,
            );

            for path in &bpmn_files {
                findings.extend(lint_bpmn_file(path, &ctx));
            }
            for path in &fhir_files {
                findings.extend(fhir_rules::lint_file(path, &ctx));
            }

            plugin_roots.push(plugin_root);
            plugins.push(PluginReport {
                name,
                display_name: descriptor.name().to_string(),
                api_version: descriptor.api_version(),
                source_class: descriptor.source_class_name().to_string(),
                findings,
                leftovers: Vec::new(),
            });
        }

        let leftovers =
            self.attribute_leftovers(setup, &plugin_roots, &referenced, &mut plugins);
        Ok(ProjectReport { plugins, leftovers })
    }

    /// Leftover computation and per-plugin attribution
    fn attribute_leftovers(
        &self,
        setup: &ProjectSetup,
        plugin_roots: &[PathBuf],
        referenced: &BTreeSet<PathBuf>,
        plugins: &mut [PluginReport],
    ) -> Vec<String> {
        let mut roots: BTreeSet<PathBuf> = plugin_roots.iter().cloned().collect();
        roots.insert(setup.resource_root.clone());
        let roots: Vec<PathBuf> = roots.into_iter().collect();

        let leftovers = compute_leftovers(&roots, referenced);
        let mut leaf_names = Vec::new();
        for leftover in &leftovers {
            let leaf = leftover
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| leftover.to_string_lossy().into_owned());
            leaf_names.push(leaf.clone());

            let Some(last) = plugins.len().checked_sub(1) else {
                continue;
            };
            let owner = if plugins.len() == 1 {
                0
            } else {
                plugin_roots
                    .iter()
                    .enumerate()
                    .filter(|(_, root)| leftover.starts_with(root))
                    .max_by_key(|(_, root)| root.components().count())
                    .map(|(idx, _)| idx)
                    .unwrap_or(last)
            };
            let plugin = &mut plugins[owner];
            plugin.leftovers.push(leaf.clone());
            plugin.findings.push(
                Finding::of(FindingKind::PluginLeftoverFile, leaf.clone(), leaf.clone())
                    .with_value(leaf),
            );
        }
        leaf_names
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn lint_bpmn_file(path: &Path, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => return vec![Finding::of(FindingKind::UnparsableBpmn, file.clone(), file)],
    };
    match parse_bpmn(&text, &file) {
        Ok(model) => bpmn_rules::lint_model(&model, &file, ctx),
        Err(e) => vec![
            Finding::of(FindingKind::UnparsableBpmn, file.clone(), file)
                .with_description(e.to_string()),
        ],
    }
}

/// Plugin-definition findings: missing, outside-root, and
/// dependency-resolved references, declared-reference presence, and the
/// service-registration status
fn plugin_definition_findings(
    descriptor: &DescriptorHandle,
    resolved: &ResolvedReferences,
    project_dir: &Path,
    out: &mut Vec<Finding>,
) {
    let file = descriptor
        .source_class_name()
        .rsplit('.')
        .next()
        .unwrap_or("descriptor")
        .to_string();

    for reference in &resolved.missing {
        out.push(
            Finding::of(FindingKind::PluginReferenceNotFound, file.clone(), reference.clone())
                .with_value(reference.clone()),
        );
    }
    for (reference, path) in &resolved.outside_root {
        // Findings never carry absolute paths
        let shown = path.strip_prefix(project_dir).unwrap_or(path);
        out.push(
            Finding::of(
                FindingKind::PluginReferenceOutsideResourceRoot,
                file.clone(),
                reference.clone(),
            )
            .with_value(shown.to_string_lossy()),
        );
    }
    for (reference, _, archive) in &resolved.from_dependency {
        out.push(
            Finding::of(
                FindingKind::PluginReferenceFromDependency,
                file.clone(),
                reference.clone(),
            )
            .with_archive(archive.clone()),
        );
    }

    if descriptor.process_models().is_empty() {
        out.push(Finding::of(
            FindingKind::PluginNoProcessModels,
            file.clone(),
            descriptor.name(),
        ));
    }
    if descriptor.fhir_resources_by_process_id().is_empty() {
        out.push(Finding::of(
            FindingKind::PluginNoFhirResources,
            file.clone(),
            descriptor.name(),
        ));
    }

    if descriptor.service_registered() {
        out.push(Finding::of(
            FindingKind::PluginServiceRegistrationPresent,
            file,
            descriptor.source_class_name(),
        ));
    } else {
        out.push(Finding::of(
            FindingKind::PluginServiceRegistrationMissing,
            file,
            descriptor.source_class_name(),
        ));
    }
}

/// Unique, filesystem-safe plugin names: duplicates get a `_vN` API-version
/// suffix, remaining collisions get `_2`, `_3`, … in discovery order.
pub fn unique_plugin_names(descriptors: &[DescriptorHandle]) -> Vec<String> {
    let mut base_counts: HashMap<&str, usize> = HashMap::new();
    for descriptor in descriptors {
        *base_counts.entry(descriptor.name()).or_insert(0) += 1;
    }

    let mut names: Vec<String> = descriptors
        .iter()
        .map(|d| {
            if base_counts[d.name()] > 1 {
                sanitize(&format!("{}_{}", d.name(), d.api_version()))
            } else {
                sanitize(d.name())
            }
        })
        .collect();

    let mut seen: HashMap<String, usize> = HashMap::new();
    for name in &mut names {
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            *name = format!("{}_{}", name, count);
        }
    }
    names
}

/// Filesystem sanitization: everything outside `[a-zA-Z0-9._-]` becomes
/// `_`, runs of `_` collapse, the result is lowercased.
fn sanitize(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut prev_underscore = false;
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c.to_ascii_lowercase()
        } else {
            '_'
        };
        if c == '_' {
            if prev_underscore {
                continue;
            }
            prev_underscore = true;
        } else {
            prev_underscore = false;
        }
        sanitized.push(c);
    }
    sanitized
}
