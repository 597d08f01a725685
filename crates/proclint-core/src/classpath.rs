//! Class lookup over compiled outputs and dependency archives
//!
//! Enumerates compiled classes under the common build-output directories and
//! every archive copied into `target/dependency`, and answers purely
//! structural questions about them. One index is built per project root and
//! cached for the duration of a run.

use crate::classfile::{self, ClassFile};
use crate::error::ProclintError;
use crate::result::Result;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Build-output directories probed for compiled classes
pub const CLASS_OUTPUT_DIRS: &[&str] = &[
    "target/classes",
    "build/classes/java/main",
    "out/production/classes",
];

/// Directory holding the copied dependency closure
pub const DEPENDENCY_DIR: &str = "target/dependency";

const SERVICES_PREFIX: &str = "META-INF/services/";

/// Capability interface for structural class-graph questions
pub trait ClassLookup {
    fn exists(&self, fqn: &str) -> bool;
    fn implements(&self, fqn: &str, iface: &str) -> bool;
    fn is_subclass_of(&self, fqn: &str, superclass: &str) -> bool;

    /// First interface from `expected` the class implements
    fn find_implemented_interface(&self, fqn: &str, expected: &[&str]) -> Option<String> {
        expected
            .iter()
            .find(|iface| self.implements(fqn, iface))
            .map(|iface| iface.to_string())
    }
}

/// Where a class entry came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassOrigin {
    /// A `.class` file under a build-output directory
    ClassDir(PathBuf),
    /// An entry of a dependency archive, identified by the archive leaf name
    Archive(String),
}

/// One class known to the index
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub class: ClassFile,
    pub origin: ClassOrigin,
}

/// The class catalog of one project root
#[derive(Debug, Default)]
pub struct ClassIndex {
    classes: BTreeMap<String, ClassEntry>,
    /// Service name to registered implementation FQNs, registration order
    services: BTreeMap<String, Vec<String>>,
    /// Non-class archive entries to the archive holding them (first wins in
    /// sorted archive order)
    resources: BTreeMap<String, PathBuf>,
}

impl ClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerate compiled classes and dependency archives under the root
    pub fn build(project_root: &Path) -> Result<Self> {
        let mut index = Self::new();

        for dir in CLASS_OUTPUT_DIRS {
            let dir = project_root.join(dir);
            if dir.is_dir() {
                index.scan_class_dir(&dir)?;
            }
        }

        let dependency_dir = project_root.join(DEPENDENCY_DIR);
        if dependency_dir.is_dir() {
            let mut archives: Vec<PathBuf> = WalkDir::new(&dependency_dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| {
                    p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
                })
                .collect();
            archives.sort();

            // The archive walk is the one place bounded parallelism is used
            let scans: Vec<(PathBuf, Result<ArchiveScan>)> = archives
                .par_iter()
                .map(|path| (path.clone(), scan_archive(path)))
                .collect();
            for (path, scan) in scans {
                match scan {
                    Ok(scan) => index.merge_archive(&path, scan),
                    Err(e) => debug!("Skipping unreadable archive {}: {}", path.display(), e),
                }
            }
        }

        info!(
            "Class index for {} holds {} classes",
            project_root.display(),
            index.classes.len()
        );
        Ok(index)
    }

    fn scan_class_dir(&mut self, dir: &Path) -> Result<()> {
        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if path.extension().is_some_and(|ext| ext == "class") {
                let bytes = std::fs::read(path)
                    .map_err(|e| ProclintError::io_error(path.to_path_buf(), e))?;
                match classfile::parse_class(&bytes, &path.to_string_lossy()) {
                    Ok(class) => self.insert_entry(ClassEntry {
                        class,
                        origin: ClassOrigin::ClassDir(path.to_path_buf()),
                    }),
                    Err(e) => debug!("Skipping unparseable class file: {}", e),
                }
            } else if let Ok(rel) = path.strip_prefix(dir) {
                let rel = rel.to_string_lossy().replace('\\', "/");
                if let Some(service) = rel.strip_prefix(SERVICES_PREFIX) {
                    let content = std::fs::read_to_string(path)
                        .map_err(|e| ProclintError::io_error(path.to_path_buf(), e))?;
                    self.register_service_lines(service, &content);
                }
            }
        }
        Ok(())
    }

    fn merge_archive(&mut self, path: &Path, scan: ArchiveScan) {
        let archive_id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        for class in scan.classes {
            self.insert_entry(ClassEntry {
                class,
                origin: ClassOrigin::Archive(archive_id.clone()),
            });
        }
        for (service, content) in scan.services {
            self.register_service_lines(&service, &content);
        }
        for entry in scan.resources {
            self.resources
                .entry(entry)
                .or_insert_with(|| path.to_path_buf());
        }
    }

    /// Insert a class entry; first origin wins for duplicate names
    pub fn insert_entry(&mut self, entry: ClassEntry) {
        self.classes.entry(entry.class.name.clone()).or_insert(entry);
    }

    /// Register one implementation for a service name
    pub fn register_service(&mut self, service: impl Into<String>, fqn: impl Into<String>) {
        self.services.entry(service.into()).or_default().push(fqn.into());
    }

    fn register_service_lines(&mut self, service: &str, content: &str) {
        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if !line.is_empty() {
                self.register_service(service, line);
            }
        }
    }

    pub fn get(&self, fqn: &str) -> Option<&ClassEntry> {
        self.classes.get(fqn)
    }

    /// All classes in name order
    pub fn classes(&self) -> impl Iterator<Item = &ClassEntry> {
        self.classes.values()
    }

    /// Implementations registered for a service name, registration order
    pub fn service_registrations(&self, service: &str) -> &[String] {
        self.services.get(service).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a type is registered for the service name
    pub fn is_service_registered(&self, service: &str, fqn: &str) -> bool {
        self.service_registrations(service).iter().any(|s| s == fqn)
    }

    /// Archive entry paths known to the index, in entry order
    pub fn resource_entries(&self) -> impl Iterator<Item = (&String, &PathBuf)> {
        self.resources.iter()
    }

    /// Materialize an archive entry into `dest_dir`, returning the file path
    pub fn extract_resource(&self, entry: &str, dest_dir: &Path) -> Result<PathBuf> {
        let archive_path = self.resources.get(entry).ok_or_else(|| {
            ProclintError::internal_error(format!("archive entry '{entry}' is not indexed"))
        })?;
        let file = File::open(archive_path)
            .map_err(|e| ProclintError::io_error(archive_path.clone(), e))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| ProclintError::ArchiveError {
            path: archive_path.clone(),
            source: e,
        })?;
        let mut zipped = archive
            .by_name(entry)
            .map_err(|e| ProclintError::ArchiveError {
                path: archive_path.clone(),
                source: e,
            })?;
        let leaf = entry.rsplit('/').next().unwrap_or(entry);
        let dest = dest_dir.join(leaf);
        let mut bytes = Vec::new();
        zipped
            .read_to_end(&mut bytes)
            .map_err(|e| ProclintError::io_error(archive_path.clone(), e))?;
        std::fs::write(&dest, bytes).map_err(|e| ProclintError::io_error(dest.clone(), e))?;
        Ok(dest)
    }

    /// Archive id for an indexed entry path
    pub fn resource_archive(&self, entry: &str) -> Option<String> {
        self.resources.get(entry).and_then(|p| {
            p.file_name().map(|n| n.to_string_lossy().into_owned())
        })
    }

    /// Walk supertypes and interfaces reachable from `fqn` within the index
    fn type_closure(&self, fqn: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(fqn.to_string());
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(entry) = self.classes.get(&current) {
                if let Some(superclass) = &entry.class.super_name {
                    queue.push_back(superclass.clone());
                }
                for iface in &entry.class.interfaces {
                    queue.push_back(iface.clone());
                }
            }
        }
        seen.remove(fqn);
        seen
    }
}

impl ClassLookup for ClassIndex {
    fn exists(&self, fqn: &str) -> bool {
        self.classes.contains_key(fqn)
    }

    fn implements(&self, fqn: &str, iface: &str) -> bool {
        self.type_closure(fqn).contains(iface)
    }

    fn is_subclass_of(&self, fqn: &str, superclass: &str) -> bool {
        let mut current = fqn.to_string();
        let mut hops = 0;
        while let Some(entry) = self.classes.get(&current) {
            match &entry.class.super_name {
                Some(name) if name == superclass => return true,
                Some(name) => current = name.clone(),
                None => return false,
            }
            hops += 1;
            if hops > 256 {
                return false;
            }
        }
        false
    }
}

/// Per-run cache of class indexes, keyed by project root
#[derive(Debug, Default)]
pub struct ClassIndexCache {
    indexes: RwLock<BTreeMap<PathBuf, Arc<ClassIndex>>>,
}

impl ClassIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index for the root, building it on first request
    pub fn get_or_build(&self, project_root: &Path) -> Result<Arc<ClassIndex>> {
        let key = project_root
            .canonicalize()
            .unwrap_or_else(|_| project_root.to_path_buf());
        if let Some(index) = self
            .indexes
            .read()
            .expect("class index cache poisoned")
            .get(&key)
        {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(ClassIndex::build(&key)?);
        self.indexes
            .write()
            .expect("class index cache poisoned")
            .insert(key, Arc::clone(&index));
        Ok(index)
    }
}

struct ArchiveScan {
    classes: Vec<ClassFile>,
    services: Vec<(String, String)>,
    resources: Vec<String>,
}

fn scan_archive(path: &Path) -> Result<ArchiveScan> {
    let file = File::open(path).map_err(|e| ProclintError::io_error(path.to_path_buf(), e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ProclintError::ArchiveError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut scan = ArchiveScan {
        classes: Vec::new(),
        services: Vec::new(),
        resources: Vec::new(),
    };
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| ProclintError::ArchiveError {
            path: path.to_path_buf(),
            source: e,
        })?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if name.ends_with(".class") {
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| ProclintError::io_error(path.to_path_buf(), e))?;
            match classfile::parse_class(&bytes, &name) {
                Ok(class) => scan.classes.push(class),
                Err(e) => debug!("Skipping unparseable archive class {}: {}", name, e),
            }
        } else if let Some(service) = name.strip_prefix(SERVICES_PREFIX) {
            let mut content = String::new();
            entry
                .read_to_string(&mut content)
                .map_err(|e| ProclintError::io_error(path.to_path_buf(), e))?;
            scan.services.push((service.to_string(), content));
        } else {
            scan.resources.push(name);
        }
    }
    Ok(scan)
}
