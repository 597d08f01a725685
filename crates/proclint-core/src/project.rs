//! Project layout detection and build preparation
//!
//! A working tree with a `pom.xml` at its root is a source project: an
//! external build produces the compiled outputs and the dependency closure.
//! A tree without one is an unpacked artifact whose dependencies are assumed
//! to be unpacked already.

use crate::error::ProclintError;
use crate::result::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// The fixed default build goal vector: non-interactive, quiet, skip tests,
/// clean, compile, package, copy the dependency closure.
pub const DEFAULT_BUILD_GOALS: &[&str] = &[
    "--batch-mode",
    "--quiet",
    "-DskipTests",
    "clean",
    "compile",
    "package",
    "dependency:copy-dependencies",
];

/// Detected project layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    SourceProject,
    UnpackedArtifact,
}

/// A prepared project: root, layout kind, and the initial resource root
#[derive(Debug, Clone)]
pub struct ProjectSetup {
    pub project_root: PathBuf,
    pub kind: ProjectKind,
    pub resource_root: PathBuf,
}

/// Seam for the external build invocation
pub trait BuildRunner {
    fn run(&self, project_root: &Path, goals: &[String]) -> Result<()>;
}

/// Invokes `mvn` as an external process
#[derive(Debug, Default)]
pub struct MavenBuildRunner;

impl BuildRunner for MavenBuildRunner {
    fn run(&self, project_root: &Path, goals: &[String]) -> Result<()> {
        info!("Running build: mvn {}", goals.join(" "));
        let status = Command::new("mvn")
            .args(goals)
            .current_dir(project_root)
            .status()
            .map_err(|e| ProclintError::io_error(project_root.to_path_buf(), e))?;
        if !status.success() {
            return Err(ProclintError::build_error(status.code().unwrap_or(-1)));
        }
        Ok(())
    }
}

/// Compose the build argument vector from the defaults, the skip list, and
/// the extra goals.
///
/// Skip goals are removed by exact match. Extra goals are appended when not
/// already present; a `KEY=VALUE` extra replaces an existing argument with
/// the same `KEY` prefix.
pub fn compose_build_goals(extra: &[String], skip: &[String]) -> Vec<String> {
    let mut goals: Vec<String> = DEFAULT_BUILD_GOALS
        .iter()
        .map(|g| g.to_string())
        .filter(|g| !skip.iter().any(|s| s == g))
        .collect();
    for goal in extra {
        if let Some((key, _)) = goal.split_once('=') {
            if let Some(pos) = goals
                .iter()
                .position(|g| g == key || g.starts_with(&format!("{key}=")))
            {
                goals[pos] = goal.clone();
                continue;
            }
        }
        if !goals.contains(goal) {
            goals.push(goal.clone());
        }
    }
    goals
}

/// Detect the layout, drive the build for source projects, and resolve the
/// initial resource root.
pub fn prepare(
    working_path: &Path,
    extra_goals: &[String],
    skip_goals: &[String],
    runner: &dyn BuildRunner,
) -> Result<ProjectSetup> {
    let kind = if working_path.join("pom.xml").is_file() {
        ProjectKind::SourceProject
    } else {
        ProjectKind::UnpackedArtifact
    };

    match kind {
        ProjectKind::SourceProject => {
            let goals = compose_build_goals(extra_goals, skip_goals);
            runner.run(working_path, &goals)?;
        }
        ProjectKind::UnpackedArtifact => {
            debug!("No project descriptor, skipping build");
        }
    }

    let conventional = working_path.join("src/main/resources");
    let resource_root = if conventional.is_dir() {
        conventional
    } else {
        working_path.to_path_buf()
    };

    Ok(ProjectSetup {
        project_root: working_path.to_path_buf(),
        kind,
        resource_root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingRunner {
        ran: std::cell::RefCell<Vec<Vec<String>>>,
    }

    impl BuildRunner for RecordingRunner {
        fn run(&self, _project_root: &Path, goals: &[String]) -> Result<()> {
            self.ran.borrow_mut().push(goals.to_vec());
            Ok(())
        }
    }

    #[test]
    fn defaults_are_used_unchanged() {
        let goals = compose_build_goals(&[], &[]);
        assert_eq!(goals, DEFAULT_BUILD_GOALS);
    }

    #[test]
    fn skip_removes_by_exact_match() {
        let goals = compose_build_goals(&[], &["clean".to_string(), "--quiet".to_string()]);
        assert!(!goals.contains(&"clean".to_string()));
        assert!(!goals.contains(&"--quiet".to_string()));
        assert!(goals.contains(&"package".to_string()));
    }

    #[test]
    fn key_value_extra_replaces_matching_prefix() {
        let goals = compose_build_goals(&["-DskipTests=false".to_string()], &[]);
        assert!(goals.contains(&"-DskipTests=false".to_string()));
        assert!(!goals.contains(&"-DskipTests".to_string()));
        // Replacement keeps the position stable
        assert_eq!(goals.len(), DEFAULT_BUILD_GOALS.len());
    }

    #[test]
    fn extras_append_without_duplicates() {
        let goals = compose_build_goals(
            &["verify".to_string(), "package".to_string()],
            &[],
        );
        assert_eq!(goals.iter().filter(|g| *g == "package").count(), 1);
        assert_eq!(goals.last().map(String::as_str), Some("verify"));
    }

    #[test]
    fn source_project_triggers_build() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        let runner = RecordingRunner {
            ran: Default::default(),
        };
        let setup = prepare(dir.path(), &[], &[], &runner).unwrap();
        assert_eq!(setup.kind, ProjectKind::SourceProject);
        assert_eq!(runner.ran.borrow().len(), 1);
    }

    #[test]
    fn unpacked_artifact_skips_build() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner {
            ran: Default::default(),
        };
        let setup = prepare(dir.path(), &[], &[], &runner).unwrap();
        assert_eq!(setup.kind, ProjectKind::UnpackedArtifact);
        assert!(runner.ran.borrow().is_empty());
        assert_eq!(setup.resource_root, dir.path());
    }

    struct FailingRunner;

    impl BuildRunner for FailingRunner {
        fn run(&self, _project_root: &Path, _goals: &[String]) -> Result<()> {
            Err(ProclintError::build_error(1))
        }
    }

    #[test]
    fn build_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        let err = prepare(dir.path(), &[], &[], &FailingRunner).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, ProclintError::BuildError { exit_code: 1 }));
    }
}
