//! Process plugin descriptor handles
//!
//! A descriptor handle is the linter's view of one discovered process plugin
//! descriptor: display name, API version, originating class, the declared
//! process model references, and the declared FHIR references per process id.
//! Handles are immutable once materialized.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The descriptor API version of a plugin, determined by signature inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V2,
    Unknown,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
            ApiVersion::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered process plugin descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorHandle {
    /// Display name of the plugin
    name: String,
    /// API version determined during discovery
    api_version: ApiVersion,
    /// Fully-qualified name of the descriptor class
    source_class: String,
    /// Declared BPMN process model references, in declaration order
    process_models: Vec<String>,
    /// Declared FHIR resource references per process id, in declaration order
    fhir_resources: IndexMap<String, Vec<String>>,
    /// Whether the descriptor was found through a service registration
    service_registered: bool,
}

impl DescriptorHandle {
    pub fn new(
        name: impl Into<String>,
        api_version: ApiVersion,
        source_class: impl Into<String>,
        process_models: Vec<String>,
        fhir_resources: IndexMap<String, Vec<String>>,
        service_registered: bool,
    ) -> Self {
        Self {
            name: name.into(),
            api_version,
            source_class: source_class.into(),
            process_models,
            fhir_resources,
            service_registered,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn source_class_name(&self) -> &str {
        &self.source_class
    }

    /// Declared BPMN process model references
    pub fn process_models(&self) -> &[String] {
        &self.process_models
    }

    /// Declared FHIR references keyed by process id, in declaration order
    pub fn fhir_resources_by_process_id(&self) -> &IndexMap<String, Vec<String>> {
        &self.fhir_resources
    }

    /// All declared FHIR references, flattened in declaration order
    pub fn fhir_references(&self) -> Vec<String> {
        self.fhir_resources.values().flatten().cloned().collect()
    }

    /// All declared references: process models first, then FHIR references
    pub fn all_references(&self) -> Vec<String> {
        let mut refs = self.process_models.clone();
        refs.extend(self.fhir_references());
        refs
    }

    pub fn service_registered(&self) -> bool {
        self.service_registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_preserve_declaration_order() {
        let mut fhir = IndexMap::new();
        fhir.insert(
            "dsfdev_ping".to_string(),
            vec!["fhir/Task/task-ping.xml".to_string()],
        );
        fhir.insert(
            "dsfdev_pong".to_string(),
            vec!["fhir/Task/task-pong.xml".to_string()],
        );
        let handle = DescriptorHandle::new(
            "ping-pong",
            ApiVersion::V1,
            "com.example.PingPongProcessPluginDefinition",
            vec!["bpe/ping.bpmn".to_string(), "bpe/pong.bpmn".to_string()],
            fhir,
            true,
        );
        assert_eq!(
            handle.all_references(),
            vec![
                "bpe/ping.bpmn",
                "bpe/pong.bpmn",
                "fhir/Task/task-ping.xml",
                "fhir/Task/task-pong.xml",
            ]
        );
    }
}
