//! Uniform tree view over FHIR XML and JSON resources
//!
//! XML maps directly onto [`FhirNode`]. JSON is translated into the same
//! shape by a pure function: object properties become child elements whose
//! primitive values land in the `value` attribute, arrays expand to repeated
//! children, and a small explicit whitelist of keys is attribute-positioned
//! on the parent (`url` on `extension`, `id` on any element). The rules only
//! ever see the XML-shaped tree.

use crate::error::ProclintError;
use crate::result::Result;
use std::collections::BTreeMap;

/// A parsed FHIR resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FhirResource {
    pub resource_type: String,
    pub root: FhirNode,
}

impl FhirResource {
    /// The resource `id` value; an element in XML, attribute-positioned in
    /// translated JSON
    pub fn id(&self) -> Option<&str> {
        self.root.child_value("id").or_else(|| self.root.attr("id"))
    }

    /// Anchor used in findings: `ResourceType/id`, or just the type
    pub fn anchor(&self) -> String {
        match self.id() {
            Some(id) => format!("{}/{}", self.resource_type, id),
            None => self.resource_type.clone(),
        }
    }
}

/// One element of the uniform tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FhirNode {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<FhirNode>,
}

impl FhirNode {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The `value` attribute FHIR primitives are encoded with
    pub fn value(&self) -> Option<&str> {
        self.attributes.get("value").map(String::as_str)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn child(&self, name: &str) -> Option<&FhirNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FhirNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// `value` attribute of the first child with the given name
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.value())
    }

    /// Walk a path of child names, yielding the first node at each step
    pub fn at_path(&self, path: &[&str]) -> Option<&FhirNode> {
        let mut current = self;
        for name in path {
            current = current.child(name)?;
        }
        Some(current)
    }

    /// All extensions with the given `url` attribute
    pub fn extensions_with_url<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a FhirNode> {
        self.children_named("extension")
            .filter(move |e| e.attr("url") == Some(url))
    }
}

/// Parse a resource from file content, dispatching on the extension
pub fn parse_resource(file: &str, text: &str) -> Result<FhirResource> {
    if file.to_ascii_lowercase().ends_with(".json") {
        from_json(text, file)
    } else {
        from_xml(text, file)
    }
}

/// Parse a FHIR XML document
pub fn from_xml(text: &str, file: &str) -> Result<FhirResource> {
    let doc = roxmltree::Document::parse(text)
        .map_err(|e| ProclintError::parse_error(file, e.to_string()))?;
    let root = convert_xml(doc.root_element());
    Ok(FhirResource {
        resource_type: root.name.clone(),
        root,
    })
}

fn convert_xml(node: roxmltree::Node<'_, '_>) -> FhirNode {
    let mut converted = FhirNode::named(node.tag_name().name());
    for attr in node.attributes() {
        converted
            .attributes
            .insert(attr.name().to_string(), attr.value().to_string());
    }
    converted.children = node
        .children()
        .filter(|n| n.is_element())
        .map(convert_xml)
        .collect();
    converted
}

/// Keys that are attribute-positioned on the parent element instead of
/// becoming child elements. The rule is asymmetric on purpose: only these
/// pairs translate to attributes.
const ATTRIBUTE_KEYS: &[(&str, &str)] = &[("extension", "url"), ("*", "id")];

fn is_attribute_key(element: &str, key: &str) -> bool {
    ATTRIBUTE_KEYS
        .iter()
        .any(|(e, k)| *k == key && (*e == "*" || *e == element))
}

/// Parse a FHIR JSON document by translating it to the XML-shaped tree
pub fn from_json(text: &str, file: &str) -> Result<FhirResource> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ProclintError::parse_error(file, e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ProclintError::parse_error(file, "expected a JSON object"))?;
    let resource_type = object
        .get("resourceType")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ProclintError::parse_error(file, "missing resourceType property"))?
        .to_string();

    let mut root = FhirNode::named(resource_type.clone());
    for (key, value) in object {
        if key == "resourceType" || key.starts_with('_') {
            continue;
        }
        translate_property(&mut root, key, value);
    }
    Ok(FhirResource {
        resource_type,
        root,
    })
}

fn translate_property(parent: &mut FhirNode, key: &str, value: &serde_json::Value) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                translate_property(parent, key, item);
            }
        }
        serde_json::Value::Object(object) => {
            let mut node = FhirNode::named(key);
            for (k, v) in object {
                if k.starts_with('_') {
                    continue;
                }
                if is_attribute_key(key, k) {
                    if let Some(text) = primitive_text(v) {
                        node.attributes.insert(k.clone(), text);
                        continue;
                    }
                }
                translate_property(&mut node, k, v);
            }
            parent.children.push(node);
        }
        serde_json::Value::Null => {}
        primitive => {
            if is_attribute_key(&parent.name, key) {
                if let Some(text) = primitive_text(primitive) {
                    parent.attributes.insert(key.to_string(), text);
                    return;
                }
            }
            let mut node = FhirNode::named(key);
            if let Some(text) = primitive_text(primitive) {
                node.attributes.insert("value".to_string(), text);
            }
            parent.children.push(node);
        }
    }
}

fn primitive_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_maps_directly() {
        let xml = r#"<Task xmlns="http://hl7.org/fhir">
            <id value="task-ping"/>
            <status value="draft"/>
            <input>
              <type><coding><system value="http://dsf.dev/fhir/CodeSystem/bpmn-message"/>
                <code value="message-name"/></coding></type>
            </input>
        </Task>"#;
        let resource = from_xml(xml, "task.xml").unwrap();
        assert_eq!(resource.resource_type, "Task");
        assert_eq!(resource.id(), Some("task-ping"));
        assert_eq!(resource.anchor(), "Task/task-ping");
        assert_eq!(resource.root.child_value("status"), Some("draft"));
        let code = resource
            .root
            .at_path(&["input", "type", "coding", "code"])
            .and_then(|n| n.value());
        assert_eq!(code, Some("message-name"));
    }

    #[test]
    fn json_primitives_become_value_attributes() {
        let json = r##"{
            "resourceType": "Task",
            "id": "task-ping",
            "status": "draft",
            "authoredOn": "#{date}"
        }"##;
        let resource = from_json(json, "task.json").unwrap();
        assert_eq!(resource.resource_type, "Task");
        // "id" on the root is attribute-positioned; findings still read it
        assert_eq!(resource.root.attr("id"), Some("task-ping"));
        assert_eq!(resource.root.child_value("status"), Some("draft"));
        assert_eq!(resource.root.child_value("authoredOn"), Some("#{date}"));
    }

    #[test]
    fn json_arrays_expand_to_repeated_children() {
        let json = r#"{
            "resourceType": "Questionnaire",
            "item": [
                {"linkId": "business-key", "type": "string"},
                {"linkId": "user-task-id", "type": "string"}
            ]
        }"#;
        let resource = from_json(json, "q.json").unwrap();
        let items: Vec<_> = resource.root.children_named("item").collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].child_value("linkId"), Some("business-key"));
        assert_eq!(items[1].child_value("linkId"), Some("user-task-id"));
    }

    #[test]
    fn extension_url_is_attribute_positioned() {
        let json = r#"{
            "resourceType": "ActivityDefinition",
            "extension": [{
                "url": "http://dsf.dev/fhir/StructureDefinition/extension-process-authorization",
                "extension": [{"url": "message-name", "valueString": "pingMessage"}]
            }]
        }"#;
        let resource = from_json(json, "ad.json").unwrap();
        let ext = resource.root.child("extension").unwrap();
        assert_eq!(
            ext.attr("url"),
            Some("http://dsf.dev/fhir/StructureDefinition/extension-process-authorization")
        );
        // url must not also appear as a child element
        assert!(ext.child("url").is_none());
        let nested = ext.child("extension").unwrap();
        assert_eq!(nested.attr("url"), Some("message-name"));
        assert_eq!(nested.child_value("valueString"), Some("pingMessage"));
    }

    #[test]
    fn url_outside_extension_stays_an_element() {
        let json = r#"{"resourceType": "ValueSet", "url": "http://example.org/vs"}"#;
        let resource = from_json(json, "vs.json").unwrap();
        assert_eq!(resource.root.child_value("url"), Some("http://example.org/vs"));
        assert!(resource.root.attr("url").is_none());
    }

    #[test]
    fn xml_and_json_yield_equivalent_trees() {
        let xml = r#"<ValueSet xmlns="http://hl7.org/fhir">
            <url value="http://example.org/vs"/>
            <compose><include><system value="http://example.org/cs"/>
              <concept><code value="a"/></concept></include></compose>
        </ValueSet>"#;
        let json = r#"{
            "resourceType": "ValueSet",
            "url": "http://example.org/vs",
            "compose": {"include": [{"system": "http://example.org/cs",
                "concept": [{"code": "a"}]}]}
        }"#;
        let from_x = from_xml(xml, "vs.xml").unwrap();
        let from_j = from_json(json, "vs.json").unwrap();
        let path = ["compose", "include", "concept", "code"];
        assert_eq!(
            from_x.root.at_path(&path).and_then(|n| n.value()),
            from_j.root.at_path(&path).and_then(|n| n.value()),
        );
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        assert!(from_json("{", "x.json").is_err());
        assert!(from_json("[1,2]", "x.json").is_err());
        assert!(from_json(r#"{"no": "type"}"#, "x.json").is_err());
        assert!(from_xml("<", "x.xml").is_err());
    }
}
