//! Owned model of a parsed BPMN 2.0 document
//!
//! The model keeps the declaration order of the XML and resolves the Camunda
//! extension attributes and elements the rules consume: implementation
//! classes, field injections, listeners, form keys, async flags, and message
//! names.

use crate::error::ProclintError;
use crate::result::Result;
use std::collections::HashMap;

pub const BPMN_NS: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
pub const CAMUNDA_NS: &str = "http://camunda.org/schema/1.0/bpmn";

/// A parsed BPMN document
#[derive(Debug, Clone, Default)]
pub struct BpmnModel {
    pub processes: Vec<BpmnProcess>,
}

/// One `process` element with its flow elements in declaration order
#[derive(Debug, Clone, Default)]
pub struct BpmnProcess {
    pub id: String,
    pub elements: Vec<BpmnElement>,
}

impl BpmnProcess {
    /// Sequence flows of this scope, declaration order
    pub fn flows(&self) -> impl Iterator<Item = &BpmnElement> {
        self.elements
            .iter()
            .filter(|e| e.kind == BpmnElementKind::SequenceFlow)
    }

    /// Outgoing sequence flows of the given node
    pub fn outgoing_flows(&self, node_id: &str) -> Vec<&BpmnElement> {
        self.flows()
            .filter(|f| f.source_ref.as_deref() == Some(node_id))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BpmnElementKind {
    StartEvent,
    EndEvent,
    ServiceTask,
    SendTask,
    ReceiveTask,
    UserTask,
    IntermediateMessageThrowEvent,
    IntermediateMessageCatchEvent,
    MessageBoundaryEvent,
    SignalIntermediateThrowEvent,
    SignalEndEvent,
    ExclusiveGateway,
    InclusiveGateway,
    EventBasedGateway,
    SequenceFlow,
    SubProcess,
    Other,
}

impl BpmnElementKind {
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            BpmnElementKind::ExclusiveGateway
                | BpmnElementKind::InclusiveGateway
                | BpmnElementKind::EventBasedGateway
        )
    }

    pub fn is_event(&self) -> bool {
        matches!(
            self,
            BpmnElementKind::StartEvent
                | BpmnElementKind::EndEvent
                | BpmnElementKind::IntermediateMessageThrowEvent
                | BpmnElementKind::IntermediateMessageCatchEvent
                | BpmnElementKind::MessageBoundaryEvent
                | BpmnElementKind::SignalIntermediateThrowEvent
                | BpmnElementKind::SignalEndEvent
        )
    }
}

/// A named, typed literal injected into an implementation class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInjection {
    pub name: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Literal(String),
    Expression(String),
}

impl FieldValue {
    pub fn literal(&self) -> Option<&str> {
        match self {
            FieldValue::Literal(s) => Some(s),
            FieldValue::Expression(_) => None,
        }
    }
}

/// A Camunda execution or task listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub class_name: Option<String>,
    pub event: Option<String>,
}

/// One typed node of the BPMN graph
#[derive(Debug, Clone)]
pub struct BpmnElement {
    pub id: String,
    pub name: Option<String>,
    pub kind: BpmnElementKind,
    /// `camunda:class`
    pub implementation_class: Option<String>,
    /// `camunda:formKey` on user tasks
    pub form_key: Option<String>,
    /// Resolved message name for message-carrying elements
    pub message_name: Option<String>,
    pub fields: Vec<FieldInjection>,
    pub execution_listeners: Vec<Listener>,
    pub task_listeners: Vec<Listener>,
    pub async_before: bool,
    pub async_after: bool,
    pub multi_instance: bool,
    /// The `default` flow id on gateways
    pub default_flow: Option<String>,
    /// `sourceRef` on sequence flows
    pub source_ref: Option<String>,
    /// `targetRef` on sequence flows
    pub target_ref: Option<String>,
    /// Condition expression text on sequence flows
    pub condition: Option<String>,
    /// `attachedToRef` on boundary events
    pub attached_to: Option<String>,
    /// Nested flow elements of a subprocess
    pub children: Vec<BpmnElement>,
}

impl BpmnElement {
    fn new(id: String, kind: BpmnElementKind) -> Self {
        Self {
            id,
            name: None,
            kind,
            implementation_class: None,
            form_key: None,
            message_name: None,
            fields: Vec::new(),
            execution_listeners: Vec::new(),
            task_listeners: Vec::new(),
            async_before: false,
            async_after: false,
            multi_instance: false,
            default_flow: None,
            source_ref: None,
            target_ref: None,
            condition: None,
            attached_to: None,
            children: Vec::new(),
        }
    }

    pub fn name_is_blank(&self) -> bool {
        self.name.as_deref().map(str::trim).unwrap_or("").is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldInjection> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Parse a BPMN document into the owned model
pub fn parse_bpmn(text: &str, file: &str) -> Result<BpmnModel> {
    let doc = roxmltree::Document::parse(text)
        .map_err(|e| ProclintError::parse_error(file, e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "definitions" {
        return Err(ProclintError::parse_error(
            file,
            format!("expected 'definitions' root, found '{}'", root.tag_name().name()),
        ));
    }

    let messages: HashMap<String, String> = root
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "message")
        .filter_map(|n| {
            let id = n.attribute("id")?;
            Some((id.to_string(), n.attribute("name").unwrap_or("").to_string()))
        })
        .collect();

    let processes = root
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "process")
        .map(|n| BpmnProcess {
            id: n.attribute("id").unwrap_or("").to_string(),
            elements: parse_scope(n, &messages),
        })
        .collect();

    Ok(BpmnModel { processes })
}

fn parse_scope(scope: roxmltree::Node<'_, '_>, messages: &HashMap<String, String>) -> Vec<BpmnElement> {
    scope
        .children()
        .filter(|n| n.is_element())
        .filter_map(|n| parse_element(n, messages))
        .collect()
}

fn parse_element(
    node: roxmltree::Node<'_, '_>,
    messages: &HashMap<String, String>,
) -> Option<BpmnElement> {
    let local = node.tag_name().name();
    let has_message = has_event_definition(node, "messageEventDefinition");
    let has_signal = has_event_definition(node, "signalEventDefinition");

    let kind = match local {
        "startEvent" => BpmnElementKind::StartEvent,
        "endEvent" if has_signal => BpmnElementKind::SignalEndEvent,
        "endEvent" => BpmnElementKind::EndEvent,
        "serviceTask" => BpmnElementKind::ServiceTask,
        "sendTask" => BpmnElementKind::SendTask,
        "receiveTask" => BpmnElementKind::ReceiveTask,
        "userTask" => BpmnElementKind::UserTask,
        "intermediateThrowEvent" if has_message => BpmnElementKind::IntermediateMessageThrowEvent,
        "intermediateThrowEvent" if has_signal => BpmnElementKind::SignalIntermediateThrowEvent,
        "intermediateCatchEvent" if has_message => BpmnElementKind::IntermediateMessageCatchEvent,
        "boundaryEvent" if has_message => BpmnElementKind::MessageBoundaryEvent,
        "exclusiveGateway" => BpmnElementKind::ExclusiveGateway,
        "inclusiveGateway" => BpmnElementKind::InclusiveGateway,
        "eventBasedGateway" => BpmnElementKind::EventBasedGateway,
        "sequenceFlow" => BpmnElementKind::SequenceFlow,
        "subProcess" => BpmnElementKind::SubProcess,
        "task" | "callActivity" | "scriptTask" | "businessRuleTask" | "manualTask"
        | "parallelGateway" | "intermediateThrowEvent" | "intermediateCatchEvent"
        | "boundaryEvent" => BpmnElementKind::Other,
        _ => return None,
    };

    let mut element = BpmnElement::new(node.attribute("id").unwrap_or("").to_string(), kind);
    element.name = node.attribute("name").map(str::to_string);
    element.implementation_class = node.attribute((CAMUNDA_NS, "class")).map(str::to_string);
    element.form_key = node.attribute((CAMUNDA_NS, "formKey")).map(str::to_string);
    element.async_before = node.attribute((CAMUNDA_NS, "asyncBefore")) == Some("true");
    element.async_after = node.attribute((CAMUNDA_NS, "asyncAfter")) == Some("true");
    element.default_flow = node.attribute("default").map(str::to_string);
    element.source_ref = node.attribute("sourceRef").map(str::to_string);
    element.target_ref = node.attribute("targetRef").map(str::to_string);
    element.attached_to = node.attribute("attachedToRef").map(str::to_string);
    element.message_name = resolve_message_name(node, messages);
    element.multi_instance = node
        .children()
        .any(|n| n.is_element() && n.tag_name().name() == "multiInstanceLoopCharacteristics");

    if kind == BpmnElementKind::SequenceFlow {
        element.condition = node
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == "conditionExpression")
            .map(|n| n.text().unwrap_or("").trim().to_string());
    }

    if let Some(ext) = node
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "extensionElements")
    {
        parse_extensions(ext, &mut element);
    }

    if kind == BpmnElementKind::SubProcess {
        element.children = parse_scope(node, messages);
    }

    Some(element)
}

fn has_event_definition(node: roxmltree::Node<'_, '_>, definition: &str) -> bool {
    node.children()
        .any(|n| n.is_element() && n.tag_name().name() == definition)
}

fn resolve_message_name(
    node: roxmltree::Node<'_, '_>,
    messages: &HashMap<String, String>,
) -> Option<String> {
    let message_ref = node.attribute("messageRef").or_else(|| {
        node.children()
            .find(|n| n.is_element() && n.tag_name().name() == "messageEventDefinition")
            .and_then(|n| n.attribute("messageRef"))
    })?;
    Some(
        messages
            .get(message_ref)
            .cloned()
            .unwrap_or_else(|| message_ref.to_string()),
    )
}

fn parse_extensions(ext: roxmltree::Node<'_, '_>, element: &mut BpmnElement) {
    for child in ext.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "field" => {
                let Some(name) = child.attribute("name") else {
                    continue;
                };
                let value = if let Some(expr) = child.attribute("expression") {
                    FieldValue::Expression(expr.to_string())
                } else if let Some(literal) = child.attribute("stringValue") {
                    FieldValue::Literal(literal.to_string())
                } else if let Some(string_child) = child
                    .children()
                    .find(|n| n.is_element() && n.tag_name().name() == "string")
                {
                    FieldValue::Literal(string_child.text().unwrap_or("").trim().to_string())
                } else if let Some(expr_child) = child
                    .children()
                    .find(|n| n.is_element() && n.tag_name().name() == "expression")
                {
                    FieldValue::Expression(expr_child.text().unwrap_or("").trim().to_string())
                } else {
                    FieldValue::Literal(String::new())
                };
                element.fields.push(FieldInjection {
                    name: name.to_string(),
                    value,
                });
            }
            "executionListener" => element.execution_listeners.push(Listener {
                class_name: child.attribute("class").map(str::to_string),
                event: child.attribute("event").map(str::to_string),
            }),
            "taskListener" => element.task_listeners.push(Listener {
                class_name: child.attribute("class").map(str::to_string),
                event: child.attribute("event").map(str::to_string),
            }),
            _ => {}
        }
    }
}
