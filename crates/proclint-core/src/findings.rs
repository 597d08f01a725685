//! Lint finding catalog
//!
//! Every finding the linter can emit is a member of the closed [`FindingKind`]
//! catalog. A kind owns its default severity and default human text; the two
//! BPMN carrier kinds ([`FindingKind::FlowElement`] and
//! [`FindingKind::FloatingElement`]) take severity explicitly and carry an
//! [`ElementIssue`] sub-type tag. The kind tag is the stable identifier used
//! in JSON output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity levels for findings, ordered `ERROR > WARN > INFO > SUCCESS`.
///
/// SUCCESS records a positive finding: a rule examined an element and
/// approved it. SUCCESS items are carried in the model and shown only in
/// verbose output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Success,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// The report subsystem a finding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subsystem {
    Bpmn,
    Fhir,
    PluginDefinition,
}

/// Report grouping for finding kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingGroup {
    BpmnServiceTask,
    BpmnMessageSend,
    BpmnEvents,
    BpmnGateways,
    BpmnUserTask,
    BpmnFieldInjection,
    BpmnSubprocess,
    BpmnExecutionListener,
    BpmnProcess,
    FhirGeneral,
    FhirActivityDefinition,
    FhirStructureDefinition,
    FhirTask,
    FhirValueSet,
    FhirCodeSystem,
    FhirQuestionnaire,
    PluginDefinition,
}

impl FindingGroup {
    pub fn subsystem(&self) -> Subsystem {
        match self {
            FindingGroup::BpmnServiceTask
            | FindingGroup::BpmnMessageSend
            | FindingGroup::BpmnEvents
            | FindingGroup::BpmnGateways
            | FindingGroup::BpmnUserTask
            | FindingGroup::BpmnFieldInjection
            | FindingGroup::BpmnSubprocess
            | FindingGroup::BpmnExecutionListener
            | FindingGroup::BpmnProcess => Subsystem::Bpmn,
            FindingGroup::FhirGeneral
            | FindingGroup::FhirActivityDefinition
            | FindingGroup::FhirStructureDefinition
            | FindingGroup::FhirTask
            | FindingGroup::FhirValueSet
            | FindingGroup::FhirCodeSystem
            | FindingGroup::FhirQuestionnaire => Subsystem::Fhir,
            FindingGroup::PluginDefinition => Subsystem::PluginDefinition,
        }
    }
}

/// Sub-type tags for the two severity-carrying BPMN element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementIssue {
    SequenceFlowHasNoSourceNode,
    SequenceFlowHasNoTargetNode,
    SequenceFlowConditionMissing,
    SequenceFlowConditionOnDefaultFlow,
    SequenceFlowNameIsEmpty,
    ExclusiveGatewayHasMultipleOutgoingFlowsButNameIsEmpty,
    InclusiveGatewayHasMultipleOutgoingFlowsButNameIsEmpty,
    EventNameIsEmpty,
    ServiceTaskNameIsEmpty,
    SendTaskNameIsEmpty,
    UserTaskNameIsEmpty,
    UserTaskFormKeyIsEmpty,
    ElementNotReachableFromStartEvent,
}

impl ElementIssue {
    pub fn group(&self) -> FindingGroup {
        match self {
            ElementIssue::SequenceFlowHasNoSourceNode
            | ElementIssue::SequenceFlowHasNoTargetNode
            | ElementIssue::SequenceFlowConditionMissing
            | ElementIssue::SequenceFlowConditionOnDefaultFlow
            | ElementIssue::SequenceFlowNameIsEmpty
            | ElementIssue::ExclusiveGatewayHasMultipleOutgoingFlowsButNameIsEmpty
            | ElementIssue::InclusiveGatewayHasMultipleOutgoingFlowsButNameIsEmpty => {
                FindingGroup::BpmnGateways
            }
            ElementIssue::EventNameIsEmpty => FindingGroup::BpmnEvents,
            ElementIssue::ServiceTaskNameIsEmpty => FindingGroup::BpmnServiceTask,
            ElementIssue::SendTaskNameIsEmpty => FindingGroup::BpmnMessageSend,
            ElementIssue::UserTaskNameIsEmpty | ElementIssue::UserTaskFormKeyIsEmpty => {
                FindingGroup::BpmnUserTask
            }
            ElementIssue::ElementNotReachableFromStartEvent => FindingGroup::BpmnProcess,
        }
    }

    /// Default human text for the sub-type
    pub fn text(&self) -> &'static str {
        match self {
            ElementIssue::SequenceFlowHasNoSourceNode => "Sequence flow has no source node",
            ElementIssue::SequenceFlowHasNoTargetNode => "Sequence flow has no target node",
            ElementIssue::SequenceFlowConditionMissing => {
                "Non-default outgoing sequence flow has no condition expression"
            }
            ElementIssue::SequenceFlowConditionOnDefaultFlow => {
                "Default sequence flow must not have a condition expression"
            }
            ElementIssue::SequenceFlowNameIsEmpty => "Sequence flow name is empty",
            ElementIssue::ExclusiveGatewayHasMultipleOutgoingFlowsButNameIsEmpty => {
                "Exclusive gateway has multiple outgoing flows but name is empty"
            }
            ElementIssue::InclusiveGatewayHasMultipleOutgoingFlowsButNameIsEmpty => {
                "Inclusive gateway has multiple outgoing flows but name is empty"
            }
            ElementIssue::EventNameIsEmpty => "Event name is empty",
            ElementIssue::ServiceTaskNameIsEmpty => "Service task name is empty",
            ElementIssue::SendTaskNameIsEmpty => "Send task name is empty",
            ElementIssue::UserTaskNameIsEmpty => "User task name is empty",
            ElementIssue::UserTaskFormKeyIsEmpty => "User task formKey is empty",
            ElementIssue::ElementNotReachableFromStartEvent => {
                "Element is not reachable on a path from a start event"
            }
        }
    }
}

/// The closed catalog of finding kinds.
///
/// The serialized tag (SCREAMING_SNAKE_CASE of the variant name) is the
/// stable identifier used for report grouping and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    // BPMN service task
    ServiceTaskImplementationMissing,
    ServiceTaskClassNotFound,
    ServiceTaskInterfaceNotImplemented,
    ServiceTaskBaseClassNotExtended,

    // BPMN message send
    SendTaskImplementationMissing,
    SendTaskClassNotFound,
    SendTaskInterfaceNotImplemented,
    SendTaskBaseClassNotExtended,
    MessageIntermediateThrowEventCarriesMessage,

    // BPMN field injection
    FieldInjectionMissing,
    FieldInjectionNotLiteral,
    FieldInjectionVersionPlaceholderMissing,

    // BPMN events
    MessageNameEmpty,
    MessageNotDeclared,

    // BPMN user task
    UserTaskFormKeyNotExternal,
    UserTaskQuestionnaireNotFound,
    TaskListenerClassMissing,
    TaskListenerClassNotFound,
    TaskListenerInvalid,

    // BPMN subprocess
    SubprocessMultiInstanceNotAsyncBefore,
    SubprocessEndEventNotAsyncAfter,

    // BPMN execution listener
    ExecutionListenerClassNotFound,
    ExecutionListenerInterfaceNotImplemented,

    // BPMN process
    ProcessIdEmpty,
    ProcessIdPatternMismatch,
    UnparsableBpmn,
    Unknown,

    // BPMN carriers (severity and sub-type supplied by the rule)
    FlowElement,
    FloatingElement,
    BpmnElementSuccess,

    // FHIR general
    UnparsableFhir,
    FhirResourceTypeUnsupported,
    FhirCheckPassed,
    FhirReadAccessTagMissing,
    FhirReadAccessTagInvalid,
    FhirMetaProfileMissing,
    FhirMetaProfileInvalid,

    // FHIR ActivityDefinition
    FhirActivityDefinitionUrlInvalid,
    FhirActivityDefinitionStatusInvalid,
    FhirActivityDefinitionKindInvalid,
    FhirActivityDefinitionProfileVersionSuffix,
    FhirProcessAuthorizationMissing,
    FhirProcessAuthorizationRequesterInvalid,
    FhirProcessAuthorizationRecipientInvalid,
    FhirProcessAuthorizationCardinalityInvalid,

    // FHIR StructureDefinition
    FhirStructureDefinitionPlaceholderMissing,
    FhirStructureDefinitionSnapshotPresent,
    FhirStructureDefinitionDifferentialMissing,
    FhirStructureDefinitionElementIdMissing,
    FhirStructureDefinitionElementIdDuplicate,
    FhirStructureDefinitionSliceMaxExceedsBase,
    FhirStructureDefinitionSliceMinSumBelowBase,
    FhirStructureDefinitionSliceMinSumAboveBase,
    FhirStructureDefinitionSliceMinBelowBase,

    // FHIR Task
    FhirTaskProfileMissing,
    FhirTaskProfileInvalid,
    FhirTaskStatusInvalid,
    FhirTaskIntentInvalid,
    FhirTaskIdentifierSystemInvalid,
    FhirTaskAuthoredOnPlaceholderMissing,
    FhirTaskOrganizationPlaceholderMissing,
    FhirTaskInstantiatesCanonicalUnknown,
    FhirTaskInstantiatesCanonicalPlaceholderMissing,
    FhirTaskMessageNameInputCountInvalid,
    FhirTaskBusinessKeyMissing,
    FhirTaskBusinessKeyPresent,
    FhirTaskBusinessKeyCheckSkipped,
    FhirTaskCorrelationKeyPresent,
    FhirTaskInputCardinalityInvalid,
    FhirTaskCodingCodeUnknown,

    // FHIR ValueSet
    FhirValueSetFieldMissing,
    FhirValueSetPlaceholderMissing,
    FhirValueSetIncludeMissing,
    FhirValueSetIncludeSystemMissing,
    FhirValueSetConceptCodeMissing,
    FhirValueSetDuplicateCode,
    FhirValueSetFalseUrlReferenced,
    FhirValueSetUnknownCode,

    // FHIR CodeSystem
    FhirCodeSystemFieldMissing,
    FhirCodeSystemStatusInvalid,
    FhirCodeSystemConceptMissing,
    FhirCodeSystemConceptIncomplete,
    FhirCodeSystemDuplicateCode,
    FhirCodeSystemPlaceholderMissing,

    // FHIR Questionnaire
    FhirQuestionnaireProfileMissing,
    FhirQuestionnaireProfileInvalid,
    FhirQuestionnaireStatusInvalid,
    FhirQuestionnairePlaceholderMissing,
    FhirQuestionnaireItemMissing,
    FhirQuestionnaireItemLinkIdMissing,
    FhirQuestionnaireItemLinkIdDuplicate,
    FhirQuestionnaireItemLinkIdNotKebabCase,
    FhirQuestionnaireItemTypeMissing,
    FhirQuestionnaireItemTextMissing,
    FhirQuestionnaireMandatoryItemMissing,
    FhirQuestionnaireMandatoryItemInvalid,

    // Plugin definition
    PluginReferenceNotFound,
    PluginReferenceOutsideResourceRoot,
    PluginReferenceFromDependency,
    PluginNoProcessModels,
    PluginNoFhirResources,
    PluginServiceRegistrationMissing,
    PluginServiceRegistrationPresent,
    PluginLeftoverFile,
}

impl FindingKind {
    /// Fixed severity of this kind, or `None` for the carrier kinds that
    /// take severity as a constructor argument.
    pub fn fixed_severity(&self) -> Option<Severity> {
        use FindingKind::*;
        match self {
            FlowElement | FloatingElement => None,
            BpmnElementSuccess | FhirCheckPassed | PluginServiceRegistrationPresent => {
                Some(Severity::Success)
            }
            FhirResourceTypeUnsupported
            | FhirStructureDefinitionSliceMinSumBelowBase
            | FhirStructureDefinitionSliceMinBelowBase
            | FhirTaskBusinessKeyCheckSkipped
            | FhirQuestionnaireItemLinkIdNotKebabCase
            | FhirQuestionnaireItemTextMissing
            | PluginReferenceFromDependency => Some(Severity::Info),
            MessageNotDeclared
            | FhirStructureDefinitionSliceMinSumAboveBase
            | PluginReferenceOutsideResourceRoot
            | PluginNoProcessModels
            | PluginNoFhirResources
            | PluginLeftoverFile => Some(Severity::Warn),
            _ => Some(Severity::Error),
        }
    }

    /// Report grouping for this kind. Carrier kinds derive their group from
    /// the sub-type and return `None` here.
    pub fn fixed_group(&self) -> Option<FindingGroup> {
        use FindingKind::*;
        match self {
            ServiceTaskImplementationMissing
            | ServiceTaskClassNotFound
            | ServiceTaskInterfaceNotImplemented
            | ServiceTaskBaseClassNotExtended => Some(FindingGroup::BpmnServiceTask),
            SendTaskImplementationMissing
            | SendTaskClassNotFound
            | SendTaskInterfaceNotImplemented
            | SendTaskBaseClassNotExtended
            | MessageIntermediateThrowEventCarriesMessage => Some(FindingGroup::BpmnMessageSend),
            FieldInjectionMissing | FieldInjectionNotLiteral
            | FieldInjectionVersionPlaceholderMissing => Some(FindingGroup::BpmnFieldInjection),
            MessageNameEmpty | MessageNotDeclared => Some(FindingGroup::BpmnEvents),
            UserTaskFormKeyNotExternal
            | UserTaskQuestionnaireNotFound
            | TaskListenerClassMissing
            | TaskListenerClassNotFound
            | TaskListenerInvalid => Some(FindingGroup::BpmnUserTask),
            SubprocessMultiInstanceNotAsyncBefore | SubprocessEndEventNotAsyncAfter => {
                Some(FindingGroup::BpmnSubprocess)
            }
            ExecutionListenerClassNotFound | ExecutionListenerInterfaceNotImplemented => {
                Some(FindingGroup::BpmnExecutionListener)
            }
            ProcessIdEmpty | ProcessIdPatternMismatch | UnparsableBpmn | Unknown
            | BpmnElementSuccess => Some(FindingGroup::BpmnProcess),
            FlowElement | FloatingElement => None,
            UnparsableFhir
            | FhirResourceTypeUnsupported
            | FhirCheckPassed
            | FhirReadAccessTagMissing
            | FhirReadAccessTagInvalid
            | FhirMetaProfileMissing
            | FhirMetaProfileInvalid => Some(FindingGroup::FhirGeneral),
            FhirActivityDefinitionUrlInvalid
            | FhirActivityDefinitionStatusInvalid
            | FhirActivityDefinitionKindInvalid
            | FhirActivityDefinitionProfileVersionSuffix
            | FhirProcessAuthorizationMissing
            | FhirProcessAuthorizationRequesterInvalid
            | FhirProcessAuthorizationRecipientInvalid
            | FhirProcessAuthorizationCardinalityInvalid => {
                Some(FindingGroup::FhirActivityDefinition)
            }
            FhirStructureDefinitionPlaceholderMissing
            | FhirStructureDefinitionSnapshotPresent
            | FhirStructureDefinitionDifferentialMissing
            | FhirStructureDefinitionElementIdMissing
            | FhirStructureDefinitionElementIdDuplicate
            | FhirStructureDefinitionSliceMaxExceedsBase
            | FhirStructureDefinitionSliceMinSumBelowBase
            | FhirStructureDefinitionSliceMinSumAboveBase
            | FhirStructureDefinitionSliceMinBelowBase => {
                Some(FindingGroup::FhirStructureDefinition)
            }
            FhirTaskProfileMissing
            | FhirTaskProfileInvalid
            | FhirTaskStatusInvalid
            | FhirTaskIntentInvalid
            | FhirTaskIdentifierSystemInvalid
            | FhirTaskAuthoredOnPlaceholderMissing
            | FhirTaskOrganizationPlaceholderMissing
            | FhirTaskInstantiatesCanonicalUnknown
            | FhirTaskInstantiatesCanonicalPlaceholderMissing
            | FhirTaskMessageNameInputCountInvalid
            | FhirTaskBusinessKeyMissing
            | FhirTaskBusinessKeyPresent
            | FhirTaskBusinessKeyCheckSkipped
            | FhirTaskCorrelationKeyPresent
            | FhirTaskInputCardinalityInvalid
            | FhirTaskCodingCodeUnknown => Some(FindingGroup::FhirTask),
            FhirValueSetFieldMissing
            | FhirValueSetPlaceholderMissing
            | FhirValueSetIncludeMissing
            | FhirValueSetIncludeSystemMissing
            | FhirValueSetConceptCodeMissing
            | FhirValueSetDuplicateCode
            | FhirValueSetFalseUrlReferenced
            | FhirValueSetUnknownCode => Some(FindingGroup::FhirValueSet),
            FhirCodeSystemFieldMissing
            | FhirCodeSystemStatusInvalid
            | FhirCodeSystemConceptMissing
            | FhirCodeSystemConceptIncomplete
            | FhirCodeSystemDuplicateCode
            | FhirCodeSystemPlaceholderMissing => Some(FindingGroup::FhirCodeSystem),
            FhirQuestionnaireProfileMissing
            | FhirQuestionnaireProfileInvalid
            | FhirQuestionnaireStatusInvalid
            | FhirQuestionnairePlaceholderMissing
            | FhirQuestionnaireItemMissing
            | FhirQuestionnaireItemLinkIdMissing
            | FhirQuestionnaireItemLinkIdDuplicate
            | FhirQuestionnaireItemLinkIdNotKebabCase
            | FhirQuestionnaireItemTypeMissing
            | FhirQuestionnaireItemTextMissing
            | FhirQuestionnaireMandatoryItemMissing
            | FhirQuestionnaireMandatoryItemInvalid => Some(FindingGroup::FhirQuestionnaire),
            PluginReferenceNotFound
            | PluginReferenceOutsideResourceRoot
            | PluginReferenceFromDependency
            | PluginNoProcessModels
            | PluginNoFhirResources
            | PluginServiceRegistrationMissing
            | PluginServiceRegistrationPresent
            | PluginLeftoverFile => Some(FindingGroup::PluginDefinition),
        }
    }

    /// Default human text for this kind
    pub fn default_text(&self) -> &'static str {
        use FindingKind::*;
        match self {
            ServiceTaskImplementationMissing => "Service task has no implementation class",
            ServiceTaskClassNotFound => "Service task implementation class not found",
            ServiceTaskInterfaceNotImplemented => {
                "Service task implementation class does not implement the required interface"
            }
            ServiceTaskBaseClassNotExtended => {
                "Service task implementation class does not extend the required base class"
            }
            SendTaskImplementationMissing => "Message send element has no implementation class",
            SendTaskClassNotFound => "Message send implementation class not found",
            SendTaskInterfaceNotImplemented => {
                "Message send implementation class does not implement the required interface"
            }
            SendTaskBaseClassNotExtended => {
                "Message send implementation class does not extend the required base class"
            }
            MessageIntermediateThrowEventCarriesMessage => {
                "Message intermediate throw event must not carry a message"
            }
            FieldInjectionMissing => "Required field injection is missing",
            FieldInjectionNotLiteral => "Field injection value must be a literal string",
            FieldInjectionVersionPlaceholderMissing => {
                "Field injection value does not contain the version placeholder"
            }
            MessageNameEmpty => "Message name is empty",
            MessageNotDeclared => {
                "Message does not correspond to a declared ActivityDefinition or StructureDefinition"
            }
            UserTaskFormKeyNotExternal => "formKey is not an external form",
            UserTaskQuestionnaireNotFound => "Referenced Questionnaire does not exist",
            TaskListenerClassMissing => "Task listener has no class attribute",
            TaskListenerClassNotFound => "Task listener class not found",
            TaskListenerInvalid => {
                "Task listener class neither extends the default listener nor implements the listener interface"
            }
            SubprocessMultiInstanceNotAsyncBefore => {
                "Multi-instance subprocess must have asyncBefore=true"
            }
            SubprocessEndEventNotAsyncAfter => {
                "End event inside a subprocess must have asyncAfter=true"
            }
            ExecutionListenerClassNotFound => "Execution listener class not found",
            ExecutionListenerInterfaceNotImplemented => {
                "Execution listener class does not implement the execution listener interface"
            }
            ProcessIdEmpty => "Process id is empty",
            ProcessIdPatternMismatch => {
                "Process id does not match the pattern 'domain_processname'"
            }
            UnparsableBpmn => "BPMN model could not be parsed",
            Unknown => "Unexpected error while checking element",
            FlowElement => "BPMN flow element check failed",
            FloatingElement => "BPMN element check failed",
            BpmnElementSuccess => "Check passed",
            UnparsableFhir => "FHIR resource could not be parsed",
            FhirResourceTypeUnsupported => "No checks registered for this resource type",
            FhirCheckPassed => "Check passed",
            FhirReadAccessTagMissing => "meta.tag does not carry a read access tag",
            FhirReadAccessTagInvalid => "Read access tag code is not valid",
            FhirMetaProfileMissing => "meta.profile is missing",
            FhirMetaProfileInvalid => "meta.profile does not carry the expected canonical URL",
            FhirActivityDefinitionUrlInvalid => {
                "ActivityDefinition url does not start with the canonical ActivityDefinition prefix"
            }
            FhirActivityDefinitionStatusInvalid => "ActivityDefinition status must be 'unknown'",
            FhirActivityDefinitionKindInvalid => "ActivityDefinition kind must be 'Task'",
            FhirActivityDefinitionProfileVersionSuffix => {
                "ActivityDefinition meta.profile must not carry a version suffix"
            }
            FhirProcessAuthorizationMissing => {
                "ActivityDefinition has no process-authorization extension"
            }
            FhirProcessAuthorizationRequesterInvalid => {
                "process-authorization requester does not carry a valid code"
            }
            FhirProcessAuthorizationRecipientInvalid => {
                "process-authorization recipient does not carry a valid code"
            }
            FhirProcessAuthorizationCardinalityInvalid => {
                "process-authorization must carry exactly one requester and one recipient"
            }
            FhirStructureDefinitionPlaceholderMissing => {
                "StructureDefinition field does not contain the expected placeholder"
            }
            FhirStructureDefinitionSnapshotPresent => "StructureDefinition must not have a snapshot",
            FhirStructureDefinitionDifferentialMissing => {
                "StructureDefinition must have a differential"
            }
            FhirStructureDefinitionElementIdMissing => "Differential element has no id",
            FhirStructureDefinitionElementIdDuplicate => "Differential element id is not unique",
            FhirStructureDefinitionSliceMaxExceedsBase => {
                "Slice max cardinality exceeds the base element max"
            }
            FhirStructureDefinitionSliceMinSumBelowBase => {
                "Sum of slice min cardinalities is below the base element min"
            }
            FhirStructureDefinitionSliceMinSumAboveBase => {
                "Sum of slice min cardinalities is above the base element min"
            }
            FhirStructureDefinitionSliceMinBelowBase => {
                "Slice min cardinality is below the base element min"
            }
            FhirTaskProfileMissing => "Task meta.profile is missing",
            FhirTaskProfileInvalid => "Task meta.profile is not a valid task profile",
            FhirTaskStatusInvalid => "Task status must be 'draft'",
            FhirTaskIntentInvalid => "Task intent must be 'order'",
            FhirTaskIdentifierSystemInvalid => {
                "Identifier system is not the organization identifier system"
            }
            FhirTaskAuthoredOnPlaceholderMissing => {
                "Task authoredOn does not contain the date placeholder"
            }
            FhirTaskOrganizationPlaceholderMissing => {
                "Identifier value does not contain the organization placeholder"
            }
            FhirTaskInstantiatesCanonicalUnknown => {
                "instantiatesCanonical does not reference a declared ActivityDefinition"
            }
            FhirTaskInstantiatesCanonicalPlaceholderMissing => {
                "instantiatesCanonical does not contain the version placeholder"
            }
            FhirTaskMessageNameInputCountInvalid => {
                "Task must carry exactly one input of code 'message-name'"
            }
            FhirTaskBusinessKeyMissing => "business-key input is missing",
            FhirTaskBusinessKeyPresent => "business-key exists",
            FhirTaskBusinessKeyCheckSkipped => "business-key check skipped",
            FhirTaskCorrelationKeyPresent => "correlation-key must not appear in status 'draft'",
            FhirTaskInputCardinalityInvalid => {
                "Task input count violates the StructureDefinition cardinality"
            }
            FhirTaskCodingCodeUnknown => "Task input coding code is unknown",
            FhirValueSetFieldMissing => "ValueSet field is missing",
            FhirValueSetPlaceholderMissing => {
                "ValueSet field does not contain the expected placeholder"
            }
            FhirValueSetIncludeMissing => "ValueSet must have at least one compose.include",
            FhirValueSetIncludeSystemMissing => "ValueSet include has no system",
            FhirValueSetConceptCodeMissing => "ValueSet concept has no code",
            FhirValueSetDuplicateCode => "Duplicate concept code within one include",
            FhirValueSetFalseUrlReferenced => "Concept code is declared by a different code system",
            FhirValueSetUnknownCode => "Concept code is not known to any code system",
            FhirCodeSystemFieldMissing => "CodeSystem field is missing",
            FhirCodeSystemStatusInvalid => "CodeSystem status must be 'unknown'",
            FhirCodeSystemConceptMissing => "CodeSystem must have at least one concept",
            FhirCodeSystemConceptIncomplete => "CodeSystem concept has no code or display",
            FhirCodeSystemDuplicateCode => "Duplicate concept code",
            FhirCodeSystemPlaceholderMissing => {
                "CodeSystem field does not contain the expected placeholder"
            }
            FhirQuestionnaireProfileMissing => "Questionnaire meta.profile is missing",
            FhirQuestionnaireProfileInvalid => {
                "Questionnaire meta.profile is not the questionnaire profile"
            }
            FhirQuestionnaireStatusInvalid => "Questionnaire status is not valid",
            FhirQuestionnairePlaceholderMissing => {
                "Questionnaire field does not contain the expected placeholder"
            }
            FhirQuestionnaireItemMissing => "Questionnaire must have at least one item",
            FhirQuestionnaireItemLinkIdMissing => "Questionnaire item has no linkId",
            FhirQuestionnaireItemLinkIdDuplicate => "Questionnaire item linkId is not unique",
            FhirQuestionnaireItemLinkIdNotKebabCase => {
                "Questionnaire item linkId is not kebab-case"
            }
            FhirQuestionnaireItemTypeMissing => "Questionnaire item has no type",
            FhirQuestionnaireItemTextMissing => "Questionnaire item has no text",
            FhirQuestionnaireMandatoryItemMissing => "Mandatory questionnaire item is missing",
            FhirQuestionnaireMandatoryItemInvalid => {
                "Mandatory questionnaire item must have type 'string' and required=true"
            }
            PluginReferenceNotFound => "Declared reference could not be resolved",
            PluginReferenceOutsideResourceRoot => {
                "Declared reference resolves outside the plugin resource root"
            }
            PluginReferenceFromDependency => {
                "Declared reference was resolved from a dependency archive"
            }
            PluginNoProcessModels => "Plugin declares no process models",
            PluginNoFhirResources => "Plugin declares no FHIR resources",
            PluginServiceRegistrationMissing => "Plugin descriptor has no service registration",
            PluginServiceRegistrationPresent => "Plugin descriptor is registered as a service",
            PluginLeftoverFile => "File under the resource root is not referenced by any plugin",
        }
    }
}

/// Kind-specific extra fields carried by a finding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    #[serde(rename = "className", default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(rename = "fieldName", default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
}

impl Extra {
    pub fn is_empty(&self) -> bool {
        self == &Extra::default()
    }
}

/// A single lint finding
///
/// Anchors are stable across runs: a BPMN element id or a FHIR resource
/// reference, never a line/column position. File identifiers are always the
/// leaf file name, never an absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<ElementIssue>,
    pub anchor: String,
    pub file: String,
    #[serde(rename = "processId", default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<String>,
    #[serde(rename = "resourceId", default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl Finding {
    /// Construct a finding of a fixed-severity kind with its default text
    pub fn of(kind: FindingKind, file: impl Into<String>, anchor: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.fixed_severity().unwrap_or(Severity::Error),
            description: kind.default_text().to_string(),
            subtype: None,
            anchor: anchor.into(),
            file: file.into(),
            process_id: None,
            resource_id: None,
            extra: Extra::default(),
        }
    }

    /// Construct a `FLOW_ELEMENT` carrier finding
    pub fn flow_element(
        severity: Severity,
        subtype: ElementIssue,
        file: impl Into<String>,
        anchor: impl Into<String>,
    ) -> Self {
        let mut finding = Self::of(FindingKind::FlowElement, file, anchor);
        finding.severity = severity;
        finding.description = subtype.text().to_string();
        finding.subtype = Some(subtype);
        finding
    }

    /// Construct a `FLOATING_ELEMENT` carrier finding
    pub fn floating_element(
        severity: Severity,
        subtype: ElementIssue,
        file: impl Into<String>,
        anchor: impl Into<String>,
    ) -> Self {
        let mut finding = Self::of(FindingKind::FloatingElement, file, anchor);
        finding.severity = severity;
        finding.description = subtype.text().to_string();
        finding.subtype = Some(subtype);
        finding
    }

    /// Construct a BPMN SUCCESS finding; these always carry a description
    pub fn bpmn_success(
        description: impl Into<String>,
        file: impl Into<String>,
        anchor: impl Into<String>,
    ) -> Self {
        let mut finding = Self::of(FindingKind::BpmnElementSuccess, file, anchor);
        finding.description = description.into();
        finding
    }

    /// Construct a FHIR SUCCESS finding; these always carry a description
    pub fn fhir_success(
        description: impl Into<String>,
        file: impl Into<String>,
        anchor: impl Into<String>,
    ) -> Self {
        let mut finding = Self::of(FindingKind::FhirCheckPassed, file, anchor);
        finding.description = description.into();
        finding
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_process_id(mut self, process_id: impl Into<String>) -> Self {
        self.process_id = Some(process_id.into());
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.extra.class_name = Some(class_name.into());
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.extra.field_name = Some(field_name.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.extra.value = Some(value.into());
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.extra.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.extra.actual = Some(actual.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.extra.system = Some(system.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.extra.code = Some(code.into());
        self
    }

    pub fn with_archive(mut self, archive: impl Into<String>) -> Self {
        self.extra.archive = Some(archive.into());
        self
    }

    /// Report group this finding belongs to
    pub fn group(&self) -> FindingGroup {
        match self.kind.fixed_group() {
            Some(group) => group,
            None => self
                .subtype
                .map(|s| s.group())
                .unwrap_or(FindingGroup::BpmnProcess),
        }
    }

    /// Report subsystem this finding belongs to
    pub fn subsystem(&self) -> Subsystem {
        self.group().subsystem()
    }
}
