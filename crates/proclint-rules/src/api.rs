//! Expected interfaces and base classes per element kind and API version
//!
//! The V1/V2 expectations form a closed lookup table consulted by the BPMN
//! rules; nothing else in the codebase branches on the version token.

use proclint_core::ApiVersion;

/// The element contracts with version-sensitive expectations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementContract {
    ServiceTask,
    MessageSendTask,
    UserTaskListener,
    ExecutionListener,
}

/// What an implementation class must look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    pub required_interface: &'static str,
    pub required_base: Option<&'static str>,
}

const JAVA_DELEGATE: &str = "org.camunda.bpm.engine.delegate.JavaDelegate";
const TASK_LISTENER: &str = "org.camunda.bpm.engine.delegate.TaskListener";
const EXECUTION_LISTENER: &str = "org.camunda.bpm.engine.delegate.ExecutionListener";

const V1_SERVICE_BASE: &str = "dev.dsf.bpe.v1.activity.AbstractServiceDelegate";
const V1_SEND_BASE: &str = "dev.dsf.bpe.v1.activity.AbstractTaskMessageSend";
const V1_LISTENER_BASE: &str = "dev.dsf.bpe.v1.activity.DefaultUserTaskListener";

const V2_SERVICE_IFACE: &str = "dev.dsf.bpe.v2.activity.ServiceTask";
const V2_SERVICE_BASE: &str = "dev.dsf.bpe.v2.activity.AbstractServiceDelegate";
const V2_SEND_IFACE: &str = "dev.dsf.bpe.v2.activity.MessageSendTask";
const V2_SEND_BASE: &str = "dev.dsf.bpe.v2.activity.AbstractTaskMessageSend";
const V2_LISTENER_IFACE: &str = "dev.dsf.bpe.v2.activity.UserTaskListener";
const V2_LISTENER_BASE: &str = "dev.dsf.bpe.v2.activity.DefaultUserTaskListener";
const V2_EXECUTION_LISTENER: &str = "dev.dsf.bpe.v2.activity.ExecutionListener";

/// The closed `(element kind, API version)` table.
///
/// Descriptors of undetermined version are checked against the V1
/// expectations.
pub fn expectation(contract: ElementContract, version: ApiVersion) -> Expectation {
    use ElementContract::*;
    match (contract, version) {
        (ServiceTask, ApiVersion::V2) => Expectation {
            required_interface: V2_SERVICE_IFACE,
            required_base: Some(V2_SERVICE_BASE),
        },
        (ServiceTask, _) => Expectation {
            required_interface: JAVA_DELEGATE,
            required_base: Some(V1_SERVICE_BASE),
        },
        (MessageSendTask, ApiVersion::V2) => Expectation {
            required_interface: V2_SEND_IFACE,
            required_base: Some(V2_SEND_BASE),
        },
        (MessageSendTask, _) => Expectation {
            required_interface: JAVA_DELEGATE,
            required_base: Some(V1_SEND_BASE),
        },
        (UserTaskListener, ApiVersion::V2) => Expectation {
            required_interface: V2_LISTENER_IFACE,
            required_base: Some(V2_LISTENER_BASE),
        },
        (UserTaskListener, _) => Expectation {
            required_interface: TASK_LISTENER,
            required_base: Some(V1_LISTENER_BASE),
        },
        (ExecutionListener, ApiVersion::V2) => Expectation {
            required_interface: V2_EXECUTION_LISTENER,
            required_base: None,
        },
        (ExecutionListener, _) => Expectation {
            required_interface: EXECUTION_LISTENER,
            required_base: None,
        },
    }
}
