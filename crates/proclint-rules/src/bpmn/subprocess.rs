//! Subprocess rules

use super::tag;
use proclint_core::bpmn::{BpmnElement, BpmnElementKind};
use proclint_core::findings::{Finding, FindingKind};

pub fn check_subprocess(
    subprocess: &BpmnElement,
    file: &str,
    pid: Option<&str>,
    out: &mut Vec<Finding>,
) {
    if subprocess.multi_instance && !subprocess.async_before {
        out.push(tag(
            Finding::of(
                FindingKind::SubprocessMultiInstanceNotAsyncBefore,
                file,
                subprocess.id.clone(),
            ),
            pid,
        ));
    }
    for child in &subprocess.children {
        let is_end_event = matches!(
            child.kind,
            BpmnElementKind::EndEvent | BpmnElementKind::SignalEndEvent
        );
        if is_end_event && !child.async_after {
            out.push(tag(
                Finding::of(
                    FindingKind::SubprocessEndEventNotAsyncAfter,
                    file,
                    child.id.clone(),
                ),
                pid,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proclint_core::bpmn::parse_bpmn;

    fn subprocess(attrs: &str, end_attrs: &str) -> BpmnElement {
        let xml = format!(
            r#"<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL"
               xmlns:camunda="http://camunda.org/schema/1.0/bpmn">
              <process id="dsfdev_t">
                <subProcess id="sub"{attrs}>
                  <multiInstanceLoopCharacteristics/>
                  <endEvent id="subEnd"{end_attrs}/>
                </subProcess>
              </process>
            </definitions>"#
        );
        parse_bpmn(&xml, "m.bpmn").unwrap().processes[0].elements[0].clone()
    }

    #[test]
    fn multi_instance_requires_async_before() {
        let mut out = Vec::new();
        check_subprocess(&subprocess("", r#" camunda:asyncAfter="true""#), "m.bpmn", None, &mut out);
        assert!(out
            .iter()
            .any(|f| f.kind == FindingKind::SubprocessMultiInstanceNotAsyncBefore));

        out.clear();
        check_subprocess(
            &subprocess(r#" camunda:asyncBefore="true""#, r#" camunda:asyncAfter="true""#),
            "m.bpmn",
            None,
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn inner_end_events_require_async_after() {
        let mut out = Vec::new();
        check_subprocess(
            &subprocess(r#" camunda:asyncBefore="true""#, ""),
            "m.bpmn",
            None,
            &mut out,
        );
        let finding = out
            .iter()
            .find(|f| f.kind == FindingKind::SubprocessEndEventNotAsyncAfter)
            .unwrap();
        assert_eq!(finding.anchor, "subEnd");
    }
}
