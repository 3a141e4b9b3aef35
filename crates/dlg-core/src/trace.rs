use serde::{Deserialize, Serialize};

/// One presentation or advance event of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueTraceNode {
    /// `scene.frame` of the frame the event belongs to.
    pub path: String,
    /// Index into the frame's declared choices, not the displayed list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<usize>,
    pub speaker: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub ignored: bool,
}

/// Append-only log of a session. Not synchronized: callers drive a session
/// from one thread at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueTrace {
    nodes: Vec<DialogueTraceNode>,
}

impl DialogueTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, node: DialogueTraceNode) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[DialogueTraceNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn last(&self) -> Option<&DialogueTraceNode> {
        self.nodes.last()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.nodes)
    }
}

#[cfg(test)]
mod trace_tests {
    use super::*;

    #[test]
    fn trace_serializes_as_ordered_record_list() {
        let mut trace = DialogueTrace::new();
        trace.append(DialogueTraceNode {
            path: "intro.start".to_string(),
            choice: None,
            speaker: Some("Guard".to_string()),
            text: Some("Halt".to_string()),
            ignored: false,
        });
        trace.append(DialogueTraceNode {
            path: "intro.start".to_string(),
            choice: Some(1),
            speaker: None,
            text: Some("Run".to_string()),
            ignored: true,
        });

        let json = trace.to_json().expect("trace should serialize");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        let records = parsed.as_array().expect("array");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["path"], "intro.start");
        assert!(records[0].get("choice").is_none());
        assert_eq!(records[1]["choice"], 1);
        assert_eq!(records[1]["ignored"], true);
    }
}
