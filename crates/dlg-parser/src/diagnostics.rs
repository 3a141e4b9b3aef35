use dlg_core::DialogueError;
use serde::{Deserialize, Serialize};

/// A skipped or suspicious entry found while loading a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseDiagnostic {
    pub path: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    scene: String,
    items: Vec<ParseDiagnostic>,
}

impl Diagnostics {
    pub(crate) fn new(scene: &str) -> Self {
        Self {
            scene: scene.to_string(),
            items: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, path: &str, code: &str, message: impl Into<String>) {
        let message = message.into();
        log::warn!("[dialogue:{}] {} at {}: {}", self.scene, code, path, message);
        self.items.push(ParseDiagnostic {
            path: path.to_string(),
            code: code.to_string(),
            message,
        });
    }

    pub(crate) fn error(&mut self, fallback_path: &str, error: &DialogueError) {
        let path = error.path.clone().unwrap_or_else(|| fallback_path.to_string());
        self.warn(&path, &error.code, error.message.clone());
    }

    pub(crate) fn into_items(self) -> Vec<ParseDiagnostic> {
        self.items
    }
}
