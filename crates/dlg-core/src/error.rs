use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Parse,
    FrameNotFound,
    SceneNotFound,
    Session,
    Script,
    State,
    Io,
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message}")]
pub struct DialogueError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    /// Document location, e.g. `frames.start.choices[1]`.
    pub path: Option<String>,
}

impl DialogueError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            path: None,
        }
    }

    pub fn parse(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, code, message)
    }

    pub fn session(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Session, code, message)
    }

    pub fn script(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Script, code, message)
    }

    pub fn state(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::State, code, message)
    }

    pub fn frame_not_found(scene: &str, frame: &str) -> Self {
        Self::new(
            ErrorKind::FrameNotFound,
            "ENGINE_FRAME_NOT_FOUND",
            format!("Frame \"{}\" does not exist in scene \"{}\".", frame, scene),
        )
    }

    pub fn scene_not_found(scene: &str) -> Self {
        Self::new(
            ErrorKind::SceneNotFound,
            "ENGINE_SCENE_NOT_FOUND",
            format!("Dialogue scene \"{}\" is not registered.", scene),
        )
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}
