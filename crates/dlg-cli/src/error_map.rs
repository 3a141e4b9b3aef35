use dlg_core::{DialogueError, ErrorKind};
use std::fmt::Display;

fn map_error(kind: ErrorKind, code: &'static str, error: impl Display) -> DialogueError {
    DialogueError::new(kind, code, error.to_string())
}

pub(crate) fn emit_error(error: DialogueError) -> i32 {
    log::error!("{}", error);
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", json_string(&error.message));
    if let Some(path) = &error.path {
        println!("ERROR_PATH_JSON:{}", json_string(path));
    }
    1
}

/// JSON-quotes a protocol value so embedded newlines never split a line.
pub(crate) fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

pub(crate) fn map_play_io(error: std::io::Error) -> DialogueError {
    map_error(ErrorKind::Io, "CLI_PLAY_IO", error)
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> DialogueError {
    map_error(ErrorKind::Io, "CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_state_write(error: std::io::Error) -> DialogueError {
    map_error(ErrorKind::Io, "CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_encode(error: serde_json::Error) -> DialogueError {
    map_error(ErrorKind::State, "CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> DialogueError {
    map_error(ErrorKind::Io, "CLI_STATE_READ", error)
}

pub(crate) fn map_cli_state_invalid(error: serde_json::Error) -> DialogueError {
    map_error(ErrorKind::State, "CLI_STATE_INVALID", error)
}

pub(crate) fn map_cli_config_read(error: std::io::Error) -> DialogueError {
    map_error(ErrorKind::Io, "CLI_CONFIG_READ", error)
}

pub(crate) fn map_cli_config_invalid(error: serde_json::Error) -> DialogueError {
    map_error(ErrorKind::Session, "CLI_CONFIG_INVALID", error)
}
