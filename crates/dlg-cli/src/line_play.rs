use std::io::{self, BufRead, Write};
use std::path::Path;

use dlg_api::EngineSession;
use dlg_core::{
    CloseReason, DialogueError, DialogueOutput, ErrorKind, PresentedFrame, PresentedKind,
};
use dlg_runtime::{DialogueConfig, DialogueEngine};

use crate::{
    capture_player_state, create_session, load_session_for_project, map_play_io,
    save_player_state, LineCommandAction, LoadedProject,
};

const HELP: &str = "commands: :help :save :load :restart :trace :quit";

pub(crate) struct PlaySetup {
    pub(crate) project: LoadedProject,
    pub(crate) entry_scene: Option<String>,
    pub(crate) random_seed: Option<u32>,
    pub(crate) config: DialogueConfig,
    pub(crate) state_file: String,
}

impl PlaySetup {
    pub(crate) fn start(&self) -> Result<EngineSession, DialogueError> {
        create_session(
            &self.project,
            self.entry_scene.clone(),
            None,
            self.random_seed,
            self.config.clone(),
        )
    }
}

pub(crate) fn run_play_line_mode(
    setup: &PlaySetup,
    session: EngineSession,
) -> Result<i32, DialogueError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_play_line_mode_with_io(setup, session, &mut reader, &mut writer)
}

pub(crate) fn run_play_line_mode_with_io(
    setup: &PlaySetup,
    mut session: EngineSession,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, DialogueError> {
    writeln!(writer, "Dialogue player").map_err(map_play_io)?;
    writeln!(writer, "{}", HELP).map_err(map_play_io)?;
    let mut output = session.output.clone();

    loop {
        let expects_choice = match &output {
            DialogueOutput::Closed { reason } => {
                writeln!(writer).map_err(map_play_io)?;
                writeln!(writer, "[CLOSED] {}", describe_close(reason)).map_err(map_play_io)?;
                return Ok(0);
            }
            DialogueOutput::Frame { frame } => {
                render_frame(frame, writer)?;
                frame.kind == PresentedKind::Choice
            }
        };

        loop {
            let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                return Ok(0);
            };
            let raw = raw.trim();
            match handle_line_cmd(raw, setup, &mut session, writer)? {
                LineCommandAction::Continue => continue,
                LineCommandAction::RefreshBoundary => {
                    output = session.output.clone();
                    break;
                }
                LineCommandAction::Quit => return Ok(0),
                LineCommandAction::NotHandled => {}
            }
            match apply_input(&mut session.engine, expects_choice, raw) {
                Ok(next) => {
                    output = next;
                    break;
                }
                // A rejected input leaves the session presenting.
                Err(error) if error.kind == ErrorKind::Session => {
                    writeln!(writer, "error: {}", error.message).map_err(map_play_io)?;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

pub(crate) fn handle_line_cmd(
    raw: &str,
    setup: &PlaySetup,
    session: &mut EngineSession,
    writer: &mut dyn Write,
) -> Result<LineCommandAction, DialogueError> {
    let action = match raw {
        ":help" => {
            writeln!(writer, "{}", HELP).map_err(map_play_io)?;
            LineCommandAction::Continue
        }
        ":save" => {
            match capture_player_state(session, &setup.project.dir, &setup.config)? {
                Some(state) => {
                    save_player_state(Path::new(&setup.state_file), &state)?;
                    writeln!(writer, "saved: {}", setup.state_file).map_err(map_play_io)?;
                }
                None => writeln!(writer, "nothing to save").map_err(map_play_io)?,
            }
            LineCommandAction::Continue
        }
        ":load" => {
            *session = load_session_for_project(Path::new(&setup.state_file), &setup.project)?;
            writeln!(writer, "loaded: {}", setup.state_file).map_err(map_play_io)?;
            LineCommandAction::RefreshBoundary
        }
        ":restart" => {
            *session = setup.start()?;
            writeln!(writer, "restarted").map_err(map_play_io)?;
            LineCommandAction::RefreshBoundary
        }
        ":trace" => {
            for node in session.engine.trace().nodes() {
                let written = match node.choice {
                    Some(choice) => writeln!(writer, "  {} #{}", node.path, choice),
                    None => writeln!(writer, "  {}", node.path),
                };
                written.map_err(map_play_io)?;
            }
            LineCommandAction::Continue
        }
        ":quit" => {
            writeln!(writer, "bye").map_err(map_play_io)?;
            LineCommandAction::Quit
        }
        _ => LineCommandAction::NotHandled,
    };
    Ok(action)
}

fn apply_input(
    engine: &mut DialogueEngine,
    expects_choice: bool,
    raw: &str,
) -> Result<DialogueOutput, DialogueError> {
    if raw.is_empty() && !expects_choice {
        return engine.continue_frame();
    }
    let index = raw.parse::<usize>().map_err(|_| {
        DialogueError::session(
            "CLI_PLAY_CHOICE_PARSE",
            format!("Invalid choice index: {}", raw),
        )
    })?;
    engine.choose(index)
}

fn render_frame(frame: &PresentedFrame, writer: &mut dyn Write) -> Result<(), DialogueError> {
    writeln!(writer).map_err(map_play_io)?;
    if let Some(speaker) = &frame.speaker {
        writeln!(writer, "{}:", speaker).map_err(map_play_io)?;
    }
    if !frame.text.is_empty() {
        writeln!(writer, "{}", frame.text).map_err(map_play_io)?;
    }
    for choice in &frame.choices {
        let suffix = if choice.locked { " (locked)" } else { "" };
        writeln!(writer, "  [{}] {}{}", choice.index, choice.text, suffix).map_err(map_play_io)?;
    }
    if frame.kind != PresentedKind::Choice {
        writeln!(writer, "  [enter] {}", frame.next_text).map_err(map_play_io)?;
    }
    Ok(())
}

fn describe_close(reason: &CloseReason) -> String {
    match reason {
        CloseReason::Returned => "returned".to_string(),
        CloseReason::OpenedContainer { id } => format!("opened container {}", id),
        CloseReason::ChangedScene { scene, spawn } => match spawn {
            Some(spawn) => format!("changed scene to {} at {}", scene, spawn),
            None => format!("changed scene to {}", scene),
        },
        CloseReason::RanScript { name } => format!("ran script {}", name),
        CloseReason::Aborted { code } => format!("aborted ({})", code),
        CloseReason::Cancelled => "cancelled".to_string(),
    }
}

/// Reads one line; `None` at end of input.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, DialogueError> {
    write!(writer, "{}", prefix).map_err(map_play_io)?;
    writer.flush().map_err(map_play_io)?;
    let mut input = String::new();
    let read = reader.read_line(&mut input).map_err(map_play_io)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

#[cfg(test)]
mod line_play_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::load_project;

    fn setup(demo: &str, state_file: &str) -> PlaySetup {
        PlaySetup {
            project: load_project(&demo_dir(demo)).expect("demo should load"),
            entry_scene: None,
            random_seed: Some(1),
            config: DialogueConfig::default(),
            state_file: state_file.to_string(),
        }
    }

    fn play(setup: &PlaySetup, input: &str) -> String {
        let session = setup.start().expect("session should start");
        let mut reader = io::Cursor::new(input.as_bytes().to_vec());
        let mut writer = Vec::new();
        let code = run_play_line_mode_with_io(setup, session, &mut reader, &mut writer)
            .expect("play should pass");
        assert_eq!(code, 0);
        String::from_utf8(writer).expect("utf-8 output")
    }

    #[test]
    fn bad_input_is_reported_and_the_frame_stays() {
        let state_file = temp_path("play-bad-input.json");
        let setup = setup("01-tavern", state_file.to_string_lossy().as_ref());
        let transcript = play(&setup, "\nabc\n9\n:trace\n:quit\n");
        assert!(transcript.contains("error: Invalid choice index: abc"));
        assert_eq!(transcript.matches("error: ").count(), 2);
        assert!(transcript.contains("  main.greeting"));
        assert!(transcript.ends_with("bye\n"));
    }

    #[test]
    fn save_load_and_restart_commands() {
        let state_file = temp_path("play-save.json");
        let setup = setup("01-tavern", state_file.to_string_lossy().as_ref());
        let transcript = play(&setup, ":save\n\n:load\n:restart\n:help\n");
        assert!(transcript.contains("saved: "));
        assert!(transcript.contains("loaded: "));
        assert!(transcript.contains("restarted"));
        assert!(transcript.contains(HELP));
        assert!(state_file.exists());
    }

    #[test]
    fn end_of_input_quits_and_close_is_described() {
        let state_file = temp_path("play-eof.json");
        let setup = setup("01-tavern", state_file.to_string_lossy().as_ref());
        assert!(play(&setup, "").contains("[enter]"));

        assert_eq!(describe_close(&CloseReason::Cancelled), "cancelled");
        assert_eq!(
            describe_close(&CloseReason::ChangedScene {
                scene: "Harbor".to_string(),
                spawn: Some("dock".to_string())
            }),
            "changed scene to Harbor at dock"
        );
    }
}
