use std::ffi::OsString;

use clap::Parser;
use dlg_core::DialogueError;

mod agent;
mod boundary;
mod check;
mod cli_args;
mod error_map;
mod line_play;
mod models;
mod session_ops;
mod source_loader;
mod state_store;

pub(crate) use boundary::{boundary_from_output, emit_boundary};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, CheckArgs, ChooseArgs, Cli, ContinueArgs, Mode, PlayArgs, StartArgs,
    TickArgs,
};
pub(crate) use error_map::{
    emit_error, json_string, map_cli_config_invalid, map_cli_config_read, map_cli_source_path,
    map_cli_state_encode, map_cli_state_invalid, map_cli_state_read, map_cli_state_write,
    map_play_io,
};
pub(crate) use line_play::{run_play_line_mode, PlaySetup};
pub(crate) use models::{
    BoundaryChoice, BoundaryEvent, BoundaryResult, LineCommandAction, PlayerStateV1,
    PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    capture_player_state, create_session, emit_boundary_with_saved_state,
    load_session_for_project, resume_from_player_state,
};
pub(crate) use source_loader::{load_config, load_project, LoadedProject};
pub(crate) use state_store::{check_saved_scenes, load_player_state, save_player_state};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, DialogueError> {
    match cli.command {
        Mode::Check(args) => check::run_check(args),
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Play(args) => run_play(args),
    }
}

fn run_play(args: PlayArgs) -> Result<i32, DialogueError> {
    let setup = PlaySetup {
        project: load_project(&args.project_dir)?,
        entry_scene: args.entry_scene,
        random_seed: args.seed,
        config: load_config(args.config.as_deref())?,
        state_file: args
            .state_file
            .unwrap_or_else(|| ".dialogue/save.json".to_string()),
    };
    let session = setup.start()?;
    run_play_line_mode(&setup, session)
}

#[cfg(test)]
mod cli_test_support;
