use std::path::Path;

use dlg_api::EngineSession;
use dlg_core::{DialogueError, DialogueOutput};
use dlg_runtime::EngineTick;

use crate::{
    create_session, emit_boundary_with_saved_state, load_config, load_player_state, load_project,
    resume_from_player_state, AgentArgs, AgentCommand, ChooseArgs, ContinueArgs, StartArgs,
    TickArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, DialogueError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Choose(args) => run_choose(args),
        AgentCommand::Continue(args) => run_continue(args),
        AgentCommand::Tick(args) => run_tick(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, DialogueError> {
    let project = load_project(&args.project_dir)?;
    let config = load_config(args.config.as_deref())?;
    let session = create_session(
        &project,
        args.entry_scene,
        args.entry_frame,
        args.seed,
        config.clone(),
    )?;
    emit_boundary_with_saved_state(
        &session,
        &session.output,
        &args.state_out,
        &project.dir,
        &config,
    )
}

pub(super) fn run_choose(args: ChooseArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, |session| {
        session.engine.choose(args.choice)
    })
}

pub(super) fn run_continue(args: ContinueArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, |session| {
        session.engine.continue_frame()
    })
}

/// Lets frame timers and delayed microscripts run. A timer that does not
/// fire re-emits the frame still on screen.
pub(super) fn run_tick(args: TickArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, |session| {
        match session.engine.tick(EngineTick::seconds(args.seconds))? {
            Some(output) => Ok(output),
            None => Ok(session.output.clone()),
        }
    })
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut EngineSession) -> Result<DialogueOutput, DialogueError>,
) -> Result<i32, DialogueError> {
    let state = load_player_state(Path::new(state_in))?;
    let (project_dir, mut session) = resume_from_player_state(&state)?;
    let output = transition(&mut session)?;
    emit_boundary_with_saved_state(&session, &output, state_out, &project_dir, &state.config)
}
