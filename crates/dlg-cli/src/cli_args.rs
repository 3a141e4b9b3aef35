use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dialogue-player")]
#[command(about = "Dialogue frame-graph player and checker")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Parse every dialogue and script in a project and print diagnostics.
    Check(CheckArgs),
    Agent(AgentArgs),
    /// Interactive line mode on stdin/stdout.
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "project-dir")]
    pub(crate) project_dir: String,
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Choose(ChooseArgs),
    Continue(ContinueArgs),
    Tick(TickArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "project-dir")]
    pub(crate) project_dir: String,
    #[arg(long = "entry-scene")]
    pub(crate) entry_scene: Option<String>,
    #[arg(long = "entry-frame")]
    pub(crate) entry_frame: Option<String>,
    #[arg(long = "seed")]
    pub(crate) seed: Option<u32>,
    #[arg(long = "config")]
    pub(crate) config: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ContinueArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct TickArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "seconds")]
    pub(crate) seconds: f64,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "project-dir")]
    pub(crate) project_dir: String,
    #[arg(long = "entry-scene")]
    pub(crate) entry_scene: Option<String>,
    #[arg(long = "seed")]
    pub(crate) seed: Option<u32>,
    #[arg(long = "config")]
    pub(crate) config: Option<String>,
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
}
