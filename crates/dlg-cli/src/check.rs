use dlg_api::SceneLibrary;
use dlg_core::DialogueError;
use dlg_runtime::{RhaiScriptRunner, SharedGameState};

use crate::{json_string, load_project, CheckArgs};

/// Parses every scene and compiles every script. Diagnostics are reported
/// but do not fail the check; a document or script that cannot load does.
pub(super) fn run_check(args: CheckArgs) -> Result<i32, DialogueError> {
    let project = load_project(&args.project_dir)?;

    let library = SceneLibrary::new(project.sources.dialogues.clone());
    let reports = library.compile_all()?;

    let mut runner = RhaiScriptRunner::new(SharedGameState::default(), None);
    for (name, source) in &project.sources.scripts {
        runner.register(name, source)?;
    }

    println!("RESULT:OK");
    let mut total = 0;
    for (scene, diagnostics) in &reports {
        println!("SCENE:{}|{}", scene, diagnostics.len());
        for diagnostic in diagnostics {
            println!(
                "DIAGNOSTIC:{}|{}|{}",
                diagnostic.path,
                diagnostic.code,
                json_string(&diagnostic.message)
            );
        }
        total += diagnostics.len();
    }
    for name in project.sources.scripts.keys() {
        println!("SCRIPT:{}", name);
    }
    println!("DIAGNOSTICS:{}", total);
    Ok(0)
}
