use dlg_core::{CloseReason, DialogueError, DialogueScene, DEFAULT_FRAME_ALIAS};

use super::lifecycle::no_session;
use super::{DialogueEngine, Step};
use crate::host::ScriptContext;

const THIS_SCENE: &str = "this";

/// A parsed `next` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Another frame of the current scene. `default` and empty name the
    /// scene's default frame.
    Stay { frame: String },
    Return,
    Shop { id: String },
    Scene { scene: String, spawn: Option<String> },
    Script { name: String },
    /// Another dialogue document; `None` (`market.`) presents its default frame.
    Other { scene: String, frame: Option<String> },
}

/// Splits `raw` into `scene.frame` and classifies it. Reserved scene
/// prefixes (`meta`, `shop`, `scene`, `script`) win over document names.
pub fn parse_destination(raw: &str, current: &DialogueScene) -> Destination {
    let raw = raw.trim();
    let Some((head, rest)) = raw.split_once('.') else {
        return parse_bare(raw, current);
    };

    match head {
        "meta" => {
            if rest != "return" {
                log::warn!("[dialogue] unknown meta destination \"{}\"; closing", raw);
            }
            Destination::Return
        }
        "shop" => Destination::Shop {
            id: rest.to_string(),
        },
        "scene" => match rest.split_once('.') {
            Some((scene, spawn)) => Destination::Scene {
                scene: scene.to_string(),
                spawn: Some(spawn.to_string()).filter(|spawn| !spawn.is_empty()),
            },
            None => Destination::Scene {
                scene: rest.to_string(),
                spawn: None,
            },
        },
        "script" => Destination::Script {
            name: rest.to_string(),
        },
        _ if head.is_empty() || head == THIS_SCENE || head == current.name => Destination::Stay {
            frame: rest.to_string(),
        },
        _ => Destination::Other {
            scene: head.to_string(),
            frame: Some(rest.to_string()).filter(|frame| !frame.is_empty()),
        },
    }
}

/// A token without a dot names a frame of the current scene; other
/// documents are only reached through `scene.frame`.
fn parse_bare(raw: &str, current: &DialogueScene) -> Destination {
    if raw.is_empty() || raw == THIS_SCENE || raw == current.name {
        return Destination::Stay {
            frame: DEFAULT_FRAME_ALIAS.to_string(),
        };
    }
    Destination::Stay {
        frame: raw.to_string(),
    }
}

impl DialogueEngine {
    /// Routes a destination string. Every navigation funnels through here.
    pub(super) fn dispatch(&mut self, raw: &str) -> Result<Step, DialogueError> {
        let current = self
            .session
            .as_ref()
            .map(|session| session.scene.clone())
            .ok_or_else(no_session)?;
        let destination = parse_destination(raw, &current);
        log::debug!("[dialogue:{}] dispatch \"{}\" -> {:?}", current.name, raw, destination);

        match destination {
            Destination::Stay { frame } => Ok(Step::Present {
                scene: current,
                frame,
            }),
            Destination::Return => Ok(self.close_with(CloseReason::Returned)),
            Destination::Shop { id } => {
                if let Err(error) = self.world.open_container(&id) {
                    log::warn!("[dialogue] opening container \"{}\" failed: {}", id, error);
                }
                Ok(self.close_with(CloseReason::OpenedContainer { id }))
            }
            Destination::Scene { scene, spawn } => {
                let step = self.close_with(CloseReason::ChangedScene {
                    scene: scene.clone(),
                    spawn: spawn.clone(),
                });
                if let Err(error) = self.world.change_scene(&scene, spawn.as_deref()) {
                    log::warn!("[dialogue] changing scene to \"{}\" failed: {}", scene, error);
                }
                Ok(step)
            }
            Destination::Script { name } => {
                let leaving = self
                    .session
                    .as_ref()
                    .map(|session| session.frame.clone())
                    .unwrap_or_default();
                let step = self.close_with(CloseReason::RanScript { name: name.clone() });
                let context = ScriptContext::new(&current.name, leaving);
                if let Err(error) = self.scripts.call(&name, &context, None) {
                    log::warn!(
                        "[dialogue] script \"{}\" failed ({:?}): {}",
                        name,
                        error.kind,
                        error
                    );
                }
                Ok(step)
            }
            Destination::Other { scene, frame } => {
                let loaded = self.scenes.load_scene(&scene)?;
                let frame = frame.unwrap_or_else(|| loaded.default_frame.clone());
                Ok(Step::Present {
                    scene: loaded,
                    frame,
                })
            }
        }
    }

    fn close_with(&mut self, reason: CloseReason) -> Step {
        self.close_session(reason.clone());
        Step::Closed(reason)
    }
}
