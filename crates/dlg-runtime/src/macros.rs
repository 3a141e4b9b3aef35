use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::host::{GameState, TextMacroExpander};

fn macro_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z]+):([^{}]+)\}").expect("macro regex must compile")
    })
}

/// Expands `${kind:name}` against live state. Known kinds are `var`, `av`,
/// `flag`, `item`, `quest` and `affinity`; anything else is left as written.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateMacroExpander;

impl TextMacroExpander for TemplateMacroExpander {
    fn expand(&self, template: &str, state: &dyn GameState) -> String {
        if !template.contains("${") {
            return template.to_string();
        }
        macro_regex()
            .replace_all(template, |captures: &Captures<'_>| {
                let name = captures[2].trim();
                match &captures[1] {
                    "var" => state
                        .variable(name)
                        .map(|value| value.to_text())
                        .unwrap_or_default(),
                    "av" => match state.actor_value(name) {
                        Ok(value) => value.to_text(),
                        Err(error) => {
                            log::warn!("[dialogue] macro {} failed: {}", &captures[0], error);
                            String::new()
                        }
                    },
                    "flag" => state.flag(name).to_string(),
                    "item" => state.item_count(name).to_string(),
                    "quest" => state.quest_stage(name).to_string(),
                    "affinity" => dlg_core::DlgValue::Number(state.affinity(name)).to_text(),
                    _ => captures[0].to_string(),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod macros_tests {
    use super::*;
    use crate::host::GameStateMutator;
    use crate::state::MemoryGameState;
    use dlg_core::DlgValue;

    #[test]
    fn expands_known_kinds_and_keeps_unknown_verbatim() {
        let mut state = MemoryGameState::default();
        state.set_variable("town", DlgValue::from("Riverwood"));
        state.give_item("coin", 12);
        state.set_affinity("mira", 7.5);
        state.character.display_name = "Ash".to_string();

        let text = TemplateMacroExpander.expand(
            "Welcome to ${var:town}, ${av:DisplayName}. You carry ${item:coin} coins; Mira likes you ${affinity:mira}. ${weather:today} ${var:missing}!",
            &state,
        );
        assert_eq!(
            text,
            "Welcome to Riverwood, Ash. You carry 12 coins; Mira likes you 7.5. ${weather:today} !"
        );
    }

    #[test]
    fn plain_text_is_untouched() {
        let state = MemoryGameState::default();
        assert_eq!(TemplateMacroExpander.expand("No macros here.", &state), "No macros here.");
        assert_eq!(TemplateMacroExpander.expand("${flag:seen}", &state), "false");
    }
}
