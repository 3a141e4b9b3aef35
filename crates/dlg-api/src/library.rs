use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use dlg_core::{DialogueError, DialogueScene};
use dlg_parser::{parse_scene_report, ParseDiagnostic};
use dlg_runtime::SceneSource;

/// Dialogue documents by scene name, parsed on first use and cached.
#[derive(Debug, Default)]
pub struct SceneLibrary {
    sources: BTreeMap<String, String>,
    cache: RefCell<BTreeMap<String, Arc<DialogueScene>>>,
}

impl SceneLibrary {
    pub fn new(sources: BTreeMap<String, String>) -> Self {
        Self {
            sources,
            cache: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let name = name.into();
        self.cache.get_mut().remove(&name);
        self.sources.insert(name, source.into());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Parses every document now, returning the diagnostics per scene. The
    /// first document that fails to load aborts with its error.
    pub fn compile_all(&self) -> Result<BTreeMap<String, Vec<ParseDiagnostic>>, DialogueError> {
        let mut reports = BTreeMap::new();
        for (name, source) in &self.sources {
            let report = parse_scene_report(name, source)?;
            self.cache
                .borrow_mut()
                .insert(name.clone(), Arc::new(report.scene));
            reports.insert(name.clone(), report.diagnostics);
        }
        Ok(reports)
    }
}

impl SceneSource for SceneLibrary {
    fn load_scene(&self, name: &str) -> Result<Arc<DialogueScene>, DialogueError> {
        if let Some(scene) = self.cache.borrow().get(name) {
            return Ok(Arc::clone(scene));
        }
        let source = self
            .sources
            .get(name)
            .ok_or_else(|| DialogueError::scene_not_found(name))?;
        let report = parse_scene_report(name, source)?;
        log::debug!(
            "[dialogue:{}] loaded with {} diagnostic(s)",
            name,
            report.diagnostics.len()
        );
        let scene = Arc::new(report.scene);
        self.cache
            .borrow_mut()
            .insert(name.to_string(), Arc::clone(&scene));
        Ok(scene)
    }
}

#[cfg(test)]
mod library_tests {
    use super::*;

    fn library(entries: &[(&str, &str)]) -> SceneLibrary {
        SceneLibrary::new(
            entries
                .iter()
                .map(|(name, source)| ((*name).to_string(), (*source).to_string()))
                .collect(),
        )
    }

    #[test]
    fn scenes_are_parsed_once_and_shared() {
        let library = library(&[("intro", r#"{"frames":{"a":{"type":"text","text":"Hi"}}}"#)]);
        let first = library.load_scene("intro").expect("intro should load");
        let second = library.load_scene("intro").expect("intro should load");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.default_frame, "a");

        let error = library.load_scene("missing").expect_err("unknown scene");
        assert_eq!(error.code, "ENGINE_SCENE_NOT_FOUND");
    }

    #[test]
    fn compile_all_reports_diagnostics_and_errors() {
        let library = library(&[(
            "intro",
            r#"{"frames":{"a":{"type":"text"},"b":{"type":"bogus"}}}"#,
        )]);
        let reports = library.compile_all().expect("compile should pass");
        let diagnostics = &reports["intro"];
        assert!(diagnostics
            .iter()
            .any(|diagnostic| diagnostic.code == "PARSE_FRAME_TYPE_UNKNOWN"));

        let mut library = library;
        library.insert("broken", "{not json");
        let error = library.compile_all().expect_err("broken json");
        assert_eq!(error.code, "PARSE_JSON_INVALID");
    }
}
