//! Function executor replaying recorded responses from disk

use sap_cache::layout::file_component;
use sap_ir::Document;
use sap_metadata::{Error, FunctionExecutor, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Answers function calls with JSON documents stored in a directory.
///
/// A request is looked up as `<FUNCTION>.<first import value>.json` first,
/// then as `<FUNCTION>.json`, so per-item functions (interfaces, segment
/// lists) can be recorded next to the bulk lists.
#[derive(Debug, Clone)]
pub struct FixtureExecutor {
    dir: PathBuf,
}

impl FixtureExecutor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidates(&self, request: &Document) -> Vec<PathBuf> {
        let function = file_component(request.function_name());
        let keyed = request
            .root
            .children
            .first()
            .and_then(|parameter| parameter.value.as_deref())
            .filter(|value| !value.is_empty() && !value.contains('*'))
            .map(|value| format!("{function}.{}.json", file_component(value)));

        keyed
            .into_iter()
            .chain(std::iter::once(format!("{function}.json")))
            .map(|name| self.dir.join(name))
            .collect()
    }
}

impl FunctionExecutor for FixtureExecutor {
    fn execute(&self, request: &Document) -> Result<Document> {
        let function = request.function_name();
        for path in self.candidates(request) {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    trace!(path = %path.display(), "no fixture");
                    continue;
                }
                Err(e) => {
                    return Err(Error::remote_call(
                        function,
                        format!("reading {}: {e}", path.display()),
                    ));
                }
            };
            debug!(function, path = %path.display(), "replaying fixture");
            return serde_json::from_str(&text)
                .map_err(|e| Error::malformed(path.display().to_string(), e.to_string()));
        }

        Err(Error::remote_call(
            function,
            format!("no recorded response in {}", self.dir.display()),
        ))
    }
}
