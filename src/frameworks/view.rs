//! View framework.
//!
//! Template lookup and rendering for one application. Templates are plain
//! files with `{{name}}` placeholders; a layout wraps a view at `{{yield}}`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::schema::ViewSettings;
use crate::frameworks::namespace::Namespace;

const YIELD: &str = "yield";

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Template '{0}' not found")]
    TemplateNotFound(String),

    #[error("Cannot read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// View configuration registered for one application.
#[derive(Debug, Clone)]
pub struct ViewFramework {
    view_namespace: String,
    root: PathBuf,
    layout: Option<String>,
    search_paths: Vec<PathBuf>,
}

impl ViewFramework {
    /// `app_root` resolves the templates root; `load_paths` are already resolved.
    pub fn new(
        namespace: &Namespace,
        settings: &ViewSettings,
        app_root: &Path,
        load_paths: &[PathBuf],
    ) -> Self {
        let root = app_root.join(&settings.root);
        let mut search_paths = vec![root.clone()];
        search_paths.extend(load_paths.iter().filter(|p| **p != root).cloned());

        Self {
            view_namespace: namespace.qualify("Views"),
            root,
            layout: settings.layout.clone(),
            search_paths,
        }
    }

    pub fn view_namespace(&self) -> &str {
        &self.view_namespace
    }

    /// Templates root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// Directories searched for templates, templates root first.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Locate a template by name.
    ///
    /// `books/index` matches `books/index` or any `books/index.*` file,
    /// checking each search path in order.
    pub fn find_template(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let stem = relative.file_name()?.to_str()?;
        let prefix = format!("{}.", stem);

        for dir in &self.search_paths {
            let exact = dir.join(relative);
            if exact.is_file() {
                return Some(exact);
            }

            let parent = match relative.parent() {
                Some(parent) => dir.join(parent),
                None => dir.clone(),
            };
            let Ok(entries) = fs::read_dir(&parent) else {
                continue;
            };
            let mut candidates: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file()
                        && path
                            .file_name()
                            .and_then(|f| f.to_str())
                            .map(|f| f.starts_with(&prefix))
                            .unwrap_or(false)
                })
                .collect();
            candidates.sort();
            if let Some(found) = candidates.into_iter().next() {
                return Some(found);
            }
        }
        None
    }

    /// Render a template with `locals`, wrapped in the layout when one is
    /// configured and present on disk.
    pub fn render(&self, name: &str, locals: &Map<String, Value>) -> Result<String, ViewError> {
        let path = self
            .find_template(name)
            .ok_or_else(|| ViewError::TemplateNotFound(name.to_string()))?;
        let body = substitute(&read(&path)?, locals);

        let layout = match self.layout.as_deref().and_then(|l| self.find_template(l)) {
            Some(layout) => layout,
            None => return Ok(body),
        };

        let mut with_yield = locals.clone();
        with_yield.insert(YIELD.to_string(), Value::String(body));
        Ok(substitute(&read(&layout)?, &with_yield))
    }
}

fn read(path: &Path) -> Result<String, ViewError> {
    fs::read_to_string(path).map_err(|source| ViewError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `{{ key }}` with the matching local. Unknown keys render empty.
fn substitute(template: &str, locals: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match locals.get(key) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(Value::Null) | None => {}
                    Some(other) => out.push_str(&other.to_string()),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
