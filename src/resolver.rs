//! Include resolver.
//!
//! Expands `include "name"` directives into a single logical source text
//! before lexing. Each directive line is replaced by the contents of the
//! first `name.torth` found in the ordered search path, and the spliced
//! text is rescanned so nested includes expand too.

use crate::error::{CompileResult, CompilerError, ErrorKind};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// An `include "name"` directive on a line of its own, case-insensitive.
static INCLUDE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)^\s*include\s+"([^"]+)"\s*$"#).unwrap());

/// Expands includes relative to an ordered search path.
pub struct Resolver {
    search_paths: Vec<PathBuf>,
    /// Files currently being expanded, outermost first. A file that shows
    /// up twice on this stack is an include cycle.
    active: Vec<PathBuf>,
}

impl Resolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Resolver {
            search_paths,
            active: Vec::new(),
        }
    }

    /// Read the root source file and return it with all includes expanded.
    pub fn expand_file(&mut self, path: &Path) -> CompileResult<String> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            CompilerError::new(
                ErrorKind::IncludeNotFound,
                format!("Cannot read {}: {}", path.display(), e),
            )
        })?;
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.active.push(canonical);
        let expanded = self.expand_text(&source);
        self.active.pop();
        expanded
    }

    /// Expand every include directive in the given text.
    pub fn expand_text(&mut self, source: &str) -> CompileResult<String> {
        let mut out = String::with_capacity(source.len());
        for line in source.lines() {
            match INCLUDE_REGEX.captures(line) {
                Some(caps) => {
                    let name = caps.get(1).unwrap().as_str();
                    let included = self.expand_include(name)?;
                    out.push_str(&included);
                    if !included.ends_with('\n') {
                        out.push('\n');
                    }
                }
                None => {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }

    fn expand_include(&mut self, name: &str) -> CompileResult<String> {
        let path = self.find_include(name)?;
        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
        if self.active.iter().any(|p| *p == canonical) {
            let cycle: Vec<String> = self
                .active
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|p| p.display().to_string())
                .collect();
            return Err(CompilerError::new(
                ErrorKind::RecursiveInclude,
                format!("Include cycle detected: {}", cycle.join(" -> ")),
            ));
        }

        let source = std::fs::read_to_string(&path).map_err(|e| {
            CompilerError::new(
                ErrorKind::IncludeNotFound,
                format!("Cannot read {}: {}", path.display(), e),
            )
        })?;
        self.active.push(canonical);
        let expanded = self.expand_text(&source);
        self.active.pop();
        expanded
    }

    /// Locate `name.torth` in the search path; first hit wins.
    fn find_include(&self, name: &str) -> CompileResult<PathBuf> {
        for dir in &self.search_paths {
            let candidate = dir.join(format!("{}.torth", name));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(CompilerError::new(
            ErrorKind::IncludeNotFound,
            format!(
                "Included file '{}.torth' was not found in the include path ({})",
                name,
                self.search_paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ))
    }
}
