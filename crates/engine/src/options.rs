// ABOUTME: Evaluation and report options plus the EngineBuilder fluent constructor.
// ABOUTME: EvalMode picks strict (abort on first error) or lenient (collect errors) evaluation.

use std::fmt;

use crate::engine::Engine;

/// How per-definition failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalMode {
    /// Collect errors per top-level definition and keep the other fields.
    #[default]
    Lenient,
    /// Abort on the first error.
    Strict,
}

impl fmt::Display for EvalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvalMode::Lenient => "lenient",
            EvalMode::Strict => "strict",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for EvalMode {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "strict" => EvalMode::Strict,
            _ => EvalMode::Lenient,
        }
    }
}

/// Options for [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalOptions {
    pub mode: EvalMode,
    /// Joins the values of a leaf selector that matched several elements.
    pub value_separator: String,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            mode: EvalMode::Lenient,
            value_separator: "\n".to_string(),
        }
    }
}

/// Options for [`crate::report::render_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Keep one line per text fragment instead of collapsing to a single
    /// line. On by default.
    pub keep_newlines: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            keep_newlines: true,
        }
    }
}

/// Builder for constructing Engine instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    opts: EvalOptions,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the evaluation mode.
    pub fn mode(mut self, mode: EvalMode) -> Self {
        self.opts.mode = mode;
        self
    }

    /// Shorthand for `mode(EvalMode::Strict)` when `strict` is true.
    pub fn strict(self, strict: bool) -> Self {
        self.mode(if strict {
            EvalMode::Strict
        } else {
            EvalMode::Lenient
        })
    }

    /// Set the separator used for multi-match leaf values.
    pub fn value_separator(mut self, separator: impl Into<String>) -> Self {
        self.opts.value_separator = separator.into();
        self
    }

    pub fn build(self) -> Engine {
        Engine::new(self.opts)
    }
}
