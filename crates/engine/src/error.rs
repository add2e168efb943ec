// ABOUTME: Error types for loading, evaluating and fetching: ConfigParseError, EvalError with ErrorCode, FetchError.
// ABOUTME: Load errors name the offending definition path; evaluation errors carry the dotted field path.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::selectors::selected::SelectedKind;

/// What was wrong with the declarative input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// The document is not valid YAML/JSON.
    Syntax(String),
    /// The configuration file could not be read.
    Io(String),
    /// A required key is absent.
    MissingField,
    /// A key holds a value of the wrong type.
    WrongType { expected: &'static str },
    /// A required string is empty.
    Empty,
    /// A name is used twice among siblings.
    DuplicateName(String),
    /// The selector expression does not compile.
    InvalidSelector(String),
    /// Two flags that cannot be combined.
    Conflict(String),
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::Syntax(msg) => write!(f, "malformed document: {}", msg),
            ConfigErrorKind::Io(msg) => write!(f, "cannot read configuration: {}", msg),
            ConfigErrorKind::MissingField => write!(f, "missing required field"),
            ConfigErrorKind::WrongType { expected } => write!(f, "expected a {}", expected),
            ConfigErrorKind::Empty => write!(f, "must not be empty"),
            ConfigErrorKind::DuplicateName(name) => {
                write!(f, "name {:?} is already used by a sibling", name)
            }
            ConfigErrorKind::InvalidSelector(msg) => write!(f, "invalid CSS selector: {}", msg),
            ConfigErrorKind::Conflict(msg) => write!(f, "conflicting options: {}", msg),
        }
    }
}

/// A selector configuration failed to load. No partial configuration is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ConfigParseError {
    /// Location of the offending definition, e.g. `[1].children[0]`. Empty for the document root.
    pub path: String,
    /// The offending key within that definition, if any.
    pub field: Option<String>,
    pub kind: ConfigErrorKind,
}

impl ConfigParseError {
    pub fn new(path: impl Into<String>, field: Option<&str>, kind: ConfigErrorKind) -> Self {
        Self {
            path: path.into(),
            field: field.map(str::to_string),
            kind,
        }
    }

    /// Error that concerns the whole document rather than a definition.
    pub fn document(kind: ConfigErrorKind) -> Self {
        Self::new("", None, kind)
    }

    /// `path.field`, or `document` when the error is not tied to a definition.
    pub fn location(&self) -> String {
        match (&self.path[..], &self.field) {
            ("", None) => "document".to_string(),
            ("", Some(field)) => field.clone(),
            (path, None) => path.to_string(),
            (path, Some(field)) => format!("{}.{}", path, field),
        }
    }
}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid selector configuration at {}: {}",
            self.location(),
            self.kind
        )
    }
}

/// A value did not fit the shape its SelectedValue tag requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} selection: {reason}")]
pub struct InvalidSelectedShape {
    pub kind: SelectedKind,
    pub reason: String,
}

impl InvalidSelectedShape {
    pub fn new(kind: SelectedKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Categories of evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    SelectorSyntax,
    Cardinality,
    InvalidShape,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::SelectorSyntax => "selector syntax error",
            ErrorCode::Cardinality => "selector cardinality error",
            ErrorCode::InvalidShape => "invalid selected shape",
        };
        write!(f, "{}", s)
    }
}

/// A definition failed while being evaluated against a document.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub struct EvalError {
    pub code: ErrorCode,
    /// Dotted field path, e.g. `items[1].price`.
    pub path: String,
    pub selector: String,
    pub message: String,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}: {}",
            self.path, self.selector, self.code, self.message
        )
    }
}

impl EvalError {
    /// The query expression could not be compiled.
    pub fn selector_syntax(
        path: impl Into<String>,
        selector: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: ErrorCode::SelectorSyntax,
            path: path.into(),
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// `expect_single` was set but the match count was not one.
    pub fn cardinality(path: impl Into<String>, selector: impl Into<String>, found: usize) -> Self {
        Self {
            code: ErrorCode::Cardinality,
            path: path.into(),
            selector: selector.into(),
            message: format!("expected exactly one match, found {}", found),
        }
    }

    /// A selected value had the wrong shape for the requested operation.
    pub fn invalid_shape(
        path: impl Into<String>,
        selector: impl Into<String>,
        source: InvalidSelectedShape,
    ) -> Self {
        Self {
            code: ErrorCode::InvalidShape,
            path: path.into(),
            selector: selector.into(),
            message: source.to_string(),
        }
    }

    /// Returns true if this is a SelectorSyntax error.
    pub fn is_selector_syntax(&self) -> bool {
        self.code == ErrorCode::SelectorSyntax
    }

    /// Returns true if this is a Cardinality error.
    pub fn is_cardinality(&self) -> bool {
        self.code == ErrorCode::Cardinality
    }

    /// Returns true if this is an InvalidShape error.
    pub fn is_invalid_shape(&self) -> bool {
        self.code == ErrorCode::InvalidShape
    }
}

/// Errors raised while fetching a page for evaluation.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{url}: private network addresses are not allowed")]
    PrivateNetwork { url: String },

    #[error("{url}: DNS lookup failed: {source}")]
    Dns {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{url}: request failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url}: HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("{url}: content too large")]
    TooLarge { url: String },
}
