// ABOUTME: SelectedValue, the tagged result of applying a selector: SINGLE node, MULTIPLE nodes, or a VALUE.
// ABOUTME: Constructors validate each tag's shape so a scalar can never be queried like a node.

use std::fmt;

use scraper::ElementRef;
use serde::Serialize;

use crate::error::InvalidSelectedShape;
use crate::selectors::select::Capture;

/// The tag of a [`SelectedValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectedKind {
    Single,
    Multiple,
    Value,
}

impl fmt::Display for SelectedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectedKind::Single => "SINGLE",
            SelectedKind::Multiple => "MULTIPLE",
            SelectedKind::Value => "VALUE",
        };
        write!(f, "{}", s)
    }
}

/// Untyped input offered to [`SelectedValue::new`].
#[derive(Debug, Clone)]
pub enum Candidate<'a> {
    Node(ElementRef<'a>),
    Nodes(Vec<ElementRef<'a>>),
    Text(String),
}

impl Candidate<'_> {
    fn describe(&self) -> String {
        match self {
            Candidate::Node(_) => "a single node".to_string(),
            Candidate::Nodes(nodes) => format!("a list of {} nodes", nodes.len()),
            Candidate::Text(text) => format!("the scalar {:?}", truncate(text, 40)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Repr<'a> {
    Single(ElementRef<'a>),
    Multiple(Vec<ElementRef<'a>>),
    Value(String),
}

/// Result of applying a selector.
///
/// * `SINGLE` wraps exactly one element node.
/// * `MULTIPLE` wraps zero or more element nodes in document order.
/// * `VALUE` wraps a string produced by terminal extraction from a
///   `SINGLE` or `MULTIPLE`; it cannot be queried further.
///
/// Values are immutable once built and compare by tag and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedValue<'a> {
    repr: Repr<'a>,
}

impl<'a> SelectedValue<'a> {
    /// A `SINGLE` around one element.
    pub fn single(node: ElementRef<'a>) -> Self {
        Self {
            repr: Repr::Single(node),
        }
    }

    /// A `MULTIPLE` around elements in the order given.
    pub fn multiple(nodes: Vec<ElementRef<'a>>) -> Self {
        Self {
            repr: Repr::Multiple(nodes),
        }
    }

    /// Builds a value of the requested kind, checking that `candidate` fits it.
    ///
    /// `VALUE` can only come from terminal extraction, so asking for one here
    /// always fails; use [`SelectedValue::extract`] instead.
    pub fn new(kind: SelectedKind, candidate: Candidate<'a>) -> Result<Self, InvalidSelectedShape> {
        match (kind, candidate) {
            (SelectedKind::Single, Candidate::Node(node)) => Ok(Self::single(node)),
            (SelectedKind::Multiple, Candidate::Nodes(nodes)) => Ok(Self::multiple(nodes)),
            (SelectedKind::Value, other) => Err(InvalidSelectedShape::new(
                kind,
                format!(
                    "values are only produced by extraction from a SINGLE or MULTIPLE, got {}",
                    other.describe()
                ),
            )),
            (SelectedKind::Single, other) => Err(InvalidSelectedShape::new(
                kind,
                format!("expected exactly one node, got {}", other.describe()),
            )),
            (SelectedKind::Multiple, other) => Err(InvalidSelectedShape::new(
                kind,
                format!("expected a list of nodes, got {}", other.describe()),
            )),
        }
    }

    /// Terminal extraction: turns a `SINGLE` or `MULTIPLE` into a `VALUE`.
    ///
    /// A `MULTIPLE` yields the captures of its nodes joined with `separator`;
    /// nodes that capture nothing are skipped. Extracting from a `VALUE` fails.
    pub fn extract(
        source: &SelectedValue<'a>,
        capture: &Capture,
        separator: &str,
    ) -> Result<Self, InvalidSelectedShape> {
        let text = match &source.repr {
            Repr::Single(node) => capture.apply(*node).unwrap_or_default(),
            Repr::Multiple(nodes) => nodes
                .iter()
                .filter_map(|node| capture.apply(*node))
                .collect::<Vec<_>>()
                .join(separator),
            Repr::Value(_) => {
                return Err(InvalidSelectedShape::new(
                    SelectedKind::Value,
                    "a VALUE is terminal and cannot be extracted from again",
                ))
            }
        };
        Ok(Self {
            repr: Repr::Value(text),
        })
    }

    pub fn kind(&self) -> SelectedKind {
        match self.repr {
            Repr::Single(_) => SelectedKind::Single,
            Repr::Multiple(_) => SelectedKind::Multiple,
            Repr::Value(_) => SelectedKind::Value,
        }
    }

    /// The wrapped node of a `SINGLE`.
    pub fn as_node(&self) -> Option<ElementRef<'a>> {
        match self.repr {
            Repr::Single(node) => Some(node),
            _ => None,
        }
    }

    /// The nodes a query would run against: one for `SINGLE`, all for
    /// `MULTIPLE`, none for `VALUE`.
    pub fn nodes(&self) -> &[ElementRef<'a>] {
        match &self.repr {
            Repr::Single(node) => std::slice::from_ref(node),
            Repr::Multiple(nodes) => nodes,
            Repr::Value(_) => &[],
        }
    }

    /// The wrapped string of a `VALUE`.
    pub fn as_value(&self) -> Option<&str> {
        match &self.repr {
            Repr::Value(text) => Some(text),
            _ => None,
        }
    }

    /// Consumes a `VALUE`, returning its string.
    pub fn into_value(self) -> Option<String> {
        match self.repr {
            Repr::Value(text) => Some(text),
            _ => None,
        }
    }

    /// Number of wrapped nodes; a `VALUE` counts as one.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Single(_) | Repr::Value(_) => 1,
            Repr::Multiple(nodes) => nodes.len(),
        }
    }

    /// True only for a `MULTIPLE` with no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether further selectors may run against this value.
    pub fn is_queryable(&self) -> bool {
        !matches!(self.repr, Repr::Value(_))
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

impl fmt::Display for SelectedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Single(node) => write!(f, "Selected(SINGLE, {})", truncate(&node.html(), 100)),
            Repr::Multiple(nodes) => write!(f, "Selected(MULTIPLE, {} nodes)", nodes.len()),
            Repr::Value(text) => write!(f, "Selected(VALUE, {:?})", truncate(text, 100)),
        }
    }
}
