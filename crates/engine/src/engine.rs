// ABOUTME: The Engine evaluates selector configurations against parsed HTML documents.
// ABOUTME: Walks the definition tree, narrowing the context to each matched node before recursing.

//! Evaluation engine.
//!
//! Shape policy, decided per definition rather than per match count:
//!
//! | definition                 | output                                  |
//! |----------------------------|-----------------------------------------|
//! | leaf                       | string (multiple matches joined)        |
//! | children                   | list of records, one per match          |
//! | children + `expect_single` | one record                              |
//!
//! Matching nothing is not an error: a leaf yields `""` and a definition
//! with children yields `[]`. With `expect_single`, any count other than one
//! is a cardinality error.

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::error::{EvalError, InvalidSelectedShape};
use crate::options::{EngineBuilder, EvalMode, EvalOptions};
use crate::result::{Extracted, Extraction, Record};
use crate::selectors::compiled::get_or_compile;
use crate::selectors::definition::{SelectorConfiguration, SelectorDefinition};
use crate::selectors::select::{query, query_inclusive, Capture};
use crate::selectors::selected::{SelectedKind, SelectedValue};

/// The per-parent results of applying one selector to a context.
///
/// A `SINGLE` context gives one group, a `MULTIPLE` context one group per
/// node in input order. Each group is a `MULTIPLE` of the parent's matches,
/// or a `SINGLE` when the definition expects exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matches<'a> {
    groups: Vec<SelectedValue<'a>>,
}

impl<'a> Matches<'a> {
    /// Results grouped by the parent they were found under.
    pub fn groups(&self) -> &[SelectedValue<'a>] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<SelectedValue<'a>> {
        self.groups
    }

    /// All matches concatenated in parent order, as one `MULTIPLE`.
    pub fn flatten(self) -> SelectedValue<'a> {
        let nodes = self
            .groups
            .iter()
            .flat_map(|group| group.nodes().iter().copied())
            .collect();
        SelectedValue::multiple(nodes)
    }

    /// Total number of matched nodes across groups.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|group| group.nodes().len()).sum()
    }
}

/// Evaluates selector configurations. Holds no per-document state, so one
/// engine can serve any number of documents.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    opts: EvalOptions,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn new(opts: EvalOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &EvalOptions {
        &self.opts
    }

    /// Applies one definition's selector to `context` without extracting.
    pub fn select<'a>(
        &self,
        def: &SelectorDefinition,
        context: &SelectedValue<'a>,
    ) -> Result<Matches<'a>, EvalError> {
        self.select_at(def, context, &def.name, false)
    }

    /// Applies a top-level definition to a document. Unlike [`Engine::select`],
    /// the root element itself may match.
    pub fn select_document<'a>(
        &self,
        def: &SelectorDefinition,
        doc: &'a Html,
    ) -> Result<Matches<'a>, EvalError> {
        self.select_at(def, &SelectedValue::single(doc.root_element()), &def.name, true)
    }

    fn select_at<'a>(
        &self,
        def: &SelectorDefinition,
        context: &SelectedValue<'a>,
        path: &str,
        inclusive: bool,
    ) -> Result<Matches<'a>, EvalError> {
        if !context.is_queryable() {
            return Err(EvalError::invalid_shape(
                path,
                &def.selector,
                InvalidSelectedShape::new(
                    SelectedKind::Value,
                    "a VALUE cannot be used as a query context",
                ),
            ));
        }
        let selector = get_or_compile(&def.selector)
            .map_err(|msg| EvalError::selector_syntax(path, &def.selector, msg))?;

        let mut groups = Vec::with_capacity(context.nodes().len());
        for parent in context.nodes() {
            let found = if inclusive {
                query_inclusive(*parent, &selector)
            } else {
                query(*parent, &selector)
            };
            if def.expect_single {
                match found.as_slice() {
                    [only] => groups.push(SelectedValue::single(*only)),
                    _ => return Err(EvalError::cardinality(path, &def.selector, found.len())),
                }
            } else {
                groups.push(SelectedValue::multiple(found));
            }
        }
        Ok(Matches { groups })
    }

    /// Evaluates every top-level definition against the whole document,
    /// root element included.
    pub fn evaluate(
        &self,
        config: &SelectorConfiguration,
        doc: &Html,
    ) -> Result<Extraction, EvalError> {
        self.evaluate_scope(config, doc.root_element(), true)
    }

    /// Evaluates every top-level definition against the descendants of `scope`.
    ///
    /// Lenient mode records a failing definition in `errors` and carries on;
    /// strict mode returns its error.
    pub fn evaluate_in(
        &self,
        config: &SelectorConfiguration,
        scope: ElementRef<'_>,
    ) -> Result<Extraction, EvalError> {
        self.evaluate_scope(config, scope, false)
    }

    fn evaluate_scope(
        &self,
        config: &SelectorConfiguration,
        scope: ElementRef<'_>,
        inclusive: bool,
    ) -> Result<Extraction, EvalError> {
        let mut extraction = Extraction::default();
        for def in &config.definitions {
            match self.field(def, scope, &def.name, inclusive) {
                Ok(value) => extraction.fields.insert(def.name.clone(), value),
                Err(err) if self.opts.mode == EvalMode::Lenient => {
                    warn!(field = %err.path, selector = %err.selector, error = %err.message, "selector failed");
                    extraction.errors.push(err);
                }
                Err(err) => return Err(err),
            }
        }
        debug!(
            fields = extraction.fields.len(),
            errors = extraction.errors.len(),
            "configuration evaluated"
        );
        Ok(extraction)
    }

    /// Evaluates a single definition against any queryable context.
    ///
    /// A `SINGLE` context gives that definition's output directly; a
    /// `MULTIPLE` context gives a list with one output per context node.
    pub fn evaluate_definition(
        &self,
        def: &SelectorDefinition,
        context: &SelectedValue<'_>,
    ) -> Result<Extracted, EvalError> {
        match context.kind() {
            SelectedKind::Single => match context.as_node() {
                Some(node) => self.field(def, node, &def.name, false),
                None => Err(EvalError::invalid_shape(
                    &def.name,
                    &def.selector,
                    InvalidSelectedShape::new(SelectedKind::Single, "no node"),
                )),
            },
            SelectedKind::Multiple => context
                .nodes()
                .iter()
                .enumerate()
                .map(|(i, node)| self.field(def, *node, &format!("{}[{}]", def.name, i), false))
                .collect::<Result<Vec<_>, _>>()
                .map(Extracted::List),
            SelectedKind::Value => Err(EvalError::invalid_shape(
                &def.name,
                &def.selector,
                InvalidSelectedShape::new(
                    SelectedKind::Value,
                    "a VALUE cannot be used as a query context",
                ),
            )),
        }
    }

    /// One definition evaluated under one scope node.
    fn field(
        &self,
        def: &SelectorDefinition,
        scope: ElementRef<'_>,
        path: &str,
        inclusive: bool,
    ) -> Result<Extracted, EvalError> {
        let matched = self
            .select_at(def, &SelectedValue::single(scope), path, inclusive)?
            .into_groups()
            .pop()
            .ok_or_else(|| {
                EvalError::invalid_shape(
                    path,
                    &def.selector,
                    InvalidSelectedShape::new(SelectedKind::Multiple, "no result group"),
                )
            })?;
        debug!(field = %path, selector = %def.selector, matches = matched.len(), "selected");

        if def.is_leaf() {
            let value =
                SelectedValue::extract(&matched, &Capture::for_definition(def), &self.opts.value_separator)
                    .map_err(|e| EvalError::invalid_shape(path, &def.selector, e))?;
            return Ok(Extracted::Text(value.into_value().unwrap_or_default()));
        }

        if def.expect_single {
            return Ok(Extracted::Record(self.record(&def.children, &matched, path)?));
        }

        let mut records = Vec::with_capacity(matched.nodes().len());
        for (i, node) in matched.nodes().iter().enumerate() {
            let item = SelectedValue::single(*node);
            let item_path = format!("{}[{}]", path, i);
            records.push(Extracted::Record(self.record(&def.children, &item, &item_path)?));
        }
        Ok(Extracted::List(records))
    }

    /// Children of one matched node, keyed by name.
    fn record(
        &self,
        children: &[SelectorDefinition],
        item: &SelectedValue<'_>,
        path: &str,
    ) -> Result<Record, EvalError> {
        let node = item.as_node().ok_or_else(|| {
            EvalError::invalid_shape(
                path,
                "",
                InvalidSelectedShape::new(item.kind(), "records are built from a single node"),
            )
        })?;
        let mut record = Record::new();
        for child in children {
            let child_path = format!("{}.{}", path, child.name);
            record.insert(child.name.clone(), self.field(child, node, &child_path, false)?);
        }
        Ok(record)
    }
}
