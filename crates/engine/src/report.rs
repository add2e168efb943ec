// ABOUTME: Renders a selector configuration's matches as a sectioned plain-text report.
// ABOUTME: One "### name ###" section per top-level definition, with optional note and per-element blocks.

//! Sectioned text report.
//!
//! The report is meant for handing page content to a reader (human or
//! language model) rather than to code:
//!
//! ```text
//! ### Short Description ###
//! Note: Shown next to the product image.
//!
//! A compact fume hood.
//!
//! ### Model Names ###
//!
//! --- Element 1 ---
//! AS-100
//!
//! --- Element 2 ---
//! AS-200
//! ```
//!
//! Definitions whose matches are all empty produce no section.

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::error::EvalError;
use crate::options::{EvalMode, ReportOptions};
use crate::result::Extracted;
use crate::selectors::definition::{SelectorConfiguration, SelectorDefinition};
use crate::selectors::select::{element_lines, element_text, Capture};
use crate::selectors::selected::SelectedValue;

/// Output when no definition produced any content.
pub const NO_CONTENT: &str = "No content found for the provided selectors.";

/// Renders every top-level definition of `config` against `doc`.
///
/// A definition that fails to evaluate is logged and left out in lenient
/// mode; in strict mode its error is returned instead of a report.
pub fn render_report(
    engine: &Engine,
    config: &SelectorConfiguration,
    doc: &Html,
    opts: &ReportOptions,
) -> Result<String, EvalError> {
    let mut sections = Vec::new();
    for def in &config.definitions {
        match render_section(engine, def, doc, opts) {
            Ok(Some(section)) => sections.push(section),
            Ok(None) => {}
            Err(err) => skip_or_fail(engine, err)?,
        }
    }

    if sections.is_empty() {
        Ok(NO_CONTENT.to_string())
    } else {
        Ok(sections.join("\n\n"))
    }
}

fn skip_or_fail(engine: &Engine, err: EvalError) -> Result<(), EvalError> {
    if engine.options().mode == EvalMode::Strict {
        return Err(err);
    }
    warn!(field = %err.path, selector = %err.selector, error = %err.message, "left out of report");
    Ok(())
}

fn render_section(
    engine: &Engine,
    def: &SelectorDefinition,
    doc: &Html,
    opts: &ReportOptions,
) -> Result<Option<String>, EvalError> {
    let elements = engine.select_document(def, doc)?.flatten();
    let numbered = elements.len() > 1;

    let mut blocks = Vec::new();
    for (i, el) in elements.nodes().iter().enumerate() {
        let Some(block) = element_block(engine, def, *el, opts)? else {
            continue;
        };
        if numbered {
            // numbered by match position, so skipped empties leave gaps
            blocks.push(format!("--- Element {} ---\n{}", i + 1, block));
        } else {
            blocks.push(block);
        }
    }
    debug!(name = %def.name, matches = elements.len(), blocks = blocks.len(), "report section");
    if blocks.is_empty() {
        return Ok(None);
    }

    let mut header = vec![format!("### {} ###", def.name)];
    if let Some(note) = def.note.as_deref().filter(|n| !n.trim().is_empty()) {
        header.push(format!("Note: {}", note));
    }
    Ok(Some(format!("{}\n\n{}", header.join("\n"), blocks.join("\n\n"))))
}

/// Content of one matched element; `None` when it is empty.
fn element_block(
    engine: &Engine,
    def: &SelectorDefinition,
    el: ElementRef<'_>,
    opts: &ReportOptions,
) -> Result<Option<String>, EvalError> {
    if !def.is_leaf() {
        return child_lines(engine, def, el);
    }
    let block = match Capture::for_definition(def) {
        Capture::Text if opts.keep_newlines => Some(element_lines(el)),
        Capture::Text => Some(element_text(el)),
        other => other.apply(el),
    };
    Ok(block.filter(|block| !block.is_empty()))
}

/// `name: value` lines for each child evaluated under `el`.
fn child_lines(
    engine: &Engine,
    def: &SelectorDefinition,
    el: ElementRef<'_>,
) -> Result<Option<String>, EvalError> {
    let scope = SelectedValue::single(el);
    let mut lines = Vec::new();
    for child in &def.children {
        match engine.evaluate_definition(child, &scope) {
            Ok(Extracted::Text(text)) if text.is_empty() => {}
            Ok(Extracted::Text(text)) => lines.push(format!("{}: {}", child.name, text)),
            Ok(Extracted::List(items)) if items.is_empty() => {}
            Ok(other) => lines.push(format!("{}: {}", child.name, other.to_json())),
            Err(err) => skip_or_fail(engine, err)?,
        }
    }
    Ok((!lines.is_empty()).then(|| lines.join("\n")))
}
