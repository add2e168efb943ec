// ABOUTME: Declarative selector model: definitions, loading, selected values and DOM query helpers.
// ABOUTME: The evaluation engine in crate::engine is built on these pieces.

//! Selector definitions and their building blocks.
//!
//! Submodules:
//! - `definition`: `SelectorDefinition` / `SelectorConfiguration` data models.
//! - `loader`: YAML/JSON loading with load-time validation.
//! - `selected`: the `SelectedValue` tagged result type.
//! - `select`: DOM query and terminal extraction helpers.
//! - `compiled`: shared cache of compiled CSS selectors.

pub mod compiled;
pub mod definition;
pub mod loader;
pub mod select;
pub mod selected;
