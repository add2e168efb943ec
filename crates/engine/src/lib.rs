// ABOUTME: Main library entry point for the yamscrape selector evaluation engine.
// ABOUTME: Re-exports the public API: loader functions, definitions, SelectedValue, Engine, results and errors.

//! yamscrape - declarative CSS selector extraction.
//!
//! A [`SelectorConfiguration`] describes named CSS selectors, optionally
//! nested. The [`Engine`] applies it to a parsed HTML document and returns
//! an ordered tree of extracted values.
//!
//! # Example
//!
//! ```
//! use scraper::Html;
//! use yamscrape_engine::{load, Engine};
//!
//! let config = load(r#"
//! - selector: ".item"
//!   name: items
//!   children:
//!     - selector: span.price
//!       name: price
//! "#).unwrap();
//!
//! let doc = Html::parse_document(
//!     r#"<div class="item"><span class="price">$5</span></div>"#,
//! );
//! let extraction = Engine::default().evaluate(&config, &doc).unwrap();
//! assert_eq!(
//!     serde_json::to_string(&extraction.fields).unwrap(),
//!     r#"{"items":[{"price":"$5"}]}"#
//! );
//! ```

pub mod engine;
pub mod error;
pub mod options;
pub mod record;
pub mod report;
pub mod resource;
pub mod result;
pub mod selectors;

pub use crate::engine::{Engine, Matches};
pub use crate::error::{
    ConfigErrorKind, ConfigParseError, ErrorCode, EvalError, FetchError, InvalidSelectedShape,
};
pub use crate::options::{EngineBuilder, EvalMode, EvalOptions, ReportOptions};
pub use crate::record::SelectorConfigRecord;
pub use crate::report::render_report;
pub use crate::resource::{decode_html, fetch, FetchOptions, FetchedPage};
pub use crate::result::{Extracted, Extraction, Record};
pub use crate::selectors::definition::{SelectorConfiguration, SelectorDefinition};
pub use crate::selectors::loader::{from_value, load, load_file, parse_str};
pub use crate::selectors::select::Capture;
pub use crate::selectors::selected::{Candidate, SelectedKind, SelectedValue};
