// ABOUTME: Selector definition and configuration data models.
// ABOUTME: A configuration is an ordered tree of named CSS selectors with extraction flags.

//! Declarative selector definitions.
//!
//! A [`SelectorConfiguration`] is an ordered list of [`SelectorDefinition`]s.
//! Each definition names a CSS selector and says how its matches are turned
//! into output: leaves extract text, markup or an attribute, while
//! definitions with children produce one record per matched element.
//!
//! Values of these types are normally produced by
//! [`crate::selectors::loader`], which validates them. The builder methods
//! here are for assembling definitions in code.

use serde::Serialize;

fn is_false(b: &bool) -> bool {
    !*b
}

/// One named extraction rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorDefinition {
    /// CSS selector evaluated against each context node's descendants.
    pub selector: String,
    /// Output key; unique among siblings.
    pub name: String,
    /// Free-text description with no effect on evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Keep the matched element's outer markup instead of its text.
    #[serde(skip_serializing_if = "is_false")]
    pub preserve_html: bool,
    /// Require exactly one match per context node.
    #[serde(skip_serializing_if = "is_false")]
    pub expect_single: bool,
    /// Extract this attribute instead of text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
    /// Evaluated against every element this selector matches.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SelectorDefinition>,
}

impl SelectorDefinition {
    pub fn new(selector: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            name: name.into(),
            note: None,
            preserve_html: false,
            expect_single: false,
            attr: None,
            children: Vec::new(),
        }
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn preserve_html(mut self, preserve: bool) -> Self {
        self.preserve_html = preserve;
        self
    }

    pub fn expect_single(mut self, expect: bool) -> Self {
        self.expect_single = expect;
        self
    }

    pub fn attr(mut self, attr: impl Into<String>) -> Self {
        self.attr = Some(attr.into());
        self
    }

    pub fn child(mut self, child: SelectorDefinition) -> Self {
        self.children.push(child);
        self
    }

    /// True when this definition extracts a scalar rather than records.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// An ordered set of top-level definitions forming one extraction schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SelectorConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub definitions: Vec<SelectorDefinition>,
}

impl SelectorConfiguration {
    pub fn new(definitions: Vec<SelectorDefinition>) -> Self {
        Self {
            definitions,
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Every selector string in the tree, depth first.
    pub fn selectors(&self) -> Vec<&str> {
        fn walk<'a>(defs: &'a [SelectorDefinition], out: &mut Vec<&'a str>) {
            for def in defs {
                out.push(&def.selector);
                walk(&def.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.definitions, &mut out);
        out
    }

    fn has_metadata(&self) -> bool {
        self.name.is_some() || self.description.is_some()
    }

    /// YAML in the form the loader reads back: a plain sequence, or a
    /// mapping with `name`/`description`/`definitions` when metadata is set.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        if self.has_metadata() {
            serde_yaml::to_string(self)
        } else {
            serde_yaml::to_string(&self.definitions)
        }
    }

    /// Pretty JSON, same shape rules as [`SelectorConfiguration::to_yaml`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        if self.has_metadata() {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string_pretty(&self.definitions)
        }
    }
}
