// ABOUTME: Process-wide cache of compiled scraper selectors keyed by their source text.
// ABOUTME: The loader warms it while validating; evaluation reads compiled selectors from it.

//! Selector caching.
//!
//! Parsing a CSS selector costs more than matching it against a small
//! subtree, and the same configuration is usually evaluated against many
//! pages. Only successful compilations are cached, and the cache holds at
//! most [`MAX_CACHED`] selectors. Once full, new selectors are compiled on
//! every use instead of being stored.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::Selector;

/// Upper bound on the number of cached selectors.
pub const MAX_CACHED: usize = 4096;

static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Selector>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn compile(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| e.to_string())
}

/// Stores `selector` unless the cache already holds `limit` entries.
/// Returns the cached selector for `css`, which may have been inserted by
/// another thread first.
fn remember(
    cache: &mut HashMap<String, Selector>,
    css: &str,
    selector: Selector,
    limit: usize,
) -> Selector {
    if let Some(existing) = cache.get(css) {
        return existing.clone();
    }
    if cache.len() < limit {
        cache.insert(css.to_string(), selector.clone());
    }
    selector
}

/// Gets or compiles a CSS selector, caching it on success.
///
/// Returns the parser's message when `css` is not a valid selector.
pub fn get_or_compile(css: &str) -> Result<Selector, String> {
    {
        let cache = SELECTOR_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(css) {
            return Ok(cached.clone());
        }
    }

    let selector = compile(css)?;
    let mut cache = SELECTOR_CACHE.write().unwrap_or_else(|e| e.into_inner());
    Ok(remember(&mut cache, css, selector, MAX_CACHED))
}

#[cfg(test)]
fn is_cached(css: &str) -> bool {
    SELECTOR_CACHE
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .contains_key(css)
}
