//! Script discovery heuristics.
//!
//! Applies the same sequence of scans a page-context probe would run: script
//! and link elements, raw-HTML attribute regexes, styled-element URLs,
//! `sourceMappingURL` comments, and bundler chunk names. All hits are unioned
//! and de-duplicated by identity key, preserving first-insertion order.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{PageSnapshot, ScriptRef};

static ATTR_JS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:src|href)=["']([^"']*?\.js)["']"#).unwrap());

// Deliberately stops at the first `.js`, so `app.js.map` yields `app.js`.
// This matches the probe behavior this scan was lifted from.
static SOURCE_MAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//[#@]\s*sourceMappingURL=(.+?\.js)").unwrap());

static CHUNK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:chunk|bundle|vendor|app)[^"']*\.js"#).unwrap());

static STYLE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(['"]?([^'")]+)['"]?\)"#).unwrap());

pub fn locate_scripts(page: &PageSnapshot) -> Vec<ScriptRef> {
    let mut found = Vec::new();
    let mut seen = HashSet::new();

    // 1. script elements: src URL, or the inline body when non-blank
    for script in &page.scripts {
        if script.has_src_attr {
            if let Some(src) = &script.src {
                push_unique(&mut found, &mut seen, ScriptRef::Url(src.clone()));
            }
        } else if !script.text.trim().is_empty() {
            push_unique(&mut found, &mut seen, ScriptRef::Inline(script.text.clone()));
        }
    }

    // 2. link elements whose resolved href ends in .js
    for href in &page.link_hrefs {
        if href.ends_with(".js") {
            push_unique(&mut found, &mut seen, ScriptRef::Url(href.clone()));
        }
    }

    // 3. src=/href= attributes anywhere in the serialized HTML
    for capture in ATTR_JS_RE.captures_iter(&page.html) {
        if let Some(url) = page.resolve(&capture[1]) {
            push_unique(&mut found, &mut seen, ScriptRef::Url(url));
        }
    }

    // 4. background-image style values referencing .js
    for style in &page.style_values {
        if !style.contains(".js") {
            continue;
        }
        for capture in STYLE_URL_RE.captures_iter(style) {
            let candidate = &capture[1];
            if !candidate.contains(".js") {
                continue;
            }
            if let Some(url) = page.resolve(candidate) {
                push_unique(&mut found, &mut seen, ScriptRef::Url(url));
            }
        }
    }

    // 5. sourceMappingURL comments in inline script bodies
    for script in &page.scripts {
        for capture in SOURCE_MAP_RE.captures_iter(&script.text) {
            if let Some(url) = page.resolve(&capture[1]) {
                push_unique(&mut found, &mut seen, ScriptRef::Url(url));
            }
        }
    }

    // 6. bundler chunk names anywhere in the HTML
    for hit in CHUNK_RE.find_iter(&page.html) {
        if let Some(url) = page.resolve(hit.as_str()) {
            push_unique(&mut found, &mut seen, ScriptRef::Url(url));
        }
    }

    found
}

fn push_unique(found: &mut Vec<ScriptRef>, seen: &mut HashSet<String>, script: ScriptRef) {
    if seen.insert(script.identity().to_string()) {
        found.push(script);
    }
}
