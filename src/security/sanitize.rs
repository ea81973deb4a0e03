//! Markup removal for untrusted code text.
//!
//! # Responsibilities
//! - Drop executable elements (`<script>`, `<style>`, `<iframe>`, ...) with their content
//! - Drop HTML comments and tags carrying event handlers or `javascript:` URLs
//! - Drop other HTML element tags, keeping their inner text
//! - Leave code that merely uses angle brackets untouched
//!
//! # Design Decisions
//! - Only known HTML element names are treated as tags, so `List<String>`,
//!   `#include <stdio.h>` and `a < b` survive
//! - Opening tags glued to an identifier (`List<b>`) are read as generics,
//!   unless they carry an attribute value (`foo<img src=x>`)
//! - Attributes may be separated by `/` as well as whitespace (`<svg/onload=..>`)
//! - Passes repeat to a fixed point, which makes the function idempotent

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Elements removed together with everything between their open and close tags.
const BLOCK_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template",
];

/// Elements whose bare tags are removed wherever they appear.
const DANGEROUS_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "applet", "base",
    "form", "frame", "frameset", "link", "meta", "svg",
];

/// Ordinary HTML elements. `map`, `data`, `time` and `var` are left out
/// because they collide with C++ headers and identifiers.
const HTML_ELEMENTS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "center", "cite", "code", "col",
    "colgroup", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt", "em",
    "fieldset", "figcaption", "figure", "font", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "hr", "html", "i", "img", "input", "ins", "kbd", "label", "legend", "li",
    "main", "mark", "marquee", "menu", "meter", "nav", "ol", "optgroup", "p", "param", "picture",
    "pre", "progress", "q", "s", "samp", "section", "select", "small", "span", "strong", "sub",
    "summary", "sup", "table", "tbody", "td", "textarea", "tfoot", "th", "thead", "title", "tr",
    "track", "u", "ul", "video", "wbr",
];

/// One attribute, with or without a value.
const ATTR: &str =
    r#"[\s/]+[a-zA-Z_:][-a-zA-Z0-9_:.]*(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?"#;

/// One attribute that has a value.
const VALUED_ATTR: &str =
    r#"[\s/]+[a-zA-Z_:][-a-zA-Z0-9_:.]*\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+)"#;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static BLOCK: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = BLOCK_ELEMENTS
        .iter()
        .map(|tag| format!(r"<{tag}\b[^>]*>.*?</{tag}\s*>"))
        .collect();
    Regex::new(&format!("(?is){}", alternatives.join("|"))).unwrap()
});

static DANGEROUS_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)</?(?:{})(?:[\s/][^<>]*)?>",
        DANGEROUS_ELEMENTS.join("|")
    ))
    .unwrap()
});

static SCRIPTED_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)<[a-z][a-z0-9-]*[\s/][^<>]*?(?:\bon[a-z]+\s*=|javascript:|vbscript:)[^<>]*>",
    )
    .unwrap()
});

static CLOSING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</([a-zA-Z][a-zA-Z0-9]*)\s*>").unwrap());

static OPENING_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(^|[^\w])<([a-zA-Z][a-zA-Z0-9]*)(?:{ATTR})*\s*/?>")).unwrap()
});

/// Opening tag with at least one attribute value, wherever it starts.
static VALUED_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"<([a-zA-Z][a-zA-Z0-9]*)(?:{ATTR})*{VALUED_ATTR}(?:{ATTR})*\s*/?>"
    ))
    .unwrap()
});

fn is_html_element(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    HTML_ELEMENTS.contains(&lower.as_str())
}

/// Remove HTML markup from `raw`, leaving code content intact.
///
/// Never fails. `sanitize(sanitize(x)) == sanitize(x)` for every input.
pub fn sanitize(raw: &str) -> String {
    let mut current = strip_control_chars(raw);
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn sanitize_pass(input: &str) -> String {
    let text = COMMENT.replace_all(input, "");
    let text = BLOCK.replace_all(&text, "");
    let text = DANGEROUS_TAG.replace_all(&text, "");
    let text = SCRIPTED_TAG.replace_all(&text, "");
    let text = CLOSING_TAG.replace_all(&text, |caps: &Captures| {
        if is_html_element(&caps[1]) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    let text = OPENING_TAG.replace_all(&text, |caps: &Captures| {
        if is_html_element(&caps[2]) {
            caps[1].to_string()
        } else {
            caps[0].to_string()
        }
    });
    let text = VALUED_TAG.replace_all(&text, |caps: &Captures| {
        if is_html_element(&caps[1]) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    text.into_owned()
}

fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_code_untouched() {
        let samples = [
            "print('hello')",
            "if a < b and c > d:\n    pass",
            "List<String> names = new ArrayList<>();",
            "Map<String, List<Integer>> index;",
            "#include <stdio.h>\n#include <map>\n#include <vector>",
            "x = y >> 2; z = w << 1;",
            "const el = a <b && c> d;",
            "fn parse<'a, T: Into<String>>(s: &'a str) -> T",
        ];
        for sample in samples {
            assert_eq!(sanitize(sample), sample, "altered: {}", sample);
        }
    }

    #[test]
    fn test_removes_script_blocks_with_content() {
        assert_eq!(
            sanitize("x = 1\n<script type=\"text/javascript\">alert('pwned')</script>\ny = 2"),
            "x = 1\n\ny = 2"
        );
        assert_eq!(sanitize("<STYLE>body { color: red }</STYLE>ok"), "ok");
        assert_eq!(sanitize("<iframe src=\"https://evil\"></iframe>"), "");
    }

    #[test]
    fn test_strips_tags_keeps_text() {
        assert_eq!(
            sanitize("<p>Hello <b>world</b></p>\n<div class=\"x\">code()</div>"),
            "Hello world\ncode()"
        );
        assert_eq!(sanitize("<!-- hidden -->visible"), "visible");
        assert_eq!(sanitize("line\n<br/>break"), "line\nbreak");
    }

    #[test]
    fn test_removes_event_handler_tags_anywhere() {
        assert_eq!(sanitize("x<img src=x onerror=alert(1)>y"), "xy");
        assert_eq!(
            sanitize("<a href=\"javascript:alert(1)\">click</a>"),
            "click"
        );
        assert_eq!(sanitize("foo<script>alert(1)"), "fooalert(1)");
    }

    #[test]
    fn test_removes_slash_separated_attributes() {
        assert_eq!(sanitize("<script/src=\"//evil.example/x.js\">"), "");
        assert_eq!(sanitize("a<img/src=x/onerror=alert(1)>b"), "ab");
        assert_eq!(sanitize("<svg/onload=alert(1)>"), "");
        assert_eq!(sanitize("x<iframe src=//evil>"), "x");
        assert_eq!(
            sanitize("<a/href=\"javascript:alert(1)\">click</a>"),
            "click"
        );
    }

    #[test]
    fn test_glued_tag_with_attribute_value_is_removed() {
        assert_eq!(sanitize("foo<img src=x>"), "foo");
        assert_eq!(sanitize("say<a href='/x'>hi</a>"), "sayhi");
        assert_eq!(sanitize("Iterator<Item = u8>"), "Iterator<Item = u8>");
        assert_eq!(sanitize("List<b> x"), "List<b> x");
    }

    #[test]
    fn test_nested_evasion_is_fully_removed() {
        let out = sanitize("<scr<script>x</script>ipt>alert(1)</script>");
        assert!(!out.to_lowercase().contains("<script"), "got {}", out);
    }

    #[test]
    fn test_strips_control_characters() {
        assert_eq!(sanitize("a\u{0}b\u{7}c\td\n"), "abc\td\n");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "plain text",
            "<b><i>nested</i></b>",
            "<scr<script></script>ipt>alert(1)</scr</script>ipt>",
            "<<b>b>bold</b>",
            "<!-<!-- x -->- y -->",
            "<div onclick=\"go()\"><span>s</span></div>",
            "a < b > c <p> d </p>",
            "List<b> vs <b>List",
            "<ifr<iframe></iframe>ame src=x></iframe>",
            "<script/src=\"//evil.example/x.js\">",
            "<img/src=x/onerror=alert(1)>",
            "<svg/onload=alert(1)>",
            "foo<img src=x>",
            "x<iframe src=//evil>",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", input);
        }
    }
}
