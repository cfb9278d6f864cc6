//! Name heuristics shared by classification, consistency checks and
//! similarity scoring.

use std::sync::OnceLock;

use regex::Regex;

/// Names that mark a reusable component as UI chrome rather than an icon.
const NON_ICON_COMPONENT_WORDS: &[&str] = &[
    "button", "btn", "modal", "navbar", "header", "footer", "sidebar", "form", "dialog", "banner",
];

/// Wider vocabulary for instances, which are far more often UI widgets.
const UI_COMPONENT_WORDS: &[&str] = &[
    "button", "btn", "modal", "navbar", "nav", "header", "footer", "sidebar", "form", "dialog",
    "banner", "checkbox", "radio", "toggle", "switch", "tab", "tabs", "badge", "chip", "tooltip",
    "input", "textfield", "textarea", "dropdown", "select", "card", "avatar", "slider", "stepper",
    "pagination", "breadcrumb", "toast", "snackbar", "alert", "table", "accordion",
];

const ICON_MARKERS: &[&str] = &["icon", "icons", "ico", "ic", "glyph", "symbol", "pictogram"];

/// Subjects icon sets draw over and over.
const ICON_SUBJECTS: &[&str] = &[
    "arrow", "chevron", "caret", "close", "check", "checkmark", "plus", "minus", "add", "remove",
    "search", "menu", "hamburger", "home", "user", "profile", "star", "heart", "settings", "gear",
    "cog", "bell", "notification", "trash", "delete", "edit", "pencil", "share", "download",
    "upload", "info", "warning", "error", "help", "question", "calendar", "clock", "mail",
    "email", "phone", "lock", "unlock", "eye", "filter", "sort", "refresh", "sync", "link",
    "external", "paste", "play", "pause", "stop", "camera", "image", "folder", "file",
    "cart", "bag", "logo", "location", "pin", "map", "globe", "cloud", "sun", "moon", "bookmark",
    "flag", "tag", "more", "dots", "kebab", "ellipsis", "expand", "collapse", "logout", "login",
];

/// Split a layer name into lowercase word tokens.
///
/// Breaks on separators, lower-to-upper camel case transitions and
/// letter/digit boundaries: `"SubmitButton2"` becomes `submit`, `button`, `2`.
pub fn tokens(name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;
    for ch in name.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        if let Some(p) = prev {
            let camel = p.is_lowercase() && ch.is_uppercase();
            let digit_edge = p.is_ascii_digit() != ch.is_ascii_digit();
            if (camel || digit_edge) && !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        }
        current.extend(ch.to_lowercase());
        prev = Some(ch);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn any_token_in(name: &str, vocabulary: &[&str]) -> bool {
    tokens(name).iter().any(|t| vocabulary.contains(&t.as_str()))
}

fn copy_suffix() -> &'static Regex {
    static COPY_RE: OnceLock<Regex> = OnceLock::new();
    COPY_RE.get_or_init(|| {
        Regex::new(r"(?i)[\s_\-]*copy(?:[\s_\-]*\d+)?\s*$").expect("valid regex")
    })
}

/// Drop a trailing `copy` / `copy 3` left behind by duplicating layers.
pub fn strip_copy_suffix(name: &str) -> &str {
    match copy_suffix().find(name) {
        Some(m) if m.start() > 0 => name[..m.start()].trim_end(),
        _ => name.trim(),
    }
}

/// Pattern used to spot the same icon under cosmetic renames: copy suffix,
/// separators, digits and case are all discarded.
pub fn normalized_pattern(name: &str) -> String {
    strip_copy_suffix(name)
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Key used for edit-distance comparison: like [`normalized_pattern`] but
/// keeps digits, since `arrow-1` and `arrow-2` are usually different glyphs.
pub fn comparison_key(name: &str) -> String {
    strip_copy_suffix(name)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split `"library/name"` into its library prefix and remainder.
///
/// The prefix must be a single word, so `"Material Icons/home"` is not
/// treated as a library reference.
pub fn split_library(name: &str) -> Option<(&str, &str)> {
    let (prefix, rest) = name.split_once('/')?;
    let prefix = prefix.trim();
    let rest = rest.trim();
    if prefix.is_empty() || rest.is_empty() {
        return None;
    }
    if !prefix.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return None;
    }
    Some((prefix, rest))
}

pub fn has_library_prefix(name: &str) -> bool {
    split_library(name).is_some()
}

/// Explicit icon markers: `icon`, `ic_`, `glyph`, …
pub fn has_icon_marker(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    if lower.starts_with("ic_") || lower.starts_with("ic-") {
        return true;
    }
    any_token_in(name, ICON_MARKERS)
}

/// Icon markers or a common icon subject.
pub fn looks_like_icon_name(name: &str) -> bool {
    has_icon_marker(name) || any_token_in(name, ICON_SUBJECTS)
}

pub fn is_non_icon_component_name(name: &str) -> bool {
    any_token_in(name, NON_ICON_COMPONENT_WORDS)
}

pub fn is_ui_component_name(name: &str) -> bool {
    any_token_in(name, UI_COMPONENT_WORDS)
}

/// Layer names the editor generates when nobody renamed the layer.
pub fn is_default_layer_name(name: &str) -> bool {
    static DEFAULT_RE: OnceLock<Regex> = OnceLock::new();
    DEFAULT_RE
        .get_or_init(|| {
            Regex::new(
                r"^(Frame|Group|Vector|Rectangle|Ellipse|Line|Polygon|Star|Union|Subtract|Intersect|Exclude|Component|Instance)( \d+)?$",
            )
            .expect("valid regex")
        })
        .is_match(name.trim())
}

/// Identifier-shaped names: words of letters/digits joined by single separators.
pub fn is_well_formed_name(name: &str) -> bool {
    static IDENT_RE: OnceLock<Regex> = OnceLock::new();
    IDENT_RE
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z][A-Za-z0-9]*(?:(?:[-_/.]| / | )[A-Za-z0-9]+)*$")
                .expect("valid regex")
        })
        .is_match(name)
}

/// Classic two-row Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit-distance similarity in `[0, 1]`; two empty strings score 0.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_camel_case_and_separators() {
        assert_eq!(tokens("SubmitButton"), vec!["submit", "button"]);
        assert_eq!(tokens("home_icon2"), vec!["home", "icon", "2"]);
        assert_eq!(tokens("lucide/arrow-left"), vec!["lucide", "arrow", "left"]);
        assert!(tokens("  ").is_empty());
    }

    #[test]
    fn normalized_pattern_collapses_cosmetic_variants() {
        for name in ["home-icon", "home_icon2", "HomeIcon", "Home Icon copy 3", "home.icon copy"] {
            assert_eq!(normalized_pattern(name), "homeicon", "{name}");
        }
        assert_eq!(comparison_key("arrow-2 copy"), "arrow2");
    }

    #[test]
    fn copy_suffix_needs_a_stem() {
        assert_eq!(strip_copy_suffix("copy"), "copy");
        assert_eq!(strip_copy_suffix("star copy 2"), "star");
    }

    #[test]
    fn library_prefix_detection() {
        assert_eq!(split_library("lucide/home"), Some(("lucide", "home")));
        assert_eq!(split_library("Material Icons/home"), None);
        assert_eq!(split_library("/home"), None);
        assert_eq!(split_library("home"), None);
    }

    #[test]
    fn vocabulary_uses_whole_tokens() {
        assert!(is_ui_component_name("SubmitButton"));
        assert!(!is_ui_component_name("Tablet"));
        assert!(is_non_icon_component_name("Modal/Header"));
        assert!(has_icon_marker("ic_close"));
        assert!(has_icon_marker("Icon/arrow"));
        assert!(looks_like_icon_name("chevron-down"));
        assert!(!looks_like_icon_name("Hero section"));
    }

    #[test]
    fn default_and_well_formed_names() {
        assert!(is_default_layer_name("Frame 12"));
        assert!(is_default_layer_name("Vector"));
        assert!(!is_default_layer_name("Frame icon"));
        assert!(is_well_formed_name("arrow-left"));
        assert!(is_well_formed_name("Icon / Arrow"));
        assert!(!is_well_formed_name("arrow--left"));
        assert!(!is_well_formed_name("_hidden"));
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(edit_similarity("", ""), 0.0);
        assert_eq!(edit_similarity("home", "home"), 1.0);
    }
}
