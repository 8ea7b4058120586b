//! Color tables shared by the classifier and the layout engine.
//!
//! Two fixed tables: a named-color map used to resolve color words from
//! commands, and the round-robin palette cycled when a command asks for
//! "random" or "different" colors. The palette order is part of the
//! deterministic contract — the Nth random color is always
//! `COLOR_PALETTE[N % len]`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// The fixed palette cycled for random/unspecified colors, in stable order.
pub const COLOR_PALETTE: &[&str] = &[
    "#EF4444", // red
    "#3B82F6", // blue
    "#22C55E", // green
    "#EAB308", // yellow
    "#A855F7", // purple
    "#F97316", // orange
    "#EC4899", // pink
    "#14B8A6", // teal
];

/// Named colors recognized in free text, keyed by lowercase name.
pub static NAMED_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("red", "#EF4444");
    m.insert("orange", "#F97316");
    m.insert("amber", "#F59E0B");
    m.insert("yellow", "#EAB308");
    m.insert("lime", "#84CC16");
    m.insert("green", "#22C55E");
    m.insert("teal", "#14B8A6");
    m.insert("cyan", "#06B6D4");
    m.insert("blue", "#3B82F6");
    m.insert("indigo", "#6366F1");
    m.insert("violet", "#8B5CF6");
    m.insert("purple", "#A855F7");
    m.insert("pink", "#EC4899");
    m.insert("rose", "#F43F5E");
    m.insert("brown", "#92400E");
    m.insert("gray", "#6B7280");
    m.insert("grey", "#6B7280");
    m.insert("black", "#111827");
    m.insert("white", "#FFFFFF");
    m
});

/// Regex alternation over all recognized color names (for the color-group
/// parser and agent detectors).
pub static COLOR_NAME_PATTERN: Lazy<String> = Lazy::new(|| {
    let mut names: Vec<&str> = NAMED_COLORS.keys().copied().collect();
    // Longest-first so "grey" never loses to a prefix.
    names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    names.join("|")
});

/// Resolve a color name to its hex value.
pub fn resolve_named_color(name: &str) -> Option<&'static str> {
    NAMED_COLORS.get(name.trim().to_lowercase().as_str()).copied()
}

/// Resolve a user-supplied color (name or hex) to the canonical uppercase
/// `#RRGGBB` form used by the palette tables. Returns `None` for "random"
/// and for unrecognized values.
pub fn resolve_color(value: &str) -> Option<String> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("random") {
        return None;
    }
    if let Some(hex) = resolve_named_color(v) {
        return Some(hex.to_string());
    }
    normalize_hex(v)
}

/// Normalize a hex color to the 7-char uppercase `#RRGGBB` form.
pub fn normalize_hex(value: &str) -> Option<String> {
    let v = value.trim().trim_start_matches('#');
    if !v.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match v.len() {
        3 => {
            let expanded: String = v.chars().flat_map(|c| [c, c]).collect();
            Some(format!("#{}", expanded.to_uppercase()))
        }
        6 => Some(format!("#{}", v.to_uppercase())),
        _ => None,
    }
}

/// Hex-or-named color equivalence: `"red"` matches `"#ef4444"` and
/// `"#EF4444"`, case-insensitively.
pub fn colors_match(a: &str, b: &str) -> bool {
    match (resolve_color(a), resolve_color(b)) {
        (Some(ha), Some(hb)) => ha == hb,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

/// The Nth color of the deterministic random cycle.
pub fn palette_color(index: usize) -> &'static str {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_resolution() {
        assert_eq!(resolve_named_color("red"), Some("#EF4444"));
        assert_eq!(resolve_named_color("  Blue "), Some("#3B82F6"));
        assert_eq!(resolve_named_color("chartreuse"), None);
    }

    #[test]
    fn test_hex_normalization() {
        assert_eq!(normalize_hex("#abc").as_deref(), Some("#AABBCC"));
        assert_eq!(normalize_hex("ef4444").as_deref(), Some("#EF4444"));
        assert_eq!(normalize_hex("#12345"), None);
        assert_eq!(normalize_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_named_resolution_matches_palette_casing() {
        assert_eq!(resolve_color("red").as_deref(), Some(COLOR_PALETTE[0]));
        assert_eq!(resolve_color("#ef4444").as_deref(), Some(COLOR_PALETTE[0]));
        assert_eq!(resolve_color("blue").as_deref(), Some(palette_color(1)));
    }

    #[test]
    fn test_hex_or_named_equivalence() {
        assert!(colors_match("red", "#EF4444"));
        assert!(colors_match("#ef4444", "#EF4444"));
        assert!(colors_match("grey", "gray"));
        assert!(!colors_match("red", "blue"));
    }

    #[test]
    fn test_random_resolves_to_none() {
        assert_eq!(resolve_color("random"), None);
        assert_eq!(resolve_color("Random"), None);
    }

    #[test]
    fn test_palette_cycles_in_stable_order() {
        assert_eq!(palette_color(0), "#EF4444");
        assert_eq!(palette_color(COLOR_PALETTE.len()), "#EF4444");
        assert_eq!(palette_color(1), "#3B82F6");
    }
}
