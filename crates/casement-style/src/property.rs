//! The themable property allow-list.
//!
//! Themes may only declare properties from this closed table. Each entry
//! maps a short camel-case key to the CSS property name it serializes to;
//! anything outside the table is rejected with
//! [`Error::IllegalProperty`](crate::Error::IllegalProperty) before a single
//! rule is emitted.

/// The allow-list: `(key, css property name)` pairs.
pub const PROPERTIES: &[(&str, &str)] = &[
    // Background
    ("bg", "background"),
    ("bgColor", "background-color"),
    ("bgImage", "background-image"),
    ("bgRepeat", "background-repeat"),
    ("bgPosition", "background-position"),
    ("bgSize", "background-size"),
    ("bgAttachment", "background-attachment"),
    // Text and font
    ("color", "color"),
    ("fontSize", "font-size"),
    ("fontFamily", "font-family"),
    ("fontWeight", "font-weight"),
    ("fontStyle", "font-style"),
    ("textAlign", "text-align"),
    ("textDecoration", "text-decoration"),
    ("textTransform", "text-transform"),
    ("textIndent", "text-indent"),
    ("lineHeight", "line-height"),
    ("letterSpacing", "letter-spacing"),
    ("wordSpacing", "word-spacing"),
    ("whiteSpace", "white-space"),
    // Border
    ("border", "border"),
    ("borderRadius", "border-radius"),
    ("borderTop", "border-top"),
    ("borderRight", "border-right"),
    ("borderBottom", "border-bottom"),
    ("borderLeft", "border-left"),
    ("borderWidth", "border-width"),
    ("borderColor", "border-color"),
    ("borderStyle", "border-style"),
    // Box model
    ("margin", "margin"),
    ("marginTop", "margin-top"),
    ("marginRight", "margin-right"),
    ("marginBottom", "margin-bottom"),
    ("marginLeft", "margin-left"),
    ("padding", "padding"),
    ("paddingTop", "padding-top"),
    ("paddingRight", "padding-right"),
    ("paddingBottom", "padding-bottom"),
    ("paddingLeft", "padding-left"),
    ("boxShadow", "box-shadow"),
    ("boxSizing", "box-sizing"),
    // Miscellaneous
    ("opacity", "opacity"),
    ("cursor", "cursor"),
    ("overflow", "overflow"),
    ("outline", "outline"),
    ("clear", "clear"),
    ("zIndex", "z-index"),
    ("transform", "transform"),
    ("filter", "filter"),
    ("transition", "transition"),
    ("animation", "animation"),
    ("listStyle", "list-style"),
    ("verticalAlign", "vertical-align"),
];

/// Look up the CSS property name for an allow-listed key.
///
/// Returns `None` for keys outside the table.
pub fn css_name(key: &str) -> Option<&'static str> {
    PROPERTIES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, css)| *css)
}

/// Whether `key` is on the allow-list.
pub fn is_allowed(key: &str) -> bool {
    css_name(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_resolve() {
        assert_eq!(css_name("bgColor"), Some("background-color"));
        assert_eq!(css_name("borderRadius"), Some("border-radius"));
        assert_eq!(css_name("zIndex"), Some("z-index"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(!is_allowed("display"));
        assert!(!is_allowed("position"));
        assert!(!is_allowed(""));
    }

    #[test]
    fn table_has_no_duplicate_keys() {
        for (i, (key, _)) in PROPERTIES.iter().enumerate() {
            assert!(
                !PROPERTIES[i + 1..].iter().any(|(k, _)| k == key),
                "duplicate key {key}"
            );
        }
    }
}
