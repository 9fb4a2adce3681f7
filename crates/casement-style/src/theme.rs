//! Theme model: nested rule trees validated against the property allow-list.
//!
//! A [`Theme`] maps selectors to [`Rule`]s; a rule carries declarations
//! (allow-listed key → value) and nested rules. A nested selector starting
//! with `&` splices onto its parent selector (`.w-dialog` + `&::backdrop` →
//! `.w-dialog::backdrop`); any other nested selector combines as a
//! descendant (`.w-list` + `[w-item]:hover` → `.w-list [w-item]:hover`).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::property;

/// A single style rule: declarations plus nested rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rule {
    /// Allow-listed property key → value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub declarations: BTreeMap<String, String>,
    /// Nested selector → rule.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nested: BTreeMap<String, Rule>,
}

impl Rule {
    /// Create an empty rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration. The key is validated when the theme is rendered
    /// or [`Theme::validate`]d, not here.
    pub fn declare(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.declarations.insert(key.into(), value.into());
        self
    }

    /// Add a nested rule.
    pub fn nest(mut self, selector: impl Into<String>, rule: Rule) -> Self {
        self.nested.insert(selector.into(), rule);
        self
    }

    fn collect_keys<'a>(&'a self, out: &mut Vec<&'a str>) {
        for key in self.declarations.keys() {
            out.push(key);
        }
        for rule in self.nested.values() {
            rule.collect_keys(out);
        }
    }

    fn write_css(&self, selector: &str, out: &mut String) {
        if !self.declarations.is_empty() {
            out.push_str(selector);
            out.push_str(" {\n");
            for (key, value) in &self.declarations {
                // Keys are validated before rendering.
                let css = property::css_name(key).unwrap_or(key);
                out.push_str("  ");
                out.push_str(css);
                out.push_str(": ");
                out.push_str(value);
                out.push_str(";\n");
            }
            out.push_str("}\n");
        }
        for (nested_selector, rule) in &self.nested {
            let combined = combine_selectors(selector, nested_selector);
            rule.write_css(&combined, out);
        }
    }
}

fn combine_selectors(parent: &str, child: &str) -> String {
    if let Some(rest) = child.strip_prefix('&') {
        format!("{parent}{rest}")
    } else {
        format!("{parent} {child}")
    }
}

/// A theme: a mapping from selector to rule tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Theme {
    /// Top-level selector → rule.
    pub rules: BTreeMap<String, Rule>,
}

impl Theme {
    /// Create an empty theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level rule.
    pub fn rule(mut self, selector: impl Into<String>, rule: Rule) -> Self {
        self.rules.insert(selector.into(), rule);
        self
    }

    /// Validate every declared property key against the allow-list.
    ///
    /// Fails with [`Error::IllegalProperty`] naming every offending key.
    pub fn validate(&self) -> Result<()> {
        let mut keys = Vec::new();
        for rule in self.rules.values() {
            rule.collect_keys(&mut keys);
        }

        let mut illegal: Vec<String> = keys
            .into_iter()
            .filter(|key| !property::is_allowed(key))
            .map(str::to_owned)
            .collect();
        illegal.sort();
        illegal.dedup();

        if illegal.is_empty() {
            Ok(())
        } else {
            Err(Error::illegal_property(illegal))
        }
    }

    /// Render the theme to CSS text.
    ///
    /// Validates first; an invalid theme produces no output.
    pub fn to_css(&self) -> Result<String> {
        self.validate()?;
        let mut out = String::new();
        for (selector, rule) in &self.rules {
            rule.write_css(selector, &mut out);
        }
        Ok(out)
    }

    /// Merge another theme into this one.
    ///
    /// Rules for selectors present in both are replaced by `other`'s.
    pub fn merge(&mut self, other: Theme) {
        for (selector, rule) in other.rules {
            self.rules.insert(selector, rule);
        }
    }

    /// Build a theme from a JSON document.
    ///
    /// The document is an object of selector → rule, where a rule maps
    /// string values to declarations and object values to nested rules.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::invalid_document("top level must be an object"));
        };

        let mut theme = Theme::new();
        for (selector, rule_value) in map {
            theme
                .rules
                .insert(selector.clone(), rule_from_json(selector, rule_value)?);
        }
        Ok(theme)
    }
}

fn rule_from_json(selector: &str, value: &Value) -> Result<Rule> {
    let Value::Object(map) = value else {
        return Err(Error::invalid_document(format!(
            "rule for '{selector}' must be an object"
        )));
    };

    let mut rule = Rule::new();
    for (key, entry) in map {
        match entry {
            Value::String(text) => {
                rule.declarations.insert(key.clone(), text.clone());
            }
            Value::Number(number) => {
                rule.declarations.insert(key.clone(), number.to_string());
            }
            Value::Object(_) => {
                rule.nested.insert(key.clone(), rule_from_json(key, entry)?);
            }
            _ => {
                return Err(Error::invalid_document(format!(
                    "entry '{key}' under '{selector}' must be a string, number or object"
                )));
            }
        }
    }
    Ok(rule)
}

/// The built-in theme covering the toolkit's role classes.
pub fn default_theme() -> Theme {
    Theme::new()
        .rule(
            ".w-list",
            Rule::new()
                .nest(
                    "[w-item]:hover",
                    Rule::new()
                        .declare("bgColor", "#00000010")
                        .declare("cursor", "context-menu"),
                )
                .nest("[w-item].select", Rule::new().declare("bgColor", "#00000030"))
                .nest(
                    "[w-item].preselect",
                    Rule::new().declare("bgColor", "#00000020"),
                ),
        )
        .rule(
            ".w-tree",
            Rule::new()
                .nest(
                    "[w-item]:hover",
                    Rule::new().declare("bgColor", "#00000010"),
                )
                .nest("[w-item].select", Rule::new().declare("bgColor", "#00000030")),
        )
        .rule(
            ".w-dialog",
            Rule::new()
                .declare("borderRadius", "8px")
                .declare("border", "solid 1.5px #c9c9c9dd")
                .declare("boxShadow", "0 0 30px 6px #3333332a")
                .nest(".title", Rule::new().declare("bgColor", "#f3f3f3"))
                .nest(".content", Rule::new().declare("bgColor", "#ebebeb"))
                .nest("&::backdrop", Rule::new().declare("bgColor", "#ffffff0f")),
        )
        .rule(
            ".w-drawer",
            Rule::new()
                .declare("bgColor", "#ebebeb")
                .declare("borderRadius", "8px")
                .declare("border", "solid 1.5px #c9c9c9dd")
                .nest("&::backdrop", Rule::new().declare("bgColor", "#00000000")),
        )
        .rule(
            ".w-floating",
            Rule::new()
                .declare("bgColor", "#ebebeb")
                .declare("borderRadius", "8px")
                .declare("border", "solid 1.5px #c9c9c9dd"),
        )
        .rule(
            ".w-window-flags",
            Rule::new()
                .nest(".btn", Rule::new().declare("fontSize", "18px"))
                .nest(".min:hover", Rule::new().declare("bgColor", "#e3e3e3dc"))
                .nest(".restore:hover", Rule::new().declare("bgColor", "#e3e3e3dc"))
                .nest(
                    ".close:hover",
                    Rule::new().declare("color", "#fff").declare("bgColor", "red"),
                ),
        )
        .rule(
            ".w-tab",
            Rule::new()
                .nest(
                    "[w-bar]",
                    Rule::new().declare("bgColor", "#f9f9f9").nest(
                        "[w-item].select",
                        Rule::new()
                            .declare("borderBottom", "solid 1.5px #333")
                            .declare("bgColor", "#00000010"),
                    ),
                )
                .nest("[w-content]", Rule::new().declare("border", "solid 1.5px #333")),
        )
        .rule(
            ".w-menu",
            Rule::new()
                .declare("bgColor", "#fff")
                .declare("borderRadius", "6px")
                .declare("boxShadow", "0 0 20px 4px #3333332a"),
        )
        .rule(
            ".w-message",
            Rule::new()
                .declare("bgColor", "#333")
                .declare("color", "#fff")
                .declare("borderRadius", "6px"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn illegal_properties_are_named() {
        let theme = Theme::new().rule(
            ".w-list",
            Rule::new()
                .declare("bgColor", "#fff")
                .declare("display", "flex")
                .nest("[w-item]", Rule::new().declare("position", "absolute")),
        );

        let err = theme.validate().unwrap_err();
        match err {
            Error::IllegalProperty { properties } => {
                assert_eq!(properties, vec!["display".to_string(), "position".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn css_rendering_flattens_nested_selectors() {
        let theme = Theme::new().rule(
            ".w-dialog",
            Rule::new()
                .declare("borderRadius", "8px")
                .nest(".title", Rule::new().declare("bgColor", "#f3f3f3"))
                .nest("&::backdrop", Rule::new().declare("bgColor", "#ffffff0f")),
        );

        let css = theme.to_css().unwrap();
        assert!(css.contains(".w-dialog {\n  border-radius: 8px;\n}\n"));
        assert!(css.contains(".w-dialog .title {\n  background-color: #f3f3f3;\n}\n"));
        assert!(css.contains(".w-dialog::backdrop {\n  background-color: #ffffff0f;\n}\n"));
    }

    #[test]
    fn invalid_theme_renders_nothing() {
        let theme = Theme::new().rule(".x", Rule::new().declare("display", "none"));
        assert!(theme.to_css().is_err());
    }

    #[test]
    fn default_theme_is_valid() {
        default_theme().validate().unwrap();
    }

    #[test]
    fn theme_from_json_round_trips() {
        let doc = json!({
            ".w-list": {
                "bgColor": "#fff",
                "[w-item]:hover": { "bgColor": "#00000010" }
            }
        });

        let theme = Theme::from_json(&doc).unwrap();
        let rule = &theme.rules[".w-list"];
        assert_eq!(rule.declarations["bgColor"], "#fff");
        assert_eq!(
            rule.nested["[w-item]:hover"].declarations["bgColor"],
            "#00000010"
        );
        theme.validate().unwrap();
    }

    #[test]
    fn json_theme_rejects_bad_shapes() {
        assert!(Theme::from_json(&json!([])).is_err());
        assert!(Theme::from_json(&json!({".x": "not an object"})).is_err());
        assert!(Theme::from_json(&json!({".x": {"bgColor": true}})).is_err());
    }

    #[test]
    fn merge_replaces_existing_selectors() {
        let mut base = Theme::new().rule(".x", Rule::new().declare("color", "#000"));
        base.merge(Theme::new().rule(".x", Rule::new().declare("color", "#fff")));
        assert_eq!(base.rules[".x"].declarations["color"], "#fff");
    }
}
