//! Named, individually replaceable stylesheet fragments.
//!
//! The registry owns one [`Theme`] per fragment name. `set` replaces a
//! fragment wholesale, `add` merges into it, `remove` deletes it; `render`
//! concatenates every fragment into one CSS document for the host to
//! inject. Themes are validated on the way in, so the registry never holds
//! an illegal fragment.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::theme::Theme;

/// Registry of named stylesheet fragments.
#[derive(Default)]
pub struct StyleSheets {
    fragments: RwLock<BTreeMap<String, Theme>>,
}

impl StyleSheets {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fragment `name` with `theme`.
    pub fn set(&self, name: impl Into<String>, theme: Theme) -> Result<()> {
        theme.validate()?;
        let name = name.into();
        tracing::debug!(target: "casement_style", %name, "set stylesheet fragment");
        self.fragments.write().insert(name, theme);
        Ok(())
    }

    /// Merge `theme` into the fragment `name`, creating it if absent.
    ///
    /// Selectors present in both are replaced by `theme`'s rules.
    pub fn add(&self, name: impl Into<String>, theme: Theme) -> Result<()> {
        theme.validate()?;
        let name = name.into();
        let mut fragments = self.fragments.write();
        fragments.entry(name).or_default().merge(theme);
        Ok(())
    }

    /// Remove the fragment `name`. Returns `true` if it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.fragments.write().remove(name).is_some()
    }

    /// Whether the fragment `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.fragments.read().contains_key(name)
    }

    /// Names of all fragments, sorted.
    pub fn names(&self) -> Vec<String> {
        self.fragments.read().keys().cloned().collect()
    }

    /// Render every fragment into one CSS document.
    ///
    /// Fragments are emitted in name order, each preceded by a comment
    /// naming it so the host can locate a fragment in the output.
    pub fn render(&self) -> String {
        let fragments = self.fragments.read();
        let mut out = String::new();
        for (name, theme) in fragments.iter() {
            out.push_str("/* fragment: ");
            out.push_str(name);
            out.push_str(" */\n");
            // Fragments were validated on insertion.
            if let Ok(css) = theme.to_css() {
                out.push_str(&css);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Rule;

    fn theme_with(selector: &str, key: &str, value: &str) -> Theme {
        Theme::new().rule(selector, Rule::new().declare(key, value))
    }

    #[test]
    fn set_replaces_a_fragment() {
        let sheets = StyleSheets::new();
        sheets.set("app", theme_with(".x", "color", "#000")).unwrap();
        sheets.set("app", theme_with(".x", "color", "#fff")).unwrap();

        let css = sheets.render();
        assert!(css.contains("color: #fff"));
        assert!(!css.contains("color: #000"));
    }

    #[test]
    fn add_merges_into_a_fragment() {
        let sheets = StyleSheets::new();
        sheets.set("app", theme_with(".x", "color", "#000")).unwrap();
        sheets.add("app", theme_with(".y", "bgColor", "#fff")).unwrap();

        let css = sheets.render();
        assert!(css.contains(".x {"));
        assert!(css.contains(".y {"));
    }

    #[test]
    fn illegal_fragment_is_rejected_and_not_stored() {
        let sheets = StyleSheets::new();
        let err = sheets.set("bad", theme_with(".x", "display", "none"));
        assert!(err.is_err());
        assert!(!sheets.contains("bad"));
    }

    #[test]
    fn remove_deletes_only_the_named_fragment() {
        let sheets = StyleSheets::new();
        sheets.set("a", theme_with(".a", "color", "#000")).unwrap();
        sheets.set("b", theme_with(".b", "color", "#000")).unwrap();

        assert!(sheets.remove("a"));
        assert!(!sheets.remove("a"));
        assert_eq!(sheets.names(), vec!["b".to_string()]);
    }

    #[test]
    fn render_labels_fragments() {
        let sheets = StyleSheets::new();
        sheets.set("theme", theme_with(".x", "color", "#000")).unwrap();
        assert!(sheets.render().starts_with("/* fragment: theme */\n"));
    }
}
