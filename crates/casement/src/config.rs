//! The declarative configuration mini-language.
//!
//! Widgets are configured through a single `w-config` attribute holding
//! space-separated tokens: a bare token is a flag, `key:value` carries a
//! value. Duplicate tokens collapse (set semantics) and token order is
//! irrelevant. A second grammar — `key=value` pairs separated by `;` — is
//! used for structured payloads such as the `callbacks` entry.
//!
//! Parsing of flags is deliberately lenient: a malformed token degrades to
//! a flag keyed by itself, never an error. Callback wiring is deliberately
//! strict: an empty callback value or a name the registry cannot resolve
//! fails loudly, because a misdeclared callback is a common integration
//! error worth surfacing.
//!
//! The source attribute is removed after parsing so rediscovery passes do
//! not re-parse it.

use std::collections::BTreeMap;

use casement_core::{Result, UiError};

use crate::callback::{CallbackRegistry, CallbackTable};
use crate::dom::{Document, ElementId};

/// The attribute the configuration string is read from.
pub const CONFIG_ATTR: &str = "w-config";

/// A parsed configuration: unique keys, order-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    entries: BTreeMap<String, String>,
}

impl ConfigMap {
    /// Parse the outer `token (" " token)*` grammar.
    ///
    /// Never fails: tokens without `:` become flags with an empty value.
    pub fn parse(source: &str) -> Self {
        let mut entries = BTreeMap::new();
        for token in source.split(' ').filter(|t| !t.is_empty()) {
            match token.split_once(':') {
                Some((key, value)) => {
                    entries.insert(key.to_string(), value.to_string());
                }
                None => {
                    entries.insert(token.to_string(), String::new());
                }
            }
        }
        Self { entries }
    }

    /// Read, erase and parse an element's configuration attribute.
    ///
    /// Returns an empty map when the attribute is absent.
    pub fn take_from(doc: &mut Document, element: ElementId, attr: &str) -> Result<Self> {
        match doc.remove_attr(element, attr)? {
            Some(source) => Ok(Self::parse(&source)),
            None => Ok(Self::default()),
        }
    }

    /// Get a value. Flags yield `Some("")`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether the key is present (as a flag or with a value).
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert or replace an entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove an entry.
    pub fn unset(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Serialize back to the outer grammar (`key:value` tokens, flags bare).
    pub fn to_config_string(&self) -> String {
        let mut tokens = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            if value.is_empty() {
                tokens.push(key.clone());
            } else {
                tokens.push(format!("{key}:{value}"));
            }
        }
        tokens.join(" ")
    }

    /// Wire the `callbacks` entry, if present, into a callback table.
    ///
    /// The payload uses the [`ValueMap`] grammar, mapping slot names to
    /// registry keys: `callbacks:select_item=onSelect;swap_item=guardSwap`.
    /// An empty registry key fails with `ParameterMismatch`; an unknown key
    /// fails with `VariableDoesNotExist`; an unknown slot name fails with
    /// `UnknownCallback`.
    pub fn wire_callbacks(
        &self,
        registry: &CallbackRegistry,
        table: &mut CallbackTable,
    ) -> Result<()> {
        let Some(payload) = self.get("callbacks") else {
            return Ok(());
        };

        let pairs = ValueMap::parse(payload);
        for (index, (slot, name)) in pairs.iter().enumerate() {
            if name.is_empty() {
                return Err(UiError::parameter_mismatch(format!(
                    "key:{slot} value:null index:{index}"
                )));
            }
            let handler = registry.resolve(name)?;
            table.set(slot, handler)?;
        }
        Ok(())
    }
}

/// The `key=value(";" key=value)*` sub-grammar for structured payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueMap {
    entries: Vec<(String, String)>,
}

impl ValueMap {
    /// Parse the sub-grammar. Duplicates collapse, first occurrence wins
    /// the position; entries without `=` become flags with empty values.
    pub fn parse(source: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for token in source.split(';').filter(|t| !t.is_empty()) {
            let (key, value) = match token.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (token.to_string(), String::new()),
            };
            if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
                existing.1 = value;
            } else {
                entries.push((key, value));
            }
        }
        Self { entries }
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{CallbackArgs, Handler, SlotKind};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn flags_and_values_parse() {
        let map = ConfigMap::parse("multiple reverse sortDirection:row");
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("multiple"), Some(""));
        assert_eq!(map.get("reverse"), Some(""));
        assert_eq!(map.get("sortDirection"), Some("row"));
        assert!(!map.has("unknown"));
    }

    #[test]
    fn duplicate_tokens_collapse() {
        let map = ConfigMap::parse("multiple multiple reverse");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn malformed_tokens_become_flags() {
        let map = ConfigMap::parse(":odd  bare");
        // ":odd" splits into an empty key with value "odd".
        assert_eq!(map.get(""), Some("odd"));
        assert_eq!(map.get("bare"), Some(""));
    }

    #[test]
    fn config_string_round_trips() {
        let map = ConfigMap::parse("reverse sortDirection:row");
        let rebuilt = ConfigMap::parse(&map.to_config_string());
        assert_eq!(map, rebuilt);
    }

    #[test]
    fn value_map_parses_pairs() {
        let map = ValueMap::parse("select_item=onSelect;swap_item=guard");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("select_item"), Some("onSelect"));
        assert_eq!(map.get("swap_item"), Some("guard"));
    }

    #[test]
    fn wire_callbacks_resolves_through_registry() {
        let registry = CallbackRegistry::new();
        let hit = Arc::new(AtomicBool::new(false));
        let h = hit.clone();
        registry.register_notify("onAdd", move |_args: &CallbackArgs| {
            h.store(true, Ordering::SeqCst);
        });

        let mut table = CallbackTable::new("List", &[("add_item", SlotKind::Notify)]);
        let map = ConfigMap::parse("callbacks:add_item=onAdd");
        map.wire_callbacks(&registry, &mut table).unwrap();

        table.notify(
            "add_item",
            &CallbackArgs::bare("List", crate::dom::Dom::new().root()),
        );
        assert!(hit.load(Ordering::SeqCst));
    }

    #[test]
    fn empty_callback_value_is_a_parameter_mismatch() {
        let registry = CallbackRegistry::new();
        let mut table = CallbackTable::new("List", &[("add_item", SlotKind::Notify)]);
        let map = ConfigMap::parse("callbacks:add_item=");
        let err = map.wire_callbacks(&registry, &mut table).unwrap_err();
        assert!(matches!(err, casement_core::UiError::ParameterMismatch { .. }));
    }

    #[test]
    fn unresolved_callback_name_fails_loudly() {
        let registry = CallbackRegistry::new();
        let mut table = CallbackTable::new("List", &[("add_item", SlotKind::Notify)]);
        let map = ConfigMap::parse("callbacks:add_item=missing");
        let err = map.wire_callbacks(&registry, &mut table).unwrap_err();
        assert!(matches!(
            err,
            casement_core::UiError::VariableDoesNotExist { .. }
        ));
    }

    #[test]
    fn gate_handler_can_be_wired_from_config() {
        let registry = CallbackRegistry::new();
        registry.register_gate("vetoAll", |_args: &CallbackArgs| false);

        let mut table = CallbackTable::new("List", &[("swap_item", SlotKind::Gate)]);
        ConfigMap::parse("callbacks:swap_item=vetoAll")
            .wire_callbacks(&registry, &mut table)
            .unwrap();

        let verdict = table.gate(
            "swap_item",
            &CallbackArgs::bare("List", crate::dom::Dom::new().root()),
        );
        assert!(!verdict);
        assert!(matches!(registry.resolve("vetoAll").unwrap(), Handler::Gate(_)));
    }
}
