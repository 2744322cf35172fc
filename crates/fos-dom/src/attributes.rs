//! Element Attributes
//!
//! Namespaced attribute storage: get, set, remove, has.

use std::collections::HashMap;

/// Attribute key: (namespace, local name)
type AttrKey = (Option<String>, String);

/// Named node map (attribute collection)
#[derive(Debug, Clone, Default)]
pub struct NamedNodeMap {
    attributes: Vec<Attr>,
    by_name: HashMap<AttrKey, usize>,
}

/// Single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub namespace: Option<String>,
    pub local_name: String,
    pub value: String,
}

impl Attr {
    pub fn new(namespace: Option<&str>, local_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local_name: local_name.into(),
            value: value.into(),
        }
    }

    /// Qualified name as serialized (`ns:name` when namespaced)
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}:{}", ns, self.local_name),
            None => self.local_name.clone(),
        }
    }

    fn key(&self) -> AttrKey {
        (self.namespace.clone(), self.local_name.clone())
    }
}

impl NamedNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Get attribute by namespace and local name
    pub fn get_named_item(&self, namespace: Option<&str>, name: &str) -> Option<&Attr> {
        let key = (namespace.map(str::to_string), name.to_string());
        self.by_name.get(&key).and_then(|&i| self.attributes.get(i))
    }

    /// Get attribute value
    pub fn get(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.get_named_item(namespace, name).map(|a| a.value.as_str())
    }

    /// Set attribute, returning the replaced one
    pub fn set_named_item(&mut self, attr: Attr) -> Option<Attr> {
        let key = attr.key();
        if let Some(&index) = self.by_name.get(&key) {
            Some(std::mem::replace(&mut self.attributes[index], attr))
        } else {
            self.by_name.insert(key, self.attributes.len());
            self.attributes.push(attr);
            None
        }
    }

    /// Set attribute by namespace/name/value
    pub fn set(&mut self, namespace: Option<&str>, name: &str, value: &str) {
        self.set_named_item(Attr::new(namespace, name, value));
    }

    /// Remove attribute
    pub fn remove(&mut self, namespace: Option<&str>, name: &str) -> Option<Attr> {
        let key = (namespace.map(str::to_string), name.to_string());
        let index = self.by_name.remove(&key)?;
        // Shift indices of attributes after the removed one
        for idx in self.by_name.values_mut() {
            if *idx > index {
                *idx -= 1;
            }
        }
        Some(self.attributes.remove(index))
    }

    /// Check if attribute exists
    pub fn contains(&self, namespace: Option<&str>, name: &str) -> bool {
        self.get_named_item(namespace, name).is_some()
    }

    /// Iterate over attributes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attributes.iter()
    }
}
