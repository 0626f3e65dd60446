//! Service reference types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::id::BundleId;
use crate::utils::Version;

/// Property key holding the interface names a service is registered under.
pub const OBJECT_CLASS: &str = "objectClass";

/// Property key holding the service id.
pub const SERVICE_ID: &str = "service.id";

/// A single service property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A string value.
    String(String),

    /// A multi-valued string property.
    Strings(Vec<String>),

    /// A numeric value.
    Long(i64),

    /// A boolean value.
    Bool(bool),

    /// A version value.
    Version(Version),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{}", value),
            Self::Strings(values) => write!(f, "[{}]", values.join(", ")),
            Self::Long(value) => write!(f, "{}", value),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Version(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(values: Vec<String>) -> Self {
        Self::Strings(values)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Version> for PropertyValue {
    fn from(value: Version) -> Self {
        Self::Version(value)
    }
}

/// Service properties.
///
/// Keys are matched case-insensitively, as filters expect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProperties {
    entries: BTreeMap<String, PropertyValue>,
}

impl ServiceProperties {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property, replacing any existing key that differs only in case.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        self.entries.retain(|existing, _| !existing.eq_ignore_ascii_case(&key));
        self.entries.insert(key, value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a property by case-insensitive key.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    /// The interface names of the service.
    pub fn object_class(&self) -> Vec<String> {
        match self.get(OBJECT_CLASS) {
            Some(PropertyValue::String(name)) => vec![name.clone()],
            Some(PropertyValue::Strings(names)) => names.clone(),
            _ => Vec::new(),
        }
    }

    /// Iterate over all properties.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.entries.iter()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether there are no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A reference to a registered service.
///
/// The registering bundle is captured at registration time so it stays
/// reachable after the service is unregistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReference {
    /// The bundle that registered the service.
    pub registering_bundle: BundleId,

    /// The service properties.
    pub properties: ServiceProperties,
}

impl ServiceReference {
    /// Create a new service reference.
    pub fn new(registering_bundle: BundleId, properties: ServiceProperties) -> Self {
        Self {
            registering_bundle,
            properties,
        }
    }

    /// The interface names the service is registered under.
    pub fn object_class(&self) -> Vec<String> {
        self.properties.object_class()
    }

    /// The service id, if the registry assigned one.
    pub fn service_id(&self) -> Option<i64> {
        match self.properties.get(SERVICE_ID) {
            Some(PropertyValue::Long(id)) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} from bundle {}",
            self.object_class().join(", "),
            self.registering_bundle
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_keys() {
        let mut properties = ServiceProperties::new();
        properties.insert("Service.Ranking", 10i64);
        assert_eq!(
            properties.get("service.ranking"),
            Some(&PropertyValue::Long(10))
        );

        // Replacing a key that differs only in case keeps one entry
        properties.insert("service.RANKING", 20i64);
        assert_eq!(properties.len(), 1);
        assert_eq!(
            properties.get("SERVICE.RANKING"),
            Some(&PropertyValue::Long(20))
        );
    }

    #[test]
    fn test_object_class() {
        let single = ServiceProperties::new().with(OBJECT_CLASS, "org.example.Log");
        assert_eq!(single.object_class(), vec!["org.example.Log".to_string()]);

        let multi = ServiceProperties::new().with(
            OBJECT_CLASS,
            vec!["a.A".to_string(), "b.B".to_string()],
        );
        let reference = ServiceReference::new(BundleId::new(4), multi);
        assert_eq!(reference.object_class().len(), 2);
        assert_eq!(reference.service_id(), None);
    }
}
