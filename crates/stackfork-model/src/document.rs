//! Compose document root and root-level resource sections

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;

use crate::error::ModelError;
use crate::raw::{FieldTags, Fields, Writer};
use crate::service::{Attributes, Service};

/// Name → definition map of one root-level resource family
///
/// Insertion order is the document order.
pub type Section = IndexMap<String, Definition>;

/// Name → service map
pub type Services = IndexMap<String, Service>;

/// Root-level resource payload (`driver`, `external`, `file`, `labels`, ...)
///
/// Only the key naming a definition is ever rewritten; the payload is
/// carried as-is, including a `null` payload (`volumes: { cache: }`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Definition(Value);

impl Definition {
    /// Wrap a raw payload
    #[inline]
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Definition with a `null` payload
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::Null)
    }

    /// Raw payload
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Look up a top-level attribute of the payload
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the payload declares `external: true`
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.get("external").and_then(Value::as_bool).unwrap_or(false)
    }
}

impl From<Value> for Definition {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// The four root-level resource families a service can reference by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// `volumes`
    Volume,
    /// `networks`
    Network,
    /// `configs`
    Config,
    /// `secrets`
    Secret,
}

impl ResourceKind {
    /// All kinds, in document order
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Volume,
        ResourceKind::Network,
        ResourceKind::Config,
        ResourceKind::Secret,
    ];

    /// Singular name (`volume`)
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Volume => "volume",
            ResourceKind::Network => "network",
            ResourceKind::Config => "config",
            ResourceKind::Secret => "secret",
        }
    }

    /// Document key of the section, also the service field referencing it
    #[inline]
    #[must_use]
    pub const fn section_key(self) -> &'static str {
        match self {
            ResourceKind::Volume => "volumes",
            ResourceKind::Network => "networks",
            ResourceKind::Config => "configs",
            ResourceKind::Secret => "secrets",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ModelError;

    /// Accepts singular or plural names, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| lowered == kind.as_str() || lowered == kind.section_key())
            .ok_or_else(|| ModelError::UnknownResourceKind(s.to_string()))
    }
}

/// Compose document
///
/// A section that is absent from the source text stays `None`; an explicitly
/// empty section (`configs: {}`) is `Some` of an empty map. The two
/// serialize differently and are kept apart. A section written as `null`
/// (`configs:`) is neither: it stays in [`ComposeDocument::attributes`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeDocument {
    /// Service definitions
    pub services: Option<Services>,

    /// Named volumes
    pub volumes: Option<Section>,

    /// Named networks
    pub networks: Option<Section>,

    /// Named configs
    pub configs: Option<Section>,

    /// Named secrets
    pub secrets: Option<Section>,

    /// Every other top-level key (`version`, `name`, `x-*`, `include`, ...)
    pub attributes: Attributes,

    /// YAML tags on the sections
    pub field_tags: FieldTags,
}

impl Serialize for ComposeDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_raw().map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ComposeDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mapping = match Value::deserialize(deserializer)? {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(D::Error::custom(format_args!(
                    "a compose document must be a mapping, found {other:?}"
                )))
            }
        };
        let mut raw = Fields::from_mapping(mapping).map_err(D::Error::custom)?;
        let services = raw
            .take_strict::<Services>("services")
            .map_err(|e| D::Error::custom(format_args!("services: {e}")))?;

        Ok(Self {
            services,
            volumes: raw.take("volumes", |_| None),
            networks: raw.take("networks", |_| None),
            configs: raw.take("configs", |_| None),
            secrets: raw.take("secrets", |_| None),
            attributes: raw.attributes,
            field_tags: raw.tags,
        })
    }
}

impl ComposeDocument {
    /// Empty document (no sections at all)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Section for a resource kind
    #[inline]
    #[must_use]
    pub fn section(&self, kind: ResourceKind) -> Option<&Section> {
        match kind {
            ResourceKind::Volume => self.volumes.as_ref(),
            ResourceKind::Network => self.networks.as_ref(),
            ResourceKind::Config => self.configs.as_ref(),
            ResourceKind::Secret => self.secrets.as_ref(),
        }
    }

    /// Mutable slot for a resource kind's section
    #[inline]
    pub fn section_slot_mut(&mut self, kind: ResourceKind) -> &mut Option<Section> {
        match kind {
            ResourceKind::Volume => &mut self.volumes,
            ResourceKind::Network => &mut self.networks,
            ResourceKind::Config => &mut self.configs,
            ResourceKind::Secret => &mut self.secrets,
        }
    }

    /// Service by name
    #[inline]
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.as_ref()?.get(name)
    }

    /// Service names in document order
    #[must_use]
    pub fn service_names(&self) -> Vec<&str> {
        self.services
            .as_ref()
            .map(|services| services.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn to_raw(&self) -> Result<Value, serde_yaml::Error> {
        let mut out = Writer::new(&self.field_tags);
        out.field("services", self.services.as_ref())?;
        for kind in ResourceKind::ALL {
            out.field(kind.section_key(), self.section(kind))?;
        }
        Ok(out.finish(&self.attributes))
    }

    /// Builder-style: set a section
    #[must_use]
    pub fn with_section(mut self, kind: ResourceKind, section: Section) -> Self {
        *self.section_slot_mut(kind) = Some(section);
        self
    }

    /// Builder-style: add a service
    #[must_use]
    pub fn with_service(mut self, name: impl Into<String>, service: Service) -> Self {
        self.services
            .get_or_insert_with(Services::new)
            .insert(name.into(), service);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_singular_and_plural() {
        assert_eq!("volume".parse::<ResourceKind>().unwrap(), ResourceKind::Volume);
        assert_eq!("Networks".parse::<ResourceKind>().unwrap(), ResourceKind::Network);
        assert_eq!(" secret ".parse::<ResourceKind>().unwrap(), ResourceKind::Secret);
        assert!("service".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn kind_display_roundtrip() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.to_string().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn section_slots_line_up() {
        let mut section = Section::new();
        section.insert("web_config".to_string(), Definition::empty());

        let doc = ComposeDocument::new().with_section(ResourceKind::Config, section);
        assert!(doc.section(ResourceKind::Config).is_some());
        assert!(doc.section(ResourceKind::Secret).is_none());
        assert!(doc.configs.as_ref().unwrap().contains_key("web_config"));
    }

    #[test]
    fn definition_external_flag() {
        let external: Value = serde_yaml::from_str("external: true").unwrap();
        assert!(Definition::new(external).is_external());
        assert!(!Definition::empty().is_external());
    }

    #[test]
    fn service_names_in_order() {
        let doc = ComposeDocument::new()
            .with_service("web", Service::default())
            .with_service("db", Service::default());
        assert_eq!(doc.service_names(), vec!["web", "db"]);
        assert!(doc.service("db").is_some());
    }
}
