//! Service definition and its reference-bearing fields
//!
//! Reference fields come in several on-disk shapes. Each one is modelled as an
//! untagged enum whose variants are tried in declaration order; the trailing
//! `Other` variant accepts any value, so deserialization of a service never
//! fails because of one oddly shaped field.
//!
//! [`Service`] itself is (de)serialized by hand through a raw mapping rather
//! than with `#[serde(flatten)]`, which buffers values in a form that cannot
//! hold YAML tags. Tags on typed fields are kept in [`Service::field_tags`].

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;

use crate::raw::{FieldTags, Fields, Writer};

/// Keys not modelled explicitly, kept in document order
pub type Attributes = IndexMap<String, Value>;

/// One entry of the `services` map
///
/// Only fields that carry names of other resources are typed; `image`,
/// `command`, `environment`, `ports`, `healthcheck`, `deploy` and the rest
/// live in [`Service::attributes`]. A typed field written as `null`
/// (`depends_on:`) stays in the attributes as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
    /// Fixed container name
    pub container_name: Option<String>,

    /// Start-order dependencies on sibling services
    pub depends_on: Option<DependsOn>,

    /// Volume and bind mounts
    pub volumes: Option<Entries<VolumeMount>>,

    /// Services (or containers) whose mounts are inherited
    pub volumes_from: Option<Entries<String>>,

    /// Legacy links, `service[:alias]`
    pub links: Option<Entries<String>>,

    /// Base service this one extends
    pub extends: Option<Extends>,

    /// Network attachments
    pub networks: Option<ServiceNetworks>,

    /// Config mounts
    pub configs: Option<Entries<FileReference>>,

    /// Secret mounts
    pub secrets: Option<Entries<FileReference>>,

    /// All remaining keys
    pub attributes: Attributes,

    /// YAML tags on typed fields (`networks: !override [...]`)
    pub field_tags: FieldTags,

    /// Written with no body at all (`web:`)
    pub null_body: bool,
}

impl Service {
    /// Service with only an image set
    #[must_use]
    pub fn with_image(image: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert("image".to_string(), Value::String(image.into()));
        Self {
            attributes,
            ..Self::default()
        }
    }

    /// Look up an unmodelled attribute
    #[inline]
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// No fields and no attributes
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.container_name.is_none()
            && self.depends_on.is_none()
            && self.volumes.is_none()
            && self.volumes_from.is_none()
            && self.links.is_none()
            && self.extends.is_none()
            && self.networks.is_none()
            && self.configs.is_none()
            && self.secrets.is_none()
            && self.attributes.is_empty()
    }

    fn to_raw(&self) -> Result<Value, serde_yaml::Error> {
        let mut out = Writer::new(&self.field_tags);
        out.field("container_name", self.container_name.as_ref())?;
        out.field("depends_on", self.depends_on.as_ref())?;
        out.field("volumes", self.volumes.as_ref())?;
        out.field("volumes_from", self.volumes_from.as_ref())?;
        out.field("links", self.links.as_ref())?;
        out.field("extends", self.extends.as_ref())?;
        out.field("networks", self.networks.as_ref())?;
        out.field("configs", self.configs.as_ref())?;
        out.field("secrets", self.secrets.as_ref())?;
        Ok(out.finish(&self.attributes))
    }
}

impl Serialize for Service {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.null_body && self.is_blank() {
            return serializer.serialize_unit();
        }
        self.to_raw().map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Service {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mapping = match Value::deserialize(deserializer)? {
            Value::Null => {
                return Ok(Self {
                    null_body: true,
                    ..Self::default()
                })
            }
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(D::Error::custom(format_args!(
                    "a service must be a mapping, found {other:?}"
                )))
            }
        };
        let mut raw = Fields::from_mapping(mapping).map_err(D::Error::custom)?;

        Ok(Self {
            container_name: raw.take("container_name", |_| None),
            depends_on: raw.take("depends_on", |v| {
                Some(string_keyed(v).map_or_else(DependsOn::Other, DependsOn::Conditions))
            }),
            volumes: raw.take("volumes", |v| Some(Entries::Other(v))),
            volumes_from: raw.take("volumes_from", |v| Some(Entries::Other(v))),
            links: raw.take("links", |v| Some(Entries::Other(v))),
            extends: raw.take("extends", |v| Some(Extends::Other(v))),
            networks: raw.take("networks", |v| {
                Some(
                    string_keyed(v)
                        .map_or_else(ServiceNetworks::Other, ServiceNetworks::Attachments),
                )
            }),
            configs: raw.take("configs", |v| Some(Entries::Other(v))),
            secrets: raw.take("secrets", |v| Some(Entries::Other(v))),
            attributes: raw.attributes,
            field_tags: raw.tags,
            null_body: false,
        })
    }
}

/// A map whose keys are all strings, or the value back
///
/// Catches maps with tagged values, which the untagged enums cannot buffer.
fn string_keyed(value: Value) -> Result<IndexMap<String, Value>, Value> {
    match value {
        Value::Mapping(mapping) if mapping.keys().all(Value::is_string) => Ok(mapping
            .into_iter()
            .filter_map(|(key, value)| match key {
                Value::String(key) => Some((key, value)),
                _ => None,
            })
            .collect()),
        other => Err(other),
    }
}

/// A list-valued field, or a value that is not a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entries<T> {
    /// Ordered entries
    List(Vec<T>),
    /// Unrecognized shape, carried unchanged
    Other(Value),
}

impl<T> Entries<T> {
    /// Entries, if the field is a list
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[T]> {
        match self {
            Entries::List(items) => Some(items),
            Entries::Other(_) => None,
        }
    }

    /// Mutable entries, if the field is a list
    #[inline]
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<T>> {
        match self {
            Entries::List(items) => Some(items),
            Entries::Other(_) => None,
        }
    }
}

impl<T> From<Vec<T>> for Entries<T> {
    fn from(items: Vec<T>) -> Self {
        Entries::List(items)
    }
}

/// `depends_on`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    /// `[db, cache]`
    List(Vec<String>),
    /// `{db: {condition: service_healthy}}`; values are copied as-is
    Conditions(IndexMap<String, Value>),
    /// Unrecognized shape
    Other(Value),
}

/// One entry of a service's `volumes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VolumeMount {
    /// `source[:target[:mode]]`
    Short(String),
    /// `{type, source, target, ...}`
    Long(LongVolumeMount),
    /// Unrecognized shape
    Other(Value),
}

/// Long-form volume mount
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongVolumeMount {
    /// `volume`, `bind`, `tmpfs`, `npipe`, `cluster`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mount_type: Option<String>,

    /// Volume name or host path, depending on `type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// `target`, `read_only`, `volume`, `bind`, ...
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl LongVolumeMount {
    /// Mount of type `volume`
    #[must_use]
    pub fn volume(source: impl Into<String>, target: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert("target".to_string(), Value::String(target.into()));
        Self {
            mount_type: Some("volume".to_string()),
            source: Some(source.into()),
            attributes,
        }
    }

    /// Whether `source` names a root-level volume
    #[inline]
    #[must_use]
    pub fn is_named_volume(&self) -> bool {
        self.mount_type.as_deref() == Some("volume")
    }
}

/// A service's `networks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceNetworks {
    /// `[frontend, backend]`
    List(Vec<String>),
    /// `{frontend: {aliases: [api]}, backend: null}`; values are copied as-is
    Attachments(IndexMap<String, Value>),
    /// Unrecognized shape
    Other(Value),
}

/// One entry of a service's `configs` or `secrets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileReference {
    /// Bare name
    Name(String),
    /// `{source, target, uid, gid, mode}`
    Long(LongFileReference),
    /// Unrecognized shape
    Other(Value),
}

/// Long-form config/secret reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFileReference {
    /// Name of the root-level config/secret
    pub source: String,

    /// `target`, `uid`, `gid`, `mode`
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl LongFileReference {
    /// Reference mounted at `target`
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert("target".to_string(), Value::String(target.into()));
        Self {
            source: source.into(),
            attributes,
        }
    }
}

/// `extends`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extends {
    /// Bare service name
    Name(String),
    /// `{service, file}`
    Long(LongExtends),
    /// Unrecognized shape
    Other(Value),
}

/// Long-form `extends`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongExtends {
    /// Extended service
    pub service: String,

    /// `file`
    #[serde(flatten)]
    pub attributes: Attributes,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(yaml: &str) -> Service {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn depends_on_shapes() {
        let list = service("depends_on: [db, cache]");
        assert_eq!(
            list.depends_on,
            Some(DependsOn::List(vec!["db".to_string(), "cache".to_string()]))
        );

        let map = service("depends_on:\n  db:\n    condition: service_healthy\n");
        assert!(matches!(map.depends_on, Some(DependsOn::Conditions(ref m)) if m.contains_key("db")));

        let odd = service("depends_on: 42");
        assert!(matches!(odd.depends_on, Some(DependsOn::Other(_))));
    }

    #[test]
    fn volume_mount_shapes() {
        let svc = service(
            "volumes:\n  - db-data:/var/lib/data\n  - type: bind\n    source: ./cache\n    target: /cache\n  - 7\n",
        );
        let mounts = svc.volumes.unwrap();
        let mounts = mounts.as_list().unwrap();
        assert!(matches!(mounts[0], VolumeMount::Short(ref s) if s == "db-data:/var/lib/data"));
        match &mounts[1] {
            VolumeMount::Long(long) => {
                assert_eq!(long.mount_type.as_deref(), Some("bind"));
                assert_eq!(long.source.as_deref(), Some("./cache"));
                assert_eq!(long.attributes.get("target"), Some(&Value::String("/cache".into())));
                assert!(!long.is_named_volume());
            }
            other => panic!("expected long mount, got {other:?}"),
        }
        assert!(matches!(mounts[2], VolumeMount::Other(_)));
    }

    #[test]
    fn non_list_volumes_kept_as_other() {
        let svc = service("volumes: not-a-list");
        assert!(matches!(svc.volumes, Some(Entries::Other(_))));
    }

    #[test]
    fn network_shapes() {
        let list = service("networks: [frontend]");
        assert!(matches!(list.networks, Some(ServiceNetworks::List(_))));

        let map = service("networks:\n  frontend:\n    aliases: [app]\n  backend:\n");
        match map.networks {
            Some(ServiceNetworks::Attachments(attachments)) => {
                assert_eq!(attachments.len(), 2);
                assert_eq!(attachments.get("backend"), Some(&Value::Null));
            }
            other => panic!("expected attachments, got {other:?}"),
        }
    }

    #[test]
    fn file_reference_shapes() {
        let svc = service("secrets:\n  - db_password\n  - source: api_key\n    target: /run/secrets/key\n");
        let refs = svc.secrets.unwrap();
        let refs = refs.as_list().unwrap();
        assert!(matches!(refs[0], FileReference::Name(ref n) if n == "db_password"));
        assert!(matches!(refs[1], FileReference::Long(ref l) if l.source == "api_key"));
    }

    #[test]
    fn extends_shapes() {
        assert!(matches!(service("extends: base").extends, Some(Extends::Name(_))));
        let long = service("extends:\n  file: common.yml\n  service: base\n");
        match long.extends {
            Some(Extends::Long(ext)) => {
                assert_eq!(ext.service, "base");
                assert!(ext.attributes.contains_key("file"));
            }
            other => panic!("expected long extends, got {other:?}"),
        }
    }

    #[test]
    fn tagged_fields_load_and_store() {
        let svc = service("image: x\nports: !reset []\nnetworks: !override [front]\n");
        assert!(matches!(svc.networks, Some(ServiceNetworks::List(ref n)) if n == &["front"]));
        assert!(svc.field_tags.contains_key("networks"));
        assert!(matches!(svc.attribute("ports"), Some(Value::Tagged(_))));

        let text = serde_yaml::to_string(&svc).unwrap();
        assert!(text.contains("!reset"), "{text}");
        assert!(text.contains("!override"), "{text}");
        assert_eq!(service(&text), svc);
    }

    #[test]
    fn tagged_attachment_values_stay_attachments() {
        let svc = service("networks:\n  front: !reset {}\n  back:\n");
        match svc.networks {
            Some(ServiceNetworks::Attachments(attachments)) => {
                assert!(matches!(attachments["front"], Value::Tagged(_)));
                assert_eq!(attachments["back"], Value::Null);
            }
            other => panic!("expected attachments, got {other:?}"),
        }
    }

    #[test]
    fn null_fields_and_bodies_survive() {
        let svc = service("depends_on:\nimage: x\n");
        assert!(svc.depends_on.is_none());
        assert_eq!(svc.attribute("depends_on"), Some(&Value::Null));
        assert!(serde_yaml::to_string(&svc).unwrap().contains("depends_on"));

        let empty: Service = serde_yaml::from_str("~").unwrap();
        assert!(empty.null_body);
        assert_eq!(serde_yaml::to_value(&empty).unwrap(), Value::Null);
    }

    #[test]
    fn scalar_service_rejected() {
        assert!(serde_yaml::from_str::<Service>("nginx").is_err());
    }

    #[test]
    fn unmodelled_keys_are_attributes() {
        let svc = service("image: nginx:latest\nulimits:\n  nofile:\n    soft: 262144\n");
        assert_eq!(svc.attribute("image"), Some(&Value::String("nginx:latest".into())));
        assert!(svc.attribute("ulimits").is_some());
        assert!(svc.depends_on.is_none());
    }
}
