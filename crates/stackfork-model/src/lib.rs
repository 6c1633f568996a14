//! stackfork Compose Model
//!
//! Typed view of a compose document, shaped for identifier rewriting.
//!
//! # Core Concepts
//!
//! - [`ComposeDocument`]: root document with `services` and the four named
//!   resource sections (`volumes`, `networks`, `configs`, `secrets`)
//! - [`Definition`]: opaque root-level resource payload, carried verbatim
//! - [`Service`]: service definition with typed reference fields
//! - [`ResourceKind`]: the four root-level resource families
//!
//! Every polymorphic field is an untagged enum with one variant per shape the
//! compose format allows, plus an `Other` variant holding the raw value. A
//! field whose shape is not recognized therefore survives a load/store cycle
//! unchanged instead of failing the whole document. Keys this model does not
//! name, and named keys written as `null`, are kept in `attributes` maps.
//! YAML merge keys are resolved on load; YAML tags on typed fields are kept
//! in `field_tags` and written back out.
//!
//! # Example
//!
//! ```rust
//! use stackfork_model::{ComposeDocument, ResourceKind};
//!
//! let doc = ComposeDocument::from_yaml("volumes:\n  db-data:\n    driver: local\n").unwrap();
//! assert!(doc.section(ResourceKind::Volume).unwrap().contains_key("db-data"));
//! assert!(doc.section(ResourceKind::Config).is_none());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod codec;
mod document;
mod error;
mod raw;
mod service;

pub use document::{ComposeDocument, Definition, ResourceKind, Section, Services};
pub use error::ModelError;
pub use raw::FieldTags;
pub use service::{
    Attributes, DependsOn, Entries, Extends, FileReference, LongExtends, LongFileReference,
    LongVolumeMount, Service, ServiceNetworks, VolumeMount,
};

/// Re-exported raw value type used for opaque payloads
pub use serde_yaml::Value;

/// Re-exported YAML tag type held in `field_tags`
pub use serde_yaml::value::Tag;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
