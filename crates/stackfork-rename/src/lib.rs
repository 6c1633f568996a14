//! stackfork Renaming Engine
//!
//! Gives every service, volume, network, config and secret of a compose
//! document a collision-free name, and rewrites every reference to it in
//! lock-step, so one definition can be deployed many times side by side.
//!
//! # Core Concepts
//!
//! - [`Suffix`]: the token appended as `<name>-<suffix>`; random via
//!   [`new_token`] or caller-supplied
//! - [`rename_root`]: renames the keys of one root section
//! - [`rename_services`]: renames services and their sibling references
//! - [`rewrite_service_volumes`], [`rewrite_service_networks`],
//!   [`rewrite_service_configs`], [`rewrite_service_secrets`]: rewrite the
//!   identifier part of each reference, never host paths, targets or aliases
//! - [`Renamer`]: whole-document compositions ([`rename_all`],
//!   [`rename_one_kind`])
//! - [`randomize_deployable`]: renamed document plus env file for one
//!   deployable instance
//!
//! All functions borrow their input and return new values. Fields of an
//! unrecognized shape are passed through unchanged.
//!
//! # Example
//!
//! ```rust
//! use stackfork_model::ComposeDocument;
//! use stackfork_rename::{rename_all, Suffix};
//!
//! let doc = ComposeDocument::from_yaml(r#"
//! services:
//!   plausible_db:
//!     image: postgres:14-alpine
//!     volumes:
//!       - db-data:/var/lib/postgresql/data
//! volumes:
//!   db-data:
//!     driver: local
//! "#).unwrap();
//!
//! let renamed = rename_all(&doc, &Suffix::new("af045046"));
//! assert!(renamed.volumes.as_ref().unwrap().contains_key("db-data-af045046"));
//! assert!(renamed.service("plausible_db-af045046").is_some());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod deployable;
mod files;
mod networks;
mod options;
mod orchestrator;
mod root;
mod services;
mod suffix;
mod volumes;

pub use deployable::{
    inject_variable, randomize_deployable, Deployable, DeployableOptions, DEFAULT_SUFFIX_VARIABLE,
};
pub use files::{rewrite_service_configs, rewrite_service_secrets};
pub use networks::rewrite_service_networks;
pub use options::RenameOptions;
pub use orchestrator::{rename_all, rename_one_kind, Renamer};
pub use root::rename_root;
pub use services::rename_services;
pub use suffix::{new_token, Suffix, SuffixError, TOKEN_BYTES};
pub use volumes::rewrite_service_volumes;

pub use stackfork_model::ResourceKind;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
