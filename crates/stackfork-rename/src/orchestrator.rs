//! Whole-document renaming
//!
//! Composes the section renamer, the service renamer and the per-kind
//! reference rewriters. Every entry point borrows the input document and
//! returns a new one; the input stays valid for diffing.

use stackfork_model::{ComposeDocument, ResourceKind, Services};

use crate::files::{rewrite_config_references, rewrite_secret_references};
use crate::networks::rewrite_network_references;
use crate::options::{Namer, RenameOptions};
use crate::root::rename_section;
use crate::services::rename_service_map;
use crate::suffix::Suffix;
use crate::volumes::{count_references, rewrite_volume_references};

/// Document renamer
///
/// Holds the options; the free functions [`rename_all`] and
/// [`rename_one_kind`] use [`RenameOptions::default`].
///
/// # Example
/// ```
/// # use stackfork_model::ComposeDocument;
/// # use stackfork_rename::{RenameOptions, Renamer, Suffix};
/// let doc = ComposeDocument::from_yaml(
///     "services:\n  web:\n    networks: [frontend, ingress]\nnetworks:\n  frontend: {}\n  ingress:\n    external: true\n",
/// ).unwrap();
///
/// let renamer = Renamer::new(RenameOptions::new().preserve_network("ingress"));
/// let out = renamer.rename_all(&doc, &Suffix::new("h1"));
///
/// let networks = out.networks.as_ref().unwrap();
/// assert!(networks.contains_key("frontend-h1"));
/// assert!(networks.contains_key("ingress"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Renamer {
    options: RenameOptions,
}

impl Renamer {
    /// Create renamer
    #[inline]
    #[must_use]
    pub fn new(options: RenameOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    #[inline]
    #[must_use]
    pub fn options(&self) -> &RenameOptions {
        &self.options
    }

    /// Rename services, every root section, and every reference to them
    ///
    /// All passes use the same `suffix`, so references line up with keys.
    #[must_use]
    pub fn rename_all(&self, doc: &ComposeDocument, suffix: &Suffix) -> ComposeDocument {
        self.rename_kinds(doc, &ResourceKind::ALL, suffix)
    }

    /// Rename services, the root sections of `kinds`, and every reference to
    /// them
    ///
    /// Families not listed keep their names, and so do the service fields
    /// referencing them.
    #[must_use]
    pub fn rename_kinds(
        &self,
        doc: &ComposeDocument,
        kinds: &[ResourceKind],
        suffix: &Suffix,
    ) -> ComposeDocument {
        let mut out = doc.clone();

        if let Some(services) = out.services.take() {
            let mut services = rename_service_map(services, Namer::new(suffix));
            for &kind in kinds {
                self.rewrite_references(kind, &mut services, suffix);
            }
            tracing::debug!(
                "Renamed {} services ({} named volume mounts) with suffix '{}'",
                services.len(),
                count_references(&services),
                suffix
            );
            out.services = Some(services);
        }

        for &kind in kinds {
            self.rename_section(&mut out, kind, suffix);
        }

        out
    }

    /// Rename one resource family and its references only
    ///
    /// Service names and the other three families are left as they are.
    #[must_use]
    pub fn rename_one_kind(
        &self,
        doc: &ComposeDocument,
        kind: ResourceKind,
        suffix: &Suffix,
    ) -> ComposeDocument {
        let mut out = doc.clone();

        if let Some(services) = out.services.as_mut() {
            self.rewrite_references(kind, services, suffix);
        }
        self.rename_section(&mut out, kind, suffix);

        out
    }

    fn namer<'a>(&'a self, kind: ResourceKind, suffix: &'a Suffix) -> Namer<'a> {
        match kind {
            ResourceKind::Network => Namer::preserving(suffix, &self.options.preserved_networks),
            ResourceKind::Volume | ResourceKind::Config | ResourceKind::Secret => Namer::new(suffix),
        }
    }

    fn rename_section(&self, doc: &mut ComposeDocument, kind: ResourceKind, suffix: &Suffix) {
        let slot = doc.section_slot_mut(kind);
        if let Some(section) = slot.take() {
            let count = section.len();
            *slot = Some(rename_section(section, self.namer(kind, suffix)));
            tracing::debug!("Renamed {} root {} definitions", count, kind);
        }
    }

    fn rewrite_references(&self, kind: ResourceKind, services: &mut Services, suffix: &Suffix) {
        let namer = self.namer(kind, suffix);
        match kind {
            ResourceKind::Volume => rewrite_volume_references(services, namer),
            ResourceKind::Network => rewrite_network_references(services, namer),
            ResourceKind::Config => rewrite_config_references(services, namer),
            ResourceKind::Secret => rewrite_secret_references(services, namer),
        }
        tracing::trace!(
            "Rewrote {} references across {} services with suffix '{}'",
            kind,
            services.len(),
            namer.suffix()
        );
    }
}

/// Rename everything with default options
#[must_use]
pub fn rename_all(doc: &ComposeDocument, suffix: &Suffix) -> ComposeDocument {
    Renamer::default().rename_all(doc, suffix)
}

/// Rename one resource family with default options
#[must_use]
pub fn rename_one_kind(doc: &ComposeDocument, kind: ResourceKind, suffix: &Suffix) -> ComposeDocument {
    Renamer::default().rename_one_kind(doc, kind, suffix)
}
