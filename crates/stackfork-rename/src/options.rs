//! Renaming options and the per-pass name mapper

use std::collections::BTreeSet;

use crate::suffix::Suffix;

/// Options shared by every renaming pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameOptions {
    /// Networks that keep their name, both at the root and in every service
    /// attachment (a shared ingress network created outside the document)
    pub preserved_networks: BTreeSet<String>,
}

impl RenameOptions {
    /// Options with nothing preserved
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: keep `name` unrenamed wherever it is a network name
    #[must_use]
    pub fn preserve_network(mut self, name: impl Into<String>) -> Self {
        self.preserved_networks.insert(name.into());
        self
    }
}

/// Maps an identifier to its renamed form for one pass
#[derive(Debug, Clone, Copy)]
pub(crate) struct Namer<'a> {
    suffix: &'a Suffix,
    preserved: Option<&'a BTreeSet<String>>,
}

impl<'a> Namer<'a> {
    /// Rename every name
    #[inline]
    pub(crate) fn new(suffix: &'a Suffix) -> Self {
        Self {
            suffix,
            preserved: None,
        }
    }

    /// Rename every name not in `preserved`
    #[inline]
    pub(crate) fn preserving(suffix: &'a Suffix, preserved: &'a BTreeSet<String>) -> Self {
        Self {
            suffix,
            preserved: Some(preserved),
        }
    }

    #[inline]
    pub(crate) fn suffix(&self) -> &Suffix {
        self.suffix
    }

    /// Renamed form of `name`
    ///
    /// A preserved name is kept. So is a name whose renamed form (or the
    /// renamed form of that, and so on) is preserved: renaming it would land
    /// on a key that is kept, and two definitions would share one name.
    pub(crate) fn rename(&self, name: &str) -> String {
        let renamed = self.suffix.apply(name);
        let Some(keep) = self.preserved else {
            return renamed;
        };
        if keep.contains(name) {
            return name.to_string();
        }

        let longest = keep.iter().map(String::len).max().unwrap_or(0);
        let mut next = renamed.clone();
        while next.len() <= longest {
            if keep.contains(&next) {
                tracing::warn!(
                    "Keeping '{name}' unrenamed: '{renamed}' would collide with preserved '{next}'"
                );
                return name.to_string();
            }
            next = self.suffix.apply(&next);
        }
        renamed
    }
}
