//! Root section renaming
//!
//! Shared by all four resource families: only keys change, payloads are
//! copied verbatim.

use stackfork_model::Section;

use crate::options::Namer;
use crate::suffix::Suffix;

/// Rename every key of a root-level section
///
/// `None` stays `None`: an absent section is never turned into an empty one.
/// Cardinality and order are preserved.
///
/// # Example
/// ```
/// # use stackfork_model::{Definition, Section};
/// # use stackfork_rename::{rename_root, Suffix};
/// let mut volumes = Section::new();
/// volumes.insert("db-data".to_string(), Definition::empty());
///
/// let renamed = rename_root(Some(&volumes), &Suffix::new("af045046")).unwrap();
/// assert!(renamed.contains_key("db-data-af045046"));
/// assert!(rename_root(None, &Suffix::new("af045046")).is_none());
/// ```
#[must_use]
pub fn rename_root(defs: Option<&Section>, suffix: &Suffix) -> Option<Section> {
    defs.map(|section| rename_section(section.clone(), Namer::new(suffix)))
}

pub(crate) fn rename_section(section: Section, namer: Namer<'_>) -> Section {
    section
        .into_iter()
        .map(|(name, definition)| (namer.rename(&name), definition))
        .collect()
}
