//! Volume reference rewriting
//!
//! Short form `source[:target[:mode]]`: the source is a named volume unless it
//! is a host path. Only the first path segment of a named source is the
//! volume name (`backrest/data` mounts a subdirectory of volume `backrest`).
//!
//! Long form `{type, source, ...}`: `source` is renamed only for
//! `type: volume`.

use stackfork_model::{Entries, LongVolumeMount, Services, VolumeMount};

use crate::options::Namer;
use crate::services::split_first;
use crate::suffix::Suffix;

/// Rewrite named-volume references in every service's `volumes`
#[must_use]
pub fn rewrite_service_volumes(services: &Services, suffix: &Suffix) -> Services {
    let mut out = services.clone();
    rewrite_volume_references(&mut out, Namer::new(suffix));
    out
}

pub(crate) fn rewrite_volume_references(services: &mut Services, namer: Namer<'_>) {
    for (service_name, service) in services.iter_mut() {
        let Some(mounts) = service.volumes.as_mut() else {
            continue;
        };
        let Some(mounts) = mounts.as_list_mut() else {
            tracing::trace!("volumes of '{}' is not a list; left as-is", service_name);
            continue;
        };
        for mount in mounts {
            rewrite_mount(mount, namer);
        }
    }
}

fn rewrite_mount(mount: &mut VolumeMount, namer: Namer<'_>) {
    match mount {
        VolumeMount::Short(spec) => *spec = rename_short_mount(spec, namer),
        VolumeMount::Long(long) => rewrite_long_mount(long, namer),
        VolumeMount::Other(_) => tracing::trace!("volume entry has an unrecognized shape; left as-is"),
    }
}

fn rewrite_long_mount(long: &mut LongVolumeMount, namer: Namer<'_>) {
    if !long.is_named_volume() {
        return;
    }
    if let Some(source) = long.source.as_mut() {
        if !source.is_empty() {
            *source = rename_volume_source(source, namer);
        }
    }
}

/// Rename the source of a short-form mount, leaving `:target[:mode]` intact
fn rename_short_mount(spec: &str, namer: Namer<'_>) -> String {
    let (source, rest) = split_first(spec, ':');
    if source.is_empty() || is_host_path(source) {
        tracing::trace!("'{}' is a bind mount or anonymous volume; left as-is", spec);
        return spec.to_string();
    }
    format!("{}{rest}", rename_volume_source(source, namer))
}

/// `name` or `name/sub/dir`; only `name` is the volume
fn rename_volume_source(source: &str, namer: Namer<'_>) -> String {
    let (name, subpath) = split_first(source, '/');
    format!("{}{subpath}", namer.rename(name))
}

/// Whether a short-form source is a host path rather than a volume name
///
/// Relative (`./`, `../`, `.`, `..`), absolute, home-relative and
/// variable-expanded sources all resolve on the host.
pub(crate) fn is_host_path(source: &str) -> bool {
    source.starts_with('/')
        || source.starts_with("./")
        || source.starts_with("../")
        || source.starts_with('~')
        || source.starts_with('$')
        || source == "."
        || source == ".."
}

/// Number of named-volume references in a service map
pub(crate) fn count_references(services: &Services) -> usize {
    services
        .values()
        .filter_map(|service| service.volumes.as_ref().and_then(Entries::as_list))
        .flatten()
        .filter(|mount| match mount {
            VolumeMount::Short(spec) => {
                let (source, _) = split_first(spec, ':');
                !source.is_empty() && !is_host_path(source)
            }
            VolumeMount::Long(long) => long.is_named_volume() && long.source.is_some(),
            VolumeMount::Other(_) => false,
        })
        .count()
}
