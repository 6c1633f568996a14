//! Network reference rewriting
//!
//! Handles both attachment shapes: a list of names, and a map of name →
//! attachment settings. Only the names change; `aliases`, `ipv4_address` and
//! the rest of an attachment's settings are in-network details and are
//! copied as they are.

use stackfork_model::{ServiceNetworks, Services};

use crate::options::Namer;
use crate::suffix::Suffix;

/// Rewrite network names in every service's `networks`
#[must_use]
pub fn rewrite_service_networks(services: &Services, suffix: &Suffix) -> Services {
    let mut out = services.clone();
    rewrite_network_references(&mut out, Namer::new(suffix));
    out
}

pub(crate) fn rewrite_network_references(services: &mut Services, namer: Namer<'_>) {
    for service in services.values_mut() {
        if let Some(networks) = service.networks.as_mut() {
            rewrite_attachments(networks, namer);
        }
    }
}

fn rewrite_attachments(networks: &mut ServiceNetworks, namer: Namer<'_>) {
    match networks {
        ServiceNetworks::List(names) => {
            for name in names {
                *name = namer.rename(name);
            }
        }
        ServiceNetworks::Attachments(attachments) => {
            *attachments = std::mem::take(attachments)
                .into_iter()
                .map(|(name, settings)| (namer.rename(&name), settings))
                .collect();
        }
        ServiceNetworks::Other(_) => tracing::trace!("networks has an unrecognized shape; left as-is"),
    }
}
