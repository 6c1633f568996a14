//! Config and secret reference rewriting
//!
//! Both fields share one shape: a list of bare names or `{source, target,
//! ...}` objects. `source` is the root-level name; `target` is a path inside
//! the container and is never touched.

use stackfork_model::{Entries, FileReference, Service, Services};

use crate::options::Namer;
use crate::suffix::Suffix;

/// Rewrite config names in every service's `configs`
#[must_use]
pub fn rewrite_service_configs(services: &Services, suffix: &Suffix) -> Services {
    let mut out = services.clone();
    rewrite_config_references(&mut out, Namer::new(suffix));
    out
}

/// Rewrite secret names in every service's `secrets`
#[must_use]
pub fn rewrite_service_secrets(services: &Services, suffix: &Suffix) -> Services {
    let mut out = services.clone();
    rewrite_secret_references(&mut out, Namer::new(suffix));
    out
}

pub(crate) fn rewrite_config_references(services: &mut Services, namer: Namer<'_>) {
    rewrite_field(services, |service| service.configs.as_mut(), namer);
}

pub(crate) fn rewrite_secret_references(services: &mut Services, namer: Namer<'_>) {
    rewrite_field(services, |service| service.secrets.as_mut(), namer);
}

fn rewrite_field<F>(services: &mut Services, field: F, namer: Namer<'_>)
where
    F: Fn(&mut Service) -> Option<&mut Entries<FileReference>>,
{
    for service in services.values_mut() {
        let Some(references) = field(service).and_then(Entries::as_list_mut) else {
            continue;
        };
        for reference in references {
            match reference {
                FileReference::Name(name) => *name = namer.rename(name),
                FileReference::Long(long) => long.source = namer.rename(&long.source),
                FileReference::Other(_) => {
                    tracing::trace!("file reference has an unrecognized shape; left as-is");
                }
            }
        }
    }
}
