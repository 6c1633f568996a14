//! Service name renaming
//!
//! Renames the keys of the `services` map and every field that names a
//! sibling service: `depends_on`, `volumes_from`, `links`, `extends`. The
//! fixed `container_name` is suffixed too, since it is just as global on the
//! container engine as the service name.
//!
//! Sibling references are renamed unconditionally. A dependency on a name
//! that is not a key of `services` stays dangling, under its new name.

use stackfork_model::{DependsOn, Entries, Extends, Service, Services};

use crate::options::Namer;
use crate::suffix::Suffix;

/// `volumes_from` prefix naming a container outside the document
const CONTAINER_PREFIX: &str = "container:";

/// `volumes_from` prefix naming a sibling service explicitly
const SERVICE_PREFIX: &str = "service:";

/// Rename every service and its sibling references
///
/// Volume, network, config and secret references are left alone; those are
/// handled by the per-kind rewriters.
#[must_use]
pub fn rename_services(services: &Services, suffix: &Suffix) -> Services {
    rename_service_map(services.clone(), Namer::new(suffix))
}

pub(crate) fn rename_service_map(services: Services, namer: Namer<'_>) -> Services {
    services
        .into_iter()
        .map(|(name, mut service)| {
            rewrite_sibling_references(&mut service, namer);
            (namer.rename(&name), service)
        })
        .collect()
}

fn rewrite_sibling_references(service: &mut Service, namer: Namer<'_>) {
    if let Some(container_name) = service.container_name.as_mut() {
        *container_name = namer.rename(container_name);
    }

    if let Some(depends_on) = service.depends_on.as_mut() {
        rewrite_depends_on(depends_on, namer);
    }

    if let Some(entries) = service.volumes_from.as_mut().and_then(Entries::as_list_mut) {
        for entry in entries {
            *entry = rename_volumes_from(entry, namer);
        }
    }

    if let Some(entries) = service.links.as_mut().and_then(Entries::as_list_mut) {
        for entry in entries {
            *entry = rename_link(entry, namer);
        }
    }

    if let Some(extends) = service.extends.as_mut() {
        match extends {
            Extends::Name(base) => *base = namer.rename(base),
            Extends::Long(long) => long.service = namer.rename(&long.service),
            Extends::Other(_) => tracing::trace!("extends has an unrecognized shape; left as-is"),
        }
    }
}

fn rewrite_depends_on(depends_on: &mut DependsOn, namer: Namer<'_>) {
    match depends_on {
        DependsOn::List(names) => {
            for name in names {
                *name = namer.rename(name);
            }
        }
        DependsOn::Conditions(conditions) => {
            *conditions = std::mem::take(conditions)
                .into_iter()
                .map(|(name, condition)| (namer.rename(&name), condition))
                .collect();
        }
        DependsOn::Other(_) => tracing::trace!("depends_on has an unrecognized shape; left as-is"),
    }
}

/// `name[:mode]`, `service:name[:mode]`, `container:name[:mode]`
fn rename_volumes_from(entry: &str, namer: Namer<'_>) -> String {
    if entry.starts_with(CONTAINER_PREFIX) {
        return entry.to_string();
    }
    let (prefix, rest) = match entry.strip_prefix(SERVICE_PREFIX) {
        Some(rest) => (SERVICE_PREFIX, rest),
        None => ("", entry),
    };
    let (name, mode) = split_first(rest, ':');
    if name.is_empty() {
        return entry.to_string();
    }
    format!("{prefix}{}{mode}", namer.rename(name))
}

/// `service[:alias]`; the alias is a hostname and keeps its spelling
fn rename_link(entry: &str, namer: Namer<'_>) -> String {
    let (name, alias) = split_first(entry, ':');
    if name.is_empty() {
        return entry.to_string();
    }
    format!("{}{alias}", namer.rename(name))
}

/// Split at the first `sep`, keeping the separator on the tail
pub(crate) fn split_first(s: &str, sep: char) -> (&str, &str) {
    match s.find(sep) {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stackfork_model::{LongExtends, Value};

    fn services(yaml: &str) -> Services {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn keys_renamed() {
        let input = services("mail:\n  image: smtp\nplausible_db:\n  image: postgres\n");
        let out = rename_services(&input, &Suffix::new("testhash"));
        let keys: Vec<_> = out.keys().cloned().collect();
        assert_eq!(keys, vec!["mail-testhash", "plausible_db-testhash"]);
        assert_eq!(
            out["mail-testhash"].attribute("image"),
            Some(&Value::String("smtp".to_string()))
        );
    }

    #[test]
    fn depends_on_list() {
        let input = services("plausible:\n  depends_on: [plausible_db, plausible_events_db, mail]\n");
        let out = rename_services(&input, &Suffix::new("testhash"));
        assert_eq!(
            out["plausible-testhash"].depends_on,
            Some(DependsOn::List(vec![
                "plausible_db-testhash".to_string(),
                "plausible_events_db-testhash".to_string(),
                "mail-testhash".to_string(),
            ]))
        );
    }

    #[test]
    fn depends_on_conditions_keep_metadata() {
        let input = services(
            "web:\n  depends_on:\n    db:\n      condition: service_healthy\n    api:\n      condition: service_started\n",
        );
        let expected = services(
            "web-xyz:\n  depends_on:\n    db-xyz:\n      condition: service_healthy\n    api-xyz:\n      condition: service_started\n",
        );
        assert_eq!(rename_services(&input, &Suffix::new("xyz")), expected);
    }

    #[test]
    fn dangling_dependency_renamed_anyway() {
        let input = services("web:\n  depends_on: [ghost]\n");
        let out = rename_services(&input, &Suffix::new("s"));
        assert_eq!(
            out["web-s"].depends_on,
            Some(DependsOn::List(vec!["ghost-s".to_string()]))
        );
    }

    #[test]
    fn container_name_suffixed() {
        let input = services("app:\n  container_name: app-container\n");
        let out = rename_services(&input, &Suffix::new("testprefix"));
        assert_eq!(
            out["app-testprefix"].container_name.as_deref(),
            Some("app-container-testprefix")
        );
    }

    #[test]
    fn volumes_from_forms() {
        let n = Suffix::new("h");
        let namer = Namer::new(&n);
        assert_eq!(rename_volumes_from("data", namer), "data-h");
        assert_eq!(rename_volumes_from("data:ro", namer), "data-h:ro");
        assert_eq!(rename_volumes_from("service:data:rw", namer), "service:data-h:rw");
        assert_eq!(rename_volumes_from("container:legacy", namer), "container:legacy");
    }

    #[test]
    fn links_keep_alias() {
        let input = services("web:\n  links: [db, \"cache:redis\"]\n");
        let out = rename_services(&input, &Suffix::new("h"));
        assert_eq!(
            out["web-h"].links,
            Some(Entries::List(vec!["db-h".to_string(), "cache-h:redis".to_string()]))
        );
    }

    #[test]
    fn extends_renamed_with_or_without_file() {
        let input = services(
            "web:\n  extends:\n    file: common.yml\n    service: base-web\napi:\n  extends: base\n",
        );
        let out = rename_services(&input, &Suffix::new("testhash"));
        match &out["web-testhash"].extends {
            Some(Extends::Long(LongExtends { service, attributes })) => {
                assert_eq!(service, "base-web-testhash");
                assert_eq!(attributes.get("file"), Some(&Value::String("common.yml".into())));
            }
            other => panic!("unexpected extends: {other:?}"),
        }
        assert_eq!(
            out["api-testhash"].extends,
            Some(Extends::Name("base-testhash".to_string()))
        );
    }

    #[test]
    fn unrecognized_depends_on_left_alone() {
        let input = services("web:\n  depends_on: 3\n");
        let out = rename_services(&input, &Suffix::new("h"));
        assert!(matches!(out["web-h"].depends_on, Some(DependsOn::Other(_))));
    }

    #[test]
    fn resource_references_untouched() {
        let input = services("web:\n  volumes: [\"data:/data\"]\n  networks: [front]\n");
        let out = rename_services(&input, &Suffix::new("h"));
        assert_eq!(out["web-h"].volumes, input["web"].volumes);
        assert_eq!(out["web-h"].networks, input["web"].networks);
    }

    #[test]
    fn split_first_keeps_separator() {
        assert_eq!(split_first("a:b:c", ':'), ("a", ":b:c"));
        assert_eq!(split_first("abc", ':'), ("abc", ""));
    }
}
