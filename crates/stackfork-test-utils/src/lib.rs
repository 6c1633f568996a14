//! Testing utilities for the stackfork workspace
//!
//! Shared compose fixtures and a reference checker.
//!
//! The checker reads typed fields only. A reference field the model could not
//! type (left raw in the attributes, or typed as an opaque `Other` block) is
//! reported by [`opaque_references`] and counts as dangling: nothing has
//! checked it.

#![allow(missing_docs)]

use stackfork_model::{
    ComposeDocument, DependsOn, Entries, Extends, FileReference, ResourceKind, Service,
    ServiceNetworks, Value, VolumeMount,
};

/// Service keys that name other resources, plus the merge key
const REFERENCE_FIELDS: [&str; 9] = [
    "depends_on",
    "volumes",
    "volumes_from",
    "links",
    "extends",
    "networks",
    "configs",
    "secrets",
    "<<",
];

/// Analytics stack: short and long volume mounts, bind mounts, list
/// `depends_on`, ulimits.
pub const ANALYTICS_STACK: &str = r#"
services:
  mail:
    image: bytemark/smtp
    restart: always

  plausible_db:
    image: postgres:14-alpine
    restart: always
    networks:
      - backend
    volumes:
      - db-data:/var/lib/postgresql/data
    environment:
      - POSTGRES_PASSWORD=postgres

  plausible_events_db:
    image: clickhouse/clickhouse-server:23.3.7.5-alpine
    restart: always
    volumes:
      - event-data:/var/lib/clickhouse
      - event-logs:/var/log/clickhouse-server
      - ./clickhouse/clickhouse-config.xml:/etc/clickhouse-server/config.d/logging.xml:ro
    ulimits:
      nofile:
        soft: 262144
        hard: 262144

  plausible:
    image: plausible/analytics:v2.0
    restart: always
    command: sh -c "sleep 10 && /entrypoint.sh run"
    depends_on:
      - plausible_db
      - plausible_events_db
      - mail
    ports:
      - 127.0.0.1:8000:8000
    env_file:
      - plausible-conf.env
    volumes:
      - type: volume
        source: plausible-data
        target: /data

volumes:
  db-data:
    driver: local
  event-data:
    driver: local
  event-logs:
    driver: local
  plausible-data:
    driver: local

networks:
  backend:
    driver: bridge
"#;

/// Web stack touching every reference field and every section.
pub const WEB_STACK: &str = r#"
version: "3.8"

services:
  web:
    image: nginx:latest
    container_name: web_container
    depends_on:
      app:
        condition: service_healthy
      cache:
        condition: service_started
    networks:
      frontend:
        aliases:
          - web
      backend:
    volumes_from:
      - data:ro
    links:
      - cache:redis
    extends:
      file: common.yml
      service: base_service
    configs:
      - source: web_config
        target: /etc/nginx/nginx.conf
    healthcheck:
      test: ["CMD", "curl", "-f", "http://localhost"]
      interval: 30s
    deploy:
      resources:
        limits:
          cpus: "0.5"
          memory: 256M
      placement:
        constraints:
          - node.role == worker

  app:
    image: node:20
    networks:
      - backend
      - frontend
    volumes:
      - app-data:/usr/src/app
      - ./src:/usr/src/app/src:ro
    secrets:
      - db_password
    configs:
      - app_config

  cache:
    image: redis:7
    networks:
      - backend

  data:
    image: busybox
    volumes:
      - /data

  base_service:
    image: base:latest

networks:
  frontend:
    driver: bridge
  backend:
    driver: bridge
    driver_opts:
      com.docker.network.bridge.enable_icc: "true"

volumes:
  app-data:

configs:
  web_config:
    file: ./web-config.yml
    template_driver: golang
  app_config:
    file: ./app_config.yml

secrets:
  db_password:
    file: ./db_password.txt
"#;

/// Parse a fixture
///
/// # Panics
/// Panics if the fixture is not a valid document
#[must_use]
pub fn load(yaml: &str) -> ComposeDocument {
    ComposeDocument::from_yaml(yaml).expect("fixture should parse")
}

#[must_use]
pub fn analytics_stack() -> ComposeDocument {
    load(ANALYTICS_STACK)
}

#[must_use]
pub fn web_stack() -> ComposeDocument {
    load(WEB_STACK)
}

/// A reference from a service to a name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reference {
    pub service: String,
    pub field: &'static str,
    pub name: String,
}

/// Every name-based reference in the document
///
/// Written independently of the engine so it can serve as an oracle.
#[must_use]
pub fn references(doc: &ComposeDocument) -> Vec<Reference> {
    let mut out = Vec::new();
    let Some(services) = doc.services.as_ref() else {
        return out;
    };

    for (service_name, service) in services {
        let mut push = |field: &'static str, name: &str| {
            out.push(Reference {
                service: service_name.clone(),
                field,
                name: name.to_string(),
            });
        };

        match &service.depends_on {
            Some(DependsOn::List(names)) => names.iter().for_each(|n| push("depends_on", n)),
            Some(DependsOn::Conditions(map)) => map.keys().for_each(|n| push("depends_on", n)),
            _ => {}
        }

        if let Some(Extends::Long(ext)) = &service.extends {
            push("extends", &ext.service);
        } else if let Some(Extends::Name(name)) = &service.extends {
            push("extends", name);
        }

        for mount in list(&service.volumes) {
            match mount {
                VolumeMount::Short(spec) => {
                    let source = spec.split(':').next().unwrap_or_default();
                    let volume = source.split('/').next().unwrap_or_default();
                    let host = source.starts_with('/') || source.starts_with('.');
                    if !host && !volume.is_empty() {
                        push("volumes", volume);
                    }
                }
                VolumeMount::Long(long) if long.is_named_volume() => {
                    if let Some(source) = &long.source {
                        push("volumes", source);
                    }
                }
                _ => {}
            }
        }

        match &service.networks {
            Some(ServiceNetworks::List(names)) => names.iter().for_each(|n| push("networks", n)),
            Some(ServiceNetworks::Attachments(map)) => map.keys().for_each(|n| push("networks", n)),
            _ => {}
        }

        for (field, entries) in [("configs", &service.configs), ("secrets", &service.secrets)] {
            for reference in list(entries) {
                match reference {
                    FileReference::Name(name) => push(field, name),
                    FileReference::Long(long) => push(field, &long.source),
                    FileReference::Other(_) => {}
                }
            }
        }
    }

    out
}

/// Reference fields whose content was never typed
///
/// `name` is the field key. Scalars are ignored; only lists and maps can hide
/// names.
#[must_use]
pub fn opaque_references(doc: &ComposeDocument) -> Vec<Reference> {
    let Some(services) = doc.services.as_ref() else {
        return Vec::new();
    };

    services
        .iter()
        .flat_map(|(service_name, service)| {
            REFERENCE_FIELDS
                .into_iter()
                .filter(move |field| opaque_field(service, field).is_some_and(may_hold_names))
                .map(move |field| Reference {
                    service: service_name.clone(),
                    field,
                    name: field.to_string(),
                })
        })
        .collect()
}

/// References that name no existing key, plus every opaque reference
#[must_use]
pub fn dangling(doc: &ComposeDocument) -> Vec<Reference> {
    references(doc)
        .into_iter()
        .filter(|reference| !resolves(doc, reference))
        .chain(opaque_references(doc))
        .collect()
}

fn opaque_field<'a>(service: &'a Service, field: &str) -> Option<&'a Value> {
    let typed = match field {
        "depends_on" => match &service.depends_on {
            Some(DependsOn::Other(value)) => Some(value),
            _ => None,
        },
        "volumes" => other(&service.volumes),
        "volumes_from" => other(&service.volumes_from),
        "links" => other(&service.links),
        "extends" => match &service.extends {
            Some(Extends::Other(value)) => Some(value),
            _ => None,
        },
        "networks" => match &service.networks {
            Some(ServiceNetworks::Other(value)) => Some(value),
            _ => None,
        },
        "configs" => other(&service.configs),
        "secrets" => other(&service.secrets),
        _ => None,
    };
    typed.or_else(|| service.attribute(field))
}

fn may_hold_names(value: &Value) -> bool {
    match value {
        Value::Sequence(_) | Value::Mapping(_) => true,
        Value::Tagged(tagged) => may_hold_names(&tagged.value),
        _ => false,
    }
}

fn other<T>(entries: &Option<Entries<T>>) -> Option<&Value> {
    match entries {
        Some(Entries::Other(value)) => Some(value),
        _ => None,
    }
}

fn resolves(doc: &ComposeDocument, reference: &Reference) -> bool {
    let kind = match reference.field {
        "depends_on" | "extends" => return doc.service(&reference.name).is_some(),
        "volumes" => ResourceKind::Volume,
        "networks" => ResourceKind::Network,
        "configs" => ResourceKind::Config,
        _ => ResourceKind::Secret,
    };
    doc.section(kind)
        .is_some_and(|section| section.contains_key(&reference.name))
}

fn list<T>(entries: &Option<Entries<T>>) -> &[T] {
    entries.as_ref().and_then(Entries::as_list).unwrap_or_default()
}
