//! Randomized deployables
//!
//! Packages a fully renamed document together with the env file that
//! accompanies it. The suffix is exported to the stack through an env
//! variable so templates can refer to renamed resources. No shared network
//! is attached to any service: the instance stays isolated from its
//! siblings. Named volumes are isolated too unless
//! [`DeployableOptions::isolate_volumes`] is turned off, in which case every
//! instance mounts the same volumes.

use stackfork_model::{ComposeDocument, ResourceKind};

use crate::options::RenameOptions;
use crate::orchestrator::Renamer;
use crate::suffix::Suffix;

/// Env variable carrying the suffix, unless configured otherwise
pub const DEFAULT_SUFFIX_VARIABLE: &str = "COMPOSE_PREFIX";

/// Options for [`randomize_deployable`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployableOptions {
    /// Renaming options
    pub rename: RenameOptions,
    /// Env variable that receives the suffix
    pub suffix_variable: String,
    /// Give each instance its own named volumes
    pub isolate_volumes: bool,
}

impl Default for DeployableOptions {
    fn default() -> Self {
        Self {
            rename: RenameOptions::default(),
            suffix_variable: DEFAULT_SUFFIX_VARIABLE.to_string(),
            isolate_volumes: true,
        }
    }
}

impl DeployableOptions {
    /// Resource families renamed for a deployable
    #[must_use]
    pub fn kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|&kind| self.isolate_volumes || kind != ResourceKind::Volume)
            .collect()
    }
}

/// A renamed document ready to be written out and deployed
#[derive(Debug, Clone, PartialEq)]
pub struct Deployable {
    /// Renamed document
    pub document: ComposeDocument,
    /// Env file content, including the suffix variable
    pub env: String,
    /// Suffix used for this instance
    pub suffix: Suffix,
}

/// Rename the document and export the suffix through `env`
///
/// Everything is renamed, except named volumes when
/// [`DeployableOptions::isolate_volumes`] is off.
#[must_use]
pub fn randomize_deployable(
    doc: &ComposeDocument,
    suffix: &Suffix,
    env: &str,
    options: &DeployableOptions,
) -> Deployable {
    let document =
        Renamer::new(options.rename.clone()).rename_kinds(doc, &options.kinds(), suffix);
    let env = inject_variable(env, &options.suffix_variable, suffix.as_str());
    tracing::info!(
        "Randomized deployable with suffix '{}' ({} services, volumes {})",
        suffix,
        document.service_names().len(),
        if options.isolate_volumes { "isolated" } else { "shared" }
    );
    Deployable {
        document,
        env,
        suffix: suffix.clone(),
    }
}

/// Set `name=value` in env file text
///
/// Every existing assignment of `name` (with or without `export`) is
/// replaced in place; otherwise the assignment is appended. Other lines are
/// kept verbatim, line endings included. The result ends with a newline,
/// `\r\n` if the input uses them.
#[must_use]
pub fn inject_variable(env: &str, name: &str, value: &str) -> String {
    let newline = if env.contains("\r\n") { "\r\n" } else { "\n" };
    let assignment = format!("{name}={value}");
    let mut replaced = false;
    let mut out = String::with_capacity(env.len() + assignment.len() + newline.len());

    for line in env.split_inclusive('\n') {
        let body = line.trim_end_matches(|c| c == '\r' || c == '\n');
        let ending = &line[body.len()..];
        if assigns(body, name) {
            replaced = true;
            out.push_str(&assignment);
        } else {
            out.push_str(body);
        }
        out.push_str(if ending.is_empty() { newline } else { ending });
    }

    if !replaced {
        out.push_str(&assignment);
        out.push_str(newline);
    }
    out
}

fn assigns(line: &str, name: &str) -> bool {
    let line = line.trim_start();
    let line = line.strip_prefix("export ").map_or(line, str::trim_start);
    line.strip_prefix(name)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackfork_model::{Entries, ServiceNetworks, VolumeMount};

    #[test]
    fn appends_when_missing() {
        assert_eq!(
            inject_variable("DATABASE_URL=postgres://db\n", "COMPOSE_PREFIX", "af045046"),
            "DATABASE_URL=postgres://db\nCOMPOSE_PREFIX=af045046\n"
        );
        assert_eq!(inject_variable("", "COMPOSE_PREFIX", "x"), "COMPOSE_PREFIX=x\n");
    }

    #[test]
    fn replaces_existing_assignment() {
        let env = "A=1\nexport COMPOSE_PREFIX = old\nB=2";
        assert_eq!(inject_variable(env, "COMPOSE_PREFIX", "new"), "A=1\nCOMPOSE_PREFIX=new\nB=2\n");
    }

    #[test]
    fn crlf_line_endings_kept() {
        let env = "A=1\r\nCOMPOSE_PREFIX=old\r\nB=2\r\n";
        assert_eq!(
            inject_variable(env, "COMPOSE_PREFIX", "new"),
            "A=1\r\nCOMPOSE_PREFIX=new\r\nB=2\r\n"
        );
        assert_eq!(
            inject_variable("A=1\r\nB=2", "COMPOSE_PREFIX", "x"),
            "A=1\r\nB=2\r\nCOMPOSE_PREFIX=x\r\n"
        );
    }

    #[test]
    fn similar_names_untouched() {
        let env = "COMPOSE_PREFIX_OLD=1\n# COMPOSE_PREFIX=commented\n";
        assert_eq!(
            inject_variable(env, "COMPOSE_PREFIX", "x"),
            "COMPOSE_PREFIX_OLD=1\n# COMPOSE_PREFIX=commented\nCOMPOSE_PREFIX=x\n"
        );
    }

    #[test]
    fn deployable_attaches_no_extra_network() {
        let doc = ComposeDocument::from_yaml(
            "services:\n  web:\n    image: nginx\n  db:\n    networks: [backend]\nnetworks:\n  backend: {}\n",
        )
        .unwrap();
        let out = randomize_deployable(&doc, &Suffix::new("abc"), "", &DeployableOptions::default());

        assert!(out.document.service("web-abc").unwrap().networks.is_none());
        assert_eq!(
            out.document.service("db-abc").unwrap().networks,
            Some(ServiceNetworks::List(vec!["backend-abc".to_string()]))
        );
        assert_eq!(out.document.networks.as_ref().unwrap().len(), 1);
        assert_eq!(out.env, "COMPOSE_PREFIX=abc\n");
    }

    const VOLUME_STACK: &str = "services:\n  db:\n    volumes: [\"data:/var/lib/data\"]\n    networks: [backend]\nvolumes:\n  data: {}\nnetworks:\n  backend: {}\n";

    #[test]
    fn volumes_isolated_by_default() {
        let doc = ComposeDocument::from_yaml(VOLUME_STACK).unwrap();
        let out = randomize_deployable(&doc, &Suffix::new("i1"), "", &DeployableOptions::default());

        assert!(out.document.volumes.as_ref().unwrap().contains_key("data-i1"));
        assert_eq!(
            out.document.service("db-i1").unwrap().volumes,
            Some(Entries::List(vec![VolumeMount::Short("data-i1:/var/lib/data".to_string())]))
        );
    }

    #[test]
    fn shared_volumes_keep_their_names() {
        let doc = ComposeDocument::from_yaml(VOLUME_STACK).unwrap();
        let options = DeployableOptions {
            isolate_volumes: false,
            ..DeployableOptions::default()
        };
        let out = randomize_deployable(&doc, &Suffix::new("i2"), "", &options);

        let db = out.document.service("db-i2").unwrap();
        assert!(out.document.volumes.as_ref().unwrap().contains_key("data"));
        assert_eq!(
            db.volumes,
            Some(Entries::List(vec![VolumeMount::Short("data:/var/lib/data".to_string())]))
        );
        assert!(out.document.networks.as_ref().unwrap().contains_key("backend-i2"));
        assert_eq!(options.kinds().len(), 3);
    }

    #[test]
    fn custom_suffix_variable() {
        let options = DeployableOptions {
            suffix_variable: "STACK_SUFFIX".to_string(),
            ..DeployableOptions::default()
        };
        let out = randomize_deployable(&ComposeDocument::new(), &Suffix::new("q"), "", &options);
        assert_eq!(out.env, "STACK_SUFFIX=q\n");
        assert_eq!(out.suffix, Suffix::new("q"));
    }
}
