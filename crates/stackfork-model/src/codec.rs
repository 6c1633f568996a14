//! Text codec for compose documents
//!
//! Thin serde adapters; no schema validation happens here.

use crate::document::ComposeDocument;
use crate::error::ModelError;

impl ComposeDocument {
    /// Parse from YAML text
    ///
    /// Blank input yields an empty document. Merge keys (`<<: *anchor`) are
    /// resolved before the document is typed, so merged fields are seen (and
    /// renamed) like fields written inline.
    ///
    /// # Errors
    /// Returns error if the text is not YAML, a merge key does not point at a
    /// mapping, or the root is not a mapping
    pub fn from_yaml(yaml: &str) -> Result<Self, ModelError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_value(serde_yaml::from_str(yaml)?)
    }

    /// Parse from JSON text
    ///
    /// # Errors
    /// Returns error if the text is not JSON or its root is not an object
    #[inline]
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert from an already parsed YAML value, resolving merge keys
    ///
    /// # Errors
    /// Returns error if a merge key is malformed or the value is not a mapping
    pub fn from_value(mut value: serde_yaml::Value) -> Result<Self, ModelError> {
        value.apply_merge()?;
        Ok(serde_yaml::from_value(value)?)
    }

    /// Serialize to YAML text
    ///
    /// # Errors
    /// Returns error if serialization fails
    #[inline]
    pub fn to_yaml(&self) -> Result<String, ModelError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Serialize to pretty-printed JSON text
    ///
    /// # Errors
    /// Returns error if serialization fails (non-string mapping keys in
    /// opaque payloads, for instance)
    #[inline]
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Convert to a raw YAML value
    ///
    /// # Errors
    /// Returns error if serialization fails
    #[inline]
    pub fn to_value(&self) -> Result<serde_yaml::Value, ModelError> {
        Ok(serde_yaml::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ComposeDocument, ResourceKind, ServiceNetworks, Value};
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
version: "3.8"
services:
  web:
    image: nginx:latest
    depends_on:
      - app
    networks:
      frontend:
        aliases:
          - web
  app:
    image: node:14
    volumes:
      - app-data:/usr/src/app
      - ./src:/usr/src/app/src:ro
volumes:
  app-data:
networks:
  frontend:
    driver: bridge
x-custom:
  owner: ops
"#;

    #[test]
    fn yaml_roundtrip_preserves_structure() {
        let doc = ComposeDocument::from_yaml(SAMPLE).unwrap();
        let text = doc.to_yaml().unwrap();
        let again = ComposeDocument::from_yaml(&text).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn unknown_top_level_keys_survive() {
        let doc = ComposeDocument::from_yaml(SAMPLE).unwrap();
        assert!(doc.attributes.contains_key("version"));
        assert!(doc.attributes.contains_key("x-custom"));
        assert!(doc.to_yaml().unwrap().contains("x-custom"));
    }

    #[test]
    fn absent_sections_stay_absent() {
        let doc = ComposeDocument::from_yaml(SAMPLE).unwrap();
        assert!(doc.section(ResourceKind::Config).is_none());
        assert!(!doc.to_yaml().unwrap().contains("configs"));

        let empty = ComposeDocument::from_yaml("configs: {}\n").unwrap();
        assert_eq!(empty.section(ResourceKind::Config).map(|s| s.len()), Some(0));
        assert!(empty.to_yaml().unwrap().contains("configs"));
    }

    #[test]
    fn null_payload_definitions() {
        let doc = ComposeDocument::from_yaml(SAMPLE).unwrap();
        let volumes = doc.section(ResourceKind::Volume).unwrap();
        assert!(volumes.get("app-data").unwrap().value().is_null());
    }

    #[test]
    fn json_and_yaml_agree() {
        let doc = ComposeDocument::from_yaml(SAMPLE).unwrap();
        let json = doc.to_json().unwrap();
        assert_eq!(ComposeDocument::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn merge_keys_are_resolved() {
        let doc = ComposeDocument::from_yaml(
            "x-common: &common\n  networks: [backend]\n  restart: always\nservices:\n  web:\n    <<: *common\n    image: nginx\n",
        )
        .unwrap();
        let web = doc.service("web").unwrap();
        assert!(matches!(web.networks, Some(ServiceNetworks::List(ref n)) if n == &["backend"]));
        assert!(web.attribute("<<").is_none());
        assert_eq!(web.attribute("restart"), Some(&Value::String("always".into())));
        assert!(!doc.to_yaml().unwrap().contains("<<"));
    }

    #[test]
    fn tags_do_not_fail_the_document() {
        let doc = ComposeDocument::from_yaml("services: {web: {image: x, ports: !reset []}}").unwrap();
        let text = doc.to_yaml().unwrap();
        assert!(text.contains("ports: !reset"), "{text}");
        assert_eq!(ComposeDocument::from_yaml(&text).unwrap(), doc);
    }

    #[test]
    fn tagged_section_keeps_its_tag() {
        let doc = ComposeDocument::from_yaml("networks: !reset\n  front: {}\n").unwrap();
        assert!(doc.section(ResourceKind::Network).unwrap().contains_key("front"));
        assert!(doc.to_yaml().unwrap().contains("!reset"));
    }

    #[test]
    fn null_keys_survive() {
        let doc = ComposeDocument::from_yaml(
            "services: {web: , db: {depends_on: , image: x}}\nconfigs:\n",
        )
        .unwrap();
        assert!(doc.service("web").unwrap().null_body);
        assert!(doc.section(ResourceKind::Config).is_none());

        let text = doc.to_yaml().unwrap();
        assert!(text.contains("web: null"), "{text}");
        assert!(text.contains("depends_on: null"), "{text}");
        assert!(text.contains("configs: null"), "{text}");
        assert_eq!(ComposeDocument::from_yaml(&text).unwrap(), doc);
    }

    #[test]
    fn blank_input_is_empty_document() {
        assert_eq!(ComposeDocument::from_yaml("  \n").unwrap(), ComposeDocument::new());
    }

    #[test]
    fn scalar_root_is_rejected() {
        assert!(ComposeDocument::from_yaml("just a string").is_err());
        assert!(ComposeDocument::from_json("[1, 2]").is_err());
    }
}
