//! Field plumbing for the hand-written serde impls
//!
//! Typed fields are lifted out of a raw mapping one at a time. A field that is
//! `null`, or whose value fits none of its shapes, stays in the attributes
//! untouched, so every key of the source survives a load/store cycle. A YAML
//! tag on a field (`!reset`, `!override`) is split off while the field is
//! read and put back when it is written.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};

use crate::service::Attributes;

/// YAML tags found on typed fields, keyed by field name
pub type FieldTags = IndexMap<String, Tag>;

/// A raw mapping being taken apart
pub(crate) struct Fields {
    pub(crate) attributes: Attributes,
    pub(crate) tags: FieldTags,
}

impl Fields {
    pub(crate) fn from_mapping(mapping: Mapping) -> Result<Self, String> {
        let attributes = mapping
            .into_iter()
            .map(|(key, value)| match key {
                Value::String(key) => Ok((key, value)),
                other => Err(format!("expected a string key, found {other:?}")),
            })
            .collect::<Result<Attributes, String>>()?;
        Ok(Self {
            attributes,
            tags: FieldTags::new(),
        })
    }

    /// Lift `key` as a `T`
    ///
    /// `fallback` is tried with the untagged value when it does not
    /// deserialize as `T`; if that yields nothing the key stays raw.
    pub(crate) fn take<T, F>(&mut self, key: &str, fallback: F) -> Option<T>
    where
        T: DeserializeOwned,
        F: FnOnce(Value) -> Option<T>,
    {
        if !self.is_set(key) {
            return None;
        }
        let (index, _, value) = self.attributes.shift_remove_full(key)?;
        let (tag, inner) = untag(value);

        let typed = serde_yaml::from_value::<T>(inner.clone())
            .ok()
            .or_else(|| fallback(inner.clone()));
        match typed {
            Some(typed) => {
                if let Some(tag) = tag {
                    self.tags.insert(key.to_string(), tag);
                }
                Some(typed)
            }
            None => {
                self.attributes
                    .shift_insert(index, key.to_string(), retag(tag, inner));
                None
            }
        }
    }

    /// Lift `key` as a `T`, failing if it does not fit
    pub(crate) fn take_strict<T: DeserializeOwned>(
        &mut self,
        key: &str,
    ) -> Result<Option<T>, serde_yaml::Error> {
        if !self.is_set(key) {
            return Ok(None);
        }
        let Some(value) = self.attributes.shift_remove(key) else {
            return Ok(None);
        };
        let (tag, inner) = untag(value);
        let typed = serde_yaml::from_value(inner)?;
        if let Some(tag) = tag {
            self.tags.insert(key.to_string(), tag);
        }
        Ok(Some(typed))
    }

    fn is_set(&self, key: &str) -> bool {
        matches!(self.attributes.get(key), Some(value) if !value.is_null())
    }
}

/// Reassembles a raw mapping: typed fields first, then the attributes
pub(crate) struct Writer<'a> {
    mapping: Mapping,
    tags: &'a FieldTags,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(tags: &'a FieldTags) -> Self {
        Self {
            mapping: Mapping::new(),
            tags,
        }
    }

    pub(crate) fn field<T: Serialize>(
        &mut self,
        key: &str,
        value: Option<&T>,
    ) -> Result<(), serde_yaml::Error> {
        let Some(value) = value else {
            return Ok(());
        };
        let value = retag(self.tags.get(key).cloned(), serde_yaml::to_value(value)?);
        self.mapping.insert(Value::String(key.to_string()), value);
        Ok(())
    }

    /// Attributes shadowed by a typed field are skipped
    pub(crate) fn finish(mut self, attributes: &Attributes) -> Value {
        for (key, value) in attributes {
            if !self.mapping.contains_key(key.as_str()) {
                self.mapping.insert(Value::String(key.clone()), value.clone());
            }
        }
        Value::Mapping(self.mapping)
    }
}

fn untag(value: Value) -> (Option<Tag>, Value) {
    match value {
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            (Some(tag), value)
        }
        other => (None, other),
    }
}

fn retag(tag: Option<Tag>, value: Value) -> Value {
    match tag {
        Some(tag) => Value::Tagged(Box::new(TaggedValue { tag, value })),
        None => value,
    }
}
