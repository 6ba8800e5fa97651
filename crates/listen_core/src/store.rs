use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::schema::{ParamSchema, Placement, BASE_URL_FIELD, DEFAULT_HOST};
use crate::value::{ParamMap, ParamValue};

/// ChangeSet entry recorded for edits of the extra-parameter blob.
pub const EXTRA_PARAMS_KEY: &str = "extra";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtraParamsError {
    #[error("invalid JSON in extra params: {0}")]
    Malformed(String),
}

/// Read-only copy of the configuration, used for encoding and payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    base_url: String,
    fields: Vec<(&'static str, ParamValue)>,
    extra: ParamMap,
}

impl Configuration {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query-placed typed fields in schema order, including unset ones.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &ParamValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub fn extra(&self) -> &ParamMap {
        &self.extra
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        if name == BASE_URL_FIELD {
            return Some(ParamValue::text(self.base_url.clone()));
        }
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.clone())
            .or_else(|| self.extra.get(name).cloned())
    }

    /// Returns a copy with one typed field overridden.
    pub fn with_field(mut self, name: &str, value: ParamValue) -> Self {
        if let Some(slot) = self.fields.iter_mut().find(|(field, _)| *field == name) {
            slot.1 = value;
        }
        self
    }

    /// The configuration as sent to the backend: host, every set field, extras.
    pub fn to_payload(&self) -> ParamMap {
        let mut payload = ParamMap::new();
        if !self.base_url.is_empty() {
            payload.insert(BASE_URL_FIELD, ParamValue::text(self.base_url.clone()));
        }
        for (name, value) in self.fields() {
            if !value.is_empty() {
                payload.insert(name, value.clone());
            }
        }
        for (key, value) in self.extra.iter() {
            if value != &ParamValue::Text(String::new()) {
                payload.insert(key, value.clone());
            }
        }
        payload
    }
}

/// The canonical, in-memory configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    schema: Arc<ParamSchema>,
    values: IndexMap<&'static str, ParamValue>,
    extra: ParamMap,
    changed: BTreeSet<String>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Arc::new(ParamSchema::builtin()))
    }
}

impl ConfigStore {
    /// A store holding the schema defaults.
    pub fn new(schema: Arc<ParamSchema>) -> Self {
        let mut store = Self {
            schema,
            values: IndexMap::new(),
            extra: ParamMap::new(),
            changed: BTreeSet::new(),
        };
        store.reset();
        store
    }

    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    /// Swaps in a schema with new defaults. Current values are kept.
    pub fn install_schema(&mut self, schema: Arc<ParamSchema>) {
        let mut values = IndexMap::new();
        for field in schema.all_fields() {
            let value = self
                .values
                .get(field.name)
                .cloned()
                .unwrap_or_else(|| field.default.clone());
            values.insert(field.name, value);
        }
        self.values = values;
        self.schema = schema;
    }

    /// Stores a value. Schema fields are coerced to their kind; any other key
    /// goes to the extra bag. The key is always recorded as changed.
    pub fn set(&mut self, name: &str, value: ParamValue) {
        self.changed.insert(name.to_string());
        match self.schema.lookup(name) {
            Some(field) => {
                let coerced = field.kind.coerce(value);
                self.values.insert(field.name, coerced);
            }
            None => self.extra.insert(name, value),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name).or_else(|| self.extra.get(name))
    }

    pub fn snapshot(&self) -> Configuration {
        let mut base_url = String::new();
        let mut fields = Vec::with_capacity(self.values.len());
        for field in self.schema.all_fields() {
            let value = self
                .values
                .get(field.name)
                .cloned()
                .unwrap_or_else(|| field.kind.empty_value());
            match field.placement {
                Placement::Host => {
                    let host = value.to_string();
                    base_url = if host.trim().is_empty() {
                        DEFAULT_HOST.to_string()
                    } else {
                        host.trim().to_string()
                    };
                }
                Placement::Query => fields.push((field.name, value)),
            }
        }
        Configuration {
            base_url,
            fields,
            extra: self.extra.clone(),
        }
    }

    /// Schema defaults everywhere, default extras, empty ChangeSet.
    pub fn reset(&mut self) {
        self.values = self
            .schema
            .all_fields()
            .iter()
            .map(|field| (field.name, field.default.clone()))
            .collect();
        self.extra = self.schema.default_extra().clone();
        self.changed.clear();
    }

    /// Replaces the whole configuration with exactly the given map: every
    /// schema field is cleared (not defaulted) first, then each entry is applied
    /// with the same rule as [`ConfigStore::set`].
    pub fn replace_from(&mut self, map: ParamMap) {
        self.values = self
            .schema
            .all_fields()
            .iter()
            .map(|field| (field.name, field.kind.empty_value()))
            .collect();
        self.extra = ParamMap::new();
        self.changed.clear();
        for (key, value) in map {
            self.set(&key, value);
        }
    }

    /// Clears one schema field without recording it as a user change.
    /// Returns whether the value actually changed.
    pub fn clear_field(&mut self, name: &str) -> bool {
        let Some(field) = self.schema.lookup(name) else {
            return false;
        };
        let empty = field.kind.empty_value();
        match self.values.get_mut(field.name) {
            Some(value) if !value.is_empty() => {
                *value = empty;
                true
            }
            _ => false,
        }
    }

    /// Applies an edited extra-parameter blob. Duplicate keys become lists and
    /// schema-named keys are routed to their typed field. A malformed blob
    /// leaves the store untouched.
    pub fn set_extra_json(&mut self, text: &str) -> Result<(), ExtraParamsError> {
        let trimmed = text.trim();
        let parsed = if trimmed.is_empty() {
            ParamMap::new()
        } else {
            ParamMap::from_json_str(trimmed)
                .map_err(|err| ExtraParamsError::Malformed(err.to_string()))?
        };

        self.extra = ParamMap::new();
        for (key, value) in parsed {
            if self.schema.lookup(&key).is_some() {
                self.set(&key, value);
            } else {
                self.extra.insert(key, value);
            }
        }
        if self.extra.is_empty() {
            self.changed.remove(EXTRA_PARAMS_KEY);
        } else {
            self.changed.insert(EXTRA_PARAMS_KEY.to_string());
        }
        Ok(())
    }

    pub fn extra(&self) -> &ParamMap {
        &self.extra
    }

    pub fn extra_json(&self) -> String {
        self.extra.to_json_pretty()
    }

    pub fn changed(&self) -> &BTreeSet<String> {
        &self.changed
    }

    pub fn clear_changed(&mut self) {
        self.changed.clear();
    }
}
