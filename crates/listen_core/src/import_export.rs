//! Import, reset, simplify and export of the whole configuration.

use crate::schema::{BASE_URL_FIELD, DEFAULT_HOST};
use crate::store::{ConfigStore, Configuration};
use crate::url_codec;
use crate::value::{ParamMap, ParamValue};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Please enter a configuration to import.")]
    Empty,
    #[error("Invalid configuration format. Please provide a valid JSON object or URL.")]
    InvalidFormat,
}

/// Parses import text: a JSON object first, then any shape the URL codec
/// accepts. A missing host defaults to the service host.
pub fn parse_import(raw: &str) -> Result<ParamMap, ImportError> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(ImportError::Empty);
    }

    let mut params = url_codec::decode(input).map_err(|_| ImportError::InvalidFormat)?;

    let has_host = params
        .get(BASE_URL_FIELD)
        .is_some_and(|value| !value.is_empty());
    if !has_host {
        params.insert(BASE_URL_FIELD, ParamValue::text(DEFAULT_HOST));
    }
    Ok(params)
}

/// Replaces the store with exactly the imported configuration, or leaves it
/// untouched on failure.
pub fn import_from(store: &mut ConfigStore, raw: &str) -> Result<(), ImportError> {
    let params = parse_import(raw)?;
    store.replace_from(params);
    Ok(())
}

pub fn reset_to_defaults(store: &mut ConfigStore) {
    store.reset();
}

/// Forgets which fields were explicitly touched. Values are unchanged.
pub fn simplify(store: &mut ConfigStore) {
    store.clear_changed();
}

/// The configuration as a JSON object that [`import_from`] accepts back.
pub fn export_json(config: &Configuration) -> String {
    config.to_payload().to_json_pretty()
}
