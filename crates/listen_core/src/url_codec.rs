//! Encoding the configuration into the display URL and decoding pasted text back.
//!
//! The display form is `{ws|http}://{host}/v1/listen?key=value&...`, optionally
//! wrapped over several lines. Wrapping is cosmetic: every broken line ends in
//! the `&` join marker and [`decode`] strips all whitespace before parsing.

use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::schema::{BASE_URL_FIELD, DEFAULT_HOST};
use crate::session::SessionMode;
use crate::store::Configuration;
use crate::value::{ParamMap, ParamValue};

pub const LISTEN_PATH: &str = "/v1/listen";
/// Line width hint that disables wrapping.
pub const NO_WRAP: usize = usize::MAX;

const AVG_CHAR_WIDTH_PX: f64 = 8.5;
const SAFETY_MARGIN_PX: f64 = 40.0;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("input is not a URL, a path, or a JSON object")]
    UnrecognizedShape,
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

/// Query pairs in enumeration order: set schema fields first, then extras.
/// Unset fields (empty, false, empty list) are omitted; extras are omitted
/// only when they hold empty text. Occurrences are trimmed, and blank ones
/// dropped, the same way [`decode`] reads them back.
pub fn query_pairs(config: &Configuration) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (name, value) in config.fields() {
        if value.is_empty() {
            continue;
        }
        push_occurrences(&mut pairs, name, value);
    }
    for (key, value) in config.extra().iter() {
        push_occurrences(&mut pairs, key, value);
    }
    pairs
}

fn push_occurrences(pairs: &mut Vec<(String, String)>, key: &str, value: &ParamValue) {
    let key = key.trim();
    if key.is_empty() {
        return;
    }
    for rendered in value.query_values() {
        let rendered = rendered.trim();
        if !rendered.is_empty() {
            pairs.push((key.to_string(), rendered.to_string()));
        }
    }
}

/// The query pairs as a map, repeated keys accumulated into lists.
pub fn query_params(config: &Configuration) -> ParamMap {
    query_pairs(config)
        .into_iter()
        .map(|(key, value)| (key, ParamValue::Text(value)))
        .collect()
}

/// Encodes the configuration as a request URL, wrapped so each line stays
/// within `line_width` characters where possible. A `key=value` pair is never
/// split; a pair longer than the width gets a line of its own.
pub fn encode(config: &Configuration, mode: SessionMode, line_width: usize) -> String {
    let prefix = format!("{}://{}{}?", mode.scheme(), config.base_url(), LISTEN_PATH);
    let pairs: Vec<String> = query_pairs(config)
        .iter()
        .map(|(key, value)| format!("{}={}", form_encode(key), form_encode(value)))
        .collect();

    let mut lines = Vec::new();
    let mut current = prefix;
    let mut current_len = current.chars().count();
    let mut at_prefix = true;
    for pair in pairs {
        let pair_len = pair.chars().count();
        if !at_prefix && current_len.saturating_add(pair_len + 1) > line_width {
            current.push('&');
            lines.push(std::mem::replace(&mut current, pair));
            current_len = pair_len;
        } else {
            if !at_prefix {
                current.push('&');
                current_len += 1;
            }
            current.push_str(&pair);
            current_len += pair_len;
        }
        at_prefix = false;
    }
    lines.push(current);
    lines.join("\n")
}

/// Single-line request URL.
pub fn request_url(config: &Configuration, mode: SessionMode) -> String {
    encode(config, mode, NO_WRAP)
}

/// Decodes pasted text into a plain parameter map. Accepts a full `ws(s)`/
/// `http(s)` URL, an absolute path (resolved against the default host), or a
/// bare JSON object. Never returns a partial result.
pub fn decode(raw: &str) -> Result<ParamMap, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return ParamMap::from_json_str(trimmed)
            .map(normalize_json)
            .map_err(|err| DecodeError::InvalidJson(err.to_string()));
    }

    let text = to_plain(trimmed);
    let lower = text.to_ascii_lowercase();
    let candidate = if lower.starts_with("ws://") {
        format!("http://{}", &text["ws://".len()..])
    } else if lower.starts_with("wss://") {
        format!("https://{}", &text["wss://".len()..])
    } else if lower.starts_with("http://") || lower.starts_with("https://") {
        text
    } else if text.starts_with('/') {
        format!("http://{DEFAULT_HOST}{text}")
    } else {
        return Err(DecodeError::UnrecognizedShape);
    };

    let url = Url::parse(&candidate).map_err(|err| DecodeError::InvalidUrl(err.to_string()))?;
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or(DecodeError::MissingHost)?;
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let mut query = ParamMap::new();
    for (key, value) in url.query_pairs() {
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        query.append(key, ParamValue::text(value));
    }

    let mut params = ParamMap::new();
    params.insert(BASE_URL_FIELD, ParamValue::Text(host));
    for (key, value) in query {
        params.insert(key, value);
    }
    Ok(params)
}

/// Applies the query reading rules to a JSON-shaped map: keys and text are
/// trimmed, blank keys and blank list items are dropped.
fn normalize_json(params: ParamMap) -> ParamMap {
    params
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = match value {
                ParamValue::Text(text) => ParamValue::text(text.trim()),
                ParamValue::List(items) => ParamValue::List(
                    items
                        .iter()
                        .map(|item| item.trim())
                        .filter(|item| !item.is_empty())
                        .map(str::to_string)
                        .collect(),
                ),
                other => other,
            };
            Some((key.to_string(), value))
        })
        .collect()
}

/// Strips cosmetic line breaks and all other whitespace, and un-escapes `&amp;`.
pub fn to_plain(formatted: &str) -> String {
    let compact: String = formatted.chars().filter(|c| !c.is_whitespace()).collect();
    compact.replace("&amp;", "&")
}

/// Escapes the join marker for HTML rendering.
pub fn to_markup(formatted: &str) -> String {
    formatted.replace('&', "&amp;")
}

/// Character budget for a URL container of the given pixel width.
pub fn line_width_for(container_px: f64) -> usize {
    let width = ((container_px - SAFETY_MARGIN_PX) / AVG_CHAR_WIDTH_PX).floor();
    if width.is_finite() && width > 0.0 {
        width as usize
    } else {
        0
    }
}

fn form_encode(text: &str) -> String {
    byte_serialize(text.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_width_matches_container_budget() {
        assert_eq!(line_width_for(720.0), 80);
        assert_eq!(line_width_for(10.0), 0);
    }

    #[test]
    fn plain_form_strips_breaks_and_entities() {
        assert_eq!(
            to_plain("http://h/v1/listen?a=1&amp;\n b=2"),
            "http://h/v1/listen?a=1&b=2"
        );
    }

    #[test]
    fn markup_round_trips_through_plain() {
        let formatted = "http://h/v1/listen?a=1&\nb=2";
        assert_eq!(to_plain(&to_markup(formatted)), to_plain(formatted));
    }
}
