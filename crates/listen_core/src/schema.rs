use crate::value::{ParamMap, ParamValue};

/// Host used whenever a configuration or pasted path names none.
pub const DEFAULT_HOST: &str = "api.deepgram.com";
/// Schema field holding the request host.
pub const BASE_URL_FIELD: &str = "baseUrl";
/// Field forced on while a live session runs.
pub const INTERIM_RESULTS_FIELD: &str = "interim_results";
/// Key of the default extra-parameter object in a defaults document.
pub const EXTRA_DEFAULTS_KEY: &str = "extra";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    MultiSelect,
}

impl FieldKind {
    /// The cleared state of a field of this kind.
    pub fn empty_value(self) -> ParamValue {
        match self {
            FieldKind::Text | FieldKind::Number => ParamValue::Text(String::new()),
            FieldKind::Boolean => ParamValue::Bool(false),
            FieldKind::MultiSelect => ParamValue::List(Vec::new()),
        }
    }

    /// Coerces an incoming value to this kind.
    ///
    /// Booleans accept `true`/`false` or the literal strings; anything else reads
    /// as unchecked. Text and number fields keep scalars as given.
    pub fn coerce(self, value: ParamValue) -> ParamValue {
        match self {
            FieldKind::Boolean => match value {
                ParamValue::Bool(flag) => ParamValue::Bool(flag),
                ParamValue::Text(text) => ParamValue::Bool(text == "true"),
                ParamValue::Number(_) | ParamValue::List(_) => ParamValue::Bool(false),
            },
            FieldKind::Text | FieldKind::Number => match value {
                ParamValue::Bool(flag) => ParamValue::Text(flag.to_string()),
                ParamValue::List(items) => ParamValue::Text(items.join(",")),
                scalar => scalar,
            },
            FieldKind::MultiSelect => match value {
                ParamValue::List(items) => {
                    ParamValue::List(items.into_iter().filter(|item| !item.is_empty()).collect())
                }
                scalar if scalar.is_empty() => ParamValue::List(Vec::new()),
                scalar => ParamValue::List(scalar.query_values()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    Universal,
    StreamingOnly,
    BatchOnly,
}

/// Where a field lands in the request URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Host,
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: ParamValue,
    pub applicability: Applicability,
    pub placement: Placement,
    pub description: &'static str,
}

impl Field {
    fn new(
        name: &'static str,
        kind: FieldKind,
        applicability: Applicability,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            default: kind.empty_value(),
            applicability,
            placement: Placement::Query,
            description,
        }
    }

    fn host(mut self, default: &str) -> Self {
        self.placement = Placement::Host;
        self.default = ParamValue::text(default);
        self
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("defaults resource is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("defaults resource is not a JSON object")]
    NotAnObject,
}

/// Registry of every recognized configuration field, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSchema {
    fields: Vec<Field>,
    default_extra: ParamMap,
}

impl Default for ParamSchema {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ParamSchema {
    /// The built-in field set. Every field has a default, so this is always a
    /// usable fallback when the defaults resource cannot be loaded.
    pub fn builtin() -> Self {
        use Applicability::{BatchOnly, StreamingOnly, Universal};
        use FieldKind::{Boolean, MultiSelect, Number, Text};

        let fields = vec![
            Field::new(BASE_URL_FIELD, Text, Universal, "Host serving the listen endpoint")
                .host(DEFAULT_HOST),
            Field::new("model", Text, Universal, "Transcription model, e.g. nova-3"),
            Field::new("language", Text, Universal, "BCP-47 language tag"),
            Field::new("encoding", Text, Universal, "Raw audio encoding, e.g. linear16"),
            Field::new("sample_rate", Number, Universal, "Sample rate of raw audio in Hz"),
            Field::new("channels", Number, Universal, "Number of raw audio channels"),
            Field::new("smart_format", Boolean, Universal, "Apply smart formatting"),
            Field::new("punctuate", Boolean, Universal, "Add punctuation and capitalization"),
            Field::new("numerals", Boolean, Universal, "Convert spoken numbers to digits"),
            Field::new("profanity_filter", Boolean, Universal, "Mask profanity"),
            Field::new("dictation", Boolean, Universal, "Convert spoken punctuation commands"),
            Field::new("redact", MultiSelect, Universal, "Entity classes to redact"),
            Field::new("keyterm", MultiSelect, Universal, "Key terms to boost"),
            Field::new(
                INTERIM_RESULTS_FIELD,
                Boolean,
                StreamingOnly,
                "Send provisional results while audio streams",
            ),
            Field::new("vad_events", Boolean, StreamingOnly, "Emit speech-started events"),
            Field::new("no_delay", Boolean, StreamingOnly, "Skip result batching"),
            Field::new(
                "utterance_end_ms",
                Text,
                StreamingOnly,
                "Silence in ms that ends an utterance",
            ),
            Field::new("endpointing", Text, StreamingOnly, "Endpointing silence in ms"),
            Field::new("diarize", Boolean, BatchOnly, "Label speakers"),
            Field::new("paragraphs", Boolean, BatchOnly, "Split transcript into paragraphs"),
            Field::new("utterances", Boolean, BatchOnly, "Segment transcript into utterances"),
            Field::new("detect_language", Boolean, BatchOnly, "Detect the dominant language"),
        ];

        Self {
            fields,
            default_extra: ParamMap::new(),
        }
    }

    /// Builds the schema with defaults taken from a JSON defaults document.
    ///
    /// Fields missing from the document keep their built-in default. `base_url`
    /// is accepted for `baseUrl`, and an `extra` object supplies default extra
    /// parameters. Unknown keys are ignored.
    pub fn from_defaults_json(text: &str) -> Result<Self, SchemaError> {
        let document: serde_json::Value =
            serde_json::from_str(text).map_err(|err| SchemaError::InvalidJson(err.to_string()))?;
        let object = document.as_object().ok_or(SchemaError::NotAnObject)?;

        let mut schema = Self::builtin();
        for (key, value) in object {
            if key == EXTRA_DEFAULTS_KEY {
                schema.default_extra = serde_json::from_value::<ParamMap>(value.clone())
                    .map_err(|err| SchemaError::InvalidJson(err.to_string()))?;
                continue;
            }
            let name = if key == "base_url" { BASE_URL_FIELD } else { key };
            let Some(field) = schema.fields.iter_mut().find(|field| field.name == name) else {
                continue;
            };
            if let Some(value) = ParamValue::from_json(value) {
                field.default = field.kind.coerce(value);
            }
        }
        Ok(schema)
    }

    pub fn lookup(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn all_fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn default_extra(&self) -> &ParamMap {
        &self.default_extra
    }
}
