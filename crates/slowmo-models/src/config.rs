//! Per-run process configuration.
//!
//! An input archive may carry a `config.json` document. Every field is
//! optional, and a field that cannot be parsed falls back to its default on
//! its own instead of rejecting the whole document. Resolution happens once,
//! producing a fully populated [`ProcessConfig`] plus the list of fallbacks
//! that were applied so the caller can log them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default padding alignment expected by the interpolation model.
pub const DEFAULT_ALIGN: u32 = 64;
/// Default block height used when the model tiles large frames.
pub const DEFAULT_BLOCK_HEIGHT: u32 = 1;
/// Default block width used when the model tiles large frames.
pub const DEFAULT_BLOCK_WIDTH: u32 = 1;
/// Default recursion depth (7 synthesized frames per anchor pair).
pub const DEFAULT_TIMES_TO_INTERPOLATE: u32 = 3;
/// Deepest supported recursion (255 synthesized frames per anchor pair).
/// Deeper requests are clamped.
pub const MAX_TIMES_TO_INTERPOLATE: u32 = 8;

const PROCESS_FIELDS: [&str; 4] = ["align", "block_height", "block_width", "times_to_interpolate"];

/// Fully resolved configuration for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub align: u32,
    pub block_height: u32,
    pub block_width: u32,
    pub times_to_interpolate: u32,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            align: DEFAULT_ALIGN,
            block_height: DEFAULT_BLOCK_HEIGHT,
            block_width: DEFAULT_BLOCK_WIDTH,
            times_to_interpolate: DEFAULT_TIMES_TO_INTERPOLATE,
        }
    }
}

impl ProcessConfig {
    /// Block shape as `[height, width]`.
    pub fn block_shape(&self) -> [u32; 2] {
        [self.block_height, self.block_width]
    }
}

/// Why a configuration field ended up with its default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The field was not present in the document.
    Missing,
    /// The field was present but could not be used.
    Invalid(String),
    /// The requested value exceeded the supported maximum.
    Clamped { requested: u32, max: u32 },
}

/// A single defaulted or adjusted configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFallback {
    pub field: &'static str,
    pub reason: FallbackReason,
}

impl ConfigFallback {
    fn missing(field: &'static str) -> Self {
        Self {
            field,
            reason: FallbackReason::Missing,
        }
    }

    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            reason: FallbackReason::Invalid(message.into()),
        }
    }

    /// Whether this fallback hides a problem in the supplied document.
    pub fn is_invalid(&self) -> bool {
        matches!(self.reason, FallbackReason::Invalid(_))
    }
}

impl fmt::Display for ConfigFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FallbackReason::Missing => write!(f, "{}: not set, using default", self.field),
            FallbackReason::Invalid(message) => {
                write!(f, "{}: {}, using default", self.field, message)
            }
            FallbackReason::Clamped { requested, max } => {
                write!(f, "{}: {} exceeds maximum, clamped to {}", self.field, requested, max)
            }
        }
    }
}

/// The raw configuration document shipped inside an input archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times_to_interpolate: Option<u32>,
}

impl ArchiveConfig {
    /// Parse a document field by field, dropping fields that do not parse.
    ///
    /// Returns the usable fields and one [`FallbackReason::Invalid`] entry for
    /// every field that was rejected.
    pub fn parse_lenient(bytes: &[u8]) -> (Self, Vec<ConfigFallback>) {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => return (Self::default(), invalid_document(format!("malformed JSON ({})", e))),
        };

        let Some(map) = value.as_object() else {
            return (Self::default(), invalid_document("document is not a JSON object".to_string()));
        };

        let mut fallbacks = Vec::new();
        let config = Self {
            s3_bucket: string_field(map, "s3_bucket", &mut fallbacks),
            s3_prefix: string_field(map, "s3_prefix", &mut fallbacks),
            align: integer_field(map, "align", 1, &mut fallbacks),
            block_height: integer_field(map, "block_height", 1, &mut fallbacks),
            block_width: integer_field(map, "block_width", 1, &mut fallbacks),
            times_to_interpolate: integer_field(map, "times_to_interpolate", 0, &mut fallbacks),
        };

        (config, fallbacks)
    }

    /// Fill unset fields with defaults and clamp the recursion depth.
    pub fn resolve(&self) -> (ProcessConfig, Vec<ConfigFallback>) {
        let defaults = ProcessConfig::default();
        let mut fallbacks = Vec::new();

        let mut pick = |field: &'static str, value: Option<u32>, default: u32| {
            value.unwrap_or_else(|| {
                fallbacks.push(ConfigFallback::missing(field));
                default
            })
        };

        let align = pick("align", self.align, defaults.align);
        let block_height = pick("block_height", self.block_height, defaults.block_height);
        let block_width = pick("block_width", self.block_width, defaults.block_width);
        let mut times_to_interpolate = pick(
            "times_to_interpolate",
            self.times_to_interpolate,
            defaults.times_to_interpolate,
        );

        if times_to_interpolate > MAX_TIMES_TO_INTERPOLATE {
            fallbacks.push(ConfigFallback {
                field: "times_to_interpolate",
                reason: FallbackReason::Clamped {
                    requested: times_to_interpolate,
                    max: MAX_TIMES_TO_INTERPOLATE,
                },
            });
            times_to_interpolate = MAX_TIMES_TO_INTERPOLATE;
        }

        (
            ProcessConfig {
                align,
                block_height,
                block_width,
                times_to_interpolate,
            },
            fallbacks,
        )
    }
}

fn invalid_document(message: String) -> Vec<ConfigFallback> {
    PROCESS_FIELDS
        .iter()
        .map(|field| ConfigFallback::invalid(*field, message.clone()))
        .collect()
}

fn string_field(
    map: &Map<String, Value>,
    field: &'static str,
    fallbacks: &mut Vec<ConfigFallback>,
) -> Option<String> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(other) => {
            fallbacks.push(ConfigFallback::invalid(
                field,
                format!("expected a non-empty string, found {}", other),
            ));
            None
        }
    }
}

fn integer_field(
    map: &Map<String, Value>,
    field: &'static str,
    min: u32,
    fallbacks: &mut Vec<ConfigFallback>,
) -> Option<u32> {
    let value = match map.get(field) {
        None | Some(Value::Null) => return None,
        Some(value) => value,
    };

    match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
        Some(n) if n >= min => Some(n),
        _ => {
            fallbacks.push(ConfigFallback::invalid(
                field,
                format!("expected an integer >= {}, found {}", min, value),
            ));
            None
        }
    }
}
