//! Flag definitions and the evaluator.
//!
//! # Evaluation order
//! ```text
//! context key empty        → default  (ERROR:CONTEXT_KEY_MISSING)
//! flag off                 → off variation  (OFF)
//! context key in a target  → target variation  (TARGET_MATCH)
//! otherwise                → fallthrough variation  (FALLTHROUGH)
//! ```
//! A variation that is out of range or not a boolean yields the caller's
//! default with an error reason instead of a value.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::flags::context::EvaluationContext;

/// A single flag as delivered by a flag source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDefinition {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub version: u64,
    pub on: bool,
    pub variations: Vec<Value>,
    #[serde(default)]
    pub off_variation: Option<usize>,
    #[serde(default)]
    pub fallthrough: Fallthrough,
    #[serde(default)]
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fallthrough {
    pub variation: Option<usize>,
}

/// Explicit list of context keys pinned to one variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub values: Vec<String>,
    pub variation: usize,
}

impl FlagDefinition {
    /// A flag that always serves `value`.
    pub fn constant(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            version: 1,
            on: true,
            variations: vec![Value::Bool(value)],
            off_variation: Some(0),
            fallthrough: Fallthrough { variation: Some(0) },
            targets: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    flags: Option<HashMap<String, FlagDefinition>>,
    flag_values: Option<HashMap<String, bool>>,
}

/// A flag payload carrying neither `flags` nor `flagValues`.
#[derive(Debug, Error)]
#[error("flag data has neither `flags` nor `flagValues`")]
pub struct MissingFlagData;

/// Complete set of flags known at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub struct FlagSnapshot {
    pub flags: HashMap<String, FlagDefinition>,
}

impl TryFrom<RawSnapshot> for FlagSnapshot {
    type Error = MissingFlagData;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        if raw.flags.is_none() && raw.flag_values.is_none() {
            return Err(MissingFlagData);
        }

        let mut flags = raw.flags.unwrap_or_default();
        for (key, flag) in flags.iter_mut() {
            if flag.key.is_empty() {
                flag.key = key.clone();
            }
        }
        // Full definitions win over the shorthand.
        for (key, value) in raw.flag_values.unwrap_or_default() {
            flags
                .entry(key.clone())
                .or_insert_with(|| FlagDefinition::constant(key, value));
        }
        Ok(Self { flags })
    }
}

impl FlagSnapshot {
    /// Build a snapshot of constant flags.
    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        let flags = values
            .into_iter()
            .map(|(key, value)| {
                let key = key.into();
                (key.clone(), FlagDefinition::constant(key, value))
            })
            .collect();
        Self { flags }
    }

    pub fn get(&self, key: &str) -> Option<&FlagDefinition> {
        self.flags.get(key)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientNotReady,
    FlagNotFound,
    MalformedFlag,
    WrongType,
    ContextKeyMissing,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClientNotReady => "CLIENT_NOT_READY",
            ErrorKind::FlagNotFound => "FLAG_NOT_FOUND",
            ErrorKind::MalformedFlag => "MALFORMED_FLAG",
            ErrorKind::WrongType => "WRONG_TYPE",
            ErrorKind::ContextKeyMissing => "CONTEXT_KEY_MISSING",
        }
    }
}

/// Why an evaluation produced its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationReason {
    Off,
    TargetMatch,
    Fallthrough,
    Error(ErrorKind),
}

impl EvaluationReason {
    pub fn is_error(&self) -> bool {
        matches!(self, EvaluationReason::Error(_))
    }
}

impl fmt::Display for EvaluationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationReason::Off => write!(f, "OFF"),
            EvaluationReason::TargetMatch => write!(f, "TARGET_MATCH"),
            EvaluationReason::Fallthrough => write!(f, "FALLTHROUGH"),
            EvaluationReason::Error(kind) => write!(f, "ERROR:{}", kind.as_str()),
        }
    }
}

/// Result of a boolean evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationDetail {
    pub value: bool,
    pub variation_index: Option<usize>,
    pub reason: EvaluationReason,
}

impl EvaluationDetail {
    pub fn error(default: bool, kind: ErrorKind) -> Self {
        Self {
            value: default,
            variation_index: None,
            reason: EvaluationReason::Error(kind),
        }
    }
}

/// Evaluate a boolean flag for `context`, falling back to `default`.
pub fn evaluate(
    flag: &FlagDefinition,
    context: &EvaluationContext,
    default: bool,
) -> EvaluationDetail {
    if context.key.is_empty() {
        return EvaluationDetail::error(default, ErrorKind::ContextKeyMissing);
    }

    if !flag.on {
        return match flag.off_variation {
            Some(index) => variation(flag, index, EvaluationReason::Off, default),
            None => EvaluationDetail {
                value: default,
                variation_index: None,
                reason: EvaluationReason::Off,
            },
        };
    }

    if let Some(target) = flag
        .targets
        .iter()
        .find(|t| t.values.iter().any(|v| v == &context.key))
    {
        return variation(flag, target.variation, EvaluationReason::TargetMatch, default);
    }

    match flag.fallthrough.variation {
        Some(index) => variation(flag, index, EvaluationReason::Fallthrough, default),
        None => EvaluationDetail::error(default, ErrorKind::MalformedFlag),
    }
}

fn variation(
    flag: &FlagDefinition,
    index: usize,
    reason: EvaluationReason,
    default: bool,
) -> EvaluationDetail {
    match flag.variations.get(index) {
        Some(Value::Bool(value)) => EvaluationDetail {
            value: *value,
            variation_index: Some(index),
            reason,
        },
        Some(_) => EvaluationDetail::error(default, ErrorKind::WrongType),
        None => EvaluationDetail::error(default, ErrorKind::MalformedFlag),
    }
}
