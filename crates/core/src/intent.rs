//! Intents and the classifier contract.
//!
//! A classifier maps one line of user text to exactly one [`Intent`] plus an
//! optional argument. The argument is advisory only: the dispatcher
//! re-derives anything it acts on from the raw text.

use crate::error::ClassificationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of things a user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    NewStrategy,
    ReviewHistory,
    DeleteEntry,
    OptimizeStrategy,
    Exit,
    Other,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::NewStrategy,
        Intent::ReviewHistory,
        Intent::DeleteEntry,
        Intent::OptimizeStrategy,
        Intent::Exit,
        Intent::Other,
    ];

    /// The wire label, e.g. `"OPTIMIZE_STRATEGY"`.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::NewStrategy => "NEW_STRATEGY",
            Intent::ReviewHistory => "REVIEW_HISTORY",
            Intent::DeleteEntry => "DELETE_ENTRY",
            Intent::OptimizeStrategy => "OPTIMIZE_STRATEGY",
            Intent::Exit => "EXIT",
            Intent::Other => "OTHER",
        }
    }

    /// Parse a label case-insensitively. Unknown labels become `Other`.
    pub fn from_label(label: &str) -> Self {
        let upper = label.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|intent| intent.label() == upper)
            .unwrap_or(Intent::Other)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a classifier produced for one line of input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub intent: Intent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
}

impl ClassificationResult {
    pub fn new(intent: Intent, argument: Option<String>) -> Self {
        Self { intent, argument }
    }

    /// Build from the classifier's JSON object.
    ///
    /// `intent` must be a string (missing means `OTHER`); `argument` may be a
    /// string, a number, or null.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ClassificationError> {
        let obj = value.as_object().ok_or_else(|| {
            ClassificationError::Malformed(format!("expected a JSON object, got {value}"))
        })?;

        let intent = match obj.get("intent") {
            None | Some(serde_json::Value::Null) => Intent::Other,
            Some(serde_json::Value::String(label)) => Intent::from_label(label),
            Some(other) => {
                return Err(ClassificationError::Malformed(format!(
                    "`intent` must be a string, got {other}"
                )));
            }
        };

        let argument = match obj.get("argument") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
            Some(serde_json::Value::String(s)) => Some(s.trim().to_string()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(ClassificationError::Malformed(format!(
                    "`argument` must be a string or number, got {other}"
                )));
            }
        };

        Ok(Self { intent, argument })
    }
}

/// Maps free text to a [`ClassificationResult`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn labels_roundtrip_case_insensitively() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_label(&intent.label().to_lowercase()), intent);
        }
        assert_eq!(Intent::from_label("SOMETHING_ELSE"), Intent::Other);
    }

    #[test]
    fn serde_uses_wire_labels() {
        let json = serde_json::to_string(&Intent::OptimizeStrategy).unwrap();
        assert_eq!(json, "\"OPTIMIZE_STRATEGY\"");
    }

    #[test]
    fn parse_delete_with_numeric_argument() {
        let result =
            ClassificationResult::from_value(&json!({"intent": "DELETE_ENTRY", "argument": 5}))
                .unwrap();
        assert_eq!(result.intent, Intent::DeleteEntry);
        assert_eq!(result.argument.as_deref(), Some("5"));
    }

    #[test]
    fn parse_history_with_null_argument() {
        let result =
            ClassificationResult::from_value(&json!({"intent": "review_history", "argument": null}))
                .unwrap();
        assert_eq!(result, ClassificationResult::new(Intent::ReviewHistory, None));
    }

    #[test]
    fn missing_intent_means_other() {
        let result = ClassificationResult::from_value(&json!({})).unwrap();
        assert_eq!(result.intent, Intent::Other);
    }

    #[test]
    fn non_object_is_malformed() {
        let err = ClassificationResult::from_value(&json!(["EXIT"])).unwrap_err();
        assert!(matches!(err, ClassificationError::Malformed(_)));
    }
}
