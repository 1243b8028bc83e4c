//! Intent agent: asks the model to label a line of user input.

use async_trait::async_trait;
use pitwall_core::error::ClassificationError;
use pitwall_core::intent::{ClassificationResult, Classifier, Intent};
use pitwall_core::message::Message;
use pitwall_core::provider::{Provider, ProviderRequest, ResponseFormat};
use std::sync::Arc;
use tracing::debug;

const SYSTEM_INSTRUCTION: &str = "You are an expert User Intent Classifier for the F1 Strategist \
application. Analyze the user's input and classify its purpose using the provided JSON schema. \
If the user asks a question about pit strategy, racing, or tires, the intent is 'NEW_STRATEGY'. \
If the input matches a command like 'review', 'history', 'delete', 'optimize', or 'exit', use \
the corresponding intent. For deletions put the numeric entry ID in 'argument'.";

pub struct IntentAgent {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
}

impl IntentAgent {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// The JSON schema the reply must satisfy.
    pub fn response_schema() -> serde_json::Value {
        let labels: Vec<&str> = Intent::ALL.iter().map(|i| i.label()).collect();
        serde_json::json!({
            "type": "object",
            "properties": {
                "intent": {
                    "type": "string",
                    "enum": labels,
                    "description": "The primary action the user is asking for."
                },
                "argument": {
                    "type": ["string", "null"],
                    "description": "The specific argument needed for the action (e.g., the ID number for deletion)."
                }
            },
            "required": ["intent"]
        })
    }
}

/// Models sometimes wrap JSON in a Markdown fence even when asked not to.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl Classifier for IntentAgent {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassificationError> {
        let messages = vec![
            Message::system(SYSTEM_INSTRUCTION),
            Message::user(format!("Classify the following user input: '{text}'")),
        ];
        let request = ProviderRequest::new(&self.model, messages)
            .with_temperature(self.temperature)
            .with_response_format(ResponseFormat::JsonSchema {
                name: "intent_classification".into(),
                schema: Self::response_schema(),
            });

        let response = self.provider.complete(request).await?;
        let body = strip_code_fences(&response.message.content);
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| ClassificationError::Malformed(format!("{e}: {body}")))?;

        let result = ClassificationResult::from_value(&value)?;
        debug!(intent = %result.intent, argument = ?result.argument, "Classified input");
        Ok(result)
    }
}
