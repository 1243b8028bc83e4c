//! The agent-to-agent message envelope.
//!
//! Every result that crosses from one agent to another (today always ending
//! at the memory agent) travels in an [`Envelope`]. Envelopes are validated
//! when they are built, never when they are read: an `Envelope` value that
//! exists is well-formed.
//!
//! `status` is optional everywhere and defaults to [`EnvelopeStatus::Success`],
//! both through [`EnvelopeBuilder`] and when deserializing.

use crate::error::EnvelopeError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Well-known sender identities.
pub mod senders {
    pub const SIMULATION_AGENT: &str = "SimulationAgent";
    pub const LOOP_AGENT: &str = "LoopAgent";
}

/// Well-known target intents for persistence handoffs.
pub mod targets {
    pub const NEW_STRATEGY_SAVE: &str = "NEW_STRATEGY_SAVE";
    pub const OPTIMIZATION_SAVE: &str = "OPTIMIZATION_SAVE";
}

/// Outcome of the sending agent's operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvelopeStatus {
    #[default]
    Success,
    Failure,
}

impl fmt::Display for EnvelopeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeStatus::Success => f.write_str("SUCCESS"),
            EnvelopeStatus::Failure => f.write_str("FAILURE"),
        }
    }
}

impl FromStr for EnvelopeStatus {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Ok(EnvelopeStatus::Success),
            "FAILURE" => Ok(EnvelopeStatus::Failure),
            _ => Err(EnvelopeError::InvalidStatus(s.to_string())),
        }
    }
}

/// A validated handoff between two agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct Envelope {
    sender_agent: String,
    timestamp: DateTime<Utc>,
    target_intent: String,
    user_input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<serde_json::Value>,
    status: EnvelopeStatus,
}

impl Envelope {
    pub fn builder() -> EnvelopeBuilder {
        EnvelopeBuilder::default()
    }

    pub fn sender_agent(&self) -> &str {
        &self.sender_agent
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn target_intent(&self) -> &str {
        &self.target_intent
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref()
    }

    pub fn status(&self) -> EnvelopeStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }

    /// Decode the payload into a concrete type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.payload
            .as_ref()
            .map(|value| serde_json::from_value(value.clone()))
    }
}

/// Builder for [`Envelope`]. `build()` enforces the required fields.
#[derive(Debug, Default, Clone)]
pub struct EnvelopeBuilder {
    sender_agent: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    target_intent: Option<String>,
    user_input: Option<String>,
    payload: Option<serde_json::Value>,
    status: Option<EnvelopeStatus>,
}

impl EnvelopeBuilder {
    pub fn sender_agent(mut self, sender: impl Into<String>) -> Self {
        self.sender_agent = Some(sender.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn target_intent(mut self, target: impl Into<String>) -> Self {
        self.target_intent = Some(target.into());
        self
    }

    pub fn user_input(mut self, input: impl Into<String>) -> Self {
        self.user_input = Some(input.into());
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Serialize `payload` into the envelope.
    pub fn payload_from<T: Serialize>(self, payload: &T) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(payload)?;
        Ok(self.payload(value))
    }

    pub fn status(mut self, status: EnvelopeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn build(self) -> Result<Envelope, EnvelopeError> {
        Ok(Envelope {
            sender_agent: required(self.sender_agent, "sender_agent")?,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            target_intent: required(self.target_intent, "target_intent")?,
            user_input: required(self.user_input, "user_input")?,
            payload: self.payload,
            status: self.status.unwrap_or_default(),
        })
    }
}

/// Blank strings count as absent.
fn required(value: Option<String>, field: &'static str) -> Result<String, EnvelopeError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(EnvelopeError::MissingField(field)),
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    sender_agent: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    target_intent: Option<String>,
    user_input: Option<String>,
    #[serde(default)]
    payload: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<String>,
}

impl TryFrom<RawEnvelope> for Envelope {
    type Error = EnvelopeError;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        let status = raw
            .status
            .as_deref()
            .map(EnvelopeStatus::from_str)
            .transpose()?;
        EnvelopeBuilder {
            sender_agent: raw.sender_agent,
            timestamp: raw.timestamp,
            target_intent: raw.target_intent,
            user_input: raw.user_input,
            payload: raw.payload,
            status,
        }
        .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loop_agent_envelope() -> EnvelopeBuilder {
        Envelope::builder()
            .sender_agent(senders::LOOP_AGENT)
            .target_intent(targets::OPTIMIZATION_SAVE)
            .user_input("Find best pit lap.")
    }

    #[test]
    fn valid_envelope_keeps_payload() {
        let envelope = loop_agent_envelope()
            .payload(json!({"best_lap": 23, "delta": 3.45}))
            .status(EnvelopeStatus::Success)
            .build()
            .unwrap();
        assert_eq!(envelope.sender_agent(), "LoopAgent");
        assert_eq!(envelope.payload().unwrap()["best_lap"], 23);
    }

    #[test]
    fn missing_sender_fails() {
        let err = Envelope::builder()
            .target_intent(targets::OPTIMIZATION_SAVE)
            .user_input("optimize")
            .build()
            .unwrap_err();
        assert_eq!(err, EnvelopeError::MissingField("sender_agent"));
    }

    #[test]
    fn missing_target_intent_fails() {
        let err = Envelope::builder()
            .sender_agent(senders::SIMULATION_AGENT)
            .user_input("delete 10")
            .build()
            .unwrap_err();
        assert_eq!(err, EnvelopeError::MissingField("target_intent"));
    }

    #[test]
    fn missing_user_input_fails() {
        let err = Envelope::builder()
            .sender_agent(senders::SIMULATION_AGENT)
            .target_intent(targets::NEW_STRATEGY_SAVE)
            .build()
            .unwrap_err();
        assert_eq!(err, EnvelopeError::MissingField("user_input"));
    }

    #[test]
    fn blank_user_input_fails() {
        let err = Envelope::builder()
            .sender_agent(senders::SIMULATION_AGENT)
            .target_intent("DELETE_ENTRY")
            .user_input("   ")
            .build()
            .unwrap_err();
        assert_eq!(err, EnvelopeError::MissingField("user_input"));
    }

    #[test]
    fn omitted_status_defaults_to_success() {
        let envelope = Envelope::builder()
            .sender_agent(senders::SIMULATION_AGENT)
            .target_intent("DELETE_ENTRY")
            .user_input("delete 10")
            .payload(json!({"strategy_id": 10}))
            .build()
            .unwrap();
        assert_eq!(envelope.status(), EnvelopeStatus::Success);
    }

    #[test]
    fn deserialization_applies_the_same_policy() {
        let envelope: Envelope = serde_json::from_value(json!({
            "sender_agent": "Dispatcher",
            "target_intent": "DELETE_ENTRY",
            "user_input": "delete 10",
            "payload": {"strategy_id": 10}
        }))
        .unwrap();
        assert!(envelope.is_success());

        let missing_sender = serde_json::from_value::<Envelope>(json!({
            "target_intent": "DELETE_ENTRY",
            "user_input": "delete 10"
        }));
        assert!(missing_sender.is_err());

        let bad_status = serde_json::from_value::<Envelope>(json!({
            "sender_agent": "Dispatcher",
            "target_intent": "DELETE_ENTRY",
            "user_input": "delete 10",
            "status": "MAYBE"
        }));
        assert!(bad_status.is_err());
    }

    #[test]
    fn payload_decodes_into_a_type() {
        #[derive(Deserialize)]
        struct Lap {
            best_lap: u32,
        }
        let envelope = loop_agent_envelope()
            .payload(json!({"best_lap": 24}))
            .build()
            .unwrap();
        let lap: Lap = envelope.payload_as().unwrap().unwrap();
        assert_eq!(lap.best_lap, 24);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("failure".parse::<EnvelopeStatus>().unwrap(), EnvelopeStatus::Failure);
        assert!("done".parse::<EnvelopeStatus>().is_err());
    }
}
