//! Scripted providers and classifiers shared by the agent tests.

use async_trait::async_trait;
use pitwall_core::error::{ClassificationError, ProviderError};
use pitwall_core::intent::{ClassificationResult, Classifier, Intent};
use pitwall_core::message::{Message, MessageToolCall};
use pitwall_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that plays back a sequence of scripted results.
///
/// Each call to `complete` returns the next entry. Panics if more calls are
/// made than entries provided. Every request is recorded for inspection.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(make_text_response(text))])
    }

    /// One tool call, then a final answer.
    pub fn tool_then_answer(tool_call: MessageToolCall, answer: &str) -> Self {
        Self::new(vec![
            Ok(make_tool_call_response(vec![tool_call], "")),
            Ok(make_text_response(answer)),
        ])
    }

    /// A provider whose every call fails.
    pub fn failing(times: usize) -> Self {
        Self::new(
            (0..times)
                .map(|_| Err(ProviderError::Network("connection refused".into())))
                .collect(),
        )
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let call = requests.len();

        if call >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{call}, have {})",
                responses.len()
            );
        }

        requests.push(request);
        responses[call].clone()
    }
}

/// A classifier that always returns the same answer, or always fails.
pub struct FixedClassifier {
    result: Option<ClassificationResult>,
}

impl FixedClassifier {
    pub fn returning(intent: Intent, argument: Option<&str>) -> Self {
        Self {
            result: Some(ClassificationResult::new(intent, argument.map(String::from))),
        }
    }

    pub fn failing() -> Self {
        Self { result: None }
    }
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassificationResult, ClassificationError> {
        self.result
            .clone()
            .ok_or_else(|| ClassificationError::Provider(ProviderError::Timeout("scripted".into())))
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut msg = Message::assistant(thought);
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: None,
        model: "mock-model".into(),
    }
}

pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}
