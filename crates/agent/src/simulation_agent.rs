//! Simulation agent: the strategist.
//!
//! Sends the user's question to the model with the race-delta simulator
//! offered as a tool, runs whatever simulation the model asks for, feeds the
//! number back, and returns the model's final explanation together with the
//! simulated strategy.
//!
//! Only the first tool call of a response is honored. A bad tool call (unknown
//! tool, missing or malformed arguments) ends the loop without a strategy, so
//! nothing gets persisted.

use pitwall_core::error::ProviderError;
use pitwall_core::message::Message;
use pitwall_core::provider::{Provider, ProviderRequest};
use pitwall_core::strategy::StrategyDetails;
use pitwall_core::tool::{ToolCall, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SYSTEM_INSTRUCTION: &str = "You are an expert Formula 1 Race Strategist. Your goal is \
to analyze the user's request and determine the optimal pit stop strategy. You MUST use the \
available function `calculate_race_delta` whenever you need to quantify the time gain or loss of \
a potential pit stop strategy (Undercut, Overcut, etc.) before providing your final advice. The \
arguments for the tool must be precise and based on the user's prompt.";

/// What one strategist run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    /// The model's final explanation. May be empty if the model said nothing.
    pub advice: String,

    /// The last successful simulation, with `advice` attached. `None` means
    /// there is nothing to persist.
    pub strategy: Option<StrategyDetails>,

    /// Why the tool loop was abandoned, if it was.
    pub tool_error: Option<String>,

    /// Number of simulations that ran.
    pub tool_rounds: u32,
}

pub struct SimulationAgent {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    max_tool_rounds: u32,
}

impl SimulationAgent {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tools,
            max_tool_rounds: 5,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max.max(1);
        self
    }

    /// Run the strategist on `prompt`.
    ///
    /// Fails only when the model is unreachable before any simulation
    /// succeeded; after that a templated summary stands in for the model.
    pub async fn run(&self, prompt: &str) -> Result<SimulationReport, ProviderError> {
        let mut messages = vec![Message::system(SYSTEM_INSTRUCTION), Message::user(prompt)];
        let tool_definitions = self.tools.definitions();
        let mut strategy: Option<StrategyDetails> = None;
        let mut tool_rounds = 0;

        let advice = loop {
            let request = ProviderRequest::new(&self.model, messages.clone())
                .with_temperature(self.temperature)
                .with_max_tokens(self.max_tokens)
                .with_tools(tool_definitions.clone());

            let response = match self.provider.complete(request).await {
                Ok(response) => response,
                Err(e) => match strategy.take() {
                    Some(details) => {
                        warn!(error = %e, "Model unavailable after simulation, using summary");
                        let advice = fallback_advice(&details);
                        return Ok(SimulationReport {
                            strategy: Some(StrategyDetails {
                                advice: Some(advice.clone()),
                                ..details
                            }),
                            advice,
                            tool_error: None,
                            tool_rounds,
                        });
                    }
                    None => return Err(e),
                },
            };

            let mut message = response.message;
            let Some(first_call) = message.tool_calls.first().cloned() else {
                break message.content;
            };

            if tool_rounds >= self.max_tool_rounds {
                warn!(rounds = tool_rounds, "Max tool rounds reached, keeping last text");
                break message.content;
            }

            if message.tool_calls.len() > 1 {
                debug!(
                    ignored = message.tool_calls.len() - 1,
                    "Model requested several tool calls, running the first"
                );
                message.tool_calls.truncate(1);
            }

            info!(tool = %first_call.name, arguments = %first_call.arguments, "Running simulation");

            let outcome = match ToolCall::try_from(&first_call) {
                Ok(call) => self.tools.execute(&call).await,
                Err(e) => Err(e),
            };
            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    warn!(tool = %first_call.name, error = %e, "Tool call rejected, abandoning tool loop");
                    return Ok(SimulationReport {
                        advice: message.content,
                        strategy: None,
                        tool_error: Some(e.to_string()),
                        tool_rounds,
                    });
                }
            };

            let details = result
                .data
                .clone()
                .map(serde_json::from_value::<StrategyDetails>)
                .transpose()
                .ok()
                .flatten();
            let Some(details) = details else {
                warn!(tool = %first_call.name, "Tool result carried no strategy");
                return Ok(SimulationReport {
                    advice: message.content,
                    strategy: None,
                    tool_error: Some(format!("{} returned no strategy data", first_call.name)),
                    tool_rounds,
                });
            };

            tool_rounds += 1;
            info!(
                delta = details.calculated_delta,
                pit_lap = details.pit_lap,
                "Simulation result"
            );
            strategy = Some(details);
            messages.push(message);
            messages.push(Message::tool_result(&first_call.id, &result.output));
        };

        let strategy = strategy.map(|details| StrategyDetails {
            advice: (!advice.trim().is_empty()).then(|| advice.clone()),
            ..details
        });

        Ok(SimulationReport {
            advice,
            strategy,
            tool_error: None,
            tool_rounds,
        })
    }
}

fn fallback_advice(details: &StrategyDetails) -> String {
    format!(
        "Simulated '{}' pitting on lap {} for {} tires: {:.2} seconds versus the baseline.",
        details.strategy_name, details.pit_lap, details.tire_type, details.calculated_delta
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use pitwall_core::message::Role;
    use serde_json::json;

    fn agent(provider: Arc<SequentialMockProvider>) -> SimulationAgent {
        SimulationAgent::new(provider, "mock-model", Arc::new(pitwall_tools::default_registry()))
    }

    fn undercut_call() -> pitwall_core::MessageToolCall {
        make_tool_call(
            "calculate_race_delta",
            json!({"strategy_name": "Undercut", "pit_lap": 22, "tire_type": "Medium"}),
        )
    }

    #[tokio::test]
    async fn text_only_answer_has_nothing_to_persist() {
        let provider = Arc::new(SequentialMockProvider::single_text("Stay out."));
        let report = agent(provider).run("Should I pit?").await.unwrap();
        assert_eq!(report.advice, "Stay out.");
        assert_eq!(report.strategy, None);
        assert_eq!(report.tool_rounds, 0);
    }

    #[tokio::test]
    async fn tool_result_is_fed_back_and_persisted() {
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            undercut_call(),
            "Undercut on lap 22 gains 3.44s. Box now.",
        ));
        let report = agent(provider.clone()).run("Undercut on lap 22?").await.unwrap();

        let strategy = report.strategy.unwrap();
        assert_eq!(strategy.strategy_name, "Undercut");
        assert_eq!(strategy.pit_lap, 22);
        assert_eq!(strategy.calculated_delta, 3.44);
        assert_eq!(
            strategy.advice.as_deref(),
            Some("Undercut on lap 22 gains 3.44s. Box now.")
        );
        assert_eq!(report.tool_rounds, 1);

        let second = &provider.requests()[1];
        let tool_msg = second.messages.last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert!(tool_msg.content.contains("3.44"));
        assert!(!second.tools.is_empty());
    }

    #[tokio::test]
    async fn missing_argument_skips_persistence() {
        let bad = make_tool_call(
            "calculate_race_delta",
            json!({"strategy_name": "Undercut", "tire_type": "Medium"}),
        );
        let provider = Arc::new(SequentialMockProvider::new(vec![Ok(make_tool_call_response(
            vec![bad],
            "Let me simulate that.",
        ))]));
        let report = agent(provider.clone()).run("Undercut?").await.unwrap();
        assert_eq!(report.strategy, None);
        assert_eq!(report.advice, "Let me simulate that.");
        assert!(report.tool_error.unwrap().contains("pit_lap"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn malformed_json_arguments_abort() {
        let mut bad = undercut_call();
        bad.arguments = "{not json".into();
        let provider = Arc::new(SequentialMockProvider::new(vec![Ok(make_tool_call_response(
            vec![bad],
            "",
        ))]));
        let report = agent(provider).run("Undercut?").await.unwrap();
        assert!(report.strategy.is_none());
        assert!(report.tool_error.is_some());
    }

    #[tokio::test]
    async fn unknown_tool_aborts() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Ok(make_tool_call_response(
            vec![make_tool_call("weather", json!({}))],
            "",
        ))]));
        let report = agent(provider).run("Rain?").await.unwrap();
        assert!(report.strategy.is_none());
        assert!(report.tool_error.unwrap().contains("weather"));
    }

    #[tokio::test]
    async fn invalid_tire_aborts() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Ok(make_tool_call_response(
            vec![make_tool_call(
                "calculate_race_delta",
                json!({"strategy_name": "x", "pit_lap": 20, "tire_type": "INVALID_TIRE"}),
            )],
            "",
        ))]));
        let report = agent(provider).run("?").await.unwrap();
        assert!(report.strategy.is_none());
    }

    #[tokio::test]
    async fn provider_failure_before_any_tool_is_an_error() {
        let provider = Arc::new(SequentialMockProvider::failing(1));
        assert!(agent(provider).run("Should I pit?").await.is_err());
    }

    #[tokio::test]
    async fn provider_failure_after_tool_uses_summary() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            Ok(make_tool_call_response(vec![undercut_call()], "")),
            Err(ProviderError::Timeout("slow".into())),
        ]));
        let report = agent(provider).run("Undercut?").await.unwrap();
        let strategy = report.strategy.unwrap();
        assert!(report.advice.contains("lap 22"));
        assert!(report.advice.contains("3.44"));
        assert_eq!(strategy.advice.as_deref(), Some(report.advice.as_str()));
    }

    #[tokio::test]
    async fn only_first_tool_call_is_run() {
        let second = make_tool_call(
            "calculate_race_delta",
            json!({"strategy_name": "Overcut", "pit_lap": 30, "tire_type": "Hard"}),
        );
        let provider = Arc::new(SequentialMockProvider::new(vec![
            Ok(make_tool_call_response(vec![undercut_call(), second], "")),
            Ok(make_text_response("Undercut it is.")),
        ]));
        let report = agent(provider.clone()).run("Compare").await.unwrap();
        assert_eq!(report.strategy.unwrap().strategy_name, "Undercut");
        assert_eq!(report.tool_rounds, 1);

        let assistant = &provider.requests()[1].messages[2];
        assert_eq!(assistant.tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn tool_rounds_are_bounded() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            Ok(make_tool_call_response(vec![undercut_call()], "one")),
            Ok(make_tool_call_response(vec![undercut_call()], "two")),
        ]));
        let report = agent(provider.clone())
            .with_max_tool_rounds(1)
            .run("loop forever")
            .await
            .unwrap();
        assert_eq!(report.tool_rounds, 1);
        assert_eq!(report.advice, "two");
        assert!(report.strategy.is_some());
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn instruction_requires_the_tool() {
        assert!(SYSTEM_INSTRUCTION.contains("calculate_race_delta"));
    }
}
