//! Loop agent: the pit-lap optimizer.
//!
//! Scores every lap in a fixed, inclusive range with a fixed strategy label
//! and compound, keeps the best (strict `>`, so ties keep the earliest lap),
//! then asks the model to explain the winner. A lap that fails to score is
//! skipped and recorded. If the model is unavailable a templated summary is
//! used, so a run always yields a result.

use pitwall_config::OptimizerConfig;
use pitwall_core::message::Message;
use pitwall_core::provider::{Provider, ProviderRequest};
use pitwall_core::strategy::{LapEvaluation, LapOutcome, OptimizationResult};
use pitwall_tools::Scorer;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct LoopAgent {
    provider: Arc<dyn Provider>,
    model: String,
    scorer: Arc<dyn Scorer>,
    settings: OptimizerConfig,
}

impl LoopAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        scorer: Arc<dyn Scorer>,
        settings: OptimizerConfig,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            scorer,
            settings,
        }
    }

    /// The search on its own, without the explanation.
    ///
    /// Returns `(best_lap, best_delta, evaluations)`; `(0, -inf, _)` when no
    /// lap scored.
    pub fn search(&self) -> (u32, f64, Vec<LapEvaluation>) {
        let OptimizerConfig {
            start_lap,
            end_lap,
            tire_type,
            strategy_name,
        } = &self.settings;

        let mut best_lap = 0;
        let mut best_delta = f64::NEG_INFINITY;
        let mut evaluations = Vec::new();

        for lap in *start_lap..=*end_lap {
            match self.scorer.score(strategy_name, lap, tire_type) {
                Ok(delta) => {
                    if delta > best_delta {
                        best_delta = delta;
                        best_lap = lap;
                        debug!(lap, delta, "New best lap");
                    } else {
                        debug!(lap, delta, "Lap scored");
                    }
                    evaluations.push(LapEvaluation {
                        lap,
                        outcome: LapOutcome::Scored { delta },
                    });
                }
                Err(e) => {
                    warn!(lap, error = %e, "Simulation failed, skipping lap");
                    evaluations.push(LapEvaluation {
                        lap,
                        outcome: LapOutcome::Skipped {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        (best_lap, best_delta, evaluations)
    }

    /// Run the search for `topic` and explain the result.
    pub async fn run(&self, topic: &str) -> OptimizationResult {
        info!(
            topic,
            start = self.settings.start_lap,
            end = self.settings.end_lap,
            tire = %self.settings.tire_type,
            "Starting optimization"
        );

        let (best_lap, best_delta, evaluations) = self.search();
        let mut result = OptimizationResult {
            strategy_name: self.settings.strategy_name.clone(),
            tire_type: self.settings.tire_type.clone(),
            best_lap,
            best_delta,
            advice: String::new(),
            evaluations,
        };

        if result.is_degenerate() {
            warn!("No lap in range could be simulated");
            result.advice = format!(
                "No lap between {} and {} could be simulated, so there is no recommendation.",
                self.settings.start_lap, self.settings.end_lap
            );
            return result;
        }

        info!(best_lap, best_delta, "Optimal pit lap found");
        result.advice = self.explain(best_lap, best_delta).await;
        result
    }

    async fn explain(&self, best_lap: u32, best_delta: f64) -> String {
        let prompt = format!(
            "Based on the simulation loop you just ran, the calculated optimal pit lap for a \
             standard {} stint is Lap {best_lap}, yielding a time gain of {best_delta:.2} seconds. \
             Explain this result to the user, highlighting why that specific lap is better than \
             the others.",
            self.settings.tire_type
        );
        let request = ProviderRequest::new(&self.model, vec![Message::user(prompt)]);

        match self.provider.complete(request).await {
            Ok(response) if !response.message.content.trim().is_empty() => response.message.content,
            Ok(_) => {
                warn!("Model returned an empty explanation, using summary");
                fallback_advice(best_lap, best_delta)
            }
            Err(e) => {
                warn!(error = %e, "Could not get an explanation, using summary");
                fallback_advice(best_lap, best_delta)
            }
        }
    }
}

pub fn fallback_advice(best_lap: u32, best_delta: f64) -> String {
    format!(
        "Optimal Lap Found: Lap {best_lap} with a time gain of {best_delta:.2} seconds. \
         The system recommends pitting on this lap."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;
    use pitwall_core::error::ToolError;
    use pitwall_tools::DeltaModel;

    fn agent(provider: Arc<SequentialMockProvider>, scorer: Arc<dyn Scorer>) -> LoopAgent {
        LoopAgent::new(provider, "mock-model", scorer, OptimizerConfig::default())
    }

    #[test]
    fn default_range_peaks_at_lap_24() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let (lap, delta, evaluations) = agent(provider, Arc::new(DeltaModel)).search();
        assert_eq!(lap, 24);
        assert_eq!(delta, 3.48);
        assert_eq!(evaluations.len(), 16);
        assert_eq!(evaluations[0].lap, 15);
        assert_eq!(evaluations[15].lap, 30);
    }

    #[test]
    fn ties_keep_the_earliest_lap() {
        let flat = |_: &str, _: u32, _: &str| -> Result<f64, ToolError> { Ok(1.0) };
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let (lap, _, _) = agent(provider, Arc::new(flat)).search();
        assert_eq!(lap, 15);
    }

    #[tokio::test]
    async fn explanation_comes_from_the_model() {
        let provider = Arc::new(SequentialMockProvider::single_text("Lap 24 is the sweet spot."));
        let result = agent(provider.clone(), Arc::new(DeltaModel)).run("optimize").await;
        assert_eq!(result.advice, "Lap 24 is the sweet spot.");
        assert_eq!(result.best_lap, 24);
        assert_eq!(result.strategy_name, "Optimization Check");
        assert_eq!(result.tire_type, "Medium");

        let prompt = &provider.requests()[0].messages[0].content;
        assert!(prompt.contains("standard Medium stint is Lap 24"));
        assert!(prompt.contains("3.48 seconds"));
    }

    #[tokio::test]
    async fn model_failure_uses_fallback_text() {
        let provider = Arc::new(SequentialMockProvider::failing(1));
        let result = agent(provider, Arc::new(DeltaModel)).run("optimize").await;
        assert_eq!(
            result.advice,
            "Optimal Lap Found: Lap 24 with a time gain of 3.48 seconds. \
             The system recommends pitting on this lap."
        );
        assert_eq!(result.best_delta, 3.48);
    }

    #[tokio::test]
    async fn failing_lap_is_skipped() {
        let flaky = |name: &str, lap: u32, tire: &str| -> Result<f64, ToolError> {
            if lap == 24 {
                Err(ToolError::ExecutionFailed {
                    tool_name: "calculate_race_delta".into(),
                    reason: "simulator crashed".into(),
                })
            } else {
                pitwall_tools::calculate_race_delta(name, lap, tire)
            }
        };
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let result = agent(provider, Arc::new(flaky)).run("optimize").await;
        assert_eq!(result.best_lap, 23);
        assert_eq!(result.best_delta, 3.46);
        assert_eq!(result.skipped_laps(), vec![24]);
        assert!(!result.is_degenerate());
    }

    #[tokio::test]
    async fn all_laps_failing_is_degenerate() {
        let broken = |_: &str, _: u32, _: &str| -> Result<f64, ToolError> {
            Err(ToolError::InvalidArguments("no".into()))
        };
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let result = agent(provider.clone(), Arc::new(broken)).run("optimize").await;
        assert!(result.is_degenerate());
        assert_eq!(result.best_lap, 0);
        assert_eq!(result.best_delta, f64::NEG_INFINITY);
        assert_eq!(result.skipped_laps().len(), 16);
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn custom_range_is_respected() {
        let settings = OptimizerConfig {
            start_lap: 40,
            end_lap: 45,
            tire_type: "Hard".into(),
            strategy_name: "Long Stint".into(),
        };
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let agent = LoopAgent::new(provider, "m", Arc::new(DeltaModel), settings);
        let (lap, delta, _) = agent.search();
        assert_eq!(lap, 45);
        assert_eq!(delta, 1.9);
    }
}
