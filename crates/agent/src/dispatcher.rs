//! The dispatcher: one line of input in, one outcome out.
//!
//! Routing checks run in a fixed order, each accepting either the
//! classifier's label or a plain-text trigger on the raw input:
//!
//! | order | intent            | raw-text trigger (case-insensitive)  |
//! |-------|-------------------|--------------------------------------|
//! | 1     | EXIT              | equals `exit`                        |
//! | 2     | REVIEW_HISTORY    | equals `history`                     |
//! | 3     | DELETE_ENTRY      | starts with `delete `                |
//! | 4     | OPTIMIZE_STRATEGY | contains `optimize`                  |
//! | 5     | NEW_STRATEGY      | none                                 |
//!
//! Anything else is unrecognized. A failed classification counts as
//! NEW_STRATEGY. Delete ids are always re-read from the raw text.

use crate::intent_agent::IntentAgent;
use crate::loop_agent::LoopAgent;
use crate::memory_agent::MemoryAgent;
use crate::render;
use crate::simulation_agent::{SimulationAgent, SimulationReport};
use pitwall_config::AppConfig;
use pitwall_core::envelope::{Envelope, senders, targets};
use pitwall_core::intent::{ClassificationResult, Classifier, Intent};
use pitwall_core::provider::Provider;
use pitwall_core::store::StrategyStore;
use pitwall_core::strategy::{OptimizationResult, StrategyDetails, StrategyRecord};
use pitwall_tools::{DeltaModel, Scorer};
use std::sync::Arc;
use tracing::{info, warn};

/// Whether a run ended up in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Saved(i64),
    /// Nothing worth keeping; the reason is for the user.
    Skipped(String),
    Failed(String),
}

impl SaveStatus {
    pub fn saved_id(&self) -> Option<i64> {
        match self {
            SaveStatus::Saved(id) => Some(*id),
            _ => None,
        }
    }
}

/// What handling one line of input did.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Blank input.
    Ignored,
    Exit,
    History(Vec<StrategyRecord>),
    /// `delete` without a usable id; carries the history to show.
    DeleteUsage(Vec<StrategyRecord>),
    Deleted(i64),
    NotFound(i64),
    Optimized {
        result: OptimizationResult,
        save: SaveStatus,
    },
    Strategy {
        report: SimulationReport,
        save: SaveStatus,
    },
    Unrecognized,
    Failed(String),
}

impl DispatchOutcome {
    pub fn is_exit(&self) -> bool {
        matches!(self, DispatchOutcome::Exit)
    }
}

pub struct Dispatcher {
    classifier: Arc<dyn Classifier>,
    strategist: SimulationAgent,
    optimizer: LoopAgent,
    memory: MemoryAgent,
    store: Arc<dyn StrategyStore>,
    history_context_limit: usize,
}

impl Dispatcher {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        strategist: SimulationAgent,
        optimizer: LoopAgent,
        store: Arc<dyn StrategyStore>,
    ) -> Self {
        Self {
            classifier,
            strategist,
            optimizer,
            memory: MemoryAgent::new(store.clone()),
            store,
            history_context_limit: 3,
        }
    }

    pub fn with_history_context_limit(mut self, limit: usize) -> Self {
        self.history_context_limit = limit;
        self
    }

    /// Wire every agent to one provider and store, using the built-in
    /// delta model.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        model: &str,
        store: Arc<dyn StrategyStore>,
    ) -> Self {
        Self::with_scorer(config, provider, model, store, Arc::new(DeltaModel))
    }

    pub fn with_scorer(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        model: &str,
        store: Arc<dyn StrategyStore>,
        scorer: Arc<dyn Scorer>,
    ) -> Self {
        let classifier = IntentAgent::new(provider.clone(), model)
            .with_temperature(config.agent.classifier_temperature);
        let strategist = SimulationAgent::new(
            provider.clone(),
            model,
            Arc::new(pitwall_tools::strategist_registry(scorer.clone())),
        )
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_max_tool_rounds(config.agent.max_tool_rounds);
        let optimizer = LoopAgent::new(provider, model, scorer, config.optimizer.clone());

        Self::new(Arc::new(classifier), strategist, optimizer, store)
            .with_history_context_limit(config.agent.history_context_limit)
    }

    /// Handle one line of input.
    pub async fn handle(&self, input: &str) -> DispatchOutcome {
        let text = input.trim();
        if text.is_empty() {
            return DispatchOutcome::Ignored;
        }

        let classification = match self.classifier.classify(text).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Classification failed, treating input as a strategy question");
                ClassificationResult::new(Intent::NewStrategy, None)
            }
        };
        info!(intent = %classification.intent, argument = ?classification.argument, "Dispatching");

        match route(classification.intent, text) {
            Intent::Exit => DispatchOutcome::Exit,
            Intent::ReviewHistory => match self.store.list().await {
                Ok(records) => DispatchOutcome::History(records),
                Err(e) => DispatchOutcome::Failed(e.to_string()),
            },
            Intent::DeleteEntry => self.delete(text).await,
            Intent::OptimizeStrategy => self.optimize(text).await,
            Intent::NewStrategy => self.strategize(text).await,
            Intent::Other => DispatchOutcome::Unrecognized,
        }
    }

    async fn delete(&self, text: &str) -> DispatchOutcome {
        let Some(id) = parse_delete_id(text) else {
            return match self.store.list().await {
                Ok(records) => DispatchOutcome::DeleteUsage(records),
                Err(e) => DispatchOutcome::Failed(e.to_string()),
            };
        };

        match self.store.delete(id).await {
            Ok(0) => DispatchOutcome::NotFound(id),
            Ok(_) => DispatchOutcome::Deleted(id),
            Err(e) => DispatchOutcome::Failed(e.to_string()),
        }
    }

    /// Run the optimizer for `text` and save the result, skipping
    /// classification. `text` becomes the stored topic.
    pub async fn optimize(&self, text: &str) -> DispatchOutcome {
        let result = self.optimizer.run(text).await;

        let save = if result.is_degenerate() {
            SaveStatus::Skipped("no lap could be simulated".into())
        } else {
            self.save(senders::LOOP_AGENT, targets::OPTIMIZATION_SAVE, text, &result.to_details())
                .await
        };

        DispatchOutcome::Optimized { result, save }
    }

    async fn strategize(&self, text: &str) -> DispatchOutcome {
        let digest = match self.store.recent(self.history_context_limit).await {
            Ok(records) => render::context_digest(&records),
            Err(e) => {
                warn!(error = %e, "Could not load history for context");
                None
            }
        };
        let prompt = render::with_context(digest.as_deref(), text);

        let report = match self.strategist.run(&prompt).await {
            Ok(report) => report,
            Err(e) => return DispatchOutcome::Failed(e.to_string()),
        };

        let save = match (&report.strategy, &report.tool_error) {
            (_, Some(error)) => SaveStatus::Skipped(format!("simulation failed: {error}")),
            (None, None) => SaveStatus::Skipped("no simulation was run".into()),
            (Some(details), None) => {
                self.save(senders::SIMULATION_AGENT, targets::NEW_STRATEGY_SAVE, text, details)
                    .await
            }
        };

        DispatchOutcome::Strategy { report, save }
    }

    async fn save(
        &self,
        sender: &str,
        target: &str,
        user_input: &str,
        details: &StrategyDetails,
    ) -> SaveStatus {
        let envelope = Envelope::builder()
            .sender_agent(sender)
            .target_intent(target)
            .user_input(user_input)
            .payload_from(details)
            .map_err(|e| e.to_string())
            .and_then(|builder| builder.build().map_err(|e| e.to_string()));

        let envelope = match envelope {
            Ok(envelope) => envelope,
            Err(e) => return SaveStatus::Failed(e),
        };

        match self.memory.persist(&envelope).await {
            Ok(id) => SaveStatus::Saved(id),
            Err(e) => {
                warn!(error = %e, "Could not save strategy");
                SaveStatus::Failed(e.to_string())
            }
        }
    }
}

/// Apply the routing precedence to a classifier label and the raw input.
pub fn route(label: Intent, text: &str) -> Intent {
    let lower = text.trim().to_lowercase();

    if label == Intent::Exit || lower == "exit" {
        Intent::Exit
    } else if label == Intent::ReviewHistory || lower == "history" {
        Intent::ReviewHistory
    } else if label == Intent::DeleteEntry || lower.starts_with("delete ") {
        Intent::DeleteEntry
    } else if label == Intent::OptimizeStrategy || lower.contains("optimize") {
        Intent::OptimizeStrategy
    } else if label == Intent::NewStrategy {
        Intent::NewStrategy
    } else {
        Intent::Other
    }
}

/// The id in `delete <id>`: the second whitespace-separated token, digits
/// only. Anything else is a usage error.
pub fn parse_delete_id(text: &str) -> Option<i64> {
    let token = text.split_whitespace().nth(1)?;
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
