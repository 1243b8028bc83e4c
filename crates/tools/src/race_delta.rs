//! Race delta simulator: estimates the time gained or lost by a pit stop.
//!
//! The model is a deliberately simple heuristic:
//!
//! | condition                         | gain    |
//! |-----------------------------------|---------|
//! | strategy name contains Aggressive | +1.5 s  |
//! | lap < 25 on Medium                | +3.0 s  |
//! | lap > 40 on Hard                  | +1.0 s  |
//! | always                            | lap/50  |
//!
//! rounded to two decimals. Positive is a gain, negative a loss.

use async_trait::async_trait;
use pitwall_core::TireCompound;
use pitwall_core::error::ToolError;
use pitwall_core::tool::{Tool, ToolResult};
use std::sync::Arc;
use tracing::debug;

pub const TOOL_NAME: &str = "calculate_race_delta";

/// Simulate a pit stop on `pit_lap` with `tire_type` and return the expected
/// delta in seconds versus the baseline strategy.
///
/// Pure: identical inputs always give identical outputs.
pub fn calculate_race_delta(
    strategy_name: &str,
    pit_lap: u32,
    tire_type: &str,
) -> Result<f64, ToolError> {
    let compound = tire_type
        .parse::<TireCompound>()
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
    if pit_lap == 0 {
        return Err(ToolError::InvalidArguments("pit_lap must be at least 1".into()));
    }

    let mut gain = 0.0;
    if strategy_name.contains("Aggressive") {
        gain += 1.5;
    }
    if pit_lap < 25 && compound == TireCompound::Medium {
        gain += 3.0;
    } else if pit_lap > 40 && compound == TireCompound::Hard {
        gain += 1.0;
    }
    gain += f64::from(pit_lap) / 50.0;

    Ok((gain * 100.0).round() / 100.0)
}

/// Anything that can score a (strategy, lap, tire) triple.
///
/// The loop agent and the tool both go through this seam so tests can
/// substitute failing or scripted scorers.
pub trait Scorer: Send + Sync {
    fn score(&self, strategy_name: &str, pit_lap: u32, tire_type: &str) -> Result<f64, ToolError>;
}

impl<F> Scorer for F
where
    F: Fn(&str, u32, &str) -> Result<f64, ToolError> + Send + Sync,
{
    fn score(&self, strategy_name: &str, pit_lap: u32, tire_type: &str) -> Result<f64, ToolError> {
        self(strategy_name, pit_lap, tire_type)
    }
}

/// The built-in heuristic, [`calculate_race_delta`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaModel;

impl Scorer for DeltaModel {
    fn score(&self, strategy_name: &str, pit_lap: u32, tire_type: &str) -> Result<f64, ToolError> {
        calculate_race_delta(strategy_name, pit_lap, tire_type)
    }
}

/// Exposes a [`Scorer`] to the model as `calculate_race_delta`.
pub struct RaceDeltaTool {
    scorer: Arc<dyn Scorer>,
}

impl RaceDeltaTool {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }
}

impl Default for RaceDeltaTool {
    fn default() -> Self {
        Self::new(Arc::new(DeltaModel))
    }
}

#[async_trait]
impl Tool for RaceDeltaTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Simulate a pit stop strategy and return the expected time gain (positive) or \
         loss (negative) in seconds versus the baseline strategy."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        let compounds: Vec<&str> = TireCompound::ALL.iter().map(|c| c.as_str()).collect();
        serde_json::json!({
            "type": "object",
            "properties": {
                "strategy_name": {
                    "type": "string",
                    "description": "A name describing the strategy, e.g. 'Undercut', 'Overcut', 'Aggressive Undercut'"
                },
                "pit_lap": {
                    "type": "integer",
                    "description": "The lap on which the pit stop is executed",
                    "minimum": 1
                },
                "tire_type": {
                    "type": "string",
                    "description": "The compound fitted at the stop",
                    "enum": compounds
                }
            },
            "required": ["strategy_name", "pit_lap", "tire_type"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let strategy_name = arguments["strategy_name"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'strategy_name' argument".into()))?;
        let pit_lap = lap_argument(&arguments["pit_lap"])?;
        let tire_type = arguments["tire_type"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'tire_type' argument".into()))?;

        let delta = self.scorer.score(strategy_name, pit_lap, tire_type)?;
        debug!(strategy_name, pit_lap, tire_type, delta, "Simulated pit stop");

        Ok(ToolResult {
            call_id: String::new(),
            output: serde_json::json!({ "calculated_delta": delta }).to_string(),
            data: Some(serde_json::json!({
                "strategy_name": strategy_name,
                "pit_lap": pit_lap,
                "tire_type": tire_type,
                "calculated_delta": delta,
            })),
        })
    }
}

/// Integers, or floats with no fractional part (some models send `22.0`).
fn lap_argument(value: &serde_json::Value) -> Result<u32, ToolError> {
    let lap = match value {
        serde_json::Value::Null => {
            return Err(ToolError::InvalidArguments("Missing 'pit_lap' argument".into()));
        }
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        _ => None,
    };
    lap.and_then(|l| u32::try_from(l).ok())
        .ok_or_else(|| ToolError::InvalidArguments(format!("'pit_lap' must be a lap number, got {value}")))
}
