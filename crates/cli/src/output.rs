//! What the user sees for each dispatch outcome.

use pitwall_agent::render::history_table;
use pitwall_agent::{DispatchOutcome, SaveStatus};
use pitwall_core::strategy::OptimizationResult;
use std::fmt::Write;

pub const BANNER: &str = "F1 Strategist System Initialized!\n\
Commands: [exit], [history], [delete <ID>], [optimize], or ask for a pit strategy.";

pub const PROMPT: &str = "\nYour Strategy Question: ";

pub const GOODBYE: &str = "Race finished. Goodbye!";

const UNRECOGNIZED: &str = "The system did not recognize the command. \
Please try again or ask a clear strategy question.";

const DELETE_USAGE: &str = "Usage Error: The intent agent needs a valid ID (number) for deletion.";

pub fn deleted(id: i64) -> String {
    format!("Entry with ID {id} successfully deleted from memory.")
}

pub fn not_found(id: i64) -> String {
    format!("Strategy ID {id} not found.")
}

/// Text for an outcome, or `None` when there is nothing to say.
pub fn render(outcome: &DispatchOutcome) -> Option<String> {
    let text = match outcome {
        DispatchOutcome::Ignored => return None,
        DispatchOutcome::Exit => GOODBYE.to_string(),
        DispatchOutcome::History(records) => history_table(records),
        DispatchOutcome::DeleteUsage(records) => {
            format!("{DELETE_USAGE}\n\n{}", history_table(records))
        }
        DispatchOutcome::Deleted(id) => deleted(*id),
        DispatchOutcome::NotFound(id) => not_found(*id),
        DispatchOutcome::Optimized { result, save } => optimization(result, save),
        DispatchOutcome::Strategy { report, save } => {
            let advice = if report.advice.trim().is_empty() {
                "(The strategist returned no explanation.)"
            } else {
                report.advice.trim()
            };
            format!(
                "--- Final Advice (LLM Response) ---\n{advice}\n\n{}",
                save_line("Strategy", save)
            )
        }
        DispatchOutcome::Unrecognized => UNRECOGNIZED.to_string(),
        DispatchOutcome::Failed(reason) => format!("Error: {reason}"),
    };
    Some(text)
}

fn optimization(result: &OptimizationResult, save: &SaveStatus) -> String {
    let mut out = String::from("--- Optimization Result ---\n");
    let _ = writeln!(
        out,
        "Strategy: {} on {} tires",
        result.strategy_name, result.tire_type
    );
    if !result.is_degenerate() {
        let _ = writeln!(
            out,
            "Best lap: {} (gain {:.2}s)",
            result.best_lap, result.best_delta
        );
    }
    let skipped = result.skipped_laps();
    if !skipped.is_empty() {
        let laps: Vec<String> = skipped.iter().map(u32::to_string).collect();
        let _ = writeln!(out, "Skipped laps: {}", laps.join(", "));
    }
    let _ = write!(
        out,
        "\n{}\n\n{}",
        result.advice.trim(),
        save_line("Optimization", save)
    );
    out
}

fn save_line(what: &str, save: &SaveStatus) -> String {
    match save {
        SaveStatus::Saved(id) => format!("Memory Agent: {what} saved to database with ID: {id}"),
        SaveStatus::Skipped(reason) => format!("Memory Agent: Nothing saved ({reason})."),
        SaveStatus::Failed(reason) => format!("Memory Agent: Could not save {what}: {reason}"),
    }
}
