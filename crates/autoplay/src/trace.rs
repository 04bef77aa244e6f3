use crate::{AutoAction, AutoplayError, GameMetrics};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunStatus {
    Won,
    Quit,
    MaxRounds,
    MaxSteps,
    NoLegalAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: u32,
    pub phase_before: String,
    pub before: GameMetrics,
    pub action: AutoAction,
    #[serde(default)]
    pub action_detail: Option<String>,
    pub phase_after: String,
    pub after: GameMetrics,
    #[serde(default)]
    pub event_detail: Option<String>,
    pub event_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub steps: u32,
    pub rounds: u32,
    pub banks: u32,
    pub flops: u32,
    pub penalties: u32,
    pub hot_dice: u32,
    pub highest_bank: i64,
    pub wall_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoplayResult {
    pub seed: u64,
    pub status: RunStatus,
    pub final_metrics: GameMetrics,
    pub win_condition: i64,
    pub steps: Vec<StepRecord>,
    pub summary: SummaryStats,
}

impl AutoplayResult {
    pub fn to_text_report(&self) -> String {
        let mut lines = vec![
            format!("status: {}", run_status_label(self.status)),
            format!("seed: {}", self.seed),
            format!(
                "final: round={} score={}/{} money={}",
                self.final_metrics.round,
                self.final_metrics.game_score,
                self.win_condition,
                self.final_metrics.money
            ),
            format!(
                "summary: steps={} rounds={} banks={} flops={} penalties={} hot_dice={} best_bank={} wall_ms={}",
                self.summary.steps,
                self.summary.rounds,
                self.summary.banks,
                self.summary.flops,
                self.summary.penalties,
                self.summary.hot_dice,
                self.summary.highest_bank,
                self.summary.wall_time_ms
            ),
            String::new(),
            "steps:".to_string(),
        ];
        for step in &self.steps {
            lines.push(format!(
                "  step {:>4} | {}",
                step.step,
                step.action.short_label()
            ));
            lines.push(format!(
                "    {} round {} score {} round_points {} dice {}",
                step.phase_before,
                step.before.round,
                step.before.game_score,
                step.before.round_points,
                step.before.dice_in_hand
            ));
            lines.push(format!(
                "      -> {} round {} score {} round_points {} dice {}",
                step.phase_after,
                step.after.round,
                step.after.game_score,
                step.after.round_points,
                step.after.dice_in_hand
            ));
            lines.push(format!("    events: {}", step.event_count));
            if let Some(detail) = step.action_detail.as_ref() {
                push_block(&mut lines, "action", detail);
            }
            if let Some(detail) = step.event_detail.as_ref() {
                push_block(&mut lines, "event", detail);
            }
        }
        lines.join("\n")
    }
}

fn push_block(lines: &mut Vec<String>, label: &str, text: &str) {
    for row in text.lines() {
        lines.push(format!("    {label}: {row}"));
    }
}

fn run_status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Won => "Won",
        RunStatus::Quit => "Quit",
        RunStatus::MaxRounds => "MaxRounds",
        RunStatus::MaxSteps => "MaxSteps",
        RunStatus::NoLegalAction => "NoLegalAction",
    }
}

pub fn write_json(path: &Path, result: &AutoplayResult) -> Result<(), AutoplayError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(result)?;
    fs::write(path, body)?;
    Ok(())
}

pub fn write_text(path: &Path, result: &AutoplayResult) -> Result<(), AutoplayError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, result.to_text_report())?;
    Ok(())
}
