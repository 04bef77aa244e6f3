use crate::{
    choose_action, AutoplayConfig, AutoplayError, AutoplayResult, RunStatus, Simulator,
    StepRecord, SummaryStats,
};
use farkle_core::GameStatus;
use std::time::Instant;

/// Plays one game to completion or to the configured limits.
///
/// The factory builds the starting simulator; the caller decides seed,
/// content and charms there.
pub fn run_autoplay<F>(factory: &F, config: &AutoplayConfig) -> Result<AutoplayResult, AutoplayError>
where
    F: Fn() -> Result<Simulator, AutoplayError>,
{
    let started_at = Instant::now();
    let mut sim = factory()?;
    let mut records: Vec<StepRecord> = Vec::new();
    let mut status = None;

    for step in 0..config.max_steps {
        if let Some(done) = finished(&sim, config) {
            status = Some(done);
            break;
        }
        let Some(action) = choose_action(&sim.run, config) else {
            status = Some(RunStatus::NoLegalAction);
            break;
        };
        let before = sim.metrics();
        let phase_before = sim.phase_name();
        let action_detail = sim.describe_action(&action);
        let events_before = sim.events.len();
        let event_count = sim.apply_action(&action)?;
        tracing::debug!(step, action = %action.short_label(), event_count, "autoplay step");
        records.push(StepRecord {
            step,
            phase_before,
            before,
            action,
            action_detail,
            phase_after: sim.phase_name(),
            after: sim.metrics(),
            event_detail: sim.describe_events(events_before),
            event_count,
        });
    }

    let status = status
        .or_else(|| finished(&sim, config))
        .unwrap_or(RunStatus::MaxSteps);
    let history = &sim.run.state.history;
    let summary = SummaryStats {
        steps: records.len() as u32,
        rounds: history.rounds.len() as u32,
        banks: history.rounds_banked,
        flops: history.rounds_flopped,
        penalties: history.penalties_applied,
        hot_dice: history.total_hot_dice,
        highest_bank: history.highest_bank,
        wall_time_ms: started_at.elapsed().as_millis() as u64,
    };
    tracing::info!(
        status = ?status,
        score = sim.run.state.game_score,
        rounds = summary.rounds,
        "autoplay finished"
    );
    Ok(AutoplayResult {
        seed: config.seed,
        status,
        final_metrics: sim.metrics(),
        win_condition: sim.run.state.win_condition,
        steps: records,
        summary,
    })
}

fn finished(sim: &Simulator, config: &AutoplayConfig) -> Option<RunStatus> {
    match sim.run.state.status {
        GameStatus::Won => return Some(RunStatus::Won),
        GameStatus::Quit => return Some(RunStatus::Quit),
        GameStatus::InProgress => {}
    }
    let between_rounds = sim.run.round.as_ref().map_or(true, |round| !round.is_active());
    if between_rounds && sim.run.state.history.rounds.len() as u32 >= config.max_rounds {
        return Some(RunStatus::MaxRounds);
    }
    None
}
