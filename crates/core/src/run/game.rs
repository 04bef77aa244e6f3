use super::*;
use crate::*;

impl RunState {
    /// Applies a finished round to the game: bank or flop bookkeeping, the
    /// consecutive-flop penalty and the win check.
    pub fn advance_game(
        &mut self,
        outcome: RoundOutcome,
        events: &mut EventBus,
    ) -> Result<&GameState, RunError> {
        self.ensure_running()?;
        let mut game = self.state.clone();
        let mut local = Vec::new();

        match &outcome {
            RoundOutcome::Banked { points, money } => {
                game.game_score += points;
                game.money += money;
                game.consecutive_flops = 0;
                game.history.rounds_banked += 1;
                game.history.highest_bank = game.history.highest_bank.max(*points);
                local.push(Event::Banked {
                    banked: *points,
                    game_score: game.game_score,
                });
                tracing::debug!(banked = points, game_score = game.game_score, "banked");
            }
            RoundOutcome::Flopped { forfeited } => {
                game.consecutive_flops += 1;
                game.history.rounds_flopped += 1;
                game.history.total_forfeited += forfeited;
                local.push(Event::Flopped {
                    forfeited: *forfeited,
                    consecutive_flops: game.consecutive_flops,
                });
                if game.consecutive_flops >= game.flop_penalty.limit {
                    game.game_score -= game.flop_penalty.penalty;
                    game.history.penalties_applied += 1;
                    local.push(Event::PenaltyApplied {
                        penalty: game.flop_penalty.penalty,
                        game_score: game.game_score,
                    });
                    tracing::debug!(
                        consecutive = game.consecutive_flops,
                        game_score = game.game_score,
                        "flop penalty"
                    );
                }
            }
        }

        let (rolls, hot_dice) = self
            .round
            .as_ref()
            .map(|round| (round.roll_number, round.hot_dice_counter))
            .unwrap_or((0, 0));
        game.history.rounds.push(RoundSummary {
            round: game.round_number,
            outcome: outcome.clone(),
            rolls,
            hot_dice,
        });

        if matches!(outcome, RoundOutcome::Banked { .. }) && game.has_won() {
            game.status = GameStatus::Won;
            local.push(Event::GameEnded {
                status: game.status,
                game_score: game.game_score,
            });
            tracing::info!(game_score = game.game_score, rounds = game.round_number, "game won");
        }

        self.state = game;
        events.extend(local);
        Ok(&self.state)
    }

    /// Ends the game between rounds.
    pub fn quit(&mut self, events: &mut EventBus) -> Result<(), RunError> {
        self.ensure_running()?;
        if let Some(round) = &self.round {
            if round.is_active() {
                return Err(RunError::RoundInProgress(round.round_number));
            }
        }
        self.state.status = GameStatus::Quit;
        events.push(Event::GameEnded {
            status: GameStatus::Quit,
            game_score: self.state.game_score,
        });
        tracing::info!(game_score = self.state.game_score, "game quit");
        Ok(())
    }
}
