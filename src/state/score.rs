use serde::Serialize;
use utoipa::ToSchema;

use crate::state::round::Player;

/// Cumulative scores of both players.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Scores {
    /// Score of player 1.
    pub player1: u32,
    /// Score of player 2.
    pub player2: u32,
}

impl Scores {
    /// Score of the given player.
    pub fn get(&self, player: Player) -> u32 {
        match player {
            Player::One => self.player1,
            Player::Two => self.player2,
        }
    }

    fn slot_mut(&mut self, player: Player) -> &mut u32 {
        match player {
            Player::One => &mut self.player1,
            Player::Two => &mut self.player2,
        }
    }
}

/// Applies signed score deltas, never letting a score drop below zero.
#[derive(Debug, Clone, Default)]
pub struct ScoreTracker {
    scores: Scores,
}

impl ScoreTracker {
    /// Fresh tracker with both scores at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scores.
    pub fn scores(&self) -> Scores {
        self.scores
    }

    /// `scores[player] = max(0, scores[player] + delta)`, returning the new score.
    pub fn apply_delta(&mut self, player: Player, delta: i32) -> u32 {
        let slot = self.scores.slot_mut(player);
        *slot = if delta >= 0 {
            slot.saturating_add(delta.unsigned_abs())
        } else {
            slot.saturating_sub(delta.unsigned_abs())
        };
        *slot
    }
}
