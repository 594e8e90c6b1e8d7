use crate::model::snapshot::{GameSnapshot, GameStatus};

/// Last-known server state plus the diffing that turns a fresh snapshot into
/// UI-facing signals. Holds at most one snapshot: the current one, which
/// becomes the previous one on the next call.
pub struct GameState {
    player_name: String,
    current: Option<GameSnapshot>,
}

/// Derived per-update signals. Recomputed on every update, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// A life was lost without the round advancing: the backend silently
    /// restarted the round after an invalid play.
    pub was_round_restarted: bool,
    /// The ordered played-cards sequence differs from the previous snapshot.
    pub cards_played_changed: bool,
    /// The table changed *and* our own hand shrank, so the change was ours.
    pub just_played_card: bool,
}

impl GameState {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&GameSnapshot> {
        self.current.as_ref()
    }

    /// Diff `new` against the stored snapshot, then commit `new` as current.
    /// The result is fully computed before anything is overwritten, so there
    /// is no ordering trap between diffing and committing.
    pub fn update(&mut self, new: GameSnapshot) -> ReconciliationResult {
        let result = self.diff(&new);
        self.current = Some(new);
        result
    }

    fn diff(&self, new: &GameSnapshot) -> ReconciliationResult {
        let prev = self.current.as_ref();

        let was_round_restarted = prev.is_some_and(|prev| {
            prev.status == GameStatus::Playing
                && new.status == GameStatus::Playing
                && new.lives < prev.lives
                && new.current_round == prev.current_round
        });

        let prev_cards = prev.map(|p| p.played_cards.as_slice()).unwrap_or(&[]);
        let cards_played_changed = prev_cards != new.played_cards.as_slice();

        let prev_hand_len = prev.map(|p| p.hand_of(&self.player_name).len()).unwrap_or(0);
        let new_hand_len = new.hand_of(&self.player_name).len();
        let just_played_card = cards_played_changed && prev_hand_len > new_hand_len;

        ReconciliationResult {
            was_round_restarted,
            cards_played_changed,
            just_played_card,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::snapshot::PlayedCard;
    use std::collections::HashMap;

    fn snapshot(
        status: GameStatus,
        lives: u32,
        round: u32,
        played: &[u32],
        hand: &[u32],
    ) -> GameSnapshot {
        let mut player_hands = HashMap::new();
        player_hands.insert("me".to_string(), hand.to_vec());
        GameSnapshot {
            game_id: "ROOM01".into(),
            status,
            current_round: round,
            lives,
            players: vec!["me".into(), "other".into()],
            played_cards: played
                .iter()
                .map(|v| PlayedCard {
                    player_id: None,
                    card_value: *v,
                })
                .collect(),
            player_hands,
        }
    }

    #[test]
    fn lost_life_same_round_is_a_restart() {
        let mut state = GameState::new("me");
        state.update(snapshot(GameStatus::Playing, 3, 2, &[4], &[9]));
        let result = state.update(snapshot(GameStatus::Playing, 2, 2, &[], &[9]));
        assert!(result.was_round_restarted);
    }

    #[test]
    fn lost_life_with_round_advance_is_not_a_restart() {
        let mut state = GameState::new("me");
        state.update(snapshot(GameStatus::Playing, 3, 2, &[4], &[9]));
        let result = state.update(snapshot(GameStatus::Playing, 2, 3, &[], &[9, 12]));
        assert!(!result.was_round_restarted);
    }

    #[test]
    fn restart_requires_both_sides_playing() {
        let mut state = GameState::new("me");
        state.update(snapshot(GameStatus::RoundEnd, 3, 2, &[4], &[]));
        let result = state.update(snapshot(GameStatus::Playing, 2, 2, &[], &[9]));
        assert!(!result.was_round_restarted);
    }

    #[test]
    fn equal_card_sequences_report_no_change() {
        let mut state = GameState::new("me");
        state.update(snapshot(GameStatus::Playing, 3, 1, &[7, 8], &[20]));
        let result = state.update(snapshot(GameStatus::Playing, 3, 1, &[7, 8], &[20]));
        assert!(!result.cards_played_changed);
        assert!(!result.just_played_card);
    }

    #[test]
    fn other_players_card_is_not_ours() {
        let mut state = GameState::new("me");
        state.update(snapshot(GameStatus::Playing, 3, 1, &[], &[20]));
        // Table changed, our hand did not shrink.
        let result = state.update(snapshot(GameStatus::Playing, 3, 1, &[5], &[20]));
        assert!(result.cards_played_changed);
        assert!(!result.just_played_card);
    }

    #[test]
    fn update_is_idempotent_on_identical_snapshots() {
        let mut state = GameState::new("me");
        let snap = snapshot(GameStatus::Playing, 3, 1, &[5], &[20]);
        state.update(snap.clone());
        let result = state.update(snap);
        assert!(!result.cards_played_changed);
    }

    #[test]
    fn own_play_then_round_restart_scenario() {
        let mut state = GameState::new("me");

        // A: fresh round, nothing played.
        state.update(snapshot(GameStatus::Playing, 3, 2, &[], &[1, 2, 3]));

        // B: we played the 2.
        let b = state.update(snapshot(GameStatus::Playing, 3, 2, &[2], &[1, 3]));
        assert!(b.cards_played_changed);
        assert!(b.just_played_card);
        assert!(!b.was_round_restarted);

        // C: backend wiped the table and took a life.
        let c = state.update(snapshot(GameStatus::Playing, 2, 2, &[], &[1, 3]));
        assert!(c.was_round_restarted);
        assert!(c.cards_played_changed);
        assert!(!c.just_played_card);
    }

    #[test]
    fn missing_hand_key_counts_as_empty() {
        let mut state = GameState::new("ghost");
        let mut snap = snapshot(GameStatus::Playing, 3, 1, &[], &[]);
        snap.player_hands.clear();
        let result = state.update(snap);
        assert!(!result.just_played_card);
    }

    #[test]
    fn first_update_has_no_restart_and_no_own_play() {
        let mut state = GameState::new("me");
        let result = state.update(snapshot(GameStatus::Playing, 2, 1, &[3], &[8]));
        assert!(!result.was_round_restarted);
        assert!(result.cards_played_changed);
        assert!(!result.just_played_card);
    }
}
