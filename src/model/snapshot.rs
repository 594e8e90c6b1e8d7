use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One consistent view of server game state, consumed as immutable input.
/// The backend is the authority; the client never edits these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game_id: String,
    pub status: GameStatus,
    pub current_round: u32,
    pub lives: u32,
    pub players: Vec<String>,

    #[serde(default)]
    pub played_cards: Vec<PlayedCard>,

    /// Player name → card values still in that player's hand.
    #[serde(default)]
    pub player_hands: HashMap<String, Vec<u32>>,
}

impl GameSnapshot {
    /// Hand of the named player. A missing key is an empty hand, never an error.
    pub fn hand_of(&self, player_name: &str) -> &[u32] {
        self.player_hands
            .get(player_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayedCard {
    #[serde(default)]
    pub player_id: Option<String>,
    pub card_value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Waiting,
    Playing,
    RoundEnd,
    GameOver,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_snapshot() {
        let json = r#"{
            "game_id": "A1B2C3",
            "status": "roundEnd",
            "current_round": 3,
            "lives": 2,
            "players": ["ana", "bo"],
            "played_cards": [{"player_id": "ana", "card_value": 17}],
            "player_hands": {"ana": [44, 9], "bo": []}
        }"#;

        let snap: GameSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.status, GameStatus::RoundEnd);
        assert_eq!(snap.played_cards[0].card_value, 17);
        assert_eq!(snap.hand_of("ana"), &[44, 9]);
    }

    #[test]
    fn status_uses_wire_casing() {
        for (wire, status) in [
            ("\"waiting\"", GameStatus::Waiting),
            ("\"playing\"", GameStatus::Playing),
            ("\"roundEnd\"", GameStatus::RoundEnd),
            ("\"gameOver\"", GameStatus::GameOver),
        ] {
            let got: GameStatus = serde_json::from_str(wire).unwrap();
            assert_eq!(got, status);
        }
    }

    #[test]
    fn missing_hand_map_and_attribution_default() {
        let json = r#"{
            "game_id": "A1B2C3",
            "status": "playing",
            "current_round": 1,
            "lives": 3,
            "players": ["ana"],
            "played_cards": [{"card_value": 5}]
        }"#;

        let snap: GameSnapshot = serde_json::from_str(json).unwrap();
        assert!(snap.played_cards[0].player_id.is_none());
        assert!(snap.hand_of("ana").is_empty());
    }
}
