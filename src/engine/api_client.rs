use serde::Serialize;
use thiserror::Error;

use crate::model::snapshot::GameSnapshot;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable response: connection refused,
    /// DNS, or a body that did not decode as a snapshot.
    #[error("could not reach the game server")]
    Transport(#[from] reqwest::Error),

    /// The backend refused the operation and said why.
    #[error("{detail}")]
    Rejected { detail: String },
}

impl ApiError {
    /// True when the backend's rejection message contains `needle`
    /// (case-insensitive). The "not enough players" branch keys off this.
    pub fn rejection_contains(&self, needle: &str) -> bool {
        match self {
            ApiError::Rejected { detail } => {
                detail.to_lowercase().contains(&needle.to_lowercase())
            }
            ApiError::Transport(_) => false,
        }
    }
}

#[derive(Serialize)]
struct CreateGameRequest<'a> {
    player_name: &'a str,
}

#[derive(Serialize)]
struct JoinGameRequest<'a> {
    game_id: &'a str,
    player_name: &'a str,
}

#[derive(Serialize)]
struct GameIdRequest<'a> {
    game_id: &'a str,
}

#[derive(Serialize)]
struct PlayCardRequest<'a> {
    game_id: &'a str,
    player_id: &'a str,
    card_value: u32,
}

/// Thin wrapper over the backend's REST surface. Every endpoint answers with
/// a full snapshot; non-2xx responses carry `{"detail": ...}`.
pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn create_game(&self, player_name: &str) -> Result<GameSnapshot, ApiError> {
        self.post(
            "create_game",
            &CreateGameRequest { player_name },
            "Could not create a new game",
        )
    }

    pub fn join_game(&self, game_id: &str, player_name: &str) -> Result<GameSnapshot, ApiError> {
        self.post(
            "join_game",
            &JoinGameRequest {
                game_id,
                player_name,
            },
            "Could not join the game",
        )
    }

    pub fn start_game(&self, game_id: &str) -> Result<GameSnapshot, ApiError> {
        self.post(
            "start_game",
            &GameIdRequest { game_id },
            "Could not start the game",
        )
    }

    pub fn play_card(
        &self,
        game_id: &str,
        player_id: &str,
        card_value: u32,
    ) -> Result<GameSnapshot, ApiError> {
        self.post(
            "play_card",
            &PlayCardRequest {
                game_id,
                player_id,
                card_value,
            },
            "Could not play the card",
        )
    }

    pub fn next_round(&self, game_id: &str) -> Result<GameSnapshot, ApiError> {
        self.post(
            "next_round",
            &GameIdRequest { game_id },
            "Could not advance to the next round",
        )
    }

    pub fn game_status(&self, game_id: &str) -> Result<GameSnapshot, ApiError> {
        let resp = self
            .http
            .get(format!("{}/game_status/{}", self.base_url, game_id))
            .send()?;

        if resp.status().is_success() {
            Ok(resp.json()?)
        } else {
            let body = resp.text().unwrap_or_default();
            Err(ApiError::Rejected {
                detail: error_detail(&body)
                    .unwrap_or_else(|| "Could not fetch the game state".to_string()),
            })
        }
    }

    fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<GameSnapshot, ApiError> {
        let resp = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .json(body)
            .send()?;

        if resp.status().is_success() {
            Ok(resp.json()?)
        } else {
            let body = resp.text().unwrap_or_default();
            Err(ApiError::Rejected {
                detail: error_detail(&body).unwrap_or_else(|| fallback.to_string()),
            })
        }
    }
}

/// Pull the `detail` string out of an error body, if there is one.
fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("detail")?
        .as_str()
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_detail_from_error_body() {
        let body = r#"{"detail": "Card not in player's hand"}"#;
        assert_eq!(error_detail(body).as_deref(), Some("Card not in player's hand"));
    }

    #[test]
    fn falls_back_on_unexpected_bodies() {
        assert_eq!(error_detail("<html>502</html>"), None);
        assert_eq!(error_detail(r#"{"message": "nope"}"#), None);
        assert_eq!(error_detail(r#"{"detail": 42}"#), None);
    }

    #[test]
    fn rejection_matching_is_case_insensitive() {
        let err = ApiError::Rejected {
            detail: "Cannot start game - Not Enough Players or already started".into(),
        };
        assert!(err.rejection_contains("not enough players"));
        assert!(!err.rejection_contains("name taken"));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let api = ApiClient::new("http://localhost:8000/");
        assert_eq!(api.base_url, "http://localhost:8000");
    }
}
