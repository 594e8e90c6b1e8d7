use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which game this tab of the client is in, and as whom. Written on
/// create/join and reloaded at startup so a restarted client lands back in
/// its room; cleared when the player returns to the entry screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSession {
    pub game_id: String,
    pub player_name: String,
}

fn session_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("the_mind_client");
    fs::create_dir_all(&path).ok();
    path.push("session.json");
    path
}

pub fn load_session() -> Option<ClientSession> {
    let path = session_path();
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
}

pub fn save_session(session: &ClientSession) {
    let path = session_path();
    if let Ok(json) = serde_json::to_string_pretty(session) {
        let _ = fs::write(path, json);
    }
}

pub fn clear_session() {
    let _ = fs::remove_file(session_path());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trips_through_json() {
        let session = ClientSession {
            game_id: "XK93JD".into(),
            player_name: "ana".into(),
        };
        let json = serde_json::to_string(&session).unwrap();
        let back: ClientSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
