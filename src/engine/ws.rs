use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::engine::protocol::EngineCommand;
use crate::model::snapshot::GameSnapshot;

/// Peer-coordination messages relayed through the room's push channel.
/// Addressed by the in-band `to` list; not part of game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ControlMessage {
    Ping {
        timestamp: f64,
    },
    Pong {
        timestamp: f64,
    },
    RematchInvite {
        from: String,
        to: Vec<String>,
        game_id: String,
    },
    RematchAccept {
        from: String,
        to: Vec<String>,
        game_id: String,
    },
    RematchDecline {
        from: String,
        to: Vec<String>,
        game_id: String,
    },
    NewGameInvite {
        from: String,
        to: Vec<String>,
        new_game_id: String,
    },
    RestartGameAvailable {
        from: String,
        original_game_id: String,
        new_game_id: String,
        to: Vec<String>,
    },
}

impl ControlMessage {
    fn recipients(&self) -> &[String] {
        match self {
            ControlMessage::Ping { .. } | ControlMessage::Pong { .. } => &[],
            ControlMessage::RematchInvite { to, .. }
            | ControlMessage::RematchAccept { to, .. }
            | ControlMessage::RematchDecline { to, .. }
            | ControlMessage::NewGameInvite { to, .. }
            | ControlMessage::RestartGameAvailable { to, .. } => to,
        }
    }

    /// The relay broadcasts to the whole room; the `to` list is the real
    /// address. An empty list means everyone.
    pub fn is_addressed_to(&self, player_name: &str) -> bool {
        let to = self.recipients();
        to.is_empty() || to.iter().any(|name| name == player_name)
    }
}

/// Everything the push channel can deliver: a tagged control message, or a
/// bare snapshot broadcast after a state change.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Control(ControlMessage),
    Snapshot(GameSnapshot),
}

/// Derive the socket endpoint for a room from the configured backend URL.
pub fn ws_url(backend_url: &str, game_id: &str) -> String {
    let base = backend_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{base}/ws/{game_id}")
}

const READ_TIMEOUT: Duration = Duration::from_millis(100);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// One socket per game session, serviced by a single owned thread. The short
/// read timeout lets the thread interleave inbound frames with draining the
/// outbound queue. Inbound messages land in the engine's command channel;
/// keep-alive pings are answered here and never surfaced.
pub struct WebSocketManager {
    outbound: mpsc::Sender<ControlMessage>,
    connected: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl WebSocketManager {
    pub fn connect(url: &str, events: mpsc::Sender<EngineCommand>) -> Result<Self> {
        let socket = open_socket(url)?;
        log::info!("websocket connected: {url}");

        let (outbound, out_rx) = mpsc::channel();
        let connected = Arc::new(AtomicBool::new(true));
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread_connected = Arc::clone(&connected);
        let thread_shutdown = Arc::clone(&shutdown);
        let handle = thread::spawn(move || {
            service_socket(socket, out_rx, events, &thread_shutdown);
            thread_connected.store(false, Ordering::Release);
        });

        Ok(Self {
            outbound,
            connected,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Queue a control message for the socket thread. Returns false when the
    /// socket is already known to be down.
    pub fn send(&self, msg: ControlMessage) -> bool {
        if !self.is_connected() {
            log::error!("cannot send control message: socket is not connected");
            return false;
        }
        self.outbound.send(msg).is_ok()
    }
}

impl Drop for WebSocketManager {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn open_socket(url: &str) -> Result<Socket> {
    let (mut socket, _response) =
        tungstenite::connect(url).context("websocket handshake failed")?;

    // A blocking read would starve the outbound queue.
    match socket.get_mut() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(READ_TIMEOUT))?,
        MaybeTlsStream::NativeTls(stream) => {
            stream.get_ref().set_read_timeout(Some(READ_TIMEOUT))?
        }
        _ => {}
    }

    Ok(socket)
}

fn service_socket(
    mut socket: Socket,
    out_rx: mpsc::Receiver<ControlMessage>,
    events: mpsc::Sender<EngineCommand>,
    shutdown: &AtomicBool,
) {
    loop {
        if shutdown.load(Ordering::Acquire) {
            let _ = socket.close(None);
            return;
        }

        while let Ok(msg) = out_rx.try_recv() {
            if let Err(err) = send_json(&mut socket, &msg) {
                log::error!("websocket send failed: {err}");
                let _ = events.send(EngineCommand::SocketClosed);
                return;
            }
        }

        match socket.read() {
            Ok(Message::Text(frame)) => {
                if !handle_frame(frame.as_str(), &mut socket, &events) {
                    return;
                }
            }
            Ok(Message::Close(_)) => {
                log::info!("websocket closed by server");
                let _ = events.send(EngineCommand::SocketClosed);
                return;
            }
            // Protocol-level ping/pong and binary frames are not ours.
            Ok(_) => {}
            Err(tungstenite::Error::Io(err))
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut => {}
            Err(err) => {
                log::warn!("websocket error: {err}");
                let _ = events.send(EngineCommand::SocketClosed);
                return;
            }
        }
    }
}

/// Returns false when the engine side is gone and the thread should stop.
fn handle_frame(raw: &str, socket: &mut Socket, events: &mpsc::Sender<EngineCommand>) -> bool {
    match serde_json::from_str::<ServerMessage>(raw) {
        Ok(ServerMessage::Control(ControlMessage::Ping { timestamp })) => {
            // Liveness probe: answer immediately, never surface.
            if let Err(err) = send_json(socket, &ControlMessage::Pong { timestamp }) {
                log::warn!("pong reply failed: {err}");
            }
            true
        }
        Ok(ServerMessage::Control(ControlMessage::Pong { .. })) => true,
        Ok(msg) => events.send(EngineCommand::ServerPush(msg)).is_ok(),
        Err(_) => {
            log::debug!("dropping undecodable frame: {raw}");
            true
        }
    }
}

fn send_json(socket: &mut Socket, msg: &ControlMessage) -> Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::from(json))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_decodes_as_control() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type": "ping", "timestamp": 1718.25}"#).unwrap();
        assert!(matches!(
            msg,
            ServerMessage::Control(ControlMessage::Ping { timestamp }) if timestamp == 1718.25
        ));
    }

    #[test]
    fn pong_reply_keeps_wire_shape() {
        let json = serde_json::to_string(&ControlMessage::Pong { timestamp: 3.5 }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "pong");
        assert_eq!(value["timestamp"], 3.5);
    }

    #[test]
    fn control_fields_use_camel_case() {
        let msg: ServerMessage = serde_json::from_str(
            r#"{"type": "rematch_invite", "from": "ana", "to": ["bo", "cy"], "gameId": "ROOM01"}"#,
        )
        .unwrap();
        let ServerMessage::Control(ControlMessage::RematchInvite { from, to, game_id }) = msg
        else {
            panic!("expected rematch invite");
        };
        assert_eq!(from, "ana");
        assert_eq!(to, vec!["bo".to_string(), "cy".to_string()]);
        assert_eq!(game_id, "ROOM01");

        let json = serde_json::to_string(&ControlMessage::NewGameInvite {
            from: "ana".into(),
            to: vec!["bo".into()],
            new_game_id: "ROOM02".into(),
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "new_game_invite");
        assert_eq!(value["newGameId"], "ROOM02");
    }

    #[test]
    fn untagged_frame_falls_back_to_snapshot() {
        let msg: ServerMessage = serde_json::from_str(
            r#"{
                "game_id": "ROOM01",
                "status": "waiting",
                "current_round": 1,
                "lives": 3,
                "players": ["ana"],
                "played_cards": [],
                "player_hands": {}
            }"#,
        )
        .unwrap();
        assert!(matches!(msg, ServerMessage::Snapshot(_)));
    }

    #[test]
    fn garbage_frames_do_not_decode() {
        assert!(serde_json::from_str::<ServerMessage>("hello there").is_err());
        assert!(serde_json::from_str::<ServerMessage>(r#"{"type": "ufo"}"#).is_err());
    }

    #[test]
    fn recipient_list_is_the_address() {
        let invite = ControlMessage::RematchInvite {
            from: "ana".into(),
            to: vec!["bo".into()],
            game_id: "ROOM01".into(),
        };
        assert!(invite.is_addressed_to("bo"));
        assert!(!invite.is_addressed_to("cy"));

        let ping = ControlMessage::Ping { timestamp: 0.0 };
        assert!(ping.is_addressed_to("anyone"));
    }

    #[test]
    fn ws_url_follows_backend_scheme() {
        assert_eq!(
            ws_url("http://localhost:8000", "ROOM01"),
            "ws://localhost:8000/ws/ROOM01"
        );
        assert_eq!(
            ws_url("https://mind.example.com/", "ROOM01"),
            "wss://mind.example.com/ws/ROOM01"
        );
    }
}
