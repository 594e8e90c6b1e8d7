use crate::engine::ws::ServerMessage;
use crate::model::session::ClientSession;
use crate::model::snapshot::GameSnapshot;
use crate::ui::notifications::NoticeKind;

/// UI → engine.
pub enum EngineCommand {
    CreateGame { player_name: String },
    JoinGame { game_id: String, player_name: String },
    /// Re-enter a game persisted from a previous run; no REST call, the next
    /// poll repopulates state.
    ResumeSession(ClientSession),
    StartGame,
    PlayCard(u32),
    NextRound,
    RestartWithSamePlayers,
    AcceptRematch { from: String },
    DeclineRematch { from: String },
    /// Join the room announced by a `restart_game_available` message.
    JoinPendingGame,
    LeaveGame,

    /// Inbound frame relayed by the socket thread. The command channel is
    /// multi-producer, so pushes and user actions interleave in one queue.
    ServerPush(ServerMessage),
    SocketClosed,
}

/// Engine → UI.
pub enum EngineResponse {
    SessionStarted(ClientSession),
    GameUpdated(GameSnapshot),
    Notify { text: String, kind: NoticeKind },
    /// Another player asked for a rematch; the UI should prompt.
    RematchInvitePrompt { from: String },
    /// A replacement room exists; the UI should offer a join button.
    RestartAvailable { new_game_id: String },
    ReturnedHome,
}
