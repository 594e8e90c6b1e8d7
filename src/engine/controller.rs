use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crate::config::ClientConfig;
use crate::engine::api_client::ApiClient;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::ws::{ws_url, ControlMessage, ServerMessage, WebSocketManager};
use crate::model::reconcile::{GameState, ReconciliationResult};
use crate::model::session::{self, ClientSession};
use crate::model::snapshot::{GameSnapshot, GameStatus};
use crate::ui::notifications::NoticeKind;

const ERROR_COOLDOWN: Duration = Duration::from_secs(10);
const IDLE_TICK: Duration = Duration::from_secs(1);

/// Repeated identical connection failures collapse into one notification per
/// cooldown window.
struct ErrorThrottle {
    muted_until: Option<Instant>,
}

impl ErrorThrottle {
    fn new() -> Self {
        Self { muted_until: None }
    }

    fn allow(&mut self, now: Instant) -> bool {
        if self.muted_until.is_some_and(|until| now < until) {
            return false;
        }
        self.muted_until = Some(now + ERROR_COOLDOWN);
        true
    }
}

/// Session-level orchestration: owns the REST client, the room socket, the
/// reconciliation state and the polling cadence. Runs on its own thread and
/// talks to the UI through the command/response channels. Poll responses and
/// socket pushes funnel through the same snapshot entry point; ordering
/// between the two sources is whatever order the channel delivers.
pub struct GameController {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    /// Cloned into each socket thread so pushes join the command queue.
    cmd_tx: Sender<EngineCommand>,

    config: ClientConfig,
    api: ApiClient,

    session: Option<ClientSession>,
    state: Option<GameState>,
    ws: Option<WebSocketManager>,

    pending_new_game_id: Option<String>,
    next_poll: Instant,
    poll_errors: ErrorThrottle,
    socket_loss_notified: bool,
}

impl GameController {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        cmd_tx: Sender<EngineCommand>,
        config: ClientConfig,
    ) -> Self {
        let api = ApiClient::new(&config.backend_url);
        Self {
            rx,
            tx,
            cmd_tx,
            config,
            api,
            session: None,
            state: None,
            ws: None,
            pending_new_game_id: None,
            next_poll: Instant::now(),
            poll_errors: ErrorThrottle::new(),
            socket_loss_notified: false,
        }
    }

    pub fn run(&mut self) {
        loop {
            match self.rx.recv_timeout(self.tick_timeout()) {
                Ok(cmd) => self.handle_command(cmd),
                Err(RecvTimeoutError::Timeout) => self.poll_status(),
                // UI gone: tear down.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::info!("engine stopped");
    }

    fn tick_timeout(&self) -> Duration {
        if self.session.is_some() {
            self.next_poll.saturating_duration_since(Instant::now())
        } else {
            IDLE_TICK
        }
    }

    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::CreateGame { player_name } => self.create_game(&player_name),
            EngineCommand::JoinGame {
                game_id,
                player_name,
            } => self.join_game(&game_id, &player_name),
            EngineCommand::ResumeSession(session) => self.enter_session(session, None),
            EngineCommand::StartGame => self.start_game(),
            EngineCommand::PlayCard(card_value) => self.play_card(card_value),
            EngineCommand::NextRound => self.next_round(),
            EngineCommand::RestartWithSamePlayers => self.restart_with_same_players(),
            EngineCommand::AcceptRematch { from } => self.accept_rematch(&from),
            EngineCommand::DeclineRematch { from } => self.decline_rematch(&from),
            EngineCommand::JoinPendingGame => self.join_pending_game(),
            EngineCommand::LeaveGame => self.leave_game(),
            EngineCommand::ServerPush(msg) => self.handle_push(msg),
            EngineCommand::SocketClosed => self.handle_socket_closed(),
        }
    }

    /* =========================
       Polling
       ========================= */

    fn poll_status(&mut self) {
        self.next_poll = Instant::now() + Duration::from_millis(self.config.poll_interval_ms);
        let Some(session) = self.session.clone() else {
            return;
        };

        match self.api.game_status(&session.game_id) {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(err) => {
                log::warn!("status poll failed: {err}");
                if self.poll_errors.allow(Instant::now()) {
                    self.notify(
                        "Could not reach the game server. Trying again shortly.",
                        NoticeKind::Error,
                    );
                }
            }
        }
    }

    /* =========================
       Snapshot path
       ========================= */

    fn apply_snapshot(&mut self, snapshot: GameSnapshot) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let prev_status = state.current().map(|s| s.status);
        let result = state.update(snapshot.clone());

        for (text, kind) in update_notices(prev_status, &snapshot, result) {
            self.notify(text, kind);
        }
        let _ = self.tx.send(EngineResponse::GameUpdated(snapshot));
    }

    /* =========================
       User actions
       ========================= */

    fn create_game(&mut self, player_name: &str) {
        match self.api.create_game(player_name) {
            Ok(snapshot) => {
                let session = ClientSession {
                    game_id: snapshot.game_id.clone(),
                    player_name: player_name.to_string(),
                };
                self.enter_session(session, Some(snapshot));
            }
            Err(err) => self.notify(err.to_string(), NoticeKind::Error),
        }
    }

    fn join_game(&mut self, game_id: &str, player_name: &str) {
        match self.api.join_game(game_id, player_name) {
            Ok(snapshot) => {
                let session = ClientSession {
                    game_id: game_id.to_string(),
                    player_name: player_name.to_string(),
                };
                self.enter_session(session, Some(snapshot));
            }
            Err(err) => self.notify(err.to_string(), NoticeKind::Error),
        }
    }

    fn start_game(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        match self.api.start_game(&session.game_id) {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(err) if err.rejection_contains("not enough players") => {
                // The room can no longer start on its own; fan out invites so
                // the group can regather. The roster may be stale.
                self.notify("Sending invites to restart the game...", NoticeKind::Info);
                let players = self.known_players();
                if players.is_empty() {
                    self.notify(
                        "Could not find other players to invite.",
                        NoticeKind::Error,
                    );
                } else {
                    self.send_rematch_invite(&session, players);
                }
            }
            Err(err) => self.notify(err.to_string(), NoticeKind::Error),
        }
    }

    fn play_card(&mut self, card_value: u32) {
        let Some(session) = self.session.clone() else {
            return;
        };
        let playing = self
            .state
            .as_ref()
            .and_then(|s| s.current())
            .is_some_and(|s| s.status == GameStatus::Playing);
        if !playing {
            self.notify(
                "You can only play cards while the game is in progress.",
                NoticeKind::Warning,
            );
            return;
        }

        match self
            .api
            .play_card(&session.game_id, &session.player_name, card_value)
        {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(err) => self.notify(err.to_string(), NoticeKind::Error),
        }
    }

    fn next_round(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        match self.api.next_round(&session.game_id) {
            Ok(snapshot) => {
                let round = snapshot.current_round;
                self.apply_snapshot(snapshot);
                self.notify(format!("Round {round} started!"), NoticeKind::Info);
            }
            Err(err) => self.notify(err.to_string(), NoticeKind::Error),
        }
    }

    fn restart_with_same_players(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        let players = self.known_players();
        self.notify("Creating a new room...", NoticeKind::Info);

        match self.api.create_game(&session.player_name) {
            Ok(snapshot) => {
                let new_game_id = snapshot.game_id.clone();
                log::info!("created replacement room {new_game_id}");

                let others = other_players(&players, &session.player_name);
                if !others.is_empty() {
                    // Invites ride the old room's socket; recipients follow.
                    let invite = ControlMessage::NewGameInvite {
                        from: session.player_name.clone(),
                        to: others,
                        new_game_id: new_game_id.clone(),
                    };
                    if !self.ws.as_ref().is_some_and(|ws| ws.send(invite)) {
                        self.notify(
                            "Could not invite the others: connection is down.",
                            NoticeKind::Warning,
                        );
                    }
                }
                self.switch_to_game(new_game_id, Some(snapshot));
            }
            Err(err) => self.notify(
                format!("Could not restart the game: {err}"),
                NoticeKind::Error,
            ),
        }
    }

    fn accept_rematch(&mut self, inviter: &str) {
        let Some(session) = self.session.clone() else {
            return;
        };
        let accept = ControlMessage::RematchAccept {
            from: session.player_name.clone(),
            to: vec![inviter.to_string()],
            game_id: session.game_id.clone(),
        };
        if self.ws.as_ref().is_some_and(|ws| ws.send(accept)) {
            self.notify("Accepting the invite...", NoticeKind::Info);
            self.next_poll = Instant::now();
        } else {
            self.notify(
                "Could not answer the invite: connection is down.",
                NoticeKind::Error,
            );
        }
    }

    fn decline_rematch(&mut self, inviter: &str) {
        let Some(session) = self.session.clone() else {
            return;
        };
        let decline = ControlMessage::RematchDecline {
            from: session.player_name.clone(),
            to: vec![inviter.to_string()],
            game_id: session.game_id.clone(),
        };
        if let Some(ws) = &self.ws {
            ws.send(decline);
        }
    }

    fn join_pending_game(&mut self) {
        let Some(new_game_id) = self.pending_new_game_id.take() else {
            return;
        };
        let Some(session) = self.session.clone() else {
            return;
        };
        match self.api.join_game(&new_game_id, &session.player_name) {
            Ok(snapshot) => self.switch_to_game(new_game_id, Some(snapshot)),
            Err(err) => {
                self.pending_new_game_id = Some(new_game_id);
                self.notify(err.to_string(), NoticeKind::Error);
            }
        }
    }

    fn leave_game(&mut self) {
        session::clear_session();
        self.session = None;
        self.state = None;
        self.ws = None;
        self.pending_new_game_id = None;
        let _ = self.tx.send(EngineResponse::ReturnedHome);
    }

    /* =========================
       Push channel
       ========================= */

    fn handle_push(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Snapshot(snapshot) => self.apply_snapshot(snapshot),
            ServerMessage::Control(ctrl) => self.handle_control(ctrl),
        }
    }

    fn handle_control(&mut self, msg: ControlMessage) {
        let Some(session) = self.session.clone() else {
            return;
        };
        if !msg.is_addressed_to(&session.player_name) {
            log::debug!("control message addressed to someone else, ignored");
            return;
        }

        match msg {
            // Answered at the socket; nothing reaches this far.
            ControlMessage::Ping { .. } | ControlMessage::Pong { .. } => {}

            ControlMessage::RematchInvite { from, .. } => {
                if from == session.player_name {
                    return; // our own broadcast echoed back
                }
                let _ = self.tx.send(EngineResponse::RematchInvitePrompt { from });
            }

            ControlMessage::RematchAccept { from, .. } => {
                self.notify(
                    format!("{from} accepted! Restarting the game..."),
                    NoticeKind::Success,
                );
                self.next_poll = Instant::now();
            }

            ControlMessage::RematchDecline { from, .. } => {
                self.notify(format!("{from} declined the invite."), NoticeKind::Info);
            }

            ControlMessage::NewGameInvite {
                from, new_game_id, ..
            } => {
                self.notify(
                    format!("{from} started a new game. Taking you there..."),
                    NoticeKind::Info,
                );
                self.switch_to_game(new_game_id, None);
            }

            ControlMessage::RestartGameAvailable {
                from, new_game_id, ..
            } => {
                self.pending_new_game_id = Some(new_game_id.clone());
                self.notify(format!("{from} created a new room."), NoticeKind::Info);
                let _ = self.tx.send(EngineResponse::RestartAvailable { new_game_id });
            }
        }
    }

    fn handle_socket_closed(&mut self) {
        if self.ws.as_ref().is_some_and(|ws| ws.is_connected()) {
            return; // stale notice from an already-replaced socket
        }
        if self.session.is_some() && !self.socket_loss_notified {
            self.socket_loss_notified = true;
            self.notify(
                "Live connection lost. Updates continue by polling.",
                NoticeKind::Warning,
            );
        }
    }

    /* =========================
       Session plumbing
       ========================= */

    fn enter_session(&mut self, session: ClientSession, snapshot: Option<GameSnapshot>) {
        session::save_session(&session);
        self.state = Some(GameState::new(session.player_name.clone()));
        self.connect_socket(&session);
        self.session = Some(session.clone());
        self.pending_new_game_id = None;
        self.socket_loss_notified = false;

        let _ = self.tx.send(EngineResponse::SessionStarted(session));
        if let Some(snapshot) = snapshot {
            self.apply_snapshot(snapshot);
        }
        // Fetch fresh state right away; the interval takes over from there.
        self.next_poll = Instant::now();
    }

    fn switch_to_game(&mut self, game_id: String, snapshot: Option<GameSnapshot>) {
        let Some(current) = self.session.as_ref() else {
            return;
        };
        let session = ClientSession {
            game_id,
            player_name: current.player_name.clone(),
        };
        self.enter_session(session, snapshot);
    }

    fn connect_socket(&mut self, session: &ClientSession) {
        // Drop (and join) any previous room's socket before opening the next.
        self.ws = None;
        let url = ws_url(&self.config.backend_url, &session.game_id);
        match WebSocketManager::connect(&url, self.cmd_tx.clone()) {
            Ok(ws) => self.ws = Some(ws),
            Err(err) => {
                log::error!("websocket connect failed: {err:#}");
                self.notify(
                    "Live updates unavailable; falling back to polling.",
                    NoticeKind::Warning,
                );
            }
        }
    }

    fn known_players(&self) -> Vec<String> {
        self.state
            .as_ref()
            .and_then(|s| s.current())
            .map(|s| s.players.clone())
            .unwrap_or_default()
    }

    fn send_rematch_invite(&mut self, session: &ClientSession, players: Vec<String>) {
        let others = other_players(&players, &session.player_name);
        if others.is_empty() {
            self.notify("There are no other players to invite.", NoticeKind::Warning);
            return;
        }

        let invite = ControlMessage::RematchInvite {
            from: session.player_name.clone(),
            to: others.clone(),
            game_id: session.game_id.clone(),
        };
        if self.ws.as_ref().is_some_and(|ws| ws.send(invite)) {
            self.notify(
                format!("Invite sent to {}", others.join(", ")),
                NoticeKind::Info,
            );
        } else {
            self.notify(
                "Could not send the invite: connection is down.",
                NoticeKind::Error,
            );
        }
    }

    fn notify(&self, text: impl Into<String>, kind: NoticeKind) {
        let _ = self.tx.send(EngineResponse::Notify {
            text: text.into(),
            kind,
        });
    }
}

fn other_players(players: &[String], player_name: &str) -> Vec<String> {
    players
        .iter()
        .filter(|p| p.as_str() != player_name)
        .cloned()
        .collect()
}

/// What the user should be told about this update, in display order.
fn update_notices(
    prev_status: Option<GameStatus>,
    snapshot: &GameSnapshot,
    result: ReconciliationResult,
) -> Vec<(String, NoticeKind)> {
    let mut notices = Vec::new();

    if result.was_round_restarted {
        notices.push((
            "Oops! Someone had a lower card. You lost a life and the round restarts.".to_string(),
            NoticeKind::Warning,
        ));
    }

    if result.just_played_card
        && !result.was_round_restarted
        && snapshot.status == GameStatus::Playing
    {
        notices.push(("Card played!".to_string(), NoticeKind::Success));
    }

    match (prev_status, snapshot.status) {
        (Some(GameStatus::RoundEnd), GameStatus::Playing) => notices.push((
            format!("Round {} started!", snapshot.current_round),
            NoticeKind::Info,
        )),
        (Some(prev), GameStatus::RoundEnd) if prev != GameStatus::RoundEnd => notices.push((
            "Round complete! Ready for the next one?".to_string(),
            NoticeKind::Success,
        )),
        _ => {}
    }

    notices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::snapshot::PlayedCard;
    use std::collections::HashMap;

    fn snapshot(status: GameStatus, round: u32) -> GameSnapshot {
        GameSnapshot {
            game_id: "ROOM01".into(),
            status,
            current_round: round,
            lives: 3,
            players: vec!["ana".into(), "bo".into()],
            played_cards: vec![PlayedCard {
                player_id: None,
                card_value: 12,
            }],
            player_hands: HashMap::new(),
        }
    }

    fn quiet() -> ReconciliationResult {
        ReconciliationResult {
            was_round_restarted: false,
            cards_played_changed: false,
            just_played_card: false,
        }
    }

    #[test]
    fn restart_outranks_card_played() {
        let result = ReconciliationResult {
            was_round_restarted: true,
            cards_played_changed: true,
            just_played_card: true,
        };
        let notices = update_notices(
            Some(GameStatus::Playing),
            &snapshot(GameStatus::Playing, 2),
            result,
        );
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].1, NoticeKind::Warning);
    }

    #[test]
    fn own_play_is_announced_while_playing_only() {
        let result = ReconciliationResult {
            was_round_restarted: false,
            cards_played_changed: true,
            just_played_card: true,
        };
        let during = update_notices(
            Some(GameStatus::Playing),
            &snapshot(GameStatus::Playing, 2),
            result,
        );
        assert!(during.iter().any(|(text, _)| text == "Card played!"));

        let after = update_notices(
            Some(GameStatus::Playing),
            &snapshot(GameStatus::GameOver, 2),
            result,
        );
        assert!(after.is_empty());
    }

    #[test]
    fn status_transitions_announce_round_boundaries() {
        let into_round_end = update_notices(
            Some(GameStatus::Playing),
            &snapshot(GameStatus::RoundEnd, 2),
            quiet(),
        );
        assert_eq!(into_round_end.len(), 1);
        assert_eq!(into_round_end[0].1, NoticeKind::Success);

        let back_to_playing = update_notices(
            Some(GameStatus::RoundEnd),
            &snapshot(GameStatus::Playing, 3),
            quiet(),
        );
        assert_eq!(back_to_playing[0].0, "Round 3 started!");

        // Re-delivering the same roundEnd snapshot stays silent.
        let repeat = update_notices(
            Some(GameStatus::RoundEnd),
            &snapshot(GameStatus::RoundEnd, 2),
            quiet(),
        );
        assert!(repeat.is_empty());
    }

    #[test]
    fn first_snapshot_is_silent() {
        assert!(update_notices(None, &snapshot(GameStatus::Waiting, 1), quiet()).is_empty());
    }

    #[test]
    fn other_players_filters_self_only() {
        let players = vec!["ana".to_string(), "bo".to_string(), "cy".to_string()];
        assert_eq!(other_players(&players, "bo"), vec!["ana", "cy"]);
        assert!(other_players(&players[..1], "ana").is_empty());
    }

    #[test]
    fn error_throttle_mutes_within_cooldown() {
        let mut throttle = ErrorThrottle::new();
        let t0 = Instant::now();
        assert!(throttle.allow(t0));
        assert!(!throttle.allow(t0 + Duration::from_secs(3)));
        assert!(throttle.allow(t0 + ERROR_COOLDOWN + Duration::from_secs(1)));
    }
}
