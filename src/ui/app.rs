use std::sync::mpsc;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::config::ClientConfig;
use crate::engine::controller::GameController;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::session::{self, ClientSession};
use crate::model::snapshot::{GameSnapshot, GameStatus};
use crate::ui::notifications::{NoticeKind, NotificationsManager};
use crate::ui::settings::UiSettings;
use crate::ui::settings_io;
use crate::ui::{game_over_screen, game_screen, home_screen};

/* =========================
   Screens
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Home,
    Game,
}

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub show_create_form: bool,
    pub show_join_form: bool,
    pub create_name_input: String,
    pub join_code_input: String,
    pub join_name_input: String,

    pub session: Option<ClientSession>,
    pub snapshot: Option<GameSnapshot>,

    pub rematch_invite_from: Option<String>,
    pub pending_restart_id: Option<String>,
    pub copied_at: Option<Instant>,
}

/* =========================
   App
   ========================= */

pub struct MindApp {
    pub ui: UiState,
    pub settings: UiSettings,
    notifications: NotificationsManager,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,

    screen: Screen,
}

impl MindApp {
    pub fn new(config: ClientConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let engine_tx = cmd_tx.clone();
        std::thread::spawn(move || {
            let mut controller = GameController::new(cmd_rx, resp_tx, engine_tx, config);
            controller.run();
        });

        let mut app = Self {
            ui: UiState::default(),
            settings: settings_io::load_settings(),
            notifications: NotificationsManager::default(),
            cmd_tx,
            resp_rx,
            screen: Screen::Home,
        };

        // A session saved by a previous run drops us straight back in.
        if let Some(saved) = session::load_session() {
            app.ui.session = Some(saved.clone());
            app.screen = Screen::Game;
            app.send_command(EngineCommand::ResumeSession(saved));
        }

        app
    }

    pub fn send_command(&self, cmd: EngineCommand) {
        let _ = self.cmd_tx.send(cmd);
    }

    pub fn notify_local(&mut self, text: impl Into<String>, kind: NoticeKind) {
        self.notifications.show(text, kind, Instant::now());
    }

    pub fn copy_room_code(&mut self, ctx: &egui::Context, code: &str) {
        ctx.copy_text(code.to_string());
        self.ui.copied_at = Some(Instant::now());
    }

    pub fn recently_copied(&self) -> bool {
        self.ui
            .copied_at
            .is_some_and(|at| at.elapsed() < Duration::from_secs(2))
    }

    fn drain_engine(&mut self) {
        while let Ok(resp) = self.resp_rx.try_recv() {
            match resp {
                EngineResponse::SessionStarted(session) => {
                    self.ui.session = Some(session);
                    self.ui.snapshot = None;
                    self.ui.rematch_invite_from = None;
                    self.ui.pending_restart_id = None;
                    self.screen = Screen::Game;
                }
                EngineResponse::GameUpdated(snapshot) => {
                    self.ui.snapshot = Some(snapshot);
                }
                EngineResponse::Notify { text, kind } => {
                    self.notifications.show(text, kind, Instant::now());
                }
                EngineResponse::RematchInvitePrompt { from } => {
                    self.ui.rematch_invite_from = Some(from);
                }
                EngineResponse::RestartAvailable { new_game_id } => {
                    self.ui.pending_restart_id = Some(new_game_id);
                }
                EngineResponse::ReturnedHome => {
                    self.ui = UiState::default();
                    self.screen = Screen::Home;
                }
            }
        }
    }

    fn draw_notification_banner(&mut self, ctx: &egui::Context) {
        let Some((notice, opacity)) = self.notifications.current(Instant::now()) else {
            return;
        };
        let text = notice.text.clone();
        let fill = self
            .settings
            .color(kind_key(notice.kind))
            .gamma_multiply(opacity);

        egui::TopBottomPanel::top("notification_banner")
            .frame(
                egui::Frame::new()
                    .fill(fill)
                    .inner_margin(egui::Margin::symmetric(12, 8)),
            )
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new(text)
                            .color(egui::Color32::WHITE.gamma_multiply(opacity))
                            .strong(),
                    );
                });
            });
    }

    fn draw_rematch_prompt(&mut self, ctx: &egui::Context) {
        let Some(from) = self.ui.rematch_invite_from.clone() else {
            return;
        };

        egui::Window::new("Rematch invite")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!(
                    "{from} invited you to a new game. Restart with the same players?"
                ));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Accept").clicked() {
                        self.send_command(EngineCommand::AcceptRematch { from: from.clone() });
                        self.ui.rematch_invite_from = None;
                    }
                    if ui.button("Decline").clicked() {
                        self.send_command(EngineCommand::DeclineRematch { from: from.clone() });
                        self.ui.rematch_invite_from = None;
                    }
                });
            });
    }

    fn draw_restart_offer(&mut self, ctx: &egui::Context) {
        let Some(new_game_id) = self.ui.pending_restart_id.clone() else {
            return;
        };

        egui::Window::new("New room available")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -24.0])
            .show(ctx, |ui| {
                ui.label(format!("A new room is ready: {new_game_id}"));
                ui.horizontal(|ui| {
                    if ui.button("Join it").clicked() {
                        self.send_command(EngineCommand::JoinPendingGame);
                        self.ui.pending_restart_id = None;
                    }
                    if ui.button("Stay here").clicked() {
                        self.ui.pending_restart_id = None;
                    }
                });
            });
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for MindApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.settings.ui_scale);

        self.drain_engine();
        self.draw_notification_banner(ctx);

        match self.screen {
            Screen::Home => home_screen::draw_home_screen(ctx, self),
            Screen::Game => {
                let snapshot = self.ui.snapshot.clone();
                match snapshot {
                    Some(snapshot) if snapshot.status == GameStatus::GameOver => {
                        game_over_screen::draw_game_over_screen(ctx, self, &snapshot);
                    }
                    _ => game_screen::draw_game_screen(ctx, self, snapshot.as_ref()),
                }
                self.draw_rematch_prompt(ctx);
                self.draw_restart_offer(ctx);
            }
        }

        // The engine pushes from another thread; keep frames coming so its
        // responses surface without user input.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

pub fn kind_key(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::Info => "Info",
        NoticeKind::Success => "Success",
        NoticeKind::Warning => "Warning",
        NoticeKind::Error => "Error",
    }
}
