use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::snapshot::{GameSnapshot, GameStatus};

use super::app::MindApp;

pub fn draw_game_screen(ctx: &egui::Context, app: &mut MindApp, snapshot: Option<&GameSnapshot>) {
    let Some(snapshot) = snapshot else {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.label("Connecting to the game…");
            });
        });
        return;
    };

    match snapshot.status {
        GameStatus::Waiting => draw_lobby(ctx, app, snapshot),
        _ => draw_table(ctx, app, snapshot),
    }
}

/* =========================
   Lobby (status: waiting)
   ========================= */

fn draw_lobby(ctx: &egui::Context, app: &mut MindApp, snapshot: &GameSnapshot) {
    egui::SidePanel::left("lobby_players")
        .resizable(false)
        .default_width(200.0)
        .show(ctx, |ui| {
            draw_players_list(ui, app, &snapshot.players);
            ui.separator();
            ui.label("UI Scale");
            if ui
                .add(egui::Slider::new(&mut app.settings.ui_scale, 0.75..=2.0))
                .drag_stopped()
            {
                super::settings_io::save_settings(&app.settings);
            }
        });

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(32.0);
            ui.heading("Waiting room");
            ui.add_space(8.0);
            draw_room_code(ui, app, &snapshot.game_id);
            ui.add_space(8.0);
            ui.label(format!("{} player(s) in the room", snapshot.players.len()));
            ui.add_space(24.0);

            if ui.button("Start game").clicked() {
                app.send_command(EngineCommand::StartGame);
            }
        });
    });
}

/* =========================
   Table (playing / roundEnd)
   ========================= */

fn draw_table(ctx: &egui::Context, app: &mut MindApp, snapshot: &GameSnapshot) {
    egui::TopBottomPanel::top("table_header").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(format!("Round {}", snapshot.current_round)).strong());
            ui.separator();
            ui.label(format!("❤ {}", snapshot.lives));
            ui.separator();
            draw_room_code(ui, app, &snapshot.game_id);
        });
    });

    egui::TopBottomPanel::bottom("player_hand").show(ctx, |ui| {
        ui.add_space(6.0);
        ui.label("Your hand");

        let mut hand = snapshot.hand_of(app_player_name(app)).to_vec();
        hand.sort_unstable();

        if hand.is_empty() {
            ui.label("You have no cards");
        } else {
            ui.horizontal_wrapped(|ui| {
                for value in hand {
                    let card = egui::Button::new(
                        egui::RichText::new(value.to_string()).size(20.0).strong(),
                    )
                    .min_size(egui::vec2(48.0, 64.0));
                    if ui.add(card).clicked() {
                        app.send_command(EngineCommand::PlayCard(value));
                    }
                }
            });
        }
        ui.add_space(6.0);
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.add_space(12.0);
        ui.heading("Played cards");
        ui.add_space(8.0);

        if snapshot.played_cards.is_empty() {
            ui.label("No cards played yet");
        } else {
            ui.horizontal_wrapped(|ui| {
                for card in &snapshot.played_cards {
                    played_card(ui, card.card_value);
                }
            });
        }

        if snapshot.status == GameStatus::RoundEnd {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.heading("Round complete!");
                ui.add_space(8.0);
                if ui.button("Next round").clicked() {
                    app.send_command(EngineCommand::NextRound);
                }
            });
        }
    });
}

/* =========================
   Shared pieces
   ========================= */

fn draw_players_list(ui: &mut egui::Ui, app: &MindApp, players: &[String]) {
    ui.heading("Players");
    ui.separator();
    let me = app_player_name(app);
    for player in players {
        if player == me {
            ui.label(egui::RichText::new(format!("{player} (You)")).strong());
        } else {
            ui.label(player);
        }
    }
}

fn draw_room_code(ui: &mut egui::Ui, app: &mut MindApp, game_id: &str) {
    ui.horizontal(|ui| {
        ui.label("Room code:");
        ui.label(egui::RichText::new(game_id).monospace().strong());
        let copy_label = if app.recently_copied() { "✔" } else { "📋" };
        if ui.small_button(copy_label).clicked() {
            let ctx = ui.ctx().clone();
            app.copy_room_code(&ctx, game_id);
        }
    });
}

fn played_card(ui: &mut egui::Ui, value: u32) {
    egui::Frame::new()
        .fill(egui::Color32::from_rgb(60, 60, 90))
        .corner_radius(6)
        .inner_margin(egui::Margin::symmetric(14, 18))
        .show(ui, |ui| {
            ui.label(
                egui::RichText::new(value.to_string())
                    .size(20.0)
                    .color(egui::Color32::WHITE)
                    .strong(),
            );
        });
}

fn app_player_name(app: &MindApp) -> &str {
    app.ui
        .session
        .as_ref()
        .map(|s| s.player_name.as_str())
        .unwrap_or("")
}
