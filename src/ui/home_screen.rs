use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::ui::notifications::NoticeKind;

use super::app::MindApp;

pub fn draw_home_screen(ctx: &egui::Context, app: &mut MindApp) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(48.0);
            ui.heading("The Mind");
            ui.label("Play the cards in ascending order. No talking.");
            ui.add_space(24.0);

            ui.horizontal(|ui| {
                // Center the two entry buttons by hand.
                let spacing = (ui.available_width() - 260.0).max(0.0) / 2.0;
                ui.add_space(spacing);
                if ui.button("Create a game").clicked() {
                    app.ui.show_create_form = true;
                    app.ui.show_join_form = false;
                }
                if ui.button("Join a game").clicked() {
                    app.ui.show_join_form = true;
                    app.ui.show_create_form = false;
                }
            });

            ui.add_space(16.0);

            if app.ui.show_create_form {
                draw_create_form(ui, app);
            }
            if app.ui.show_join_form {
                draw_join_form(ui, app);
            }
        });
    });
}

fn draw_create_form(ui: &mut egui::Ui, app: &mut MindApp) {
    ui.group(|ui| {
        ui.label("Your name");
        ui.add_sized(
            [220.0, 20.0],
            egui::TextEdit::singleline(&mut app.ui.create_name_input).hint_text("Name"),
        );

        if ui.button("Create").clicked() {
            let name = app.ui.create_name_input.trim().to_string();
            if name.is_empty() {
                app.notify_local("Please enter your name.", NoticeKind::Warning);
            } else {
                app.send_command(EngineCommand::CreateGame { player_name: name });
            }
        }
    });
}

fn draw_join_form(ui: &mut egui::Ui, app: &mut MindApp) {
    ui.group(|ui| {
        ui.label("Room code");
        ui.add_sized(
            [220.0, 20.0],
            egui::TextEdit::singleline(&mut app.ui.join_code_input).hint_text("e.g. QK42ZP"),
        );

        ui.label("Your name");
        ui.add_sized(
            [220.0, 20.0],
            egui::TextEdit::singleline(&mut app.ui.join_name_input).hint_text("Name"),
        );

        if ui.button("Join").clicked() {
            let game_id = app.ui.join_code_input.trim().to_uppercase();
            let name = app.ui.join_name_input.trim().to_string();
            if game_id.is_empty() || name.is_empty() {
                app.notify_local("Please fill in both fields.", NoticeKind::Warning);
            } else {
                app.send_command(EngineCommand::JoinGame {
                    game_id,
                    player_name: name,
                });
            }
        }
    });
}
