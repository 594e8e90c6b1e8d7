use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::snapshot::GameSnapshot;

use super::app::MindApp;

pub fn draw_game_over_screen(ctx: &egui::Context, app: &mut MindApp, snapshot: &GameSnapshot) {
    let (title, message) = outcome_text(snapshot.current_round);

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(64.0);
            ui.heading(title);
            ui.add_space(8.0);
            ui.label(message);
            ui.add_space(32.0);

            if ui.button("Play again with the same group").clicked() {
                app.send_command(EngineCommand::RestartWithSamePlayers);
            }
            ui.add_space(8.0);
            if ui.button("Back to start").clicked() {
                app.send_command(EngineCommand::LeaveGame);
            }
        });
    });
}

/// Round 10 is the last level: a game that ends in round 11 was cleared, a
/// game that ends in round 10 or earlier ran out of lives.
fn outcome_text(current_round: u32) -> (&'static str, String) {
    if current_round > 10 {
        (
            "Victory!",
            "Congratulations! You made it through all 10 rounds and won the game!".to_string(),
        )
    } else {
        (
            "Game over",
            format!("You lost all your lives in round {current_round}. Try again!"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn victory_boundary_is_exactly_round_eleven() {
        assert_eq!(outcome_text(11).0, "Victory!");
        assert_eq!(outcome_text(10).0, "Game over");
        assert!(outcome_text(4).1.contains("round 4"));
    }
}
