use std::time::Duration;

use super::events::{DialogRequest, PendingInteraction};

pub const STAT_MAX: i32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Pending,
    Chosen(String),
    Dismissed,
}

/// Active dialog. Arrow keys move the selection and clamp at the ends.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogBox {
    pub text: String,
    pub options: Vec<String>,
    pub selected_index: usize,
    pub pending: Option<PendingInteraction>,
}

impl DialogBox {
    pub fn from_request(request: &DialogRequest) -> Self {
        let last = request.options.len().saturating_sub(1);
        Self {
            text: request.dialog.clone(),
            options: request.options.clone(),
            selected_index: request.selected_index.min(last),
            pending: request.pending.clone(),
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.options.get(self.selected_index).map(String::as_str)
    }

    pub fn handle_key(&mut self, key: &str) -> DialogOutcome {
        match key {
            "ArrowLeft" | "ArrowUp" => {
                self.selected_index = self.selected_index.saturating_sub(1);
                DialogOutcome::Pending
            }
            "ArrowRight" | "ArrowDown" => {
                let last = self.options.len().saturating_sub(1);
                self.selected_index = (self.selected_index + 1).min(last);
                DialogOutcome::Pending
            }
            "Enter" => match self.selected() {
                Some(choice) => DialogOutcome::Chosen(choice.to_string()),
                None => DialogOutcome::Dismissed,
            },
            "Escape" => DialogOutcome::Dismissed,
            _ => DialogOutcome::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBarView {
    pub hp: i32,
    pub max_hp: i32,
    pub intelligence: i32,
    pub max_intelligence: i32,
    pub fatigue: i32,
    pub max_fatigue: i32,
    pub clock: String,
}

impl StatusBarView {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("HP {}/{}", self.hp, self.max_hp),
            format!("INT {}/{}", self.intelligence, self.max_intelligence),
            format!("FAT {}/{}", self.fatigue, self.max_fatigue),
            self.clock.clone(),
        ]
    }
}

/// `HH:MM:SS`; hours keep counting past 99.
pub fn format_game_time(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog(options: &[&str]) -> DialogBox {
        DialogBox::from_request(&DialogRequest {
            dialog: "Pick up?".to_string(),
            options: options.iter().map(|option| option.to_string()).collect(),
            selected_index: 0,
            pending: None,
        })
    }

    #[test]
    fn selection_clamps_at_both_ends() {
        let mut dialog = dialog(&["Pick up", "Leave"]);
        dialog.handle_key("ArrowLeft");
        assert_eq!(dialog.selected(), Some("Pick up"));

        dialog.handle_key("ArrowRight");
        dialog.handle_key("ArrowRight");
        assert_eq!(dialog.selected(), Some("Leave"));
    }

    #[test]
    fn enter_chooses_and_escape_dismisses() {
        let mut dialog = dialog(&["Pick up", "Leave"]);
        assert_eq!(
            dialog.handle_key("Enter"),
            DialogOutcome::Chosen("Pick up".to_string())
        );
        assert_eq!(dialog.handle_key("Escape"), DialogOutcome::Dismissed);
        assert_eq!(dialog.handle_key("x"), DialogOutcome::Pending);
    }

    #[test]
    fn dialog_without_options_dismisses_on_enter() {
        let mut dialog = dialog(&[]);
        assert_eq!(dialog.handle_key("Enter"), DialogOutcome::Dismissed);
    }

    #[test]
    fn out_of_range_initial_selection_is_clamped() {
        let dialog = DialogBox::from_request(&DialogRequest {
            dialog: String::new(),
            options: vec!["a".to_string(), "b".to_string()],
            selected_index: 9,
            pending: None,
        });
        assert_eq!(dialog.selected_index, 1);
    }

    #[test]
    fn game_time_formats_hours_minutes_seconds() {
        assert_eq!(format_game_time(Duration::ZERO), "00:00:00");
        assert_eq!(format_game_time(Duration::from_millis(3_723_999)), "01:02:03");
        assert_eq!(format_game_time(Duration::from_secs(360_000)), "100:00:00");
    }
}
