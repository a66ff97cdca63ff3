use crate::model::{Control, FormConfig, FormSnapshot, HistoryRecord, MessageSlot};
use crate::surface::FormSurface;

/// Everything the form draws. Owned by the event loop only.
pub struct UiState {
    pub tab: usize,
    pub focus: Control,
    pub info: String,

    pub x_input: String,
    pub y_input: String,
    pub x_bounds: (f64, f64),
    pub y_bounds: (f64, f64),
    pub r_tokens: Vec<String>,
    pub r_cursor: usize,
    pub r_selected: Option<usize>,

    pub x_invalid: bool,
    pub y_invalid: bool,
    pub r_invalid: bool,
    pub option_emphasis: bool,
    pub x_error: String,
    pub y_error: String,
    pub r_error: String,
    pub request_error: String,

    pub submit_enabled: bool,

    pub history: Vec<HistoryRecord>,
    pub history_selected: usize, // 0 = most recent
}

impl UiState {
    pub fn new(cfg: &FormConfig) -> Self {
        Self {
            tab: 0,
            focus: Control::X,
            info: String::new(),
            x_input: String::new(),
            y_input: String::new(),
            x_bounds: (cfg.x.min(), cfg.x.max()),
            y_bounds: (cfg.y.min(), cfg.y.max()),
            r_tokens: cfg.r.tokens().to_vec(),
            r_cursor: 0,
            r_selected: None,
            x_invalid: false,
            y_invalid: false,
            r_invalid: false,
            option_emphasis: false,
            x_error: String::new(),
            y_error: String::new(),
            r_error: String::new(),
            request_error: String::new(),
            submit_enabled: true,
            history: Vec::new(),
            history_selected: 0,
        }
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            x: self.x_input.clone(),
            y: self.y_input.clone(),
            r: self
                .r_selected
                .and_then(|i| self.r_tokens.get(i))
                .cloned(),
        }
    }

    /// Mutable text of the focused input, if the focus is on one.
    pub fn focused_input(&mut self) -> Option<&mut String> {
        match self.focus {
            Control::X => Some(&mut self.x_input),
            Control::Y => Some(&mut self.y_input),
            Control::R | Control::Submit => None,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Control::X => Control::Y,
            Control::Y => Control::R,
            Control::R => Control::Submit,
            Control::Submit => Control::X,
        };
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            Control::X => Control::Submit,
            Control::Y => Control::X,
            Control::R => Control::Y,
            Control::Submit => Control::R,
        };
    }

    pub fn move_r_cursor(&mut self, delta: isize) {
        if self.r_tokens.is_empty() {
            return;
        }
        let n = self.r_tokens.len() as isize;
        self.r_cursor = (self.r_cursor as isize + delta).rem_euclid(n) as usize;
    }

    /// Select the option under the cursor, or the option whose token matches.
    pub fn select_r(&mut self, token: Option<char>) -> bool {
        let idx = match token {
            Some(c) => self.r_tokens.iter().position(|t| t == &c.to_string()),
            None => Some(self.r_cursor),
        };
        match idx {
            Some(i) if i < self.r_tokens.len() => {
                self.r_cursor = i;
                self.r_selected = Some(i);
                true
            }
            _ => false,
        }
    }

    /// Clear values and selection; error slots are cleared by the caller.
    pub fn reset_form(&mut self) {
        self.x_input.clear();
        self.y_input.clear();
        self.r_selected = None;
        self.r_cursor = 0;
        self.focus = Control::X;
    }

    /// Keep the selection on a valid row after the list changes.
    pub fn clamp_history_selection(&mut self) {
        if self.history.is_empty() {
            self.history_selected = 0;
        } else if self.history_selected >= self.history.len() {
            self.history_selected = self.history.len() - 1;
        }
    }
}

impl FormSurface for UiState {
    fn set_invalid(&mut self, control: Control, invalid: bool) {
        match control {
            Control::X => self.x_invalid = invalid,
            Control::Y => self.y_invalid = invalid,
            Control::R => {
                self.r_invalid = invalid;
                if invalid {
                    self.option_emphasis = true;
                }
            }
            Control::Submit => {}
        }
    }

    fn set_message(&mut self, slot: MessageSlot, message: &str) {
        let target = match slot {
            MessageSlot::Field(Control::X) => &mut self.x_error,
            MessageSlot::Field(Control::Y) => &mut self.y_error,
            MessageSlot::Field(Control::R) => &mut self.r_error,
            MessageSlot::Field(Control::Submit) | MessageSlot::Request => &mut self.request_error,
        };
        *target = message.to_string();
    }

    fn clear_option_emphasis(&mut self) {
        self.option_emphasis = false;
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
        self.info = if enabled {
            String::new()
        } else {
            "Отправка…".to_string()
        };
    }

    fn focus(&mut self, control: Control) {
        self.focus = control;
        self.tab = 0;
    }

    fn append_history_row(&mut self, record: &HistoryRecord) {
        self.history.push(record.clone());
    }

    fn clear_history_rows(&mut self) {
        self.history.clear();
        self.clamp_history_selection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{build_config, Cli};
    use clap::Parser;

    fn state() -> UiState {
        let cfg = build_config(&Cli::parse_from(["area-check", "--mock"])).expect("config");
        UiState::new(&cfg)
    }

    #[test]
    fn snapshot_reflects_inputs() {
        let mut s = state();
        s.x_input.push_str("1.5");
        s.y_input.push('2');
        assert!(s.select_r(Some('3')));
        assert_eq!(
            s.snapshot(),
            FormSnapshot {
                x: "1.5".into(),
                y: "2".into(),
                r: Some("3".into()),
            }
        );
    }

    #[test]
    fn unknown_radius_key_is_ignored() {
        let mut s = state();
        assert!(!s.select_r(Some('9')));
        assert_eq!(s.snapshot().r, None);
    }

    #[test]
    fn r_cursor_wraps() {
        let mut s = state();
        s.move_r_cursor(-1);
        assert_eq!(s.r_cursor, 4);
        s.move_r_cursor(1);
        assert_eq!(s.r_cursor, 0);
    }

    #[test]
    fn reset_clears_values() {
        let mut s = state();
        s.x_input.push('1');
        s.select_r(Some('2'));
        s.focus = Control::Submit;
        s.reset_form();
        assert_eq!(s.snapshot(), FormSnapshot::default());
        assert_eq!(s.focus, Control::X);
    }
}
