//! The form surface seam and the thin presenter that applies validation
//! results to it.

use crate::model::{
    Control, FieldSpec, HistoryRecord, MessageSlot, SelectionSpec, ValidationResult,
};
use crate::validate::{self, field_message, selection_message};

/// Everything the controller needs from a form host.
pub trait FormSurface {
    fn set_invalid(&mut self, control: Control, invalid: bool);
    /// An empty message clears the slot.
    fn set_message(&mut self, slot: MessageSlot, message: &str);
    /// Drop any highlight left on the radius option labels.
    fn clear_option_emphasis(&mut self);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn focus(&mut self, control: Control);
    fn append_history_row(&mut self, record: &HistoryRecord);
    fn clear_history_rows(&mut self);
}

/// Show or clear the error state of one numeric field.
pub fn present_field(
    surface: &mut dyn FormSurface,
    control: Control,
    spec: &FieldSpec,
    result: &ValidationResult,
) {
    tracing::trace!(field = spec.id(), slot = spec.error_target_id(), ?result, "field checked");
    match result {
        ValidationResult::Valid { .. } => {
            surface.set_invalid(control, false);
            surface.set_message(MessageSlot::Field(control), "");
        }
        ValidationResult::Invalid { reason } => {
            surface.set_invalid(control, true);
            surface.set_message(MessageSlot::Field(control), &field_message(*reason, spec));
        }
    }
}

/// Show or clear the selection-level error. A pass also clears option emphasis.
pub fn present_selection(
    surface: &mut dyn FormSurface,
    spec: &SelectionSpec,
    result: &ValidationResult,
) {
    match result {
        ValidationResult::Valid { .. } => {
            surface.set_invalid(Control::R, false);
            surface.set_message(MessageSlot::Field(Control::R), "");
            surface.clear_option_emphasis();
        }
        ValidationResult::Invalid { .. } => {
            surface.set_invalid(Control::R, true);
            surface.set_message(MessageSlot::Field(Control::R), &selection_message(spec));
        }
    }
}

/// Validate a numeric field and reflect the outcome on the surface.
pub fn check_field(
    surface: &mut dyn FormSurface,
    control: Control,
    raw: &str,
    spec: &FieldSpec,
) -> ValidationResult {
    let result = validate::validate_field(raw, spec);
    present_field(surface, control, spec, &result);
    result
}

/// Validate the radius choice and reflect the outcome on the surface.
pub fn check_selection(
    surface: &mut dyn FormSurface,
    selected: Option<&str>,
    spec: &SelectionSpec,
) -> ValidationResult {
    let result = validate::validate_selection(selected, spec);
    present_selection(surface, spec, &result);
    result
}

/// Clear every field error, the request error and option emphasis (form reset).
pub fn clear_all_errors(surface: &mut dyn FormSurface) {
    for control in [Control::X, Control::Y, Control::R] {
        surface.set_invalid(control, false);
        surface.set_message(MessageSlot::Field(control), "");
    }
    surface.set_message(MessageSlot::Request, "");
    surface.clear_option_emphasis();
}

/// Surface for one-shot runs; the CLI prints what it collects.
#[derive(Debug, Default)]
pub struct TextSurface {
    pub rows: Vec<HistoryRecord>,
    pub errors: Vec<String>,
    pub focused: Option<Control>,
}

impl FormSurface for TextSurface {
    fn set_invalid(&mut self, _control: Control, _invalid: bool) {}

    fn set_message(&mut self, slot: MessageSlot, message: &str) {
        if message.is_empty() {
            return;
        }
        let label = match slot {
            MessageSlot::Field(Control::X) => "X",
            MessageSlot::Field(Control::Y) => "Y",
            MessageSlot::Field(Control::R) => "R",
            MessageSlot::Field(Control::Submit) | MessageSlot::Request => "Request",
        };
        self.errors.push(format!("{label}: {message}"));
    }

    fn clear_option_emphasis(&mut self) {}

    fn set_submit_enabled(&mut self, _enabled: bool) {}

    fn focus(&mut self, control: Control) {
        self.focused = Some(control);
    }

    fn append_history_row(&mut self, record: &HistoryRecord) {
        self.rows.push(record.clone());
    }

    fn clear_history_rows(&mut self) {
        self.rows.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Records every mutation so tests can assert on the visible contract.
    #[derive(Debug)]
    pub(crate) struct RecordingSurface {
        pub invalid: HashMap<Control, bool>,
        pub messages: HashMap<MessageSlot, String>,
        pub submit_enabled: bool,
        pub submit_toggles: Vec<bool>,
        pub focus_calls: Vec<Control>,
        pub emphasis_cleared: usize,
        pub rows: Vec<HistoryRecord>,
    }

    impl Default for RecordingSurface {
        fn default() -> Self {
            Self {
                invalid: HashMap::new(),
                messages: HashMap::new(),
                submit_enabled: true,
                submit_toggles: Vec::new(),
                focus_calls: Vec::new(),
                emphasis_cleared: 0,
                rows: Vec::new(),
            }
        }
    }

    impl RecordingSurface {
        pub fn message(&self, slot: MessageSlot) -> &str {
            self.messages.get(&slot).map(String::as_str).unwrap_or("")
        }

        pub fn is_invalid(&self, control: Control) -> bool {
            self.invalid.get(&control).copied().unwrap_or(false)
        }
    }

    impl FormSurface for RecordingSurface {
        fn set_invalid(&mut self, control: Control, invalid: bool) {
            self.invalid.insert(control, invalid);
        }

        fn set_message(&mut self, slot: MessageSlot, message: &str) {
            self.messages.insert(slot, message.to_string());
        }

        fn clear_option_emphasis(&mut self) {
            self.emphasis_cleared += 1;
        }

        fn set_submit_enabled(&mut self, enabled: bool) {
            self.submit_enabled = enabled;
            self.submit_toggles.push(enabled);
        }

        fn focus(&mut self, control: Control) {
            self.focus_calls.push(control);
        }

        fn append_history_row(&mut self, record: &HistoryRecord) {
            self.rows.push(record.clone());
        }

        fn clear_history_rows(&mut self) {
            self.rows.clear();
        }
    }

    #[test]
    fn field_error_is_set_then_cleared() {
        let spec = FieldSpec::new("x", "xErr", -5.0, 3.0).expect("spec");
        let mut surface = RecordingSurface::default();

        let bad = check_field(&mut surface, Control::X, "9", &spec);
        assert!(!bad.is_valid());
        assert!(surface.is_invalid(Control::X));
        assert_eq!(
            surface.message(MessageSlot::Field(Control::X)),
            "Допустимо от -5 до 3"
        );

        let good = check_field(&mut surface, Control::X, "1", &spec);
        assert_eq!(good.normalized(), Some("1.00"));
        assert!(!surface.is_invalid(Control::X));
        assert_eq!(surface.message(MessageSlot::Field(Control::X)), "");
    }

    #[test]
    fn passing_selection_clears_emphasis() {
        let spec = SelectionSpec::new(["1", "2", "3", "4", "5"]).expect("spec");
        let mut surface = RecordingSurface::default();

        check_selection(&mut surface, None, &spec);
        assert_eq!(
            surface.message(MessageSlot::Field(Control::R)),
            "Выберите одно из значений R (1–5)"
        );
        assert_eq!(surface.emphasis_cleared, 0);

        check_selection(&mut surface, Some("2"), &spec);
        assert_eq!(surface.message(MessageSlot::Field(Control::R)), "");
        assert_eq!(surface.emphasis_cleared, 1);
    }

    #[test]
    fn reset_clears_everything() {
        let spec = FieldSpec::new("y", "yErr", -3.0, 5.0).expect("spec");
        let mut surface = RecordingSurface::default();
        check_field(&mut surface, Control::Y, "", &spec);
        surface.set_message(MessageSlot::Request, "Ошибка запроса: 500");

        clear_all_errors(&mut surface);
        assert!(!surface.is_invalid(Control::Y));
        assert_eq!(surface.message(MessageSlot::Field(Control::Y)), "");
        assert_eq!(surface.message(MessageSlot::Request), "");
    }
}
