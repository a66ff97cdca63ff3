//! Pure field and selection validation.
//!
//! Nothing here touches the form; `surface::present_*` interprets the results.

use crate::model::{FieldSpec, InvalidReason, SelectionSpec, ValidationResult};
use regex_lite::Regex;
use std::sync::OnceLock;

static DECIMAL_2: OnceLock<Option<Regex>> = OnceLock::new();

/// Optional minus, digits, optional point with one or two digits.
fn decimal_pattern() -> Option<&'static Regex> {
    DECIMAL_2
        .get_or_init(|| Regex::new(r"^-?\d+(\.\d{1,2})?$").ok())
        .as_ref()
}

fn is_two_place_decimal(s: &str) -> bool {
    match decimal_pattern() {
        Some(re) => re.is_match(s),
        None => false,
    }
}

/// Validate one numeric input. Checks run in order: empty, format, range.
pub fn validate_field(raw: &str, spec: &FieldSpec) -> ValidationResult {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid(InvalidReason::Empty);
    }
    if !is_two_place_decimal(trimmed) {
        return ValidationResult::invalid(InvalidReason::BadFormat);
    }
    let value: f64 = match trimmed.parse() {
        Ok(v) => v,
        Err(_) => return ValidationResult::invalid(InvalidReason::BadFormat),
    };
    if value < spec.min() || value > spec.max() {
        return ValidationResult::invalid(InvalidReason::OutOfRange);
    }
    ValidationResult::Valid {
        normalized: format_fixed2(value),
    }
}

/// Validate the radius choice; the normalized value is the token itself.
pub fn validate_selection(selected: Option<&str>, spec: &SelectionSpec) -> ValidationResult {
    match selected {
        Some(token) if spec.contains(token) => ValidationResult::Valid {
            normalized: token.to_string(),
        },
        _ => ValidationResult::invalid(InvalidReason::NoneSelected),
    }
}

/// Two fractional digits; negative zero prints as `0.00`.
pub fn format_fixed2(value: f64) -> String {
    format!("{:.2}", value + 0.0)
}

/// Human-readable message for a field failure.
pub fn field_message(reason: InvalidReason, spec: &FieldSpec) -> String {
    match reason {
        InvalidReason::Empty => "Поле не должно быть пустым".to_string(),
        // Numeric fields never report NoneSelected; radius messages come from
        // `selection_message`.
        InvalidReason::BadFormat | InvalidReason::NoneSelected => {
            "Неверный формат. Используйте точку и до 2 знаков".to_string()
        }
        InvalidReason::OutOfRange => format!("Допустимо от {} до {}", spec.min(), spec.max()),
    }
}

/// Human-readable message for a missing radius choice.
pub fn selection_message(spec: &SelectionSpec) -> String {
    let tokens = spec.tokens();
    let first = tokens.first().map(String::as_str).unwrap_or_default();
    let last = tokens.last().map(String::as_str).unwrap_or_default();
    format!("Выберите одно из значений R ({first}–{last})")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x_spec() -> FieldSpec {
        FieldSpec::new("x", "xErr", -5.0, 3.0).expect("spec")
    }

    fn y_spec() -> FieldSpec {
        FieldSpec::new("y", "yErr", -3.0, 5.0).expect("spec")
    }

    fn r_spec() -> SelectionSpec {
        SelectionSpec::new(["1", "2", "3", "4", "5"]).expect("spec")
    }

    fn valid(s: &str) -> ValidationResult {
        ValidationResult::Valid {
            normalized: s.to_string(),
        }
    }

    #[test]
    fn decimal_pattern_compiles() {
        assert!(decimal_pattern().is_some());
        assert!(is_two_place_decimal("-1.25"));
    }

    #[test]
    fn blank_input_is_empty() {
        for raw in ["", "   ", "\t\n"] {
            assert_eq!(
                validate_field(raw, &x_spec()),
                ValidationResult::invalid(InvalidReason::Empty)
            );
        }
    }

    #[test]
    fn rejects_malformed_numbers() {
        for raw in ["1.234", "1e2", "1,000", "--1", "+1", "1.", ".5", "abc", "1,5"] {
            assert_eq!(
                validate_field(raw, &x_spec()),
                ValidationResult::invalid(InvalidReason::BadFormat),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn format_is_checked_before_range() {
        assert_eq!(
            validate_field("100.123", &x_spec()),
            ValidationResult::invalid(InvalidReason::BadFormat)
        );
    }

    #[test]
    fn x_bounds_are_inclusive() {
        let spec = x_spec();
        assert_eq!(validate_field("-5", &spec), valid("-5.00"));
        assert_eq!(validate_field("3.00", &spec), valid("3.00"));
        assert_eq!(
            validate_field("3.01", &spec),
            ValidationResult::invalid(InvalidReason::OutOfRange)
        );
        assert_eq!(
            validate_field("-5.01", &spec),
            ValidationResult::invalid(InvalidReason::OutOfRange)
        );
    }

    #[test]
    fn y_bounds() {
        let spec = y_spec();
        assert_eq!(
            validate_field("5.5", &spec),
            ValidationResult::invalid(InvalidReason::OutOfRange)
        );
        assert_eq!(validate_field("-3", &spec), valid("-3.00"));
    }

    #[test]
    fn normalizes_to_two_places_after_trimming() {
        assert_eq!(validate_field("  1.5 ", &x_spec()), valid("1.50"));
        assert_eq!(validate_field("-0", &x_spec()), valid("0.00"));
        assert_eq!(validate_field("002.1", &y_spec()), valid("2.10"));
    }

    #[test]
    fn selection_requires_allowed_token() {
        assert_eq!(
            validate_selection(None, &r_spec()),
            ValidationResult::invalid(InvalidReason::NoneSelected)
        );
        assert_eq!(
            validate_selection(Some("6"), &r_spec()),
            ValidationResult::invalid(InvalidReason::NoneSelected)
        );
        assert_eq!(validate_selection(Some("3"), &r_spec()), valid("3"));
    }

    #[test]
    fn messages_distinguish_reasons() {
        let spec = x_spec();
        assert_eq!(
            field_message(InvalidReason::OutOfRange, &spec),
            "Допустимо от -5 до 3"
        );
        assert_ne!(
            field_message(InvalidReason::Empty, &spec),
            field_message(InvalidReason::BadFormat, &spec)
        );
        assert_eq!(
            selection_message(&r_spec()),
            "Выберите одно из значений R (1–5)"
        );
        assert_eq!(
            field_message(InvalidReason::NoneSelected, &spec),
            field_message(InvalidReason::BadFormat, &spec)
        );
    }
}
