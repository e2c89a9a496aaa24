//! Placeholder format specs and numeric formatting
//!
//! Formatting is part of the output contract and must stay stable:
//! percent values multiply by 100 and round to two decimals; the
//! fixed-1-decimal spec is deliberately widened to the same two-decimal
//! rendering; integer-ish values keep up to two decimals. Trailing zeros
//! are always trimmed from decimal literals.

/// Parsed placeholder format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSpec {
    /// `P`, `F1P`, `F2P`: a ratio rendered as a percentage number
    Percent,
    /// `F1`, `F2`: declared decimal places (widened to two on output)
    Fixed(u8),
    /// `I` or no spec: integer-ish
    Integer,
}

/// Parse the text after `:` in a `{paramK:SPEC}` placeholder. Unknown
/// specs degrade to integer-ish rather than failing the template.
pub fn parse_format_spec(s: &str) -> FormatSpec {
    let spec = s.trim();
    if spec == "P" || (spec.starts_with('F') && spec.ends_with('P')) {
        return FormatSpec::Percent;
    }
    if let Some(digits) = spec.strip_prefix('F') {
        if let Ok(places) = digits.parse::<u8>() {
            return FormatSpec::Fixed(places);
        }
    }
    FormatSpec::Integer
}

/// Render one value under a format spec
pub fn format_value(value: f64, spec: &FormatSpec) -> String {
    let scaled = match spec {
        FormatSpec::Percent => value * 100.0,
        _ => value,
    };
    format_trimmed(round2(scaled))
}

/// Round half away from zero to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn format_trimmed(value: f64) -> String {
    let rendered = format!("{:.2}", value);
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    rendered.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_specs() {
        assert_eq!(parse_format_spec("P"), FormatSpec::Percent);
        assert_eq!(parse_format_spec("F1P"), FormatSpec::Percent);
        assert_eq!(parse_format_spec("F2P"), FormatSpec::Percent);
        assert_eq!(parse_format_spec("F1"), FormatSpec::Fixed(1));
        assert_eq!(parse_format_spec("F2"), FormatSpec::Fixed(2));
        assert_eq!(parse_format_spec("I"), FormatSpec::Integer);
        assert_eq!(parse_format_spec(""), FormatSpec::Integer);
        assert_eq!(parse_format_spec("X9"), FormatSpec::Integer);
    }

    #[test]
    fn test_percent_multiplies_and_rounds() {
        assert_eq!(format_value(0.446, &FormatSpec::Percent), "44.6");
        assert_eq!(format_value(0.4466, &FormatSpec::Percent), "44.66");
        assert_eq!(format_value(0.44666, &FormatSpec::Percent), "44.67");
        assert_eq!(format_value(0.5, &FormatSpec::Percent), "50");
    }

    #[test]
    fn test_fixed_one_widens_to_two_decimals() {
        assert_eq!(format_value(1.125, &FormatSpec::Fixed(1)), "1.13");
        assert_eq!(format_value(10.0, &FormatSpec::Fixed(1)), "10");
    }

    #[test]
    fn test_trailing_zeros_trimmed() {
        assert_eq!(format_value(2.50, &FormatSpec::Fixed(2)), "2.5");
        assert_eq!(format_value(3.00, &FormatSpec::Integer), "3");
        assert_eq!(format_value(0.30, &FormatSpec::Percent), "30");
    }

    #[test]
    fn test_integer_ish_keeps_two_decimals() {
        assert_eq!(format_value(2.375, &FormatSpec::Integer), "2.38");
        assert_eq!(format_value(7.0, &FormatSpec::Integer), "7");
    }
}
