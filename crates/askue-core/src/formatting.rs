use crate::models::Channel;

/// Format a floating-point number with space-separated thousands and a fixed
/// number of decimal places, the way meter reports print energy totals.
///
/// # Examples
///
/// ```
/// use askue_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1 234.5");
/// assert_eq!(format_number(1234567.0, 0), "1 234 567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9 876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by half an ULP at the target precision so exact midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        // "0.50" -> ".50"
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an energy quantity with the unit of its channel.
///
/// ```
/// use askue_core::formatting::format_energy;
/// use askue_core::models::Channel;
///
/// assert_eq!(format_energy(12345.0, Channel::ActiveConsumption), "12 345 kWh");
/// assert_eq!(format_energy(12.0, Channel::ReactiveConsumption), "12 kVArh");
/// ```
pub fn format_energy(value: f64, channel: Channel) -> String {
    format!("{} {}", format_number(value, 0), channel.unit())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert a space every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(' ');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_no_thousands() {
        assert_eq!(format_number(123.456, 2), "123.46");
    }

    #[test]
    fn test_format_number_millions() {
        assert_eq!(format_number(1_234_567.0, 0), "1 234 567");
    }

    #[test]
    fn test_format_number_exact_thousands() {
        assert_eq!(format_number(1_000.0, 0), "1 000");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
    }

    #[test]
    fn test_format_number_negative_rounding_to_zero_has_no_sign() {
        assert_eq!(format_number(-0.004, 2), "0.00");
    }

    // ── format_energy ────────────────────────────────────────────────────────

    #[test]
    fn test_format_energy_units() {
        assert_eq!(format_energy(1500.4, Channel::ActiveGeneration), "1 500 kWh");
        assert_eq!(
            format_energy(999.6, Channel::ReactiveGeneration),
            "1 000 kVArh"
        );
    }
}
