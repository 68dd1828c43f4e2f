//! Number and text formatting for display, using French grouping
//! (`1 234 567,8`).

const THOUSANDS: char = ' ';
const DECIMAL: char = ',';

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(THOUSANDS);
        }
        out.push(c);
    }
    out
}

/// Formats `value` with at most `decimals` fractional digits, trimming
/// trailing zeros.
pub fn number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = formatted
        .split_once('.')
        .map_or((formatted.as_str(), ""), |(i, f)| (i, f));
    let frac = frac_part.trim_end_matches('0');

    let mut out = String::new();
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if !frac.is_empty() {
        out.push(DECIMAL);
        out.push_str(frac);
    }
    out
}

pub fn integer(value: u64) -> String {
    group_digits(&value.to_string())
}

pub fn fcfa(value: f64) -> String {
    format!("{} FCFA", number(value, 0))
}

/// Quantity with its unit when known.
pub fn quantity(value: f64, unit: Option<&str>) -> String {
    match unit {
        Some(unit) if !unit.is_empty() => format!("{} {unit}", number(value, 2)),
        _ => number(value, 2),
    }
}

pub fn percent(part: f64, total: f64) -> String {
    if total <= 0.0 || !part.is_finite() {
        return "-".to_string();
    }
    format!("{} %", number(part / total * 100.0, 1))
}

/// Shortens `text` to `max` characters, ending with an ellipsis when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}

pub fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_with_spaces() {
        assert_eq!(integer(0), "0");
        assert_eq!(integer(999), "999");
        assert_eq!(integer(1_000), "1 000");
        assert_eq!(integer(12_345_678), "12 345 678");
    }

    #[test]
    fn number_uses_comma_and_trims_zeros() {
        assert_eq!(number(1_234.5, 2), "1 234,5");
        assert_eq!(number(1_234.0, 2), "1 234");
        assert_eq!(number(-98_765.432, 1), "-98 765,4");
        assert_eq!(number(-0.001, 1), "0");
        assert_eq!(number(f64::NAN, 2), "-");
    }

    #[test]
    fn money_and_percent() {
        assert_eq!(fcfa(2_500_000.0), "2 500 000 FCFA");
        assert_eq!(percent(25.0, 200.0), "12,5 %");
        assert_eq!(percent(1.0, 0.0), "-");
    }

    #[test]
    fn quantity_appends_unit() {
        assert_eq!(quantity(1_500.25, Some("tonnes")), "1 500,25 tonnes");
        assert_eq!(quantity(3.0, None), "3");
        assert_eq!(quantity(3.0, Some("")), "3");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Adamaoua", 10), "Adamaoua");
        assert_eq!(truncate("Extrême-Nord", 8), "Extrême…");
        assert_eq!(truncate("abc", 0), "…");
    }
}
