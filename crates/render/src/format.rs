//! Brazilian number and date formatting for printed documents.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use domain::money::round2;

/// Formats with `.` as thousands separator and `,` before two decimals.
pub fn decimal_br(value: Decimal) -> String {
    let value = round2(value);
    let negative = value.is_sign_negative() && !value.is_zero();
    let plain = value.abs().to_string();
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped},{frac_part}")
}

/// `R$ 1.234,56`
pub fn brl(value: Decimal) -> String {
    format!("R$ {}", decimal_br(value))
}

/// `dd/mm/yyyy`
pub fn date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Keeps at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Parses `#rrggbb` into unit RGB components.
pub fn parse_hex_color(value: &str) -> Option<(f32, f32, f32)> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |at: usize| {
        u8::from_str_radix(&hex[at..at + 2], 16)
            .ok()
            .map(|v| f32::from(v) / 255.0)
    };
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_brl_groups_thousands() {
        assert_eq!(brl(dec!(1234.56)), "R$ 1.234,56");
        assert_eq!(brl(dec!(1234567.8)), "R$ 1.234.567,80");
        assert_eq!(brl(dec!(0)), "R$ 0,00");
        assert_eq!(brl(dec!(999.999)), "R$ 1.000,00");
    }

    #[test]
    fn test_brl_negative() {
        assert_eq!(brl(dec!(-3)), "R$ -3,00");
        assert_eq!(brl(dec!(-1500.5)), "R$ -1.500,50");
    }

    #[test]
    fn test_quantity_format() {
        assert_eq!(decimal_br(dec!(2)), "2,00");
        assert_eq!(decimal_br(dec!(0.5)), "0,50");
    }

    #[test]
    fn test_date_br() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(date_br(date), "07/03/2024");
    }

    #[test]
    fn test_truncate_counts_characters() {
        let text = "Ç".repeat(60);
        assert_eq!(truncate_chars(&text, 50).chars().count(), 50);
        assert_eq!(truncate_chars("curto", 50), "curto");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff0000"), Some((1.0, 0.0, 0.0)));
        assert_eq!(parse_hex_color("ff0000"), None);
        assert_eq!(parse_hex_color("#ff00"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }
}
