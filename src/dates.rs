//! Day/month/year input shaping, validation and wire conversion.

use chrono::{DateTime, Local, NaiveDate};

/// Reformat free text into `DD/MM/YYYY` progressively, keeping at most 8 digits.
pub fn mask_date(input: &str) -> String {
    let digits: String = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(8)
        .collect();
    match digits.len() {
        0..=2 => digits,
        3..=4 => format!("{}/{}", &digits[..2], &digits[2..]),
        _ => format!("{}/{}/{}", &digits[..2], &digits[2..4], &digits[4..]),
    }
}

/// Check the `DD/MM/YYYY` shape and calendar bounds.
///
/// Month length is not checked: `31/04/2024` passes.
pub fn is_valid_date(text: &str) -> bool {
    parse_parts(text).is_some_and(|(day, month, year)| {
        (1..=12).contains(&month) && (1..=31).contains(&day) && (2000..=2100).contains(&year)
    })
}

fn parse_parts(text: &str) -> Option<(u32, u32, u32)> {
    let b = text.as_bytes();
    if b.len() != 10 || b[2] != b'/' || b[5] != b'/' {
        return None;
    }
    let field = |r: std::ops::Range<usize>| -> Option<u32> {
        let s = text.get(r)?;
        if !s.bytes().all(|c| c.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    };
    Some((field(0..2)?, field(3..5)?, field(6..10)?))
}

/// Convert `DD/MM/YYYY` to `YYYY-MM-DD` for the backend.
///
/// Text already containing `-` is passed through; anything without exactly 8 digits too.
pub fn to_iso(date: &str) -> String {
    if date.contains('-') {
        return date.to_string();
    }
    let digits: String = date.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 8 {
        return date.to_string();
    }
    format!("{}-{}-{}", &digits[4..8], &digits[2..4], &digits[..2])
}

/// Today's local date as `DD/MM/YYYY`.
pub fn today() -> String {
    Local::now().format("%d/%m/%Y").to_string()
}

/// Render a backend timestamp or date (`2024-06-15T10:00:00Z`, `2024-06-15`) as `DD/MM/YYYY`.
pub fn from_backend(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).format("%d/%m/%Y").to_string());
    }
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%d/%m/%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_inserts_separators_progressively() {
        assert_eq!(mask_date(""), "");
        assert_eq!(mask_date("0"), "0");
        assert_eq!(mask_date("01"), "01");
        assert_eq!(mask_date("010"), "01/0");
        assert_eq!(mask_date("0102"), "01/02");
        assert_eq!(mask_date("01022"), "01/02/2");
        assert_eq!(mask_date("01022024"), "01/02/2024");
    }

    #[test]
    fn mask_strips_non_digits_and_truncates() {
        assert_eq!(mask_date("01/02/2024"), "01/02/2024");
        assert_eq!(mask_date("01-02-2024-99"), "01/02/2024");
        assert_eq!(mask_date("ab12cd"), "12");
    }

    #[test]
    fn validity_bounds() {
        assert!(is_valid_date("15/06/2024"));
        assert!(is_valid_date("01/01/2000"));
        assert!(is_valid_date("31/12/2100"));
        assert!(!is_valid_date("31/13/2024"));
        assert!(!is_valid_date("00/06/2024"));
        assert!(!is_valid_date("32/06/2024"));
        assert!(!is_valid_date("15/00/2024"));
        assert!(!is_valid_date("15/06/1999"));
        assert!(!is_valid_date("15/06/2101"));
    }

    #[test]
    fn month_length_is_not_enforced() {
        assert!(is_valid_date("31/04/2024"));
        assert!(is_valid_date("30/02/2023"));
    }

    #[test]
    fn validity_requires_exact_shape() {
        assert!(!is_valid_date(""));
        assert!(!is_valid_date("15/6/2024"));
        assert!(!is_valid_date("15-06-2024"));
        assert!(!is_valid_date("15/06/24"));
        assert!(!is_valid_date("aa/06/2024"));
    }

    #[test]
    fn iso_conversion() {
        assert_eq!(to_iso("15/06/2024"), "2024-06-15");
        assert_eq!(to_iso("2024-06-15"), "2024-06-15");
        assert_eq!(to_iso("15/06"), "15/06");
    }

    #[test]
    fn backend_dates_are_rendered_day_first() {
        assert_eq!(from_backend("2024-06-15").as_deref(), Some("15/06/2024"));
        assert_eq!(
            from_backend("2024-06-15 08:30:00").as_deref(),
            Some("15/06/2024")
        );
        assert_eq!(from_backend("garbage"), None);
    }
}
