//! 14-digit UTC timestamps (`YYYYMMDDhhmmss`).

use time::UtcDateTime;

/// Format `at` as 14 digits.
#[must_use]
pub fn timestamp14(at: UtcDateTime) -> String {
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

/// The current time as 14 digits.
#[must_use]
pub fn now14() -> String {
    timestamp14(UtcDateTime::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month, Time};

    #[test]
    fn formats_fourteen_digits() {
        let date = Date::from_calendar_date(2024, Month::March, 7).unwrap();
        let at = UtcDateTime::new(date, Time::from_hms(9, 5, 3).unwrap());
        assert_eq!(timestamp14(at), "20240307090503");
    }

    #[test]
    fn now_is_fourteen_digits() {
        let now = now14();
        assert_eq!(now.len(), 14);
        assert!(now.chars().all(|c| c.is_ascii_digit()));
    }
}
