//! Log file name templating.
//!
//! A template holds `%`-prefixed single letter tokens:
//!
//! | token | value                               |
//! |-------|-------------------------------------|
//! | `%d`  | day of month, `01`–`31`             |
//! | `%m`  | month, `01`–`12`                    |
//! | `%y`  | four digit year                     |
//! | `%h`  | hour, `00`–`23`                     |
//! | `%i`  | minute, `00`–`59`                   |
//! | `%s`  | second, `00`–`59`                   |
//! | `%v`  | rotation key, depends on [`Mode`]   |
//!
//! Rotation falls out of re-resolving the template: whenever the resolved name
//! changes, the writer switches files.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use crate::types::Mode;

/// Template used when none is configured.
pub const DEFAULT_FILE_FORMAT: &str = "log-%v.log";

/// Returns the rotation key for `mode` at `now`.
#[must_use]
pub fn rotation_key(mode: Mode, now: &DateTime<FixedOffset>) -> String {
    match mode {
        Mode::Daily => format!("{:04}{:02}{:02}", now.year(), now.month(), now.day()),
        Mode::Monthly => format!("{:04}{:02}", now.year(), now.month()),
        Mode::Yearly => format!("{:04}", now.year()),
        Mode::Permanent => String::new(),
    }
}

/// Resolves `template` into a concrete file name for `now`.
///
/// Unknown tokens and a trailing `%` are copied through unchanged.
#[must_use]
pub fn resolve_file_name(template: &str, mode: Mode, now: &DateTime<FixedOffset>) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let value = match chars.peek() {
            Some('d') => format!("{:02}", now.day()),
            Some('m') => format!("{:02}", now.month()),
            Some('y') => format!("{:04}", now.year()),
            Some('h') => format!("{:02}", now.hour()),
            Some('i') => format!("{:02}", now.minute()),
            Some('s') => format!("{:02}", now.second()),
            Some('v') => rotation_key(mode, now),
            _ => {
                out.push('%');
                continue;
            }
        };
        chars.next();
        out.push_str(&value);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use test_case::test_case;

    fn at(y: i32, m: u32, d: u32, h: u32, i: u32, s: u32) -> DateTime<FixedOffset> {
        crate::clock::utc_offset()
            .with_ymd_and_hms(y, m, d, h, i, s)
            .single()
            .unwrap_or_else(|| unreachable!())
    }

    #[test_case(Mode::Daily, "log-20240305.log" ; "daily")]
    #[test_case(Mode::Monthly, "log-202403.log" ; "monthly")]
    #[test_case(Mode::Yearly, "log-2024.log" ; "yearly")]
    #[test_case(Mode::Permanent, "log-.log" ; "permanent")]
    fn default_template_by_mode(mode: Mode, expected: &str) {
        let now = at(2024, 3, 5, 7, 8, 9);
        assert_eq!(resolve_file_name(DEFAULT_FILE_FORMAT, mode, &now), expected);
    }

    #[test]
    fn all_tokens_are_zero_padded() {
        let now = at(2024, 3, 5, 7, 8, 9);
        assert_eq!(
            resolve_file_name("%y-%m-%d_%h%i%s.log", Mode::Permanent, &now),
            "2024-03-05_070809.log"
        );
    }

    #[test]
    fn unknown_tokens_are_kept() {
        let now = at(2024, 3, 5, 7, 8, 9);
        assert_eq!(resolve_file_name("app-%q-%v%", Mode::Yearly, &now), "app-%q-2024%");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let now = at(2024, 3, 5, 7, 8, 9);
        assert_eq!(resolve_file_name("%%d", Mode::Daily, &now), "%05");
    }

    #[test]
    fn daily_differs_across_days() {
        let late = at(2024, 3, 5, 23, 59, 59);
        let early = at(2024, 3, 6, 0, 0, 0);
        assert_ne!(
            resolve_file_name(DEFAULT_FILE_FORMAT, Mode::Daily, &late),
            resolve_file_name(DEFAULT_FILE_FORMAT, Mode::Daily, &early)
        );
    }

    #[test]
    fn rotation_key_respects_offset() {
        let utc = at(2024, 3, 5, 20, 0, 0);
        let jakarta = utc.with_timezone(&FixedOffset::east_opt(7 * 3600).unwrap_or_else(crate::clock::utc_offset));
        assert_eq!(rotation_key(Mode::Daily, &utc), "20240305");
        assert_eq!(rotation_key(Mode::Daily, &jakarta), "20240306");
    }

    proptest! {
        #[test]
        fn prop_daily_same_day_same_name(
            day in 1u32..=28,
            h1 in 0u32..24, m1 in 0u32..60, s1 in 0u32..60,
            h2 in 0u32..24, m2 in 0u32..60, s2 in 0u32..60,
        ) {
            let a = at(2023, 6, day, h1, m1, s1);
            let b = at(2023, 6, day, h2, m2, s2);
            prop_assert_eq!(
                resolve_file_name(DEFAULT_FILE_FORMAT, Mode::Daily, &a),
                resolve_file_name(DEFAULT_FILE_FORMAT, Mode::Daily, &b)
            );
        }

        #[test]
        fn prop_daily_different_days_differ(d1 in 1u32..=28, d2 in 1u32..=28) {
            prop_assume!(d1 != d2);
            let a = at(2023, 6, d1, 12, 0, 0);
            let b = at(2023, 6, d2, 12, 0, 0);
            prop_assert_ne!(
                resolve_file_name(DEFAULT_FILE_FORMAT, Mode::Daily, &a),
                resolve_file_name(DEFAULT_FILE_FORMAT, Mode::Daily, &b)
            );
        }

        #[test]
        fn prop_permanent_is_constant(
            y in 1970i32..2100, mo in 1u32..=12, d in 1u32..=28,
            h in 0u32..24, mi in 0u32..60, s in 0u32..60,
        ) {
            let now = at(y, mo, d, h, mi, s);
            prop_assert_eq!(
                resolve_file_name(DEFAULT_FILE_FORMAT, Mode::Permanent, &now),
                "log-.log"
            );
        }
    }
}
