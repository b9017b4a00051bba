//! Timestamp primitives.
//!
//! Slider and catalog times are milliseconds since the Unix epoch (UTC). Text
//! forms are `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.

const MS_PER_SECOND: i64 = 1_000;
const SECONDS_PER_DAY: i64 = 86_400;

/// Calendar date and wall-clock time, UTC.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CivilTime {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CivilTime {
    pub fn from_epoch_ms(ms: f64) -> Self {
        let secs = (ms / MS_PER_SECOND as f64).floor() as i64;
        let days = secs.div_euclid(SECONDS_PER_DAY);
        let rem = secs.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        CivilTime {
            year,
            month,
            day,
            hour: (rem / 3600) as u32,
            minute: ((rem % 3600) / 60) as u32,
            second: (rem % 60) as u32,
        }
    }

    pub fn to_epoch_ms(&self) -> f64 {
        let days = days_from_civil(self.year, self.month, self.day);
        let secs = days * SECONDS_PER_DAY
            + self.hour as i64 * 3600
            + self.minute as i64 * 60
            + self.second as i64;
        (secs * MS_PER_SECOND) as f64
    }

    pub fn is_midnight(&self) -> bool {
        self.hour == 0 && self.minute == 0 && self.second == 0
    }
}

/// Formats `ms` as `YYYY-MM-DD HH:MM:SS`.
///
/// With `truncate_midnight`, the time part is dropped when it is exactly
/// `00:00:00`.
pub fn format_timestamp_ms(ms: f64, truncate_midnight: bool) -> String {
    let t = CivilTime::from_epoch_ms(ms);
    let date = format!("{:04}-{:02}-{:02}", t.year, t.month, t.day);
    if truncate_midnight && t.is_midnight() {
        return date;
    }
    format!("{date} {:02}:{:02}:{:02}", t.hour, t.minute, t.second)
}

/// Parses `YYYY-MM-DD[ HH:MM[:SS]]` (separators `-`, `:` or space).
///
/// Returns `None` for malformed or out-of-range fields.
pub fn parse_timestamp_ms(text: &str) -> Option<f64> {
    let fields: Vec<&str> = text
        .trim()
        .split(['-', ':', ' '])
        .filter(|s| !s.is_empty())
        .collect();
    if fields.len() < 3 || fields.len() > 6 {
        return None;
    }
    let mut nums = [0i64; 6];
    for (slot, field) in nums.iter_mut().zip(&fields) {
        *slot = field.parse().ok()?;
    }
    let [year, month, day, hour, minute, second] = nums;
    if !(1..=12).contains(&month)
        || !(1..=31).contains(&day)
        || !(0..24).contains(&hour)
        || !(0..60).contains(&minute)
        || !(0..60).contains(&second)
    {
        return None;
    }
    let t = CivilTime {
        year,
        month: month as u32,
        day: day as u32,
        hour: hour as u32,
        minute: minute as u32,
        second: second as u32,
    };
    Some(t.to_epoch_ms())
}

// Proleptic Gregorian conversions (Hinnant's algorithms).
fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = m as i64;
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + d as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp_ms, parse_timestamp_ms};

    #[test]
    fn formats_catalog_time_domain() {
        // 2003-08-01 and 2003-09-01 UTC, the default time slider domain.
        assert_eq!(format_timestamp_ms(1_059_696_000_000.0, true), "2003-08-01");
        assert_eq!(format_timestamp_ms(1_062_374_400_000.0, true), "2003-09-01");
        assert_eq!(
            format_timestamp_ms(1_059_696_000_000.0, false),
            "2003-08-01 00:00:00"
        );
    }

    #[test]
    fn keeps_time_part_off_midnight() {
        let ms = 1_059_696_000_000.0 + 3_723_000.0;
        assert_eq!(format_timestamp_ms(ms, true), "2003-08-01 01:02:03");
    }

    #[test]
    fn parse_inverts_format() {
        let ms = 1_059_696_000_000.0 + 3_723_000.0;
        assert_eq!(parse_timestamp_ms("2003-08-01 01:02:03"), Some(ms));
        assert_eq!(parse_timestamp_ms("2003-08-01"), Some(1_059_696_000_000.0));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_timestamp_ms("yesterday"), None);
        assert_eq!(parse_timestamp_ms("2003-13-01"), None);
        assert_eq!(parse_timestamp_ms("2003-08"), None);
    }

    #[test]
    fn pre_epoch_dates() {
        assert_eq!(format_timestamp_ms(-86_400_000.0, true), "1969-12-31");
    }
}
