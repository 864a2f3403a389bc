//! Timecode helpers for scene timelines.
//!
//! Scene timestamps are plain `f64` seconds everywhere in Flux. This module
//! converts them to the short human form shown next to thumbnails.

/// Format seconds as `m:ss`, or `h:mm:ss` once the value reaches an hour.
///
/// Fractional seconds are truncated. Negative and non-finite inputs are
/// treated as zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Convert seconds to whole milliseconds, rounding to nearest.
pub fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(2.5), "0:02");
        assert_eq!(format_timestamp(65.9), "1:05");
        assert_eq!(format_timestamp(3599.0), "59:59");
    }

    #[test]
    fn formats_hours() {
        assert_eq!(format_timestamp(3600.0), "1:00:00");
        assert_eq!(format_timestamp(3723.4), "1:02:03");
    }

    #[test]
    fn garbage_input_is_zero() {
        assert_eq!(format_timestamp(-4.0), "0:00");
        assert_eq!(format_timestamp(f64::NAN), "0:00");
    }

    #[test]
    fn ms_conversion_rounds() {
        assert_eq!(secs_to_ms(0.3), 300);
        assert_eq!(secs_to_ms(1.0005), 1001);
        assert_eq!(secs_to_ms(-1.0), 0);
    }
}
