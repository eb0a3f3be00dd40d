//! `MM:SS` conversions for intro/credits times.

/// Format seconds as zero-padded `MM:SS`. Minutes are not wrapped into hours.
pub fn format_mmss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Parse `M:SS`/`MM:SS` (any number of minute digits) into seconds.
///
/// Returns `None` for malformed input or a seconds field of 60 or more.
pub fn parse_mmss(text: &str) -> Option<u32> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    if minutes.is_empty()
        || seconds.len() != 2
        || !minutes.bytes().all(|b| b.is_ascii_digit())
        || !seconds.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    minutes.checked_mul(60)?.checked_add(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_padding() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(90), "01:30");
        assert_eq!(format_mmss(3725), "62:05");
    }

    #[test]
    fn parses_valid_times() {
        assert_eq!(parse_mmss("00:30"), Some(30));
        assert_eq!(parse_mmss("1:30"), Some(90));
        assert_eq!(parse_mmss("120:00"), Some(7200));
    }

    #[test]
    fn rejects_malformed_times() {
        assert_eq!(parse_mmss(""), None);
        assert_eq!(parse_mmss("90"), None);
        assert_eq!(parse_mmss("01:60"), None);
        assert_eq!(parse_mmss("01:5"), None);
        assert_eq!(parse_mmss(":30"), None);
        assert_eq!(parse_mmss("-1:30"), None);
        assert_eq!(parse_mmss("aa:bb"), None);
    }

    #[test]
    fn round_trips() {
        for secs in [0, 59, 60, 61, 599, 3599] {
            assert_eq!(parse_mmss(&format_mmss(secs)), Some(secs));
        }
    }
}
