use chrono::{DateTime, Duration, Utc};

/// Format a coordinate pair the way the upstream expects it in paths and
/// query strings. Also used as the points cache key.
pub fn format_coordinates(lat: f64, lng: f64) -> String {
    format!("{:.4},{:.4}", lat, lng)
}

/// Parse an ISO 8601 duration such as `P18DT3H4M60S` or `PT1H`.
pub fn parse_iso8601_duration(duration: &str) -> Result<Duration, String> {
    let invalid = || format!("duration invalid: {}", duration);

    let rest = duration.strip_prefix('P').ok_or_else(invalid)?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };
    if date_part.is_empty() && time_part.map_or(true, str::is_empty) {
        return Err(invalid());
    }

    let mut seconds = sum_components(date_part, &[('D', 86_400)]).ok_or_else(invalid)?;
    if let Some(time) = time_part {
        if time.is_empty() {
            return Err(invalid());
        }
        let time_seconds =
            sum_components(time, &[('H', 3_600), ('M', 60), ('S', 1)]).ok_or_else(invalid)?;
        seconds = seconds.checked_add(time_seconds).ok_or_else(invalid)?;
    }

    Duration::try_seconds(seconds).ok_or_else(invalid)
}

// Units must appear in the order given and at most once each.
fn sum_components(part: &str, units: &[(char, i64)]) -> Option<i64> {
    let mut total: i64 = 0;
    let mut digits = String::new();
    let mut next_unit = 0;

    for c in part.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let offset = units[next_unit..].iter().position(|(unit, _)| *unit == c)?;
        let (_, factor) = units[next_unit + offset];
        let value: i64 = digits.parse().ok()?;
        total = value
            .checked_mul(factor)
            .and_then(|seconds| total.checked_add(seconds))?;
        digits.clear();
        next_unit += offset + 1;
    }

    if digits.is_empty() {
        Some(total)
    } else {
        None
    }
}

/// Whether `now` falls within an ISO 8601 interval written as
/// `2022-08-07T02:00:00+00:00/PT1H`. Both ends are inclusive.
pub fn is_current_interval(interval: &str, now: DateTime<Utc>) -> Result<bool, String> {
    let (start, duration) = interval
        .split_once('/')
        .ok_or_else(|| format!("time invalid: {}", interval))?;

    let start = DateTime::parse_from_rfc3339(start)
        .map_err(|e| format!("time invalid: {}", e))?
        .with_timezone(&Utc);
    let end = start
        .checked_add_signed(parse_iso8601_duration(duration)?)
        .ok_or_else(|| format!("duration invalid: {}", duration))?;

    Ok(start <= now && now <= end)
}

/// Split alert text into paragraphs on blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_coordinates() {
        assert_eq!(format_coordinates(41.115, -83.177), "41.1150,-83.1770");
        assert_eq!(format_coordinates(40.0, -74.00004), "40.0000,-74.0000");
    }

    #[test]
    fn test_parse_full_duration() {
        let d = parse_iso8601_duration("P18DT3H4M60S").unwrap();
        assert_eq!(d.num_seconds(), 18 * 86_400 + 3 * 3_600 + 4 * 60 + 60);
    }

    #[test]
    fn test_parse_partial_durations() {
        assert_eq!(parse_iso8601_duration("PT1H").unwrap(), Duration::hours(1));
        assert_eq!(parse_iso8601_duration("P2D").unwrap(), Duration::days(2));
        assert_eq!(parse_iso8601_duration("PT45M").unwrap(), Duration::minutes(45));
        assert_eq!(
            parse_iso8601_duration("P1DT12H").unwrap(),
            Duration::hours(36)
        );
    }

    #[test]
    fn test_parse_invalid_durations() {
        assert!(parse_iso8601_duration("").is_err());
        assert!(parse_iso8601_duration("1H").is_err());
        assert!(parse_iso8601_duration("P").is_err());
        assert!(parse_iso8601_duration("PT").is_err());
        assert!(parse_iso8601_duration("PT5").is_err());
        assert!(parse_iso8601_duration("PT3M2H").is_err());
        assert!(parse_iso8601_duration("PTH").is_err());
    }

    #[test]
    fn test_huge_durations_are_errors() {
        assert!(parse_iso8601_duration("PT9223372036854775807S").is_err());
        assert!(parse_iso8601_duration("P999999999999999D").is_err());
        assert!(parse_iso8601_duration("P99999999999999999999D").is_err());
        assert!(parse_iso8601_duration("P100000000000DT9223372036854775807S").is_err());
    }

    #[test]
    fn test_is_current_interval_with_overflowing_end() {
        let now = Utc::now();
        assert!(is_current_interval("2022-08-07T02:00:00+00:00/P99999999999D", now).is_err());
    }

    #[test]
    fn test_is_current_interval() {
        let interval = "2022-08-07T02:00:00+00:00/PT1H";

        let inside = Utc.with_ymd_and_hms(2022, 8, 7, 2, 30, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2022, 8, 7, 2, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 8, 7, 3, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2022, 8, 7, 3, 0, 1).unwrap();

        assert!(is_current_interval(interval, inside).unwrap());
        assert!(is_current_interval(interval, start).unwrap());
        assert!(is_current_interval(interval, end).unwrap());
        assert!(!is_current_interval(interval, after).unwrap());
    }

    #[test]
    fn test_is_current_interval_rejects_malformed() {
        let now = Utc::now();
        assert!(is_current_interval("2022-08-07T02:00:00+00:00", now).is_err());
        assert!(is_current_interval("yesterday/PT1H", now).is_err());
        assert!(is_current_interval("2022-08-07T02:00:00+00:00/1H", now).is_err());
    }

    #[test]
    fn test_split_paragraphs() {
        assert_eq!(
            split_paragraphs("River rising.\n\nExpect flooding."),
            vec!["River rising.", "Expect flooding."]
        );
        assert!(split_paragraphs("").is_empty());
    }
}
