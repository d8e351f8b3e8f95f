// Utility modules

use crate::{
    constants::{RATE_LIMIT_REQUESTS_PER_HOUR, RATE_LIMIT_REQUESTS_PER_MINUTE},
    error::{AppError, Result},
};

/// Basic guard for list/query limits to avoid expensive queries.
pub fn ensure_page_limit(limit: i32, configured_max: u32) -> Result<()> {
    let hard_cap = RATE_LIMIT_REQUESTS_PER_MINUTE.min(RATE_LIMIT_REQUESTS_PER_HOUR);
    let max = configured_max.min(hard_cap).max(1);

    if limit as u32 > max {
        return Err(AppError::RateLimitExceeded);
    }

    Ok(())
}

/// Parses duration strings of the form `<number><unit>` where unit is one of
/// s/m/h/d ("15m", "7d"). Anything else yields the default.
pub fn parse_duration_secs(value: Option<&str>, default_secs: u64) -> u64 {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return default_secs;
    };

    let Some(unit) = raw.chars().last() else {
        return default_secs;
    };
    let digits = &raw[..raw.len() - unit.len_utf8()];
    let Ok(num) = digits.parse::<u64>() else {
        return default_secs;
    };

    match unit {
        's' => num,
        'm' => num.saturating_mul(60),
        'h' => num.saturating_mul(60 * 60),
        'd' => num.saturating_mul(24 * 60 * 60),
        _ => default_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_page_limit_rejects_oversized_limits() {
        assert!(ensure_page_limit(61, 300).is_err());
        assert!(ensure_page_limit(10, 300).is_ok());
    }

    #[test]
    fn parse_duration_secs_handles_all_units() {
        assert_eq!(parse_duration_secs(Some("45s"), 900), 45);
        assert_eq!(parse_duration_secs(Some("15m"), 900), 900);
        assert_eq!(parse_duration_secs(Some("2h"), 900), 7200);
        assert_eq!(parse_duration_secs(Some("7d"), 900), 604800);
    }

    #[test]
    fn parse_duration_secs_falls_back_on_malformed_input() {
        assert_eq!(parse_duration_secs(None, 900), 900);
        assert_eq!(parse_duration_secs(Some(""), 900), 900);
        assert_eq!(parse_duration_secs(Some("15"), 900), 900);
        assert_eq!(parse_duration_secs(Some("m15"), 900), 900);
        assert_eq!(parse_duration_secs(Some("15w"), 900), 900);
        assert_eq!(parse_duration_secs(Some("d"), 900), 900);
    }
}
