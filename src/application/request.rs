//! Request arguments passed in by the embedding page.

use tracing::debug;

/// Period id from the `periodo` argument. Missing or malformed values mean 0.
///
/// Ids are non-negative, so `-1` counts as malformed and also yields 0.
pub fn parse_period(raw: Option<&str>) -> u32 {
    match raw.map(str::trim).map(str::parse::<u32>) {
        Some(Ok(period)) => period,
        Some(Err(e)) => {
            debug!("ignoring malformed period: {}", e);
            0
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("3"), 3)]
    #[case(Some(" 12 "), 12)]
    #[case(Some("abc"), 0)]
    #[case(Some("-1"), 0)]
    #[case(Some(""), 0)]
    #[case(None, 0)]
    fn given_raw_period_when_parsing_then_falls_back_to_zero(
        #[case] raw: Option<&str>,
        #[case] expected: u32,
    ) {
        assert_eq!(parse_period(raw), expected);
    }
}
