use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Candle width of the data feeding the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    M1,
    #[default]
    M5,
    M15,
    H1,
    H6,
    D1,
}

impl Interval {
    pub const ALL: [Interval; 6] = [
        Interval::M1,
        Interval::M5,
        Interval::M15,
        Interval::H1,
        Interval::H6,
        Interval::D1,
    ];

    #[must_use]
    pub const fn duration_ms(self) -> f64 {
        match self {
            Interval::M1 => 60_000.0,
            Interval::M5 => 300_000.0,
            Interval::M15 => 900_000.0,
            Interval::H1 => 3_600_000.0,
            Interval::H6 => 21_600_000.0,
            Interval::D1 => 86_400_000.0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::H1 => "1h",
            Interval::H6 => "6h",
            Interval::D1 => "1d",
        }
    }

    /// `chrono` format used for crosshair tooltips on the time axis.
    #[must_use]
    pub const fn tooltip_format(self) -> &'static str {
        match self {
            Interval::M1 | Interval::M5 | Interval::M15 | Interval::H1 | Interval::H6 => {
                "%a %d %b %y %H:%M"
            }
            Interval::D1 => "%a %d %b %Y",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ChartError;

    /// Accepts `1m`-style units and the `I1M`-style identifiers used by data
    /// feeds, case-insensitively.
    fn from_str(raw: &str) -> ChartResult<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        let unit = normalized.strip_prefix('i').unwrap_or(&normalized);
        Interval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == unit)
            .ok_or_else(|| ChartError::InvalidInterval(raw.to_owned()))
    }
}

impl TryFrom<String> for Interval {
    type Error = ChartError;

    fn try_from(value: String) -> ChartResult<Self> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::Interval;
    use crate::error::ChartError;

    #[test]
    fn parses_units_and_feed_identifiers() {
        assert_eq!("1h".parse::<Interval>().expect("1h"), Interval::H1);
        assert_eq!("I15M".parse::<Interval>().expect("I15M"), Interval::M15);
        assert_eq!(" 1D ".parse::<Interval>().expect("1d"), Interval::D1);
    }

    #[test]
    fn unknown_unit_is_a_configuration_error() {
        let err = "3w".parse::<Interval>().expect_err("unknown unit");
        assert!(matches!(err, ChartError::InvalidInterval(raw) if raw == "3w"));
    }
}
