use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref ISO_DURATION: Regex =
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("duration pattern is valid");
}

/// Parse an ISO-8601 video duration (`PT1H2M3S`) into seconds.
/// Missing components count as zero; anything malformed yields 0.
pub fn parse_iso8601_duration(duration: &str) -> u64 {
    let Some(captures) = ISO_DURATION.captures(duration.trim()) else {
        return 0;
    };

    let component = |index: usize| {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    component(1)
        .saturating_mul(3600)
        .saturating_add(component(2).saturating_mul(60))
        .saturating_add(component(3))
}

/// Coarse video length classes used for filtering and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationCategory {
    Short1,
    Short2,
    Mid1,
    Mid2,
    Long1,
    Long2,
    Long3,
    Long4,
    Long5,
    Long6,
}

/// Upper bounds (exclusive, seconds) of every class but the last.
const BUCKETS: [(u64, DurationCategory); 9] = [
    (60, DurationCategory::Short1),
    (120, DurationCategory::Short2),
    (600, DurationCategory::Mid1),
    (1200, DurationCategory::Mid2),
    (1800, DurationCategory::Long1),
    (2400, DurationCategory::Long2),
    (3000, DurationCategory::Long3),
    (3600, DurationCategory::Long4),
    (5400, DurationCategory::Long5),
];

impl DurationCategory {
    pub fn from_seconds(seconds: u64) -> Self {
        BUCKETS
            .iter()
            .find(|(upper, _)| seconds < *upper)
            .map(|(_, category)| *category)
            .unwrap_or(DurationCategory::Long6)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationCategory::Short1 => "short1",
            DurationCategory::Short2 => "short2",
            DurationCategory::Mid1 => "mid1",
            DurationCategory::Mid2 => "mid2",
            DurationCategory::Long1 => "long1",
            DurationCategory::Long2 => "long2",
            DurationCategory::Long3 => "long3",
            DurationCategory::Long4 => "long4",
            DurationCategory::Long5 => "long5",
            DurationCategory::Long6 => "long6",
        }
    }

    /// Human readable label for spreadsheets.
    pub fn label(&self) -> &'static str {
        match self {
            DurationCategory::Short1 => "Short Form1 (under 1 min)",
            DurationCategory::Short2 => "Short Form2 (1-2 min)",
            DurationCategory::Mid1 => "Mid Form1 (2-10 min)",
            DurationCategory::Mid2 => "Mid Form2 (10-20 min)",
            DurationCategory::Long1 => "Long Form1 (20-30 min)",
            DurationCategory::Long2 => "Long Form2 (30-40 min)",
            DurationCategory::Long3 => "Long Form3 (40-50 min)",
            DurationCategory::Long4 => "Long Form4 (50-60 min)",
            DurationCategory::Long5 => "Long Form5 (60-90 min)",
            DurationCategory::Long6 => "Long Form6 (90 min and over)",
        }
    }
}

impl fmt::Display for DurationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short1" => Ok(DurationCategory::Short1),
            "short2" => Ok(DurationCategory::Short2),
            "mid1" => Ok(DurationCategory::Mid1),
            "mid2" => Ok(DurationCategory::Mid2),
            "long1" => Ok(DurationCategory::Long1),
            "long2" => Ok(DurationCategory::Long2),
            "long3" => Ok(DurationCategory::Long3),
            "long4" => Ok(DurationCategory::Long4),
            "long5" => Ok(DurationCategory::Long5),
            "long6" => Ok(DurationCategory::Long6),
            other => Err(format!("unknown video length category: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_fixtures() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), 3723);
        assert_eq!(parse_iso8601_duration("PT45S"), 45);
        assert_eq!(parse_iso8601_duration("PT10M"), 600);
        assert_eq!(parse_iso8601_duration("PT2H"), 7200);
        assert_eq!(parse_iso8601_duration("PT0S"), 0);
    }

    #[test]
    fn test_parse_duration_malformed_is_zero() {
        assert_eq!(parse_iso8601_duration(""), 0);
        assert_eq!(parse_iso8601_duration("garbage"), 0);
        assert_eq!(parse_iso8601_duration("1H2M"), 0);
        assert_eq!(parse_iso8601_duration("PT1.5M"), 0);
    }

    #[test]
    fn test_parse_duration_saturates_on_huge_values() {
        let max = u64::MAX.to_string();
        let seconds = parse_iso8601_duration(&format!("PT{}H{}M{}S", max, max, max));
        assert_eq!(seconds, u64::MAX);
        assert_eq!(DurationCategory::from_seconds(seconds), DurationCategory::Long6);
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(DurationCategory::from_seconds(0), DurationCategory::Short1);
        assert_eq!(DurationCategory::from_seconds(59), DurationCategory::Short1);
        assert_eq!(DurationCategory::from_seconds(60), DurationCategory::Short2);
        assert_eq!(DurationCategory::from_seconds(119), DurationCategory::Short2);
        assert_eq!(DurationCategory::from_seconds(120), DurationCategory::Mid1);
        assert_eq!(DurationCategory::from_seconds(1799), DurationCategory::Long1);
        assert_eq!(DurationCategory::from_seconds(1800), DurationCategory::Long2);
        assert_eq!(DurationCategory::from_seconds(5399), DurationCategory::Long5);
        assert_eq!(DurationCategory::from_seconds(5400), DurationCategory::Long6);
    }

    #[test]
    fn test_tags_round_trip_through_strings() {
        assert_eq!("long3".parse::<DurationCategory>(), Ok(DurationCategory::Long3));
        assert_eq!(" Short2 ".parse::<DurationCategory>(), Ok(DurationCategory::Short2));
        assert!("medium".parse::<DurationCategory>().is_err());
        assert_eq!(
            serde_json::to_string(&DurationCategory::Mid2).unwrap(),
            "\"mid2\""
        );
    }
}
