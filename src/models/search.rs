use crate::search::duration::DurationCategory;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Result counts the UI offers. Anything else falls back to the default.
pub const ALLOWED_RESULT_COUNTS: [usize; 9] = [10, 20, 30, 40, 50, 60, 100, 150, 200];
pub const DEFAULT_RESULT_COUNT: usize = 60;
pub const DEFAULT_MIN_VIEWS: u64 = 100_000;
pub const WORLDWIDE: &str = "worldwide";

/// Raw `/api/search` query string. Everything arrives as text and is
/// validated by [`SearchRequest::from_params`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub country: Option<String>,
    pub keyword: Option<String>,
    pub max_views: Option<String>,
    pub min_views: Option<String>,
    pub upload_period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub video_length: Option<String>,
    pub max_results: Option<String>,
}

/// Relative upload window selectable from the UI dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPeriod {
    Day,
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Years(u32),
}

impl UploadPeriod {
    pub fn lookback(&self) -> Duration {
        match self {
            UploadPeriod::Day => Duration::days(1),
            UploadPeriod::Week => Duration::days(7),
            UploadPeriod::Month => Duration::days(30),
            UploadPeriod::ThreeMonths => Duration::days(90),
            UploadPeriod::SixMonths => Duration::days(180),
            UploadPeriod::Years(n) => Duration::days(365 * i64::from(*n)),
        }
    }
}

impl FromStr for UploadPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1day" => Ok(UploadPeriod::Day),
            "1week" => Ok(UploadPeriod::Week),
            "1month" => Ok(UploadPeriod::Month),
            "3months" => Ok(UploadPeriod::ThreeMonths),
            "6months" => Ok(UploadPeriod::SixMonths),
            "1year" => Ok(UploadPeriod::Years(1)),
            other => other
                .strip_suffix("years")
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| (2..=10).contains(n))
                .map(UploadPeriod::Years)
                .ok_or_else(|| format!("unknown upload period: {}", other)),
        }
    }
}

/// Validated, immutable search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub country: String,
    pub keyword: Option<String>,
    pub min_views: Option<u64>,
    pub max_views: Option<u64>,
    pub upload_period: Option<UploadPeriod>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// `None` when no length filter was sent. A filter whose tags were all
    /// unrecognised is `Some(vec![])` and matches nothing.
    pub video_lengths: Option<Vec<DurationCategory>>,
    pub max_results: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            country: WORLDWIDE.to_string(),
            keyword: None,
            min_views: Some(DEFAULT_MIN_VIEWS),
            max_views: None,
            upload_period: None,
            start_date: None,
            end_date: None,
            video_lengths: None,
            max_results: DEFAULT_RESULT_COUNT,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: Option<&str>) -> Option<NaiveDate> {
    let value = non_empty(value)?;
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::error!("❌ Ignoring invalid {} '{}': {}", field, value, e);
            None
        }
    }
}

impl SearchRequest {
    pub fn from_params(params: &SearchParams) -> Self {
        let country = non_empty(params.country.as_deref())
            .map(|c| c.to_lowercase())
            .unwrap_or_else(|| WORLDWIDE.to_string());

        let keyword = non_empty(params.keyword.as_deref()).map(str::to_string);

        // An absent minViews means the default floor; an empty one disables it.
        let min_views = match params.min_views.as_deref() {
            None => Some(DEFAULT_MIN_VIEWS),
            Some(raw) => raw.trim().parse::<u64>().ok(),
        };
        let max_views = non_empty(params.max_views.as_deref()).and_then(|v| v.parse::<u64>().ok());

        let upload_period = non_empty(params.upload_period.as_deref()).and_then(|p| {
            p.parse::<UploadPeriod>()
                .map_err(|e| tracing::warn!("{}", e))
                .ok()
        });

        let tags: Vec<&str> = params
            .video_length
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect();
        let video_lengths = (!tags.is_empty()).then(|| {
            tags.iter()
                .filter_map(|tag| {
                    tag.parse::<DurationCategory>()
                        .map_err(|e| tracing::warn!("{}", e))
                        .ok()
                })
                .collect::<Vec<_>>()
        });

        let requested = non_empty(params.max_results.as_deref()).and_then(|v| v.parse::<usize>().ok());
        let max_results = requested
            .filter(|n| ALLOWED_RESULT_COUNTS.contains(n))
            .unwrap_or(DEFAULT_RESULT_COUNT);

        Self {
            country,
            keyword,
            min_views,
            max_views,
            upload_period,
            start_date: parse_date("startDate", params.start_date.as_deref()),
            end_date: parse_date("endDate", params.end_date.as_deref()),
            video_lengths,
            max_results,
        }
    }

    pub fn is_worldwide(&self) -> bool {
        self.country == WORLDWIDE
    }

    pub fn accepts_view_count(&self, views: u64) -> bool {
        self.min_views.map_or(true, |min| views >= min) && self.max_views.map_or(true, |max| views <= max)
    }

    pub fn accepts_duration(&self, category: DurationCategory) -> bool {
        self.video_lengths
            .as_ref()
            .map_or(true, |filter| filter.contains(&category))
    }

    /// `(publishedAfter, publishedBefore)`. The relative period is applied
    /// first and each explicit date then replaces its own bound.
    pub fn published_window(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let mut after = self.upload_period.map(|period| now - period.lookback());
        let mut before = None;

        if let Some(start) = self.start_date.and_then(|d| d.and_hms_opt(0, 0, 0)) {
            after = Some(Utc.from_utc_datetime(&start));
        }
        if let Some(end) = self.end_date.and_then(|d| d.and_hms_opt(23, 59, 59)) {
            before = Some(Utc.from_utc_datetime(&end));
        }

        (after, before)
    }
}
