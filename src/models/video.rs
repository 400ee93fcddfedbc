use crate::provider::VideoDetails;
use crate::search::duration::{parse_iso8601_duration, DurationCategory};
use serde::{Deserialize, Serialize};

/// One output row. Field names on the wire match what the web UI and the
/// spreadsheet export expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(rename = "youtube_channel_name", default)]
    pub channel_name: String,
    #[serde(rename = "youtube_channel_id", default)]
    pub channel_id: String,
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "status_date", default)]
    pub published_at: String,
    #[serde(rename = "daily_view_count", default)]
    pub view_count: u64,
    #[serde(default)]
    pub subscriber_count: Option<u64>,
    #[serde(default)]
    pub primary_category: String,
    #[serde(rename = "vod_url", default)]
    pub watch_url: String,
    /// Raw ISO-8601 duration as reported by YouTube.
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(rename = "video_length_category", default)]
    pub duration_category: Option<DurationCategory>,
    #[serde(default)]
    pub status: String,
}

impl VideoRecord {
    pub fn from_details(details: VideoDetails, subscriber_count: Option<u64>) -> Self {
        let duration_seconds = parse_iso8601_duration(&details.duration);
        let primary_category = category_name(details.category_id.as_deref()).to_string();

        Self {
            watch_url: watch_url(&details.id),
            channel_name: details.channel_title,
            channel_id: details.channel_id,
            video_id: details.id,
            title: details.title,
            description: details.description,
            thumbnail_url: details.thumbnail_url,
            published_at: details.published_at,
            view_count: details.view_count,
            subscriber_count,
            primary_category,
            duration: details.duration,
            duration_seconds,
            duration_category: Some(DurationCategory::from_seconds(duration_seconds)),
            status: "active".to_string(),
        }
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// YouTube video category id to display name.
pub fn category_name(category_id: Option<&str>) -> &'static str {
    match category_id.unwrap_or_default() {
        "1" => "Film & Animation",
        "2" => "Autos & Vehicles",
        "10" => "Music",
        "15" => "Pets & Animals",
        "17" => "Sports",
        "19" => "Travel & Events",
        "20" => "Gaming",
        "22" => "People & Blogs",
        "23" => "Comedy",
        "24" => "Entertainment",
        "25" => "News & Politics",
        "26" => "Howto & Style",
        "27" => "Education",
        "28" => "Science & Technology",
        _ => "Other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_details() {
        let details = VideoDetails {
            id: "dQw4w9WgXcQ".into(),
            channel_id: "UC123".into(),
            channel_title: "Rick".into(),
            title: "Never Gonna".into(),
            published_at: "2009-10-25T06:57:33Z".into(),
            category_id: Some("10".into()),
            view_count: 1_500_000_000,
            duration: "PT3M33S".into(),
            ..Default::default()
        };

        let record = VideoRecord::from_details(details, Some(4_000_000));
        assert_eq!(record.watch_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(record.duration_seconds, 213);
        assert_eq!(record.duration_category, Some(DurationCategory::Mid1));
        assert_eq!(record.primary_category, "Music");
        assert_eq!(record.status, "active");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["youtube_channel_name"], "Rick");
        assert_eq!(json["daily_view_count"], 1_500_000_000u64);
        assert_eq!(json["video_length_category"], "mid1");
        assert_eq!(json["vod_url"], record.watch_url.as_str());
    }

    #[test]
    fn test_unknown_category_is_other() {
        assert_eq!(category_name(Some("999")), "Other");
        assert_eq!(category_name(None), "Other");
    }
}
