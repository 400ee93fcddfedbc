// Translating a SearchRequest into YouTube search.list parameters

use crate::models::search::SearchRequest;
use crate::provider::{SearchOrder, SearchPageQuery};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

/// search.list never returns more than 50 items per page.
pub const MAX_PAGE_SIZE: usize = 50;

const DEFAULT_LANGUAGE: &str = "en";

/// Filler terms used when a worldwide search has no keyword.
const BROAD_TERMS: [&str; 6] = ["a", "the", "and", "or", "video", "youtube"];
const FALLBACK_COUNTRY_TERMS: [&str; 2] = ["video", "popular"];

/// Region code for a country selector. Countries where YouTube is
/// restricted map to `None` and are searched worldwide.
pub fn region_code(country: &str) -> Option<&'static str> {
    match country.to_lowercase().as_str() {
        "korea" => Some("KR"),
        "usa" => Some("US"),
        "japan" => Some("JP"),
        "uk" => Some("GB"),
        "germany" => Some("DE"),
        "france" => Some("FR"),
        "canada" => Some("CA"),
        "australia" => Some("AU"),
        "india" => Some("IN"),
        "brazil" => Some("BR"),
        "mexico" => Some("MX"),
        "italy" => Some("IT"),
        "spain" => Some("ES"),
        // worldwide, china, russia and anything unknown
        _ => None,
    }
}

pub fn relevance_language(country: &str) -> &'static str {
    match country.to_lowercase().as_str() {
        "korea" => "ko",
        "japan" => "ja",
        "china" => "zh",
        "germany" => "de",
        "france" => "fr",
        "brazil" => "pt",
        "mexico" | "spain" => "es",
        "italy" => "it",
        _ => DEFAULT_LANGUAGE,
    }
}

fn country_terms(country: &str) -> &'static [&'static str] {
    match country {
        "korea" => &["한국", "korean", "korea", "한국어"],
        "usa" => &["america", "usa", "american", "english"],
        "japan" => &["japan", "japanese", "일본", "일본어"],
        "uk" => &["britain", "uk", "british", "english"],
        "germany" => &["germany", "german", "deutsch", "독일"],
        "france" => &["france", "french", "français", "프랑스"],
        "canada" => &["canada", "canadian", "english", "french"],
        "australia" => &["australia", "australian", "english"],
        "india" => &["india", "indian", "hindi", "english"],
        "brazil" => &["brazil", "brazilian", "portuguese", "português"],
        "mexico" => &["mexico", "mexican", "spanish", "español"],
        "italy" => &["italy", "italian", "italiano", "이탈리아"],
        "spain" => &["spain", "spanish", "español", "스페인"],
        _ => &FALLBACK_COUNTRY_TERMS,
    }
}

/// Pick the text query and ordering.
///
/// Without a keyword this falls back to a random filler term to approximate
/// "popular" results. It is a heuristic: the results depend on the term drawn.
pub fn text_query<R: Rng + ?Sized>(request: &SearchRequest, rng: &mut R) -> (String, SearchOrder) {
    if let Some(keyword) = &request.keyword {
        return (keyword.clone(), SearchOrder::ViewCount);
    }

    if request.is_worldwide() {
        let term = BROAD_TERMS.choose(rng).copied().unwrap_or("video");
        (term.to_string(), SearchOrder::ViewCount)
    } else {
        let term = country_terms(&request.country)
            .choose(rng)
            .copied()
            .unwrap_or("video");
        (term.to_string(), SearchOrder::Relevance)
    }
}

pub fn build_page_query<R: Rng + ?Sized>(
    request: &SearchRequest,
    rng: &mut R,
    now: DateTime<Utc>,
) -> SearchPageQuery {
    let (q, order) = text_query(request, rng);
    let (published_after, published_before) = request.published_window(now);

    let region = region_code(&request.country);
    match region {
        Some(code) => tracing::debug!("✅ Region code: {} → {}", request.country, code),
        None if request.is_worldwide() => tracing::debug!("🌍 Worldwide search"),
        None => tracing::warn!(
            "⚠️ No region code for '{}', searching worldwide",
            request.country
        ),
    }

    SearchPageQuery {
        q,
        order,
        region_code: region.map(str::to_string),
        relevance_language: Some(relevance_language(&request.country).to_string()),
        published_after,
        published_before,
        max_results: request.max_results.min(MAX_PAGE_SIZE) as u32,
        page_token: None,
    }
}
