use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use voyage_core::models::{Destination, DestinationDetails, Place};
use voyage_observability::AppMetrics;

use crate::error::{ProviderError, Result};

const TAVILY_URL: &str = "https://api.tavily.com/search";
const CACHE_TTL: Duration = Duration::from_secs(3600);

pub trait SearchProvider: Send + Sync {
    async fn popular_destinations(&self, region: &str) -> Result<Vec<Destination>>;
    async fn destination_details(&self, destination: &str, style: &str)
        -> Result<DestinationDetails>;
}

/// Curated dataset used when no web provider is configured and as the
/// fallback when the web provider fails mid-flight.
#[derive(Debug, Clone, Default)]
pub struct OfflineSearch;

impl SearchProvider for OfflineSearch {
    async fn popular_destinations(&self, _region: &str) -> Result<Vec<Destination>> {
        Ok(fallback_destinations())
    }

    async fn destination_details(
        &self,
        destination: &str,
        style: &str,
    ) -> Result<DestinationDetails> {
        Ok(fallback_details(destination, style))
    }
}

pub fn fallback_destinations() -> Vec<Destination> {
    fn dest(name: &str, region: &str, kind: &str, description: &str, score: f32) -> Destination {
        Destination {
            name: name.to_string(),
            region: region.to_string(),
            kind: kind.to_string(),
            description: description.to_string(),
            popularity_score: score,
            source_url: None,
        }
    }

    vec![
        dest(
            "제주도",
            "제주특별자치도",
            "island",
            "한라산과 아름다운 해변, 독특한 문화가 어우러진 한국 최고의 관광지",
            9.5,
        ),
        dest(
            "부산",
            "부산광역시",
            "coastal",
            "해운대, 광안리 해변과 신선한 해산물, 활기찬 항구 도시의 매력",
            9.0,
        ),
        dest(
            "경주",
            "경상북도",
            "historical",
            "신라 천년의 역사가 살아 숨 쉬는 야외 박물관 같은 고도",
            8.5,
        ),
        dest(
            "강릉",
            "강원도",
            "coastal",
            "동해의 푸른 바다와 커피 거리, 사시사철 아름다운 관동팔경",
            8.0,
        ),
        dest(
            "여수",
            "전라남도",
            "coastal",
            "여수 밤바다의 낭만과 돌산대교, 해상케이블카의 절경",
            7.8,
        ),
    ]
}

pub fn fallback_details(destination: &str, style: &str) -> DestinationDetails {
    let places = fallback_places(destination);
    let restaurants = places
        .iter()
        .filter(|p| p.category == "맛집")
        .take(3)
        .cloned()
        .collect();
    let activities = places
        .iter()
        .filter(|p| p.category == "액티비티")
        .take(2)
        .cloned()
        .collect();

    DestinationDetails {
        destination: destination.to_string(),
        travel_style: style.to_string(),
        places,
        restaurants,
        accommodations: Vec::new(),
        activities,
    }
}

fn fallback_places(destination: &str) -> Vec<Place> {
    let entries: &[(&str, &str, &str)] = match destination {
        "제주도" => &[
            ("한라산", "자연/관광", "한국 최고봉의 웅장한 자연경관"),
            ("성산일출봉", "자연/관광", "유네스코 세계자연유산, 일출 명소"),
            ("협재해수욕장", "자연/관광", "에메랄드빛 바다와 하얀 모래사장"),
            ("흑돼지거리", "맛집", "제주 특산 흑돼지 맛집 거리"),
            ("카멜리아힐", "카페/감성", "동백꽃이 아름다운 수목원"),
        ],
        "부산" => &[
            ("해운대해수욕장", "자연/관광", "부산 대표 해변과 스카이라인"),
            ("감천문화마을", "문화/역사", "알록달록한 색채의 산복도로 마을"),
            ("광안대교", "자연/관광", "부산의 야경을 대표하는 현수교"),
            ("자갈치시장", "쇼핑", "한국 최대 수산물 시장"),
            ("태종대", "자연/관광", "기암절벽과 울창한 숲의 절경"),
        ],
        "경주" => &[
            ("불국사", "문화/역사", "신라 불교문화의 정수를 담은 사찰"),
            ("석굴암", "문화/역사", "본존불상이 모셔진 석굴 사원"),
            ("첨성대", "문화/역사", "동양에서 가장 오래된 천문대"),
            ("안압지", "문화/역사", "신라 왕궁의 별궁 연못"),
            ("황리단길", "카페/감성", "전통과 현대가 어우러진 거리"),
        ],
        "강릉" => &[
            ("경포해변", "자연/관광", "넓은 백사장과 소나무 숲의 조화"),
            ("오죽헌", "문화/역사", "율곡 이이의 생가이자 역사 유적"),
            ("안목해변", "카페/감성", "커피거리로 유명한 해변"),
            ("정동진", "자연/관광", "기차역에서 가장 가까운 바다"),
            ("초당순두부마을", "맛집", "강릉 대표 음식 순두부 맛집 집합소"),
        ],
        "여수" => &[
            ("여수밤바다", "자연/관광", "아름다운 야경으로 유명한 항구"),
            ("오동도", "자연/관광", "동백꽃이 피는 섬"),
            ("여수엑스포", "액티비티", "해양과학 체험 공간"),
            ("돌산대교", "자연/관광", "여수와 돌산을 연결하는 현수교"),
            ("해상케이블카", "액티비티", "바다 위를 가로지르는 케이블카"),
        ],
        _ => {
            return vec![Place::new(
                &format!("{destination} 관광지"),
                "관광지",
                &format!("{destination}의 대표 명소입니다."),
            )]
        }
    };

    entries
        .iter()
        .map(|(name, category, description)| Place::new(name, category, description))
        .collect()
}

/// Keyword category classification for raw search hits.
pub fn categorize_place(text: &str) -> &'static str {
    let contains_any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if contains_any(&["박물관", "미술관", "문화재", "궁"]) {
        "문화/역사"
    } else if contains_any(&["해변", "바다", "산", "공원", "자연"]) {
        "자연/관광"
    } else if contains_any(&["시장", "쇼핑", "백화점"]) {
        "쇼핑"
    } else if contains_any(&["놀이공원", "테마파크", "체험"]) {
        "액티비티"
    } else if contains_any(&["카페", "포토존", "예쁜"]) {
        "카페/감성"
    } else {
        "관광지"
    }
}

fn style_search_keywords(style: &str) -> &'static str {
    match style {
        "culture" => "문화재 박물관 전통 역사",
        "nature" => "자연 공원 바다 산 힐링",
        "food" => "맛집 음식 특산물 현지음식",
        "shopping" => "쇼핑 시장 백화점 아울렛",
        "activity" => "체험 액티비티 놀이공원 테마파크",
        "photo" => "포토존 카페 예쁜곳 인스타그램",
        _ => "관광지 명소",
    }
}

static HANGUL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[가-힣]+").unwrap());
static ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[가-힣]+시\s+[가-힣]+구\s+[가-힣]+동|[가-힣]+도\s+[가-힣]+시|[가-힣]+특별시\s+[가-힣]+구|[가-힣]+광역시\s+[가-힣]+구",
    )
    .unwrap()
});

/// First meaningful Hangul word left after stripping listicle noise.
pub fn extract_place_name(title: &str, destination: &str) -> Option<String> {
    let mut cleaned = title.to_string();
    for noise in ["추천", "베스트", "가볼만한", "명소", "관광지", "여행", destination] {
        cleaned = cleaned.replace(noise, "");
    }
    HANGUL_WORD
        .find_iter(&cleaned)
        .map(|m| m.as_str())
        .find(|w| w.chars().count() >= 2)
        .map(str::to_string)
}

pub fn extract_address(content: &str) -> Option<String> {
    ADDRESS.find(content).map(|m| m.as_str().to_string())
}

fn extract_place_description(content: &str) -> String {
    if content.is_empty() {
        return "상세 정보를 확인해보세요.".to_string();
    }
    content
        .split('.')
        .map(str::trim)
        .find(|s| s.chars().count() > 20)
        .map(str::to_string)
        .unwrap_or_else(|| content.chars().take(100).collect())
}

fn popularity_score(content: &str, destination: &str) -> f32 {
    let base = match destination {
        "제주도" => return 9.0,
        "부산" => return 8.5,
        "서울" => return 8.8,
        "경주" => return 8.0,
        "강릉" => return 7.8,
        "여수" => return 7.5,
        "전주" => return 7.3,
        _ => 5.0,
    };
    let bonus = ["인기", "유명", "추천", "베스트", "핫플", "명소"]
        .iter()
        .filter(|k| content.contains(**k))
        .count() as f32
        * 0.5;
    (base + bonus).min(10.0)
}

#[derive(Debug, Clone)]
enum CacheValue {
    Destinations(Vec<Destination>),
    Details(DestinationDetails),
}

struct CacheEntry {
    value: CacheValue,
    inserted_at: Instant,
}

/// Read-through cache over search responses, one hour expiry. Misses are
/// silent; locks are never held across awaits.
#[derive(Default)]
pub struct SearchCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl SearchCache {
    fn get(&self, key: &str) -> Option<CacheValue> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() < CACHE_TTL {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn put(&self, key: String, value: CacheValue) {
        self.entries.write().insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }
}

/// Tavily-style web search. Provider failure never surfaces: it degrades to
/// the offline dataset and counts a provider fallback.
pub struct WebSearch {
    client: reqwest::Client,
    api_key: String,
    cache: SearchCache,
    metrics: Arc<AppMetrics>,
}

impl WebSearch {
    pub fn new(api_key: String, metrics: Arc<AppMetrics>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            cache: SearchCache::default(),
            metrics,
        }
    }

    pub fn from_env(metrics: Arc<AppMetrics>) -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("TAVILY_API_KEY"))?;
        Ok(Self::new(api_key, metrics))
    }

    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>> {
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "search_depth": "basic",
            "max_results": max_results,
        });

        let response = self.client.post(TAVILY_URL).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidResponse(format!("bad search JSON: {err}")))?;
        let results = payload
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::InvalidResponse("no results array".to_string()))?;

        Ok(results
            .iter()
            .map(|r| SearchHit {
                title: r.get("title").and_then(Value::as_str).unwrap_or("").to_string(),
                content: r.get("content").and_then(Value::as_str).unwrap_or("").to_string(),
                url: r.get("url").and_then(Value::as_str).map(str::to_string),
            })
            .collect())
    }

    async fn fetch_destinations(&self, region: &str) -> Result<Vec<Destination>> {
        let query = format!("{region} 인기 여행지 추천 관광명소");
        let hits = self.search(&query, 8).await?;
        Ok(extract_destinations(&hits))
    }

    async fn fetch_details(&self, destination: &str, style: &str) -> Result<DestinationDetails> {
        let places_query = format!(
            "{destination} 가볼만한곳 {} 추천 명소",
            style_search_keywords(style)
        );
        let place_hits = self.search(&places_query, 6).await?;
        let mut places = extract_places(&place_hits, destination);
        if places.len() < 4 {
            let have: Vec<String> = places.iter().map(|p| p.name.clone()).collect();
            places.extend(
                fallback_places(destination)
                    .into_iter()
                    .filter(|p| !have.contains(&p.name))
                    .take(4 - places.len()),
            );
        }

        let mut restaurants = Vec::new();
        if matches!(style, "food" | "general") {
            let query = format!("{destination} 맛집 추천 현지음식");
            let hits = self.search(&query, 4).await?;
            restaurants = extract_restaurants(&hits, destination);
        }

        let activities = places
            .iter()
            .filter(|p| p.category == "액티비티")
            .take(2)
            .cloned()
            .collect();

        Ok(DestinationDetails {
            destination: destination.to_string(),
            travel_style: style.to_string(),
            places,
            restaurants,
            accommodations: Vec::new(),
            activities,
        })
    }
}

struct SearchHit {
    title: String,
    content: String,
    url: Option<String>,
}

fn extract_destinations(hits: &[SearchHit]) -> Vec<Destination> {
    const KNOWN: [(&str, &str, &str, &str); 10] = [
        ("제주", "제주도", "제주특별자치도", "island"),
        ("부산", "부산", "부산광역시", "coastal"),
        ("경주", "경주", "경상북도", "historical"),
        ("강릉", "강릉", "강원도", "coastal"),
        ("여수", "여수", "전라남도", "coastal"),
        ("전주", "전주", "전라북도", "cultural"),
        ("안동", "안동", "경상북도", "historical"),
        ("춘천", "춘천", "강원도", "nature"),
        ("통영", "통영", "경상남도", "coastal"),
        ("담양", "담양", "전라남도", "nature"),
    ];

    let mut destinations: Vec<Destination> = Vec::new();
    for hit in hits {
        let text = format!("{} {}", hit.content, hit.title);
        for (key, name, region, kind) in KNOWN {
            if text.contains(key) && !destinations.iter().any(|d| d.name == name) {
                destinations.push(Destination {
                    name: name.to_string(),
                    region: region.to_string(),
                    kind: kind.to_string(),
                    description: extract_destination_description(&text, name),
                    popularity_score: popularity_score(&text, name),
                    source_url: hit.url.clone(),
                });
            }
        }
    }

    if destinations.len() < 5 {
        for fallback in fallback_destinations() {
            if !destinations.iter().any(|d| d.name == fallback.name) {
                destinations.push(fallback);
                if destinations.len() >= 5 {
                    break;
                }
            }
        }
    }

    destinations.sort_by(|a, b| {
        b.popularity_score
            .partial_cmp(&a.popularity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    destinations.truncate(5);
    destinations
}

fn extract_destination_description(content: &str, destination: &str) -> String {
    content
        .split('.')
        .map(str::trim)
        .find(|s| s.contains(destination) && s.chars().count() > 30)
        .map(|s| format!("{}...", s.chars().take(150).collect::<String>()))
        .unwrap_or_else(|| format!("{destination}의 아름다운 풍경과 독특한 매력을 경험해보세요."))
}

fn extract_places(hits: &[SearchHit], destination: &str) -> Vec<Place> {
    hits.iter()
        .take(8)
        .filter_map(|hit| {
            let name = extract_place_name(&hit.title, destination)?;
            let combined = format!("{}{}", hit.title, hit.content);
            let mut place = Place::new(
                &name,
                categorize_place(&combined),
                &truncate_chars(&extract_place_description(&hit.content), 100),
            );
            place.address = extract_address(&hit.content);
            place.source_url = hit.url.clone();
            Some(place)
        })
        .collect()
}

fn extract_restaurants(hits: &[SearchHit], destination: &str) -> Vec<Place> {
    hits.iter()
        .take(6)
        .filter_map(|hit| {
            let name = extract_restaurant_name(&hit.title, destination)?;
            let combined = format!("{}{}", hit.title, hit.content);
            let mut place = Place::new(
                &name,
                "맛집",
                &truncate_chars(&extract_place_description(&hit.content), 80),
            );
            place.cuisine_type = Some(extract_cuisine_type(&combined).to_string());
            place.address = extract_address(&hit.content);
            place.source_url = hit.url.clone();
            Some(place)
        })
        .collect()
}

fn extract_restaurant_name(title: &str, destination: &str) -> Option<String> {
    if !title.contains(destination) {
        return None;
    }
    if !["맛집", "음식점", "식당", "카페", "레스토랑"]
        .iter()
        .any(|k| title.contains(k))
    {
        return None;
    }
    HANGUL_WORD
        .find_iter(title)
        .map(|m| m.as_str())
        .find(|w| {
            w.chars().count() >= 2
                && !["맛집", "음식점", "식당", "추천"].contains(w)
                && *w != destination
        })
        .map(str::to_string)
}

pub fn extract_cuisine_type(text: &str) -> &'static str {
    const CUISINES: [(&str, &[&str]); 7] = [
        ("한식", &["한식", "국밥", "비빔밥", "김치", "불고기", "갈비"]),
        ("해산물", &["회", "조개", "생선", "해산물", "횟집", "수산"]),
        ("중식", &["중식", "짜장면", "짬뽕", "탕수육"]),
        ("일식", &["일식", "초밥", "라멘", "돈카츠", "우동"]),
        ("양식", &["양식", "파스타", "피자", "스테이크"]),
        ("카페", &["카페", "커피", "디저트", "케이크"]),
        ("분식", &["분식", "떡볶이", "김밥", "순대"]),
    ];
    for (cuisine, keywords) in CUISINES {
        if keywords.iter().any(|k| text.contains(k)) {
            return cuisine;
        }
    }
    "기타"
}

fn truncate_chars(input: &str, max: usize) -> String {
    input.chars().take(max).collect()
}

/// Runtime-selected search backend.
pub enum Search {
    Web(WebSearch),
    Offline(OfflineSearch),
}

impl Search {
    pub fn offline() -> Self {
        Self::Offline(OfflineSearch)
    }

    /// Web-backed when `TAVILY_API_KEY` is present, offline otherwise.
    pub fn from_env(metrics: Arc<AppMetrics>) -> Self {
        match WebSearch::from_env(metrics) {
            Ok(web) => Self::Web(web),
            Err(_) => Self::Offline(OfflineSearch),
        }
    }
}

impl SearchProvider for Search {
    #[instrument(skip(self))]
    async fn popular_destinations(&self, region: &str) -> Result<Vec<Destination>> {
        match self {
            Search::Offline(offline) => offline.popular_destinations(region).await,
            Search::Web(web) => {
                let cache_key = format!("popular_destinations_{region}");
                if let Some(CacheValue::Destinations(cached)) = web.cache.get(&cache_key) {
                    web.metrics.inc_search_cache_hit();
                    return Ok(cached);
                }

                let destinations = match web.fetch_destinations(region).await {
                    Ok(destinations) => destinations,
                    Err(err) => {
                        warn!(error = %err, "destination search failed, using offline dataset");
                        web.metrics.inc_provider_fallback();
                        fallback_destinations()
                    }
                };
                web.cache
                    .put(cache_key, CacheValue::Destinations(destinations.clone()));
                Ok(destinations)
            }
        }
    }

    #[instrument(skip(self))]
    async fn destination_details(
        &self,
        destination: &str,
        style: &str,
    ) -> Result<DestinationDetails> {
        match self {
            Search::Offline(offline) => offline.destination_details(destination, style).await,
            Search::Web(web) => {
                let cache_key = format!("destination_details_{destination}_{style}");
                if let Some(CacheValue::Details(cached)) = web.cache.get(&cache_key) {
                    web.metrics.inc_search_cache_hit();
                    return Ok(cached);
                }

                let details = match web.fetch_details(destination, style).await {
                    Ok(details) => details,
                    Err(err) => {
                        warn!(error = %err, "detail search failed, using offline dataset");
                        web.metrics.inc_provider_fallback();
                        fallback_details(destination, style)
                    }
                };
                web.cache
                    .put(cache_key, CacheValue::Details(details.clone()));
                Ok(details)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_dataset_is_ranked() {
        let destinations = fallback_destinations();
        assert_eq!(destinations.len(), 5);
        assert_eq!(destinations[0].name, "제주도");
        assert!(destinations
            .windows(2)
            .all(|w| w[0].popularity_score >= w[1].popularity_score));
    }

    #[test]
    fn jeju_details_include_restaurants_and_no_activities() {
        let details = fallback_details("제주도", "nature");
        assert_eq!(details.places.len(), 5);
        assert_eq!(details.restaurants.len(), 1);
        assert_eq!(details.restaurants[0].name, "흑돼지거리");
        assert!(details.activities.is_empty());
        assert!(details.accommodations.is_empty());
    }

    #[test]
    fn yeosu_details_cap_activities_at_two() {
        let details = fallback_details("여수", "activity");
        assert_eq!(details.activities.len(), 2);
    }

    #[test]
    fn unknown_destination_gets_generic_place() {
        let details = fallback_details("파리", "general");
        assert_eq!(details.places.len(), 1);
        assert_eq!(details.places[0].name, "파리 관광지");
        assert_eq!(details.places[0].category, "관광지");
    }

    #[test]
    fn categorization_follows_keyword_priority() {
        assert_eq!(categorize_place("국립중앙박물관 관람"), "문화/역사");
        assert_eq!(categorize_place("협재 해변 산책"), "자연/관광");
        assert_eq!(categorize_place("동문시장 구경"), "쇼핑");
        assert_eq!(categorize_place("테마파크 어트랙션"), "액티비티");
        assert_eq!(categorize_place("감성 카페 투어"), "카페/감성");
        assert_eq!(categorize_place("그냥 어딘가"), "관광지");
    }

    #[test]
    fn place_name_ignores_listicle_noise() {
        assert_eq!(
            extract_place_name("제주도 가볼만한 베스트 성산일출봉 추천", "제주도"),
            Some("성산일출봉".to_string())
        );
        assert_eq!(extract_place_name("BEST 10 TOP", "제주도"), None);
    }

    #[test]
    fn address_pattern_matches_korean_forms() {
        assert_eq!(
            extract_address("위치는 부산광역시 해운대구 근처입니다"),
            Some("부산광역시 해운대구".to_string())
        );
        assert_eq!(extract_address("no address here"), None);
    }

    #[test]
    fn cuisine_type_from_keywords() {
        assert_eq!(extract_cuisine_type("흑돼지 불고기 맛집"), "한식");
        assert_eq!(extract_cuisine_type("갓잡은 회 횟집"), "해산물");
        assert_eq!(extract_cuisine_type("베이글"), "기타");
    }

    #[tokio::test]
    async fn offline_provider_always_succeeds() {
        let search = Search::offline();
        let destinations = search.popular_destinations("한국").await.unwrap();
        assert_eq!(destinations.len(), 5);
        let details = search.destination_details("부산", "food").await.unwrap();
        assert_eq!(details.destination, "부산");
    }

    #[test]
    fn cache_round_trips_until_expiry() {
        let cache = SearchCache::default();
        cache.put(
            "popular_destinations_한국".to_string(),
            CacheValue::Destinations(fallback_destinations()),
        );
        assert!(matches!(
            cache.get("popular_destinations_한국"),
            Some(CacheValue::Destinations(_))
        ));
        assert!(cache.get("popular_destinations_일본").is_none());
    }
}
