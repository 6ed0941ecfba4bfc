use serde::{Deserialize, Serialize};

// ============ Request ============

/// Body of `POST /api/query`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AddressQuery {
    /// Raw user input; may be untrimmed.
    #[serde(default)]
    pub address: Option<String>,
}

// ============ Geocoding ============

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lng: f64,
    pub lat: f64,
}

/// Match quality reported by the geocoder, ranked best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    Exact,
    Matched,
    Residential,
    County,
    Other,
}

impl MatchLevel {
    /// Maps AMap's `level` tag (Chinese or English form) onto the ranking.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some("exact" | "门牌号" | "兴趣点" | "单元号") => MatchLevel::Exact,
            Some("match" | "matched" | "道路" | "道路交叉路口" | "楼栋" | "热点商圈") => {
                MatchLevel::Matched
            }
            Some("residential" | "住宅区") => MatchLevel::Residential,
            Some("county" | "区县") => MatchLevel::County,
            _ => MatchLevel::Other,
        }
    }

    /// Weight used when ranking candidate records.
    pub fn selection_score(self) -> u32 {
        match self {
            MatchLevel::Exact => 50,
            MatchLevel::Matched => 30,
            MatchLevel::Residential => 20,
            MatchLevel::County => 10,
            MatchLevel::Other => 0,
        }
    }

    pub fn confidence_bonus(self) -> u8 {
        match self {
            MatchLevel::Exact => 20,
            MatchLevel::Matched => 10,
            _ => 0,
        }
    }
}

/// One candidate record, already normalized from either a geocode or a POI response.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub province: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub township: Option<String>,
    pub formatted_address: Option<String>,
    pub level: MatchLevel,
    pub location: Option<Coordinates>,
    /// Street part reported by POI search
    pub street_address: Option<String>,
}

// ============ Normalized output ============

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponents {
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub township: String,
    #[serde(default)]
    pub detail: String,
}

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Matched an entry of the configured known-places map
    KnownMapping,
    Geocode,
    PoiSearch,
    /// City short-name expansion after both lookups came back empty
    FallbackTable,
    /// Cleaned input returned unchanged
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAddress {
    pub full_address: String,
    pub components: AddressComponents,
    /// 0..=100
    pub confidence: u8,
    pub method: ResolutionMethod,
    /// Explanation shown with degraded results.
    pub message: Option<String>,
    /// Failure class that forced a degraded result, if any.
    pub error_type: Option<String>,
    pub location: Option<Coordinates>,
}

// ============ Response ============

/// 200 body of `POST /api/query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub completed_address: String,
    pub full_address: String,
    pub original_address: String,
    pub components: AddressComponents,
    pub method: ResolutionMethod,
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}

impl QueryResponse {
    pub fn new(original_address: &str, normalized: NormalizedAddress) -> Self {
        Self {
            completed_address: normalized.full_address.clone(),
            full_address: normalized.full_address,
            original_address: original_address.to_string(),
            components: normalized.components,
            method: normalized.method,
            confidence: normalized.confidence,
            message: normalized.message,
            error_type: normalized.error_type,
            location: normalized.location,
        }
    }
}
