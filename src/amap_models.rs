use crate::errors::AppError;
use crate::models::{Coordinates, GeocodeResult, MatchLevel};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reads a field that AMap returns as a string, as `[]` when empty, or as a list of strings.
///
/// Blank values collapse to `None` so nothing downstream has to re-check the shape.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(first_text))
}

fn first_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Array(items) => items.into_iter().next().and_then(first_text),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts a missing or `null` list as empty.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses AMap's `"lng,lat"` location string.
pub fn parse_location(raw: &str) -> Option<Coordinates> {
    let (lng, lat) = raw.split_once(',')?;
    Some(Coordinates {
        lng: lng.trim().parse().ok()?,
        lat: lat.trim().parse().ok()?,
    })
}

/// Common `status` / `info` / `infocode` envelope of every AMap v3 response.
pub trait AmapEnvelope: Sized {
    fn status(&self) -> Option<&str>;
    fn info(&self) -> Option<&str>;
    fn infocode(&self) -> Option<&str>;

    /// Passes the response through when `status == "1"`, otherwise maps it to an `AppError`.
    fn into_success(self) -> Result<Self, AppError> {
        if self.status() == Some("1") {
            return Ok(self);
        }
        Err(AppError::from_upstream_status(self.info(), self.infocode()))
    }
}

/// `/v3/geocode/geo` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeocodeResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub info: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub infocode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub count: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub geocodes: Vec<GeocodeRecord>,
}

impl AmapEnvelope for GeocodeResponse {
    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
    fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }
    fn infocode(&self) -> Option<&str> {
        self.infocode.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeocodeRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub formatted_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub province: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub township: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub adcode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
}

impl From<GeocodeRecord> for GeocodeResult {
    fn from(record: GeocodeRecord) -> Self {
        GeocodeResult {
            level: MatchLevel::from_tag(record.level.as_deref()),
            location: record.location.as_deref().and_then(parse_location),
            province: record.province,
            city: record.city,
            district: record.district,
            township: record.township,
            formatted_address: record.formatted_address,
            street_address: None,
        }
    }
}

/// `/v3/place/text` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaceSearchResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub info: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub infocode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub count: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub pois: Vec<PoiRecord>,
}

impl AmapEnvelope for PlaceSearchResponse {
    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
    fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }
    fn infocode(&self) -> Option<&str> {
        self.infocode.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PoiRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// Street and number, relative to the administrative area
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cityname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub adname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
}

impl From<PoiRecord> for GeocodeResult {
    fn from(record: PoiRecord) -> Self {
        // The POI name comes before the street so a typed place name scores as verbatim
        let formatted_address = [
            record.pname.as_deref(),
            record.cityname.as_deref(),
            record.adname.as_deref(),
            record.name.as_deref(),
            record.address.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<String>();

        GeocodeResult {
            level: MatchLevel::Other,
            location: record.location.as_deref().and_then(parse_location),
            province: record.pname,
            city: record.cityname,
            district: record.adname,
            township: None,
            formatted_address: (!formatted_address.is_empty()).then_some(formatted_address),
            street_address: record.address,
        }
    }
}
