//! Address normalization heuristics.
//!
//! Pure functions that turn geocoder records plus the user's input into a
//! single [`NormalizedAddress`]. Nothing here performs I/O; the outbound
//! calls live in [`crate::completion`].

use crate::errors::AppError;
use crate::known_places::KnownPlaces;
use crate::models::{
    AddressComponents, GeocodeResult, MatchLevel, NormalizedAddress, ResolutionMethod,
};
use regex::Regex;

/// Message returned when neither lookup produced a usable record.
pub const NO_MATCH_MESSAGE: &str = "未能查询到该地址的区划信息，请尝试更正地址。";

pub const FALLBACK_TABLE_CONFIDENCE: u8 = 30;
pub const FALLBACK_CONFIDENCE: u8 = 10;

const BASE_CONFIDENCE: u32 = 50;

/// Administrative suffixes stripped to build a component's short form, longest first.
const ADMIN_SUFFIXES: &[&str] = &[
    "特别行政区",
    "自治区",
    "自治州",
    "自治县",
    "省",
    "市",
    "区",
    "县",
];

/// Major cities: short name and full name.
const DEFAULT_CITY_ALIASES: &[(&str, &str)] = &[
    ("北京", "北京市"),
    ("上海", "上海市"),
    ("天津", "天津市"),
    ("重庆", "重庆市"),
    ("广州", "广州市"),
    ("深圳", "深圳市"),
    ("杭州", "杭州市"),
    ("南京", "南京市"),
    ("苏州", "苏州市"),
    ("成都", "成都市"),
    ("武汉", "武汉市"),
    ("西安", "西安市"),
];

lazy_static::lazy_static! {
    static ref SEPARATOR_RE: Regex = Regex::new(r"[,，;；、]").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    // Lazy prefix up to the nearest administrative suffix, else the remainder
    static ref SEGMENT_RE: Regex = Regex::new(r".+?(?:省|市|区|县|镇|街道)|.+").unwrap();
}

/// Trims, drops comma/semicolon separators (ASCII and ideographic) and collapses whitespace.
pub fn clean_input(raw: &str) -> String {
    let without_separators = SEPARATOR_RE.replace_all(raw, "");
    WHITESPACE_RE
        .replace_all(without_separators.trim(), " ")
        .into_owned()
}

/// Splits the input after each administrative suffix.
///
/// `"北京市朝阳区绿地中心大厦"` yields `["北京市", "朝阳区", "绿地中心大厦"]`.
pub fn split_segments(cleaned: &str) -> Vec<String> {
    SEGMENT_RE
        .find_iter(cleaned)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// True when `formatted` contains the whole cleaned input, whitespace ignored.
fn contains_verbatim(formatted: &str, cleaned: &str) -> bool {
    let needle = compact(cleaned);
    !needle.is_empty() && compact(formatted).contains(&needle)
}

/// Ranking score of one candidate against the cleaned input.
pub fn score_candidate(cleaned: &str, segments: &[String], candidate: &GeocodeResult) -> u32 {
    let mut score = candidate.level.selection_score();
    let Some(formatted) = candidate.formatted_address.as_deref() else {
        return score;
    };
    let formatted = compact(formatted);

    if contains_verbatim(&formatted, cleaned) {
        score += 100;
    }
    for segment in segments {
        let segment = compact(segment);
        if !segment.is_empty() && formatted.contains(&segment) {
            score += 20;
        }
    }
    score
}

/// Index of the best-scoring candidate. Ties keep the earliest record.
pub fn select_best(cleaned: &str, candidates: &[GeocodeResult]) -> Option<usize> {
    let segments = split_segments(cleaned);
    let mut best: Option<(usize, u32)> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let score = score_candidate(cleaned, &segments, candidate);
        tracing::debug!(
            "Candidate #{} {:?} scored {}",
            index,
            candidate.formatted_address,
            score
        );
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }

    best.map(|(index, _)| index)
}

/// Name without its administrative suffix, if at least two characters remain.
fn short_form(name: &str) -> Option<&str> {
    ADMIN_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|short| short.chars().count() >= 2)
}

fn is_leading_junk(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            ',' | '，' | ';' | '；' | '、' | ':' | '：' | '.' | '。' | '-' | '—' | '·'
        )
}

fn leading_junk_len(text: &str) -> usize {
    text.len() - text.trim_start_matches(is_leading_junk).len()
}

fn strip_leading_prefix(text: &mut String, prefix: &str) {
    if !prefix.is_empty() && text.starts_with(prefix) {
        text.replace_range(..prefix.len(), "");
    }
}

/// Byte length of a leading run of short forms that ends at a full
/// province/city/district name, e.g. `北京` in `北京朝阳区`.
///
/// A run that does not reach a full name is kept: `朝阳公园` is a place, not `朝阳区`.
fn short_form_run_len(text: &str, components: &AddressComponents) -> usize {
    let mut pos = leading_junk_len(text);
    let mut consumed = false;

    for name in [
        &components.province,
        &components.city,
        &components.district,
    ] {
        if name.is_empty() {
            continue;
        }
        let rest = &text[pos..];
        if rest.starts_with(name.as_str()) {
            return if consumed { pos } else { 0 };
        }
        if let Some(short) = short_form(name).filter(|short| rest.starts_with(*short)) {
            pos += short.len();
            pos += leading_junk_len(&text[pos..]);
            consumed = true;
        }
    }

    0
}

/// One ordered pass over the full names: province, city, district, then a leading township.
fn strip_known_prefixes_once(text: &str, components: &AddressComponents) -> String {
    let mut rest = text.to_string();

    for name in [
        &components.province,
        &components.city,
        &components.district,
    ] {
        if name.is_empty() {
            continue;
        }
        if let Some(pos) = rest.find(name.as_str()) {
            rest.replace_range(pos..pos + name.len(), "");
        }
        rest = rest.trim_start_matches(is_leading_junk).to_string();
    }

    strip_leading_prefix(&mut rest, &components.township);

    let collapsed = WHITESPACE_RE.replace_all(&rest, " ");
    collapsed
        .trim_start_matches(is_leading_junk)
        .trim_end()
        .to_string()
}

/// Removes the administrative prefix from the cleaned input, leaving street/building/unit.
///
/// The province/city/district/township fields of `components` are used; `detail` is ignored.
/// Short forms (`北京`, `朝阳`) are dropped only as a leading run that ends at a full name.
/// Full names are then removed until none is left, so a result contains no
/// province/city/district name and running this on it again changes nothing.
pub fn extract_detail(cleaned: &str, components: &AddressComponents) -> String {
    let run = short_form_run_len(cleaned, components);
    let mut current = strip_known_prefixes_once(&cleaned[run..], components);
    loop {
        let next = strip_known_prefixes_once(&current, components);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Joins the components in fixed order, skipping any that are already contained.
pub fn assemble(components: &AddressComponents) -> String {
    let mut prefix = String::new();
    for part in [
        &components.province,
        &components.city,
        &components.district,
        &components.township,
    ] {
        let part = part.trim();
        if part.is_empty() || prefix.contains(part) {
            continue;
        }
        prefix.push_str(part);
    }

    let detail = components.detail.trim();
    if detail.is_empty() || prefix.contains(detail) {
        prefix
    } else if prefix.is_empty() {
        detail.to_string()
    } else {
        format!("{} {}", prefix, detail)
    }
}

pub fn compute_confidence(components: &AddressComponents, level: MatchLevel) -> u8 {
    let mut score = BASE_CONFIDENCE;
    for part in [&components.province, &components.city, &components.district] {
        if !part.is_empty() {
            score += 15;
        }
    }
    if !components.township.is_empty() {
        score += 10;
    }
    score += u32::from(level.confidence_bonus());
    score.min(100) as u8
}

fn is_usable(record: &GeocodeResult) -> bool {
    record.province.is_some() || record.city.is_some() || record.district.is_some()
}

/// Normalizer configured with the known-places map and the city short-name table.
#[derive(Debug, Clone)]
pub struct Normalizer {
    known_places: KnownPlaces,
    city_aliases: Vec<(String, String)>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(KnownPlaces::default())
    }
}

impl Normalizer {
    pub fn new(known_places: KnownPlaces) -> Self {
        Self {
            known_places,
            city_aliases: DEFAULT_CITY_ALIASES
                .iter()
                .map(|(short, full)| (short.to_string(), full.to_string()))
                .collect(),
        }
    }

    pub fn with_city_aliases(mut self, aliases: Vec<(String, String)>) -> Self {
        self.city_aliases = aliases;
        self
    }

    /// Full name of the major city mentioned earliest in the input, used to bias the geocoder.
    pub fn city_hint(&self, cleaned: &str) -> Option<&str> {
        self.city_aliases
            .iter()
            .filter_map(|(short, full)| cleaned.find(short.as_str()).map(|pos| (pos, full)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, full)| full.as_str())
    }

    /// Resolves the input against the configured known-places map.
    pub fn resolve_known(&self, cleaned: &str) -> Option<NormalizedAddress> {
        let (keyword, place) = self.known_places.lookup(cleaned)?;
        tracing::info!("Known place '{}' matched", keyword);

        let text = if place.detail.is_empty() {
            cleaned.to_string()
        } else {
            cleaned.replacen(keyword, &place.detail, 1)
        };

        let mut components = place.clone();
        components.detail = extract_detail(&text, &components);

        Some(NormalizedAddress {
            full_address: assemble(&components),
            components,
            confidence: 100,
            method: ResolutionMethod::KnownMapping,
            message: None,
            error_type: None,
            location: None,
        })
    }

    /// Picks the best usable candidate and turns it into a normalized address.
    ///
    /// Returns `None` when no candidate carries any administrative division.
    pub fn resolve_candidates(
        &self,
        cleaned: &str,
        candidates: Vec<GeocodeResult>,
        method: ResolutionMethod,
    ) -> Option<NormalizedAddress> {
        let mut usable: Vec<GeocodeResult> = candidates.into_iter().filter(is_usable).collect();
        let index = select_best(cleaned, &usable)?;
        let record = usable.swap_remove(index);

        let verbatim = record
            .formatted_address
            .as_deref()
            .map(|formatted| contains_verbatim(formatted, cleaned))
            .unwrap_or(false);

        let mut components = AddressComponents {
            province: record.province.unwrap_or_default(),
            city: record.city.unwrap_or_default(),
            district: record.district.unwrap_or_default(),
            township: record.township.unwrap_or_default(),
            detail: String::new(),
        };
        components.detail = extract_detail(cleaned, &components);

        if components.detail.is_empty() && method == ResolutionMethod::PoiSearch {
            if let Some(street) = record.street_address {
                components.detail = extract_detail(&street, &components);
            }
        }

        let confidence = if verbatim {
            100
        } else {
            compute_confidence(&components, record.level)
        };

        Some(NormalizedAddress {
            full_address: assemble(&components),
            components,
            confidence,
            method,
            message: None,
            error_type: None,
            location: record.location,
        })
    }

    /// Expands a leading city short name that lacks its suffix, e.g. `北京朝阳区` to `北京市朝阳区`.
    pub fn expand_city_short_name(&self, cleaned: &str) -> Option<(String, String, String)> {
        self.city_aliases.iter().find_map(|(short, full)| {
            let rest = cleaned.strip_prefix(short.as_str())?;
            let suffix = full
                .strip_prefix(short.as_str())
                .filter(|suffix| !suffix.is_empty());
            if suffix.is_some_and(|suffix| rest.starts_with(suffix)) {
                return None;
            }
            let rest = rest.trim_start_matches(is_leading_junk);
            Some((format!("{}{}", full, rest), full.clone(), rest.to_string()))
        })
    }

    /// Last-resort result after both lookups failed or found nothing.
    ///
    /// `cause` is the most recent recoverable error; `None` means a plain no-match.
    pub fn fallback(&self, cleaned: &str, cause: Option<&AppError>) -> NormalizedAddress {
        let message = cause
            .map(AppError::user_message)
            .unwrap_or_else(|| NO_MATCH_MESSAGE.to_string());
        let error_type = cause.map(|e| e.error_type().to_string());

        if let Some((expanded, city, rest)) = self.expand_city_short_name(cleaned) {
            tracing::info!("Fallback table expanded city short name to {}", city);
            return NormalizedAddress {
                full_address: expanded,
                components: AddressComponents {
                    city,
                    detail: rest,
                    ..AddressComponents::default()
                },
                confidence: FALLBACK_TABLE_CONFIDENCE,
                method: ResolutionMethod::FallbackTable,
                message: Some(message),
                error_type,
                location: None,
            };
        }

        NormalizedAddress {
            full_address: cleaned.to_string(),
            components: AddressComponents {
                detail: cleaned.to_string(),
                ..AddressComponents::default()
            },
            confidence: FALLBACK_CONFIDENCE,
            method: ResolutionMethod::Fallback,
            message: Some(message),
            error_type,
            location: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(province: &str, city: &str, district: &str, township: &str) -> GeocodeResult {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        GeocodeResult {
            province: opt(province),
            city: opt(city),
            district: opt(district),
            township: opt(township),
            formatted_address: Some(format!("{}{}{}{}", province, city, district, township)),
            level: MatchLevel::Other,
            location: None,
            street_address: None,
        }
    }

    fn components(province: &str, city: &str, district: &str, township: &str) -> AddressComponents {
        AddressComponents {
            province: province.into(),
            city: city.into(),
            district: district.into(),
            township: township.into(),
            detail: String::new(),
        }
    }

    #[test]
    fn test_clean_input() {
        assert_eq!(clean_input("  北京市，朝阳区；绿地中心  "), "北京市朝阳区绿地中心");
        assert_eq!(clean_input("a,b;c、d"), "abcd");
        assert_eq!(clean_input("北京市   朝阳区\t\n大厦"), "北京市 朝阳区 大厦");
        assert_eq!(clean_input(" ，， "), "");
    }

    #[test]
    fn test_split_segments() {
        assert_eq!(
            split_segments("北京市朝阳区绿地中心大厦"),
            vec!["北京市", "朝阳区", "绿地中心大厦"]
        );
        assert_eq!(
            split_segments("浙江省杭州市西湖区西溪街道文三路"),
            vec!["浙江省", "杭州市", "西湖区", "西溪街道", "文三路"]
        );
        assert_eq!(split_segments("某个不存在的地方"), vec!["某个不存在的地方"]);
    }

    #[test]
    fn test_select_best_prefers_segment_matches() {
        let input = "上海市浦东新区世纪大道100号";
        let candidates = vec![
            record("江苏省", "苏州市", "工业园区", ""),
            record("上海市", "上海市", "浦东新区", ""),
        ];
        assert_eq!(select_best(input, &candidates), Some(1));
    }

    #[test]
    fn test_select_best_uses_level_and_keeps_first_on_tie() {
        let mut first = record("北京市", "北京市", "朝阳区", "");
        let mut second = first.clone();
        assert_eq!(select_best("北京市朝阳区", &[first.clone(), second.clone()]), Some(0));

        first.level = MatchLevel::County;
        second.level = MatchLevel::Exact;
        assert_eq!(select_best("北京市朝阳区", &[first, second]), Some(1));
    }

    #[test]
    fn test_select_best_empty() {
        assert_eq!(select_best("北京", &[]), None);
    }

    #[test]
    fn test_extract_detail_removes_prefixes_in_order() {
        let parts = components("北京市", "北京市", "朝阳区", "");
        assert_eq!(extract_detail("北京市朝阳区绿地中心大厦", &parts), "绿地中心大厦");
    }

    #[test]
    fn test_extract_detail_short_forms_and_township() {
        let parts = components("浙江省", "杭州市", "西湖区", "西溪街道");
        assert_eq!(extract_detail("杭州西湖区西溪街道文三路90号", &parts), "文三路90号");
        assert_eq!(extract_detail("浙江杭州西湖区文三路", &parts), "文三路");
        // No full name follows, so the short forms may belong to a place name
        assert_eq!(extract_detail("浙江杭州西湖文三路", &parts), "浙江杭州西湖文三路");
    }

    #[test]
    fn test_extract_detail_keeps_place_names_starting_with_short_forms() {
        let parts = components("北京市", "北京市", "朝阳区", "");
        assert_eq!(extract_detail("北京市朝阳区朝阳公园", &parts), "朝阳公园");
        assert_eq!(extract_detail("朝阳公园", &parts), "朝阳公园");
        assert_eq!(extract_detail("北京市朝阳区北京饭店", &parts), "北京饭店");
        assert_eq!(extract_detail("北京朝阳区朝阳公园", &parts), "朝阳公园");

        let haidian = components("北京市", "北京市", "海淀区", "");
        assert_eq!(extract_detail("北京市海淀区海淀黄庄", &haidian), "海淀黄庄");
        assert_eq!(extract_detail("海淀黄庄", &haidian), "海淀黄庄");
    }

    #[test]
    fn test_extract_detail_strips_leading_punctuation() {
        let parts = components("广东省", "深圳市", "南山区", "");
        assert_eq!(extract_detail("广东省深圳市 南山区 - 科技园", &parts), "科技园");
    }

    #[test]
    fn test_extract_detail_is_idempotent() {
        let parts = components("河北省", "石家庄市", "长安区", "");
        let once = extract_detail("石家庄市河北长安区中山东路", &parts);
        assert_eq!(extract_detail(&once, &parts), once);
    }

    #[test]
    fn test_assemble_municipality() {
        let mut parts = components("北京市", "北京市", "朝阳区", "");
        parts.detail = "绿地中心大厦".into();
        assert_eq!(assemble(&parts), "北京市朝阳区 绿地中心大厦");
    }

    #[test]
    fn test_assemble_without_detail_or_prefix() {
        let parts = components("北京市", "北京市", "朝阳区", "望京街道");
        assert_eq!(assemble(&parts), "北京市朝阳区望京街道");

        let detail_only = AddressComponents {
            detail: "绿地中心".into(),
            ..AddressComponents::default()
        };
        assert_eq!(assemble(&detail_only), "绿地中心");
    }

    #[test]
    fn test_confidence_scoring() {
        let full = components("北京市", "北京市", "朝阳区", "望京街道");
        assert_eq!(compute_confidence(&full, MatchLevel::Other), 100);

        let partial = components("北京市", "北京市", "朝阳区", "");
        assert_eq!(compute_confidence(&partial, MatchLevel::Other), 95);
        assert_eq!(compute_confidence(&partial, MatchLevel::Matched), 100);

        let empty = AddressComponents::default();
        assert_eq!(compute_confidence(&empty, MatchLevel::Exact), 70);
    }

    #[test]
    fn test_resolve_candidates_scenario() {
        let normalizer = Normalizer::default();
        let mut candidate = record("北京市", "北京市", "朝阳区", "");
        candidate.formatted_address = Some("北京市朝阳区".into());

        let result = normalizer
            .resolve_candidates(
                "北京市朝阳区绿地中心大厦",
                vec![candidate],
                ResolutionMethod::Geocode,
            )
            .unwrap();

        assert_eq!(result.full_address, "北京市朝阳区 绿地中心大厦");
        assert_eq!(result.components.detail, "绿地中心大厦");
        assert_eq!(result.components.township, "");
        assert_eq!(result.method, ResolutionMethod::Geocode);
        assert_eq!(result.confidence, 95);
    }

    #[test]
    fn test_resolve_candidates_verbatim_is_full_confidence() {
        let normalizer = Normalizer::default();
        let mut candidate = record("北京市", "北京市", "朝阳区", "");
        candidate.formatted_address = Some("北京市朝阳区望京街道绿地中心".into());

        let result = normalizer
            .resolve_candidates("望京街道 绿地中心", vec![candidate], ResolutionMethod::Geocode)
            .unwrap();

        assert_eq!(result.confidence, 100);
    }

    #[test]
    fn test_resolve_candidates_skips_unusable_records() {
        let normalizer = Normalizer::default();
        let empty = GeocodeResult {
            province: None,
            city: None,
            district: None,
            township: None,
            formatted_address: Some("某地".into()),
            level: MatchLevel::Exact,
            location: None,
            street_address: None,
        };
        assert!(normalizer
            .resolve_candidates("某地", vec![empty], ResolutionMethod::Geocode)
            .is_none());
    }

    #[test]
    fn test_poi_street_used_when_input_has_no_detail() {
        let normalizer = Normalizer::default();
        let mut poi = record("北京市", "北京市", "朝阳区", "");
        poi.street_address = Some("望京街10号".into());

        let result = normalizer
            .resolve_candidates("北京市朝阳区", vec![poi], ResolutionMethod::PoiSearch)
            .unwrap();

        assert_eq!(result.full_address, "北京市朝阳区 望京街10号");
    }

    #[test]
    fn test_resolve_candidates_keeps_full_place_name() {
        let normalizer = Normalizer::default();
        let candidate = record("北京市", "北京市", "朝阳区", "");

        let result = normalizer
            .resolve_candidates("北京市朝阳区朝阳公园", vec![candidate], ResolutionMethod::Geocode)
            .unwrap();

        assert_eq!(result.components.detail, "朝阳公园");
        assert_eq!(result.full_address, "北京市朝阳区 朝阳公园");
    }

    #[test]
    fn test_city_hint_picks_earliest_city() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.city_hint("上海南京路步行街"), Some("上海市"));
        assert_eq!(normalizer.city_hint("某个不存在的地方"), None);
    }

    #[test]
    fn test_fallback_table_expansion() {
        let normalizer = Normalizer::default();
        let result = normalizer.fallback("北京朝阳某小区", None);

        assert_eq!(result.full_address, "北京市朝阳某小区");
        assert_eq!(result.method, ResolutionMethod::FallbackTable);
        assert_eq!(result.confidence, FALLBACK_TABLE_CONFIDENCE);
        assert_eq!(result.components.city, "北京市");
    }

    #[test]
    fn test_fallback_does_not_expand_when_suffix_present() {
        let normalizer = Normalizer::default();
        let result = normalizer.fallback("北京市某处", None);

        assert_eq!(result.method, ResolutionMethod::Fallback);
        assert_eq!(result.full_address, "北京市某处");
    }

    #[test]
    fn test_fallback_no_match() {
        let normalizer = Normalizer::default();
        let result = normalizer.fallback("某个不存在的地方", None);

        assert_eq!(result.full_address, "某个不存在的地方");
        assert_eq!(result.method, ResolutionMethod::Fallback);
        assert!(result.confidence <= 30);
        assert_eq!(result.message.as_deref(), Some(NO_MATCH_MESSAGE));
        assert!(result.error_type.is_none());
    }

    #[test]
    fn test_fallback_carries_cause() {
        let normalizer = Normalizer::default();
        let cause = AppError::Timeout("deadline".into());
        let result = normalizer.fallback("某个不存在的地方", Some(&cause));

        assert_eq!(result.error_type.as_deref(), Some("timeout"));
        assert_ne!(result.message.as_deref(), Some(NO_MATCH_MESSAGE));
    }
}
