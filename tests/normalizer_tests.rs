/// Unit tests for address normalization
/// Tests cleaning, candidate selection, detail extraction and assembly workflows
use rust_address_api::known_places::KnownPlaces;
use rust_address_api::models::{
    AddressComponents, GeocodeResult, MatchLevel, ResolutionMethod,
};
use rust_address_api::normalizer::{assemble, clean_input, extract_detail, Normalizer};

fn candidate(formatted: &str, province: &str, city: &str, district: &str, level: &str) -> GeocodeResult {
    let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
    GeocodeResult {
        province: opt(province),
        city: opt(city),
        district: opt(district),
        township: None,
        formatted_address: opt(formatted),
        level: MatchLevel::from_tag(Some(level)),
        location: None,
        street_address: None,
    }
}

#[cfg(test)]
mod cleaning_tests {
    use super::*;

    #[test]
    fn test_ideographic_separators_removed() {
        assert_eq!(
            clean_input("广东省，深圳市；南山区、科技园"),
            "广东省深圳市南山区科技园"
        );
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(clean_input("\t上海市  浦东新区\u{3000}世纪大道 "), "上海市 浦东新区 世纪大道");
    }
}

#[cfg(test)]
mod selection_tests {
    use super::*;

    #[test]
    fn test_level_breaks_segment_tie() {
        let normalizer = Normalizer::default();
        let candidates = vec![
            candidate("四川省成都市武侯区", "四川省", "成都市", "武侯区", "区县"),
            candidate("四川省成都市武侯区", "四川省", "成都市", "武侯区", "住宅区"),
        ];

        let result = normalizer
            .resolve_candidates("成都市武侯区某小区", candidates, ResolutionMethod::Geocode)
            .unwrap();

        // Residential outranks county; neither earns a confidence bonus
        assert_eq!(result.confidence, 95);
        assert_eq!(result.full_address, "四川省成都市武侯区 某小区");
    }

    #[test]
    fn test_exact_level_bonus_capped() {
        let normalizer = Normalizer::default();
        let result = normalizer
            .resolve_candidates(
                "湖北省武汉市洪山区珞喻路1037号",
                vec![candidate("湖北省武汉市洪山区", "湖北省", "武汉市", "洪山区", "门牌号")],
                ResolutionMethod::Geocode,
            )
            .unwrap();

        assert_eq!(result.confidence, 100);
        assert_eq!(result.components.detail, "珞喻路1037号");
    }

    #[test]
    fn test_empty_candidates_yield_none() {
        let normalizer = Normalizer::default();
        assert!(normalizer
            .resolve_candidates("某地", vec![], ResolutionMethod::PoiSearch)
            .is_none());
    }
}

#[cfg(test)]
mod detail_tests {
    use super::*;

    fn beijing() -> AddressComponents {
        AddressComponents {
            province: "北京市".into(),
            city: "北京市".into(),
            district: "海淀区".into(),
            township: "中关村街道".into(),
            detail: String::new(),
        }
    }

    #[test]
    fn test_municipality_prefix_removed_once() {
        assert_eq!(
            extract_detail("北京市海淀区中关村街道中关村大街1号", &beijing()),
            "中关村大街1号"
        );
    }

    #[test]
    fn test_short_city_name_removed() {
        assert_eq!(extract_detail("北京海淀区中关村大街1号", &beijing()), "中关村大街1号");
    }

    #[test]
    fn test_detail_without_admin_prefix_untouched() {
        assert_eq!(extract_detail("中关村大街1号", &beijing()), "中关村大街1号");
    }

    #[test]
    fn test_place_named_after_district_keeps_its_name() {
        assert_eq!(extract_detail("北京市海淀区海淀黄庄", &beijing()), "海淀黄庄");
        assert_eq!(extract_detail("海淀黄庄", &beijing()), "海淀黄庄");
        assert_eq!(extract_detail("海淀公园东门", &beijing()), "海淀公园东门");
    }

    #[test]
    fn test_only_admin_text_leaves_empty_detail() {
        assert_eq!(extract_detail("北京市海淀区", &beijing()), "");
    }
}

#[cfg(test)]
mod assembly_tests {
    use super::*;

    #[test]
    fn test_township_included_when_present() {
        let components = AddressComponents {
            province: "广东省".into(),
            city: "深圳市".into(),
            district: "南山区".into(),
            township: "粤海街道".into(),
            detail: "科技园南区".into(),
        };
        assert_eq!(assemble(&components), "广东省深圳市南山区粤海街道 科技园南区");
    }

    #[test]
    fn test_detail_already_in_prefix_is_dropped() {
        let components = AddressComponents {
            province: "上海市".into(),
            city: "上海市".into(),
            district: "浦东新区".into(),
            township: String::new(),
            detail: "浦东新区".into(),
        };
        assert_eq!(assemble(&components), "上海市浦东新区");
    }
}

#[cfg(test)]
mod known_place_tests {
    use super::*;

    #[test]
    fn test_known_place_detail_replaces_keyword() {
        let places = KnownPlaces::from_json(
            r#"{"万象城": {"province": "广东省", "city": "深圳市", "district": "罗湖区", "detail": "华润万象城"}}"#,
        )
        .unwrap();
        let normalizer = Normalizer::new(places);

        let result = normalizer.resolve_known("万象城B1层").unwrap();
        assert_eq!(result.method, ResolutionMethod::KnownMapping);
        assert_eq!(result.confidence, 100);
        assert_eq!(result.full_address, "广东省深圳市罗湖区 华润万象城B1层");
    }

    #[test]
    fn test_unknown_input_not_resolved() {
        let normalizer = Normalizer::default();
        assert!(normalizer.resolve_known("万象城").is_none());
    }

    #[test]
    fn test_custom_city_aliases() {
        let normalizer = Normalizer::default()
            .with_city_aliases(vec![("厦门".to_string(), "厦门市".to_string())]);

        assert_eq!(normalizer.city_hint("北京厦门街"), Some("厦门市"));
        let result = normalizer.fallback("厦门思明区", None);
        assert_eq!(result.full_address, "厦门市思明区");
        assert_eq!(result.method, ResolutionMethod::FallbackTable);
    }
}
