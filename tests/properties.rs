use pgstac_api::{
    merge, Code, LinkBuilder, Normalizer, Pagination, Params, Query, Request, Transport, MAX_LIMIT,
};
use proptest::prelude::*;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

fn normalize(query: &str) -> pgstac_api::Result<Query> {
    Normalizer::new().normalize_params(&Params::parse(query))
}

fn coordinate() -> impl Strategy<Value = f64> {
    -180.0..180.0f64
}

fn latitudes() -> impl Strategy<Value = (f64, f64)> {
    (-90.0..90.0f64, -90.0..90.0f64).prop_map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn json_object() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,4}", json_value(), 0..6)
        .prop_map(|map| map.into_iter().collect())
}

proptest! {
    #[test]
    fn well_formed_2d_bbox(
        west in coordinate(),
        east in coordinate(),
        (south, north) in latitudes(),
    ) {
        let bbox = vec![west, south, east, north];
        let query = normalize(&format!("bbox={}", join(&bbox))).unwrap();
        prop_assert_eq!(query.bbox, Some(bbox));
    }

    #[test]
    fn well_formed_3d_bbox(
        west in coordinate(),
        east in coordinate(),
        (south, north) in latitudes(),
        low in -1000.0..1000.0f64,
        high in -1000.0..1000.0f64,
    ) {
        let bbox = vec![west, south, low, east, north, high];
        let query = normalize(&format!("bbox={}", join(&bbox))).unwrap();
        prop_assert_eq!(query.bbox, Some(bbox));
    }

    #[test]
    fn inverted_latitudes(
        west in coordinate(),
        east in coordinate(),
        (south, north) in latitudes(),
    ) {
        prop_assume!(south < north);
        let bbox = [west, north, east, south];
        let err = normalize(&format!("bbox={}", join(&bbox))).unwrap_err();
        prop_assert_eq!(err.code(), Code::ParameterError);
    }

    #[test]
    fn bad_bbox_length(bbox in prop::collection::vec(-10.0..10.0f64, 1..10)) {
        prop_assume!(bbox.len() != 4 && bbox.len() != 6);
        let err = normalize(&format!("bbox={}", join(&bbox))).unwrap_err();
        prop_assert_eq!(err.code(), Code::ParameterError);
    }

    #[test]
    fn bbox_and_intersects(
        west in coordinate(),
        east in coordinate(),
        (south, north) in latitudes(),
    ) {
        let params = format!(
            "bbox={}&intersects={{\"type\":\"Point\",\"coordinates\":[0,0]}}",
            join(&[west, south, east, north])
        );
        let err = normalize(&params).unwrap_err();
        prop_assert_eq!(err.code(), Code::ParameterError);
        let body = serde_json::json!({
            "bbox": [west, south, east, north],
            "intersects": {"type": "Point", "coordinates": [0, 0]},
        });
        let err = Normalizer::new()
            .normalize_json(body.to_string().as_bytes())
            .unwrap_err();
        prop_assert_eq!(err.code(), Code::ParameterError);
    }

    #[test]
    fn large_limits_are_clamped(limit in (MAX_LIMIT + 1)..u64::MAX) {
        prop_assert_eq!(normalize(&format!("limit={}", limit)).unwrap().limit, MAX_LIMIT);
    }

    #[test]
    fn limits_in_range_are_kept(limit in 0..=MAX_LIMIT) {
        prop_assert_eq!(normalize(&format!("limit={}", limit)).unwrap().limit, limit);
    }

    #[test]
    fn negative_limits_fail(limit in i64::MIN..0) {
        let err = normalize(&format!("limit={}", limit)).unwrap_err();
        prop_assert_eq!(err.code(), Code::ParameterError);
    }

    #[test]
    fn unknown_filter_lang(lang in "[a-z0-9-]{1,12}") {
        prop_assume!(lang != "cql2-text" && lang != "cql2-json");
        let err = normalize(&format!("filter-lang={}", lang)).unwrap_err();
        prop_assert_eq!(err.code(), Code::ParameterError);
    }

    #[test]
    fn get_self_link_round_trips(
        limit in 0..=MAX_LIMIT,
        west in coordinate(),
        east in coordinate(),
        (south, north) in latitudes(),
    ) {
        let bbox = join(&[west, south, east, north]);
        let params = Params::parse(&format!("limit={}&bbox={}", limit, bbox));
        let query = Query::try_from(&params).unwrap();
        let link = LinkBuilder::new("http://stac.test")
            .query_link("self", "/search", Transport::Get(&params), &query, None)
            .unwrap();
        let (_, query_string) = link.href.split_once('?').unwrap();
        prop_assert_eq!(normalize(query_string).unwrap(), query);
    }

    #[test]
    fn next_without_previous(token in "next:[a-zA-Z0-9_-]{1,16}", limit in 1..100u64) {
        let request = Request::Get(Params::parse(&format!("limit={}", limit)));
        let query = Normalizer::new().normalize(&request).unwrap();
        let pagination = Pagination {
            next: Some(token),
            prev: None,
        };
        let links = LinkBuilder::new("http://stac.test")
            .search_links(request.transport(), &query, &pagination)
            .unwrap();
        prop_assert_eq!(links.iter().filter(|link| link.rel == "next").count(), 1);
        prop_assert_eq!(links.iter().filter(|link| link.rel == "previous").count(), 0);
    }

    #[test]
    fn empty_patch_is_identity(base in json_object()) {
        prop_assert_eq!(merge(&Map::new(), &base), base);
    }

    #[test]
    fn self_merge_is_identity(base in json_object()) {
        prop_assert_eq!(merge(&base, &base), base);
    }

    #[test]
    fn merged_keys_are_the_union(patch in json_object(), base in json_object()) {
        let merged = merge(&patch, &base);
        for key in patch.keys().chain(base.keys()) {
            prop_assert!(merged.contains_key(key));
        }
        let keys: BTreeSet<_> = patch.keys().chain(base.keys()).collect();
        prop_assert_eq!(merged.len(), keys.len());
    }
}
