//! Resolver and computation against the bundled catalogs.

use std::collections::BTreeSet;

use gishn_core::{Catalogs, Error};
use gishn_imagery::graph::ImageExpr;
use gishn_imagery::{
    compute_index, mask_s2_clouds, resolve_params, LazyImage, ParamResolver, ParamValue,
};

fn catalogs() -> Catalogs {
    Catalogs::bundled().expect("bundled catalogs should parse")
}

fn selected_band(value: &ParamValue<LazyImage>) -> Option<String> {
    match value {
        ParamValue::Band(img) => match img.expr() {
            ImageExpr::Select { bands, .. } if bands.len() == 1 => Some(bands[0].clone()),
            _ => None,
        },
        ParamValue::Constant(_) => None,
    }
}

#[test]
fn every_index_resolves_to_its_catalog_bands() {
    let c = catalogs();
    let img = LazyImage::load("COPERNICUS/S2_SR_HARMONIZED/20240601T000000_T30TVK");

    for (name, record) in &c.indices {
        let params = resolve_params(&c, name.as_str(), &img)
            .unwrap_or_else(|e| panic!("{} failed to resolve: {}", name, e));

        let keys: BTreeSet<&str> = params.keys().map(String::as_str).collect();
        let expected: BTreeSet<&str> = record.bands.iter().map(String::as_str).collect();
        assert_eq!(keys, expected, "parameter set of {}", name);

        for (param, value) in &params {
            if let Some(constant) = c.constants.get(param) {
                assert_eq!(value.as_constant(), Some(constant.default));
            } else {
                let code = c.bands[param].code("sentinel2a").map(str::to_string);
                assert_eq!(selected_band(value), code, "{} in {}", param, name);
            }
        }
    }
}

#[test]
fn ndvi_selects_b8_and_b4() {
    let c = catalogs();
    let img = LazyImage::load("s2");
    let params = resolve_params(&c, "NDVI", &img).unwrap();

    assert_eq!(params.len(), 2);
    assert_eq!(selected_band(&params["N"]).as_deref(), Some("B8"));
    assert_eq!(selected_band(&params["R"]).as_deref(), Some("B4"));
}

#[test]
fn union_of_several_indices() {
    let c = catalogs();
    let img = LazyImage::load("s2");
    let params = resolve_params(&c, ["NDVI", "EVI", "SAVI"], &img).unwrap();

    let keys: Vec<&str> = params.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["B", "C1", "C2", "L", "N", "R", "g"]);
    assert_eq!(params["g"], ParamValue::Constant(2.5));
}

#[test]
fn landsat8_codes() {
    let c = catalogs();
    let img = LazyImage::load("l8");
    let params = ParamResolver::new(&c)
        .with_platform("landsat8")
        .resolve("NBR", &img)
        .unwrap();
    assert_eq!(selected_band(&params["N"]).as_deref(), Some("B5"));
    assert_eq!(selected_band(&params["S2"]).as_deref(), Some("B7"));
}

#[test]
fn red_edge_is_not_on_landsat8() {
    let c = catalogs();
    let err = ParamResolver::new(&c)
        .with_platform("landsat8")
        .resolve("NDRE", &LazyImage::load("l8"))
        .unwrap_err();
    assert!(matches!(err, Error::MissingPlatformBand { .. }));
}

#[test]
fn masked_index_graph_serializes() {
    let c = catalogs();
    let img = mask_s2_clouds(&LazyImage::load("s2"));
    let params = resolve_params(&c, "NDVI", &img).unwrap();
    let out = compute_index(&c, img, "NDVI", &params).unwrap();

    let json = out.to_json().unwrap();
    assert_eq!(json["op"], "add_bands");
    assert_eq!(json["bands"]["op"], "rename");
    assert_eq!(json["bands"]["name"], "NDVI");
    assert_eq!(json["bands"]["input"]["formula"], "(N - R)/(N + R)");
}
