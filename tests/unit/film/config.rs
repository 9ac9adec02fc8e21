use super::*;
use crate::film::passes::AovType;

fn parse(json: &str) -> LumenResult<BufferConfig> {
    BufferConfig::from_reader(json.as_bytes())
}

#[test]
fn parses_minimal_config_and_fills_frame_defaults() {
    let cfg = parse(r#"{ "width": 8, "height": 4, "layout": { "passes": ["combined", "depth"] } }"#)
        .unwrap();
    let params = cfg.to_params().unwrap();
    assert_eq!((params.width, params.height), (8, 4));
    assert_eq!((params.full_width, params.full_height), (8, 4));
    assert_eq!(params.passes.size(), 5);
}

#[test]
fn parses_aovs_and_denoising() {
    let cfg = parse(
        r#"{
            "width": 2, "height": 2, "full_x": 2, "full_y": 1,
            "full_width": 16, "full_height": 16,
            "layout": {
                "passes": ["combined"],
                "aovs": [{ "name": "crypto", "kind": "cryptomatte" }],
                "denoising": { "store_clean": true }
            }
        }"#,
    )
    .unwrap();
    let params = cfg.to_params().unwrap();
    let aov = params.passes.get_aov("crypto").unwrap();
    assert_eq!(aov.aov.kind, AovType::Cryptomatte);
    assert_eq!(aov.offset, 4);
    assert_eq!(params.passes.denoising_offset(), Some(8));
    assert_eq!(params.passes.size(), 4 + 4 + 29);
}

#[test]
fn unknown_fields_and_pass_names_are_serde_errors() {
    assert!(matches!(
        parse(r#"{ "width": 1, "height": 1, "layout": {}, "bogus": 1 }"#),
        Err(LumenError::Serde(_))
    ));
    assert!(matches!(
        parse(r#"{ "width": 1, "height": 1, "layout": { "passes": ["beauty"] } }"#),
        Err(LumenError::Serde(_))
    ));
}

#[test]
fn geometry_is_validated() {
    let zero = parse(r#"{ "width": 0, "height": 1, "layout": {} }"#).unwrap();
    assert!(matches!(zero.to_params(), Err(LumenError::Validation(_))));

    let outside = parse(
        r#"{ "width": 4, "height": 4, "full_x": 2, "full_width": 4, "layout": {} }"#,
    )
    .unwrap();
    assert!(outside.to_params().is_err());

    let negative = parse(r#"{ "width": 1, "height": 1, "full_y": -1, "layout": {} }"#).unwrap();
    assert!(negative.to_params().is_err());
}

#[test]
fn default_frame_extent_past_u32_is_rejected() {
    let wide = parse(r#"{ "width": 4294967295, "height": 1, "full_x": 1, "layout": {} }"#).unwrap();
    assert!(matches!(wide.to_params(), Err(LumenError::Validation(_))));

    let tall = parse(r#"{ "width": 1, "height": 4294967295, "full_y": 2, "layout": {} }"#).unwrap();
    assert!(matches!(tall.to_params(), Err(LumenError::Validation(_))));
}

#[test]
fn duplicate_aov_names_fail_to_build() {
    let cfg = parse(
        r#"{ "width": 1, "height": 1, "layout": { "aovs": [
            { "name": "a", "kind": "float" }, { "name": "a", "kind": "rgb" }
        ] } }"#,
    )
    .unwrap();
    assert!(cfg.to_params().is_err());
}

#[test]
fn missing_file_is_a_validation_error() {
    let err = BufferConfig::from_path(Path::new("definitely/not/here.json")).unwrap_err();
    assert!(err.to_string().contains("open buffer config"));
}
