// Behavioral tests for URL building and signing
//
// Expected values are the reference vectors a deployed Thumbor server
// accepts for the key `my-security-key`.

use rstest::rstest;
use std::collections::HashMap;
use thumbor_url::{
    CropBox, CryptoUrl, HAlign, LegacyDescriptor, TransformationRequest, Trim, TrimDirection,
    UrlError, VAlign,
};

const KEY: &str = "my-security-key";
const IMAGE: &str = "my.domain.com/some/image/url.jpg";
const IMAGE_MD5: &str = "f33af67e41168e80fcc5b00f8bd8061a";

fn crypto() -> CryptoUrl {
    CryptoUrl::new(KEY).unwrap()
}

fn request() -> TransformationRequest {
    TransformationRequest::new(IMAGE)
}

fn hashed(prefix: &str) -> String {
    format!("{}{}", prefix, IMAGE_MD5)
}

fn encrypted_segment(url: &str) -> &str {
    url.split('/').nth(1).unwrap()
}

// ============================================================================
// url_for
// ============================================================================

#[test]
fn test_url_for_returns_hash_only_without_options() {
    assert_eq!(crypto().url_for(&request()).unwrap(), IMAGE_MD5);
}

#[test]
fn test_url_for_without_image_fails() {
    let err = crypto()
        .url_for(&TransformationRequest::default())
        .unwrap_err();
    assert_eq!(err, UrlError::MissingImage);
}

#[rstest]
#[case::width_only(request().with_width(300), "300x0/")]
#[case::height_only(request().with_height(300), "0x300/")]
#[case::width_and_height(request().with_size(200, 300), "200x300/")]
#[case::smart(request().with_size(200, 300).smart(), "200x300/smart/")]
#[case::fit_in(request().with_size(200, 300).fit_in(), "fit-in/200x300/")]
#[case::flip_without_size(request().flip(), "-0x0/")]
#[case::flop_without_size(request().flop(), "0x-0/")]
#[case::flip_flop_without_size(request().flip().flop(), "-0x-0/")]
#[case::flip_with_width(request().with_width(300).flip(), "-300x0/")]
#[case::flop_with_height(request().with_height(300).flop(), "0x-300/")]
#[case::halign(request().with_halign(HAlign::Left), "left/")]
#[case::halign_center_suppressed(request().with_halign(HAlign::Center), "")]
#[case::valign(request().with_valign(VAlign::Top), "top/")]
#[case::valign_middle_suppressed(request().with_valign(VAlign::Middle), "")]
#[case::both_aligns(request().with_halign(HAlign::Left).with_valign(VAlign::Top), "left/top/")]
#[case::meta(request().meta(), "meta/")]
#[case::crop(request().with_crop(10, 20, 30, 40), "10x20:30x40/")]
#[case::zero_crop_ignored(request().with_crop(0, 0, 0, 0), "")]
#[case::smart_after_aligns(
    request().with_halign(HAlign::Left).with_valign(VAlign::Top).smart(),
    "left/top/smart/"
)]
#[case::empty_filters_ignored(TransformationRequest { filters: vec![], ..request() }, "")]
#[case::filters_in_order(
    request().with_filter("quality(20)").with_filter("brightness(10)"),
    "filters:quality(20):brightness(10)/"
)]
#[case::trim(request().with_trim(Trim::Enabled), "trim/")]
#[case::trim_direction(
    request().with_trim(Trim::Direction(TrimDirection::BottomRight)),
    "trim:bottom-right/"
)]
#[case::trim_direction_tolerance(
    request().with_trim(Trim::DirectionTolerance(TrimDirection::BottomRight, 15)),
    "trim:bottom-right:15/"
)]
#[case::negative_width_literal(request().with_size(-50, 40), "-50x40/")]
fn test_url_for_segments(#[case] request: TransformationRequest, #[case] prefix: &str) {
    assert_eq!(crypto().url_for(&request).unwrap(), hashed(prefix));
}

#[rstest]
#[case::horizontal_left(40, 50, (0.0, 50.0), "0x0:80x100/40x50/")]
#[case::horizontal_right(40, 50, (100.0, 50.0), "20x0:100x100/40x50/")]
#[case::horizontal_center(40, 50, (50.0, 50.0), "10x0:90x100/40x50/")]
#[case::vertical_top(50, 40, (50.0, 0.0), "0x0:100x80/50x40/")]
#[case::vertical_bottom(50, 40, (50.0, 100.0), "0x20:100x100/50x40/")]
#[case::vertical_center(50, 40, (50.0, 50.0), "0x10:100x90/50x40/")]
#[case::no_crop_needed(50, 50, (50.0, 0.0), "50x50/")]
#[case::negative_width(-50, 40, (50.0, 50.0), "0x10:100x90/-50x40/")]
#[case::negative_height(50, -40, (50.0, 50.0), "0x10:100x90/50x-40/")]
#[case::negative_both(-50, -40, (50.0, 50.0), "0x10:100x90/-50x-40/")]
fn test_auto_crop(
    #[case] width: i32,
    #[case] height: i32,
    #[case] center: (f64, f64),
    #[case] prefix: &str,
) {
    let request = request()
        .with_original_size(100, 100)
        .with_size(width, height)
        .with_center(center);
    assert_eq!(crypto().url_for(&request).unwrap(), hashed(prefix));
}

#[test]
fn test_auto_crop_same_size_as_original_is_noop() {
    let request = request()
        .with_original_size(640, 480)
        .with_size(640, 480)
        .with_center((0.0, 0.0));
    assert_eq!(crypto().url_for(&request).unwrap(), hashed("640x480/"));
}

#[test]
fn test_auto_crop_skipped_without_original_height() {
    let mut request = request().with_size(50, 40).with_center((50.0, 50.0));
    request.original_width = Some(100);
    assert_eq!(crypto().url_for(&request).unwrap(), hashed("50x40/"));
}

#[test]
fn test_auto_crop_skipped_without_original_width() {
    let mut request = request().with_size(50, 40).with_center((50.0, 50.0));
    request.original_height = Some(100);
    assert_eq!(crypto().url_for(&request).unwrap(), hashed("50x40/"));
}

#[test]
fn test_auto_crop_skipped_without_requested_size() {
    let request = request()
        .with_original_size(100, 100)
        .with_center((50.0, 50.0));
    assert_eq!(crypto().url_for(&request).unwrap(), IMAGE_MD5);
}

#[test]
fn test_auto_crop_uses_original_width_when_missing() {
    let request = request()
        .with_original_size(100, 100)
        .with_height(80)
        .with_center((50.0, 50.0));
    assert_eq!(
        crypto().url_for(&request).unwrap(),
        hashed("0x10:100x90/0x80/")
    );
}

#[test]
fn test_auto_crop_uses_original_height_when_missing() {
    let request = request()
        .with_original_size(100, 100)
        .with_width(80)
        .with_center((50.0, 50.0));
    assert_eq!(
        crypto().url_for(&request).unwrap(),
        hashed("10x0:90x100/80x0/")
    );
}

#[test]
fn test_bad_center_fails_before_output() {
    let params: HashMap<String, String> = [
        ("image", IMAGE),
        ("original_width", "100"),
        ("original_height", "100"),
        ("width", "50"),
        ("height", "40"),
        ("center", "50"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let err = TransformationRequest::from_query(&params).unwrap_err();
    assert!(matches!(err, UrlError::InvalidArgument { .. }));

    let request = request()
        .with_original_size(100, 100)
        .with_size(50, 40)
        .with_center((f64::INFINITY, 50.0));
    assert!(matches!(
        crypto().url_for(&request),
        Err(UrlError::InvalidArgument { .. })
    ));
}

// ============================================================================
// generate (HMAC)
// ============================================================================

#[rstest]
#[case::image_only(request(), "/964rCTkAEDtvjy_a572k7kRa0SU=/my.domain.com/some/image/url.jpg")]
#[case::size(
    request().with_size(300, 200),
    "/TQfyd3H36Z3srcNcLOYiM05YNO8=/300x200/my.domain.com/some/image/url.jpg"
)]
#[case::meta(
    request().with_size(300, 200).meta(),
    "/YBQEWd3g_WRMnVEG73zfzcr8Zj0=/meta/300x200/my.domain.com/some/image/url.jpg"
)]
#[case::smart(
    request().with_size(300, 200).meta().smart(),
    "/jP89J0qOWHgPlm_lOA28GtOh5GU=/meta/300x200/smart/my.domain.com/some/image/url.jpg"
)]
#[case::fit_in(
    request().with_size(300, 200).meta().smart().fit_in(),
    "/zrrOh_TtTs4kiLLEQq1w4bcTYdc=/meta/fit-in/300x200/smart/my.domain.com/some/image/url.jpg"
)]
#[case::flip(
    request().with_size(300, 200).meta().smart().fit_in().flip(),
    "/4t1XK1KH43cOb1QJ9tU00-W2_k8=/meta/fit-in/-300x200/smart/my.domain.com/some/image/url.jpg"
)]
#[case::flip_flop(
    request().with_size(300, 200).meta().smart().fit_in().flip().flop(),
    "/HJnvjZU69PkPOhyZGu-Z3Uc_W_A=/meta/fit-in/-300x-200/smart/my.domain.com/some/image/url.jpg"
)]
#[case::filters(
    request().with_filter("quality(20)").with_filter("brightness(10)"),
    "/q0DiFg-5-eFZIqyN3lRoCvg2K0s=/filters:quality(20):brightness(10)/my.domain.com/some/image/url.jpg"
)]
#[case::aligns(
    request().with_halign(HAlign::Left).with_valign(VAlign::Top).smart(),
    "/KS6mVuzlGE3hJ75n3JUonfGgSFM=/left/top/smart/my.domain.com/some/image/url.jpg"
)]
#[case::trim(
    request().with_trim(Trim::DirectionTolerance(TrimDirection::BottomRight, 15)),
    "/TUCEIhtWfI1Uv9zjavCSl_i0A_8=/trim:bottom-right:15/my.domain.com/some/image/url.jpg"
)]
#[case::crop_fit_in_flip(
    request().with_crop(10, 20, 30, 40).fit_in().flip(),
    "/_4Y0XvTymvqTKLvgxr1W1Txi660=/10x20:30x40/fit-in/-0x0/my.domain.com/some/image/url.jpg"
)]
fn test_generate_hmac(#[case] request: TransformationRequest, #[case] expected: &str) {
    assert_eq!(crypto().generate(&request).unwrap(), expected);
}

#[test]
fn test_generate_is_deterministic() {
    let request = request().with_size(300, 200).smart();
    let first = crypto().generate(&request).unwrap();
    let second = CryptoUrl::new(KEY).unwrap().generate(&request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_generated_url_validates() {
    let crypto = crypto();
    let url = crypto
        .generate(&request().with_size(300, 200).with_filter("quality(20)"))
        .unwrap();
    assert!(crypto.validate(&url).is_ok());

    let tampered = url.replace("300x200", "300x201");
    assert_eq!(crypto.validate(&tampered), Err(UrlError::InvalidSignature));

    let other = CryptoUrl::new("another-key").unwrap();
    assert_eq!(other.validate(&url), Err(UrlError::InvalidSignature));
}

// ============================================================================
// generate (legacy)
// ============================================================================

#[test]
fn test_generate_legacy_known_vector() {
    let url = crypto()
        .generate(&request().with_size(300, 200).legacy())
        .unwrap();
    assert_eq!(
        url,
        format!(
            "/qkLDiIbvtiks0Up9n5PACtmpOfX6dPXw4vP4kJU-jTfyF6y1GJBJyp7CHYh1H3R2/{}",
            IMAGE
        )
    );
}

#[rstest]
#[case::image_only(request(), "CDxCJT0ZmRlFAnX4cSpdkvVM9cB4m8sk2UUHOaYGy6_lXXGXm2Ux9PV6we7enK02")]
#[case::all_flags(
    request()
        .with_size(300, 200)
        .meta()
        .smart()
        .fit_in()
        .flip()
        .flop()
        .with_halign(HAlign::Left)
        .with_valign(VAlign::Top),
    "muNJPGZhUWNlAzz_xa2EaJ1r2113_6aJ_r6cXxcNvPNzWc3XFl4y_GA7zme40tTn-wXcR4G_0jo3cAnwb_64ujJheDOJliZRuVqOIxXC2IQ="
)]
#[case::crop(
    request().with_size(300, 200).with_crop(10, 20, 30, 40),
    "JmaGsfyeMYw3uYcLkClG1myVMrhdiIP_LWuKehqJZAeoJF1_LLBXRkVDOCo4srAVYqO4mSHWiHMQBtZSQBjNlQ=="
)]
#[case::filters(
    request().with_filter("quality(20)").with_filter("brightness(10)"),
    "dr2ptArTJrG-9oFNMkTYCWW3UKJhpYW4TFg8NOFmQDsDGhuMtEdI0pedfgzosgGbeochXlEtrWY1wHYdO4UC-nE_s4NJrBKBUGfV9RI3F24="
)]
fn test_sign_legacy_vectors(#[case] request: TransformationRequest, #[case] segment: &str) {
    let url = crypto().sign_legacy(&request).unwrap();
    assert_eq!(url, format!("/{}/{}", segment, IMAGE));
}

#[test]
fn test_legacy_decodes_defaults() {
    let crypto = crypto();
    let url = crypto
        .generate(&request().with_size(300, 200).legacy())
        .unwrap();

    let decoded = crypto.decode_legacy(encrypted_segment(&url)).unwrap();
    assert!(!decoded.horizontal_flip);
    assert!(!decoded.vertical_flip);
    assert!(!decoded.smart);
    assert!(!decoded.meta);
    assert!(!decoded.fit_in);
    assert_eq!(decoded.crop, CropBox::default());
    assert_eq!(decoded.halign, HAlign::Center);
    assert_eq!(decoded.valign, VAlign::Middle);
    assert_eq!(decoded.image_hash, IMAGE_MD5);
    assert_eq!(decoded.width, 300);
    assert_eq!(decoded.height, 200);
    assert_eq!(decoded.filters, "");
}

#[rstest]
#[case::meta(request().with_size(300, 200).meta())]
#[case::smart(request().with_size(300, 200).meta().smart())]
#[case::fit_in(request().with_size(300, 200).fit_in())]
#[case::flip(request().with_size(300, 200).meta().smart().flip())]
#[case::flop(request().with_size(300, 200).meta().smart().flip().flop())]
#[case::halign(request().with_size(300, 200).flip().flop().with_halign(HAlign::Left))]
#[case::valign(
    request()
        .with_size(300, 200)
        .with_halign(HAlign::Right)
        .with_valign(VAlign::Top)
)]
#[case::crop(request().with_size(300, 200).with_crop(10, 20, 30, 40))]
#[case::auto_crop(
    request()
        .with_original_size(100, 100)
        .with_size(40, 50)
        .with_center((0.0, 50.0))
)]
#[case::filters(request().with_filter("quality(20)").with_filter("brightness(10)"))]
#[case::trim(request().with_trim(Trim::Direction(TrimDirection::TopLeft)))]
#[case::negative_size(request().with_size(-300, -200))]
fn test_legacy_round_trip(#[case] request: TransformationRequest) {
    let crypto = crypto();
    let url = crypto.sign_legacy(&request).unwrap();
    assert!(url.ends_with(&format!("/{}", IMAGE)));

    let decoded = crypto.decode_legacy(encrypted_segment(&url)).unwrap();
    let expected = LegacyDescriptor::from_request(&request).unwrap();
    assert_eq!(decoded, expected);

    let width = request.width.unwrap_or(0);
    let height = request.height.unwrap_or(0);
    assert_eq!(decoded.width, width.unsigned_abs());
    assert_eq!(decoded.height, height.unsigned_abs());
    assert_eq!(decoded.horizontal_flip, request.flip || width < 0);
    assert_eq!(decoded.vertical_flip, request.flop || height < 0);
    assert_eq!(decoded.smart, request.smart);
    assert_eq!(decoded.meta, request.meta);
    assert_eq!(decoded.fit_in, request.fit_in);
    assert_eq!(decoded.halign, request.halign);
    assert_eq!(decoded.valign, request.valign);
    assert_eq!(decoded.image_hash, IMAGE_MD5);
    assert_eq!(decoded.filters, request.filters.join(":"));
    assert_eq!(decoded.trim, request.trim);
}

#[test]
fn test_legacy_decodes_auto_crop_box() {
    let crypto = crypto();
    let request = request()
        .with_original_size(100, 100)
        .with_size(40, 50)
        .with_center((100.0, 50.0));
    let url = crypto.sign_legacy(&request).unwrap();

    let decoded = crypto.decode_legacy(encrypted_segment(&url)).unwrap();
    assert_eq!(decoded.crop, CropBox::new(20, 0, 100, 100));
}

#[test]
fn test_legacy_decode_with_wrong_key_fails() {
    let url = crypto()
        .sign_legacy(&request().with_size(300, 200))
        .unwrap();

    let other = CryptoUrl::new("a-different-key!").unwrap();
    assert!(matches!(
        other.decode_legacy(encrypted_segment(&url)),
        Err(UrlError::Decode { .. })
    ));
}

#[test]
fn test_legacy_decode_rejects_truncated_ciphertext() {
    let url = crypto()
        .sign_legacy(&request().with_size(300, 200))
        .unwrap();
    let segment = encrypted_segment(&url);

    assert!(matches!(
        crypto().decode_legacy(&segment[..segment.len() - 4]),
        Err(UrlError::Decode { .. })
    ));
}

#[test]
fn test_legacy_decode_accepts_unpadded_base64() {
    let crypto = crypto();
    let url = crypto
        .sign_legacy(&request().with_filter("quality(20)").with_filter("brightness(10)"))
        .unwrap();
    let segment = encrypted_segment(&url).trim_end_matches('=');

    let decoded = crypto.decode_legacy(segment).unwrap();
    assert_eq!(decoded.filters, "quality(20):brightness(10)");
}

#[test]
fn test_legacy_filters_with_newline_round_trip() {
    let crypto = crypto();
    let url = crypto
        .sign_legacy(&request().with_filter("watermark(a\nb)"))
        .unwrap();

    let decoded = crypto.decode_legacy(encrypted_segment(&url)).unwrap();
    assert_eq!(decoded.filters, "watermark(a\nb)");
    assert_eq!(decoded.image_hash, IMAGE_MD5);
}

#[test]
fn test_empty_key_is_rejected_for_both_modes() {
    assert!(matches!(
        CryptoUrl::new(""),
        Err(UrlError::InvalidArgument { ref param, .. }) if param == "key"
    ));
    assert!(CryptoUrl::new(Vec::<u8>::new()).is_err());
}

#[test]
fn test_auto_crop_rejects_original_size_beyond_i32() {
    let request = request()
        .with_original_size(3_000_000_000, 3_000_000_000)
        .with_size(50, 40)
        .with_center((1.5e9, 1.5e9));

    assert!(matches!(
        crypto().url_for(&request),
        Err(UrlError::InvalidArgument { .. })
    ));
    assert!(crypto().sign_legacy(&request).is_err());
}
