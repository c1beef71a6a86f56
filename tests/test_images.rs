//! Integration tests for image XObject decoding.
//!
//! Covers color space expansion, masks, photographic passthrough and
//! export through the public API.

use std::io::Cursor;

use annot_oxide::images::{
    decode_image_object, DecodedRaster, DefaultImageCodec, EncodedFormat, ImageCodec, ImageData, ImageLimits,
};
use annot_oxide::object::{Object, ObjectStore};

fn image_stream(width: i64, height: i64, extra: Vec<(&'static str, Object)>, data: Vec<u8>) -> Object {
    let mut entries = vec![
        ("Type", Object::name("XObject")),
        ("Subtype", Object::name("Image")),
        ("Width", Object::Integer(width)),
        ("Height", Object::Integer(height)),
    ];
    entries.extend(extra);
    Object::stream(entries, data)
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

#[test]
fn test_indexed_palette_lookup() {
    let store = ObjectStore::new();
    let palette = vec![255, 0, 0, 0, 255, 0];
    let obj = image_stream(
        1,
        1,
        vec![
            (
                "ColorSpace",
                Object::Array(vec![
                    Object::name("Indexed"),
                    Object::name("DeviceRGB"),
                    Object::Integer(1),
                    Object::String(palette),
                ]),
            ),
            ("BitsPerComponent", Object::Integer(8)),
        ],
        vec![1],
    );

    let outcome = decode_image_object(&store, &obj, &DefaultImageCodec, &ImageLimits::default());
    assert!(outcome.is_decoded());
    let image = outcome.into_option().unwrap();
    assert_eq!(image.raster().unwrap().pixels(), &[0, 255, 0, 255]);
}

#[test]
fn test_gray_decode_array_inverts() {
    let store = ObjectStore::new();
    let obj = image_stream(
        2,
        1,
        vec![
            ("ColorSpace", Object::name("DeviceGray")),
            ("BitsPerComponent", Object::Integer(8)),
            ("Decode", Object::numbers(&[1.0, 0.0])),
        ],
        vec![0, 255],
    );

    let image = decode_image_object(&store, &obj, &DefaultImageCodec, &ImageLimits::default())
        .into_option()
        .unwrap();
    let raster = image.raster().unwrap();
    assert_eq!(raster.pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(raster.pixel(1, 0), Some([0, 0, 0, 255]));
}

#[test]
fn test_cmyk_samples() {
    let store = ObjectStore::new();
    let obj = image_stream(
        2,
        1,
        vec![
            ("ColorSpace", Object::name("DeviceCMYK")),
            ("BitsPerComponent", Object::Integer(8)),
        ],
        vec![0, 0, 0, 0, 0, 0, 0, 255],
    );

    let image = decode_image_object(&store, &obj, &DefaultImageCodec, &ImageLimits::default())
        .into_option()
        .unwrap();
    let raster = image.raster().unwrap();
    assert_eq!(raster.pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(raster.pixel(1, 0), Some([0, 0, 0, 255]));
}

#[test]
fn test_missing_color_space_is_defaulted() {
    let store = ObjectStore::new();
    let obj = image_stream(1, 1, vec![("BitsPerComponent", Object::Integer(8))], vec![1, 2, 3]);

    let outcome = decode_image_object(&store, &obj, &DefaultImageCodec, &ImageLimits::default());
    assert!(outcome.is_defaulted());
    assert_eq!(outcome.value().unwrap().raster().unwrap().pixels(), &[1, 2, 3, 255]);
}

#[test]
fn test_short_data_is_padded() {
    let store = ObjectStore::new();
    let obj = image_stream(2, 1, vec![("ColorSpace", Object::name("DeviceRGB"))], vec![9, 9, 9]);

    let outcome = decode_image_object(&store, &obj, &DefaultImageCodec, &ImageLimits::default());
    assert!(outcome.is_defaulted());
    let raster = outcome.value().unwrap().raster().unwrap().clone();
    assert_eq!(raster.pixel(0, 0), Some([9, 9, 9, 255]));
    assert_eq!(raster.pixel(1, 0), Some([0, 0, 0, 255]));
}

#[test]
fn test_soft_mask_sets_alpha() {
    let mut store = ObjectStore::new();
    let mask = store.insert(
        5,
        image_stream(
            2,
            1,
            vec![
                ("ColorSpace", Object::name("DeviceGray")),
                ("BitsPerComponent", Object::Integer(8)),
            ],
            vec![0, 200],
        ),
    );
    let obj = image_stream(
        2,
        1,
        vec![
            ("ColorSpace", Object::name("DeviceRGB")),
            ("BitsPerComponent", Object::Integer(8)),
            ("SMask", Object::Reference(mask)),
        ],
        vec![10, 20, 30, 40, 50, 60],
    );

    let image = decode_image_object(&store, &obj, &DefaultImageCodec, &ImageLimits::default())
        .into_option()
        .unwrap();
    let raster = image.raster().unwrap();
    assert_eq!(raster.pixel(0, 0), Some([10, 20, 30, 0]));
    assert_eq!(raster.pixel(1, 0), Some([40, 50, 60, 200]));
}

#[test]
fn test_stencil_mask() {
    let store = ObjectStore::new();
    let obj = image_stream(
        2,
        1,
        vec![("ImageMask", Object::Boolean(true))],
        vec![0b0100_0000],
    );

    let image = decode_image_object(&store, &obj, &DefaultImageCodec, &ImageLimits::default())
        .into_option()
        .unwrap();
    let raster = image.raster().unwrap();
    assert_eq!(raster.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(raster.pixel(1, 0), Some([0, 0, 0, 0]));
}

#[test]
fn test_jpeg_passthrough_without_mask() {
    let store = ObjectStore::new();
    let jpeg = jpeg_bytes(4, 4);
    let obj = image_stream(
        4,
        4,
        vec![
            ("ColorSpace", Object::name("DeviceRGB")),
            ("Filter", Object::name("DCTDecode")),
        ],
        jpeg.clone(),
    );

    let outcome = decode_image_object(&store, &obj, &DefaultImageCodec, &ImageLimits::default());
    assert!(outcome.is_decoded());
    let image = outcome.into_option().unwrap();
    assert_eq!((image.width, image.height), (4, 4));
    assert_eq!(
        image.data,
        ImageData::Encoded {
            format: EncodedFormat::Jpeg,
            bytes: jpeg,
        }
    );

    let url = image.to_data_url(&DefaultImageCodec).unwrap();
    assert!(url.starts_with("data:image/jpeg;base64,"));
}

#[test]
fn test_masked_jpeg_is_decoded() {
    let mut store = ObjectStore::new();
    let mask = store.insert(
        7,
        image_stream(
            1,
            1,
            vec![
                ("ColorSpace", Object::name("DeviceGray")),
                ("BitsPerComponent", Object::Integer(8)),
            ],
            vec![128],
        ),
    );
    let obj = image_stream(
        4,
        4,
        vec![
            ("ColorSpace", Object::name("DeviceRGB")),
            ("Filter", Object::name("DCTDecode")),
            ("SMask", Object::Reference(mask)),
        ],
        jpeg_bytes(4, 4),
    );

    let outcome = decode_image_object(&store, &obj, &DefaultImageCodec, &ImageLimits::default());
    assert!(outcome.is_decoded());
    let image = outcome.into_option().unwrap();
    let raster = image.raster().unwrap();
    assert_eq!((raster.width(), raster.height()), (4, 4));
    assert!(raster.pixels().chunks_exact(4).all(|px| px[3] == 128));
}

#[test]
fn test_pixel_limit() {
    let store = ObjectStore::new();
    let obj = image_stream(100, 100, vec![("ColorSpace", Object::name("DeviceGray"))], vec![0; 16]);
    let limits = ImageLimits {
        max_pixels: 1_000,
        ..ImageLimits::default()
    };

    assert!(decode_image_object(&store, &obj, &DefaultImageCodec, &limits).is_failed());
}

#[test]
fn test_missing_dimensions_and_empty_data_fail() {
    let store = ObjectStore::new();
    let no_height = Object::stream([("Width", Object::Integer(2))], vec![0u8; 6]);
    assert!(decode_image_object(&store, &no_height, &DefaultImageCodec, &ImageLimits::default()).is_failed());

    let empty = image_stream(1, 1, vec![], Vec::<u8>::new());
    assert!(decode_image_object(&store, &empty, &DefaultImageCodec, &ImageLimits::default()).is_failed());

    assert!(decode_image_object(&store, &Object::Integer(3), &DefaultImageCodec, &ImageLimits::default()).is_failed());
}

#[test]
fn test_raster_png_data_url() {
    let raster = DecodedRaster::filled(2, 2, [0, 128, 255, 255]);
    let png = DefaultImageCodec.encode_png(&raster).unwrap();
    let decoded = DefaultImageCodec.decode(EncodedFormat::Png, &png).unwrap();
    assert_eq!(decoded, raster);

    let image = annot_oxide::DecodedImage::from_raster(raster);
    assert!(image
        .to_data_url(&DefaultImageCodec)
        .unwrap()
        .starts_with("data:image/png;base64,"));
}
