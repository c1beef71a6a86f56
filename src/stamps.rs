//! Stamp image location.
//!
//! Two strategies fill a [`StampImageMap`]: cropping the stamp rectangle out
//! of a full page render, and decoding the first image found in the stamp's
//! appearance form. Render crops carry no annotation identity and are
//! matched back by rectangle; vector decodes are keyed by [`AnnotationId`].

use rayon::prelude::*;

use crate::annotation_types::AnnotationSubtype;
use crate::annotations::AnnotationId;
use crate::appearance::normal_appearance;
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::geometry::{PdfRect, RectKey};
use crate::images::{decode_image_object, DecodedImage, DecodedRaster, ImageArena, ImageCodec, ImageHandle, ImageLimits};
use crate::object::{Dict, Object, ObjectResolver};
use crate::outcome::Outcome;
use crate::page::PageInput;

/// Maximum nesting of form XObjects searched for a stamp image.
const MAX_FORM_DEPTH: u32 = 8;

/// Renders a whole page, annotations included.
pub trait PageRasterizer: Sync {
    /// Render `page` at `scale` device pixels per PDF unit.
    fn render_page(&self, page: &PageInput<'_>, scale: f64) -> Result<DecodedRaster>;
}

/// Crop a PDF-space rectangle out of a page render made at `scale`.
///
/// Returns `None` when the crop is empty or lies outside the render.
pub fn crop_stamp(raster: &DecodedRaster, page_height: f64, rect: &PdfRect, scale: f64) -> Option<DecodedRaster> {
    let vx0 = rect.x0 * scale;
    let vx1 = rect.x1 * scale;
    let vy0 = (page_height - rect.y0) * scale;
    let vy1 = (page_height - rect.y1) * scale;

    let x = vx0.min(vx1).round() as i64;
    let y = vy0.min(vy1).round() as i64;
    let width = (vx1 - vx0).abs().round() as i64;
    let height = (vy1 - vy0).abs().round() as i64;
    if width <= 0 || height <= 0 {
        return None;
    }
    raster.crop(x, y, width, height)
}

/// Decode the image drawn by a stamp's normal appearance.
///
/// The appearance form is decoded directly when it is itself an image;
/// otherwise its `/XObject` resources are searched in order, recursing
/// into nested forms.
pub fn decode_stamp_appearance<R: ObjectResolver + ?Sized>(
    resolver: &R,
    annotation: &Dict,
    codec: &dyn ImageCodec,
    limits: &ImageLimits,
) -> Outcome<DecodedImage> {
    Outcome::from_option(normal_appearance(resolver, annotation), || {
        Error::StampImageMissing("no normal appearance".to_string())
    })
    .and_then(|form| find_form_image(resolver, form, codec, limits, 0))
}

fn find_form_image<R: ObjectResolver + ?Sized>(
    resolver: &R,
    xobject: &Object,
    codec: &dyn ImageCodec,
    limits: &ImageLimits,
    depth: u32,
) -> Outcome<DecodedImage> {
    if depth > MAX_FORM_DEPTH {
        return Outcome::Failed(Error::RecursionLimitExceeded(MAX_FORM_DEPTH));
    }

    let dict = match resolver.deref(xobject).as_stream() {
        Some((dict, _)) => dict,
        None => return Outcome::Failed(Error::StampImageMissing("appearance is not a stream".to_string())),
    };

    if resolver.get_name(dict, "Subtype") == Some("Image") {
        return decode_image_object(resolver, xobject, codec, limits);
    }

    let xobjects = match resolver
        .get_dict(dict, "Resources")
        .and_then(|res| resolver.get_dict(res, "XObject"))
    {
        Some(x) => x,
        None => return Outcome::Failed(Error::StampImageMissing("no XObject resources".to_string())),
    };

    let mut last_failure = None;
    for (name, entry) in xobjects {
        let kind = resolver
            .deref(entry)
            .as_stream()
            .and_then(|(d, _)| resolver.get_name(d, "Subtype"));
        let outcome = match kind {
            Some("Image") => decode_image_object(resolver, entry, codec, limits),
            Some("Form") => find_form_image(resolver, entry, codec, limits, depth + 1),
            _ => continue,
        };
        match outcome {
            Outcome::Failed(e) => {
                log::debug!("XObject /{} yielded no image: {}", name, e);
                last_failure = Some(e);
            },
            found => return found,
        }
    }

    Outcome::Failed(
        last_failure.unwrap_or_else(|| Error::StampImageMissing("no image XObject".to_string())),
    )
}

#[derive(Debug, Clone)]
struct StampEntry {
    key: RectKey,
    annotation: Option<AnnotationId>,
    handle: ImageHandle,
}

/// Stamp images of one page.
///
/// Lookup tries the annotation identity, then the exact rectangle key, then
/// any key within the match tolerance.
#[derive(Debug, Clone)]
pub struct StampImageMap {
    images: ImageArena,
    entries: Vec<StampEntry>,
    tolerance: f64,
}

impl StampImageMap {
    /// Create an empty map matching rectangles within `tolerance`.
    pub fn new(tolerance: f64) -> Self {
        Self {
            images: ImageArena::new(),
            entries: Vec::new(),
            tolerance,
        }
    }

    /// Store an image for a rectangle, optionally tied to an annotation.
    pub fn insert(&mut self, key: RectKey, annotation: Option<AnnotationId>, image: DecodedImage) -> ImageHandle {
        let handle = self.images.push(image);
        self.entries.push(StampEntry {
            key,
            annotation,
            handle,
        });
        handle
    }

    /// Find the image for an annotation.
    pub fn lookup(&self, annotation: Option<AnnotationId>, key: &RectKey) -> Option<ImageHandle> {
        let by_id = annotation.and_then(|id| self.entries.iter().find(|e| e.annotation == Some(id)));
        by_id
            .or_else(|| self.entries.iter().find(|e| e.key == *key))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.key.matches_within(key, self.tolerance))
            })
            .map(|e| e.handle)
    }

    /// Image behind a handle issued by this map.
    pub fn get(&self, handle: ImageHandle) -> Option<&DecodedImage> {
        self.images.get(handle)
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was found on the page.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Give up the images; handles from [`StampImageMap::lookup`] index into it.
    pub fn into_arena(self) -> ImageArena {
        self.images
    }
}

/// Locate stamp images for the annotations of one page.
///
/// With a render-based strategy the page is rendered once and every stamp
/// cropped from it. Stamps still without an image are then decoded from
/// their appearance forms in parallel when the strategy allows it.
pub fn locate_stamp_images<R: ObjectResolver + ?Sized>(
    resolver: &R,
    page: &PageInput<'_>,
    annotations: &[(AnnotationId, &Dict)],
    rasterizer: Option<&dyn PageRasterizer>,
    codec: &dyn ImageCodec,
    config: &LoaderConfig,
) -> StampImageMap {
    let mut map = StampImageMap::new(config.rect_match_tolerance);

    let stamps: Vec<(AnnotationId, &Dict, PdfRect)> = annotations
        .iter()
        .filter(|(_, dict)| {
            resolver
                .get_name(dict, "Subtype")
                .map(AnnotationSubtype::from_pdf_name)
                == Some(AnnotationSubtype::Stamp)
        })
        .filter_map(|(id, dict)| {
            let rect = resolver
                .get_numbers(dict, "Rect")
                .and_then(|r| PdfRect::from_array(&r));
            if rect.is_none() {
                log::warn!("Stamp {} has no usable /Rect", id);
            }
            rect.map(|rect| (*id, *dict, rect))
        })
        .collect();
    if stamps.is_empty() {
        return map;
    }

    if config.stamp_strategy.uses_render() {
        match rasterizer {
            Some(rasterizer) => match rasterizer.render_page(page, config.render_scale) {
                Ok(raster) => {
                    for (id, _, rect) in &stamps {
                        match crop_stamp(&raster, page.height(), rect, config.render_scale) {
                            Some(crop) => {
                                map.insert(RectKey::from_rect(rect), None, DecodedImage::from_raster(crop));
                            },
                            None => log::debug!("Stamp {} lies outside the page render", id),
                        }
                    }
                },
                Err(e) => log::warn!("Rendering page {} for stamps failed: {}", page.page_number, e),
            },
            None => log::debug!("No rasterizer, skipping stamp render on page {}", page.page_number),
        }
    }

    if config.stamp_strategy.uses_vector() {
        let limits = config.image_limits();
        let missing: Vec<_> = stamps
            .iter()
            .filter(|(id, _, rect)| map.lookup(Some(*id), &RectKey::from_rect(rect)).is_none())
            .collect();

        let decoded: Vec<_> = missing
            .par_iter()
            .map(|(id, dict, rect)| (*id, *rect, decode_stamp_appearance(resolver, dict, codec, &limits)))
            .collect();

        for (id, rect, outcome) in decoded {
            match outcome.into_result() {
                Ok(image) => {
                    map.insert(RectKey::from_rect(&rect), Some(id), image);
                },
                Err(e) => log::warn!("Stamp {} on page {}: {}", id, page.page_number, e),
            }
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StampStrategy;
    use crate::images::DefaultImageCodec;
    use crate::object::ObjectStore;

    fn gray_image(value: u8) -> Object {
        Object::stream(
            [
                ("Type", Object::name("XObject")),
                ("Subtype", Object::name("Image")),
                ("Width", Object::Integer(1)),
                ("Height", Object::Integer(1)),
                ("BitsPerComponent", Object::Integer(8)),
                ("ColorSpace", Object::name("DeviceGray")),
            ],
            vec![value],
        )
    }

    fn stamp_with_form(store: &mut ObjectStore, form: Object) -> Dict {
        let form_ref = store.insert(20, form);
        Object::dict([
            ("Subtype", Object::name("Stamp")),
            ("Rect", Object::numbers(&[10.0, 10.0, 30.0, 20.0])),
            ("AP", Object::dict([("N", Object::Reference(form_ref))])),
        ])
        .as_dict()
        .unwrap()
        .clone()
    }

    struct SolidRasterizer;

    impl PageRasterizer for SolidRasterizer {
        fn render_page(&self, page: &PageInput<'_>, scale: f64) -> Result<DecodedRaster> {
            let w = (page.media_box.width() * scale) as u32;
            let h = (page.height() * scale) as u32;
            Ok(DecodedRaster::filled(w, h, [1, 2, 3, 255]))
        }
    }

    struct FailingRasterizer;

    impl PageRasterizer for FailingRasterizer {
        fn render_page(&self, _page: &PageInput<'_>, _scale: f64) -> Result<DecodedRaster> {
            Err(Error::Render("no backend".to_string()))
        }
    }

    #[test]
    fn test_crop_stamp_coordinates() {
        let raster = DecodedRaster::filled(300, 600, [0, 0, 0, 255]);
        let rect = PdfRect::from_array(&[10.0, 150.0, 30.0, 190.0]).unwrap();
        let crop = crop_stamp(&raster, 200.0, &rect, 3.0).unwrap();
        assert_eq!((crop.width(), crop.height()), (60, 120));

        let empty = PdfRect::from_array(&[10.0, 10.0, 10.0, 20.0]).unwrap();
        assert!(crop_stamp(&raster, 200.0, &empty, 3.0).is_none());

        let huge = PdfRect::from_array(&[1e300, 0.0, 2e300, 10.0]).unwrap();
        assert!(crop_stamp(&raster, 200.0, &huge, 3.0).is_none());
    }

    #[test]
    fn test_direct_image_appearance() {
        let mut store = ObjectStore::new();
        let stamp = stamp_with_form(&mut store, gray_image(128));
        let outcome = decode_stamp_appearance(&store, &stamp, &DefaultImageCodec, &ImageLimits::default());
        let image = outcome.into_option().unwrap();
        assert_eq!(image.raster().unwrap().pixel(0, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn test_nested_form_image() {
        let mut store = ObjectStore::new();
        let image = store.insert(30, gray_image(7));
        let inner = store.insert(
            31,
            Object::stream(
                [
                    ("Subtype", Object::name("Form")),
                    (
                        "Resources",
                        Object::dict([("XObject", Object::dict([("Im0", Object::Reference(image))]))]),
                    ),
                ],
                Vec::<u8>::new(),
            ),
        );
        let outer = Object::stream(
            [
                ("Subtype", Object::name("Form")),
                (
                    "Resources",
                    Object::dict([("XObject", Object::dict([("Fm0", Object::Reference(inner))]))]),
                ),
            ],
            Vec::<u8>::new(),
        );
        let stamp = stamp_with_form(&mut store, outer);
        let image = decode_stamp_appearance(&store, &stamp, &DefaultImageCodec, &ImageLimits::default())
            .into_option()
            .unwrap();
        assert_eq!(image.raster().unwrap().pixel(0, 0), Some([7, 7, 7, 255]));
    }

    #[test]
    fn test_form_without_image_fails() {
        let mut store = ObjectStore::new();
        let form = Object::stream([("Subtype", Object::name("Form"))], Vec::<u8>::new());
        let stamp = stamp_with_form(&mut store, form);
        let outcome = decode_stamp_appearance(&store, &stamp, &DefaultImageCodec, &ImageLimits::default());
        assert!(matches!(outcome.error(), Some(Error::StampImageMissing(_))));
    }

    #[test]
    fn test_self_referencing_form_is_bounded() {
        let mut store = ObjectStore::new();
        let form_ref = crate::object::ObjectRef::new(40, 0);
        store.insert_ref(
            form_ref,
            Object::stream(
                [
                    ("Subtype", Object::name("Form")),
                    (
                        "Resources",
                        Object::dict([("XObject", Object::dict([("Fm0", Object::Reference(form_ref))]))]),
                    ),
                ],
                Vec::<u8>::new(),
            ),
        );
        let stamp = Object::dict([
            ("Subtype", Object::name("Stamp")),
            ("AP", Object::dict([("N", Object::Reference(form_ref))])),
        ]);
        let outcome = decode_stamp_appearance(
            &store,
            stamp.as_dict().unwrap(),
            &DefaultImageCodec,
            &ImageLimits::default(),
        );
        assert!(matches!(outcome.error(), Some(Error::RecursionLimitExceeded(_))));
    }

    #[test]
    fn test_lookup_order() {
        let mut map = StampImageMap::new(1.0);
        let id = AnnotationId::new(0, None);
        let other = AnnotationId::new(1, None);
        let key = RectKey::new([10.0, 10.0, 30.0, 20.0]);

        let by_render = map.insert(key.clone(), None, DecodedImage::from_raster(DecodedRaster::filled(1, 1, [0; 4])));
        let by_id = map.insert(
            RectKey::new([0.0, 0.0, 1.0, 1.0]),
            Some(id),
            DecodedImage::from_raster(DecodedRaster::filled(1, 1, [0; 4])),
        );

        assert_eq!(map.lookup(Some(id), &key), Some(by_id));
        assert_eq!(map.lookup(Some(other), &key), Some(by_render));
        assert_eq!(map.lookup(None, &RectKey::new([10.5, 10.5, 30.5, 20.5])), Some(by_render));
        assert_eq!(map.lookup(None, &RectKey::new([12.0, 12.0, 32.0, 22.0])), None);
    }

    #[test]
    fn test_locate_render_then_vector() {
        let mut store = ObjectStore::new();
        let stamp = stamp_with_form(&mut store, gray_image(50));
        let page_dict = Object::dict([("MediaBox", Object::numbers(&[0.0, 0.0, 100.0, 100.0]))]);
        let page = PageInput::new(&store, 1, page_dict.as_dict().unwrap());
        let id = AnnotationId::new(0, None);
        let annotations = [(id, &stamp)];

        let config = LoaderConfig::default();
        let rendered = locate_stamp_images(
            &store,
            &page,
            &annotations,
            Some(&SolidRasterizer),
            &DefaultImageCodec,
            &config,
        );
        assert_eq!(rendered.len(), 1);
        let handle = rendered
            .lookup(Some(id), &RectKey::new([10.0, 10.0, 30.0, 20.0]))
            .unwrap();
        let crop = rendered.get(handle).unwrap().raster().unwrap();
        assert_eq!((crop.width(), crop.height()), (60, 30));
        assert_eq!(crop.pixel(0, 0), Some([1, 2, 3, 255]));

        let fallback = locate_stamp_images(
            &store,
            &page,
            &annotations,
            Some(&FailingRasterizer),
            &DefaultImageCodec,
            &config,
        );
        let handle = fallback.lookup(Some(id), &RectKey::new([0.0; 4])).unwrap();
        assert_eq!(fallback.get(handle).unwrap().raster().unwrap().pixel(0, 0), Some([50, 50, 50, 255]));

        let render_only = locate_stamp_images(
            &store,
            &page,
            &annotations,
            None,
            &DefaultImageCodec,
            &config.clone().with_stamp_strategy(StampStrategy::RenderOnly),
        );
        assert!(render_only.is_empty());
    }
}
