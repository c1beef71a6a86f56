//! Document-level annotation loading.
//!
//! Pages are processed in parallel on a bounded rayon pool. Within a page the
//! style pass and the stamp pass run concurrently, then every annotation is
//! converted in parallel. One bad annotation only ever costs its own record.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

use crate::annotations::{AnnotationId, PdfAnnotation};
use crate::appearance::extract_page_styles;
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::images::{DecodedImage, ImageArena, ImageCodec, ImageHandle};
use crate::normalizer::{normalize_annotation, NormalizeContext};
use crate::object::{Dict, Object, ObjectResolver};
use crate::outcome::Outcome;
use crate::page::{collect_pages, PageInput};
use crate::records::AnnotationRecord;
use crate::stamps::{locate_stamp_images, PageRasterizer};

/// Shared flag that abandons a running load.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once [`CancelFlag::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// An annotation that produced no record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAnnotation {
    /// Identity on the page
    pub id: AnnotationId,
    /// `/Subtype`, or `(none)`
    pub subtype: String,
    /// Why it was skipped
    pub reason: String,
}

/// Records of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnnotations {
    /// 1-based page number
    pub page_number: usize,
    /// Records in `/Annots` order
    pub records: Vec<AnnotationRecord>,
    /// Annotations without a record
    pub skipped: Vec<SkippedAnnotation>,
}

/// Result of a load pass.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    /// Pages in input order; pages abandoned by cancellation are missing
    pub pages: Vec<PageAnnotations>,
    /// Stamp images referenced by [`crate::records::ImageRecord::image_id`]
    pub images: ImageArena,
    /// False if the load was cancelled before every page finished
    pub complete: bool,
}

impl AnnotationSet {
    /// All records in page order.
    pub fn records(&self) -> impl Iterator<Item = &AnnotationRecord> {
        self.pages.iter().flat_map(|p| p.records.iter())
    }

    /// Image behind a record's handle.
    pub fn image(&self, handle: ImageHandle) -> Option<&DecodedImage> {
        self.images.get(handle)
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.pages.iter().map(|p| p.records.len()).sum()
    }

    /// True if no page produced a record.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

enum Converted {
    Record(AnnotationRecord),
    Skipped(SkippedAnnotation),
}

/// Load and normalize the annotations of `pages`.
///
/// # Errors
///
/// Only fails when the worker pool cannot be built. Decode problems are
/// logged and reported per annotation in [`PageAnnotations::skipped`].
pub fn load_annotations<R: ObjectResolver + ?Sized>(
    resolver: &R,
    pages: &[PageInput<'_>],
    rasterizer: Option<&dyn PageRasterizer>,
    codec: &dyn ImageCodec,
    config: &LoaderConfig,
    cancel: &CancelFlag,
) -> Result<AnnotationSet> {
    let threads = config.effective_worker_threads();
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::WorkerPool(e.to_string()))?;

    let loaded_at = Utc::now();
    log::debug!("Loading annotations of {} pages on {} threads", pages.len(), threads);

    let results: Vec<Result<(PageAnnotations, ImageArena)>> = pool.install(|| {
        pages
            .par_iter()
            .map(|page| load_page(resolver, page, rasterizer, codec, config, loaded_at, cancel))
            .collect()
    });

    let mut set = AnnotationSet {
        complete: true,
        ..AnnotationSet::default()
    };
    for (page, result) in pages.iter().zip(results) {
        match result {
            Ok((mut annotations, arena)) => {
                let offset = set.images.absorb(arena);
                for record in &mut annotations.records {
                    record.rebase_images(offset);
                }
                set.pages.push(annotations);
            },
            Err(Error::Cancelled) => {
                log::debug!("Page {} abandoned", page.page_number);
                set.complete = false;
            },
            Err(e) => {
                log::warn!("Page {} failed: {}", page.page_number, e);
                set.complete = false;
            },
        }
    }

    Ok(set)
}

/// Walk the page tree at `pages_root` and load every page.
pub fn load_document_annotations<R: ObjectResolver + ?Sized>(
    resolver: &R,
    pages_root: &Object,
    rasterizer: Option<&dyn PageRasterizer>,
    codec: &dyn ImageCodec,
    config: &LoaderConfig,
    cancel: &CancelFlag,
) -> Result<AnnotationSet> {
    let pages = collect_pages(resolver, pages_root);
    load_annotations(resolver, &pages, rasterizer, codec, config, cancel)
}

fn load_page<R: ObjectResolver + ?Sized>(
    resolver: &R,
    page: &PageInput<'_>,
    rasterizer: Option<&dyn PageRasterizer>,
    codec: &dyn ImageCodec,
    config: &LoaderConfig,
    loaded_at: DateTime<Utc>,
    cancel: &CancelFlag,
) -> Result<(PageAnnotations, ImageArena)> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let annotations = page.annotations(resolver);
    let (styles, stamps) = rayon::join(
        || extract_page_styles(resolver, &annotations, config.max_stream_size),
        || locate_stamp_images(resolver, page, &annotations, rasterizer, codec, config),
    );

    let ctx = NormalizeContext::new(page, config, loaded_at);
    let converted = annotations
        .par_iter()
        .map(|(id, dict)| {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            Ok(convert(resolver, *id, dict, |annot| {
                normalize_annotation(annot, styles.get(id), &stamps, &ctx)
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut result = PageAnnotations {
        page_number: page.page_number,
        records: Vec::new(),
        skipped: Vec::new(),
    };
    for item in converted {
        match item {
            Converted::Record(record) => result.records.push(record),
            Converted::Skipped(skipped) => result.skipped.push(skipped),
        }
    }
    log::debug!(
        "Page {}: {} records, {} skipped",
        page.page_number,
        result.records.len(),
        result.skipped.len()
    );

    Ok((result, stamps.into_arena()))
}

fn convert<R: ObjectResolver + ?Sized>(
    resolver: &R,
    id: AnnotationId,
    dict: &Dict,
    normalize: impl FnOnce(&PdfAnnotation) -> Outcome<AnnotationRecord>,
) -> Converted {
    let annot = match PdfAnnotation::parse(resolver, id, dict) {
        Ok(annot) => annot,
        Err(e) => {
            log::warn!("Annotation {}: {}", id, e);
            return Converted::Skipped(SkippedAnnotation {
                id,
                subtype: "(none)".to_string(),
                reason: e.to_string(),
            });
        },
    };

    match normalize(&annot) {
        Outcome::Decoded(record) => Converted::Record(record),
        Outcome::Defaulted(record) => {
            log::debug!("Annotation {} converted with defaults", id);
            Converted::Record(record)
        },
        Outcome::Failed(e) => {
            match &e {
                Error::UnsupportedSubtype(_) => log::debug!("Annotation {}: {}", id, e),
                _ => log::warn!("Annotation {} ({}): {}", id, annot.subtype, e),
            }
            Converted::Skipped(SkippedAnnotation {
                id,
                subtype: annot.subtype.to_string(),
                reason: e.to_string(),
            })
        },
    }
}
