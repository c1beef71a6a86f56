//! Pages as seen by the annotation pipeline.
//!
//! A page contributes three things: its number, its height (for the Y flip)
//! and its `/Annots` array. `/MediaBox` is inheritable per PDF spec Table 30,
//! so it is looked up through the `/Parent` chain when the page lacks one.

use crate::annotations::{page_annotation_dicts, AnnotationId};
use crate::geometry::{PageSpace, PdfRect};
use crate::object::{Dict, Object, ObjectResolver};

/// Maximum depth of the page tree walked by [`collect_pages`] and of the
/// `/Parent` chain followed for inherited attributes.
const MAX_PAGE_TREE_DEPTH: u32 = 32;

/// US Letter, used when no `/MediaBox` can be found.
const DEFAULT_MEDIA_BOX: PdfRect = PdfRect {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// One page to load annotations from.
#[derive(Debug, Clone, Copy)]
pub struct PageInput<'a> {
    /// 1-based page number
    pub page_number: usize,
    /// Page dictionary
    pub dict: &'a Dict,
    /// Effective media box
    pub media_box: PdfRect,
}

impl<'a> PageInput<'a> {
    /// Wrap a page dictionary, resolving its (possibly inherited) media box.
    pub fn new<R: ObjectResolver + ?Sized>(resolver: &'a R, page_number: usize, dict: &'a Dict) -> Self {
        let media_box = inherited(resolver, dict, "MediaBox")
            .and_then(|mb| resolver.numbers(mb))
            .and_then(|values| PdfRect::from_array(&values))
            .unwrap_or_else(|| {
                log::warn!("Page {} has no usable /MediaBox, assuming US Letter", page_number);
                DEFAULT_MEDIA_BOX
            });
        Self {
            page_number,
            dict,
            media_box,
        }
    }

    /// Page height in PDF units.
    pub fn height(&self) -> f64 {
        self.media_box.height()
    }

    /// Y-down coordinate transform for this page.
    pub fn space(&self) -> PageSpace {
        PageSpace::new(self.height())
    }

    /// Annotation dictionaries in `/Annots` order.
    pub fn annotations<'r, R: ObjectResolver + ?Sized>(&self, resolver: &'r R) -> Vec<(AnnotationId, &'r Dict)>
    where
        'a: 'r,
    {
        page_annotation_dicts(resolver, self.dict)
    }
}

/// Look up an inheritable attribute on the page or its ancestors.
fn inherited<'a, R: ObjectResolver + ?Sized>(resolver: &'a R, dict: &'a Dict, key: &str) -> Option<&'a Object> {
    let mut node = dict;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Some(value) = resolver.get(node, key) {
            return Some(value);
        }
        node = resolver.get_dict(node, "Parent")?;
    }
    log::warn!("/Parent chain longer than {} nodes", MAX_PAGE_TREE_DEPTH);
    None
}

/// Flatten a page tree into pages in document order.
///
/// Broken nodes (non-dictionaries, missing `/Kids`, over-deep branches) are
/// skipped with a warning; the remaining pages keep their document order and
/// are numbered consecutively.
pub fn collect_pages<'a, R: ObjectResolver + ?Sized>(resolver: &'a R, root: &'a Object) -> Vec<PageInput<'a>> {
    let mut leaves = Vec::new();
    collect_leaves(resolver, root, 0, &mut leaves);
    leaves
        .into_iter()
        .enumerate()
        .map(|(i, dict)| PageInput::new(resolver, i + 1, dict))
        .collect()
}

fn collect_leaves<'a, R: ObjectResolver + ?Sized>(
    resolver: &'a R,
    node: &'a Object,
    depth: u32,
    out: &mut Vec<&'a Dict>,
) {
    if depth > MAX_PAGE_TREE_DEPTH {
        log::warn!("Page tree deeper than {} levels, skipping branch", MAX_PAGE_TREE_DEPTH);
        return;
    }

    let dict = match resolver.deref(node).as_dict() {
        Some(d) => d,
        None => {
            log::warn!("Page tree node is not a dictionary");
            return;
        },
    };

    match resolver.get_name(dict, "Type") {
        Some("Pages") => match resolver.get_array(dict, "Kids") {
            Some(kids) => {
                for kid in kids {
                    collect_leaves(resolver, kid, depth + 1, out);
                }
            },
            None => log::warn!("Pages node missing /Kids array"),
        },
        // Leaves without /Type are common in the wild
        Some("Page") | None if !dict.contains_key("Kids") => out.push(dict),
        other => log::warn!("Unknown page tree node type: {:?}", other.unwrap_or("(none)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectStore;

    #[test]
    fn test_media_box_inherited_through_parent() {
        let mut store = ObjectStore::new();
        let root = store.insert(
            1,
            Object::dict([
                ("Type", Object::name("Pages")),
                ("MediaBox", Object::numbers(&[0.0, 0.0, 400.0, 300.0])),
            ]),
        );
        let page = Object::dict([("Type", Object::name("Page")), ("Parent", Object::Reference(root))]);

        let input = PageInput::new(&store, 1, page.as_dict().unwrap());
        assert_eq!(input.height(), 300.0);
        assert_eq!(input.space().flip_y(100.0), 200.0);
    }

    #[test]
    fn test_missing_media_box_defaults_to_letter() {
        let store = ObjectStore::new();
        let page = Object::dict([("Type", Object::name("Page"))]);
        assert_eq!(PageInput::new(&store, 1, page.as_dict().unwrap()).height(), 792.0);
    }

    #[test]
    fn test_collect_pages_in_order() {
        let mut store = ObjectStore::new();
        let p1 = store.insert(10, Object::dict([("Type", Object::name("Page"))]));
        let p2 = store.insert(
            11,
            Object::dict([
                ("Type", Object::name("Page")),
                ("MediaBox", Object::numbers(&[0.0, 0.0, 100.0, 50.0])),
            ]),
        );
        let p3 = store.insert(12, Object::dict([("Type", Object::name("Page"))]));
        let inner = store.insert(
            3,
            Object::dict([
                ("Type", Object::name("Pages")),
                ("Kids", Object::Array(vec![Object::Reference(p2), Object::Integer(7)])),
            ]),
        );
        let root = Object::dict([
            ("Type", Object::name("Pages")),
            (
                "Kids",
                Object::Array(vec![
                    Object::Reference(p1),
                    Object::Reference(inner),
                    Object::Reference(p3),
                ]),
            ),
        ]);

        let pages = collect_pages(&store, &root);
        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(pages[1].height(), 50.0);
    }
}
