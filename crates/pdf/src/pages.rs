use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Object};

use crate::backend::{LopdfBackend, ObjectId, PdfBackend};

// ---------------------------------------------------------------------------
// Page numbering
// ---------------------------------------------------------------------------

/// Document page order, looked up by page object id.
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    ids: BTreeMap<u32, ObjectId>,
    numbers: HashMap<ObjectId, u32>,
}

impl PageIndex {
    pub fn new(backend: &impl PdfBackend) -> Self {
        let ids = backend.pages();
        let numbers = ids.iter().map(|(&number, &id)| (id, number)).collect();
        Self { ids, numbers }
    }

    /// 1-based page number of a page object.
    pub fn number_of(&self, page: ObjectId) -> Option<u32> {
        self.numbers.get(&page).copied()
    }

    /// 1-based page number of a `Pg` style reference.
    pub fn number_of_object(&self, obj: &Object) -> Option<u32> {
        obj.as_reference().ok().and_then(|id| self.number_of(id))
    }

    pub fn id_of(&self, number: u32) -> Option<ObjectId> {
        self.ids.get(&number).copied()
    }

    /// Pages in document order as `(number, id)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, ObjectId)> + '_ {
        self.ids.iter().map(|(&number, &id)| (number, id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Page resources
// ---------------------------------------------------------------------------

/// An image XObject listed in a page's resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Resource name, e.g. `Im1`.
    pub name: String,
    /// Object id of the image stream when it is indirect.
    pub id: Option<ObjectId>,
    pub bits_per_component: Option<i64>,
}

impl PageImage {
    pub fn is_single_bit(&self) -> bool {
        self.bits_per_component == Some(1)
    }
}

/// Resolve the XObject dictionary of a page's (possibly inherited) resources.
fn xobject_dict(backend: &LopdfBackend, page: ObjectId) -> Option<&Dictionary> {
    let resources = backend.page_resources(page)?;
    backend.get_dict(resources, b"XObject")
}

/// List the image XObjects available to a page.
pub fn page_images(backend: &LopdfBackend, page: ObjectId) -> Vec<PageImage> {
    let Some(xobjects) = xobject_dict(backend, page) else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(name, obj)| {
            let dict = backend.resolve_dict(obj)?;
            if backend.get_name(dict, b"Subtype").as_deref() != Some("Image") {
                return None;
            }
            Some(PageImage {
                name: String::from_utf8_lossy(name).into_owned(),
                id: obj.as_reference().ok(),
                bits_per_component: backend.get_i64(dict, b"BitsPerComponent"),
            })
        })
        .collect()
}

/// Whether the page's resources declare at least one font.
pub fn page_has_fonts(backend: &LopdfBackend, page: ObjectId) -> bool {
    backend
        .page_resources(page)
        .and_then(|resources| backend.get_dict(resources, b"Font"))
        .is_some_and(|fonts| !fonts.is_empty())
}

/// A page looks scanned when it paints images but has no fonts.
pub fn page_is_image_only(backend: &LopdfBackend, page: ObjectId) -> bool {
    !page_has_fonts(backend, page) && !page_images(backend, page).is_empty()
}

#[cfg(test)]
mod tests {
    use lopdf::{dictionary, Stream};

    use super::*;
    use crate::fixtures::{int, DocBuilder};

    fn image(builder: &mut DocBuilder, bits: i64) -> ObjectId {
        builder.add(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "BitsPerComponent" => int(bits),
            },
            vec![0],
        ))
    }

    #[test]
    fn page_index_numbers_pages_in_order() {
        let mut builder = DocBuilder::new();
        let first = builder.page(dictionary! {});
        let second = builder.page(dictionary! {});
        let backend = builder.build();

        let index = PageIndex::new(&backend);
        assert_eq!(index.len(), 2);
        assert_eq!(index.number_of(first), Some(1));
        assert_eq!(index.number_of(second), Some(2));
        assert_eq!(index.number_of_object(&Object::Reference(second)), Some(2));
        assert_eq!(index.number_of_object(&Object::Integer(2)), None);
        assert_eq!(index.id_of(1), Some(first));
    }

    #[test]
    fn lists_only_image_xobjects() {
        let mut builder = DocBuilder::new();
        let img = image(&mut builder, 8);
        let form = builder.add(Stream::new(dictionary! { "Subtype" => "Form" }, vec![]));
        let page = builder.page(dictionary! {
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => img, "Fm1" => form },
            },
        });
        let backend = builder.build();

        let images = page_images(&backend, page);
        assert_eq!(
            images,
            vec![PageImage {
                name: "Im1".into(),
                id: Some(img),
                bits_per_component: Some(8),
            }]
        );
        assert!(!images[0].is_single_bit());
    }

    #[test]
    fn image_only_page() {
        let mut builder = DocBuilder::new();
        let img = image(&mut builder, 1);
        let scanned = builder.page(dictionary! {
            "Resources" => dictionary! { "XObject" => dictionary! { "Im0" => img } },
        });
        let text = builder.page(dictionary! {
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => img },
                "Font" => dictionary! { "F1" => dictionary! { "Type" => "Font" } },
            },
        });
        let empty_fonts = builder.page(dictionary! {
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => img },
                "Font" => dictionary! {},
            },
        });
        let blank = builder.page(dictionary! {});
        let backend = builder.build();

        assert!(page_is_image_only(&backend, scanned));
        assert!(!page_is_image_only(&backend, text));
        assert!(page_is_image_only(&backend, empty_fonts));
        assert!(!page_is_image_only(&backend, blank));
    }
}
