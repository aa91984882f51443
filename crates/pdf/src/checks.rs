//! Document-level checks.
//!
//! Everything here reads the document without walking the structure tree:
//! catalog entries, page resources, annotations and content streams.

use std::collections::{BTreeMap, HashSet};

use lopdf::{Dictionary, Object};
use pdfwam_core::headings::{check_heading_levels, heading_level, HeadingCheck};
use pdfwam_core::scanned::{is_scanner_producer, sample_pages};
use rand::Rng;
use serde::Serialize;

use crate::artifacts::artifact_text;
use crate::backend::{get_number_from_value, LopdfBackend, ObjectId, PdfBackend};
use crate::numbers::NumbersTree;
use crate::pages::{page_images, page_is_image_only, PageIndex};

/// Form field hierarchies deeper than this are cut.
const MAX_FIELD_DEPTH: usize = 32;

/// Share of the crop box height a column jump has to reach.
const COLUMN_HEIGHT_RATIO: f32 = 0.70;

const MULTIMEDIA_SUBTYPES: [&str; 4] = ["Movie", "Sound", "Screen", "FileAttachment"];

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

pub fn struct_tree_root(backend: &LopdfBackend) -> Option<&Dictionary> {
    backend.get_dict(backend.catalog()?, b"StructTreeRoot")
}

/// `MarkInfo.Marked` of the catalog.
pub fn is_tagged(backend: &LopdfBackend) -> bool {
    backend
        .catalog()
        .and_then(|catalog| backend.get_dict(catalog, b"MarkInfo"))
        .and_then(|mark_info| backend.get(mark_info, b"Marked"))
        .and_then(|marked| marked.as_bool().ok())
        .unwrap_or(false)
}

/// Heading levels per page, read from the parent tree.
///
/// The page of a heading comes from its `Pg`, or from `Pg` of a dictionary
/// `K`. Headings on unknown pages are left out.
pub fn headings_by_page(
    backend: &LopdfBackend,
    numbers: &NumbersTree<'_>,
    pages: &PageIndex,
) -> BTreeMap<u32, Vec<u8>> {
    let mut headings: BTreeMap<u32, Vec<u8>> = BTreeMap::new();

    for value in numbers.values() {
        let items = match backend.resolve(value) {
            Some(Object::Array(items)) => items.as_slice(),
            Some(_) => std::slice::from_ref(value),
            None => continue,
        };

        for item in items {
            let Some(element) = backend.resolve_dict(item) else {
                continue;
            };
            let Some(level) = backend
                .get_name(element, b"S")
                .and_then(|tag| heading_level(&tag))
            else {
                continue;
            };
            let page = element
                .get(b"Pg")
                .ok()
                .or_else(|| {
                    backend
                        .get_dict(element, b"K")
                        .and_then(|kid| kid.get(b"Pg").ok())
                })
                .and_then(|pg| pages.number_of_object(pg));

            match page {
                Some(page) => headings.entry(page).or_default().push(level),
                None => log::debug!("heading H{level} without a known page"),
            }
        }
    }

    headings
}

pub fn headers_consistent(
    backend: &LopdfBackend,
    numbers: &NumbersTree<'_>,
    pages: &PageIndex,
) -> HeadingCheck {
    let check = check_heading_levels(&headings_by_page(backend, numbers, pages));
    match check {
        HeadingCheck::Consistent => {}
        HeadingCheck::MissingTopLevel { page, level } => {
            log::info!("document starts with H{level} on page {page}")
        }
        HeadingCheck::SkippedLevel { page, from, to } => {
            log::info!("page {page}: H{to} follows H{from}")
        }
    }
    check
}

/// Bookmarks are present when `Outlines.Count > 0`, or when both `First`
/// and `Last` resolve.
pub fn has_bookmarks(backend: &LopdfBackend) -> bool {
    let Some(outlines) = backend
        .catalog()
        .and_then(|catalog| backend.get_dict(catalog, b"Outlines"))
    else {
        return false;
    };

    let count = backend.get_i64(outlines, b"Count").unwrap_or(0);
    count > 0 || (backend.get(outlines, b"First").is_some() && backend.get(outlines, b"Last").is_some())
}

// ---------------------------------------------------------------------------
// Scanned documents
// ---------------------------------------------------------------------------

/// Whether the document looks like a scan.
///
/// A scanner `Producer` decides on its own. A structure tree rules a scan
/// out. Otherwise every sampled page has to show images without fonts.
pub fn is_scanned<R: Rng + ?Sized>(
    backend: &LopdfBackend,
    pages: &PageIndex,
    has_struct_tree: bool,
    rng: &mut R,
) -> bool {
    if let Some(producer) = backend.metadata().get("Producer") {
        if is_scanner_producer(producer) {
            log::info!("scanner producer {producer:?}");
            return true;
        }
    }
    if has_struct_tree || pages.is_empty() {
        return false;
    }

    sample_pages(pages.len(), rng).into_iter().all(|index| {
        pages
            .id_of(index as u32 + 1)
            .is_some_and(|page| page_is_image_only(backend, page))
    })
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Whether text on a page moves to a second column.
///
/// Matrix operands `[a b c d x y]` are walked in order. A column starts when
/// `x` grows past the first matrix while `y` at least doubles and reaches
/// the top part of the crop box. An `x` left of the first one ends the scan.
pub fn page_has_columns(backend: &LopdfBackend, page: ObjectId) -> bool {
    let Some(crop_height) = backend
        .page_dict(page)
        .and_then(|dict| backend.inherited(dict, b"CropBox"))
        .and_then(|cropbox| cropbox.as_array().ok())
        .and_then(|cropbox| cropbox.get(3))
        .and_then(|top| backend.resolve(top))
        .and_then(|top| top.as_float().ok())
    else {
        return false;
    };

    let ops = match backend.page_operations(page) {
        Ok(ops) => ops,
        Err(err) => {
            log::debug!("no column check for page object {page:?}: {err}");
            return false;
        }
    };
    if artifact_text(&ops).trim().is_empty() {
        return false;
    }

    let extents: Vec<(f32, f32)> = ops
        .iter()
        .filter(|op| op.operands.len() == 6)
        .filter_map(|op| {
            let x = get_number_from_value(&op.operands[4])?;
            let y = get_number_from_value(&op.operands[5])?;
            op.operands[..4]
                .iter()
                .all(|v| get_number_from_value(v).is_some())
                .then_some((x, y))
        })
        .collect();

    let Some(&(x_first, y_first)) = extents.first() else {
        return false;
    };
    if x_first < 0.0 && y_first < 0.0 {
        return false;
    }

    let mut y_previous = 0.0;
    for &(x, y) in &extents {
        if x < x_first {
            break;
        }
        if x > x_first && y >= 2.0 * y_previous && y >= COLUMN_HEIGHT_RATIO * crop_height {
            log::debug!("page object {page:?}: column change at ({x}, {y})");
            return true;
        }
        y_previous = y;
    }
    false
}

/// 1-based numbers of the pages laid out in columns.
pub fn multi_column_pages(backend: &LopdfBackend, pages: &PageIndex) -> Vec<u32> {
    pages
        .iter()
        .filter(|&(_, page)| page_has_columns(backend, page))
        .map(|(number, _)| number)
        .collect()
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// A field of the interactive form.
#[derive(Debug, Clone, Copy)]
pub struct FormField<'a> {
    pub id: Option<ObjectId>,
    pub dict: &'a Dictionary,
}

impl FormField<'_> {
    pub fn is_leaf(&self) -> bool {
        !self.dict.has(b"Kids")
    }
}

/// The catalog's `AcroForm`.
pub fn form_object(backend: &LopdfBackend) -> Option<&Dictionary> {
    backend.get_dict(backend.catalog()?, b"AcroForm")
}

pub fn has_forms(backend: &LopdfBackend) -> bool {
    backend
        .catalog()
        .is_some_and(|catalog| catalog.has(b"AcroForm"))
}

/// Every field of `form`, each followed by its kids.
pub fn form_fields<'a>(backend: &'a LopdfBackend, form: &'a Dictionary) -> Vec<FormField<'a>> {
    let mut fields = Vec::new();
    let mut seen = HashSet::new();
    if let Some(top) = backend.get_array(form, b"Fields") {
        collect_fields(backend, top, 0, &mut seen, &mut fields);
    }
    fields
}

fn collect_fields<'a>(
    backend: &'a LopdfBackend,
    items: &'a [Object],
    depth: usize,
    seen: &mut HashSet<ObjectId>,
    fields: &mut Vec<FormField<'a>>,
) {
    if depth > MAX_FIELD_DEPTH {
        log::warn!("form fields nested deeper than {MAX_FIELD_DEPTH} levels");
        return;
    }
    for item in items {
        let id = item.as_reference().ok();
        if let Some(id) = id {
            if !seen.insert(id) {
                continue;
            }
        }
        let Some(dict) = backend.resolve_dict(item) else {
            continue;
        };
        fields.push(FormField { id, dict });
        if let Some(kids) = backend.get_array(dict, b"Kids") {
            collect_fields(backend, kids, depth + 1, seen, fields);
        }
    }
}

/// Top-level fields, a compound field counting its kids.
pub fn num_form_fields(backend: &LopdfBackend, form: &Dictionary) -> usize {
    backend
        .get_array(form, b"Fields")
        .unwrap_or_default()
        .iter()
        .filter_map(|field| backend.resolve_dict(field))
        .map(|field| {
            backend
                .get_array(field, b"Kids")
                .map_or(1, |kids| kids.len())
        })
        .sum()
}

pub fn has_valid_forms(backend: &LopdfBackend) -> bool {
    form_object(backend).is_some_and(|form| num_form_fields(backend, form) > 0)
}

/// Whether a top-level field, or a kid of a typeless one, is a text field.
pub fn has_text_input_form(backend: &LopdfBackend) -> bool {
    let Some(form) = form_object(backend) else {
        return false;
    };
    let is_text = |field: &Dictionary| backend.get_name(field, b"FT").as_deref() == Some("Tx");

    backend
        .get_array(form, b"Fields")
        .unwrap_or_default()
        .iter()
        .filter_map(|field| backend.resolve_dict(field))
        .any(|field| {
            if field.has(b"FT") {
                return is_text(field);
            }
            backend
                .get_array(field, b"Kids")
                .unwrap_or_default()
                .iter()
                .filter_map(|kid| backend.resolve_dict(kid))
                .any(is_text)
        })
}

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

/// A link annotation and the page it sits on.
#[derive(Debug, Clone, Copy)]
pub struct ExternalLink<'a> {
    pub page: u32,
    pub id: Option<ObjectId>,
    pub annotation: &'a Dictionary,
}

fn is_link(backend: &LopdfBackend, annotation: &Dictionary) -> bool {
    annotation.has(b"URI") || backend.get_name(annotation, b"Subtype").as_deref() == Some("Link")
}

/// `Link` annotations and annotations carrying a `URI`, in page order.
pub fn external_links<'a>(backend: &'a LopdfBackend, pages: &PageIndex) -> Vec<ExternalLink<'a>> {
    pages
        .iter()
        .flat_map(move |(number, page)| {
            backend
                .page_annotations(page)
                .into_iter()
                .filter(move |(_, annotation)| is_link(backend, annotation))
                .map(move |(id, annotation)| ExternalLink {
                    page: number,
                    id,
                    annotation,
                })
        })
        .collect()
}

pub fn has_external_links(backend: &LopdfBackend, pages: &PageIndex) -> bool {
    pages.iter().any(|(_, page)| {
        backend
            .page_annotations(page)
            .iter()
            .any(|(_, annotation)| is_link(backend, annotation))
    })
}

fn annotation_subtypes(backend: &LopdfBackend, pages: &PageIndex) -> Vec<String> {
    pages
        .iter()
        .flat_map(move |(_, page)| {
            backend
                .page_annotations(page)
                .into_iter()
                .filter_map(move |(_, annotation)| backend.get_name(annotation, b"Subtype"))
        })
        .collect()
}

/// Movie, sound, screen or file attachment annotations anywhere.
pub fn has_multimedia(backend: &LopdfBackend, pages: &PageIndex) -> bool {
    annotation_subtypes(backend, pages)
        .iter()
        .any(|subtype| MULTIMEDIA_SUBTYPES.contains(&subtype.as_str()))
}

/// File attachments, or media annotations whose file is not a URL.
pub fn has_embedded_multimedia(backend: &LopdfBackend, pages: &PageIndex) -> bool {
    pages.iter().any(|(_, page)| {
        backend.page_annotations(page).iter().any(|(_, annotation)| {
            let Some(subtype) = backend.get_name(annotation, b"Subtype") else {
                return false;
            };
            match subtype.as_str() {
                "FileAttachment" => true,
                "Movie" | "Sound" | "Screen" => backend
                    .get_dict(annotation, subtype.as_bytes())
                    .and_then(|media| backend.get_dict(media, b"F"))
                    .is_some_and(|file| backend.get_name(file, b"FS").as_deref() != Some("URL")),
                _ => false,
            }
        })
    })
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

fn has_font_file(backend: &LopdfBackend, font: &Dictionary) -> bool {
    let descriptor = backend.get_dict(font, b"FontDescriptor").or_else(|| {
        backend
            .get_array(font, b"DescendantFonts")
            .and_then(|fonts| fonts.first())
            .and_then(|first| backend.resolve_dict(first))
            .and_then(|descendant| backend.get_dict(descendant, b"FontDescriptor"))
    });
    descriptor.is_some_and(|descriptor| {
        descriptor
            .iter()
            .any(|(key, _)| key.starts_with(b"FontFile"))
    })
}

/// Whether any font used by a page is embedded.
pub fn has_embedded_fonts(backend: &LopdfBackend, pages: &PageIndex) -> bool {
    pages.iter().any(|(_, page)| {
        backend
            .page_resources(page)
            .and_then(|resources| backend.get_dict(resources, b"Font"))
            .is_some_and(|fonts| {
                fonts
                    .iter()
                    .filter_map(|(_, font)| backend.resolve_dict(font))
                    .any(|font| has_font_file(backend, font))
            })
    })
}

/// Number of distinct image XObjects across all pages.
pub fn num_images(backend: &LopdfBackend, pages: &PageIndex) -> usize {
    let mut seen = HashSet::new();
    let mut direct = 0;
    for (_, page) in pages.iter() {
        for image in page_images(backend, page) {
            match image.id {
                Some(id) => {
                    seen.insert(id);
                }
                None => direct += 1,
            }
        }
    }
    seen.len() + direct
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Inventory of a document, printed by `pdfwam info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub version: String,
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
    pub creator: Option<String>,
    pub encrypted: bool,
    pub tagged: bool,
    pub structure_tree: bool,
    pub scanned: bool,
    pub bookmarks: bool,
    pub forms: bool,
    pub form_fields: usize,
    pub text_input_form: bool,
    pub external_links: bool,
    pub multimedia: bool,
    pub embedded_multimedia: bool,
    pub embedded_fonts: bool,
    pub images: usize,
    pub multi_column_pages: Vec<u32>,
}

/// Inventory of the document. `scanned` is the result of [`is_scanned`].
pub fn summarize(backend: &LopdfBackend, scanned: bool) -> DocumentSummary {
    let pages = PageIndex::new(backend);
    let meta = backend.metadata();
    let structure_tree = struct_tree_root(backend).is_some();

    DocumentSummary {
        version: backend.version().to_string(),
        page_count: pages.len(),
        title: meta.get("Title").cloned(),
        author: meta.get("Author").cloned(),
        producer: meta.get("Producer").cloned(),
        creator: meta.get("Creator").cloned(),
        encrypted: backend.encryption().is_some(),
        tagged: is_tagged(backend),
        structure_tree,
        scanned,
        bookmarks: has_bookmarks(backend),
        forms: has_forms(backend),
        form_fields: form_object(backend).map_or(0, |form| num_form_fields(backend, form)),
        text_input_form: has_text_input_form(backend),
        external_links: has_external_links(backend, &pages),
        multimedia: has_multimedia(backend, &pages),
        embedded_multimedia: has_embedded_multimedia(backend, &pages),
        embedded_fonts: has_embedded_fonts(backend, &pages),
        images: num_images(backend, &pages),
        multi_column_pages: multi_column_pages(backend, &pages),
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{dictionary, Stream};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::fixtures::{int, name, op, refs, text, DocBuilder};

    fn image(builder: &mut DocBuilder) -> ObjectId {
        builder.add(Stream::new(
            dictionary! { "Subtype" => "Image", "BitsPerComponent" => int(8) },
            vec![0],
        ))
    }

    fn scan_page(builder: &mut DocBuilder, img: ObjectId) -> ObjectId {
        builder.page(dictionary! {
            "Resources" => dictionary! { "XObject" => dictionary! { "Im0" => img } },
        })
    }

    // -- headings -----------------------------------------------------------

    #[test]
    fn headings_are_grouped_by_page() {
        let mut builder = DocBuilder::new();
        let first = builder.page(dictionary! {});
        let second = builder.page(dictionary! {});
        let h1 = builder.add(dictionary! { "S" => "H1", "Pg" => first });
        let h2 = builder.add(dictionary! { "S" => "H2", "K" => dictionary! { "Pg" => second } });
        let para = builder.add(dictionary! { "S" => "P", "Pg" => first });
        builder.catalog(
            "StructTreeRoot",
            dictionary! {
                "ParentTree" => dictionary! {
                    "Nums" => vec![int(0), refs(&[h1, para]), int(1), refs(&[h2])],
                },
            },
        );
        let backend = builder.build();
        let root = struct_tree_root(&backend).unwrap();
        let numbers = NumbersTree::from_struct_root(&backend, root);
        let pages = PageIndex::new(&backend);

        let headings = headings_by_page(&backend, &numbers, &pages);
        assert_eq!(headings, BTreeMap::from([(1, vec![1]), (2, vec![2])]));
        assert!(headers_consistent(&backend, &numbers, &pages).passed());
    }

    #[test]
    fn skipped_heading_level_reports_page() {
        let mut builder = DocBuilder::new();
        let first = builder.page(dictionary! {});
        let second = builder.page(dictionary! {});
        let h1 = builder.add(dictionary! { "S" => "H1", "Pg" => first });
        let h3 = builder.add(dictionary! { "S" => "H3", "Pg" => second });
        builder.catalog(
            "StructTreeRoot",
            dictionary! {
                "ParentTree" => dictionary! { "Nums" => vec![int(0), refs(&[h1, h3])] },
            },
        );
        let backend = builder.build();
        let root = struct_tree_root(&backend).unwrap();
        let numbers = NumbersTree::from_struct_root(&backend, root);

        let check = headers_consistent(&backend, &numbers, &PageIndex::new(&backend));
        assert_eq!(
            check,
            HeadingCheck::SkippedLevel {
                page: 2,
                from: 1,
                to: 3
            }
        );
    }

    // -- bookmarks ----------------------------------------------------------

    #[test]
    fn bookmarks_by_count_or_first_and_last() {
        let mut builder = DocBuilder::new();
        builder.catalog("Outlines", dictionary! { "Count" => int(3) });
        assert!(has_bookmarks(&builder.build()));

        let mut builder = DocBuilder::new();
        let item = builder.add(dictionary! { "Title" => text("Intro") });
        builder.catalog("Outlines", dictionary! { "First" => item, "Last" => item });
        assert!(has_bookmarks(&builder.build()));

        let mut builder = DocBuilder::new();
        builder.catalog("Outlines", dictionary! { "Count" => int(0) });
        assert!(!has_bookmarks(&builder.build()));

        assert!(!has_bookmarks(&DocBuilder::new().build()));
    }

    // -- scanned ------------------------------------------------------------

    #[test]
    fn scanner_producer_marks_document_scanned() {
        let mut builder = DocBuilder::new();
        builder.page(dictionary! {});
        builder.info(dictionary! { "Producer" => text("Canon iR C2880 v1") });
        let backend = builder.build();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(is_scanned(&backend, &PageIndex::new(&backend), true, &mut rng));
    }

    #[test]
    fn image_only_pages_are_scanned_unless_tagged() {
        let mut builder = DocBuilder::new();
        let img = image(&mut builder);
        for _ in 0..4 {
            scan_page(&mut builder, img);
        }
        let backend = builder.build();
        let pages = PageIndex::new(&backend);
        let mut rng = StdRng::seed_from_u64(42);

        assert!(is_scanned(&backend, &pages, false, &mut rng));
        assert!(!is_scanned(&backend, &pages, true, &mut rng));
    }

    #[test]
    fn text_page_is_not_scanned() {
        let mut builder = DocBuilder::new();
        let img = image(&mut builder);
        scan_page(&mut builder, img);
        builder.page(dictionary! {
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => dictionary! {} } },
        });
        let backend = builder.build();
        let mut rng = StdRng::seed_from_u64(0);

        assert!(!is_scanned(&backend, &PageIndex::new(&backend), false, &mut rng));
    }

    #[test]
    fn empty_document_is_not_scanned() {
        let backend = DocBuilder::new().build();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(!is_scanned(&backend, &PageIndex::new(&backend), false, &mut rng));
    }

    // -- columns ------------------------------------------------------------

    fn matrix(x: i64, y: i64) -> lopdf::content::Operation {
        op("Tm", vec![int(1), int(0), int(0), int(1), int(x), int(y)])
    }

    #[test]
    fn second_column_is_detected() {
        let mut builder = DocBuilder::new();
        let page = builder.page_with_content(
            dictionary! { "CropBox" => vec![int(0), int(0), int(600), int(800)] },
            vec![
                op("BT", vec![]),
                matrix(50, 300),
                op("Tj", vec![text("left")]),
                matrix(50, 200),
                op("Tj", vec![text("left")]),
                matrix(320, 700),
                op("Tj", vec![text("right")]),
                op("ET", vec![]),
            ],
        );
        let backend = builder.build();
        assert!(page_has_columns(&backend, page));
    }

    #[test]
    fn single_column_and_tables_are_not_columns() {
        let mut builder = DocBuilder::new();
        let crop = || dictionary! { "CropBox" => vec![int(0), int(0), int(600), int(800)] };
        let single = builder.page_with_content(
            crop(),
            vec![
                matrix(50, 700),
                op("Tj", vec![text("a")]),
                matrix(50, 600),
                op("Tj", vec![text("b")]),
            ],
        );
        let table = builder.page_with_content(
            crop(),
            vec![
                matrix(300, 300),
                op("Tj", vec![text("cell")]),
                matrix(100, 300),
                matrix(400, 700),
            ],
        );
        let no_crop = builder.page_with_content(
            dictionary! {},
            vec![matrix(50, 100), op("Tj", vec![text("a")]), matrix(300, 700)],
        );
        let backend = builder.build();

        assert!(!page_has_columns(&backend, single));
        assert!(!page_has_columns(&backend, table));
        assert!(!page_has_columns(&backend, no_crop));
        assert!(multi_column_pages(&backend, &PageIndex::new(&backend)).is_empty());
    }

    // -- forms --------------------------------------------------------------

    #[test]
    fn form_fields_are_flattened() {
        let mut builder = DocBuilder::new();
        let kid_a = builder.add(dictionary! { "FT" => "Tx", "T" => text("a") });
        let kid_b = builder.add(dictionary! { "FT" => "Tx", "T" => text("b") });
        let parent = builder.add(dictionary! { "T" => text("group"), "Kids" => refs(&[kid_a, kid_b]) });
        let single = builder.add(dictionary! { "FT" => "Btn", "T" => text("ok") });
        builder.catalog("AcroForm", dictionary! { "Fields" => refs(&[parent, single]) });
        let backend = builder.build();
        let form = form_object(&backend).unwrap();

        let fields = form_fields(&backend, form);
        let ids: Vec<_> = fields.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![Some(parent), Some(kid_a), Some(kid_b), Some(single)]);
        assert!(!fields[0].is_leaf());
        assert!(fields[1].is_leaf());

        assert_eq!(num_form_fields(&backend, form), 3);
        assert!(has_forms(&backend));
        assert!(has_valid_forms(&backend));
        assert!(has_text_input_form(&backend));
    }

    #[test]
    fn field_cycles_are_cut() {
        let mut builder = DocBuilder::new();
        let a = builder.reserve();
        let b = builder.add(dictionary! { "Kids" => refs(&[a]) });
        builder.set(a, dictionary! { "Kids" => refs(&[b]) });
        builder.catalog("AcroForm", dictionary! { "Fields" => refs(&[a]) });
        let backend = builder.build();

        let form = form_object(&backend).unwrap();
        assert_eq!(form_fields(&backend, form).len(), 2);
    }

    #[test]
    fn no_form() {
        let backend = DocBuilder::new().build();
        assert!(!has_forms(&backend));
        assert!(!has_valid_forms(&backend));
        assert!(!has_text_input_form(&backend));
    }

    // -- annotations --------------------------------------------------------

    #[test]
    fn links_and_multimedia() {
        let mut builder = DocBuilder::new();
        let link = builder.add(dictionary! {
            "Subtype" => "Link",
            "A" => dictionary! { "S" => "URI", "URI" => text("https://example.org") },
        });
        let movie = builder.add(dictionary! {
            "Subtype" => "Movie",
            "Movie" => dictionary! { "F" => dictionary! { "FS" => "URL", "F" => text("https://example.org/a.mov") } },
        });
        builder.page(dictionary! {});
        builder.page(dictionary! { "Annots" => refs(&[link, movie]) });
        let backend = builder.build();
        let pages = PageIndex::new(&backend);

        let links = external_links(&backend, &pages);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].page, 2);
        assert_eq!(links[0].id, Some(link));
        assert!(has_external_links(&backend, &pages));
        assert!(has_multimedia(&backend, &pages));
        assert!(!has_embedded_multimedia(&backend, &pages));
    }

    #[test]
    fn file_attachments_are_embedded_multimedia() {
        let mut builder = DocBuilder::new();
        builder.page(dictionary! {
            "Annots" => vec![dictionary! { "Subtype" => "FileAttachment" }.into()],
        });
        let backend = builder.build();
        let pages = PageIndex::new(&backend);
        assert!(has_embedded_multimedia(&backend, &pages));
        assert!(!has_external_links(&backend, &pages));
    }

    // -- resources ----------------------------------------------------------

    #[test]
    fn embedded_fonts_through_descendants() {
        let mut builder = DocBuilder::new();
        let descriptor = builder.add(dictionary! { "FontFile2" => int(0) });
        let cid = builder.add(dictionary! { "FontDescriptor" => descriptor });
        let font = builder.add(dictionary! { "Subtype" => "Type0", "DescendantFonts" => refs(&[cid]) });
        builder.page(dictionary! {
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font } },
        });
        let backend = builder.build();
        assert!(has_embedded_fonts(&backend, &PageIndex::new(&backend)));

        let mut builder = DocBuilder::new();
        builder.page(dictionary! {
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => dictionary! { "BaseFont" => name("Helvetica") } },
            },
        });
        let backend = builder.build();
        assert!(!has_embedded_fonts(&backend, &PageIndex::new(&backend)));
    }

    #[test]
    fn shared_images_count_once() {
        let mut builder = DocBuilder::new();
        let shared = image(&mut builder);
        let other = image(&mut builder);
        scan_page(&mut builder, shared);
        builder.page(dictionary! {
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => shared, "Im1" => other },
            },
        });
        let backend = builder.build();
        assert_eq!(num_images(&backend, &PageIndex::new(&backend)), 2);
    }

    #[test]
    fn summary_of_tagged_document() {
        let mut builder = DocBuilder::new();
        builder.page(dictionary! {});
        builder.catalog("MarkInfo", dictionary! { "Marked" => true });
        builder.catalog("StructTreeRoot", dictionary! { "Type" => "StructTreeRoot" });
        builder.info(dictionary! { "Title" => text("Budget") });
        let backend = builder.build();
        let summary = summarize(&backend, false);
        assert_eq!(summary.page_count, 1);
        assert_eq!(summary.title.as_deref(), Some("Budget"));
        assert!(summary.tagged);
        assert!(summary.structure_tree);
        assert!(!summary.scanned);
        assert!(!summary.forms);
        assert_eq!(summary.version, "1.7");
    }
}
