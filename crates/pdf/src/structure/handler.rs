//! Per-element accessibility checks.
//!
//! [`AwamHandler`] receives structure elements from the walker and records
//! results into the AWAM map, while keeping the registries later tests
//! build on: figures, tables, link annotations and failed images.

use std::collections::{BTreeMap, HashMap, HashSet};

use lopdf::{Dictionary, Object};
use pdfwam_core::awam::{AwamKindError, AwamResultMap, Location, Status};
use pdfwam_core::ids::{self, TestId};
use pdfwam_core::table::{TableStructure, TableTag};

use super::walker::ElementVisitor;
use super::{ElemKey, StructElement, StructKind};
use crate::backend::LopdfBackend;
use crate::pages::{page_images, PageImage, PageIndex};

/// Switches for the element checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Only record figure results on pages that really hold images.
    pub validate_images: bool,
    /// With `validate_images`, skip pages whose images are all 1-bit.
    pub ignore_single_bit_images: bool,
    /// Check `Lang` on `Document` elements.
    pub check_document_lang: bool,
}

/// A link annotation reached from a `Link` element.
#[derive(Debug, Clone, Copy)]
pub struct LinkAnnotation<'a> {
    pub annotation: &'a Dictionary,
    pub element: ElemKey,
}

pub struct AwamHandler<'a> {
    backend: &'a LopdfBackend,
    pages: PageIndex,
    options: HandlerOptions,
    results: AwamResultMap,
    element_count: u32,
    form_elements: usize,
    language_found: bool,
    figures: HashSet<ElemKey>,
    tables: Vec<TableStructure<ElemKey>>,
    table_index: HashMap<ElemKey, usize>,
    current_table: Option<usize>,
    links: HashMap<ElemKey, LinkAnnotation<'a>>,
    failed_images: BTreeMap<u32, Vec<ElemKey>>,
}

impl<'a> AwamHandler<'a> {
    pub fn new(backend: &'a LopdfBackend, pages: PageIndex, options: HandlerOptions) -> Self {
        Self {
            backend,
            pages,
            options,
            results: AwamResultMap::new(),
            element_count: 0,
            form_elements: 0,
            language_found: false,
            figures: HashSet::new(),
            tables: Vec::new(),
            table_index: HashMap::new(),
            current_table: None,
            links: HashMap::new(),
            failed_images: BTreeMap::new(),
        }
    }

    pub fn results(&self) -> &AwamResultMap {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut AwamResultMap {
        &mut self.results
    }

    pub fn into_results(self) -> AwamResultMap {
        self.results
    }

    pub fn pages(&self) -> &PageIndex {
        &self.pages
    }

    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    pub fn form_elements(&self) -> usize {
        self.form_elements
    }

    /// Stop checking `Document` elements for a language.
    pub fn mark_language_found(&mut self) {
        self.language_found = true;
    }

    pub fn figure_count(&self) -> usize {
        self.figures.len()
    }

    /// Figures without alternate text, by page (0 when pages are not tracked).
    pub fn failed_images(&self) -> &BTreeMap<u32, Vec<ElemKey>> {
        &self.failed_images
    }

    pub fn failed_image_count(&self) -> usize {
        self.failed_images.values().map(Vec::len).sum()
    }

    pub fn tables(&self) -> &[TableStructure<ElemKey>] {
        &self.tables
    }

    /// The link registration for an annotation, if a `Link` element owns it.
    pub fn link(&self, annotation: ElemKey) -> Option<&LinkAnnotation<'a>> {
        self.links.get(&annotation)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    // -- element checks -----------------------------------------------------

    /// Kids of an element that point at an object (`OBJR` style).
    fn object_kids(&self, element: &StructElement<'a>) -> Vec<&'a Dictionary> {
        let Ok(kids) = element.dict.get(b"K") else {
            return Vec::new();
        };
        let kids = match self.backend.resolve(kids) {
            Some(Object::Array(items)) => items.as_slice(),
            _ => std::slice::from_ref(kids),
        };
        kids.iter()
            .filter_map(|kid| self.backend.resolve_dict(kid))
            .filter(|kid| kid.has(b"Obj"))
            .collect()
    }

    fn register_link(&mut self, element: &StructElement<'a>) {
        for kid in self.object_kids(element) {
            if self.backend.get_name(kid, b"Type").as_deref() != Some("OBJR") {
                continue;
            }
            let Ok(obj) = kid.get(b"Obj") else {
                continue;
            };
            let Some(annotation) = self.backend.resolve_dict(obj) else {
                continue;
            };
            self.links
                .entry(ElemKey::of(obj, annotation))
                .or_insert(LinkAnnotation {
                    annotation,
                    element: element.key,
                });
        }
    }

    fn track_table(&mut self, element: &StructElement<'a>, tag: TableTag) {
        if tag == TableTag::Table {
            let tables = &mut self.tables;
            let index = *self.table_index.entry(element.key).or_insert_with(|| {
                tables.push(TableStructure::new());
                tables.len() - 1
            });
            self.current_table = Some(index);
        }

        let Some(index) = self.current_table else {
            log::debug!("{tag} element outside of any table");
            return;
        };
        let table = &mut self.tables[index];

        if table.page() == 0 {
            if let Some(page) = element
                .dict
                .get(b"Pg")
                .ok()
                .and_then(|pg| self.pages.number_of_object(pg))
            {
                table.set_page(page);
            }
        }

        if let Err(err) = table.add(element.key, tag) {
            log::info!("table on page {}: {err}", table.page());
        }
    }

    fn check_form(&mut self, element: &StructElement<'a>) -> Result<(), AwamKindError> {
        if self.object_kids(element).is_empty() {
            log::debug!("form element {:?} has no widget annotation", element.key);
            return self
                .results
                .reset(ids::FORM_STRUCTURE, Location::document(), Status::Fail);
        }
        self.form_elements += 1;
        Ok(())
    }

    fn check_document(&mut self, element: &StructElement<'a>) -> Result<(), AwamKindError> {
        if !self.options.check_document_lang || self.language_found {
            return Ok(());
        }
        let Some(language_id) = TestId::Language.awam_id() else {
            return Ok(());
        };

        let location = Location::new(0, self.element_count);
        match self.backend.get_text(element.dict, b"Lang") {
            Some(lang) => {
                self.results.record(language_id, location, Status::Pass)?;
                self.results.record(ids::DOCUMENT_LANG_VALUE, location, lang)?;
                self.language_found = true;
            }
            None => self.results.record(language_id, location, Status::Fail)?,
        }
        Ok(())
    }

    fn check_figure(&mut self, element: &StructElement<'a>) -> Result<(), AwamKindError> {
        if self.figures.contains(&element.key) {
            return Ok(());
        }

        let has_alt = element.dict.has(b"Alt");
        let has_actual_text = element.dict.has(b"ActualText");

        let page = if self.options.validate_images {
            match self.figure_page(element) {
                Some(page) => page,
                None => return Ok(()),
            }
        } else {
            0
        };

        let location = Location::new(page, self.element_count);
        self.results
            .record(ids::FIGURE_ALT, location, Status::from(has_alt))?;
        self.results
            .record(ids::FIGURE_ACTUAL_TEXT, location, Status::from(has_actual_text))?;

        if !has_alt && !has_actual_text {
            self.failed_images
                .entry(page)
                .or_default()
                .push(element.key);
        }
        self.figures.insert(element.key);
        Ok(())
    }

    /// Page of a figure whose page really shows images.
    fn figure_page(&self, element: &StructElement<'a>) -> Option<u32> {
        let Some(page) = element
            .dict
            .get(b"Pg")
            .ok()
            .and_then(|pg| self.pages.number_of_object(pg))
        else {
            log::debug!("figure {:?} has no resolvable page", element.key);
            return None;
        };
        let images = self
            .pages
            .id_of(page)
            .map(|id| page_images(self.backend, id))
            .unwrap_or_default();

        if images.is_empty() {
            log::debug!("figure on page {page} but the page has no images");
            return None;
        }
        if self.options.ignore_single_bit_images && images.iter().all(PageImage::is_single_bit) {
            log::debug!("ignoring 1-bit images on page {page}");
            return None;
        }
        Some(page)
    }
}

impl<'a> ElementVisitor<'a> for AwamHandler<'a> {
    fn visit(&mut self, element: &StructElement<'a>) -> Result<(), AwamKindError> {
        self.element_count += 1;

        match element.kind {
            StructKind::Link => self.register_link(element),
            StructKind::Table(tag) => self.track_table(element, tag),
            StructKind::Form => self.check_form(element)?,
            StructKind::Document => self.check_document(element)?,
            StructKind::Figure => self.check_figure(element)?,
            StructKind::Heading(_) | StructKind::Other => {}
        }
        Ok(())
    }
}
