//! WCAG 2.0 PDF techniques.
//!
//! Each test returns a [`TestOutcome`]: a document-wide status, or fail and
//! pass results per page. The link tests (11 and 13) share one pass over the
//! link annotations and return a [`LinkOutcome`].

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use lopdf::{Dictionary, Object};
use pdfwam_core::awam::{Location, Status};
use pdfwam_core::ids::TestId;
use regex::Regex;

use crate::artifacts::{ArtifactCache, ArtifactElement};
use crate::backend::{decode_text_simple, LopdfBackend, PdfValue};
use crate::checks::{external_links, form_fields, form_object, has_external_links};
use crate::pages::PageIndex;
use crate::structure::{AwamHandler, ElemKey};

/// Field types a form field may declare.
const FIELD_TYPES: [&str; 4] = ["Tx", "Btn", "Ch", "Sig"];

/// Push-button flag of a button field's `Ff`.
const PUSHBUTTON_FLAG: i64 = 1 << 16;

const PAGE_LABEL_STYLES: [&str; 5] = ["D", "r", "R", "A", "a"];

static IMAGE_XOBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(Im|Fm)\d+").expect("valid xobject regex"));

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What a per-page result was recorded for. Repeats on a page count once.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Page,
    Table(usize),
    Operands(Vec<PdfValue>),
}

/// Fail and pass results grouped by page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResults {
    fail: BTreeMap<u32, Vec<Target>>,
    pass: BTreeMap<u32, Vec<Target>>,
}

impl PageResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, status: Status, page: u32, target: Target) {
        let bucket = match status {
            Status::Fail => &mut self.fail,
            Status::Pass => &mut self.pass,
            Status::NotApplicable => return,
        };
        let targets = bucket.entry(page).or_default();
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    pub fn fail(&mut self, page: u32, target: Target) {
        self.update(Status::Fail, page, target);
    }

    pub fn pass(&mut self, page: u32, target: Target) {
        self.update(Status::Pass, page, target);
    }

    /// Number of failed and passed targets.
    pub fn counts(&self) -> (usize, usize) {
        let count = |bucket: &BTreeMap<u32, Vec<Target>>| bucket.values().map(Vec::len).sum();
        (count(&self.fail), count(&self.pass))
    }

    pub fn is_empty(&self) -> bool {
        self.fail.is_empty() && self.pass.is_empty()
    }

    /// Results as AWAM locations: failures first, then passes, each at
    /// `(page, n)` with `n` counting every target from 1.
    pub fn entries(&self) -> Vec<(Location, Status)> {
        let buckets = [(Status::Fail, &self.fail), (Status::Pass, &self.pass)];
        let mut seq = 0;
        let mut entries = Vec::new();
        for (status, bucket) in buckets {
            for (&page, targets) in bucket {
                for _ in targets {
                    seq += 1;
                    entries.push((Location::new(page, seq), status));
                }
            }
        }
        entries
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    Status(Status),
    Pages(PageResults),
}

impl From<Status> for TestOutcome {
    fn from(status: Status) -> Self {
        TestOutcome::Status(status)
    }
}

/// Results of the link text (11) and link alternate text (13) tests.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOutcome {
    /// The document has no link annotations.
    NotApplicable,
    /// Links exist but nothing is tagged.
    Untagged,
    Checked {
        text: BTreeMap<Location, Status>,
        alt: BTreeMap<Location, Status>,
    },
}

// ---------------------------------------------------------------------------
// Suite
// ---------------------------------------------------------------------------

/// Tests run after the structure tree was walked.
pub struct WcagSuite<'a, 'c> {
    backend: &'a LopdfBackend,
    struct_root: Option<&'a Dictionary>,
    handler: &'c AwamHandler<'a>,
    artifacts: &'c mut ArtifactCache,
}

impl<'a, 'c> WcagSuite<'a, 'c> {
    pub fn new(
        backend: &'a LopdfBackend,
        struct_root: Option<&'a Dictionary>,
        handler: &'c AwamHandler<'a>,
        artifacts: &'c mut ArtifactCache,
    ) -> Self {
        Self {
            backend,
            struct_root,
            handler,
            artifacts,
        }
    }

    fn pages(&self) -> &'c PageIndex {
        self.handler.pages()
    }

    /// Run a test with a document or per-page outcome. The link tests and
    /// the tests decided while reading the document return `None`.
    pub fn run(&mut self, test: TestId) -> Option<TestOutcome> {
        let outcome = match test {
            TestId::TabOrder => self.tab_order().into(),
            TestId::ArtifactImages => self.artifact_images(),
            TestId::AccessibleTables => self.accessible_tables(),
            TestId::FormFields => self.form_fields().into(),
            TestId::RunningHeaders => self.running_headers(),
            TestId::SubmitButtons => self.submit_buttons().into(),
            TestId::PageNumbering => self.page_numbering().into(),
            _ => return None,
        };
        log::info!("{test} - {outcome:?}");
        Some(outcome)
    }

    // -- 03 ---------------------------------------------------------------

    /// Tab order follows the structure: tagged documents pass, others need
    /// `Tabs /S` on every page.
    pub fn tab_order(&self) -> Status {
        if self.struct_root.is_some() {
            return Status::Pass;
        }
        let pages = self.pages();
        let structured = pages
            .iter()
            .filter_map(|(_, page)| self.backend.page_dict(page))
            .filter(|page| self.backend.get_name(page, b"Tabs").as_deref() == Some("S"))
            .count();
        Status::from(structured == pages.len())
    }

    // -- 04 ---------------------------------------------------------------

    /// Artifacts must be opened with the right operand count. Artifacts that
    /// paint `ImN` or `FmN` XObjects pass their page.
    pub fn artifact_images(&mut self) -> TestOutcome {
        let mut results = PageResults::new();
        let mut image_artifacts = 0;

        for (number, page) in self.pages().iter() {
            for element in self.artifacts.elements(self.backend, page) {
                let expected = match element.opening.operator.as_str() {
                    "BMC" => Some(1),
                    "BDC" => Some(2),
                    _ => None,
                };
                if expected.is_some_and(|n| element.opening.operands.len() != n) {
                    log::debug!(
                        "page {number}: malformed artifact {:?}",
                        element.opening.operands
                    );
                    results.fail(number, Target::Operands(element.opening.operands.clone()));
                }
                if paints_xobject(element) {
                    image_artifacts += 1;
                    results.pass(number, Target::Page);
                }
            }
        }

        log::info!("{image_artifacts} image artifacts");
        if image_artifacts == 0 {
            return Status::NotApplicable.into();
        }
        TestOutcome::Pages(results)
    }

    // -- 06 ---------------------------------------------------------------

    pub fn accessible_tables(&self) -> TestOutcome {
        let tables = self.handler.tables();
        if tables.is_empty() {
            return Status::NotApplicable.into();
        }

        let mut results = PageResults::new();
        for (index, table) in tables.iter().enumerate() {
            let status = Status::from(!table.is_invalid());
            results.update(status, table.page(), Target::Table(index));
        }
        TestOutcome::Pages(results)
    }

    // -- 12 ---------------------------------------------------------------

    /// Every leaf form field needs a known type, a name and a value or
    /// state. Buttons are not checked.
    pub fn form_fields(&self) -> Status {
        let Some(form) = form_object(self.backend) else {
            return Status::NotApplicable;
        };

        for field in form_fields(self.backend, form) {
            if !field.is_leaf() {
                continue;
            }
            let dict = field.dict;
            let Some(role) = self.backend.get_name(dict, b"FT") else {
                continue;
            };
            if !FIELD_TYPES.contains(&role.as_str()) {
                log::debug!("form field {:?} has unknown type {role}", field.id);
                return Status::Fail;
            }
            if role == "Btn" {
                continue;
            }

            let name_key: &[u8] = if dict.has(b"TU") { b"TU" } else { b"T" };
            if !dict.has(name_key) {
                log::debug!("form field {:?} has no name", field.id);
                return Status::Fail;
            }
            if self
                .backend
                .get_text(dict, name_key)
                .unwrap_or_default()
                .is_empty()
            {
                log::debug!("form field {:?} has an empty name", field.id);
                return Status::Fail;
            }

            if dict.has(b"V") || dict.has(b"DV") || dict.has(b"Opt") {
                continue;
            }
            match self.backend.get(dict, b"Ff") {
                Some(Object::Integer(_)) => {}
                Some(state) => {
                    log::debug!("form field {:?} has state {state:?}", field.id);
                    return Status::Fail;
                }
                None => log::debug!("form field {:?} has no value or state", field.id),
            }
        }

        Status::Pass
    }

    // -- 14 ---------------------------------------------------------------

    /// Pages after the first need a header and a footer, or top and bottom
    /// pagination artifacts.
    pub fn running_headers(&mut self) -> TestOutcome {
        let mut markers: HashSet<(u32, String)> = HashSet::new();

        for (number, page) in self.pages().iter() {
            for element in self.artifacts.elements(self.backend, page) {
                collect_pagination_marker(element, number, &mut markers);
            }
        }

        let page_count = self.pages().len() as u32;
        if page_count <= 1 {
            return Status::NotApplicable.into();
        }

        let has = |page: u32, side: &str| markers.contains(&(page, side.to_string()));
        let mut results = PageResults::new();
        let mut failed = 0;
        for page in 2..=page_count {
            let framed = (has(page, "Header") && has(page, "Footer"))
                || (has(page, "Top") && has(page, "Bottom"));
            if framed {
                results.pass(page, Target::Page);
            } else {
                failed += 1;
                results.fail(page, Target::Page);
            }
        }

        if failed == page_count - 1 {
            return Status::Fail.into();
        }
        TestOutcome::Pages(results)
    }

    // -- 15 ---------------------------------------------------------------

    /// A push button with a caption, a script or a submit action.
    pub fn submit_buttons(&self) -> Status {
        let Some(form) = form_object(self.backend) else {
            return Status::NotApplicable;
        };

        for field in form_fields(self.backend, form) {
            let flags = self
                .backend
                .inherited(field.dict, b"Ff")
                .and_then(|ff| ff.as_i64().ok())
                .unwrap_or(0);
            if flags & PUSHBUTTON_FLAG == 0 {
                continue;
            }

            let caption = self
                .backend
                .get_dict(field.dict, b"MK")
                .is_some_and(|mk| mk.has(b"CA"));
            if caption {
                return Status::Pass;
            }

            let action = self.backend.get_dict(field.dict, b"A").unwrap_or(field.dict);
            match self.backend.get_name(action, b"S").as_deref() {
                Some(kind) if kind.eq_ignore_ascii_case("JavaScript") => {
                    if action.has(b"JS") {
                        return Status::Pass;
                    }
                    log::debug!("push button {:?} runs JavaScript without JS", field.id);
                    return Status::Fail;
                }
                Some("SubmitForm") => return Status::Pass,
                _ => {}
            }
        }

        log::info!("no submit button found");
        Status::NotApplicable
    }

    // -- 17 ---------------------------------------------------------------

    /// `PageLabels` must map page 0 and give every range a numbering style.
    pub fn page_numbering(&self) -> Status {
        let Some(labels) = self
            .backend
            .catalog()
            .and_then(|catalog| self.backend.get_dict(catalog, b"PageLabels"))
        else {
            return Status::NotApplicable;
        };
        let Some(nums) = self.backend.get_array(labels, b"Nums") else {
            log::info!("page labels without Nums");
            return Status::Fail;
        };
        if nums.len() % 2 != 0 {
            log::info!("page labels Nums has odd length");
            return Status::Fail;
        }

        let starts_at_zero = nums
            .chunks_exact(2)
            .any(|pair| self.backend.resolve(&pair[0]).and_then(|k| k.as_i64().ok()) == Some(0));
        if !starts_at_zero {
            log::info!("page labels do not cover the first page");
            return Status::Fail;
        }

        let styled = nums.chunks_exact(2).all(|pair| {
            self.backend
                .resolve_dict(&pair[1])
                .and_then(|label| self.backend.get_name(label, b"S"))
                .is_some_and(|style| PAGE_LABEL_STYLES.contains(&style.as_str()))
        });
        Status::from(styled)
    }

    // -- 11 / 13 ----------------------------------------------------------

    /// Every external link must be reachable from a `Link` element (11) and
    /// carry alternate text (13).
    pub fn links(&self) -> LinkOutcome {
        let pages = self.pages();
        if !has_external_links(self.backend, pages) {
            return LinkOutcome::NotApplicable;
        }
        if self.struct_root.map_or(true, Dictionary::is_empty) {
            log::info!("links in a document without structure tree");
            return LinkOutcome::Untagged;
        }

        let mut text = BTreeMap::new();
        let mut alt = BTreeMap::new();
        for (index, link) in external_links(self.backend, pages).into_iter().enumerate() {
            let annotation = link.annotation;
            let has_uri = self
                .backend
                .get_dict(annotation, b"A")
                .is_some_and(|action| action.has(b"URI"));
            if !has_uri {
                continue;
            }

            let location = Location::new(link.page, index as u32 + 1);
            let tagged = self
                .handler
                .link(ElemKey::from_id(link.id, annotation))
                .is_some();
            let complete = annotation.has(b"Rect") && annotation.has(b"A");
            if !tagged {
                log::debug!("page {}: link without a Link element", link.page);
            }
            text.insert(location, Status::from(tagged && complete));

            let described = self
                .backend
                .get_text(annotation, b"Alt")
                .is_some_and(|alt| !alt.is_empty());
            alt.insert(location, Status::from(described));
        }

        LinkOutcome::Checked { text, alt }
    }
}

fn paints_xobject(element: &ArtifactElement) -> bool {
    element.body.iter().any(|op| {
        let first = match op.operands.first() {
            Some(PdfValue::Name(_)) => op.operands[0].as_name_str(),
            Some(PdfValue::Str(bytes)) => Some(decode_text_simple(bytes)),
            _ => None,
        };
        first.is_some_and(|operand| IMAGE_XOBJECT.is_match(&operand))
    })
}

fn value_text(value: &PdfValue) -> Option<String> {
    match value {
        PdfValue::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        PdfValue::Str(bytes) => Some(decode_text_simple(bytes)),
        _ => None,
    }
}

/// Note the header, footer, top or bottom marker an artifact puts on a page.
///
/// A second header on the same page counts as the footer and vice versa.
fn collect_pagination_marker(
    element: &ArtifactElement,
    page: u32,
    markers: &mut HashSet<(u32, String)>,
) {
    let property = |key: &[u8]| element.property(key).and_then(value_text);
    if property(b"Type").as_deref() != Some("Pagination") {
        return;
    }

    let Some(subtype) = property(b"Subtype") else {
        let attached = match element.property(b"Attached") {
            Some(PdfValue::Array(items)) => items.first().and_then(value_text),
            Some(value) => value_text(value),
            None => None,
        };
        if let Some(side) = attached {
            markers.insert((page, side));
        }
        return;
    };

    let other = match subtype.as_str() {
        "Header" => "Footer",
        "Footer" => "Header",
        _ => return,
    };
    let text = property(b"Contents").unwrap_or_else(|| element.text());
    if text.is_empty() {
        return;
    }
    if !markers.insert((page, subtype)) {
        markers.insert((page, other.to_string()));
    }
}
