use std::collections::BTreeMap;
use std::sync::LazyLock;

use lopdf::{content::Content, Dictionary, Object};
use regex::bytes::Regex;

use crate::WamError;

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// An object identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type ObjectId = (u32, u16);

/// Reference chains longer than this are treated as dangling.
const MAX_REFERENCE_HOPS: usize = 32;

/// Page-tree ancestors searched for inherited attributes.
const MAX_INHERITANCE_DEPTH: usize = 64;

static VERSION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%PDF-(\d\.\d)").expect("valid version regex"));

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// A simplified, lopdf-independent representation of a PDF value.
///
/// Content-stream consumers work on this type so they can be driven by
/// hand-built operation lists in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(ObjectId),
}

impl PdfValue {
    pub fn name(name: &str) -> Self {
        PdfValue::Name(name.as_bytes().to_vec())
    }

    /// Name value rendered with its leading slash, e.g. `/Im1`.
    pub fn as_name_str(&self) -> Option<String> {
        match self {
            PdfValue::Name(n) => Some(format!("/{}", String::from_utf8_lossy(n))),
            _ => None,
        }
    }
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn new(operator: &str, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.to_string(),
            operands,
        }
    }
}

/// Encryption parameters read from the trailer before decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionInfo {
    /// Security handler revision (`R`), 2 when absent.
    pub revision: i64,
    /// Permission flags (`P`), 1 when absent.
    pub permissions: i64,
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Extract an `f32` from a [`PdfValue`], accepting both `Integer` and `Real`.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a `lopdf::Object` into a [`PdfValue`].
///
/// References are preserved as `PdfValue::Reference`. Streams keep only
/// their dictionary.
pub fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Null => PdfValue::Null,
        Object::Boolean(b) => PdfValue::Bool(*b),
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(f) => PdfValue::Real(*f),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(s, _) => PdfValue::Str(s.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        Object::Dictionary(dict) => PdfValue::Dict(convert_entries(dict)),
        Object::Stream(stream) => PdfValue::Dict(convert_entries(&stream.dict)),
        Object::Reference(id) => PdfValue::Reference(*id),
    }
}

fn convert_entries(dict: &Dictionary) -> Vec<(Vec<u8>, PdfValue)> {
    dict.iter()
        .map(|(k, v)| (k.clone(), convert_object(v)))
        .collect()
}

/// Best-effort decoding of raw PDF string bytes into a Rust `String`.
///
/// Handles three cases in order:
/// 1. UTF-16BE with BOM (`\xFE\xFF` prefix) -- strips BOM and decodes.
/// 2. Valid UTF-8 -- returned as-is.
/// 3. Fallback to Latin-1 (ISO 8859-1) -- each byte mapped to its Unicode
///    code point.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let code_units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

/// Version from the `%PDF-x.y` marker near the start of the file.
pub fn header_version(data: &[u8]) -> Option<String> {
    let head = &data[..data.len().min(1024)];
    VERSION_MARKER
        .captures(head)
        .and_then(|caps| caps.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
}

fn encryption_info(doc: &lopdf::Document) -> Option<EncryptionInfo> {
    let encrypt = match doc.trailer.get(b"Encrypt").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        Object::Dictionary(d) => d,
        _ => return None,
    };
    let integer = |key: &[u8]| encrypt.get(key).ok().and_then(|o| o.as_i64().ok());

    Some(EncryptionInfo {
        revision: integer(b"R").unwrap_or(2),
        permissions: integer(b"P").unwrap_or(1),
    })
}

fn decryption_error(err: lopdf::Error) -> WamError {
    let message = err.to_string();
    if message.to_lowercase().contains("unsupported") {
        WamError::UnsupportedAlgorithm(message)
    } else {
        WamError::DecryptionFailed(message)
    }
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// Page and content-stream access needed by the content checks.
///
/// Implemented by [`LopdfBackend`]; tests substitute canned operation lists.
pub trait PdfBackend {
    /// Return a mapping from 1-based page number to page [`ObjectId`].
    fn pages(&self) -> BTreeMap<u32, ObjectId>;

    /// Return the decompressed content stream bytes for a page.
    fn page_content(&self, page: ObjectId) -> Result<Vec<u8>, WamError>;

    /// Decode raw content-stream bytes into a sequence of [`ContentOp`]s.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, WamError>;

    /// Decoded operations of a page.
    fn page_operations(&self, page: ObjectId) -> Result<Vec<ContentOp>, WamError> {
        self.decode_content(&self.page_content(page)?)
    }
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] implementation backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
    encryption: Option<EncryptionInfo>,
}

impl LopdfBackend {
    /// Parse a PDF from an in-memory byte slice, decrypting it with
    /// `password` when needed.
    pub fn load_bytes(data: &[u8], password: &str) -> Result<Self, WamError> {
        if header_version(data).is_none() {
            return Err(WamError::UnreadableDocument(
                "missing %PDF version marker".into(),
            ));
        }

        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| WamError::UnreadableDocument(e.to_string()))?;

        Self::open(doc, password)
    }

    /// Wrap an already loaded document.
    pub fn open(mut doc: lopdf::Document, password: &str) -> Result<Self, WamError> {
        let encryption = encryption_info(&doc);

        if doc.is_encrypted() {
            log::debug!("document is encrypted, decrypting");
            doc.decrypt(password).map_err(decryption_error)?;
        }

        Ok(Self { doc, encryption })
    }

    /// Wrap an in-memory document without attempting decryption.
    pub fn from_document(doc: lopdf::Document) -> Self {
        let encryption = encryption_info(&doc);
        Self { doc, encryption }
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &lopdf::Document {
        &self.doc
    }

    /// Encryption parameters of the file, `None` when it is not encrypted.
    pub fn encryption(&self) -> Option<EncryptionInfo> {
        self.encryption
    }

    /// Declared PDF version, e.g. `1.7`.
    pub fn version(&self) -> &str {
        &self.doc.version
    }

    /// Total number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Extract metadata from the PDF trailer's Info dictionary.
    ///
    /// Returns a `BTreeMap` of keys such as `"Title"`, `"Author"`,
    /// `"Creator"`, `"Producer"`, `"CreationDate"`, and `"ModDate"`.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut meta = BTreeMap::new();

        let Some(info_dict) = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|obj| self.resolve_dict(obj))
        else {
            return meta;
        };

        let keys: &[&[u8]] = &[
            b"Title",
            b"Author",
            b"Creator",
            b"Producer",
            b"Subject",
            b"Keywords",
            b"CreationDate",
            b"ModDate",
        ];

        for key in keys {
            if let Some(value) = self.get_text(info_dict, key) {
                meta.insert(String::from_utf8_lossy(key).into_owned(), value);
            }
        }

        meta
    }

    // -- object resolution --------------------------------------------------

    /// Follow references until a direct object is reached.
    ///
    /// Returns `None` for dangling or overly long reference chains.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        let mut current = obj;
        for _ in 0..MAX_REFERENCE_HOPS {
            match current {
                Object::Reference(id) => current = self.doc.get_object(*id).ok()?,
                other => return Some(other),
            }
        }
        None
    }

    /// Resolve an object to a dictionary; streams yield their dictionary.
    pub fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj)? {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn resolve_array<'a>(&'a self, obj: &'a Object) -> Option<&'a [Object]> {
        match self.resolve(obj)? {
            Object::Array(arr) => Some(arr.as_slice()),
            _ => None,
        }
    }

    /// Look up `key` and resolve the value.
    pub fn get<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        self.resolve(dict.get(key).ok()?)
    }

    pub fn get_dict<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
        self.resolve_dict(dict.get(key).ok()?)
    }

    pub fn get_array<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [Object]> {
        self.resolve_array(dict.get(key).ok()?)
    }

    /// Name value of `key` without the leading slash.
    pub fn get_name(&self, dict: &Dictionary, key: &[u8]) -> Option<String> {
        match self.get(dict, key)? {
            Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
            _ => None,
        }
    }

    /// Text value of `key`, decoding strings and accepting names.
    pub fn get_text(&self, dict: &Dictionary, key: &[u8]) -> Option<String> {
        match self.get(dict, key)? {
            Object::String(bytes, _) => Some(decode_text_simple(bytes)),
            Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
            _ => None,
        }
    }

    pub fn get_i64(&self, dict: &Dictionary, key: &[u8]) -> Option<i64> {
        self.get(dict, key)?.as_i64().ok()
    }

    /// Number value of `key`, integer or real.
    pub fn get_f32(&self, dict: &Dictionary, key: &[u8]) -> Option<f32> {
        match self.get(dict, key)? {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(f) => Some(*f),
            _ => None,
        }
    }

    // -- document structure -------------------------------------------------

    /// The document catalog (`/Root`).
    pub fn catalog(&self) -> Option<&Dictionary> {
        self.doc.catalog().ok()
    }

    pub fn page_dict(&self, page: ObjectId) -> Option<&Dictionary> {
        self.doc.get_object(page).ok()?.as_dict().ok()
    }

    /// Look up a page attribute, walking up the page tree when the page
    /// inherits it.
    pub fn inherited<'a>(&'a self, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        let mut current = page;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Some(value) = self.get(current, key) {
                return Some(value);
            }
            current = self.get_dict(current, b"Parent")?;
        }
        None
    }

    /// Resource dictionary of a page, inherited if needed.
    pub fn page_resources(&self, page: ObjectId) -> Option<&Dictionary> {
        let page_dict = self.page_dict(page)?;
        match self.inherited(page_dict, b"Resources")? {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Resolved annotation dictionaries of a page with their object ids.
    ///
    /// Direct annotations carry no id.
    pub fn page_annotations(&self, page: ObjectId) -> Vec<(Option<ObjectId>, &Dictionary)> {
        let Some(annots) = self
            .page_dict(page)
            .and_then(|dict| self.get_array(dict, b"Annots"))
        else {
            return Vec::new();
        };

        annots
            .iter()
            .filter_map(|annot| {
                let id = annot.as_reference().ok();
                self.resolve_dict(annot).map(|dict| (id, dict))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// PdfBackend implementation for LopdfBackend
// ---------------------------------------------------------------------------

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, ObjectId> {
        self.doc.get_pages()
    }

    fn page_content(&self, page: ObjectId) -> Result<Vec<u8>, WamError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| WamError::Content(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, WamError> {
        let content = Content::decode(data)
            .map_err(|e| WamError::Content(format!("content stream decode error: {}", e)))?;

        let ops = content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect();

        Ok(ops)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use lopdf::{dictionary, Document, Stream};

    use super::*;
    use crate::fixtures::DocBuilder;

    // -- decode_text_simple -------------------------------------------------

    #[test]
    fn decode_text_simple_utf8() {
        assert_eq!(decode_text_simple("Hello, world!".as_bytes()), "Hello, world!");
    }

    #[test]
    fn decode_text_simple_latin1() {
        // 0xE9 is U+00E9 in Latin-1 but not valid standalone UTF-8.
        let input: &[u8] = &[0x63, 0x61, 0x66, 0xE9];
        assert_eq!(decode_text_simple(input), "caf\u{00E9}");
    }

    #[test]
    fn decode_text_simple_utf16be() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE9];
        assert_eq!(decode_text_simple(input), "A\u{00E9}");
    }

    #[test]
    fn decode_text_simple_utf16be_odd_trailing_byte() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0x41, 0x00];
        assert_eq!(decode_text_simple(input), "A");
    }

    // -- header_version -----------------------------------------------------

    #[test]
    fn header_version_found() {
        assert_eq!(header_version(b"%PDF-1.7\n%\xE2\xE3"), Some("1.7".into()));
        assert_eq!(header_version(b"\n\n%PDF-2.0\n"), Some("2.0".into()));
    }

    #[test]
    fn header_version_missing() {
        assert_eq!(header_version(b"<html></html>"), None);
        assert_eq!(header_version(b""), None);
    }

    #[test]
    fn load_rejects_non_pdf() {
        let err = LopdfBackend::load_bytes(b"GIF89a not a pdf", "")
            .err()
            .unwrap();
        assert!(matches!(err, WamError::UnreadableDocument(_)));
    }

    #[test]
    fn load_rejects_truncated_pdf() {
        let err = LopdfBackend::load_bytes(b"%PDF-1.4\n1 0 obj", "")
            .err()
            .unwrap();
        assert!(matches!(err, WamError::UnreadableDocument(_)));
    }

    #[test]
    fn load_round_trips_saved_document() {
        let mut builder = DocBuilder::new();
        builder.page(dictionary! {});
        let mut doc = builder.build_document();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let backend = LopdfBackend::load_bytes(&bytes, "").unwrap();
        assert_eq!(backend.page_count(), 1);
        assert_eq!(backend.encryption(), None);
    }

    // -- convert_object -----------------------------------------------------

    #[test]
    fn convert_scalars() {
        assert_eq!(convert_object(&Object::Null), PdfValue::Null);
        assert_eq!(convert_object(&Object::Integer(99)), PdfValue::Integer(99));
        assert_eq!(
            convert_object(&Object::Name(b"Font".to_vec())),
            PdfValue::Name(b"Font".to_vec()),
        );
        assert_eq!(
            convert_object(&Object::Reference((7, 0))),
            PdfValue::Reference((7, 0))
        );
    }

    #[test]
    fn convert_stream_uses_dict() {
        let stream = Stream::new(dictionary! { "Length" => Object::Integer(0) }, vec![]);
        match convert_object(&Object::Stream(stream)) {
            PdfValue::Dict(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].0, b"Length");
            }
            other => panic!("expected Dict for stream, got {:?}", other),
        }
    }

    #[test]
    fn name_rendering() {
        assert_eq!(PdfValue::name("Im1").as_name_str(), Some("/Im1".into()));
        assert_eq!(PdfValue::Integer(1).as_name_str(), None);
    }

    // -- resolution ---------------------------------------------------------

    #[test]
    fn resolve_follows_reference_chain() {
        let mut doc = Document::with_version("1.7");
        let target = doc.add_object(Object::Integer(5));
        let hop = doc.add_object(Object::Reference(target));
        let backend = LopdfBackend::from_document(doc);

        assert_eq!(
            backend.resolve(&Object::Reference(hop)),
            Some(&Object::Integer(5))
        );
        assert_eq!(backend.resolve(&Object::Reference((99, 0))), None);
    }

    #[test]
    fn resolve_stops_on_reference_cycle() {
        let mut doc = Document::with_version("1.7");
        let a = doc.new_object_id();
        let b = doc.new_object_id();
        doc.objects.insert(a, Object::Reference(b));
        doc.objects.insert(b, Object::Reference(a));
        let backend = LopdfBackend::from_document(doc);

        assert_eq!(backend.resolve(&Object::Reference(a)), None);
    }

    #[test]
    fn inherited_resources_from_page_tree() {
        let mut builder = DocBuilder::new();
        builder.pages_extra(dictionary! {
            "Resources" => dictionary! { "Font" => dictionary! {} },
        });
        let page = builder.page(dictionary! {});
        let backend = builder.build();

        let resources = backend.page_resources(page).unwrap();
        assert!(resources.has(b"Font"));
    }

    #[test]
    fn metadata_reads_info_dictionary() {
        let mut builder = DocBuilder::new();
        builder.page(dictionary! {});
        builder.info(dictionary! {
            "Title" => Object::string_literal("Annual report"),
            "Producer" => Object::string_literal("LibreOffice"),
        });
        let backend = builder.build();

        let meta = backend.metadata();
        assert_eq!(meta.get("Title").map(String::as_str), Some("Annual report"));
        assert_eq!(meta.get("Producer").map(String::as_str), Some("LibreOffice"));
        assert_eq!(meta.get("Author"), None);
    }

    #[test]
    fn encryption_defaults() {
        let mut builder = DocBuilder::new();
        builder.page(dictionary! {});
        builder.encrypt(dictionary! { "Filter" => "Standard" });
        let backend = builder.build();

        assert_eq!(
            backend.encryption(),
            Some(EncryptionInfo {
                revision: 2,
                permissions: 1
            })
        );
    }

    #[test]
    fn page_annotations_resolve_references() {
        let mut builder = DocBuilder::new();
        let annot = builder.add(dictionary! { "Subtype" => "Link" });
        let page = builder.page(dictionary! {
            "Annots" => vec![Object::Reference(annot), dictionary! { "Subtype" => "Text" }.into()],
        });
        let backend = builder.build();

        let annots = backend.page_annotations(page);
        assert_eq!(annots.len(), 2);
        assert_eq!(annots[0].0, Some(annot));
        assert_eq!(annots[1].0, None);
    }
}
