//! Artifact marked-content sequences.
//!
//! An artifact starts with a `BMC` or `BDC` operation whose first operand is
//! the name `/Artifact` and runs through the matching `EMC`. A new opening
//! operation before the `EMC` starts the sequence over.

use std::collections::HashMap;

use crate::backend::{decode_text_simple, ContentOp, ObjectId, PdfBackend, PdfValue};

/// One `/Artifact` sequence of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactElement {
    /// The `BMC`/`BDC` operation that opened the sequence.
    pub opening: ContentOp,
    /// Operations after the opening one, the closing `EMC` included.
    pub body: Vec<ContentOp>,
}

impl ArtifactElement {
    /// Entries of the inline property list of a `BDC` opening.
    pub fn properties(&self) -> Option<&[(Vec<u8>, PdfValue)]> {
        match self.opening.operands.get(1)? {
            PdfValue::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn property(&self, key: &[u8]) -> Option<&PdfValue> {
        self.properties()?
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, v)| v)
    }

    /// Text painted inside the sequence.
    pub fn text(&self) -> String {
        artifact_text(&self.body)
    }
}

fn opens_artifact(op: &ContentOp) -> bool {
    matches!(op.operands.first(), Some(PdfValue::Name(name)) if name.as_slice() == b"Artifact")
}

/// Collect the artifact sequences of a page's operations.
///
/// A sequence left open at the end of the stream is dropped.
pub fn extract_artifacts(ops: &[ContentOp]) -> Vec<ArtifactElement> {
    let mut elements = Vec::new();
    let mut current: Option<ArtifactElement> = None;

    for op in ops {
        if opens_artifact(op) {
            current = Some(ArtifactElement {
                opening: op.clone(),
                body: Vec::new(),
            });
            continue;
        }
        let Some(element) = current.as_mut() else {
            continue;
        };
        element.body.push(op.clone());
        if op.operator == "EMC" {
            elements.extend(current.take());
        }
    }

    elements
}

fn string_operand(value: Option<&PdfValue>) -> Option<String> {
    match value? {
        PdfValue::Str(bytes) => Some(decode_text_simple(bytes)),
        _ => None,
    }
}

/// Text shown by `Tj`, `TJ`, `'` and `"`, with `T*` as a line break.
pub fn artifact_text(ops: &[ContentOp]) -> String {
    let mut text = String::new();

    for op in ops {
        match op.operator.as_str() {
            "Tj" => text.extend(string_operand(op.operands.first())),
            "T*" => text.push('\n'),
            "'" => {
                text.push('\n');
                text.extend(string_operand(op.operands.first()));
            }
            "\"" => {
                if let Some(shown) = string_operand(op.operands.get(2)) {
                    text.push('\n');
                    text.push_str(&shown);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    for item in items {
                        text.extend(string_operand(Some(item)));
                    }
                }
            }
            _ => {}
        }
    }

    text
}

/// Artifact sequences per page, computed once per analysis.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    pages: HashMap<ObjectId, Vec<ArtifactElement>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifacts of `page`. Unreadable content streams have none.
    pub fn elements<B: PdfBackend + ?Sized>(
        &mut self,
        backend: &B,
        page: ObjectId,
    ) -> &[ArtifactElement] {
        self.pages.entry(page).or_insert_with(|| {
            match backend.page_operations(page) {
                Ok(ops) => extract_artifacts(&ops),
                Err(err) => {
                    log::warn!("skipping artifacts of page object {page:?}: {err}");
                    Vec::new()
                }
            }
        })
    }

    /// Number of pages cached so far.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
