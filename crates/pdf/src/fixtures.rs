//! In-memory documents for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::backend::{LopdfBackend, ObjectId};

/// Assembles a small document: pages under one page-tree node, plus
/// whatever catalog and trailer entries a test needs.
pub(crate) struct DocBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    pages_extra: Dictionary,
    catalog: Dictionary,
}

impl DocBuilder {
    pub(crate) fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            pages_extra: Dictionary::new(),
            catalog: Dictionary::new(),
        }
    }

    pub(crate) fn pages_id(&self) -> ObjectId {
        self.pages_id
    }

    pub(crate) fn add(&mut self, object: impl Into<Object>) -> ObjectId {
        self.doc.add_object(object)
    }

    /// Reserve an id to fill later, for self-referencing structures.
    pub(crate) fn reserve(&mut self) -> ObjectId {
        self.doc.new_object_id()
    }

    pub(crate) fn set(&mut self, id: ObjectId, object: impl Into<Object>) {
        self.doc.objects.insert(id, object.into());
    }

    pub(crate) fn page(&mut self, mut dict: Dictionary) -> ObjectId {
        dict.set("Type", "Page");
        dict.set("Parent", self.pages_id);
        let id = self.add(dict);
        self.kids.push(id);
        id
    }

    pub(crate) fn page_with_content(&mut self, mut dict: Dictionary, operations: Vec<Operation>) -> ObjectId {
        let data = Content { operations }.encode().unwrap();
        let content = self.add(Stream::new(dictionary! {}, data));
        dict.set("Contents", content);
        self.page(dict)
    }

    pub(crate) fn pages_extra(&mut self, dict: Dictionary) {
        for (key, value) in dict.iter() {
            self.pages_extra.set(key.clone(), value.clone());
        }
    }

    pub(crate) fn catalog(&mut self, key: &str, value: impl Into<Object>) {
        self.catalog.set(key, value);
    }

    pub(crate) fn info(&mut self, dict: Dictionary) {
        let id = self.add(dict);
        self.doc.trailer.set("Info", id);
    }

    pub(crate) fn encrypt(&mut self, dict: Dictionary) {
        let id = self.add(dict);
        self.doc.trailer.set("Encrypt", id);
    }

    pub(crate) fn build_document(mut self) -> Document {
        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
            "Count" => self.kids.len() as i64,
        };
        for (key, value) in self.pages_extra.iter() {
            pages.set(key.clone(), value.clone());
        }
        self.doc.objects.insert(self.pages_id, pages.into());

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        };
        for (key, value) in self.catalog.iter() {
            catalog.set(key.clone(), value.clone());
        }
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }

    pub(crate) fn build(self) -> LopdfBackend {
        LopdfBackend::from_document(self.build_document())
    }
}

/// Operation shorthand for content streams.
pub(crate) fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

pub(crate) fn int(value: i64) -> Object {
    Object::Integer(value)
}

pub(crate) fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

pub(crate) fn text(value: &str) -> Object {
    Object::string_literal(value)
}

pub(crate) fn refs(ids: &[ObjectId]) -> Object {
    Object::Array(ids.iter().map(|&id| Object::Reference(id)).collect())
}
