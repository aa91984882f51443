//! Test and AWAM identifiers
//!
//! Every audit test has a short lowercase name (`wcag.pdf.18`) used in the
//! memo and the report. Most of them also own an AWAM identifier in the
//! result map.

use std::fmt;

use serde::{Serialize, Serializer};

// Figure checks record under two identifiers of their own.
pub const FIGURE_ALT: &str = "EIAO.A.10.1.1.4.PDF.1.1";
pub const FIGURE_ACTUAL_TEXT: &str = "EIAO.A.10.1.1.4.PDF.2.1";

/// Set when a `Form` structure element has no widget annotation.
pub const FORM_STRUCTURE: &str = "EIAO.A.15.2.1.4.PDF.4.1";

/// Language value found on a `Document` structure element.
pub const DOCUMENT_LANG_VALUE: &str = "EIAO.A.0.0.0.4.PDF.4.1";

/// Language value found in the document catalog.
pub const CATALOG_LANG_VALUE: &str = "EIAO.A.0.0.0.0.4.PDF.4.1";

/// Document property identifiers, in order: title, author, version,
/// creation date, modification date, producer, creator.
pub const PROPERTIES: [&str; 7] = [
    "EGOVMON.PDF.PROP.01",
    "EGOVMON.PDF.PROP.02",
    "EGOVMON.PDF.PROP.03",
    "EGOVMON.PDF.PROP.04",
    "EGOVMON.PDF.PROP.05",
    "EGOVMON.PDF.PROP.06",
    "EGOVMON.PDF.PROP.07",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestId {
    StructureTree,
    Permissions,
    Scanned,
    AltText,
    Bookmarks,
    TabOrder,
    ArtifactImages,
    AccessibleTables,
    ConsistentHeaders,
    LinkText,
    FormFields,
    LinkAlt,
    RunningHeaders,
    SubmitButtons,
    Language,
    PageNumbering,
    Title,
    ExternalLinks,
}

impl TestId {
    /// Tests with an identifier pre-initialised to a failure before analysis.
    pub const DOCUMENT_TESTS: [TestId; 7] = [
        TestId::Title,
        TestId::Language,
        TestId::Permissions,
        TestId::Scanned,
        TestId::ConsistentHeaders,
        TestId::Bookmarks,
        TestId::StructureTree,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TestId::StructureTree => "egovmon.pdf.03",
            TestId::Permissions => "egovmon.pdf.05",
            TestId::Scanned => "egovmon.pdf.08",
            TestId::AltText => "wcag.pdf.01",
            TestId::Bookmarks => "wcag.pdf.02",
            TestId::TabOrder => "wcag.pdf.03",
            TestId::ArtifactImages => "wcag.pdf.04",
            TestId::AccessibleTables => "wcag.pdf.06",
            TestId::ConsistentHeaders => "wcag.pdf.09",
            TestId::LinkText => "wcag.pdf.11",
            TestId::FormFields => "wcag.pdf.12",
            TestId::LinkAlt => "wcag.pdf.13",
            TestId::RunningHeaders => "wcag.pdf.14",
            TestId::SubmitButtons => "wcag.pdf.15",
            TestId::Language => "wcag.pdf.16",
            TestId::PageNumbering => "wcag.pdf.17",
            TestId::Title => "wcag.pdf.18",
            TestId::ExternalLinks => "wcag.pdf.sc244",
        }
    }

    /// The identifier this test's results are stored under.
    pub fn awam_id(self) -> Option<&'static str> {
        let id = match self {
            TestId::Title => "EIAO.A.15.1.1.4.PDF.1.1",
            TestId::Language => "EIAO.A.10.4.1.4.PDF.1.1",
            TestId::Permissions => "EIAO.A.10.8.1.4.PDF.1.1",
            TestId::Scanned => "EIAO.A.10.3.1.4.PDF.1.1",
            TestId::ConsistentHeaders => "EIAO.A.10.3.5.4.PDF.1.1",
            TestId::Bookmarks => "EIAO.A.10.13.3.4.PDF.1.1",
            TestId::StructureTree => "EIAO.A.10.3.2.4.PDF.1.1",
            TestId::TabOrder => "EGOVMON.A.WCAG.PDF.03",
            TestId::ArtifactImages => "EGOVMON.A.WCAG.PDF.04",
            TestId::AccessibleTables => "EGOVMON.A.WCAG.PDF.06",
            TestId::LinkText => "EGOVMON.A.WCAG.PDF.11",
            TestId::FormFields => "EGOVMON.A.WCAG.PDF.12",
            TestId::LinkAlt => "EGOVMON.A.WCAG.PDF.13",
            TestId::RunningHeaders => "EGOVMON.A.WCAG.PDF.14",
            TestId::SubmitButtons => "EGOVMON.A.WCAG.PDF.15",
            TestId::PageNumbering => "EGOVMON.A.WCAG.PDF.17",
            TestId::AltText | TestId::ExternalLinks => return None,
        };
        Some(id)
    }

    pub fn description(self) -> &'static str {
        match self {
            TestId::StructureTree => "Document has a structure tree",
            TestId::Permissions => "Document permissions allow assistive technologies",
            TestId::Scanned => "Document is not a scanned image",
            TestId::AltText => "Alternate text for images",
            TestId::Bookmarks => "Document provides bookmarks",
            TestId::TabOrder => "Correct tab and reading order",
            TestId::ArtifactImages => "Decorative images are marked as artifacts",
            TestId::AccessibleTables => "Accessible tables",
            TestId::ConsistentHeaders => "Consistent headers",
            TestId::LinkText => "Link annotations are tagged",
            TestId::FormFields => "Form fields provide name, role and value",
            TestId::LinkAlt => "Link annotations provide alternate text",
            TestId::RunningHeaders => "Consistent running headers and footers",
            TestId::SubmitButtons => "Submit buttons in forms",
            TestId::Language => "Natural language of the document",
            TestId::PageNumbering => "Consistent page numbering",
            TestId::Title => "Document title",
            TestId::ExternalLinks => "Accessible external links",
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
