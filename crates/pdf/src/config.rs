use serde::{Deserialize, Serialize};

use crate::structure::HandlerOptions;

/// Default bound on structure tree nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options for one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// User password tried when the document is encrypted.
    pub password: String,
    /// Cross-check figures against the images of their page.
    pub validate_images: bool,
    /// With `validate_images`, skip pages whose images are all 1-bit.
    pub ignore_single_bit_images: bool,
    /// Check `Lang` on `Document` structure elements.
    pub check_document_lang: bool,
    /// Run the running headers and footers test.
    pub running_headers: bool,
    /// Maximum structure tree depth walked.
    pub max_depth: usize,
    /// Seed for page sampling. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            password: String::new(),
            validate_images: false,
            ignore_single_bit_images: false,
            check_document_lang: false,
            running_headers: false,
            max_depth: DEFAULT_MAX_DEPTH,
            seed: None,
        }
    }
}

impl AnalysisConfig {
    pub fn handler_options(&self) -> HandlerOptions {
        HandlerOptions {
            validate_images: self.validate_images,
            ignore_single_bit_images: self.ignore_single_bit_images,
            check_document_lang: self.check_document_lang,
        }
    }
}
