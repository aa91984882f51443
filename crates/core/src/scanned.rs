//! Scanned-document heuristics
//!
//! A document counts as scanned when it was produced by known scanning
//! software, or when the sampled pages all carry images but no fonts.

use rand::Rng;

/// Producers written by scanning software.
pub const SCANNER_PRODUCERS: [&str; 4] = [
    "Adobe PDF Scan Library",
    "KONICA MINOLTA bizhub C253",
    "Hewlett-Packard Intelligent Scanning Technology",
    "Canon iR C2880",
];

/// Whether `producer` starts with a known scanner name, ignoring case.
pub fn is_scanner_producer(producer: &str) -> bool {
    let producer = producer.to_lowercase();
    SCANNER_PRODUCERS
        .iter()
        .any(|known| producer.starts_with(&known.to_lowercase()))
}

/// Zero-based page indices to inspect for a document of `page_count` pages.
///
/// One or two pages are all checked. Longer documents check the first page
/// and two uniformly drawn pages, which may coincide.
pub fn sample_pages<R: Rng + ?Sized>(page_count: usize, rng: &mut R) -> Vec<usize> {
    match page_count {
        0 => Vec::new(),
        1 => vec![0],
        2 => vec![0, 1],
        n => vec![0, rng.gen_range(0..n), rng.gen_range(0..n)],
    }
}
