//! Heading consistency
//!
//! Headings must start at `H1` and never skip a level on the way down (`H1`
//! followed by `H3` is a skip, `H3` back to `H1` is fine).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static HEADING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^/?h([1-9])$").expect("valid heading regex"));

/// Level of a heading structure type such as `H2`, or `None` for other tags.
pub fn heading_level(tag: &str) -> Option<u8> {
    HEADING_TAG
        .captures(tag)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Result of [`check_heading_levels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingCheck {
    Consistent,
    /// The first heading of the document is not `H1`.
    MissingTopLevel { page: u32, level: u8 },
    /// A heading descends more than one level below its predecessor.
    SkippedLevel { page: u32, from: u8, to: u8 },
}

impl HeadingCheck {
    pub fn passed(&self) -> bool {
        matches!(self, HeadingCheck::Consistent)
    }

    /// Page the failure was found on; 0 when consistent.
    pub fn page(&self) -> u32 {
        match self {
            HeadingCheck::Consistent => 0,
            HeadingCheck::MissingTopLevel { page, .. } | HeadingCheck::SkippedLevel { page, .. } => {
                *page
            }
        }
    }
}

/// Check heading levels collected per page.
///
/// The first heading found, in page order and in the order it was collected,
/// must be `H1`. For the skip check pages are visited in ascending order and
/// the levels of each page are sorted. A document without headings is
/// consistent.
pub fn check_heading_levels(pages: &BTreeMap<u32, Vec<u8>>) -> HeadingCheck {
    let first = pages
        .iter()
        .find_map(|(&page, levels)| levels.first().map(|&level| (page, level)));
    if let Some((page, level)) = first {
        if level != 1 {
            return HeadingCheck::MissingTopLevel { page, level };
        }
    }

    let mut previous: Option<u8> = None;
    for (&page, levels) in pages {
        let mut levels = levels.clone();
        levels.sort_unstable();

        for level in levels {
            match previous {
                Some(from) if level > from + 1 => {
                    return HeadingCheck::SkippedLevel {
                        page,
                        from,
                        to: level,
                    }
                }
                _ => previous = Some(level),
            }
        }
    }

    HeadingCheck::Consistent
}
