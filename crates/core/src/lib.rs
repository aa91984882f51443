//! Core library for pdfwam
//!
//! This crate is the **Functional Core** of the checker: the AWAM result map,
//! test identifiers, the per-test memo and report, and the decision rules
//! that do not need a parsed document (heading levels, permission bits,
//! table nesting, scanner producers and page sampling). Nothing here does
//! I/O; the `pdf` crate reads documents and feeds these types, and the
//! `pdfwam` binary prints them.
//!
//! # Module Organization
//!
//! - [`awam`]: result statuses, locations and the AWAM result map
//! - [`ids`]: test names and their AWAM identifiers
//! - [`report`]: per-test memo, link test merging and the final report
//! - [`headings`]: heading level consistency
//! - [`permissions`]: encryption permission flags
//! - [`scanned`]: scanner producers and page sampling
//! - [`table`]: table structure validation
//!
//! # Example Usage
//!
//! ```rust
//! use pdfwam_core::awam::Status;
//! use pdfwam_core::ids::TestId;
//! use pdfwam_core::report::{build_report, Memo};
//!
//! let mut memo = Memo::new();
//! memo.insert(TestId::Title, Status::Pass);
//! memo.insert(TestId::Bookmarks, Status::Fail);
//!
//! let report = build_report(&memo);
//! assert_eq!(report.summary.total, 2);
//! assert_eq!(report.summary.fail, 1);
//! ```

pub mod awam;
pub mod headings;
pub mod ids;
pub mod permissions;
pub mod report;
pub mod scanned;
pub mod table;
