//! Memo and report
//!
//! The memo keeps one summary per test: a status, or fail/pass counts for
//! tests that produce per-page results. [`build_report`] turns it into the
//! `{result, summary}` document printed by the CLI.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::awam::Status;
use crate::ids::TestId;

/// Summary of one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MemoValue {
    Status(Status),
    Counts { fail: usize, pass: usize },
}

impl MemoValue {
    /// Fail and pass counts, a status counting once.
    pub fn counts(&self) -> (usize, usize) {
        match self {
            MemoValue::Status(Status::Fail) => (1, 0),
            MemoValue::Status(Status::Pass) => (0, 1),
            MemoValue::Status(Status::NotApplicable) => (0, 0),
            MemoValue::Counts { fail, pass } => (*fail, *pass),
        }
    }
}

impl From<Status> for MemoValue {
    fn from(status: Status) -> Self {
        MemoValue::Status(status)
    }
}

/// Test summaries of one analysis, ordered by test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Memo {
    entries: BTreeMap<TestId, MemoValue>,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, test: TestId, value: impl Into<MemoValue>) {
        self.entries.insert(test, value.into());
    }

    pub fn get(&self, test: TestId) -> Option<&MemoValue> {
        self.entries.get(&test)
    }

    pub fn remove(&mut self, test: TestId) -> Option<MemoValue> {
        self.entries.remove(&test)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TestId, &MemoValue)> {
        self.entries.iter()
    }
}

/// Fold the link text and link alt results into the external-links test.
///
/// The merged entry fails as often as the better of the two and passes as
/// often as the better of the two. A missing side counts as no results.
pub fn merge_link_tests(memo: &mut Memo) {
    let text = memo.remove(TestId::LinkText);
    let alt = memo.remove(TestId::LinkAlt);
    if text.is_none() && alt.is_none() {
        return;
    }

    let (text_fail, text_pass) = text.map(|v| v.counts()).unwrap_or_default();
    let (alt_fail, alt_pass) = alt.map(|v| v.counts()).unwrap_or_default();
    memo.insert(
        TestId::ExternalLinks,
        MemoValue::Counts {
            fail: text_fail.min(alt_fail),
            pass: text_pass.max(alt_pass),
        },
    );
}

/// Status column of a report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportStatus {
    Label(&'static str),
    Counts {
        #[serde(rename = "Fail")]
        fail: usize,
        #[serde(rename = "Pass")]
        pass: usize,
    },
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Label(label) => f.write_str(label),
            ReportStatus::Counts { fail, pass } => write!(f, "Fail: {fail}, Pass: {pass}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    #[serde(rename = "Test")]
    pub test: TestId,
    #[serde(rename = "Status")]
    pub status: ReportStatus,
    #[serde(rename = "Description")]
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    #[serde(rename = "Total")]
    pub total: usize,
    #[serde(rename = "Fail")]
    pub fail: usize,
    #[serde(rename = "Pass")]
    pub pass: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub result: Vec<ReportEntry>,
    pub summary: Summary,
}

/// Build the report for a memo, merging the link tests first.
pub fn build_report(memo: &Memo) -> Report {
    let mut memo = memo.clone();
    merge_link_tests(&mut memo);

    let mut summary = Summary::default();
    let result = memo
        .iter()
        .map(|(&test, value)| {
            let (fail, pass) = value.counts();
            summary.fail += fail;
            summary.pass += pass;
            let status = match value {
                MemoValue::Status(status) => ReportStatus::Label(status.label()),
                MemoValue::Counts { fail, pass } => ReportStatus::Counts {
                    fail: *fail,
                    pass: *pass,
                },
            };
            ReportEntry {
                test,
                status,
                description: test.description(),
            }
        })
        .collect();
    summary.total = summary.fail + summary.pass;

    Report { result, summary }
}
