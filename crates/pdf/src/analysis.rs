//! One audit of one document.
//!
//! [`Analysis`] owns every piece of state an audit builds up: the result
//! map (inside the handler), the memo, the artifact cache and the sampling
//! rng. It runs in three steps, `new` → [`Analysis::process_awam`] →
//! [`Analysis::run_all_tests`], and [`analyze`] wraps them so that nothing
//! unexpected escapes as a panic.

use std::panic::{catch_unwind, AssertUnwindSafe};

use lopdf::Dictionary;
use pdfwam_core::awam::{AwamKindError, AwamResultMap, Location, Status};
use pdfwam_core::ids::{TestId, CATALOG_LANG_VALUE, PROPERTIES};
use pdfwam_core::permissions::accessibility_permission;
use pdfwam_core::report::{Memo, MemoValue};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::artifacts::ArtifactCache;
use crate::backend::LopdfBackend;
use crate::checks::{self, DocumentSummary};
use crate::config::AnalysisConfig;
use crate::numbers::NumbersTree;
use crate::pages::PageIndex;
use crate::structure::{AwamHandler, RoleMap, StructureWalker};
use crate::wcag::{LinkOutcome, TestOutcome, WcagSuite};
use crate::WamError;

/// Tests run after the structure tree walk, in order.
const SUITE_TESTS: [TestId; 7] = [
    TestId::PageNumbering,
    TestId::FormFields,
    TestId::SubmitButtons,
    TestId::AccessibleTables,
    TestId::TabOrder,
    TestId::ArtifactImages,
    TestId::RunningHeaders,
];

/// Result of a finished audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub results: AwamResultMap,
    pub memo: Memo,
    pub summary: DocumentSummary,
}

pub struct Analysis<'a> {
    backend: &'a LopdfBackend,
    config: &'a AnalysisConfig,
    struct_root: Option<&'a Dictionary>,
    numbers: NumbersTree<'a>,
    roles: RoleMap,
    handler: AwamHandler<'a>,
    artifacts: ArtifactCache,
    memo: Memo,
    rng: StdRng,
    scanned: bool,
}

impl<'a> Analysis<'a> {
    /// Read the structure tree root, its numbers tree and role map, and
    /// mark every document-level test as failed until it is decided.
    pub fn new(backend: &'a LopdfBackend, config: &'a AnalysisConfig) -> Result<Self, AwamKindError> {
        let struct_root = checks::struct_tree_root(backend);
        let numbers = struct_root
            .map(|root| NumbersTree::from_struct_root(backend, root))
            .unwrap_or_default();
        let roles = struct_root
            .map(|root| RoleMap::from_struct_root(backend, root))
            .unwrap_or_default();
        log::debug!(
            "numbers tree with {} entries, {} role mappings",
            numbers.len(),
            roles.len()
        );

        let mut handler = AwamHandler::new(backend, PageIndex::new(backend), config.handler_options());
        for test in TestId::DOCUMENT_TESTS {
            if let Some(id) = test.awam_id() {
                handler
                    .results_mut()
                    .reset(id, Location::document(), Status::Fail)?;
            }
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            backend,
            config,
            struct_root,
            numbers,
            roles,
            handler,
            artifacts: ArtifactCache::new(),
            memo: Memo::new(),
            rng,
            scanned: false,
        })
    }

    pub fn results(&self) -> &AwamResultMap {
        self.handler.results()
    }

    pub fn memo(&self) -> &Memo {
        &self.memo
    }

    /// Store a document-level status and note it in the memo.
    fn decide(&mut self, test: TestId, location: Location, status: Status) -> Result<(), AwamKindError> {
        if let Some(id) = test.awam_id() {
            self.handler.results_mut().reset(id, location, status)?;
        }
        self.memo.insert(test, status);
        Ok(())
    }

    /// Document-level checks followed by the structure tree walk.
    pub fn process_awam(&mut self) -> Result<(), AwamKindError> {
        let backend = self.backend;

        let meta = backend.metadata();
        let properties = [
            meta.get("Title").cloned(),
            meta.get("Author").cloned(),
            Some(backend.version().to_string()),
            meta.get("CreationDate").cloned(),
            meta.get("ModDate").cloned(),
            meta.get("Producer").cloned(),
            meta.get("Creator").cloned(),
        ];
        for (id, value) in PROPERTIES.iter().zip(properties) {
            let value: String = value.unwrap_or_default().chars().filter(char::is_ascii).collect();
            self.handler.results_mut().reset(id, Location::document(), value)?;
        }

        let titled = meta.get("Title").is_some_and(|title| !title.is_empty());
        self.decide(TestId::Title, Location::document(), titled.into())?;

        let lang = backend
            .catalog()
            .and_then(|catalog| backend.get_text(catalog, b"Lang"))
            .filter(|lang| !lang.is_empty());
        match lang {
            Some(lang) => {
                log::info!("document language {lang}");
                self.handler.results_mut().set_scalar(CATALOG_LANG_VALUE, lang)?;
                self.handler.mark_language_found();
                self.decide(TestId::Language, Location::document(), Status::Pass)?;
            }
            None => self.decide(TestId::Language, Location::document(), Status::Fail)?,
        }

        match backend.encryption() {
            None => self.decide(TestId::Permissions, Location::document(), Status::Pass)?,
            Some(info) => {
                match accessibility_permission(info.permissions, info.revision) {
                    Some(status) => self.decide(TestId::Permissions, Location::document(), status)?,
                    None => log::warn!("unsupported security handler revision {}", info.revision),
                }
            }
        }

        self.scanned = checks::is_scanned(
            backend,
            self.handler.pages(),
            self.struct_root.is_some(),
            &mut self.rng,
        );
        self.decide(TestId::Scanned, Location::document(), Status::from(!self.scanned))?;

        let tree_has_content = self.struct_root.is_some_and(|root| root.len() > 0);
        if tree_has_content {
            let check = checks::headers_consistent(backend, &self.numbers, self.handler.pages());
            let location = if check.passed() {
                Location::document()
            } else {
                Location::new(check.page(), 1)
            };
            self.decide(TestId::ConsistentHeaders, location, check.passed().into())?;
        } else if let Some(id) = TestId::ConsistentHeaders.awam_id() {
            self.handler.results_mut().remove(id);
            self.memo.remove(TestId::ConsistentHeaders);
        }

        let bookmarks = checks::has_bookmarks(backend);
        self.decide(TestId::Bookmarks, Location::document(), bookmarks.into())?;

        let Some(root) = self.struct_root else {
            log::info!("document has no structure tree");
            self.decide(TestId::StructureTree, Location::document(), Status::Fail)?;
            return Ok(());
        };
        self.decide(TestId::StructureTree, Location::document(), Status::Pass)?;
        let Some(kids) = root.get(b"K").ok() else {
            log::info!("structure tree root has no kids");
            return Ok(());
        };

        let mut walker =
            StructureWalker::new(backend, &self.numbers, &self.roles, self.config.max_depth);
        walker.search(kids, &mut self.handler)?;
        log::info!(
            "walked {} structure elements, {} figures, {} tables, {} links",
            walker.visited(),
            self.handler.figure_count(),
            self.handler.tables().len(),
            self.handler.link_count()
        );

        let figures = self.handler.figure_count();
        if figures > 0 {
            let fail = self.handler.failed_image_count().min(figures);
            self.memo.insert(
                TestId::AltText,
                MemoValue::Counts {
                    fail,
                    pass: figures - fail,
                },
            );
        }
        Ok(())
    }

    /// The WCAG tests that need the walked structure tree.
    pub fn run_all_tests(&mut self) -> Result<(), AwamKindError> {
        let mut suite = WcagSuite::new(
            self.backend,
            self.struct_root,
            &self.handler,
            &mut self.artifacts,
        );

        let mut outcomes = Vec::new();
        for test in SUITE_TESTS {
            if test == TestId::RunningHeaders && !self.config.running_headers {
                continue;
            }
            if let Some(outcome) = suite.run(test) {
                outcomes.push((test, outcome));
            }
        }
        let links = suite.links();

        for (test, outcome) in outcomes {
            self.record_outcome(test, outcome)?;
        }
        self.record_links(links)
    }

    fn record_outcome(&mut self, test: TestId, outcome: TestOutcome) -> Result<(), AwamKindError> {
        match outcome {
            TestOutcome::Status(Status::NotApplicable) => {
                self.memo.insert(test, Status::NotApplicable);
            }
            TestOutcome::Status(status) => self.decide(test, Location::document(), status)?,
            TestOutcome::Pages(results) => {
                if let Some(id) = test.awam_id() {
                    let map = self.handler.results_mut();
                    map.remove(id);
                    for (location, status) in results.entries() {
                        map.record(id, location, status)?;
                    }
                }
                let (fail, pass) = results.counts();
                self.memo.insert(test, MemoValue::Counts { fail, pass });
            }
        }
        Ok(())
    }

    fn record_links(&mut self, links: LinkOutcome) -> Result<(), AwamKindError> {
        let tests = [TestId::LinkText, TestId::LinkAlt];
        match links {
            LinkOutcome::NotApplicable => {
                for test in tests {
                    self.memo.insert(test, Status::NotApplicable);
                }
            }
            LinkOutcome::Untagged => {
                for test in tests {
                    if let Some(id) = test.awam_id() {
                        self.handler.results_mut().reset(id, Location::document(), Status::Fail)?;
                    }
                    self.memo.insert(test, MemoValue::Counts { fail: 1, pass: 0 });
                }
            }
            LinkOutcome::Checked { text, alt } => {
                for (test, located) in tests.into_iter().zip([text, alt]) {
                    let Some(id) = test.awam_id() else {
                        continue;
                    };
                    let map = self.handler.results_mut();
                    map.remove(id);
                    for (location, status) in located {
                        map.record(id, location, status)?;
                    }
                    let (fail, pass) = map.tally(id);
                    self.memo.insert(test, MemoValue::Counts { fail, pass });
                }
            }
        }
        Ok(())
    }

    /// Hand over the results together with an inventory of the document.
    pub fn finish(self) -> AnalysisOutcome {
        let summary = checks::summarize(self.backend, self.scanned);
        AnalysisOutcome {
            results: self.handler.into_results(),
            memo: self.memo,
            summary,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Audit a loaded document.
///
/// A panic or a result map misuse aborts the audit with
/// [`WamError::UnexpectedInternalError`]; no partial result is returned.
pub fn analyze_document(
    backend: &LopdfBackend,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome, WamError> {
    let run = catch_unwind(AssertUnwindSafe(|| {
        let mut analysis = Analysis::new(backend, config)?;
        analysis.process_awam()?;
        analysis.run_all_tests()?;
        Ok::<_, AwamKindError>(analysis.finish())
    }));

    match run {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(err)) => {
            log::error!("analysis failed: {err}");
            Err(WamError::UnexpectedInternalError {
                class: "AwamKindError".to_string(),
                message: err.to_string(),
            })
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("analysis panicked: {message}");
            Err(WamError::UnexpectedInternalError {
                class: "panic".to_string(),
                message,
            })
        }
    }
}

/// Load `data` and audit it.
pub fn analyze(data: &[u8], config: &AnalysisConfig) -> Result<AnalysisOutcome, WamError> {
    let backend = LopdfBackend::load_bytes(data, &config.password)?;
    analyze_document(&backend, config)
}

/// Load `data` and describe it without auditing.
pub fn inspect(data: &[u8], config: &AnalysisConfig) -> Result<DocumentSummary, WamError> {
    let backend = LopdfBackend::load_bytes(data, &config.password)?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let pages = PageIndex::new(&backend);
    let tagged = checks::struct_tree_root(&backend).is_some();
    let scanned = checks::is_scanned(&backend, &pages, tagged, &mut rng);
    Ok(checks::summarize(&backend, scanned))
}
