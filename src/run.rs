use crate::fs::FileStore;
use crate::locate::{self, Located, LocateError, SearchSpec};
use crate::patch::{self, PatchError, PatchOutcome};
use crate::rules::{ReplacementRule, RuleSet};
use std::path::PathBuf;
use thiserror::Error;

/// One complete patch job: where to search and what to rewrite.
#[derive(Debug, Clone)]
pub struct Job {
    pub root: PathBuf,
    pub search: SearchSpec,
    pub rules: RuleSet,
}

impl Job {
    /// Job with the built-in search tokens and pin table.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            search: SearchSpec::default(),
            rules: RuleSet::default(),
        }
    }
}

/// Outcomes for a single candidate manifest, one per rule.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: PathBuf,
    pub outcomes: Vec<(ReplacementRule, PatchOutcome)>,
}

impl FileReport {
    /// Whether any rule patched this file or found it already patched.
    pub fn any_success(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| o.succeeded())
    }
}

/// Everything a run did, for the CLI to render.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub located: Located,
    pub files: Vec<FileReport>,
}

impl RunReport {
    /// OR-aggregated success flag across every (file, rule) combination.
    ///
    /// A run where no combination succeeded is still a completed run; only
    /// the locator finding nothing at all is fatal.
    pub fn any_patched(&self) -> bool {
        self.files.iter().any(FileReport::any_success)
    }

    /// (patched, already patched, not applicable) counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut patched = 0;
        let mut already = 0;
        let mut missed = 0;
        for report in &self.files {
            for (_, outcome) in &report.outcomes {
                match outcome {
                    PatchOutcome::Patched => patched += 1,
                    PatchOutcome::AlreadyPatched => already += 1,
                    PatchOutcome::NotApplicable { .. } => missed += 1,
                }
            }
        }
        (patched, already, missed)
    }
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Patch every candidate against every rule.
///
/// Rules are attempted unconditionally; a miss on one (file, rule) pair never
/// stops the rest. Only an I/O failure aborts.
pub fn patch_candidates<S: FileStore>(
    store: &S,
    candidates: &[PathBuf],
    search: &SearchSpec,
    rules: &RuleSet,
    dry_run: bool,
) -> Result<Vec<FileReport>, PatchError> {
    let tokens = search.context_tokens();

    let mut files = Vec::new();
    for path in candidates {
        let mut outcomes = Vec::new();
        for rule in rules.iter() {
            let outcome = patch::apply_rule(store, path, rule, &tokens, dry_run)?;
            outcomes.push((rule.clone(), outcome));
        }
        files.push(FileReport {
            file: path.clone(),
            outcomes,
        });
    }

    Ok(files)
}

/// Locate candidates and patch them in one call.
pub fn execute<S: FileStore>(store: &S, job: &Job, dry_run: bool) -> Result<RunReport, RunError> {
    let located = locate::locate(store, &job.root, &job.search)?;
    let files = patch_candidates(store, &located.candidates, &job.search, &job.rules, dry_run)?;
    Ok(RunReport { located, files })
}
