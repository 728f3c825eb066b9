use crate::fs::FileStore;
use crate::rules::ReplacementRule;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A manifest line echoed back when no rule matched, with 1-based numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLine {
    pub number: usize,
    pub text: String,
}

/// Outcome of applying one replacement rule to one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome should be checked for success/failure"]
pub enum PatchOutcome {
    /// Old literal found and replaced; the file was rewritten.
    Patched,
    /// New literal already present; nothing was written.
    AlreadyPatched,
    /// Old literal absent. Carries the expected literal and the manifest's
    /// vendor-related lines for the CI log.
    NotApplicable {
        expected: String,
        context: Vec<ContextLine>,
    },
}

impl PatchOutcome {
    /// Whether this outcome counts toward the run's success flag. A manifest
    /// already at the target version counts.
    pub fn succeeded(&self) -> bool {
        !matches!(self, PatchOutcome::NotApplicable { .. })
    }
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Apply `rule` to the manifest at `path`.
///
/// The replacement is an exact substring replace-all. A rule whose old
/// literal is absent is not an error; the caller decides what a run with no
/// applicable rules means. With `dry_run` the outcome is computed but nothing
/// is written.
pub fn apply_rule<S: FileStore>(
    store: &S,
    path: &Path,
    rule: &ReplacementRule,
    context_tokens: &[&str],
    dry_run: bool,
) -> Result<PatchOutcome, PatchError> {
    let contents = store
        .read_to_string(path)
        .map_err(|source| PatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    // Re-running after a successful patch is a no-op.
    if contents.contains(&rule.new) {
        return Ok(PatchOutcome::AlreadyPatched);
    }

    let patched = contents.replace(&rule.old, &rule.new);
    if patched == contents {
        return Ok(PatchOutcome::NotApplicable {
            expected: rule.old.clone(),
            context: context_lines(&contents, context_tokens),
        });
    }

    if !dry_run {
        store
            .write(path, &patched)
            .map_err(|source| PatchError::Write {
                path: path.to_path_buf(),
                source,
            })?;
    }

    Ok(PatchOutcome::Patched)
}

fn context_lines(contents: &str, tokens: &[&str]) -> Vec<ContextLine> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| tokens.iter().any(|t| line.contains(t)))
        .map(|(idx, line)| ContextLine {
            number: idx + 1,
            text: line.trim().to_string(),
        })
        .collect()
}
