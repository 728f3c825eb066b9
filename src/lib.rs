//! Podspec Patcher: build-time version pinning for vendored CocoaPods manifests
//!
//! A CI workaround for dependency trees you cannot edit by hand: it searches a
//! generated plugins root (e.g. Flutter's `ios/.symlinks/plugins`) for the
//! manifests of a vendor's plugin and rewrites a pinned dependency version to
//! a target version by exact literal substitution, ahead of `pod install`.
//!
//! # Architecture
//!
//! The workflow is a straight line: [`locate`] tries four search strategies in
//! strict order and stops at the first that yields candidates; [`apply_rule`]
//! performs one literal replace-all per (manifest, rule) pair; [`execute`]
//! drives every combination and folds the outcomes into a [`RunReport`]. The
//! replacement table ([`RuleSet`]) is declarative (quote style, pin operator,
//! version pair), so new spellings are data, not code.
//!
//! # Safety
//!
//! - Manifests already at the target version are never rewritten
//! - Disk writes are atomic (tempfile + fsync + rename)
//! - A rule that matches nothing is a diagnostic, not a failure
//! - Re-running after a successful patch is a no-op
//!
//! # Example
//!
//! ```no_run
//! use podspec_patcher::{execute, DiskStore, Job};
//!
//! let job = Job::new("ios/.symlinks/plugins");
//! let report = execute(&DiskStore, &job, false)?;
//!
//! if report.any_patched() {
//!     println!("pinned the dependency in {} manifest(s)", report.files.len());
//! }
//! # Ok::<(), podspec_patcher::RunError>(())
//! ```

pub mod config;
pub mod fs;
pub mod locate;
pub mod patch;
pub mod rules;
pub mod run;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, PinFile, ValidationError};
pub use fs::{DiskStore, FileStore};
pub use locate::{locate, LocateError, Located, SearchSpec, Strategy};
pub use patch::{apply_rule, ContextLine, PatchError, PatchOutcome};
pub use rules::{PinOperator, Quote, ReplacementRule, RuleSet};
pub use run::{execute, patch_candidates, FileReport, Job, RunError, RunReport};
