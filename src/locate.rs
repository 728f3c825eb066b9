use crate::fs::FileStore;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fixed subdirectory each plugin keeps its iOS sources in.
const PLUGIN_IOS_SUBDIR: &str = "ios";

const SPEC_SUFFIX: &str = ".podspec";
const JSON_SPEC_SUFFIX: &str = ".podspec.json";

/// What the locator searches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    /// Token expected in plugin directory and manifest file names.
    pub vendor: String,
    /// Dependency name expected inside manifest contents.
    pub dependency: String,
    /// Override for the generated local-specs cache directory. When unset the
    /// cache is assumed to sit two levels above the plugins root, at
    /// `Pods/Local Podspecs`.
    pub local_specs: Option<PathBuf>,
}

impl Default for SearchSpec {
    fn default() -> Self {
        Self {
            vendor: "facebook".to_string(),
            dependency: "FBAudienceNetwork".to_string(),
            local_specs: None,
        }
    }
}

impl SearchSpec {
    /// Tokens worth echoing from a manifest that matched no rule.
    pub fn context_tokens(&self) -> [&str; 2] {
        [self.dependency.as_str(), self.vendor.as_str()]
    }

    fn local_specs_dir(&self, root: &Path) -> Option<PathBuf> {
        if let Some(dir) = &self.local_specs {
            return Some(dir.clone());
        }
        // The conventional layout is <ios>/.symlinks/plugins, which puts the
        // cache at <ios>/Pods/Local Podspecs.
        root.ancestors()
            .nth(2)
            .map(|ios| ios.join("Pods").join("Local Podspecs"))
    }
}

/// Search strategies, tried strictly in [`Strategy::ORDER`]. The first one to
/// yield at least one candidate wins; later strategies are never run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Manifests whose file name carries the vendor token.
    NamePattern,
    /// `<plugin>/ios` manifests inside vendor-named plugin directories.
    PluginSubdirs,
    /// Every manifest whose contents mention the dependency.
    ContentScan,
    /// Vendor-named JSON specs in the generated local-specs cache.
    LocalSpecs,
}

impl Strategy {
    pub const ORDER: [Strategy; 4] = [
        Strategy::NamePattern,
        Strategy::PluginSubdirs,
        Strategy::ContentScan,
        Strategy::LocalSpecs,
    ];

    fn run<S: FileStore>(
        self,
        store: &S,
        root: &Path,
        spec: &SearchSpec,
    ) -> io::Result<Vec<PathBuf>> {
        match self {
            Strategy::NamePattern => Ok(store
                .walk_files(root)?
                .into_iter()
                .filter(|p| file_name_contains(p, &spec.vendor) && has_suffix(p, SPEC_SUFFIX))
                .collect()),

            Strategy::PluginSubdirs => {
                let mut found = Vec::new();
                for dir in store.subdirs(root)? {
                    if !file_name_contains(&dir, &spec.vendor) {
                        continue;
                    }
                    let ios_dir = dir.join(PLUGIN_IOS_SUBDIR);
                    found.extend(
                        store
                            .walk_files(&ios_dir)?
                            .into_iter()
                            .filter(|p| has_suffix(p, SPEC_SUFFIX)),
                    );
                }
                Ok(found)
            }

            Strategy::ContentScan => {
                let mut found = Vec::new();
                for path in store.walk_files(root)? {
                    if !has_suffix(&path, SPEC_SUFFIX) {
                        continue;
                    }
                    let contents = store.read_to_string(&path)?;
                    if contents.contains(&spec.dependency) {
                        found.push(path);
                    }
                }
                Ok(found)
            }

            Strategy::LocalSpecs => {
                let Some(cache) = spec.local_specs_dir(root) else {
                    return Ok(Vec::new());
                };
                Ok(store
                    .walk_files(&cache)?
                    .into_iter()
                    .filter(|p| {
                        file_name_contains(p, &spec.vendor) && has_suffix(p, JSON_SPEC_SUFFIX)
                    })
                    .collect())
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::NamePattern => "manifest name pattern",
            Strategy::PluginSubdirs => "plugin subdirectories",
            Strategy::ContentScan => "manifest content scan",
            Strategy::LocalSpecs => "local specs cache",
        };
        f.write_str(name)
    }
}

/// Result of a successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Strategy that produced the candidates.
    pub strategy: Strategy,
    /// Strategies tried, in order, including the winning one.
    pub attempted: Vec<Strategy>,
    /// Candidate manifest paths, sorted and deduplicated.
    pub candidates: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("no podspec manifests matching '{vendor}' found under {}", .root.display())]
    NoManifests { root: PathBuf, vendor: String },

    #[error("failed to search {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Search `root` for candidate manifests, trying each strategy in order and
/// falling through only when a strategy produces nothing.
///
/// All four strategies coming up empty is fatal; the caller maps it to a
/// non-zero exit.
pub fn locate<S: FileStore>(
    store: &S,
    root: &Path,
    spec: &SearchSpec,
) -> Result<Located, LocateError> {
    let mut attempted = Vec::new();

    for strategy in Strategy::ORDER {
        attempted.push(strategy);

        let mut candidates = strategy
            .run(store, root, spec)
            .map_err(|source| LocateError::Io {
                path: root.to_path_buf(),
                source,
            })?;

        if candidates.is_empty() {
            continue;
        }

        candidates.sort();
        candidates.dedup();

        return Ok(Located {
            strategy,
            attempted,
            candidates,
        });
    }

    Err(LocateError::NoManifests {
        root: root.to_path_buf(),
        vendor: spec.vendor.clone(),
    })
}

fn file_name_contains(path: &Path, token: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(token))
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(suffix))
}
