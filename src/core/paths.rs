//! Project-root resolution and path display helpers.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Resolve the project root that relative config paths are anchored at.
///
/// An explicit root wins; otherwise the process working directory is used.
/// This is the only place the working directory is consulted, so library
/// callers that pass explicit paths never depend on it.
pub fn project_root(explicit: Option<&Path>) -> PathBuf {
    let base = match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path)),
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    std::fs::canonicalize(&base).unwrap_or_else(|_| normalize_syntactic(&base))
}

/// Render `path` relative to `root` when it lives underneath it.
///
/// Keeps progress lines short (`out/Token.sol/Token.json` instead of the full
/// absolute path) without losing information for paths outside the root.
pub fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .map_or_else(|_| path.display().to_string(), |rel| rel.display().to_string())
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}
