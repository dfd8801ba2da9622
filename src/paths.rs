//! Path normalization and workspace root resolution.
//!
//! Two small contracts live here. [`to_relative_path`] converts a tool-call
//! path into a root-relative path, refusing anything that is not strictly
//! inside the root; the diff engine and ignore policy both key on the result.
//! [`resolve_workspace_root`] implements the hook pipeline's root precedence
//! over environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Priority | Description |
//! |----------|----------|-------------|
//! | `EDITTRACE_WORKSPACE_ROOT` | 1 | Explicit workspace root override |
//! | `CLAUDE_PROJECT_DIR` | 2 | Editor-supplied project directory |
//! | `WORKSPACE_FOLDER_PATHS` | 3 | Editor-supplied folder list (first entry) |
//!
//! When none is set the process working directory is used.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Explicit workspace root override, highest priority.
pub const WORKSPACE_ROOT_ENV: &str = "EDITTRACE_WORKSPACE_ROOT";

/// Editor-supplied project directory variables, checked in fixed order.
const PROJECT_DIR_ENVS: &[&str] = &["CLAUDE_PROJECT_DIR", "WORKSPACE_FOLDER_PATHS"];

/// Converts a path to a root-relative path.
///
/// An absolute path succeeds only when it is strictly inside `root`: the
/// comparison is component-wise, so a sibling directory sharing a name
/// prefix (`/tmp/projectx` vs `/tmp/project`) is rejected, and the root
/// itself maps to no value. A relative path is accepted as-is unless it
/// escapes the root via parent-directory segments, including the bare `..`.
///
/// Returns `None` on rejection, never an error.
///
/// # Examples
///
/// ```
/// use edittrace::paths::to_relative_path;
/// use std::path::Path;
///
/// let root = Path::new("/tmp/project");
/// assert_eq!(
///     to_relative_path(Path::new("/tmp/project/src/index.ts"), root),
///     Some("src/index.ts".to_string())
/// );
/// assert_eq!(to_relative_path(Path::new("/tmp/projectx/src/index.ts"), root), None);
/// assert_eq!(to_relative_path(Path::new("../outside.ts"), root), None);
/// assert_eq!(to_relative_path(root, root), None);
/// ```
#[must_use]
pub fn to_relative_path(path: &Path, root: &Path) -> Option<String> {
    if path.is_absolute() {
        let relative = path.strip_prefix(root).ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        return Some(relative.to_string_lossy().into_owned());
    }

    if escapes_root(path) {
        return None;
    }
    let as_str = path.to_string_lossy();
    if as_str.is_empty() {
        return None;
    }
    Some(as_str.into_owned())
}

/// Returns true when a relative path's parent-directory segments would
/// climb out of the root at any point.
fn escapes_root(path: &Path) -> bool {
    let mut depth: i32 = 0;
    for component in path.components() {
        match component {
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            // A rooted component inside a "relative" path never occurs on
            // unix; treat it as escaping to stay on the safe side.
            Component::RootDir | Component::Prefix(_) => return true,
        }
    }
    false
}

/// Resolves the workspace root for the hook pipeline.
///
/// Precedence: the explicit [`WORKSPACE_ROOT_ENV`] override, then the
/// editor-supplied project directory variables in fixed order, then the
/// process working directory. This is the boundary-layer precedence; VCS
/// root detection is a separate, richer probe in [`crate::vcs`].
#[must_use]
pub fn resolve_workspace_root() -> PathBuf {
    if let Ok(root) = env::var(WORKSPACE_ROOT_ENV) {
        if !root.is_empty() {
            return PathBuf::from(root);
        }
    }

    for var in PROJECT_DIR_ENVS {
        if let Ok(value) = env::var(var) {
            // WORKSPACE_FOLDER_PATHS may carry several folders; the first
            // one is the workspace root.
            let first = value.split(',').next().unwrap_or(&value).trim();
            if !first.is_empty() {
                return PathBuf::from(first);
            }
        }
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn absolute_path_inside_root_is_relativized() {
        assert_eq!(
            to_relative_path(Path::new("/tmp/project/src/index.ts"), Path::new("/tmp/project")),
            Some("src/index.ts".to_string())
        );
    }

    #[test]
    fn prefix_sharing_sibling_is_rejected() {
        assert_eq!(
            to_relative_path(Path::new("/tmp/projectx/src/index.ts"), Path::new("/tmp/project")),
            None
        );
    }

    #[test]
    fn root_itself_is_rejected() {
        assert_eq!(
            to_relative_path(Path::new("/tmp/project"), Path::new("/tmp/project")),
            None
        );
    }

    #[test]
    fn outside_absolute_path_is_rejected() {
        assert_eq!(
            to_relative_path(Path::new("/etc/passwd"), Path::new("/tmp/project")),
            None
        );
    }

    #[test]
    fn relative_path_is_accepted_as_is() {
        assert_eq!(
            to_relative_path(Path::new("src/main.rs"), Path::new("/tmp/project")),
            Some("src/main.rs".to_string())
        );
    }

    #[test]
    fn relative_path_with_internal_parent_segments_is_accepted() {
        // Dips into src/ and back out, but never above the root.
        assert_eq!(
            to_relative_path(Path::new("src/../README.md"), Path::new("/tmp/project")),
            Some("src/../README.md".to_string())
        );
    }

    #[test]
    fn escaping_relative_path_is_rejected() {
        assert_eq!(
            to_relative_path(Path::new("../outside.ts"), Path::new("/tmp/project")),
            None
        );
    }

    #[test]
    fn bare_parent_token_is_rejected() {
        assert_eq!(to_relative_path(Path::new(".."), Path::new("/tmp/project")), None);
    }

    #[test]
    fn deep_escape_is_rejected() {
        assert_eq!(
            to_relative_path(Path::new("src/../../outside.ts"), Path::new("/tmp/project")),
            None
        );
    }

    #[test]
    fn empty_path_is_rejected() {
        assert_eq!(to_relative_path(Path::new(""), Path::new("/tmp/project")), None);
    }

    #[test]
    #[serial]
    fn workspace_root_override_wins() {
        env::set_var(WORKSPACE_ROOT_ENV, "/tmp/override");
        env::set_var("CLAUDE_PROJECT_DIR", "/tmp/claude");
        let root = resolve_workspace_root();
        env::remove_var(WORKSPACE_ROOT_ENV);
        env::remove_var("CLAUDE_PROJECT_DIR");

        assert_eq!(root, PathBuf::from("/tmp/override"));
    }

    #[test]
    #[serial]
    fn project_dir_vars_checked_in_order() {
        env::remove_var(WORKSPACE_ROOT_ENV);
        env::set_var("CLAUDE_PROJECT_DIR", "/tmp/claude");
        env::set_var("WORKSPACE_FOLDER_PATHS", "/tmp/cursor");
        let root = resolve_workspace_root();
        env::remove_var("CLAUDE_PROJECT_DIR");
        env::remove_var("WORKSPACE_FOLDER_PATHS");

        assert_eq!(root, PathBuf::from("/tmp/claude"));
    }

    #[test]
    #[serial]
    fn folder_list_uses_first_entry() {
        env::remove_var(WORKSPACE_ROOT_ENV);
        env::remove_var("CLAUDE_PROJECT_DIR");
        env::set_var("WORKSPACE_FOLDER_PATHS", "/tmp/first,/tmp/second");
        let root = resolve_workspace_root();
        env::remove_var("WORKSPACE_FOLDER_PATHS");

        assert_eq!(root, PathBuf::from("/tmp/first"));
    }

    #[test]
    #[serial]
    fn falls_back_to_current_dir() {
        env::remove_var(WORKSPACE_ROOT_ENV);
        env::remove_var("CLAUDE_PROJECT_DIR");
        env::remove_var("WORKSPACE_FOLDER_PATHS");
        let root = resolve_workspace_root();

        assert_eq!(root, env::current_dir().unwrap());
    }
}
