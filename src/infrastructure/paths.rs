//! Path utilities for locating on-disk state.
//!
//! Preferences and trace files live in a per-user data directory, resolved in
//! this order:
//!
//! 1. `data_dir` from [`Config`](crate::Config), with `~` expanded
//! 2. the `MATERIAL_TRACKER_DATA_DIR` environment variable
//! 3. `$HOME/.local/share/material-tracker`
//! 4. `.material-tracker` in the working directory

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MATERIAL_TRACKER_DATA_DIR";

const APP_DIR: &str = "material-tracker";

/// Returns the data directory, honouring an explicit override first.
#[must_use]
pub fn get_data_dir(configured: Option<&str>) -> PathBuf {
    if let Some(dir) = configured.filter(|d| !d.trim().is_empty()) {
        return expand_tilde(dir);
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    home_dir().map_or_else(
        || PathBuf::from(format!(".{APP_DIR}")),
        |home| home.join(".local").join("share").join(APP_DIR),
    )
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, or any path when `HOME` is unset, are
/// returned unchanged.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    expand_tilde_in(path, home_dir().as_deref())
}

/// Expands a leading `~` against an explicit home directory.
///
/// # Examples
///
/// ```
/// use material_tracker::infrastructure::paths::expand_tilde_in;
/// use std::path::{Path, PathBuf};
///
/// let home = Some(Path::new("/home/ada"));
/// assert_eq!(expand_tilde_in("~/data", home), PathBuf::from("/home/ada/data"));
/// assert_eq!(expand_tilde_in("~", home), PathBuf::from("/home/ada"));
/// assert_eq!(expand_tilde_in("/srv/data", home), PathBuf::from("/srv/data"));
/// ```
#[must_use]
pub fn expand_tilde_in(path: &str, home: Option<&Path>) -> PathBuf {
    match (path, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        _ => PathBuf::from(path),
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}
