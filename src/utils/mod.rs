//! Utility functions and helpers.
//!
//! - Tilde expansion for configured paths
//! - Ignore pattern matching
//! - File size formatting
//!
//! # Examples
//!
//! ```
//! use oxmon::utils::{expand_tilde, format_size};
//! use std::path::Path;
//!
//! let path = expand_tilde(Path::new("~/.config/oxmon/config.toml"));
//! assert!(path.ends_with("config.toml"));
//!
//! assert_eq!(format_size(1024 * 1024), "1.00 MB");
//! ```

/// Rayon pool construction for scan cycles
pub mod thread_pool;

use std::path::{Path, PathBuf};

/// Expands a path starting with `~` to the user's home directory.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

/// Determines if a relative path should be ignored based on provided patterns.
///
/// Patterns: `dir/` matches a directory component, `*infix*`, `*suffix`,
/// `prefix*`, and anything else matches the whole path or one component.
#[must_use]
pub fn should_ignore(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if let Some(dir_name) = pattern.strip_suffix('/') {
            if path.components().any(|c| c.as_os_str() == dir_name) {
                return true;
            }
        } else if pattern.len() > 1 && pattern.starts_with('*') && pattern.ends_with('*') {
            let search = &pattern[1..pattern.len() - 1];
            if path_str.contains(search) {
                return true;
            }
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            if path_str.ends_with(suffix) {
                return true;
            }
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            if path_str.starts_with(prefix) {
                return true;
            }
        } else if path_str == pattern.as_str()
            || path.components().any(|c| c.as_os_str() == pattern.as_str())
        {
            return true;
        }
    }

    false
}

/// Formats a file size in bytes into a human-readable string with appropriate units.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size.round() as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
