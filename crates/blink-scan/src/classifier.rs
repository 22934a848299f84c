//! Hidden-entry classification.

use std::ffi::OsStr;
use std::path::Path;

use blink_core::{Platform, ScanConfig};

/// Whether an entry is hidden under the rules of `platform`.
///
/// On POSIX the name decides: anything starting with `.` is hidden. On
/// Windows the hidden file attribute decides; a failed attribute lookup
/// counts as visible.
pub fn is_hidden(name: &OsStr, path: &Path, platform: Platform) -> bool {
    match platform {
        Platform::Posix => name.as_encoded_bytes().first() == Some(&b'.'),
        Platform::Windows => has_hidden_attribute(path),
    }
}

/// Whether the walker should drop an entry (and, for a directory, its
/// whole subtree).
///
/// `exclude_names` always applies. The hidden rule applies unless the config
/// asks for hidden entries.
pub fn is_excluded(name: &OsStr, path: &Path, config: &ScanConfig) -> bool {
    if config.is_excluded_name(&name.to_string_lossy()) {
        return true;
    }
    !config.include_hidden && is_hidden(name, path, config.platform)
}

#[cfg(windows)]
fn has_hidden_attribute(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;

    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    std::fs::symlink_metadata(path)
        .map(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_path: &Path) -> bool {
    false
}
