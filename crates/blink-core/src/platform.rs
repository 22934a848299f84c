//! Platform selection and per-platform defaults.

use serde::{Deserialize, Serialize};

/// Rule family used to decide whether an entry is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Hidden means the base name starts with `.`.
    Posix,
    /// Hidden means the entry carries the hidden file attribute.
    Windows,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Whether names on this platform compare case-insensitively.
    pub fn case_insensitive_names(self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Names always treated as hidden on the current platform.
///
/// These are the system folders that live under the usual scan roots and
/// hold nothing a user would delete by hand.
pub fn default_exclude_names() -> Vec<String> {
    let names: &[&str] = if cfg!(target_os = "macos") {
        &["Library"]
    } else if cfg!(windows) {
        &[
            "$Recycle.Bin",
            "System Volume Information",
            "Windows",
            "ProgramData",
            "Program Files",
            "Program Files (x86)",
        ]
    } else {
        &[]
    };
    names.iter().map(|n| n.to_string()).collect()
}
