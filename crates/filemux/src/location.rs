//! Host locations used to seed backend roots.

use std::path::{Path, PathBuf};

/// Directory containing the running executable.
///
/// Falls back to `./` when the executable path can't be determined.
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .map(|exe| dunce::canonicalize(&exe).unwrap_or(exe))
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("./"))
}

/// Writable per-user directory for saved data.
///
/// The platform config directory (e.g. `~/.config` on Linux), else
/// `$HOME/.config`, else `./.config`.
pub fn save_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".").join(".config"))
}
