use std::path::PathBuf;

use dirs_next::{config_dir, home_dir};

/// Name of the directory created under the platform configuration root.
pub const CONFIG_DIR_NAME: &str = "action-tester";

/// Expands a leading `~` (Unix or Windows separator) to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        Some(rest) => home().join(rest),
        None => PathBuf::from(trimmed),
    }
}

/// Location of a file inside the tool's configuration directory, or inside
/// the working directory when the platform has no config root.
pub fn config_file_path(file_name: &str) -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(file_name)
}
