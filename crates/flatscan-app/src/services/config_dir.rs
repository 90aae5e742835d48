// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config directory resolution.

use std::ffi::OsString;
use std::path::PathBuf;

const APP_DIR: &str = "flatscan";
const CONFIG_FILE: &str = "config.json";

/// Default location of the settings file.
///
/// Does not create anything; `AppConfig::save` creates parent directories
/// when the file is first written.
pub fn config_path() -> PathBuf {
    config_path_from(std::env::var_os("XDG_CONFIG_HOME"), std::env::var_os("HOME"))
}

fn config_path_from(xdg: Option<OsString>, home: Option<OsString>) -> PathBuf {
    config_base(xdg, home).join(APP_DIR).join(CONFIG_FILE)
}

fn config_base(xdg: Option<OsString>, home: Option<OsString>) -> PathBuf {
    // Try XDG config dir, then fallback to home
    if let Some(xdg) = xdg.filter(|dir| !dir.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = home.filter(|dir| !dir.is_empty()) {
        return PathBuf::from(home).join(".config");
    }
    // Last resort
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_takes_precedence() {
        let path = config_path_from(Some("/xdg".into()), Some("/home/ada".into()));
        assert_eq!(path, PathBuf::from("/xdg/flatscan/config.json"));
    }

    #[test]
    fn home_is_the_fallback() {
        let path = config_path_from(None, Some("/home/ada".into()));
        assert_eq!(path, PathBuf::from("/home/ada/.config/flatscan/config.json"));
    }

    #[test]
    fn empty_xdg_is_ignored() {
        let path = config_path_from(Some(OsString::new()), Some("/home/ada".into()));
        assert_eq!(path, PathBuf::from("/home/ada/.config/flatscan/config.json"));
    }

    #[test]
    fn nothing_set_uses_temp_dir() {
        let path = config_path_from(None, None);
        assert!(path.starts_with(std::env::temp_dir()));
    }
}
