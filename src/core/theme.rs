//! The light/dark state every other component agrees on.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeState {
    Light,
    Dark,
}

impl ThemeState {
    pub fn from_dark_mode(dark_mode: bool) -> Self {
        if dark_mode {
            ThemeState::Dark
        } else {
            ThemeState::Light
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, ThemeState::Dark)
    }

    pub fn toggled(&self) -> Self {
        match self {
            ThemeState::Light => ThemeState::Dark,
            ThemeState::Dark => ThemeState::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeState::Light => "light",
            ThemeState::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trip() {
        assert_eq!(ThemeState::Light.toggled(), ThemeState::Dark);
        assert_eq!(ThemeState::Dark.toggled().toggled(), ThemeState::Dark);
    }

    #[test]
    fn test_dark_mode_flag_mapping() {
        assert!(ThemeState::from_dark_mode(true).is_dark());
        assert!(!ThemeState::from_dark_mode(false).is_dark());
    }
}
