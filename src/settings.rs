//! Runtime settings, read from the registry on every preview.
//!
//! `HKCU\{LOG_SETTINGS_SUBKEY}` is consulted first, then the same key under
//! HKLM. Missing values fall back to the defaults below.

/// Entries shown before the rest collapse into an overflow row.
pub const DEFAULT_SHOW_CAP: usize = 20;

/// Upper bound for a configured cap.
pub const MAX_SHOW_CAP: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreviewSettings {
    pub show_cap: usize,
    pub logging: bool,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            show_cap: DEFAULT_SHOW_CAP,
            logging: false,
        }
    }
}

impl PreviewSettings {
    /// Builds settings from raw DWORD values as stored in the registry.
    pub fn from_values(logging: Option<u32>, show_cap: Option<u32>) -> Self {
        let show_cap = match show_cap {
            None | Some(0) => DEFAULT_SHOW_CAP,
            Some(n) => (n as usize).min(MAX_SHOW_CAP),
        };
        Self {
            show_cap,
            logging: logging.is_some_and(|v| v != 0),
        }
    }

    pub fn load() -> Self {
        Self::from_values(
            read_dword(crate::keys::LOGGING_VALUE_NAME),
            read_dword(crate::keys::SHOW_CAP_VALUE_NAME),
        )
    }
}

pub fn logging_enabled() -> bool {
    PreviewSettings::from_values(read_dword(crate::keys::LOGGING_VALUE_NAME), None).logging
}

#[cfg(windows)]
fn read_dword(name: &str) -> Option<u32> {
    use winreg::RegKey;
    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};

    fn read_from(hive: RegKey, name: &str) -> Option<u32> {
        let key = hive.open_subkey(crate::keys::LOG_SETTINGS_SUBKEY).ok()?;
        key.get_value::<u32, _>(name).ok()
    }

    read_from(RegKey::predef(HKEY_CURRENT_USER), name)
        .or_else(|| read_from(RegKey::predef(HKEY_LOCAL_MACHINE), name))
}

#[cfg(not(windows))]
fn read_dword(_name: &str) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_stored() {
        assert_eq!(PreviewSettings::from_values(None, None), PreviewSettings::default());
    }

    #[test]
    fn zero_cap_means_default() {
        assert_eq!(PreviewSettings::from_values(None, Some(0)).show_cap, DEFAULT_SHOW_CAP);
    }

    #[test]
    fn cap_is_clamped() {
        assert_eq!(PreviewSettings::from_values(None, Some(5)).show_cap, 5);
        assert_eq!(
            PreviewSettings::from_values(None, Some(u32::MAX)).show_cap,
            MAX_SHOW_CAP
        );
    }

    #[test]
    fn logging_flag_is_any_non_zero_dword() {
        assert!(PreviewSettings::from_values(Some(1), None).logging);
        assert!(PreviewSettings::from_values(Some(7), None).logging);
        assert!(!PreviewSettings::from_values(Some(0), None).logging);
    }
}
