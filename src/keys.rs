//! Common constants for Folder Preview Handler registration.
//! Shared between the COM DLL and the installer. No duplicated string CLSIDs.
//!
//! GUIDs are kept as `u128` so the registry strings can be produced (and
//! tested) without the Windows bindings; `GUID::from_u128` turns them into
//! COM identifiers where needed.

/// CLSID of the preview handler. Must match DLL exports and registry bindings.
pub const CLSID_FOLDER_PREVIEW: u128 = 0x5C1A7E0D_3F4B_4B8E_9A2D_6E0F1B7C4D93;

/// Shell Preview Handler category.
/// - HKCR\CLSID\{CLSID}\Implemented Categories\{SHELL_PREVIEW_HANDLER_CATID}
/// - HKCR\Directory\shellex\{SHELL_PREVIEW_HANDLER_CATID} = {CLSID}
pub const SHELL_PREVIEW_HANDLER_CATID: u128 = 0x8895B1C6_B41F_4C1C_A562_0D564250836F;

/// AppID for the 64-bit Preview Handler host (`prevhost.exe`).
pub const PREVHOST_APPID_X64: u128 = 0x6D2B5079_2F0B_48DD_AB7F_97CEC514D30B;

/// Shell class the handler is bound to (HKCR\Directory).
pub const FOLDER_SHELL_CLASS: &str = "Directory";

/// Human-friendly handler name (HKCR\CLSID\{CLSID}\(Default)).
pub const FRIENDLY_NAME: &str = "Folder Preview Handler";

/// Per-user / per-machine settings key (HKCU first, then HKLM).
pub const LOG_SETTINGS_SUBKEY: &str = r"Software\FolderPreviewWin";

/// DWORD under [`LOG_SETTINGS_SUBKEY`]: 1 = write the diagnostic log.
pub const LOGGING_VALUE_NAME: &str = "Logging";

/// DWORD under [`LOG_SETTINGS_SUBKEY`]: maximum number of entries shown.
pub const SHOW_CAP_VALUE_NAME: &str = "ShowCap";

/// Directory under `%ProgramFiles%` the installer copies the DLL into.
pub const INSTALL_DIR_NAME: &str = "folder-preview-win";

/// File name of the COM server.
pub const DLL_FILE_NAME: &str = "folder_preview_win.dll";

/// Returns `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}` (uppercase, with braces).
pub fn guid_braced_upper(g: u128) -> String {
    format!(
        "{{{:08X}-{:04X}-{:04X}-{:04X}-{:012X}}}",
        (g >> 96) as u32,
        (g >> 80) as u16,
        (g >> 64) as u16,
        (g >> 48) as u16,
        g & 0xFFFF_FFFF_FFFF
    )
}

/// `{CLSID_FOLDER_PREVIEW}` as a braced uppercase string (for registry writes).
#[inline]
pub fn clsid_str() -> String {
    guid_braced_upper(CLSID_FOLDER_PREVIEW)
}

/// `{SHELL_PREVIEW_HANDLER_CATID}` as a braced uppercase string.
#[inline]
pub fn shell_preview_handler_catid_str() -> String {
    guid_braced_upper(SHELL_PREVIEW_HANDLER_CATID)
}

#[inline]
pub fn prevhost_appid_str() -> String {
    guid_braced_upper(PREVHOST_APPID_X64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_catid_matches_shell_string() {
        assert_eq!(
            shell_preview_handler_catid_str(),
            "{8895B1C6-B41F-4C1C-A562-0D564250836F}"
        );
    }

    #[test]
    fn leading_zeros_are_kept() {
        assert_eq!(
            guid_braced_upper(0x0000_0001_0002_0003_0000_0000_0000_0004),
            "{00000001-0002-0003-0000-000000000004}"
        );
    }

    #[test]
    fn clsid_differs_from_category() {
        assert_ne!(clsid_str(), shell_preview_handler_catid_str());
        assert_eq!(clsid_str().len(), 38);
    }
}
