//! Registry layout binding the handler to folders in Explorer.
//!
//! Written under `Software\Classes` of HKLM or HKCU:
//! - `CLSID\{CLSID}` + `InprocServer32` + `Implemented Categories\{CATID}`
//! - `Directory\shellex\{CATID}` = `{CLSID}`
//! - `Software\Microsoft\Windows\CurrentVersion\PreviewHandlers` and
//!   `Shell Extensions\Approved` list entries

use std::io;
use std::path::{Path, PathBuf};

use windows::Win32::UI::Shell::{SHCNE_ASSOCCHANGED, SHCNF_IDLIST, SHChangeNotify};
use winreg::RegKey;
use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_SET_VALUE};

use crate::keys::{
    FOLDER_SHELL_CLASS, FRIENDLY_NAME, clsid_str, prevhost_appid_str,
    shell_preview_handler_catid_str,
};
use crate::log::log_cli;

const PREVIEW_HANDLERS_SUBKEY: &str = r"Software\Microsoft\Windows\CurrentVersion\PreviewHandlers";
const APPROVED_SUBKEY: &str =
    r"Software\Microsoft\Windows\CurrentVersion\Shell Extensions\Approved";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryScope {
    CurrentUser,
    LocalMachine,
}

impl RegistryScope {
    pub fn name(self) -> &'static str {
        match self {
            RegistryScope::CurrentUser => "HKCU",
            RegistryScope::LocalMachine => "HKLM",
        }
    }

    fn root(self) -> RegKey {
        match self {
            RegistryScope::CurrentUser => RegKey::predef(HKEY_CURRENT_USER),
            RegistryScope::LocalMachine => RegKey::predef(HKEY_LOCAL_MACHINE),
        }
    }
}

fn clsid_subkey(clsid: &str) -> String {
    format!(r"Software\Classes\CLSID\{}", clsid)
}

fn shellex_subkey(catid: &str) -> String {
    format!(r"Software\Classes\{}\shellex\{}", FOLDER_SHELL_CLASS, catid)
}

pub fn register(scope: RegistryScope, dll_path: &Path) -> io::Result<()> {
    let scope_name = scope.name();
    log_cli(format!(
        "Register COM [{}]: start (dll={})",
        scope_name,
        dll_path.display()
    ));

    let root = scope.root();
    let clsid = clsid_str();
    let catid = shell_preview_handler_catid_str();

    let (key_clsid, _) = root.create_subkey(clsid_subkey(&clsid))?;
    key_clsid.set_value("", &FRIENDLY_NAME)?;
    key_clsid.set_value("DisplayName", &FRIENDLY_NAME)?;
    key_clsid.set_value("AppID", &prevhost_appid_str())?;

    let (key_inproc, _) = key_clsid.create_subkey("InprocServer32")?;
    key_inproc.set_value("", &dll_path.as_os_str())?;
    key_inproc.set_value("ThreadingModel", &"Apartment")?;

    key_clsid.create_subkey(format!(r"Implemented Categories\{}", catid))?;

    log_cli(format!(
        "Register COM [{}]: binding under {}",
        scope_name, FOLDER_SHELL_CLASS
    ));
    let (key_shellex, _) = root.create_subkey(shellex_subkey(&catid))?;
    key_shellex.set_value("", &clsid)?;

    let (handlers, _) = root.create_subkey(PREVIEW_HANDLERS_SUBKEY)?;
    handlers.set_value(&clsid, &FRIENDLY_NAME)?;

    let (approved, _) = root.create_subkey(APPROVED_SUBKEY)?;
    approved.set_value(&clsid, &FRIENDLY_NAME)?;

    log_cli(format!("Register COM [{}]: completed", scope_name));
    Ok(())
}

/// Removes everything [`register`] writes. Absent keys are not an error; the
/// first real failure is returned after all removals were attempted.
pub fn unregister(scope: RegistryScope) -> io::Result<()> {
    let scope_name = scope.name();
    log_cli(format!("Unregister COM [{}]: start", scope_name));

    let root = scope.root();
    let clsid = clsid_str();
    let catid = shell_preview_handler_catid_str();
    let mut first_err: Option<io::Error> = None;
    let mut note = |result: io::Result<()>, what: &str| {
        if let Err(err) = result {
            if err.kind() != io::ErrorKind::NotFound {
                log_cli(format!("Unregister COM [{}]: {} => {}", scope_name, what, err));
                first_err.get_or_insert(err);
            }
        }
    };

    note(root.delete_subkey_all(shellex_subkey(&catid)), "shellex binding");
    note(root.delete_subkey_all(clsid_subkey(&clsid)), "CLSID key");
    for list in [PREVIEW_HANDLERS_SUBKEY, APPROVED_SUBKEY] {
        note(
            root.open_subkey_with_flags(list, KEY_SET_VALUE)
                .and_then(|key| key.delete_value(&clsid)),
            list,
        );
    }

    log_cli(format!("Unregister COM [{}]: completed", scope_name));
    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[derive(Clone, Debug, Default)]
pub struct RegistrationStatus {
    pub clsid: bool,
    pub inproc_path: Option<PathBuf>,
    pub threading_apartment: bool,
    pub category: bool,
    pub shellex: bool,
    pub preview_handlers: bool,
    pub approved: bool,
}

impl RegistrationStatus {
    pub fn dll_exists(&self) -> bool {
        self.inproc_path.as_deref().is_some_and(Path::exists)
    }

    pub fn is_ready(&self) -> bool {
        self.clsid
            && self.threading_apartment
            && self.category
            && self.shellex
            && self.preview_handlers
            && self.dll_exists()
    }
}

pub fn probe(scope: RegistryScope) -> RegistrationStatus {
    let root = scope.root();
    let clsid = clsid_str();
    let catid = shell_preview_handler_catid_str();

    let key_clsid = root.open_subkey(clsid_subkey(&clsid)).ok();
    let inproc = key_clsid
        .as_ref()
        .and_then(|k| k.open_subkey("InprocServer32").ok());

    let has_value = |subkey: &str| {
        root.open_subkey(subkey)
            .and_then(|k| k.get_value::<String, _>(&clsid))
            .is_ok()
    };

    RegistrationStatus {
        clsid: key_clsid.is_some(),
        inproc_path: inproc
            .as_ref()
            .and_then(|k| k.get_value::<String, _>("").ok())
            .map(PathBuf::from),
        threading_apartment: inproc
            .as_ref()
            .and_then(|k| k.get_value::<String, _>("ThreadingModel").ok())
            .is_some_and(|m| m.eq_ignore_ascii_case("Apartment")),
        category: key_clsid
            .as_ref()
            .is_some_and(|k| k.open_subkey(format!(r"Implemented Categories\{}", catid)).is_ok()),
        shellex: root
            .open_subkey(shellex_subkey(&catid))
            .and_then(|k| k.get_value::<String, _>(""))
            .is_ok_and(|v| v.eq_ignore_ascii_case(&clsid)),
        preview_handlers: has_value(PREVIEW_HANDLERS_SUBKEY),
        approved: has_value(APPROVED_SUBKEY),
    }
}

/// Tells Explorer that handler associations changed.
pub fn notify_shell() {
    log_cli("Shell notify: SHChangeNotify(SHCNE_ASSOCCHANGED, SHCNF_IDLIST)");
    unsafe {
        SHChangeNotify(SHCNE_ASSOCCHANGED, SHCNF_IDLIST, None, None);
    }
}
