pub mod error;
pub mod keys;
pub mod layout;
pub mod listing;
pub mod log;
pub mod settings;
pub mod theme;

#[cfg(windows)]
mod class_factory;
#[cfg(windows)]
mod dll_export;
#[cfg(windows)]
mod folder_view;
#[cfg(windows)]
mod icons;
#[cfg(windows)]
mod preview_handler;
#[cfg(windows)]
pub mod registration;

#[cfg(not(target_pointer_width = "64"))]
compile_error!("folder-preview-win must be built for 64-bit targets");

#[cfg(windows)]
use std::ffi::c_void;
#[cfg(windows)]
use std::sync::atomic::{AtomicIsize, AtomicU32, Ordering};

#[cfg(windows)]
use windows::Win32::Foundation::HINSTANCE;
#[cfg(windows)]
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
#[cfg(windows)]
use windows::core::{GUID, HRESULT};

#[cfg(windows)]
const CLASS_E_CLASSNOTAVAILABLE: HRESULT = HRESULT(0x80040111u32 as i32);

/// Live handler objects plus `LockServer` locks.
#[cfg(windows)]
static DLL_LOCK_COUNT: AtomicU32 = AtomicU32::new(0);

/// This DLL's module handle, captured in `DllMain`.
#[cfg(windows)]
static DLL_MODULE: AtomicIsize = AtomicIsize::new(0);

#[cfg(windows)]
fn clsid_folder_preview() -> GUID {
    GUID::from_u128(keys::CLSID_FOLDER_PREVIEW)
}

/// Instance that owns the list window class: this DLL, or the executable when
/// the crate is linked as an rlib and `DllMain` never ran.
#[cfg(windows)]
fn module_instance() -> HINSTANCE {
    match DLL_MODULE.load(Ordering::SeqCst) {
        0 => unsafe { GetModuleHandleW(None) }
            .map(Into::into)
            .unwrap_or_default(),
        raw => HINSTANCE(raw as *mut c_void),
    }
}
