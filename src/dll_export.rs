use crate::class_factory::FolderClassFactory;
use crate::folder_view;
use crate::log::log;
use crate::registration::{self, RegistryScope};
use crate::{CLASS_E_CLASSNOTAVAILABLE, DLL_LOCK_COUNT, DLL_MODULE, clsid_folder_preview};
use std::ffi::c_void;
use std::path::PathBuf;
use std::ptr::null_mut;
use std::sync::atomic::Ordering;
use windows::Win32::Foundation::{
    E_FAIL, E_NOINTERFACE, E_POINTER, HINSTANCE, HMODULE, MAX_PATH, S_FALSE, S_OK,
};
use windows::Win32::System::Com::IClassFactory;
use windows::Win32::System::LibraryLoader::GetModuleFileNameW;
use windows::Win32::System::SystemServices::{DLL_PROCESS_ATTACH, DLL_PROCESS_DETACH};
use windows_core::{BOOL, GUID, HRESULT, IUnknown, Interface};

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "system" fn DllMain(module: HINSTANCE, reason: u32, reserved: *mut c_void) -> BOOL {
    match reason {
        DLL_PROCESS_ATTACH => DLL_MODULE.store(module.0 as isize, Ordering::SeqCst),
        // FreeLibrary, not process exit: the class must not outlive its wndproc.
        DLL_PROCESS_DETACH if reserved.is_null() => folder_view::unregister_class(),
        _ => {}
    }
    true.into()
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "system" fn DllGetClassObject(
    rclsid: *const GUID,
    riid: *const GUID,
    ppv: *mut *mut c_void,
) -> HRESULT {
    log("DllGetClassObject called");
    unsafe {
        if ppv.is_null() {
            return E_POINTER;
        }
        *ppv = null_mut();

        if rclsid.is_null() || riid.is_null() {
            return E_POINTER;
        }

        if *rclsid != clsid_folder_preview() {
            log(format!("DllGetClassObject: unknown CLSID {:?}", *rclsid));
            return CLASS_E_CLASSNOTAVAILABLE;
        }

        let cf: IClassFactory = FolderClassFactory.into();
        if *riid == IClassFactory::IID || *riid == IUnknown::IID {
            *ppv = cf.into_raw();
            S_OK
        } else {
            E_NOINTERFACE
        }
    }
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "system" fn DllCanUnloadNow() -> HRESULT {
    let live = DLL_LOCK_COUNT.load(Ordering::SeqCst);
    log(format!("DllCanUnloadNow called (live={live})"));
    if live == 0 { S_OK } else { S_FALSE }
}

/// `regsvr32 folder_preview_win.dll`: machine-wide, per-user when HKLM is
/// not writable.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "system" fn DllRegisterServer() -> HRESULT {
    let Some(dll_path) = module_path() else {
        log("DllRegisterServer: module path unavailable");
        return E_FAIL;
    };
    log(format!("DllRegisterServer ({})", dll_path.display()));

    let result = registration::register(RegistryScope::LocalMachine, &dll_path).or_else(|err| {
        log(format!("DllRegisterServer: HKLM failed ({err}), trying HKCU"));
        registration::register(RegistryScope::CurrentUser, &dll_path)
    });
    match result {
        Ok(()) => {
            registration::notify_shell();
            S_OK
        }
        Err(err) => {
            log(format!("DllRegisterServer: failed: {err}"));
            E_FAIL
        }
    }
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "system" fn DllUnregisterServer() -> HRESULT {
    log("DllUnregisterServer");
    let machine = registration::unregister(RegistryScope::LocalMachine);
    let user = registration::unregister(RegistryScope::CurrentUser);
    registration::notify_shell();
    match (machine, user) {
        (Err(m), Err(u)) => {
            log(format!("DllUnregisterServer: HKLM: {m}; HKCU: {u}"));
            E_FAIL
        }
        _ => S_OK,
    }
}

fn module_path() -> Option<PathBuf> {
    let raw = DLL_MODULE.load(Ordering::SeqCst);
    if raw == 0 {
        return None;
    }
    let mut buf = vec![0u16; MAX_PATH as usize];
    let len = unsafe { GetModuleFileNameW(Some(HMODULE(raw as *mut c_void)), &mut buf) } as usize;
    if len == 0 || len >= buf.len() {
        return None;
    }
    Some(PathBuf::from(String::from_utf16_lossy(&buf[..len])))
}
