use crate::DLL_LOCK_COUNT;
use crate::log::log;
use crate::preview_handler::FolderPreviewHandler;
use std::ffi::c_void;
use std::ptr::null_mut;
use std::sync::atomic::Ordering;
use windows::Win32::Foundation::{CLASS_E_NOAGGREGATION, E_POINTER};
use windows::Win32::System::Com::IClassFactory_Impl;
use windows_core::{BOOL, Error, GUID, IUnknown, Interface};
use windows_implement::implement;

#[implement(windows::Win32::System::Com::IClassFactory)]
pub struct FolderClassFactory;

impl IClassFactory_Impl for FolderClassFactory_Impl {
    #[allow(non_snake_case)]
    fn CreateInstance(
        &self,
        outer: windows::core::Ref<'_, IUnknown>,
        riid: *const GUID,
        ppv: *mut *mut c_void,
    ) -> windows::core::Result<()> {
        if ppv.is_null() || riid.is_null() {
            return Err(Error::from(E_POINTER));
        }
        unsafe {
            *ppv = null_mut();
        }
        if outer.ok().is_ok() {
            return Err(Error::from(CLASS_E_NOAGGREGATION));
        }

        let riid_val = unsafe { *riid };
        log(format!("FolderClassFactory::CreateInstance riid={:?}", riid_val));

        // Answers every interface the handler implements, E_NOINTERFACE otherwise.
        let unk: IUnknown = FolderPreviewHandler::new().into();
        unsafe { unk.query(riid, ppv) }.ok()
    }

    #[allow(non_snake_case)]
    fn LockServer(&self, f_lock: BOOL) -> windows::core::Result<()> {
        if f_lock.as_bool() {
            DLL_LOCK_COUNT.fetch_add(1, Ordering::SeqCst);
            log("FolderClassFactory::LockServer lock");
        } else {
            DLL_LOCK_COUNT.fetch_sub(1, Ordering::SeqCst);
            log("FolderClassFactory::LockServer unlock");
        }
        Ok(())
    }
}
