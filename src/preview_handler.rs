use std::sync::atomic::Ordering;
use std::{
    cell::{Cell, RefCell},
    ffi::c_void,
    path::PathBuf,
    ptr,
};

use windows::{
    Win32::{
        Foundation::{COLORREF, E_FAIL, E_NOTIMPL, E_POINTER, HWND, RECT, S_FALSE},
        Graphics::Gdi::{InvalidateRect, LOGFONTW},
        System::Ole::{IObjectWithSite, IObjectWithSite_Impl, IOleWindow, IOleWindow_Impl},
        UI::{
            Input::KeyboardAndMouse::{GetFocus, SetFocus},
            Shell::{
                IInitializeWithItem,
                IInitializeWithItem_Impl,
                IPreviewHandler,
                IPreviewHandler_Impl,
                IPreviewHandlerFrame,
                IPreviewHandlerVisuals,
                IPreviewHandlerVisuals_Impl,
                IShellItem,
                PropertiesSystem::{IInitializeWithFile, IInitializeWithFile_Impl},
                SIGDN_FILESYSPATH,
            },
            WindowsAndMessaging::{
                CreateWindowExW, //
                DestroyWindow,
                IsWindow,
                MSG,
                SW_SHOW,
                SWP_NOACTIVATE,
                SWP_NOZORDER,
                SetParent,
                SetWindowPos,
                ShowWindow,
                WINDOW_EX_STYLE,
                WS_CHILD,
                WS_CLIPCHILDREN,
                WS_VISIBLE,
                WS_VSCROLL,
            },
        },
    },
    core::{BOOL, GUID, IUnknown, Interface, PCWSTR, Ref, Result, implement},
};

use crate::{DLL_LOCK_COUNT, module_instance};
use crate::error::PreviewError;
use crate::folder_view::{self, FolderView};
use crate::listing::{FolderListing, RowSpec};
use crate::log::log;
use crate::settings::PreviewSettings;
use crate::theme::{Theme, system_theme};

#[implement(
    IObjectWithSite,
    IPreviewHandler,
    IOleWindow,
    IInitializeWithFile,
    IInitializeWithItem,
    IPreviewHandlerVisuals
)]
pub struct FolderPreviewHandler {
    hwnd_parent: Cell<HWND>, // from SetWindow(parent, ...)
    hwnd_preview: Cell<HWND>,
    rc: Cell<RECT>,                  // from SetWindow/SetRect
    site: RefCell<Option<IUnknown>>, // from SetSite
    folder: RefCell<Option<PathBuf>>, // from Initialize
    background_color: Cell<Option<COLORREF>>,
    text_color: Cell<Option<COLORREF>>,
    font: RefCell<Option<LOGFONTW>>,
    frame: RefCell<Option<IPreviewHandlerFrame>>,
}

#[allow(non_snake_case)]
impl FolderPreviewHandler {
    pub fn new() -> Self {
        log("FolderPreviewHandler::new");
        DLL_LOCK_COUNT.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = folder_view::register_class_once() {
            log(format!("FolderPreviewHandler::new => register_class_once => ERR: {:?}", e));
        }
        Self {
            hwnd_parent: Cell::new(HWND::default()), //
            hwnd_preview: Cell::new(HWND::default()),
            rc: Cell::new(RECT::default()),
            site: RefCell::new(None),
            folder: RefCell::new(None),
            background_color: Cell::new(None),
            text_color: Cell::new(None),
            font: RefCell::new(None),
            frame: RefCell::new(None),
        }
    }

    /// Reads the folder and turns it into rows. Failures are logged and
    /// yield an empty list.
    fn collect_rows(&self, settings: &PreviewSettings) -> Vec<RowSpec> {
        let listing = self
            .folder
            .borrow()
            .clone()
            .ok_or(PreviewError::MissingPath)
            .and_then(|folder| FolderListing::read(&folder, settings.show_cap));

        match listing {
            Ok(listing) => {
                log(format!(
                    "DoPreview: {} → {} of {} entries (cap {})",
                    listing.folder.display(),
                    listing.shown.len(),
                    listing.total,
                    settings.show_cap
                ));
                listing.rows()
            }
            Err(err) => {
                log(format!("DoPreview: listing failed: {err}"));
                Vec::new()
            }
        }
    }

    fn current_theme(&self) -> Theme {
        Theme::resolve(
            system_theme(),
            self.background_color.get().map(|c| c.0),
            self.text_color.get().map(|c| c.0),
        )
    }

    fn move_preview(&self, preview: HWND, rc: RECT, origin: &str) {
        match unsafe {
            SetWindowPos(
                preview,
                None, //
                rc.left,
                rc.top,
                rc.right - rc.left,
                rc.bottom - rc.top,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        } {
            Ok(_) => log(format!("  {origin} => SetWindowPos => OK")),
            Err(e) => log(format!("  {origin} => SetWindowPos => ERR: {:?}", e)),
        };
        let _ = unsafe { InvalidateRect(Some(preview), None, false) };
    }

    fn create_preview_window(&self) -> Result<HWND> {
        let parent = self.hwnd_parent.get();
        let rc = self.rc.get();
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                folder_view::CLASS_NAME,
                PCWSTR::null(),
                WS_CHILD | WS_VISIBLE | WS_VSCROLL | WS_CLIPCHILDREN,
                rc.left,
                rc.top,
                rc.right - rc.left,
                rc.bottom - rc.top,
                Some(parent),
                None,
                Some(module_instance()),
                None,
            )
        }?;
        log(format!("  DoPreview => CreateWindowExW (0x{:X})", hwnd.0 as usize));
        let _ = unsafe { ShowWindow(hwnd, SW_SHOW) };
        Ok(hwnd)
    }

    fn set_folder(&self, folder: PathBuf) {
        log(format!("Initialize (folder={})", folder.display()));
        *self.folder.borrow_mut() = Some(folder);
    }
}

impl Drop for FolderPreviewHandler {
    fn drop(&mut self) {
        DLL_LOCK_COUNT.fetch_sub(1, Ordering::SeqCst);
    }
}

/// https://learn.microsoft.com/en-us/windows/win32/api/propsys/nn-propsys-iinitializewithfile
#[allow(non_snake_case)]
impl IInitializeWithFile_Impl for FolderPreviewHandler_Impl {
    fn Initialize(&self, pszFilePath: &PCWSTR, _grfMode: u32) -> Result<()> {
        if pszFilePath.is_null() {
            return Err(E_POINTER.into());
        }
        let path = unsafe { widestring::U16CStr::from_ptr_str(pszFilePath.0) }.to_os_string();
        self.set_folder(PathBuf::from(path));
        Ok(())
    }
}

/// https://learn.microsoft.com/en-us/windows/win32/api/shobjidl_core/nn-shobjidl_core-iinitializewithitem
#[allow(non_snake_case)]
impl IInitializeWithItem_Impl for FolderPreviewHandler_Impl {
    fn Initialize(&self, psi: Ref<'_, IShellItem>, _grfMode: u32) -> Result<()> {
        let item: &IShellItem = psi.ok()?;
        let pw = unsafe { item.GetDisplayName(SIGDN_FILESYSPATH)? };
        if pw.is_null() {
            return Err(E_FAIL.into());
        }
        let path = unsafe { widestring::U16CStr::from_ptr_str(pw.0) }.to_os_string();
        unsafe { windows::Win32::System::Com::CoTaskMemFree(Some(pw.0 as *const c_void)) };
        self.set_folder(PathBuf::from(path));
        Ok(())
    }
}

/// https://learn.microsoft.com/en-us/windows/win32/api/shobjidl_core/nn-shobjidl_core-ipreviewhandler
#[allow(non_snake_case)]
impl IPreviewHandler_Impl for FolderPreviewHandler_Impl {
    fn SetWindow(&self, parent: HWND, prc: *const RECT) -> Result<()> {
        if parent.is_invalid() || prc.is_null() {
            log(format!("SetWindow (parent=0x{:X}, prc=NULL)", parent.0 as usize));
            return Ok(());
        }
        self.hwnd_parent.set(parent);

        let rc = unsafe { *prc };
        log(format!(
            "SetWindow (parent=0x{:X}, rc=({}, {}, {}, {}))",
            parent.0 as usize, rc.left, rc.top, rc.right, rc.bottom
        ));
        self.rc.set(rc);

        let preview = self.hwnd_preview.get();
        if !preview.is_invalid() {
            match unsafe { SetParent(preview, Some(parent)) } {
                Ok(_) => log("  SetWindow => SetParent => OK"),
                Err(e) => log(format!("  SetParent => ERR: {:?}", e)),
            };
            self.move_preview(preview, rc, "SetWindow");
        }

        Ok(())
    }

    fn SetRect(&self, prc: *const RECT) -> Result<()> {
        if prc.is_null() {
            log("SetRect (prc=NULL)");
            return Ok(());
        }
        let rc = unsafe { *prc };
        self.rc.set(rc);

        let preview = self.hwnd_preview.get();
        log(format!(
            "SetRect 0x{:X} (rc=({}, {}, {}, {}))",
            preview.0 as usize, rc.left, rc.top, rc.right, rc.bottom
        ));

        // WM_SIZE on the list window does the re-flow.
        if !preview.is_invalid() {
            self.move_preview(preview, rc, "SetRect");
        }
        Ok(())
    }

    fn DoPreview(&self) -> Result<()> {
        let parent = self.hwnd_parent.get();
        let rc = self.rc.get();
        log(format!(
            "DoPreview 0x{:X} (rc=({}, {}, {}, {}))",
            parent.0 as usize, rc.left, rc.top, rc.right, rc.bottom
        ));

        let settings = PreviewSettings::load();
        let rows = self.collect_rows(&settings);
        let view = FolderView::build(&rows, self.current_theme(), self.font.borrow().as_ref());

        let mut preview = self.hwnd_preview.get();
        if preview.is_invalid() {
            preview = match self.create_preview_window() {
                Ok(hwnd) => hwnd,
                Err(e) => {
                    log(format!("  DoPreview => CreateWindowExW => ERR: {:?}", e));
                    return Err(e);
                }
            };
            self.hwnd_preview.set(preview);
        } else {
            self.move_preview(preview, rc, "DoPreview");
        }

        folder_view::attach(preview, view);

        log(format!(
            "  DoPreview 0x{:X}:0x{:X} complete ({} rows)",
            parent.0 as usize,
            preview.0 as usize,
            rows.len()
        ));
        Ok(())
    }

    fn Unload(&self) -> Result<()> {
        log("Unload");

        self.folder.borrow_mut().take();
        self.background_color.set(None);
        self.text_color.set(None);
        self.font.borrow_mut().take();

        let preview = self.hwnd_preview.replace(HWND::default());
        if preview.is_invalid() {
            log("  hwnd_preview is invalid (nothing to destroy)");
            return Ok(());
        }

        if unsafe { IsWindow(Some(preview)) }.as_bool() {
            // WM_NCDESTROY releases the view.
            match unsafe { DestroyWindow(preview) } {
                Ok(_) => log("  DestroyWindow => OK"),
                Err(e) => log(format!("  DestroyWindow => ERR: {:?}", e)),
            }
        } else {
            log("  window already destroyed by host");
            folder_view::detach(preview);
        }
        Ok(())
    }

    fn SetFocus(&self) -> Result<()> {
        let preview = self.hwnd_preview.get();
        log(format!("SetFocus → 0x{:X}", preview.0 as usize));
        if !preview.is_invalid() {
            let _ = unsafe { SetFocus(Some(preview)) };
        }
        Ok(())
    }

    fn QueryFocus(&self) -> Result<HWND> {
        let hwnd = unsafe { GetFocus() };
        log(format!("QueryFocus → 0x{:X}", hwnd.0 as usize));
        Ok(hwnd)
    }

    fn TranslateAccelerator(&self, pmsg: *const MSG) -> Result<()> {
        let message = if pmsg.is_null() {
            0
        } else {
            unsafe { ptr::read(pmsg) }.message
        };
        log(format!("TranslateAccelerator (msg=0x{:X})", message));

        if let Some(frame) = self.frame.borrow().as_ref() {
            return match unsafe { frame.TranslateAccelerator(pmsg) } {
                Err(e) if e.code() != S_FALSE => {
                    log(format!("  TranslateAccelerator → frame error 0x{:08X}", e.code().0));
                    Err(e)
                }
                _ => Ok(()),
            };
        }
        Err(S_FALSE.into())
    }
}

/// Host-provided visual customization (background/text colors, fonts).
#[allow(non_snake_case)]
impl IPreviewHandlerVisuals_Impl for FolderPreviewHandler_Impl {
    fn SetBackgroundColor(&self, color: COLORREF) -> Result<()> {
        log(format!("SetBackgroundColor 0x{:06X}", color.0 & 0x00FF_FFFF));
        self.background_color.set(Some(color));
        Ok(())
    }

    fn SetFont(&self, plf: *const LOGFONTW) -> Result<()> {
        if plf.is_null() {
            log("SetFont(NULL) – clearing stored font");
            self.font.borrow_mut().take();
            return Ok(());
        }

        let lf = unsafe { *plf };
        let face_len = lf.lfFaceName.iter().position(|&c| c == 0).unwrap_or(lf.lfFaceName.len());
        log(format!(
            "SetFont height={} weight={} face='{}'",
            lf.lfHeight,
            lf.lfWeight,
            String::from_utf16_lossy(&lf.lfFaceName[..face_len])
        ));
        *self.font.borrow_mut() = Some(lf);
        Ok(())
    }

    fn SetTextColor(&self, color: COLORREF) -> Result<()> {
        log(format!("SetTextColor 0x{:06X}", color.0 & 0x00FF_FFFF));
        self.text_color.set(Some(color));
        Ok(())
    }
}

/// https://learn.microsoft.com/en-us/windows/win32/api/ocidl/nn-ocidl-iobjectwithsite
#[allow(non_snake_case)]
impl IObjectWithSite_Impl for FolderPreviewHandler_Impl {
    fn SetSite(&self, site: Ref<'_, IUnknown>) -> Result<()> {
        let mut slot = self.site.borrow_mut();
        let mut frame_slot = self.frame.borrow_mut();

        match site.cloned() {
            Some(u) => {
                log(format!("SetSite (site=0x{:X})", u.as_raw() as usize));
                match u.cast::<IPreviewHandlerFrame>() {
                    Ok(frame) => {
                        log("  SetSite => cached IPreviewHandlerFrame");
                        *frame_slot = Some(frame);
                    }
                    Err(err) => {
                        log(format!(
                            "  SetSite => IPreviewHandlerFrame unavailable (hr=0x{:08X})",
                            err.code().0
                        ));
                        frame_slot.take();
                    }
                }
                *slot = Some(u);
            }
            None => {
                log("SetSite (site=None)");
                slot.take();
                frame_slot.take();
            }
        }

        Ok(())
    }

    fn GetSite(&self, riid: *const GUID, ppv: *mut *mut c_void) -> Result<()> {
        if ppv.is_null() {
            return Err(E_POINTER.into());
        }
        unsafe { *ppv = ptr::null_mut() };
        match self.site.borrow().as_ref() {
            Some(site) => unsafe { site.query(riid, ppv) }.ok(),
            None => Err(E_FAIL.into()),
        }
    }
}

/// https://learn.microsoft.com/en-us/windows/win32/api/oleidl/nn-oleidl-iolewindow
#[allow(non_snake_case)]
impl IOleWindow_Impl for FolderPreviewHandler_Impl {
    fn GetWindow(&self) -> Result<HWND> {
        let preview = self.hwnd_preview.get();
        if !preview.is_invalid() {
            return Ok(preview);
        }
        Ok(self.hwnd_parent.get())
    }

    fn ContextSensitiveHelp(&self, fEnterMode: BOOL) -> Result<()> {
        log(format!("ContextSensitiveHelp (fEnterMode={})", fEnterMode.as_bool()));
        Err(E_NOTIMPL.into())
    }
}
