use std::mem::size_of;
use std::path::Path;
use std::rc::Rc;

use widestring::U16CString;
use windows::Win32::Storage::FileSystem::FILE_FLAGS_AND_ATTRIBUTES;
use windows::Win32::UI::Shell::{
    SHFILEINFOW, SHGFI_ICON, SHGFI_LARGEICON, SHGSI_ICON, SHGSI_LARGEICON, SHGetFileInfoW,
    SHGetStockIconInfo, SHSTOCKICONINFO, SIID_FOLDER,
};
use windows::Win32::UI::WindowsAndMessaging::{DestroyIcon, HICON, IDI_WINLOGO, LoadIconW};
use windows::core::{PCWSTR, Result};

use crate::listing::IconSource;
use crate::log::log;

/// A native icon. Owned icons are destroyed on drop; shared system icons are not.
pub struct IconHandle {
    hicon: HICON,
    owned: bool,
}

impl IconHandle {
    fn owned(hicon: HICON) -> Option<Self> {
        (!hicon.is_invalid()).then_some(Self { hicon, owned: true })
    }

    fn shared(hicon: HICON) -> Option<Self> {
        (!hicon.is_invalid()).then_some(Self { hicon, owned: false })
    }

    pub fn hicon(&self) -> HICON {
        self.hicon
    }
}

impl Drop for IconHandle {
    fn drop(&mut self) {
        if self.owned {
            if let Err(e) = unsafe { DestroyIcon(self.hicon) } {
                log(format!("DestroyIcon(0x{:X}) => ERR: {:?}", self.hicon.0 as usize, e));
            }
        }
    }
}

/// Generic folder icon via `SHGetStockIconInfo(SIID_FOLDER)`.
pub fn stock_folder_icon() -> Result<IconHandle> {
    let mut info = SHSTOCKICONINFO {
        cbSize: size_of::<SHSTOCKICONINFO>() as u32,
        ..Default::default()
    };
    unsafe { SHGetStockIconInfo(SIID_FOLDER, SHGSI_ICON | SHGSI_LARGEICON, &mut info)? };
    IconHandle::owned(info.hIcon)
        .ok_or_else(|| windows::core::Error::new(windows::Win32::Foundation::E_FAIL, "stock folder icon is null"))
}

/// Icon the shell associates with `path`, if any.
pub fn associated_icon(path: &Path) -> Option<IconHandle> {
    let wide = U16CString::from_os_str(path.as_os_str()).ok()?;
    let mut info = SHFILEINFOW::default();
    let result = unsafe {
        SHGetFileInfoW(
            PCWSTR(wide.as_ptr()),
            FILE_FLAGS_AND_ATTRIBUTES(0),
            Some(&mut info as *mut SHFILEINFOW),
            size_of::<SHFILEINFOW>() as u32,
            SHGFI_ICON | SHGFI_LARGEICON,
        )
    };
    if result == 0 {
        return None;
    }
    IconHandle::owned(info.hIcon)
}

/// Shared system icon used when a file has no associated icon.
pub fn default_icon() -> Option<IconHandle> {
    unsafe { LoadIconW(None, IDI_WINLOGO) }
        .ok()
        .and_then(IconHandle::shared)
}

/// Resolves icons for one row set. The folder and default icons are fetched
/// at most once and shared between rows.
#[derive(Default)]
pub struct IconCache {
    folder: Option<Rc<IconHandle>>,
    fallback: Option<Rc<IconHandle>>,
}

impl IconCache {
    pub fn icon_for(&mut self, source: &IconSource) -> Option<Rc<IconHandle>> {
        match source {
            IconSource::StockFolder => self.folder(),
            IconSource::Associated(path) => match associated_icon(path) {
                Some(icon) => Some(Rc::new(icon)),
                None => {
                    log(format!("icon: no associated icon for {}", path.display()));
                    self.fallback()
                }
            },
        }
    }

    fn folder(&mut self) -> Option<Rc<IconHandle>> {
        if self.folder.is_none() {
            match stock_folder_icon() {
                Ok(icon) => self.folder = Some(Rc::new(icon)),
                Err(e) => log(format!("icon: SHGetStockIconInfo failed: {:?}", e)),
            }
        }
        self.folder.clone()
    }

    fn fallback(&mut self) -> Option<Rc<IconHandle>> {
        if self.fallback.is_none() {
            self.fallback = default_icon().map(Rc::new);
        }
        self.fallback.clone()
    }
}
