//! The scrollable icon+label list window hosted inside the preview pane.
//!
//! Each window's state lives in a per-thread store keyed by its handle: the
//! window procedure always runs on the thread that created the window, and
//! icon/font handles must be released there too.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::mem::size_of;
use std::rc::Rc;
use std::sync::OnceLock;

use windows::{
    Win32::{
        Foundation::{COLORREF, ERROR_CLASS_ALREADY_EXISTS, GetLastError, HWND, LPARAM, LRESULT, RECT, WPARAM},
        Graphics::Gdi::{
            BeginPaint, //
            CreateFontIndirectW,
            CreateSolidBrush,
            DEFAULT_GUI_FONT,
            DT_END_ELLIPSIS,
            DT_LEFT,
            DT_NOPREFIX,
            DT_SINGLELINE,
            DT_VCENTER,
            DeleteObject,
            DrawTextW,
            EndPaint,
            FillRect,
            GetDC,
            GetStockObject,
            GetTextMetricsW,
            HGDIOBJ,
            InvalidateRect,
            LOGFONTW,
            PAINTSTRUCT,
            ReleaseDC,
            SelectObject,
            SetBkMode,
            SetTextColor,
            TEXTMETRICW,
            TRANSPARENT,
        },
        UI::{
            Input::KeyboardAndMouse::{VK_DOWN, VK_END, VK_HOME, VK_NEXT, VK_PRIOR, VK_UP},
            WindowsAndMessaging::{
                CS_HREDRAW,
                CS_VREDRAW, //
                DI_NORMAL,
                DefWindowProcW,
                DrawIconEx,
                GetClientRect,
                GetScrollInfo,
                GetSystemMetrics,
                IDC_ARROW,
                LoadCursorW,
                PostMessageW,
                RegisterClassExW,
                SB_VERT,
                SCROLLINFO,
                SIF_PAGE,
                SIF_POS,
                SIF_RANGE,
                SIF_TRACKPOS,
                SM_CXICON,
                SetScrollInfo,
                UnregisterClassW,
                WM_APP,
                WM_ERASEBKGND,
                WM_GETDLGCODE,
                WM_KEYDOWN,
                WM_MOUSEWHEEL,
                WM_NCDESTROY,
                WM_PAINT,
                WM_SIZE,
                WM_VSCROLL,
                WNDCLASS_STYLES,
                WNDCLASSEXW,
            },
        },
    },
    core::{PCWSTR, Result, w},
};

use crate::icons::{IconCache, IconHandle};
use crate::layout::{LayoutMetrics, ListLayout, ScrollCommand, ScrollState};
use crate::listing::RowSpec;
use crate::log::log;
use crate::module_instance;
use crate::theme::{Theme, ThemeWatch, system_theme};

pub const CLASS_NAME: PCWSTR = w!("FOLDER_PREVIEW_LIST");

static CLASS_REG: OnceLock<Result<()>> = OnceLock::new();

/// Posted by the OS colour subscription; re-reads the system theme.
const WM_THEME_CHANGED: u32 = WM_APP + 1;

const DLGC_WANTARROWS: isize = 0x0001;
const DLGC_WANTCHARS: isize = 0x0080;

struct Row {
    label: Vec<u16>,
    icon: Option<Rc<IconHandle>>,
}

/// Font used for labels; host-provided fonts are owned and deleted on drop.
struct LabelFont {
    handle: HGDIOBJ,
    owned: bool,
}

impl LabelFont {
    fn new(font: Option<&LOGFONTW>) -> Self {
        if let Some(lf) = font {
            let hfont = unsafe { CreateFontIndirectW(lf) };
            if !hfont.is_invalid() {
                return Self {
                    handle: HGDIOBJ(hfont.0),
                    owned: true,
                };
            }
            log("LabelFont: CreateFontIndirectW failed, using DEFAULT_GUI_FONT");
        }
        Self {
            handle: unsafe { GetStockObject(DEFAULT_GUI_FONT) },
            owned: false,
        }
    }
}

impl Drop for LabelFont {
    fn drop(&mut self) {
        if self.owned {
            let _ = unsafe { DeleteObject(self.handle) };
        }
    }
}

pub struct FolderView {
    rows: Vec<Row>,
    theme: Theme,
    font: LabelFont,
    metrics: LayoutMetrics,
    layout: ListLayout,
    scroll: ScrollState,
    theme_watch: Option<ThemeWatch>,
}

impl FolderView {
    /// Resolves icons for `rows` and prepares the labels for drawing.
    pub fn build(rows: &[RowSpec], theme: Theme, font: Option<&LOGFONTW>) -> Self {
        let mut icons = IconCache::default();
        let rows = rows
            .iter()
            .map(|spec| Row {
                label: spec.label.encode_utf16().collect(),
                icon: icons.icon_for(&spec.icon),
            })
            .collect::<Vec<_>>();

        let icon_size = match unsafe { GetSystemMetrics(SM_CXICON) } {
            n if n > 0 => n,
            _ => LayoutMetrics::default().icon_size,
        };

        Self {
            rows,
            theme,
            font: LabelFont::new(font),
            metrics: LayoutMetrics {
                icon_size,
                ..LayoutMetrics::default()
            },
            layout: ListLayout::default(),
            scroll: ScrollState::default(),
            theme_watch: None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn line_step(&self) -> i32 {
        self.metrics.row_height() + self.metrics.row_gap
    }

    fn measure_text(&mut self, hwnd: HWND) {
        let hdc = unsafe { GetDC(Some(hwnd)) };
        if hdc.is_invalid() {
            return;
        }
        let old = unsafe { SelectObject(hdc, self.font.handle) };
        let mut tm = TEXTMETRICW::default();
        if unsafe { GetTextMetricsW(hdc, &mut tm) }.as_bool() && tm.tmHeight > 0 {
            self.metrics.text_height = tm.tmHeight;
        }
        unsafe {
            SelectObject(hdc, old);
            ReleaseDC(Some(hwnd), hdc);
        }
    }

    /// Lays the rows out for a `width`×`height` client area and re-clamps the
    /// scroll offset.
    fn reflow(&mut self, width: i32, height: i32) {
        self.layout = ListLayout::compute(self.rows.len(), width, &self.metrics);
        self.scroll.set_content(self.layout.content_height);
        self.scroll.set_viewport(height);
    }

    fn scroll_info(&self) -> SCROLLINFO {
        SCROLLINFO {
            cbSize: size_of::<SCROLLINFO>() as u32,
            fMask: SIF_RANGE | SIF_PAGE | SIF_POS,
            nMin: 0,
            nMax: (self.scroll.content - 1).max(0),
            nPage: self.scroll.viewport.max(0) as u32,
            nPos: self.scroll.offset,
            nTrackPos: 0,
        }
    }

    fn paint(&self, hwnd: HWND) {
        let mut ps = PAINTSTRUCT::default();
        let hdc = unsafe { BeginPaint(hwnd, &mut ps) };

        let mut rc = RECT::default();
        let _ = unsafe { GetClientRect(hwnd, &mut rc) };

        let brush = unsafe { CreateSolidBrush(COLORREF(self.theme.background.to_colorref())) };
        if !brush.is_invalid() {
            unsafe {
                FillRect(hdc, &rc, brush);
                let _ = DeleteObject(HGDIOBJ(brush.0));
            }
        }

        let old_font = unsafe { SelectObject(hdc, self.font.handle) };
        unsafe {
            SetBkMode(hdc, TRANSPARENT);
            SetTextColor(hdc, COLORREF(self.theme.foreground.to_colorref()));
        }

        let offset = self.scroll.offset;
        let mut label = Vec::new();
        for index in self.layout.visible_rows(offset, rc.bottom - rc.top) {
            let (Some(row), Some(geometry)) = (self.rows.get(index), self.layout.rows.get(index))
            else {
                continue;
            };

            if let Some(icon) = &row.icon {
                let at = geometry.icon.shifted_up(offset);
                let _ = unsafe {
                    DrawIconEx(
                        hdc,
                        at.left,
                        at.top,
                        icon.hicon(),
                        at.width(),
                        at.height(),
                        0,
                        None,
                        DI_NORMAL,
                    )
                };
            }

            let text = geometry.text.shifted_up(offset);
            if text.width() > 0 {
                let mut text_rc = RECT {
                    left: text.left,
                    top: text.top,
                    right: text.right,
                    bottom: text.bottom,
                };
                label.clear();
                label.extend_from_slice(&row.label);
                unsafe {
                    DrawTextW(
                        hdc,
                        &mut label,
                        &mut text_rc,
                        DT_LEFT | DT_SINGLELINE | DT_VCENTER | DT_END_ELLIPSIS | DT_NOPREFIX,
                    )
                };
            }
        }

        unsafe {
            SelectObject(hdc, old_font);
            let _ = EndPaint(hwnd, &ps);
        }
    }
}

thread_local! {
    static VIEWS: RefCell<HashMap<isize, FolderView>> = RefCell::new(HashMap::new());
}

fn hwnd_key(hwnd: HWND) -> isize {
    hwnd.0 as isize
}

// Re-entrant messages (a nested WM_SIZE while a view is borrowed) see `None`.
fn with_view<R>(hwnd: HWND, f: impl FnOnce(&mut FolderView) -> R) -> Option<R> {
    VIEWS.with(|views| {
        let mut views = views.try_borrow_mut().ok()?;
        views.get_mut(&hwnd_key(hwnd)).map(f)
    })
}

// SetScrollInfo may send WM_SIZE synchronously, so it runs outside any borrow.
fn apply_scrollbar(hwnd: HWND, si: Option<SCROLLINFO>) {
    if let Some(si) = si {
        unsafe { SetScrollInfo(hwnd, SB_VERT, &si, true) };
    }
}

fn reflow_window(hwnd: HWND, width: i32, height: i32) {
    let si = with_view(hwnd, |view| {
        view.reflow(width, height);
        view.scroll_info()
    });
    apply_scrollbar(hwnd, si);
}

/// Installs `view` as the content of `hwnd`, replacing (and releasing) any
/// previous one, then lays it out for the current client size.
pub fn attach(hwnd: HWND, mut view: FolderView) {
    if hwnd.is_invalid() {
        return;
    }
    view.measure_text(hwnd);
    view.theme_watch = watch_theme(hwnd);
    let rows = view.row_count();

    let previous = VIEWS.with(|views| match views.try_borrow_mut() {
        Ok(mut views) => Ok(views.insert(hwnd_key(hwnd), view)),
        Err(_) => Err(view),
    });
    match previous {
        // The replaced view is dropped outside the borrow.
        Ok(previous) => drop(previous),
        Err(_) => {
            log("attach: view store busy, preview not attached");
            return;
        }
    }

    let mut rc = RECT::default();
    let _ = unsafe { GetClientRect(hwnd, &mut rc) };
    reflow_window(hwnd, rc.right - rc.left, rc.bottom - rc.top);

    log(format!(
        "attach 0x{:X}: {} rows, client {}x{}",
        hwnd.0 as usize,
        rows,
        rc.right - rc.left,
        rc.bottom - rc.top
    ));
    let _ = unsafe { InvalidateRect(Some(hwnd), None, true) };
}

fn watch_theme(hwnd: HWND) -> Option<ThemeWatch> {
    // HWND is not Send; the handler runs on a thread-pool thread.
    let target = hwnd.0 as isize;
    ThemeWatch::new(move || {
        let hwnd = HWND(target as *mut c_void);
        let _ = unsafe { PostMessageW(Some(hwnd), WM_THEME_CHANGED, WPARAM(0), LPARAM(0)) };
    })
    .map_err(|e| log(format!("attach: ColorValuesChanged subscription failed: {:?}", e)))
    .ok()
}

fn refresh_theme(hwnd: HWND) {
    let Some(theme) = system_theme() else {
        return;
    };
    let changed = with_view(hwnd, |view| std::mem::replace(&mut view.theme, theme) != theme);
    if changed == Some(true) {
        log("WM_THEME_CHANGED => theme refreshed");
        let _ = unsafe { InvalidateRect(Some(hwnd), None, true) };
    }
}

/// Drops the view of `hwnd`, releasing its icons, font and theme subscription.
pub fn detach(hwnd: HWND) {
    let previous = VIEWS.with(|views| {
        views
            .try_borrow_mut()
            .ok()
            .and_then(|mut views| views.remove(&hwnd_key(hwnd)))
    });
    if previous.is_some() {
        log(format!("detach 0x{:X}", hwnd.0 as usize));
    }
}

pub fn register_class_once() -> Result<()> {
    CLASS_REG
        .get_or_init(|| unsafe {
            let wc = WNDCLASSEXW {
                cbSize: size_of::<WNDCLASSEXW>() as u32,
                style: WNDCLASS_STYLES(CS_HREDRAW.0 | CS_VREDRAW.0),
                lpfnWndProc: Some(wndproc),
                hInstance: module_instance(),
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                lpszClassName: CLASS_NAME,
                ..Default::default()
            };

            if RegisterClassExW(&wc) == 0 {
                let err = GetLastError();
                if err != ERROR_CLASS_ALREADY_EXISTS {
                    return Err(windows::core::Error::from(err.to_hresult()));
                }
            }
            Ok(())
        })
        .clone()
}

/// Runs on `DLL_PROCESS_DETACH`: the class's window procedure lives in this
/// image. Nothing here may log; the loader lock is held.
pub fn unregister_class() {
    let _ = unsafe { UnregisterClassW(CLASS_NAME, Some(module_instance())) };
}

fn scroll_and_repaint(hwnd: HWND, f: impl FnOnce(&mut FolderView) -> bool) {
    let si = with_view(hwnd, |view| f(view).then(|| view.scroll_info())).flatten();
    if si.is_some() {
        apply_scrollbar(hwnd, si);
        let _ = unsafe { InvalidateRect(Some(hwnd), None, false) };
    }
}

fn thumb_position(hwnd: HWND) -> i32 {
    let mut si = SCROLLINFO {
        cbSize: size_of::<SCROLLINFO>() as u32,
        fMask: SIF_TRACKPOS,
        ..Default::default()
    };
    match unsafe { GetScrollInfo(hwnd, SB_VERT, &mut si) } {
        Ok(()) => si.nTrackPos,
        Err(_) => 0,
    }
}

unsafe extern "system" fn wndproc(hwnd: HWND, msg: u32, w: WPARAM, l: LPARAM) -> LRESULT {
    match msg {
        WM_ERASEBKGND => LRESULT(1),
        WM_PAINT => {
            let painted = VIEWS.with(|views| match views.try_borrow() {
                Ok(views) => match views.get(&hwnd_key(hwnd)) {
                    Some(view) => {
                        view.paint(hwnd);
                        true
                    }
                    None => false,
                },
                Err(_) => false,
            });
            if painted {
                LRESULT(0)
            } else {
                unsafe { DefWindowProcW(hwnd, msg, w, l) }
            }
        }
        WM_SIZE => {
            let lp = l.0 as u32;
            let width = (lp & 0xFFFF) as i32;
            let height = ((lp >> 16) & 0xFFFF) as i32;
            log(format!("WM_SIZE => {}x{}", width, height));
            reflow_window(hwnd, width, height);
            let _ = unsafe { InvalidateRect(Some(hwnd), None, false) };
            LRESULT(0)
        }
        WM_VSCROLL => {
            let code = (w.0 & 0xFFFF) as u32;
            if let Some(command) = ScrollCommand::from_raw(code, thumb_position(hwnd)) {
                scroll_and_repaint(hwnd, |view| {
                    let step = view.line_step();
                    view.scroll.apply(command, step)
                });
            }
            LRESULT(0)
        }
        WM_MOUSEWHEEL => {
            let delta = ((w.0 >> 16) & 0xFFFF) as u16 as i16 as i32;
            scroll_and_repaint(hwnd, |view| {
                let step = view.line_step();
                view.scroll.wheel(delta, step)
            });
            LRESULT(0)
        }
        WM_GETDLGCODE => LRESULT(DLGC_WANTARROWS | DLGC_WANTCHARS),
        WM_KEYDOWN => {
            let command = match w.0 as u16 {
                k if k == VK_UP.0 => Some(ScrollCommand::LineUp),
                k if k == VK_DOWN.0 => Some(ScrollCommand::LineDown),
                k if k == VK_PRIOR.0 => Some(ScrollCommand::PageUp),
                k if k == VK_NEXT.0 => Some(ScrollCommand::PageDown),
                k if k == VK_HOME.0 => Some(ScrollCommand::Top),
                k if k == VK_END.0 => Some(ScrollCommand::Bottom),
                _ => None,
            };
            match command {
                Some(command) => {
                    scroll_and_repaint(hwnd, |view| {
                        let step = view.line_step();
                        view.scroll.apply(command, step)
                    });
                    LRESULT(0)
                }
                None => unsafe { DefWindowProcW(hwnd, msg, w, l) },
            }
        }
        WM_THEME_CHANGED => {
            refresh_theme(hwnd);
            LRESULT(0)
        }
        WM_NCDESTROY => {
            detach(hwnd);
            unsafe { DefWindowProcW(hwnd, msg, w, l) }
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, w, l) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::IconSource;
    use crate::theme::ThemeColor;
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DestroyWindow, GetClassInfoExW, SendMessageW, WINDOW_EX_STYLE,
        WS_OVERLAPPED, WS_VSCROLL,
    };

    fn list_window() -> HWND {
        register_class_once().unwrap();
        unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                CLASS_NAME,
                PCWSTR::null(),
                WS_OVERLAPPED | WS_VSCROLL,
                0,
                0,
                240,
                160,
                None,
                None,
                Some(module_instance()),
                None,
            )
        }
        .unwrap()
    }

    fn rows(labels: &[&str]) -> Vec<RowSpec> {
        labels
            .iter()
            .map(|label| RowSpec {
                label: label.to_string(),
                icon: IconSource::StockFolder,
            })
            .collect()
    }

    #[test]
    fn class_belongs_to_this_module() {
        register_class_once().unwrap();
        let mut wc = WNDCLASSEXW {
            cbSize: size_of::<WNDCLASSEXW>() as u32,
            ..Default::default()
        };
        unsafe { GetClassInfoExW(Some(module_instance()), CLASS_NAME, &mut wc) }.unwrap();
        assert_eq!(wc.lpfnWndProc.map(|f| f as usize), Some(wndproc as usize));
    }

    #[test]
    fn theme_message_reloads_the_system_theme() {
        let hwnd = list_window();
        let stale = Theme::from_colors(ThemeColor::rgb(1, 2, 3), ThemeColor::rgb(4, 5, 6));
        attach(hwnd, FolderView::build(&rows(&["a"]), stale, None));

        unsafe { SendMessageW(hwnd, WM_THEME_CHANGED, Some(WPARAM(0)), Some(LPARAM(0))) };

        let theme = with_view(hwnd, |view| view.theme).unwrap();
        assert_eq!(theme, system_theme().unwrap_or(stale));

        unsafe { DestroyWindow(hwnd) }.unwrap();
        assert!(with_view(hwnd, |_| ()).is_none());
    }

    #[test]
    fn painting_leaves_labels_untouched() {
        let hwnd = list_window();
        attach(
            hwnd,
            FolderView::build(&rows(&["first folder", "second"]), Theme::LIGHT, None),
        );

        for _ in 0..2 {
            assert!(with_view(hwnd, |view| view.paint(hwnd)).is_some());
        }
        let labels = with_view(hwnd, |view| {
            view.rows
                .iter()
                .map(|row| String::from_utf16_lossy(&row.label))
                .collect::<Vec<_>>()
        })
        .unwrap();
        assert_eq!(labels, vec!["first folder", "second"]);

        unsafe { DestroyWindow(hwnd) }.unwrap();
    }
}
