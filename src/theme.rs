//! Background and text colours for the list, following the OS app theme.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemeColor {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ThemeColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// GDI colour, `0x00BBGGRR`. Alpha is dropped.
    pub fn to_colorref(self) -> u32 {
        (self.r as u32) | ((self.g as u32) << 8) | ((self.b as u32) << 16)
    }

    pub fn from_colorref(value: u32) -> Self {
        Self::rgb(
            (value & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            ((value >> 16) & 0xFF) as u8,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorRole {
    Background,
    Foreground,
}

/// Dark mode reports the background as pure black; the pane uses Explorer's
/// dark grey instead.
pub const DARK_BACKGROUND: ThemeColor = ThemeColor::rgb(32, 32, 32);

pub fn normalize(role: ColorRole, color: ThemeColor) -> ThemeColor {
    match role {
        ColorRole::Background if color.r == 0 => DARK_BACKGROUND,
        _ => color,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub background: ThemeColor,
    pub foreground: ThemeColor,
}

impl Theme {
    pub const LIGHT: Theme = Theme {
        background: ThemeColor::rgb(255, 255, 255),
        foreground: ThemeColor::rgb(0, 0, 0),
    };

    pub const DARK: Theme = Theme {
        background: DARK_BACKGROUND,
        foreground: ThemeColor::rgb(255, 255, 255),
    };

    pub fn from_colors(background: ThemeColor, foreground: ThemeColor) -> Self {
        Self {
            background: normalize(ColorRole::Background, background),
            foreground: normalize(ColorRole::Foreground, foreground),
        }
    }

    pub fn for_light_mode(light: bool) -> Self {
        if light { Self::LIGHT } else { Self::DARK }
    }

    /// OS theme first, then colours pushed by the host through
    /// `IPreviewHandlerVisuals`, then the light theme.
    pub fn resolve(
        system: Option<Theme>,
        host_background: Option<u32>,
        host_text: Option<u32>,
    ) -> Self {
        if let Some(theme) = system {
            return theme;
        }
        match (host_background, host_text) {
            (None, None) => Self::LIGHT,
            (bg, fg) => Self::from_colors(
                bg.map(ThemeColor::from_colorref)
                    .unwrap_or(Self::LIGHT.background),
                fg.map(ThemeColor::from_colorref)
                    .unwrap_or(Self::LIGHT.foreground),
            ),
        }
    }
}

#[cfg(windows)]
pub use system::{ThemeWatch, system_theme};

#[cfg(windows)]
mod system {
    use super::{Theme, ThemeColor};
    use windows::Foundation::TypedEventHandler;
    use windows::UI::ViewManagement::{UIColorType, UISettings};
    use windows::core::IInspectable;
    use winreg::RegKey;
    use winreg::enums::HKEY_CURRENT_USER;

    const PERSONALIZE_SUBKEY: &str =
        r"Software\Microsoft\Windows\CurrentVersion\Themes\Personalize";

    /// Current OS app theme, or `None` when it cannot be determined.
    pub fn system_theme() -> Option<Theme> {
        from_ui_settings().ok().or_else(from_registry)
    }

    /// A live `ColorValuesChanged` subscription; dropping it unsubscribes.
    ///
    /// Child windows never receive the `WM_SETTINGCHANGE` broadcast, so this
    /// is the only notification the list window gets.
    pub struct ThemeWatch {
        settings: UISettings,
        token: i64,
    }

    impl ThemeWatch {
        /// `on_change` runs on a thread-pool thread, not the UI thread.
        pub fn new(on_change: impl Fn() + Send + 'static) -> windows::core::Result<Self> {
            let settings = UISettings::new()?;
            let handler = TypedEventHandler::<UISettings, IInspectable>::new(move |_, _| {
                on_change();
                Ok(())
            });
            let token = settings.ColorValuesChanged(&handler)?;
            Ok(Self { settings, token })
        }
    }

    impl Drop for ThemeWatch {
        fn drop(&mut self) {
            let _ = self.settings.RemoveColorValuesChanged(self.token);
        }
    }

    fn from_ui_settings() -> windows::core::Result<Theme> {
        let settings = UISettings::new()?;
        let bg = settings.GetColorValue(UIColorType::Background)?;
        let fg = settings.GetColorValue(UIColorType::Foreground)?;
        Ok(Theme::from_colors(
            ThemeColor::argb(bg.A, bg.R, bg.G, bg.B),
            ThemeColor::argb(fg.A, fg.R, fg.G, fg.B),
        ))
    }

    fn from_registry() -> Option<Theme> {
        let key = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey(PERSONALIZE_SUBKEY)
            .ok()?;
        let light = key.get_value::<u32, _>("AppsUseLightTheme").ok()?;
        Some(Theme::for_light_mode(light != 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_background_becomes_dark_grey() {
        let theme = Theme::from_colors(ThemeColor::rgb(0, 0, 0), ThemeColor::rgb(255, 255, 255));
        assert_eq!(theme, Theme::DARK);
    }

    #[test]
    fn black_foreground_is_kept() {
        let fg = normalize(ColorRole::Foreground, ThemeColor::rgb(0, 0, 0));
        assert_eq!(fg, ThemeColor::rgb(0, 0, 0));
    }

    #[test]
    fn colorref_is_bgr() {
        let c = ThemeColor::rgb(0x12, 0x34, 0x56);
        assert_eq!(c.to_colorref(), 0x0056_3412);
        assert_eq!(ThemeColor::from_colorref(0x0056_3412), c);
    }

    #[test]
    fn system_theme_wins() {
        let theme = Theme::resolve(Some(Theme::DARK), Some(0x00FF_FFFF), Some(0));
        assert_eq!(theme, Theme::DARK);
    }

    #[test]
    fn host_colours_fill_in_without_system_theme() {
        let theme = Theme::resolve(None, Some(0x0000_00FF), None);
        assert_eq!(theme.background, ThemeColor::rgb(255, 0, 0));
        assert_eq!(theme.foreground, Theme::LIGHT.foreground);
        assert_eq!(Theme::resolve(None, None, None), Theme::LIGHT);
    }

    #[test]
    fn black_host_background_is_normalized() {
        let theme = Theme::resolve(None, Some(0x0000_0000), Some(0x00FF_FFFF));
        assert_eq!(theme, Theme::DARK);
    }
}
