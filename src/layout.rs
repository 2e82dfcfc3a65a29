//! Pixel geometry of the icon+label list and its vertical scroll state.

use std::ops::Range;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Same rectangle moved up by `dy` pixels.
    pub fn shifted_up(&self, dy: i32) -> Rect {
        Rect {
            left: self.left,
            top: self.top - dy,
            right: self.right,
            bottom: self.bottom - dy,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutMetrics {
    pub icon_size: i32,
    pub text_height: i32,
    pub row_gap: i32,
    pub margin: i32,
    pub icon_text_gap: i32,
    /// Label width as a fraction of the client width.
    pub text_ratio: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            icon_size: 32,
            text_height: 16,
            row_gap: 4,
            margin: 6,
            icon_text_gap: 8,
            text_ratio: 0.6,
        }
    }
}

impl LayoutMetrics {
    pub fn row_height(&self) -> i32 {
        self.icon_size.max(self.text_height).max(1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowLayout {
    pub bounds: Rect,
    pub icon: Rect,
    pub text: Rect,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListLayout {
    pub rows: Vec<RowLayout>,
    pub width: i32,
    pub content_height: i32,
}

impl ListLayout {
    /// Stacks `row_count` rows top-down for a client area `width` pixels wide.
    pub fn compute(row_count: usize, width: i32, metrics: &LayoutMetrics) -> Self {
        let width = width.max(0);
        let row_height = metrics.row_height();
        let stride = row_height + metrics.row_gap;

        let icon_left = metrics.margin;
        let text_left = icon_left + metrics.icon_size + metrics.icon_text_gap;
        let text_width = (metrics.text_ratio * width as f32) as i32;
        let text_right = (text_left + text_width).min(width - metrics.margin).max(text_left);

        let rows = (0..row_count)
            .map(|i| {
                let top = metrics.margin + i as i32 * stride;
                let icon_top = top + (row_height - metrics.icon_size) / 2;
                let text_top = icon_top + (metrics.icon_size - metrics.text_height) / 2;
                RowLayout {
                    bounds: Rect {
                        left: 0,
                        top,
                        right: width,
                        bottom: top + row_height,
                    },
                    icon: Rect {
                        left: icon_left,
                        top: icon_top,
                        right: icon_left + metrics.icon_size,
                        bottom: icon_top + metrics.icon_size,
                    },
                    text: Rect {
                        left: text_left,
                        top: text_top,
                        right: text_right,
                        bottom: text_top + metrics.text_height,
                    },
                }
            })
            .collect::<Vec<_>>();

        let content_height = match rows.last() {
            Some(last) => last.bounds.bottom + metrics.margin,
            None => 0,
        };

        Self {
            rows,
            width,
            content_height,
        }
    }

    /// Indices of rows intersecting the viewport `[offset, offset + viewport)`.
    pub fn visible_rows(&self, offset: i32, viewport: i32) -> Range<usize> {
        let bottom = offset + viewport.max(0);
        let start = self
            .rows
            .iter()
            .position(|row| row.bounds.bottom > offset)
            .unwrap_or(self.rows.len());
        let end = self.rows[start..]
            .iter()
            .position(|row| row.bounds.top >= bottom)
            .map_or(self.rows.len(), |n| start + n);
        start..end
    }
}

/// Decoded `WM_VSCROLL` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollCommand {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    Thumb(i32),
    Top,
    Bottom,
    End,
}

impl ScrollCommand {
    /// `code` is the low word of `WM_VSCROLL`'s wParam (`SB_*`); `thumb` the
    /// tracking position for `SB_THUMBPOSITION` / `SB_THUMBTRACK`.
    pub fn from_raw(code: u32, thumb: i32) -> Option<Self> {
        match code {
            0 => Some(Self::LineUp),
            1 => Some(Self::LineDown),
            2 => Some(Self::PageUp),
            3 => Some(Self::PageDown),
            4 | 5 => Some(Self::Thumb(thumb)),
            6 => Some(Self::Top),
            7 => Some(Self::Bottom),
            8 => Some(Self::End),
            _ => None,
        }
    }
}

const WHEEL_DELTA: i32 = 120;
const WHEEL_LINES: i32 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub offset: i32,
    pub viewport: i32,
    pub content: i32,
    /// Wheel travel below one pixel, kept for the next wheel event.
    wheel_carry: i32,
}

impl ScrollState {
    pub fn max_offset(&self) -> i32 {
        (self.content - self.viewport).max(0)
    }

    pub fn can_scroll(&self) -> bool {
        self.max_offset() > 0
    }

    pub fn set_viewport(&mut self, viewport: i32) {
        self.viewport = viewport.max(0);
        self.clamp();
    }

    pub fn set_content(&mut self, content: i32) {
        self.content = content.max(0);
        self.clamp();
    }

    /// Moves to `offset`, clamped. Returns whether the offset changed.
    pub fn scroll_to(&mut self, offset: i32) -> bool {
        let before = self.offset;
        self.offset = offset.clamp(0, self.max_offset());
        self.offset != before
    }

    pub fn scroll_by(&mut self, delta: i32) -> bool {
        self.scroll_to(self.offset.saturating_add(delta))
    }

    pub fn apply(&mut self, command: ScrollCommand, line_step: i32) -> bool {
        let page = self.viewport.max(line_step);
        match command {
            ScrollCommand::LineUp => self.scroll_by(-line_step),
            ScrollCommand::LineDown => self.scroll_by(line_step),
            ScrollCommand::PageUp => self.scroll_by(-page),
            ScrollCommand::PageDown => self.scroll_by(page),
            ScrollCommand::Thumb(pos) => self.scroll_to(pos),
            ScrollCommand::Top => self.scroll_to(0),
            ScrollCommand::Bottom => self.scroll_to(self.max_offset()),
            ScrollCommand::End => false,
        }
    }

    /// `delta` is the signed wheel delta; positive scrolls towards the top.
    /// One `WHEEL_DELTA` notch moves three lines; smaller deltas from
    /// touchpads move proportionally and accumulate.
    pub fn wheel(&mut self, delta: i32, line_step: i32) -> bool {
        let travel = delta
            .saturating_mul(WHEEL_LINES * line_step)
            .saturating_add(self.wheel_carry);
        self.wheel_carry = travel % WHEEL_DELTA;
        let moved = self.scroll_by(-(travel / WHEEL_DELTA));
        if self.offset == 0 || self.offset == self.max_offset() {
            self.wheel_carry = 0;
        }
        moved
    }

    fn clamp(&mut self) {
        self.offset = self.offset.clamp(0, self.max_offset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_stack_top_down() {
        let metrics = LayoutMetrics::default();
        let layout = ListLayout::compute(3, 400, &metrics);
        assert_eq!(layout.rows.len(), 3);
        assert_eq!(layout.rows[0].bounds.top, 6);
        assert_eq!(layout.rows[1].bounds.top, 6 + 32 + 4);
        assert_eq!(layout.content_height, layout.rows[2].bounds.bottom + 6);
    }

    #[test]
    fn label_is_sixty_percent_of_width_and_centred_on_icon() {
        let metrics = LayoutMetrics::default();
        let layout = ListLayout::compute(1, 500, &metrics);
        let row = layout.rows[0];
        assert_eq!(row.text.left, 6 + 32 + 8);
        assert_eq!(row.text.width(), 300);
        assert_eq!(row.text.top - row.icon.top, (32 - 16) / 2);
    }

    #[test]
    fn label_is_clipped_on_narrow_panes() {
        let metrics = LayoutMetrics::default();
        let layout = ListLayout::compute(1, 60, &metrics);
        assert_eq!(layout.rows[0].text.width(), 60 - 6 - 46);

        let tiny = ListLayout::compute(1, 10, &metrics);
        assert_eq!(tiny.rows[0].text.width(), 0);
    }

    #[test]
    fn empty_list_has_no_content() {
        let layout = ListLayout::compute(0, 300, &LayoutMetrics::default());
        assert!(layout.rows.is_empty());
        assert_eq!(layout.content_height, 0);
        assert_eq!(layout.visible_rows(0, 100), 0..0);
    }

    #[test]
    fn visible_rows_follow_the_offset() {
        let layout = ListLayout::compute(10, 300, &LayoutMetrics::default());
        // stride is 36 px, first row starts at 6
        assert_eq!(layout.visible_rows(0, 80), 0..3);
        assert_eq!(layout.visible_rows(42, 36), 1..2);
        assert_eq!(layout.visible_rows(42, 37), 1..3);
        assert_eq!(layout.visible_rows(10_000, 100), 10..10);
    }

    #[test]
    fn scroll_offset_stays_in_range() {
        let mut scroll = ScrollState {
            offset: 0,
            viewport: 100,
            content: 250,
            ..ScrollState::default()
        };
        assert!(scroll.apply(ScrollCommand::PageDown, 36));
        assert_eq!(scroll.offset, 100);
        assert!(scroll.apply(ScrollCommand::Bottom, 36));
        assert_eq!(scroll.offset, 150);
        assert!(!scroll.apply(ScrollCommand::LineDown, 36));
        assert!(scroll.apply(ScrollCommand::Top, 36));
        assert!(!scroll.scroll_by(-5));
    }

    #[test]
    fn growing_viewport_reclamps_offset() {
        let mut scroll = ScrollState {
            offset: 150,
            viewport: 100,
            content: 250,
            ..ScrollState::default()
        };
        scroll.set_viewport(400);
        assert_eq!(scroll.offset, 0);
        assert!(!scroll.can_scroll());
    }

    #[test]
    fn wheel_notch_scrolls_three_lines() {
        let mut scroll = ScrollState {
            offset: 200,
            viewport: 100,
            content: 1000,
            ..ScrollState::default()
        };
        scroll.wheel(-120, 36);
        assert_eq!(scroll.offset, 200 + 3 * 36);
        scroll.wheel(240, 36);
        assert_eq!(scroll.offset, 200 + 3 * 36 - 6 * 36);
    }

    #[test]
    fn touchpad_deltas_add_up_to_a_notch() {
        let mut fine = ScrollState {
            viewport: 100,
            content: 1000,
            ..ScrollState::default()
        };
        for _ in 0..4 {
            assert!(fine.wheel(-30, 36));
        }
        let mut notch = ScrollState {
            viewport: 100,
            content: 1000,
            ..ScrollState::default()
        };
        notch.wheel(-120, 36);
        assert_eq!(fine.offset, notch.offset);
        assert_eq!(fine.offset, 108);
    }

    #[test]
    fn tiny_wheel_deltas_are_not_lost() {
        let mut scroll = ScrollState {
            offset: 500,
            viewport: 100,
            content: 1000,
            ..ScrollState::default()
        };
        // 108 px per 120 units: one unit alone moves less than a pixel
        assert!(!scroll.wheel(-1, 36));
        for _ in 0..9 {
            scroll.wheel(-1, 36);
        }
        assert_eq!(scroll.offset, 509);
        for _ in 0..10 {
            scroll.wheel(1, 36);
        }
        assert_eq!(scroll.offset, 500);
    }

    #[test]
    fn shrinking_content_reclamps_offset() {
        let mut scroll = ScrollState {
            offset: 600,
            viewport: 100,
            content: 1000,
            ..ScrollState::default()
        };
        scroll.set_content(400);
        assert_eq!(scroll.offset, 300);
        scroll.set_content(50);
        assert_eq!(scroll.offset, 0);
        assert!(!scroll.can_scroll());
    }

    #[test]
    fn scroll_codes_decode() {
        assert_eq!(ScrollCommand::from_raw(1, 0), Some(ScrollCommand::LineDown));
        assert_eq!(ScrollCommand::from_raw(5, 77), Some(ScrollCommand::Thumb(77)));
        assert_eq!(ScrollCommand::from_raw(42, 0), None);
    }
}
