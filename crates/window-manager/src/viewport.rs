//! Screen geometry available to app frames

use serde::{Deserialize, Serialize};

/// Current screen geometry and the chrome eating into it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Status bar, hidden for fullscreen apps
    pub status_bar_height: u32,
    /// Footer shown under wrapper windows
    pub footer_height: u32,
    /// On-screen keyboard, 0 when hidden
    pub keyboard_height: u32,
    /// Attention overlay minimised into the status area, 0 when absent
    pub attention_bar_height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            status_bar_height: 0,
            footer_height: 0,
            keyboard_height: 0,
            attention_bar_height: 0,
        }
    }

    /// Box of an app frame
    pub fn frame_size(&self, fullscreen: bool, wrapper: bool) -> (u32, u32) {
        let mut chrome = self.keyboard_height + self.attention_bar_height;
        if !fullscreen {
            chrome += self.status_bar_height;
        }
        if wrapper {
            chrome += self.footer_height;
        }
        (self.width, self.height.saturating_sub(chrome))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 320,
            height: 480,
            status_bar_height: 20,
            footer_height: 40,
            keyboard_height: 0,
            attention_bar_height: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size() {
        let mut viewport = Viewport::default();
        assert_eq!(viewport.frame_size(false, false), (320, 460));
        assert_eq!(viewport.frame_size(true, false), (320, 480));
        assert_eq!(viewport.frame_size(false, true), (320, 420));

        viewport.keyboard_height = 200;
        assert_eq!(viewport.frame_size(true, false), (320, 280));
    }

    #[test]
    fn test_frame_size_never_underflows() {
        let mut viewport = Viewport::new(100, 50);
        viewport.keyboard_height = 300;
        assert_eq!(viewport.frame_size(false, true), (100, 0));
    }
}
