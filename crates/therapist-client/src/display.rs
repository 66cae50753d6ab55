//! Presentation toggles. These never affect chat state.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayToggles {
    camera_zoomed: bool,
    green_screen: bool,
}

impl DisplayToggles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip camera zoom and return the new setting.
    pub fn toggle_camera_zoom(&mut self) -> bool {
        self.camera_zoomed = !self.camera_zoomed;
        self.camera_zoomed
    }

    /// Flip the green-screen background and return the new setting.
    pub fn toggle_green_screen(&mut self) -> bool {
        self.green_screen = !self.green_screen;
        self.green_screen
    }

    pub fn camera_zoomed(&self) -> bool {
        self.camera_zoomed
    }

    pub fn green_screen(&self) -> bool {
        self.green_screen
    }
}
