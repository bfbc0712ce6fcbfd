//! Seams to the display host.
//!
//! A [`Backend`] creates a [`Figure`] holding one [`Surface`] per panel and feeds
//! scroll events back to a handler until its session closes. The slice tracker only
//! ever mutates what the figure already owns.

use image::RgbaImage;

use crate::colormap::Colorbar;
use crate::enums::{Layer, ScrollDirection};
use crate::layout::Grid;
use crate::session::SessionError;

/// A drawable panel showing up to two stacked image layers and a title.
pub trait Surface {
    /// Replace the content of one image layer.
    fn set_image(&mut self, layer: Layer, image: RgbaImage);

    fn set_title(&mut self, title: &str);

    fn draw_colorbar(&mut self, colorbar: Colorbar);

    /// Ask the host to repaint this surface.
    fn request_redraw(&mut self);
}

/// A display session: a grid of surfaces plus a caption shared by all of them.
pub trait Figure {
    type Surface: Surface;

    fn grid(&self) -> Grid;

    fn surfaces_mut(&mut self) -> &mut [Self::Surface];

    fn set_caption(&mut self, caption: &str);
}

/// A raw wheel event as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    pub delta: f32,
}

impl ScrollEvent {
    pub fn up() -> Self {
        Self { delta: 1.0 }
    }

    pub fn down() -> Self {
        Self { delta: -1.0 }
    }

    pub fn direction(&self) -> Option<ScrollDirection> {
        ScrollDirection::from_delta(self.delta)
    }
}

/// Windowing host: creates figures and runs their event loop.
pub trait Backend {
    type Figure: Figure;

    /// Create a session with one surface per grid cell.
    fn create_figure(&mut self, grid: Grid) -> Result<Self::Figure, SessionError>;

    /// Show the figure and deliver scroll events to `handler`, one at a time,
    /// until the session is closed.
    fn show<H>(self, figure: Self::Figure, handler: H) -> Result<(), SessionError>
    where
        H: FnMut(&ScrollEvent, &mut Self::Figure) + 'static;
}
