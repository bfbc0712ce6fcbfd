//! In-memory display host.
//!
//! [`Headless`] keeps every surface as plain images, replays a fixed list of scroll
//! events and leaves the final figure in a shared slot once the list runs out.

use std::cell::RefCell;
use std::rc::Rc;

use image::RgbaImage;
use image::imageops;
use log::info;

use crate::colormap::Colorbar;
use crate::enums::Layer;
use crate::layout::Grid;
use crate::session::SessionError;
use crate::surface::{Backend, Figure, ScrollEvent, Surface};

#[derive(Debug, Clone, Default)]
pub struct RecordedSurface {
    pub layers: [Option<RgbaImage>; 2],
    pub title: Option<String>,
    pub colorbar: Option<Colorbar>,
    /// Number of redraw requests received
    pub redraws: usize,
    /// Number of title changes received
    pub title_updates: usize,
}

impl RecordedSurface {
    pub fn layer(&self, layer: Layer) -> Option<&RgbaImage> {
        self.layers[layer.index()].as_ref()
    }

    /// The base layer with the overlay blended on top, as the surface would display it.
    pub fn composite(&self) -> Option<RgbaImage> {
        let mut base = self.layer(Layer::Base)?.clone();
        if let Some(overlay) = self.layer(Layer::Overlay) {
            imageops::overlay(&mut base, overlay, 0, 0);
        }
        Some(base)
    }
}

impl Surface for RecordedSurface {
    fn set_image(&mut self, layer: Layer, image: RgbaImage) {
        self.layers[layer.index()] = Some(image);
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
        self.title_updates += 1;
    }

    fn draw_colorbar(&mut self, colorbar: Colorbar) {
        self.colorbar = Some(colorbar);
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }
}

/// Figure whose surfaces only record what they were asked to show.
#[derive(Debug, Clone)]
pub struct Recording {
    grid: Grid,
    surfaces: Vec<RecordedSurface>,
    caption: String,
}

impl Recording {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            surfaces: vec![RecordedSurface::default(); grid.panel_count()],
            caption: String::new(),
        }
    }

    pub fn surfaces(&self) -> &[RecordedSurface] {
        &self.surfaces
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }
}

impl Figure for Recording {
    type Surface = RecordedSurface;

    fn grid(&self) -> Grid {
        self.grid
    }

    fn surfaces_mut(&mut self) -> &mut [RecordedSurface] {
        &mut self.surfaces
    }

    fn set_caption(&mut self, caption: &str) {
        self.caption = caption.to_string();
    }
}

pub type RecordingSlot = Rc<RefCell<Option<Recording>>>;

/// Backend without a window. The session closes once every scripted event was delivered.
#[derive(Debug, Default)]
pub struct Headless {
    events: Vec<ScrollEvent>,
    slot: RecordingSlot,
}

impl Headless {
    pub fn new(events: impl IntoIterator<Item = ScrollEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            slot: RecordingSlot::default(),
        }
    }

    /// Where the figure ends up after [`Backend::show`] returns.
    pub fn slot(&self) -> RecordingSlot {
        Rc::clone(&self.slot)
    }
}

impl Backend for Headless {
    type Figure = Recording;

    fn create_figure(&mut self, grid: Grid) -> Result<Recording, SessionError> {
        Ok(Recording::new(grid))
    }

    fn show<H>(self, mut figure: Recording, mut handler: H) -> Result<(), SessionError>
    where
        H: FnMut(&ScrollEvent, &mut Recording) + 'static,
    {
        info!("replaying {} scroll event(s)", self.events.len());
        for event in &self.events {
            handler(event, &mut figure);
        }
        *self.slot.borrow_mut() = Some(figure);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn composite_blends_overlay() {
        let mut surface = RecordedSurface::default();
        surface.set_image(Layer::Base, RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])));
        surface.set_image(
            Layer::Overlay,
            RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 0])),
        );
        let composite = surface.composite().unwrap();
        assert_eq!(composite.get_pixel(1, 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn headless_replays_events_into_slot() {
        let backend = Headless::new([ScrollEvent::up(), ScrollEvent::down()]);
        let slot = backend.slot();
        let deliveries = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&deliveries);
        backend
            .show(Recording::new(Grid::SINGLE), move |_, figure| {
                *counter.borrow_mut() += 1;
                figure.set_caption("touched");
            })
            .unwrap();

        assert_eq!(*deliveries.borrow(), 2);
        assert_eq!(slot.borrow().as_ref().unwrap().caption(), "touched");
    }
}
