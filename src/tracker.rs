use image::RgbaImage;
use log::{debug, trace, warn};
use ndarray::s;

use crate::colormap::{Colorbar, Window};
use crate::enums::{Layer, ScrollDirection};
use crate::normalizer::{Channel, Opacity};
use crate::session::{MaskOverlaySession, MultiVolumeSession, SessionError};
use crate::surface::{Figure, ScrollEvent, Surface};
use crate::volume::{Sample, SliceAlpha, VolumeSet, slice_to_image};

/// Caption shown above all panels. `displayed` is the 1-based slice number.
pub fn caption(displayed: usize) -> String {
    format!("Use scroll wheel to scroll through slices\nSlice {displayed}")
}

/// Current slice of a co-registered volume set, always in `[0, count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceIndex {
    current: usize,
    count: usize,
}

impl SliceIndex {
    /// Start at the center slice.
    pub fn new(count: usize) -> Self {
        Self {
            current: count / 2,
            count,
        }
    }

    pub fn get(&self) -> usize {
        self.current
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Slice number shown to users, counting from 1
    pub fn displayed(&self) -> usize {
        self.current + 1
    }

    /// Move one slice, wrapping around at both ends.
    pub fn step(&mut self, direction: ScrollDirection) {
        if self.count == 0 {
            return;
        }
        self.current = match direction {
            ScrollDirection::Forward => (self.current + 1) % self.count,
            ScrollDirection::Backward => (self.current + self.count - 1) % self.count,
        };
    }
}

/// Where a volume is drawn: the panel of the figure and the layer within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub panel: usize,
    pub layer: Layer,
}

/// Keeps every bound surface showing the same slice of its volume.
///
/// The binding table is indexed by volume position and fixed at construction.
/// Surfaces belong to the figure; the tracker only replaces their content.
#[derive(Debug)]
pub struct SliceTracker<T> {
    volumes: VolumeSet<T>,
    channels: Vec<Channel>,
    windows: Vec<Window>,
    bindings: Box<[Binding]>,
    index: SliceIndex,
}

impl<T: Sample> SliceTracker<T> {
    /// One volume per panel, in panel order. Renders the center slice.
    pub fn bind_volumes<F: Figure>(
        session: MultiVolumeSession<T>,
        figure: &mut F,
    ) -> Result<Self, SessionError> {
        let MultiVolumeSession { volumes, channels } = session;
        let bindings = (0..volumes.len())
            .map(|panel| Binding {
                panel,
                layer: Layer::Base,
            })
            .collect();
        let tracker = Self::with_bindings(volumes, channels, bindings, figure)?;
        tracker.render(figure);
        Ok(tracker)
    }

    /// Base volume and mask stacked on the first panel. Renders the center slice
    /// and, for uniform mask opacity, the mask's color bar.
    pub fn bind_mask<F: Figure>(
        session: MaskOverlaySession<T>,
        figure: &mut F,
    ) -> Result<Self, SessionError> {
        let MaskOverlaySession { volumes, channels } = session;
        let bindings = Box::new([
            Binding {
                panel: 0,
                layer: Layer::Base,
            },
            Binding {
                panel: 0,
                layer: Layer::Overlay,
            },
        ]);
        let tracker = Self::with_bindings(volumes, channels, bindings, figure)?;

        if let (Some(mask), Some(window)) = (tracker.channels.get(1), tracker.windows.get(1)) {
            if let Opacity::Uniform(alpha) = mask.opacity {
                if let Some(surface) = figure.surfaces_mut().first_mut() {
                    surface.draw_colorbar(Colorbar {
                        colormap: mask.colormap,
                        window: *window,
                        alpha,
                    });
                }
            }
        }
        tracker.render(figure);
        Ok(tracker)
    }

    fn with_bindings<F: Figure>(
        volumes: VolumeSet<T>,
        channels: Vec<Channel>,
        bindings: Box<[Binding]>,
        figure: &mut F,
    ) -> Result<Self, SessionError> {
        let required = bindings.iter().map(|b| b.panel + 1).max().unwrap_or(0);
        let available = figure.surfaces_mut().len();
        if available < required {
            return Err(SessionError::PanelCount {
                required,
                available,
            });
        }

        let windows = volumes.windows();
        let index = SliceIndex::new(volumes.slice_count());
        Ok(Self {
            volumes,
            channels,
            windows,
            bindings,
            index,
        })
    }

    pub fn index(&self) -> usize {
        self.index.get()
    }

    pub fn slice_count(&self) -> usize {
        self.index.count()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn on_scroll<F: Figure>(&mut self, direction: ScrollDirection, figure: &mut F) {
        self.index.step(direction);
        debug!(
            "scrolled {:?} to slice {}/{}",
            direction,
            self.index.displayed(),
            self.index.count()
        );
        self.render(figure);
    }

    /// Handle a raw host event. Events without a direction change nothing.
    pub fn handle_event<F: Figure>(&mut self, event: &ScrollEvent, figure: &mut F) -> bool {
        match event.direction() {
            Some(direction) => {
                self.on_scroll(direction, figure);
                true
            }
            None => {
                trace!("ignoring scroll event without direction: {:?}", event);
                false
            }
        }
    }

    /// Push the current slice of every volume to its surface, retitle and redraw
    /// each surface once, then update the caption.
    pub fn render<F: Figure>(&self, figure: &mut F) {
        let index = self.index.get();
        let surfaces = figure.surfaces_mut();

        for (volume, binding) in self.bindings.iter().enumerate() {
            let Some(surface) = surfaces.get_mut(binding.panel) else {
                warn!("panel {} is missing, volume {} not drawn", binding.panel, volume);
                continue;
            };
            match self.slice_image(volume, index) {
                Some(image) => surface.set_image(binding.layer, image),
                None => warn!("slice {} of volume {} could not be rendered", index, volume),
            }
        }

        for (volume, binding) in self.bindings.iter().enumerate() {
            if binding.layer != Layer::Base {
                continue;
            }
            let Some(surface) = surfaces.get_mut(binding.panel) else {
                continue;
            };
            let label = self.channels.get(volume).and_then(|c| c.labels.as_ref());
            if let Some(title) = label.and_then(|labels| labels.get(index)) {
                surface.set_title(title);
            }
            surface.request_redraw();
        }

        figure.set_caption(&caption(self.index.displayed()));
    }

    fn slice_image(&self, volume: usize, index: usize) -> Option<RgbaImage> {
        let slice = self.volumes.get_slice(volume, index)?;
        let channel = self.channels.get(volume)?;
        let window = self.windows.get(volume)?;
        let alpha = match &channel.opacity {
            Opacity::Uniform(alpha) => SliceAlpha::Uniform(*alpha),
            Opacity::PerVoxel(alphas) => SliceAlpha::PerVoxel(alphas.slice(s![.., .., index])),
        };
        slice_to_image(&slice, channel.colormap, window, &alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Grid;
    use crate::normalizer::{AlphaInput, PerVolume};
    use crate::recording::Recording;
    use crate::session::{MaskOptions, ScrollOptions};
    use ndarray::{Array3, ArrayD};

    fn ramp(shape: (usize, usize, usize)) -> ArrayD<u16> {
        Array3::from_shape_fn(shape, |(_, _, k)| k as u16).into_dyn()
    }

    #[test]
    fn starts_at_center_slice() {
        assert_eq!(SliceIndex::new(10).get(), 5);
        assert_eq!(SliceIndex::new(1).get(), 0);
        assert_eq!(SliceIndex::new(7).get(), 3);
    }

    #[test]
    fn wraps_in_both_directions() {
        let mut index = SliceIndex::new(3);
        index.step(ScrollDirection::Forward);
        index.step(ScrollDirection::Forward);
        assert_eq!(index.get(), 0);
        index.step(ScrollDirection::Backward);
        assert_eq!(index.get(), 2);
    }

    #[test]
    fn full_cycle_returns_to_start() {
        for count in 1..8 {
            for start in 0..count {
                let mut index = SliceIndex {
                    current: start,
                    count,
                };
                for _ in 0..count {
                    index.step(ScrollDirection::Forward);
                }
                assert_eq!(index.get(), start);

                index.step(ScrollDirection::Forward);
                index.step(ScrollDirection::Backward);
                assert_eq!(index.get(), start);
            }
        }
    }

    #[test]
    fn binds_one_panel_per_volume() {
        let session = MultiVolumeSession::new(
            vec![ramp((4, 4, 6)), ramp((4, 4, 6)), ramp((4, 4, 6))],
            ScrollOptions::default(),
        )
        .unwrap();
        let mut figure = Recording::new(session.grid());
        let tracker = SliceTracker::bind_volumes(session, &mut figure).unwrap();

        let panels: Vec<_> = tracker.bindings().iter().map(|b| b.panel).collect();
        assert_eq!(panels, vec![0, 1, 2]);
        assert_eq!(tracker.index(), 3);
        for surface in figure.surfaces() {
            assert_eq!(surface.redraws, 1);
            assert!(surface.layer(Layer::Base).is_some());
            assert!(surface.layer(Layer::Overlay).is_none());
        }
        assert_eq!(
            figure.caption(),
            "Use scroll wheel to scroll through slices\nSlice 4"
        );
    }

    #[test]
    fn scroll_updates_titles_and_caption() {
        let labels: Vec<String> = (0..6).map(|i| format!("t = {i}")).collect();
        let options = ScrollOptions::default().with_labels(labels);
        let session = MultiVolumeSession::new(vec![ramp((2, 2, 6))], options).unwrap();
        let mut figure = Recording::new(session.grid());
        let mut tracker = SliceTracker::bind_volumes(session, &mut figure).unwrap();
        assert_eq!(figure.surfaces()[0].title.as_deref(), Some("t = 3"));

        tracker.on_scroll(ScrollDirection::Backward, &mut figure);
        assert_eq!(tracker.index(), 2);
        assert_eq!(figure.surfaces()[0].title.as_deref(), Some("t = 2"));
        assert!(figure.caption().ends_with("Slice 3"));
    }

    #[test]
    fn event_without_direction_is_ignored() {
        let session =
            MultiVolumeSession::new(vec![ramp((2, 2, 4))], ScrollOptions::default()).unwrap();
        let mut figure = Recording::new(session.grid());
        let mut tracker = SliceTracker::bind_volumes(session, &mut figure).unwrap();

        assert!(!tracker.handle_event(&ScrollEvent { delta: 0.0 }, &mut figure));
        assert_eq!(tracker.index(), 2);
        assert_eq!(figure.surfaces()[0].redraws, 1);

        assert!(tracker.handle_event(&ScrollEvent::up(), &mut figure));
        assert_eq!(tracker.index(), 3);
        assert_eq!(figure.surfaces()[0].redraws, 2);
    }

    #[test]
    fn mask_shares_one_surface() {
        let options = MaskOptions::default()
            .with_alpha(AlphaInput::Int(50))
            .with_labels(PerVolume::Each(vec![
                vec!["a".into(), "b".into()],
                vec!["x".into(), "y".into()],
            ]));
        let session =
            MaskOverlaySession::new(ramp((3, 3, 2)), ramp((3, 3, 2)), options).unwrap();
        let mut figure = Recording::new(Grid::SINGLE);
        let mut tracker = SliceTracker::bind_mask(session, &mut figure).unwrap();

        let surface = &figure.surfaces()[0];
        assert_eq!(surface.redraws, 1);
        assert_eq!(surface.title_updates, 1);
        assert_eq!(surface.title.as_deref(), Some("b"));
        assert!(surface.layer(Layer::Overlay).is_some());
        let colorbar = surface.colorbar.unwrap();
        assert_eq!(colorbar.alpha, 0.5);

        tracker.on_scroll(ScrollDirection::Forward, &mut figure);
        let surface = &figure.surfaces()[0];
        assert_eq!(tracker.index(), 0);
        assert_eq!(surface.redraws, 2);
        assert_eq!(surface.title.as_deref(), Some("a"));
        // overlay pixels carry the mask opacity
        let overlay = surface.layer(Layer::Overlay).unwrap();
        assert_eq!(overlay.get_pixel(0, 0).0[3], 128);
    }

    #[test]
    fn per_voxel_mask_opacity_draws_no_colorbar() {
        let alphas = Array3::<f32>::from_elem((3, 3, 2), 1.0);
        let options = MaskOptions::default().with_alpha(AlphaInput::from(alphas));
        let session =
            MaskOverlaySession::new(ramp((3, 3, 2)), ramp((3, 3, 2)), options).unwrap();
        let mut figure = Recording::new(Grid::SINGLE);
        SliceTracker::bind_mask(session, &mut figure).unwrap();

        let surface = &figure.surfaces()[0];
        assert!(surface.colorbar.is_none());
        assert_eq!(surface.layer(Layer::Overlay).unwrap().get_pixel(2, 2).0[3], 255);
    }

    #[test]
    fn refuses_figure_with_too_few_panels() {
        let session = MultiVolumeSession::new(
            vec![ramp((2, 2, 2)), ramp((2, 2, 2))],
            ScrollOptions::default(),
        )
        .unwrap();
        let mut figure = Recording::new(Grid::SINGLE);
        assert!(matches!(
            SliceTracker::bind_volumes(session, &mut figure),
            Err(SessionError::PanelCount {
                required: 2,
                available: 1
            })
        ));
    }
}
