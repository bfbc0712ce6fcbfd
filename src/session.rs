use log::info;
use ndarray::ArrayD;
use thiserror::Error;

use crate::layout::Grid;
use crate::normalizer::{
    AlphaInput, Channel, NormalizeError, Opacity, PerVolume, move_axis_to_last,
    normalize_alpha_scalar, resolve_colormaps, resolve_labels, validate_scroll_axis,
    validate_volumes,
};
use crate::surface::Backend;
use crate::tracker::SliceTracker;
use crate::volume::{Sample, VolumeSet};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("figure has {available} panels, {required} needed")]
    PanelCount { required: usize, available: usize },

    #[error("display error: {0}")]
    Display(String),
}

/// Options of [`scroll`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollOptions {
    /// One color map for all volumes or one per volume
    pub cmap: PerVolume<String>,
    /// Per-slice titles, one list for all volumes or one list per volume
    pub labels: Option<PerVolume<Vec<String>>>,
    /// Axis to scroll through; 2 for volumes laid out as rows x columns x slices
    pub scroll_dim: usize,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            cmap: PerVolume::Scalar("gray".to_string()),
            labels: None,
            scroll_dim: 2,
        }
    }
}

impl ScrollOptions {
    pub fn with_cmap(mut self, cmap: impl Into<PerVolume<String>>) -> Self {
        self.cmap = cmap.into();
        self
    }

    pub fn with_labels(mut self, labels: impl Into<PerVolume<Vec<String>>>) -> Self {
        self.labels = Some(labels.into());
        self
    }

    pub fn with_scroll_dim(mut self, scroll_dim: usize) -> Self {
        self.scroll_dim = scroll_dim;
        self
    }
}

/// Options of [`scroll_mask`].
#[derive(Debug, Clone, PartialEq)]
pub struct MaskOptions {
    /// Opacity of the mask; the volume underneath is always opaque
    pub alpha: AlphaInput,
    /// Color maps of the volume and the mask
    pub cmap: PerVolume<String>,
    pub labels: Option<PerVolume<Vec<String>>>,
    pub scroll_dim: usize,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            alpha: AlphaInput::default(),
            cmap: PerVolume::from(["gray", "jet"]),
            labels: None,
            scroll_dim: 2,
        }
    }
}

impl MaskOptions {
    pub fn with_alpha(mut self, alpha: impl Into<AlphaInput>) -> Self {
        self.alpha = alpha.into();
        self
    }

    pub fn with_cmap(mut self, cmap: impl Into<PerVolume<String>>) -> Self {
        self.cmap = cmap.into();
        self
    }

    pub fn with_labels(mut self, labels: impl Into<PerVolume<Vec<String>>>) -> Self {
        self.labels = Some(labels.into());
        self
    }

    pub fn with_scroll_dim(mut self, scroll_dim: usize) -> Self {
        self.scroll_dim = scroll_dim;
        self
    }
}

/// Up to four co-registered volumes, each drawn on its own panel.
#[derive(Debug, Clone)]
pub struct MultiVolumeSession<T> {
    pub(crate) volumes: VolumeSet<T>,
    pub(crate) channels: Vec<Channel>,
}

impl<T: Sample> MultiVolumeSession<T> {
    pub fn new(volumes: Vec<ArrayD<T>>, options: ScrollOptions) -> Result<Self, NormalizeError> {
        let volumes = validate_volumes(volumes)?;
        let volumes = validate_scroll_axis(volumes, options.scroll_dim)?;
        let volumes = VolumeSet::new(volumes);

        let count = volumes.len();
        let colormaps = resolve_colormaps(options.cmap, count)?;
        let labels = resolve_labels(options.labels, count, volumes.slice_count())?;
        let channels = colormaps
            .into_iter()
            .zip(labels)
            .map(|(colormap, labels)| Channel {
                colormap,
                opacity: Opacity::Uniform(1.0),
                labels,
            })
            .collect();

        Ok(Self { volumes, channels })
    }

    pub fn grid(&self) -> Grid {
        Grid::for_volume_count(self.volumes.len())
    }

    pub fn volumes(&self) -> &VolumeSet<T> {
        &self.volumes
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}

/// One volume with a mask stacked on top of it, both on a single panel.
#[derive(Debug, Clone)]
pub struct MaskOverlaySession<T> {
    pub(crate) volumes: VolumeSet<T>,
    pub(crate) channels: Vec<Channel>,
}

impl<T: Sample> MaskOverlaySession<T> {
    pub fn new(
        volume: ArrayD<T>,
        mask: ArrayD<T>,
        options: MaskOptions,
    ) -> Result<Self, NormalizeError> {
        let volumes = validate_volumes(vec![volume, mask])?;
        let opacity = normalize_alpha_scalar(options.alpha, volumes[0].shape())?;
        let volumes = validate_scroll_axis(volumes, options.scroll_dim)?;
        let opacity = match opacity {
            Opacity::PerVoxel(alphas) => {
                Opacity::PerVoxel(move_axis_to_last(alphas, options.scroll_dim))
            }
            uniform => uniform,
        };
        let volumes = VolumeSet::new(volumes);

        let colormaps = resolve_colormaps(options.cmap, 2)?;
        let mut labels = resolve_labels(options.labels, 2, volumes.slice_count())?.into_iter();
        let base = Channel {
            colormap: colormaps[0],
            opacity: Opacity::Uniform(1.0),
            labels: labels.next().flatten(),
        };
        let mask = Channel {
            colormap: colormaps[1],
            opacity,
            labels: labels.next().flatten(),
        };

        Ok(Self {
            volumes,
            channels: vec![base, mask],
        })
    }

    pub fn grid(&self) -> Grid {
        Grid::SINGLE
    }

    pub fn volumes(&self) -> &VolumeSet<T> {
        &self.volumes
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}

/// Show 1 to 4 co-registered volumes side by side and scroll through them in
/// lockstep until the session is closed.
///
/// All parameters are validated before the backend creates anything.
pub fn scroll<T, B>(
    mut backend: B,
    volumes: Vec<ArrayD<T>>,
    options: ScrollOptions,
) -> Result<(), SessionError>
where
    T: Sample,
    B: Backend,
{
    let session = MultiVolumeSession::new(volumes, options)?;
    let mut figure = backend.create_figure(session.grid())?;
    let tracker = SliceTracker::bind_volumes(session, &mut figure)?;
    run(backend, figure, tracker)
}

/// Show one volume with a semi-transparent mask on top and scroll through both
/// until the session is closed.
pub fn scroll_mask<T, B>(
    mut backend: B,
    volume: ArrayD<T>,
    mask: ArrayD<T>,
    options: MaskOptions,
) -> Result<(), SessionError>
where
    T: Sample,
    B: Backend,
{
    let session = MaskOverlaySession::new(volume, mask, options)?;
    let mut figure = backend.create_figure(session.grid())?;
    let tracker = SliceTracker::bind_mask(session, &mut figure)?;
    run(backend, figure, tracker)
}

fn run<T: Sample, B: Backend>(
    backend: B,
    figure: B::Figure,
    mut tracker: SliceTracker<T>,
) -> Result<(), SessionError> {
    info!(
        "showing {} volume(s) with {} slices, starting at slice {}",
        tracker.bindings().len(),
        tracker.slice_count(),
        tracker.index() + 1
    );
    backend.show(figure, move |event, figure| {
        tracker.handle_event(event, figure);
    })?;
    info!("display session closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::Colormap;
    use ndarray::{Array, Array3, IxDyn};

    fn zeros(shape: &[usize]) -> ArrayD<f32> {
        Array::zeros(IxDyn(shape))
    }

    #[test]
    fn multi_volume_defaults() {
        let session =
            MultiVolumeSession::new(vec![zeros(&[4, 4, 6]); 3], ScrollOptions::default()).unwrap();
        assert_eq!(session.grid(), Grid { rows: 1, cols: 3 });
        assert_eq!(session.volumes().slice_count(), 6);
        assert!(session.channels().iter().all(|c| c.colormap == Colormap::Gray
            && c.opacity == Opacity::Uniform(1.0)
            && c.labels.is_none()));
    }

    #[test]
    fn scroll_dim_changes_slice_count() {
        let options = ScrollOptions::default().with_scroll_dim(0);
        let session = MultiVolumeSession::new(vec![zeros(&[7, 3, 4])], options).unwrap();
        assert_eq!(session.volumes().dim(), (3, 4, 7));
    }

    #[test]
    fn cmap_count_must_match() {
        let options = ScrollOptions::default().with_cmap(["gray", "jet"]);
        let err = MultiVolumeSession::new(vec![zeros(&[2, 2, 2]); 3], options).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::CountMismatch {
                kind: "cmap",
                expected: 3,
                received: 2
            }
        ));
    }

    #[test]
    fn mask_defaults_to_gray_and_jet() {
        let session =
            MaskOverlaySession::new(zeros(&[3, 3, 3]), zeros(&[3, 3, 3]), MaskOptions::default())
                .unwrap();
        let channels = session.channels();
        assert_eq!(channels[0].colormap, Colormap::Gray);
        assert_eq!(channels[0].opacity, Opacity::Uniform(1.0));
        assert_eq!(channels[1].colormap, Colormap::Jet);
        assert_eq!(channels[1].opacity, Opacity::Uniform(0.15));
        assert_eq!(session.grid(), Grid::SINGLE);
    }

    #[test]
    fn mask_shape_must_match_volume() {
        let err =
            MaskOverlaySession::new(zeros(&[3, 3, 3]), zeros(&[3, 3, 4]), MaskOptions::default())
                .unwrap_err();
        assert!(matches!(err, NormalizeError::ShapeMismatch { .. }));
    }

    #[test]
    fn mask_rejects_more_than_two_cmaps() {
        let options = MaskOptions::default().with_cmap(["gray", "jet", "hot"]);
        let err = MaskOverlaySession::new(zeros(&[2, 2, 2]), zeros(&[2, 2, 2]), options)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::CountMismatch { received: 3, .. }));
    }

    #[test]
    fn per_voxel_alpha_follows_scroll_axis() {
        let alphas = Array3::<f32>::from_shape_fn((5, 2, 3), |(a, _, _)| a as f32 / 10.0);
        let options = MaskOptions::default()
            .with_alpha(alphas)
            .with_scroll_dim(0);
        let session =
            MaskOverlaySession::new(zeros(&[5, 2, 3]), zeros(&[5, 2, 3]), options).unwrap();
        match &session.channels()[1].opacity {
            Opacity::PerVoxel(moved) => {
                assert_eq!(moved.dim(), (2, 3, 5));
                assert_eq!(moved[[1, 2, 4]], 0.4);
            }
            other => panic!("expected per-voxel opacity, got {other:?}"),
        }
    }
}
