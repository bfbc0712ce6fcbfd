//! Validation and normalization of display parameters.
//!
//! Everything here runs before a display session exists: a caller either gets a
//! canonical, per-volume configuration back or an error describing the bad input.

use ndarray::{Array3, ArrayD, Ix3};
use thiserror::Error;

use crate::colormap::Colormap;
use crate::volume::Sample;

/// Upper bound on volumes shown side by side.
pub const MAX_VOLUMES: usize = 4;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("expected a 3-dimensional array, found {found}")]
    TypeMismatch { found: String },

    #[error("shapes are incompatible: {first:?} and {second:?}")]
    ShapeMismatch {
        first: Vec<usize>,
        second: Vec<usize>,
    },

    #[error("{kind} must have a single value or {expected}. You passed {received}")]
    CountMismatch {
        kind: &'static str,
        expected: usize,
        received: usize,
    },

    #[error("invalid scroll axis {axis} for an array of rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    #[error("invalid alpha {received}: expected an integer in [0, 100] or a float in [0, 1]")]
    InvalidAlpha { received: String },

    #[error("up to 4 volumes can be displayed simultaneously. You passed {0}")]
    TooManyVolumes(usize),

    #[error("at least one volume is required")]
    NoVolumes,

    #[error("volume of shape {0:?} has an empty axis")]
    EmptyVolume(Vec<usize>),

    #[error(transparent)]
    UnknownColormap(#[from] crate::colormap::UnknownColormap),
}

/// A display parameter given once for all volumes or once per volume.
#[derive(Debug, Clone, PartialEq)]
pub enum PerVolume<T> {
    Scalar(T),
    Each(Vec<T>),
}

impl<T> From<T> for PerVolume<T> {
    fn from(value: T) -> Self {
        PerVolume::Scalar(value)
    }
}

impl<T> From<Vec<T>> for PerVolume<T> {
    fn from(values: Vec<T>) -> Self {
        PerVolume::Each(values)
    }
}

impl From<&str> for PerVolume<String> {
    fn from(value: &str) -> Self {
        PerVolume::Scalar(value.to_string())
    }
}

impl<const N: usize> From<[&str; N]> for PerVolume<String> {
    fn from(values: [&str; N]) -> Self {
        PerVolume::Each(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Opacity as supplied by the caller of the mask overlay entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum AlphaInput {
    /// Percentage in [0, 100]
    Int(i64),
    /// Fraction in [0, 1]
    Float(f64),
    /// One value per voxel, same shape as the volume
    PerVoxel(ArrayD<f32>),
}

impl Default for AlphaInput {
    fn default() -> Self {
        AlphaInput::Float(0.15)
    }
}

impl From<i64> for AlphaInput {
    fn from(value: i64) -> Self {
        AlphaInput::Int(value)
    }
}

impl From<i32> for AlphaInput {
    fn from(value: i32) -> Self {
        AlphaInput::Int(value.into())
    }
}

impl From<f64> for AlphaInput {
    fn from(value: f64) -> Self {
        AlphaInput::Float(value)
    }
}

impl From<f32> for AlphaInput {
    fn from(value: f32) -> Self {
        AlphaInput::Float(value.into())
    }
}

impl From<ArrayD<f32>> for AlphaInput {
    fn from(value: ArrayD<f32>) -> Self {
        AlphaInput::PerVoxel(value)
    }
}

impl From<Array3<f32>> for AlphaInput {
    fn from(value: Array3<f32>) -> Self {
        AlphaInput::PerVoxel(value.into_dyn())
    }
}

/// Resolved opacity of one channel. Per-voxel opacity is kept as an array
/// through to render time.
#[derive(Debug, Clone, PartialEq)]
pub enum Opacity {
    Uniform(f32),
    PerVoxel(Array3<f32>),
}

impl Default for Opacity {
    fn default() -> Self {
        Opacity::Uniform(1.0)
    }
}

/// Display parameters resolved for one volume.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Channel {
    pub colormap: Colormap,
    pub opacity: Opacity,
    /// One title per slice, if the volume is labelled
    pub labels: Option<Vec<String>>,
}

/// Check that every candidate is a 3D array, that there are 1 to 4 of them and
/// that their shapes match exactly.
pub fn validate_volumes<T: Sample>(
    volumes: Vec<ArrayD<T>>,
) -> Result<Vec<Array3<T>>, NormalizeError> {
    if volumes.is_empty() {
        return Err(NormalizeError::NoVolumes);
    }
    if volumes.len() > MAX_VOLUMES {
        return Err(NormalizeError::TooManyVolumes(volumes.len()));
    }

    let volumes = volumes
        .into_iter()
        .map(|volume| {
            let ndim = volume.ndim();
            volume
                .into_dimensionality::<Ix3>()
                .map_err(|_| NormalizeError::TypeMismatch {
                    found: format!("{ndim}-dimensional array"),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let first = volumes[0].shape().to_vec();
    if let Some(other) = volumes.iter().find(|v| v.shape() != first.as_slice()) {
        return Err(NormalizeError::ShapeMismatch {
            first,
            second: other.shape().to_vec(),
        });
    }
    if first.contains(&0) {
        return Err(NormalizeError::EmptyVolume(first));
    }
    Ok(volumes)
}

/// Reinterpret `array` so that `axis` becomes the last axis, keeping the
/// relative order of the other two. Only strides change.
pub fn move_axis_to_last<A>(array: Array3<A>, axis: usize) -> Array3<A> {
    match axis {
        0 => array.permuted_axes([1, 2, 0]),
        1 => array.permuted_axes([0, 2, 1]),
        _ => array,
    }
}

/// Move the scroll axis of every volume to the last position.
pub fn validate_scroll_axis<A>(
    volumes: Vec<Array3<A>>,
    axis: usize,
) -> Result<Vec<Array3<A>>, NormalizeError> {
    let rank = 3;
    if axis >= rank {
        return Err(NormalizeError::InvalidAxis { axis, rank });
    }
    Ok(volumes
        .into_iter()
        .map(|volume| move_axis_to_last(volume, axis))
        .collect())
}

/// Expand a parameter to exactly `count` entries.
///
/// A scalar or a one-element list is repeated, a list of `count` entries passes
/// through untouched, anything else is a [`NormalizeError::CountMismatch`] naming `kind`.
pub fn broadcast_per_volume<T: Clone>(
    value: PerVolume<T>,
    count: usize,
    kind: &'static str,
) -> Result<Vec<T>, NormalizeError> {
    match value {
        PerVolume::Scalar(v) => Ok(vec![v; count]),
        PerVolume::Each(values) if values.len() == count => Ok(values),
        PerVolume::Each(mut values) if values.len() == 1 => {
            let v = values.remove(0);
            Ok(vec![v; count])
        }
        PerVolume::Each(values) => Err(NormalizeError::CountMismatch {
            kind,
            expected: count,
            received: values.len(),
        }),
    }
}

/// Resolve the opacity of a mask overlay against the shape of its volume.
pub fn normalize_alpha_scalar(
    value: AlphaInput,
    volume_shape: &[usize],
) -> Result<Opacity, NormalizeError> {
    match value {
        AlphaInput::Int(percent) if (0..=100).contains(&percent) => {
            Ok(Opacity::Uniform(percent as f32 / 100.0))
        }
        AlphaInput::Int(percent) => Err(NormalizeError::InvalidAlpha {
            received: percent.to_string(),
        }),
        AlphaInput::Float(fraction) if (0.0..=1.0).contains(&fraction) => {
            Ok(Opacity::Uniform(fraction as f32))
        }
        AlphaInput::Float(fraction) => Err(NormalizeError::InvalidAlpha {
            received: fraction.to_string(),
        }),
        AlphaInput::PerVoxel(alphas) => {
            if alphas.shape() != volume_shape {
                return Err(NormalizeError::ShapeMismatch {
                    first: alphas.shape().to_vec(),
                    second: volume_shape.to_vec(),
                });
            }
            let ndim = alphas.ndim();
            alphas
                .into_dimensionality::<Ix3>()
                .map(Opacity::PerVoxel)
                .map_err(|_| NormalizeError::TypeMismatch {
                    found: format!("{ndim}-dimensional alpha array"),
                })
        }
    }
}

/// Resolve color map tokens for `count` volumes.
pub fn resolve_colormaps(
    cmap: PerVolume<String>,
    count: usize,
) -> Result<Vec<Colormap>, NormalizeError> {
    broadcast_per_volume(cmap, count, "cmap")?
        .iter()
        .map(|token| token.parse::<Colormap>().map_err(NormalizeError::from))
        .collect()
}

/// Resolve per-volume slice labels. An empty list leaves that volume untitled,
/// any other list must name every slice.
pub fn resolve_labels(
    labels: Option<PerVolume<Vec<String>>>,
    count: usize,
    slice_count: usize,
) -> Result<Vec<Option<Vec<String>>>, NormalizeError> {
    let Some(labels) = labels else {
        return Ok(vec![None; count]);
    };
    broadcast_per_volume(labels, count, "labels")?
        .into_iter()
        .map(|list| match list.len() {
            0 => Ok(None),
            n if n == slice_count => Ok(Some(list)),
            n => Err(NormalizeError::CountMismatch {
                kind: "slice labels",
                expected: slice_count,
                received: n,
            }),
        })
        .collect()
}
