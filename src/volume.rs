use crate::colormap::{Colormap, Window};

use image::RgbaImage;
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::s;
use rayon::prelude::*;

/// Numeric voxel types the renderer can map onto a color map.
pub trait Sample: Copy + Send + Sync + 'static {
    fn to_f32(self) -> f32;
}

macro_rules! impl_sample {
    ($($ty:ty),*) => {
        $(
            impl Sample for $ty {
                #[inline]
                fn to_f32(self) -> f32 {
                    self as f32
                }
            }
        )*
    };
}

impl_sample!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Sample for bool {
    #[inline]
    fn to_f32(self) -> f32 {
        if self { 1.0 } else { 0.0 }
    }
}

/// Opacity of one slice, either a single value or one per pixel.
#[derive(Debug, Clone)]
pub enum SliceAlpha<'a> {
    Uniform(f32),
    PerVoxel(ArrayView2<'a, f32>),
}

/// Co-registered volumes with the scroll axis already moved to the last position,
/// so every volume is laid out as (rows, columns, slices).
#[derive(Debug, Clone)]
pub struct VolumeSet<T> {
    volumes: Vec<Array3<T>>,
}

impl<T: Sample> VolumeSet<T> {
    /// Wrap volumes that already passed validation: 1 to 4 entries, identical and non-empty shapes.
    pub(crate) fn new(volumes: Vec<Array3<T>>) -> Self {
        Self { volumes }
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Get the dimensions shared by every volume (rows, columns, slices)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.volumes.first().map(Array3::dim).unwrap_or((0, 0, 0))
    }

    pub fn slice_count(&self) -> usize {
        self.dim().2
    }

    pub fn volumes(&self) -> &[Array3<T>] {
        &self.volumes
    }

    /// The 2D slice `volume[:, :, index]`, or `None` when either position is out of range.
    pub fn get_slice(&self, volume: usize, index: usize) -> Option<ArrayView2<'_, T>> {
        let data = self.volumes.get(volume)?;
        if index >= data.dim().2 {
            return None;
        }
        Some(data.slice(s![.., .., index]))
    }

    /// Intensity window of every volume, in volume order
    pub fn windows(&self) -> Vec<Window> {
        self.volumes.iter().map(intensity_window).collect()
    }
}

/// Global [min, max] of a volume. NaN samples do not take part.
pub fn intensity_window<T: Sample>(data: &Array3<T>) -> Window {
    let (min, max) = data
        .par_iter()
        .map(|&v| v.to_f32())
        .fold(
            || (f32::INFINITY, f32::NEG_INFINITY),
            |(lo, hi), v| (lo.min(v), hi.max(v)),
        )
        .reduce(
            || (f32::INFINITY, f32::NEG_INFINITY),
            |a, b| (a.0.min(b.0), a.1.max(b.1)),
        );
    Window::from_extrema(min, max)
}

// Colorize a slice row by row; rows keep their order in the output buffer.
pub(crate) fn slice_to_image<T: Sample>(
    slice: &ArrayView2<'_, T>,
    colormap: Colormap,
    window: &Window,
    alpha: &SliceAlpha<'_>,
) -> Option<RgbaImage> {
    let (height, width) = slice.dim();
    let pixel_data: Vec<u8> = (0..height)
        .into_par_iter()
        .flat_map_iter(|y| {
            let row = slice.row(y);
            let pixels: Vec<u8> = match alpha {
                SliceAlpha::Uniform(a) => row
                    .iter()
                    .flat_map(|&v| colormap.rgba(window.normalize(v.to_f32()), *a))
                    .collect(),
                SliceAlpha::PerVoxel(alphas) => row
                    .iter()
                    .zip(alphas.row(y).iter())
                    .flat_map(|(&v, &a)| colormap.rgba(window.normalize(v.to_f32()), a))
                    .collect(),
            };
            pixels
        })
        .collect();
    RgbaImage::from_raw(width as u32, height as u32, pixel_data)
}
