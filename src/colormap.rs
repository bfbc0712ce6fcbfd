use std::{fmt, str::FromStr};

use image::{Rgba, RgbaImage};

/// Color maps understood by the slice renderer, addressed by the usual palette tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    #[default]
    Gray,
    GrayReversed,
    Jet,
    Hot,
    Cool,
    Bone,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color map `{0}`")]
pub struct UnknownColormap(pub String);

impl FromStr for Colormap {
    type Err = UnknownColormap;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim().to_ascii_lowercase().as_str() {
            "gray" | "grey" => Ok(Self::Gray),
            "gray_r" | "grey_r" | "binary" => Ok(Self::GrayReversed),
            "jet" => Ok(Self::Jet),
            "hot" => Ok(Self::Hot),
            "cool" => Ok(Self::Cool),
            "bone" => Ok(Self::Bone),
            _ => Err(UnknownColormap(token.to_string())),
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Gray => "gray",
            Self::GrayReversed => "gray_r",
            Self::Jet => "jet",
            Self::Hot => "hot",
            Self::Cool => "cool",
            Self::Bone => "bone",
        };
        f.write_str(token)
    }
}

#[inline]
fn unit(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (unit(v) * 255.0).round() as u8
}

impl Colormap {
    /// Map a normalized value in [0, 1] to an RGB triple.
    pub fn rgb(self, t: f32) -> [u8; 3] {
        let t = unit(t);
        let (r, g, b) = match self {
            Self::Gray => (t, t, t),
            Self::GrayReversed => (1.0 - t, 1.0 - t, 1.0 - t),
            Self::Jet => (
                1.5 - (4.0 * t - 3.0).abs(),
                1.5 - (4.0 * t - 2.0).abs(),
                1.5 - (4.0 * t - 1.0).abs(),
            ),
            Self::Hot => (3.0 * t, 3.0 * t - 1.0, 3.0 * t - 2.0),
            Self::Cool => (t, 1.0 - t, 1.0),
            Self::Bone => {
                // 7/8 gray blended with hot in reversed channel order
                let (hr, hg, hb) = (unit(3.0 * t), unit(3.0 * t - 1.0), unit(3.0 * t - 2.0));
                ((7.0 * t + hb) / 8.0, (7.0 * t + hg) / 8.0, (7.0 * t + hr) / 8.0)
            }
        };
        [to_u8(r), to_u8(g), to_u8(b)]
    }

    pub fn rgba(self, t: f32, alpha: f32) -> [u8; 4] {
        let [r, g, b] = self.rgb(t);
        [r, g, b, to_u8(alpha)]
    }
}

/// Intensity range mapped onto a color map, low end to 0 and high end to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub min: f32,
    pub max: f32,
}

impl Default for Window {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl Window {
    /// Build a window from a (min, max) reduction. An empty or all-NaN reduction
    /// leaves infinities behind and falls back to the unit window.
    pub fn from_extrema(min: f32, max: f32) -> Self {
        if min.is_finite() && max.is_finite() {
            Self { min, max }
        } else {
            Self::default()
        }
    }

    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span > 0.0 {
            unit((value - self.min) / span)
        } else {
            0.0
        }
    }
}

/// Legend for one channel: the color map, the intensities it spans and the opacity it is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colorbar {
    pub colormap: Colormap,
    pub window: Window,
    pub alpha: f32,
}

impl Colorbar {
    /// Horizontal gradient strip, low intensities on the left.
    pub fn to_image(&self, width: u32, height: u32) -> RgbaImage {
        let width = width.max(2);
        RgbaImage::from_fn(width, height.max(1), |x, _| {
            let t = x as f32 / (width - 1) as f32;
            Rgba(self.colormap.rgba(t, self.alpha))
        })
    }
}
