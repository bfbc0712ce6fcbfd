#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Wheel up, towards the next slice
    Forward,
    /// Wheel down, towards the previous slice
    Backward,
}

impl ScrollDirection {
    /// Classify a raw wheel delta. Zero and NaN carry no direction.
    pub fn from_delta(delta: f32) -> Option<Self> {
        if delta > 0.0 {
            Some(Self::Forward)
        } else if delta < 0.0 {
            Some(Self::Backward)
        } else {
            None
        }
    }
}

/// Image layer on a surface. Mask overlay mode stacks the mask above the base volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layer {
    #[default]
    Base,
    Overlay,
}

impl Layer {
    pub fn index(self) -> usize {
        match self {
            Layer::Base => 0,
            Layer::Overlay => 1,
        }
    }
}

/// Slice ordering used when stacking a DICOM series into a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "viewer", derive(clap::ValueEnum))]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}
