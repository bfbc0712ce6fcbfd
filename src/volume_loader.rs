use crate::enums::SortBy;

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use log::{debug, warn};
use ndarray::{Array2, Array3, s};
use rayon::prelude::*;
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions: {expected:?} and {found:?}")]
    InconsistentDimensions {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

type Frame = (Option<f32>, Array2<u16>);

/// Stacks single-frame DICOM images of one series into a (rows, columns, slices)
/// volume, so that scrolling along the last axis walks through the series.
pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Array3<u16>, VolumeLoaderError> {
        let paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        Self::load_from_file_paths(&paths, sort_by)
    }

    /// Load a volume from file paths, decoding files in parallel.
    ///
    /// # Errors
    ///
    /// Fails when a file cannot be read, when no file holds a decodable image or
    /// when the images differ in size. Files without a decodable image are skipped.
    pub fn load_from_file_paths<P>(
        paths: &[P],
        sort_by: SortBy,
    ) -> Result<Array3<u16>, VolumeLoaderError>
    where
        P: AsRef<Path> + Sync,
    {
        let frames: Vec<Option<Frame>> = paths
            .par_iter()
            .map(|path| -> Result<Option<Frame>, VolumeLoaderError> {
                let path = path.as_ref();
                let dicom_object = open_file(path)?;
                let frame = Self::extract_frame(&dicom_object, sort_by);
                if frame.is_none() {
                    warn!("skipping {}: no decodable image", path.display());
                }
                Ok(frame)
            })
            .collect::<Result<_, _>>()?;

        let mut frames: Vec<Frame> = frames.into_iter().flatten().collect();
        if frames.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        Self::sort_frames(&mut frames, sort_by);
        let images: Vec<Array2<u16>> = frames.into_iter().map(|(_, image)| image).collect();
        Self::validate_dimensions(&images)?;

        let volume = Self::stack_slices(&images);
        debug!("loaded volume of shape {:?}", volume.dim());
        Ok(volume)
    }

    fn extract_frame(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: SortBy,
    ) -> Option<Frame> {
        let order = Self::get_sort_order(dicom_object, sort_by)?;
        let image = Self::decode_image(dicom_object)?;
        Some((order, image))
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: SortBy,
    ) -> Option<Option<f32>> {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let pos = dicom_object
                    .element(tags::IMAGE_POSITION_PATIENT)
                    .ok()?
                    .to_multi_float32()
                    .ok()?;
                Some(pos.get(2).copied())
            }
            SortBy::TablePosition => {
                let pos = dicom_object
                    .element(tags::TABLE_POSITION)
                    .ok()?
                    .to_float32()
                    .ok();
                Some(pos)
            }
            SortBy::InstanceNumber => {
                let num = dicom_object
                    .element(tags::INSTANCE_NUMBER)
                    .ok()?
                    .to_int::<i32>()
                    .ok()
                    .map(|n| n as f32);
                Some(num)
            }
            SortBy::None => Some(None),
        }
    }

    // First frame, first sample, VOI LUT applied
    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<u16>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
        pixel_data
            .to_ndarray_with_options::<u16>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    fn sort_frames(frames: &mut [Frame], sort_by: SortBy) {
        if matches!(sort_by, SortBy::None) {
            return;
        }
        frames.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        // patient positions run head to feet
        if matches!(sort_by, SortBy::ImagePositionPatient) {
            frames.reverse();
        }
    }

    fn validate_dimensions(images: &[Array2<u16>]) -> Result<(), VolumeLoaderError> {
        let expected = images[0].dim();
        match images.iter().map(Array2::dim).find(|dim| *dim != expected) {
            Some(found) => Err(VolumeLoaderError::InconsistentDimensions { expected, found }),
            None => Ok(()),
        }
    }

    fn stack_slices(images: &[Array2<u16>]) -> Array3<u16> {
        let (height, width) = images[0].dim();
        let mut volume = Array3::<u16>::zeros((height, width, images.len()));

        for (i, image) in images.iter().enumerate() {
            volume.slice_mut(s![.., .., i]).assign(image);
        }

        volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn stacks_along_last_axis() {
        let images = vec![array![[1u16, 2], [3, 4]], array![[5u16, 6], [7, 8]]];
        let volume = VolumeLoader::stack_slices(&images);
        assert_eq!(volume.dim(), (2, 2, 2));
        assert_eq!(volume[[1, 0, 1]], 7);
        assert_eq!(volume[[0, 1, 0]], 2);
    }

    #[test]
    fn sorts_by_position_descending() {
        let mut frames = vec![
            (Some(1.0), Array2::from_elem((1, 1), 1u16)),
            (Some(3.0), Array2::from_elem((1, 1), 3u16)),
            (Some(2.0), Array2::from_elem((1, 1), 2u16)),
        ];
        VolumeLoader::sort_frames(&mut frames, SortBy::ImagePositionPatient);
        let order: Vec<u16> = frames.iter().map(|(_, image)| image[[0, 0]]).collect();
        assert_eq!(order, vec![3, 2, 1]);

        VolumeLoader::sort_frames(&mut frames, SortBy::InstanceNumber);
        let order: Vec<u16> = frames.iter().map(|(_, image)| image[[0, 0]]).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_mixed_image_sizes() {
        let images = vec![Array2::<u16>::zeros((2, 2)), Array2::<u16>::zeros((2, 3))];
        assert!(matches!(
            VolumeLoader::validate_dimensions(&images),
            Err(VolumeLoaderError::InconsistentDimensions {
                expected: (2, 2),
                found: (2, 3)
            })
        ));
    }

    #[test]
    fn empty_directory_has_no_images() {
        let dir = std::env::temp_dir().join(format!("volume-scroll-empty-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let result = VolumeLoader::load_from_directory(&dir, SortBy::default());
        fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(result, Err(VolumeLoaderError::NoValidImages)));
    }
}
