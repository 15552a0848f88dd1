//! ArUco marker tracking on video files.

use super::Tracker;
use crate::{
    table::{Frame, FrameTable, MarkerId, Observation, Point2},
    Error, Result,
};
use log::{debug, info, warn};
use opencv::{
    core::{self, Mat, Point2f, Vector, ROTATE_90_CLOCKWISE},
    imgcodecs,
    objdetect::{self, ArucoDetector, DetectorParameters, PredefinedDictionaryType, RefineParameters},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_FPS},
};
use std::path::{Path, PathBuf};

/// Video tracker backed by `OpenCV`'s ArUco detector
pub struct ArucoTracker {
    fallback_fps: f64,
    rotate_clockwise: bool,
}

impl ArucoTracker {
    /// `fallback_fps` is used when the container does not report a rate
    #[must_use]
    pub fn new(fallback_fps: f64, rotate_clockwise: bool) -> Self {
        Self {
            fallback_fps,
            rotate_clockwise,
        }
    }

    fn detector(dictionary: &str) -> Result<ArucoDetector> {
        let dictionary = objdetect::get_predefined_dictionary(dictionary_type(dictionary)?)?;
        let params = DetectorParameters::default()?;
        let refine = RefineParameters::new(10.0, 3.0, true)?;
        Ok(ArucoDetector::new(&dictionary, &params, refine)?)
    }

    /// Centre of every detected marker
    fn detect(detector: &ArucoDetector, image: &Mat) -> Result<Vec<Observation>> {
        let mut corners: Vector<Vector<Point2f>> = Vector::new();
        let mut ids: Vector<i32> = Vector::new();
        let mut rejected: Vector<Vector<Point2f>> = Vector::new();
        detector.detect_markers(image, &mut corners, &mut ids, &mut rejected)?;

        let mut observations = Vec::with_capacity(ids.len());
        for (id, quad) in ids.iter().zip(corners.iter()) {
            let Ok(id) = u32::try_from(id) else {
                warn!("Ignoring negative marker id {}", id);
                continue;
            };
            let n = quad.len().max(1) as f64;
            let (sx, sy) = quad
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + f64::from(p.x), sy + f64::from(p.y)));
            observations.push(Observation {
                marker: MarkerId(id),
                position: Point2::new(sx / n, sy / n),
            });
        }
        Ok(observations)
    }
}

impl Tracker for ArucoTracker {
    fn track(&mut self, source: &Path, dictionary: &str, frame_step: usize) -> Result<FrameTable> {
        let path = source
            .to_str()
            .ok_or_else(|| Error::InvalidInput(format!("Non UTF-8 video path: {}", source.display())))?;
        info!("Opening video file: {}", path);
        let mut capture = VideoCapture::from_file(path, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::Tracker(format!("Could not open video {path}")));
        }

        let reported = capture.get(CAP_PROP_FPS)?;
        let fps = if reported > 0.0 { reported } else { self.fallback_fps };
        debug!("Video frame rate: {} (reported {})", fps, reported);

        let detector = Self::detector(dictionary)?;
        let mut frames = Vec::new();
        let mut frame = Mat::default();
        let mut rotated = Mat::default();
        let mut index = 0usize;

        while capture.read(&mut frame)? && !frame.empty() {
            if frame_step > 0 && index % (frame_step + 1) != 0 {
                index += 1;
                continue;
            }
            let image = if self.rotate_clockwise {
                core::rotate(&frame, &mut rotated, ROTATE_90_CLOCKWISE)?;
                &rotated
            } else {
                &frame
            };
            frames.push(Frame {
                index,
                time: index as f64 / fps,
                observations: Self::detect(&detector, image)?,
            });
            index += 1;
        }

        info!("Tracked {} of {} frames", frames.len(), index);
        FrameTable::new(frames)
    }

    fn name(&self) -> &str {
        "ArucoTracker"
    }
}

/// Write printable markers `0..count` as `marker_{i}.png` into `dir`
///
/// Each image is `size_px` pixels square with a one bit border. The
/// directory is created if needed.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an unknown dictionary, a count the
/// dictionary cannot hold or a non-positive size, and I/O or `OpenCV` errors
/// from writing the images.
pub fn generate_markers(dictionary: &str, count: u32, size_px: i32, dir: &Path) -> Result<Vec<PathBuf>> {
    if size_px <= 0 {
        return Err(Error::InvalidInput(format!("Marker size must be positive, got {size_px}")));
    }
    let dict = objdetect::get_predefined_dictionary(dictionary_type(dictionary)?)?;
    let available = dict.bytes_list().rows();
    let count = i32::try_from(count)
        .ok()
        .filter(|&n| n <= available)
        .ok_or_else(|| Error::InvalidInput(format!("{dictionary} holds only {available} markers, asked for {count}")))?;

    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(count as usize);
    let mut image = Mat::default();
    for id in 0..count {
        objdetect::generate_image_marker(&dict, id, size_px, &mut image, 1)?;
        let path = dir.join(format!("marker_{id}.png"));
        let name = path
            .to_str()
            .ok_or_else(|| Error::InvalidInput(format!("Non UTF-8 marker path: {}", path.display())))?;
        if !imgcodecs::imwrite(name, &image, &Vector::new())? {
            return Err(Error::Io(std::io::Error::other(format!("Could not write {name}"))));
        }
        debug!("Wrote marker {} to {}", id, name);
        written.push(path);
    }

    info!("Generated {} {} markers in {}", written.len(), dictionary, dir.display());
    Ok(written)
}

/// Map an `OpenCV` dictionary name to its enum value
fn dictionary_type(name: &str) -> Result<PredefinedDictionaryType> {
    use PredefinedDictionaryType as D;
    Ok(match name.to_uppercase().as_str() {
        "DICT_4X4_50" => D::DICT_4X4_50,
        "DICT_4X4_100" => D::DICT_4X4_100,
        "DICT_4X4_250" => D::DICT_4X4_250,
        "DICT_4X4_1000" => D::DICT_4X4_1000,
        "DICT_5X5_50" => D::DICT_5X5_50,
        "DICT_5X5_100" => D::DICT_5X5_100,
        "DICT_5X5_250" => D::DICT_5X5_250,
        "DICT_5X5_1000" => D::DICT_5X5_1000,
        "DICT_6X6_50" => D::DICT_6X6_50,
        "DICT_6X6_100" => D::DICT_6X6_100,
        "DICT_6X6_250" => D::DICT_6X6_250,
        "DICT_6X6_1000" => D::DICT_6X6_1000,
        "DICT_7X7_50" => D::DICT_7X7_50,
        "DICT_7X7_100" => D::DICT_7X7_100,
        "DICT_7X7_250" => D::DICT_7X7_250,
        "DICT_7X7_1000" => D::DICT_7X7_1000,
        "DICT_ARUCO_ORIGINAL" => D::DICT_ARUCO_ORIGINAL,
        _ => return Err(Error::InvalidInput(format!("Unknown ArUco dictionary: {name}"))),
    })
}
