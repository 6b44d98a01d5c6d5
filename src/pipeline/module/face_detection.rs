use std::sync::Mutex;
use anyhow::{Context, Error, Result};
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use crate::pipeline::model_config::config::FaceDetectionConfig;

/// Face bounding box in source-image pixels. Always lies inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl FaceBox {
    /// Intersects `rect` with a `width` x `height` image, dropping empty results.
    pub fn clamped(rect: Rect, width: i32, height: i32) -> Option<Self> {
        let x0 = rect.x.clamp(0, width);
        let y0 = rect.y.clamp(0, height);
        let x1 = rect.x.saturating_add(rect.width).clamp(0, width);
        let y1 = rect.y.saturating_add(rect.height).clamp(0, height);

        if x1 <= x0 || y1 <= y0 {
            return None
        }

        Some(FaceBox {
            x: x0,
            y: y0,
            w: x1 - x0,
            h: y1 - y0,
        })
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

pub trait FaceLocator: Send + Sync {
    /// Finds faces in a single-channel 8-bit image, in detector order.
    fn locate(&self, gray: &Mat) -> Result<Vec<FaceBox>, Error>;
}

pub struct HaarCascadeDetection {
    // detectMultiScale needs exclusive access to the classifier
    classifier: Mutex<CascadeClassifier>,
    scale_factor: f64,
    min_neighbors: i32,
    min_size: (i32, i32),
}

impl HaarCascadeDetection {
    pub fn new(cfg: &FaceDetectionConfig) -> Result<Self, Error> {
        let classifier = CascadeClassifier::new(&cfg.cascade_path)
            .with_context(|| format!("failed to load haar cascade from {}", cfg.cascade_path))?;

        if classifier.empty()? {
            return Err(Error::msg(format!("haar cascade {} is empty", cfg.cascade_path)))
        }

        Ok(HaarCascadeDetection {
            classifier: Mutex::new(classifier),
            scale_factor: cfg.scale_factor,
            min_neighbors: cfg.min_neighbors,
            min_size: cfg.min_size,
        })
    }
}

impl FaceLocator for HaarCascadeDetection {
    fn locate(&self, gray: &Mat) -> Result<Vec<FaceBox>, Error> {
        let img_shape = gray.size()?;
        let mut faces = Vector::<Rect>::new();

        {
            let mut classifier = self
                .classifier
                .lock()
                .map_err(|_| Error::msg("face_detection - cascade classifier lock poisoned"))?;

            classifier.detect_multi_scale(
                gray,
                &mut faces,
                self.scale_factor,
                self.min_neighbors,
                0,
                Size::new(self.min_size.0, self.min_size.1),
                Size::new(0, 0),
            )?;
        }

        Ok(faces
            .iter()
            .filter_map(|rect| FaceBox::clamped(rect, img_shape.width, img_shape.height))
            .collect())
    }
}
