use anyhow::{Error, Result};
use ndarray::Array4;
use opencv::core::{Mat, Size};
use opencv::imgproc::{resize, INTER_LINEAR};
use opencv::prelude::*;
use crate::config::settings::InputLayout;
use crate::pipeline::module::face_detection::FaceBox;

/// Crops `face` out of a grayscale image and turns it into a classifier input
/// tensor: resized to `image_size`, scaled to [0, 1], batch of one.
pub fn prepare_face(gray: &Mat, face: &FaceBox, image_size: (i32, i32), layout: InputLayout) -> Result<Array4<f32>, Error> {
    if gray.channels() != 1 {
        return Err(Error::msg(format!("preprocess - expected a single channel image, got {} channels", gray.channels())))
    }

    let face_roi = Mat::roi(gray, face.rect())?.try_clone()?;

    let mut resized_img = Mat::default();
    match resize(&face_roi, &mut resized_img, Size::new(image_size.0, image_size.1), 0.0, 0.0, INTER_LINEAR) {
        Ok(_) => {},
        Err(e) => return Err(Error::from(e))
    }
    drop(face_roi);

    let pixels: Vec<f32> = resized_img
        .data_bytes()?
        .iter()
        .map(|&pixel| pixel as f32 / 255.0)
        .collect();

    let (width, height) = (image_size.0 as usize, image_size.1 as usize);
    let shape = match layout {
        InputLayout::Nhwc => (1, height, width, 1),
        InputLayout::Nchw => (1, 1, height, width),
    };

    Ok(Array4::from_shape_vec(shape, pixels)?)
}
