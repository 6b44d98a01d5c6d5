use anyhow::{Error, Result};
use opencv::core::{Mat, Vector, CV_16U, CV_8U};
use opencv::imgcodecs::{imdecode, IMREAD_UNCHANGED};
use opencv::imgproc::{cvt_color_def, COLOR_BGRA2BGR, COLOR_GRAY2BGR};
use opencv::prelude::*;

/// Decodes an encoded image into an 8-bit, 3-channel BGR `Mat`.
pub fn byte_data_to_opencv(im_bytes: &[u8]) -> Result<Mat, Error> {
    let buf = Vector::<u8>::from_slice(im_bytes);

    let opencv_img = match imdecode(&buf, IMREAD_UNCHANGED) {
        Ok(opencv_img) => opencv_img,
        Err(e) => {
            return Err(Error::from(e))
        }
    };

    // imdecode signals unknown formats with an empty Mat rather than an error
    if opencv_img.rows() == 0 || opencv_img.cols() == 0 {
        return Err(Error::msg("failed to decode image: unsupported or corrupt image data"))
    }

    let opencv_img = match opencv_img.depth() {
        CV_8U => opencv_img,
        CV_16U => {
            let mut img_8u = Mat::default();
            opencv_img.convert_to(&mut img_8u, CV_8U, 1.0 / 257.0, 0.0)?;
            img_8u
        }
        depth => {
            return Err(Error::msg(format!("unsupported image depth: {depth}")))
        }
    };

    // Check the number of channels and convert if necessary
    let opencv_img = match opencv_img.channels() {
        4 => {
            let mut bgr_img = Mat::default();
            cvt_color_def(&opencv_img, &mut bgr_img, COLOR_BGRA2BGR)?;
            bgr_img
        }
        1 => {
            let mut bgr_img = Mat::default();
            cvt_color_def(&opencv_img, &mut bgr_img, COLOR_GRAY2BGR)?;
            bgr_img
        }
        3 => opencv_img,
        channels => {
            return Err(Error::msg(format!("unsupported channel count: {channels}")))
        }
    };

    Ok(opencv_img)
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();

    logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .collect()
}

/// Index and value of the largest score. NaN scores never win.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
}

#[cfg(test)]
pub(crate) mod test_images {
    use opencv::core::{Mat, Scalar, Vector, CV_16UC3, CV_8UC1, CV_8UC3, CV_8UC4};
    use opencv::imgcodecs::imencode;

    pub fn encode_png(rows: i32, cols: i32, typ: i32) -> Vec<u8> {
        encode_filled_png(rows, cols, typ, 128.0)
    }

    pub fn encode_filled_png(rows: i32, cols: i32, typ: i32, fill: f64) -> Vec<u8> {
        let mat = Mat::new_rows_cols_with_default(rows, cols, typ, Scalar::all(fill))
            .expect("test image should allocate");
        let mut buf = Vector::<u8>::new();
        imencode(".png", &mat, &mut buf, &Vector::new()).expect("test image should encode");
        buf.to_vec()
    }

    pub fn bgr_png(rows: i32, cols: i32) -> Vec<u8> {
        encode_png(rows, cols, CV_8UC3)
    }

    pub fn gray_png(rows: i32, cols: i32) -> Vec<u8> {
        encode_png(rows, cols, CV_8UC1)
    }

    pub fn bgra_png(rows: i32, cols: i32) -> Vec<u8> {
        encode_png(rows, cols, CV_8UC4)
    }

    /// 16 bits per channel, every sample set to `fill`.
    pub fn bgr16_png(rows: i32, cols: i32, fill: f64) -> Vec<u8> {
        encode_filled_png(rows, cols, CV_16UC3, fill)
    }
}
