//! Brightness measurements of decoded frames.

use image::DynamicImage;
use ndarray::{Array2, Zip};

use crate::color::ColorSpace;
use crate::consts::{
    BRIGHTNESS_SCALE, LAB_EPSILON, LAB_KAPPA, LEVELS_8BIT, PARALLEL_PIXEL_THRESHOLD,
};
use crate::io::metadata::FrameMetadata;

/// Linear-light luminance per pixel, shape = (height, width), values in [0, 1].
pub fn luminance_plane(image: &DynamicImage, space: ColorSpace) -> Array2<f32> {
    let rgb = image.to_rgb8();
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);
    let raw = rgb.as_raw();

    let max = (LEVELS_8BIT - 1) as f64;
    let mut decode = [0f64; LEVELS_8BIT];
    for (level, v) in decode.iter_mut().enumerate() {
        *v = space.decode(level as f64 / max);
    }
    let [wr, wg, wb] = space.luminance_weights();

    let mut plane = Array2::<f32>::zeros((h, w));
    let fill = |(row, col): (usize, usize), out: &mut f32| {
        let i = (row * w + col) * 3;
        let y = wr * decode[raw[i] as usize]
            + wg * decode[raw[i + 1] as usize]
            + wb * decode[raw[i + 2] as usize];
        *out = y as f32;
    };
    if w * h >= PARALLEL_PIXEL_THRESHOLD {
        Zip::indexed(&mut plane).par_for_each(fill);
    } else {
        Zip::indexed(&mut plane).for_each(fill);
    }
    plane
}

fn mean(plane: &Array2<f32>) -> f64 {
    if plane.is_empty() {
        return 0.0;
    }
    plane.iter().map(|&v| f64::from(v)).sum::<f64>() / plane.len() as f64
}

/// Mean linear luminance on the 0..100 brightness scale.
pub fn mean_luminance(image: &DynamicImage, space: ColorSpace) -> f64 {
    mean(&luminance_plane(image, space)) * BRIGHTNESS_SCALE
}

/// CIE L* (0..100) of a relative luminance in [0, 1].
pub fn lightness(y: f64) -> f64 {
    let f = if y > LAB_EPSILON {
        y.cbrt()
    } else {
        (LAB_KAPPA * y + 16.0) / 116.0
    };
    116.0 * f - 16.0
}

/// Relative luminance in [0, 1] of a CIE L* value.
pub fn luminance_from_lightness(l: f64) -> f64 {
    if l > LAB_KAPPA * LAB_EPSILON {
        ((l + 16.0) / 116.0).powi(3)
    } else {
        l / LAB_KAPPA
    }
}

/// Mean perceptual lightness converted back to luminance, 0..100 scale.
///
/// Averaging in L* weighs shadows more than a linear mean does.
pub fn mean_lab_luminance(image: &DynamicImage, space: ColorSpace) -> f64 {
    let mut plane = luminance_plane(image, space);
    let lab = |y: f32| lightness(f64::from(y)) as f32;
    if plane.len() >= PARALLEL_PIXEL_THRESHOLD {
        plane.par_mapv_inplace(lab);
    } else {
        plane.mapv_inplace(lab);
    }
    luminance_from_lightness(mean(&plane)) * BRIGHTNESS_SCALE
}

/// Light admitted by the camera for this frame, `None` when the metadata is
/// incomplete.
pub fn exif_light(metadata: &FrameMetadata) -> Option<f64> {
    metadata.admitted_light()
}

/// Fill unknown entries by linear interpolation between the nearest known
/// neighbours. Leading and trailing gaps take the nearest known value.
///
/// Returns `None` when nothing is known.
pub fn fill_gaps(series: &[Option<f64>]) -> Option<Vec<f64>> {
    let known: Vec<(usize, f64)> = series
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    let (&(first_i, first_v), &(last_i, last_v)) = (known.first()?, known.last()?);

    let mut out = Vec::with_capacity(series.len());
    let mut next = 0;
    for i in 0..series.len() {
        let value = if i <= first_i {
            first_v
        } else if i >= last_i {
            last_v
        } else {
            while known[next + 1].0 < i {
                next += 1;
            }
            let (i0, v0) = known[next];
            let (i1, v1) = known[next + 1];
            v0 + (v1 - v0) * (i - i0) as f64 / (i1 - i0) as f64
        };
        out.push(value);
    }
    Some(out)
}
