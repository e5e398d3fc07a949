use ndarray::{s, Array2, Array4};

/// Decision threshold applied to raw model scores. Scores above it are
/// foreground. Equivalent to thresholding at probability 0.5 after a sigmoid.
pub const MASK_THRESHOLD: f32 = 0.0;

/// Collapses a (1, 1, 512, 512) logit map into a (512, 512) binary mask
/// containing only the values 0 and 255.
pub fn to_binary_mask(logits: &Array4<f32>) -> Array2<u8> {
    logits
        .slice(s![0, 0, .., ..])
        .map(|&score| if score > MASK_THRESHOLD { 255u8 } else { 0u8 })
}
