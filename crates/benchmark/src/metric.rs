// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Output error against golden data.

use tensor_core::{decode_f32, DType};

/// Error of one produced output against its expected output.
///
/// `max_error` is the largest *signed* difference `produced - expected`,
/// starting from 0. An output that only undershoots reports 0 here; the
/// undershoot is still visible in `mean_squared_error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct ErrorMetrics {
    pub mean_squared_error: f64,
    pub max_error: f64,
}

impl ErrorMetrics {
    /// Compares two buffers element-wise.
    ///
    /// `u8` buffers compare byte values; `f32` buffers compare native-endian
    /// 4-byte floats.
    ///
    /// # Panics
    /// If the buffers differ in length, or `dtype` is neither `u8` nor
    /// `f32`. Both indicate a harness bug, not a model error.
    pub fn compute(produced: &[u8], expected: &[u8], dtype: DType) -> Self {
        assert_eq!(
            produced.len(),
            expected.len(),
            "output length {} does not match golden length {}",
            produced.len(),
            expected.len()
        );
        match dtype {
            DType::U8 => Self::fold(
                produced
                    .iter()
                    .zip(expected)
                    .map(|(&p, &e)| f64::from(p) - f64::from(e)),
            ),
            DType::F32 => Self::fold(
                decode_f32(produced)
                    .into_iter()
                    .zip(decode_f32(expected))
                    .map(|(p, e)| f64::from(p) - f64::from(e)),
            ),
            other => panic!("error computation does not support {other} outputs"),
        }
    }

    fn fold(diffs: impl Iterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut sum_sq = 0.0;
        let mut max_error = 0.0f64;
        for d in diffs {
            count += 1;
            sum_sq += d * d;
            max_error = max_error.max(d);
        }
        Self {
            mean_squared_error: if count == 0 { 0.0 } else { sum_sq / count as f64 },
            max_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::encode_f32;

    #[test]
    fn test_f32_metrics() {
        let m = ErrorMetrics::compute(
            &encode_f32(&[1.0, 2.0, 3.0]),
            &encode_f32(&[1.0, 2.0, 2.0]),
            DType::F32,
        );
        assert!((m.mean_squared_error - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.max_error, 1.0);
    }

    #[test]
    fn test_u8_metrics() {
        let m = ErrorMetrics::compute(&[10, 20], &[12, 20], DType::U8);
        assert_eq!(m.mean_squared_error, 2.0);
        assert_eq!(m.max_error, 0.0);
    }

    #[test]
    fn test_max_error_is_signed() {
        let m = ErrorMetrics::compute(&encode_f32(&[-5.0]), &encode_f32(&[0.0]), DType::F32);
        assert_eq!(m.max_error, 0.0);
        assert_eq!(m.mean_squared_error, 25.0);
    }

    #[test]
    fn test_identical_outputs() {
        let data = encode_f32(&[0.25, -7.5]);
        assert_eq!(
            ErrorMetrics::compute(&data, &data, DType::F32),
            ErrorMetrics::default()
        );
    }

    #[test]
    #[should_panic(expected = "does not match golden length")]
    fn test_length_mismatch_panics() {
        ErrorMetrics::compute(&[0; 4], &[0; 8], DType::F32);
    }

    #[test]
    #[should_panic(expected = "does not support")]
    fn test_unsupported_dtype_panics() {
        ErrorMetrics::compute(&[0; 4], &[0; 4], DType::I32);
    }
}
