// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The capability interface a benchmark drives.
//!
//! [`ModelRuntime`] is everything the sequence runner needs from an engine:
//! feed the primary input, invoke, read the primary output, reset state and
//! dump tensors. The reference [`crate::Interpreter`] implements it; other
//! engines can be benchmarked by implementing it too.

use crate::RuntimeError;
use std::path::Path;
use tensor_core::{DType, Shape};

/// Name, encoding and current shape of a tensor.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TensorInfo {
    pub name: String,
    pub dtype: DType,
    pub shape: Shape,
}

impl TensorInfo {
    /// Bytes the tensor occupies at its current shape.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(self.dtype)
    }
}

/// File name of one tensor dump: `dump_SSS_seq_TTT_tensor_NNN`.
///
/// Indices are zero-padded to three digits; larger values are written in
/// full.
pub fn dump_file_name(sequence: usize, step: usize, tensor: usize) -> String {
    format!("dump_{sequence:03}_seq_{step:03}_tensor_{tensor:03}")
}

/// One loaded model instance and its tensor buffers.
///
/// A runtime is owned by a single thread at a time; it is `Send` so a caller
/// can move it onto a worker, but it is never shared.
pub trait ModelRuntime: Send {
    /// Short backend label used in logs and reports.
    fn name(&self) -> &str;

    /// Resizes the primary input and reallocates every non-constant buffer.
    ///
    /// Buffer contents, including state, are zero afterwards.
    fn resize_input(&mut self, shape: &Shape) -> Result<(), RuntimeError>;

    /// Describes the primary input tensor.
    fn input_info(&self) -> TensorInfo;

    /// Copies `data` byte-for-byte into the primary input.
    ///
    /// # Errors
    /// [`RuntimeError::UnsupportedInputType`] unless the input is `u8` or
    /// `f32`; [`RuntimeError::InputSize`] if `data` has the wrong length.
    fn set_input(&mut self, data: &[u8]) -> Result<(), RuntimeError>;

    /// Mutable access to the primary input bytes, for producers that write
    /// the input in place.
    fn input_buffer(&mut self) -> Result<&mut [u8], RuntimeError>;

    /// Runs the model once.
    fn invoke(&mut self) -> Result<(), RuntimeError>;

    /// Zeroes every stateful tensor. Calling it twice is the same as once.
    fn reset_state(&mut self) -> Result<(), RuntimeError>;

    /// Describes the primary output tensor.
    fn output_info(&self) -> TensorInfo;

    /// Borrows the primary output bytes.
    fn output_bytes(&self) -> Result<&[u8], RuntimeError>;

    /// Copies the primary output bytes out of the runtime.
    fn read_output(&self) -> Result<Vec<u8>, RuntimeError> {
        Ok(self.output_bytes()?.to_vec())
    }

    /// Whether every intermediate result was registered as an output at load.
    fn exposes_all_layers(&self) -> bool;

    /// Number of entries in the tensor table.
    fn tensor_count(&self) -> usize;

    /// Host bytes of a tensor, or `None` if it has no host memory.
    fn tensor_bytes(&self, id: usize) -> Option<&[u8]>;

    /// Writes every host-visible tensor to `dir` as raw bytes named by
    /// [`dump_file_name`]. Returns the number of files written.
    fn dump_all_tensors(
        &self,
        dir: &Path,
        sequence: usize,
        step: usize,
    ) -> Result<usize, RuntimeError> {
        let mut written = 0;
        for id in 0..self.tensor_count() {
            let Some(bytes) = self.tensor_bytes(id) else {
                continue;
            };
            std::fs::write(dir.join(dump_file_name(sequence, step, id)), bytes)?;
            written += 1;
        }
        tracing::trace!(sequence, step, written, "dumped tensors");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_file_name() {
        assert_eq!(dump_file_name(0, 1, 2), "dump_000_seq_001_tensor_002");
        assert_eq!(dump_file_name(12, 0, 345), "dump_012_seq_000_tensor_345");
        assert_eq!(dump_file_name(1000, 0, 0), "dump_1000_seq_000_tensor_000");
    }

    #[test]
    fn test_tensor_info_size() {
        let info = TensorInfo {
            name: "x".into(),
            dtype: DType::F32,
            shape: Shape::matrix(2, 3),
        };
        assert_eq!(info.size_bytes(), 24);
    }
}
