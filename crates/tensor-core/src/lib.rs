// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Tensor buffers and reference kernels used by the nn-bench interpreter.
//!
//! This crate provides:
//! - [`Tensor`] — an owned, row-major byte buffer tagged with a [`Shape`] and [`DType`].
//! - [`Shape`] — runtime shape descriptors.
//! - [`DType`] — element encodings a model may declare (f32, u8, i8, i32, f16).
//! - Reference f32 kernels: matrix multiplication, broadcast add, ReLU,
//!   softmax, and affine u8 quantisation.
//!
//! # Design Goals
//! - Tensors are plain bytes: what the benchmark feeds in and reads back is
//!   exactly what the kernels see, with no hidden layout.
//! - Typed access goes through explicit native-endian encode/decode instead
//!   of pointer casts, so unaligned buffers are never reinterpreted.
//! - Clean error types via `thiserror`.

mod dtype;
mod error;
mod ops;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use ops::{add, dequantize, matmul, quantize, relu, softmax, QuantParams};
pub use shape::Shape;
pub use tensor::{decode_f32, encode_f32, Tensor, TensorView};
