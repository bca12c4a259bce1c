// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference tensor kernels.
//!
//! Each kernel reads from views and writes into a pre-allocated output
//! tensor whose shape the caller has already propagated. Kernels are
//! portable scalar code; the benchmark measures the interpreter, not SIMD.

mod elementwise_op;
mod matmul_op;
mod quant_op;
mod softmax_op;

pub use elementwise_op::{add, relu};
pub use matmul_op::matmul;
pub use quant_op::{dequantize, quantize, QuantParams};
pub use softmax_op::softmax;
