// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! Executes `model-ir` graphs and exposes them through the
//! [`ModelRuntime`] capability interface the benchmark harness drives.
//!
//! - [`Interpreter`] runs nodes in order over one host buffer per tensor.
//! - [`Delegate`] backends (the [`SimulatedAccelerator`]) take over runs of
//!   nodes they support; tensors internal to those runs have no host memory.
//! - [`LoadOptions`] selects the backend and whether every intermediate
//!   result is exposed as an output.
//!
//! # Type-State Pipeline
//! ```text
//! Interpreter<Building> → Interpreter<Ready>
//! ```
//! Layer exposure and precision are fixed before a delegate is attached.

mod config;
pub mod delegate;
mod error;
mod interpreter;
mod kernels;
mod model_runtime;

pub use config::{LoadOptions, DEFAULT_DEVICE_MEMORY_BYTES};
pub use delegate::{Delegate, DelegateKernel, Partition, SimulatedAccelerator};
pub use error::RuntimeError;
pub use interpreter::{Building, Interpreter, InterpreterState, Ready};
pub use model_runtime::{dump_file_name, ModelRuntime, TensorInfo};
