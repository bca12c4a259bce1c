// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Options controlling how a model is loaded into the interpreter.
//!
//! Usually embedded as the `[runtime]` table of a benchmark config:
//! ```toml
//! [runtime]
//! use_accelerator = true
//! accelerator = "simulated"
//! expose_all_layers = false
//! allow_reduced_precision = true
//! device_memory_bytes = 67108864
//! ```

use crate::{Delegate, RuntimeError, SimulatedAccelerator};

/// Default on-device memory of the simulated accelerator (64 MiB).
pub const DEFAULT_DEVICE_MEMORY_BYTES: usize = 64 * 1024 * 1024;

/// Load-time options for [`crate::Interpreter::load`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Attach the accelerator named by `accelerator`.
    pub use_accelerator: bool,
    /// Accelerator name: `"simulated"`.
    pub accelerator: String,
    /// Register every node result as a model output so intermediate
    /// tensors stay host-visible under delegation.
    pub expose_all_layers: bool,
    /// Let delegates compute f32 ops at reduced (f16) precision.
    pub allow_reduced_precision: bool,
    /// Memory budget of the simulated accelerator.
    pub device_memory_bytes: usize,
}

impl LoadOptions {
    /// Options for plain host execution.
    pub fn host() -> Self {
        Self::default()
    }

    /// Options with the default accelerator attached.
    pub fn accelerated() -> Self {
        Self {
            use_accelerator: true,
            ..Self::default()
        }
    }

    /// Returns a copy with all layers exposed.
    pub fn with_all_layers(mut self) -> Self {
        self.expose_all_layers = true;
        self
    }

    /// Creates the delegate named by `accelerator`.
    pub fn create_delegate(&self) -> Result<Box<dyn Delegate>, RuntimeError> {
        match self.accelerator.to_lowercase().as_str() {
            "simulated" | "sim" => Ok(Box::new(SimulatedAccelerator::new(
                self.device_memory_bytes,
            ))),
            other => Err(RuntimeError::ConfigError(format!(
                "unknown accelerator '{other}'; expected 'simulated'"
            ))),
        }
    }

    /// Short label for reports, e.g. `"host"` or `"simulated"`.
    pub fn backend_label(&self) -> String {
        if self.use_accelerator {
            self.accelerator.to_lowercase()
        } else {
            "host".to_string()
        }
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            use_accelerator: false,
            accelerator: "simulated".to_string(),
            expose_all_layers: false,
            allow_reduced_precision: true,
            device_memory_bytes: DEFAULT_DEVICE_MEMORY_BYTES,
        }
    }
}
