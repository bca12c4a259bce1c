// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! The serialized model format executed by the nn-bench interpreter.
//!
//! - [`TensorDef`] / [`TensorKind`] — the tensor table: name, dtype, shape and
//!   role (input, output, intermediate, constant, variable).
//! - [`NodeDef`] / [`Op`] — the computations, in execution order.
//! - [`ModelGraph`] — manifest plus constant data, with a **type-state
//!   pattern** (`Loaded` → `Validated`).
//! - [`ModelLoader`] — reads a model from bytes or a memory-mapped file.
//! - [`ModelBuilder`] — writes models programmatically.
//!
//! # Supported Model Format
//! One SafeTensors file per model. Constants are ordinary SafeTensors
//! entries; the graph is a JSON [`GraphManifest`] in the `__metadata__`
//! table under the key `"graph"`.
//!
//! # Example
//! ```no_run
//! use model_ir::ModelLoader;
//! use std::path::Path;
//!
//! let graph = ModelLoader::load(Path::new("./models/tiny.nnb")).unwrap();
//! println!("{}", graph.summary());
//! for node in graph.nodes() {
//!     println!("  {}", node.summary());
//! }
//! ```

mod builder;
mod error;
pub mod graph;
mod loader;
mod manifest;
mod node;

pub use builder::ModelBuilder;
pub use error::ModelError;
pub use graph::ModelGraph;
pub use loader::{MappedModel, ModelLoader};
pub use manifest::{GraphManifest, GRAPH_METADATA_KEY};
pub use node::{NodeDef, Op, TensorDef, TensorKind};
