// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # benchmark
//!
//! Timed, golden-checked benchmarking of any [`runtime::ModelRuntime`].
//!
//! - [`SequenceRunner`] plays [`InferenceInOutSequence`]s under a run and
//!   time budget and records one [`InferenceResult`] per step.
//! - [`ErrorMetrics`] scores a produced output against golden data.
//! - [`BenchmarkResult`] aggregates a run into latency and accuracy figures.
//! - [`Dataset`] and [`BenchmarkConfig`] load the inputs and settings from
//!   TOML; [`BenchmarkSession`] ties them to a loaded model.
//!
//! # Example
//! ```no_run
//! use benchmark::{BenchmarkConfig, BenchmarkSession};
//! use std::path::Path;
//!
//! let config = BenchmarkConfig::from_file(Path::new("bench.toml")).unwrap();
//! let mut session = BenchmarkSession::open(config).unwrap();
//! let (result, _) = session.run().unwrap();
//! println!("{result}");
//! ```

mod aggregate;
mod config;
mod dataset;
mod error;
mod metric;
mod result;
mod runner;
pub mod sequence;
mod session;
mod trace;

pub use aggregate::{write_report, BenchmarkResult};
pub use config::BenchmarkConfig;
pub use dataset::{Dataset, DatasetManifest, FileInput, SequenceEntry, StepEntry};
pub use error::{BenchError, InputError};
pub use metric::ErrorMetrics;
pub use result::InferenceResult;
pub use runner::{RunFlags, RunOutcome, RunState, SequenceRunner, UNBOUNDED_RUNS};
pub use sequence::{InferenceInOut, InferenceInOutSequence, InputProducer, InputSource};
pub use session::BenchmarkSession;
pub use trace::{NoopTracer, SpanTracer, Tracer};
