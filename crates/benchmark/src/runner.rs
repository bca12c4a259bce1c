// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The timed sequence loop.
//!
//! ```text
//! Idle ──run()──▶ Running ──┬─▶ Completed   (run budget exhausted)
//!                           ├─▶ TimedOut    (time budget exceeded)
//!                           └─▶ Failed      (runtime or input error)
//! ```
//!
//! Sequence run `n` plays `sequences[n % len]` after a state reset. Only the
//! invocation is timed, and the time budget is checked after each full
//! sequence, so a timed-out run never ends mid-sequence.

use crate::sequence::{total_steps, InferenceInOut, InputSource};
use crate::{
    BenchError, ErrorMetrics, InferenceInOutSequence, InferenceResult, NoopTracer, Tracer,
};
use runtime::ModelRuntime;
use std::ops::BitOr;
use std::path::Path;
use std::time::{Duration, Instant};

/// Run budget meaning "until the timeout".
pub const UNBOUNDED_RUNS: usize = 0x0FFF_FFFF;

/// Per-run behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RunFlags(u32);

impl RunFlags {
    pub const NONE: Self = Self(0);
    /// Do not keep a copy of each output.
    pub const DISCARD_OUTPUT: Self = Self(1 << 0);
    /// Skip comparison against golden outputs.
    pub const IGNORE_GOLDEN: Self = Self(1 << 1);

    /// Builds flags from raw bits; unknown bits are dropped.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits & 0b11)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flags for data with or without golden outputs whose outputs are or
    /// are not consumed afterwards.
    pub fn defaults(has_golden: bool, keep_output: bool) -> Self {
        let mut flags = Self::NONE;
        if !has_golden {
            flags = flags | Self::IGNORE_GOLDEN;
        }
        if !keep_output {
            flags = flags | Self::DISCARD_OUTPUT;
        }
        flags
    }
}

impl BitOr for RunFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Lifecycle of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    TimedOut,
    Failed,
}

/// Results of a successful run and how it ended.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub results: Vec<InferenceResult>,
    /// [`RunState::Completed`] or [`RunState::TimedOut`].
    pub state: RunState,
}

/// Drives one [`ModelRuntime`] through input sequences.
pub struct SequenceRunner<'a> {
    runtime: &'a mut dyn ModelRuntime,
    tracer: Box<dyn Tracer + 'a>,
    state: RunState,
}

impl<'a> SequenceRunner<'a> {
    /// Creates a runner with a no-op tracer.
    pub fn new(runtime: &'a mut dyn ModelRuntime) -> Self {
        Self {
            runtime,
            tracer: Box::new(NoopTracer),
            state: RunState::Idle,
        }
    }

    /// Replaces the tracer.
    pub fn with_tracer(mut self, tracer: Box<dyn Tracer + 'a>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs up to `max_runs` sequence runs or until the summed invoke time
    /// exceeds `timeout_sec` after a full sequence.
    ///
    /// # Errors
    /// Any input, invoke or reset failure aborts the run; no partial results
    /// are returned.
    ///
    /// # Panics
    /// If `sequences` is empty, or golden data does not match the output
    /// length.
    pub fn run(
        &mut self,
        sequences: &[InferenceInOutSequence],
        max_runs: usize,
        timeout_sec: f64,
        flags: RunFlags,
    ) -> Result<RunOutcome, BenchError> {
        assert!(!sequences.is_empty(), "benchmark needs at least one sequence");
        self.state = RunState::Running;
        tracing::debug!(
            "running {} sequences, max {} runs, timeout {}s, flags {:#04b}",
            sequences.len(),
            max_runs,
            timeout_sec,
            flags.bits()
        );

        match self.run_sequences(sequences, max_runs, timeout_sec, flags) {
            Ok((results, timed_out)) => {
                self.state = if timed_out {
                    RunState::TimedOut
                } else {
                    RunState::Completed
                };
                Ok(RunOutcome {
                    results,
                    state: self.state,
                })
            }
            Err(e) => {
                self.state = RunState::Failed;
                tracing::error!("benchmark run failed: {e}");
                Err(e)
            }
        }
    }

    /// A single sequence run with no time limit.
    pub fn run_once(
        &mut self,
        sequences: &[InferenceInOutSequence],
        flags: RunFlags,
    ) -> Result<RunOutcome, BenchError> {
        self.run(sequences, 1, f64::INFINITY, flags)
    }

    /// As many sequence runs as fit in `timeout_sec`.
    pub fn run_for(
        &mut self,
        sequences: &[InferenceInOutSequence],
        timeout_sec: f64,
        flags: RunFlags,
    ) -> Result<RunOutcome, BenchError> {
        self.run(sequences, UNBOUNDED_RUNS, timeout_sec, flags)
    }

    /// Plays every sequence `repeat` times and insists on a result for
    /// every step.
    ///
    /// # Errors
    /// [`BenchError::IncompleteInputSet`] if the timeout cut the run short.
    pub fn run_complete_input_set(
        &mut self,
        sequences: &[InferenceInOutSequence],
        repeat: usize,
        timeout_sec: f64,
        flags: RunFlags,
    ) -> Result<RunOutcome, BenchError> {
        let outcome = self.run(sequences, sequences.len() * repeat, timeout_sec, flags)?;
        let expected = total_steps(sequences) * repeat;
        if outcome.results.len() != expected {
            return Err(BenchError::IncompleteInputSet {
                expected,
                actual: outcome.results.len(),
            });
        }
        Ok(outcome)
    }

    /// Plays each sequence once and dumps every host-visible tensor after
    /// each step into `dir`.
    ///
    /// # Errors
    /// [`BenchError::DumpDirectory`] if `dir` is not an existing directory,
    /// [`BenchError::IntermediateOutputsDisabled`] if the runtime was not
    /// loaded with all layers exposed.
    ///
    /// # Panics
    /// If `sequences` is empty.
    pub fn dump_all_layers(
        &mut self,
        dir: &Path,
        sequences: &[InferenceInOutSequence],
    ) -> Result<(), BenchError> {
        assert!(!sequences.is_empty(), "layer dump needs at least one sequence");
        if !dir.is_dir() {
            return Err(BenchError::DumpDirectory {
                path: dir.to_path_buf(),
                detail: "not an existing directory".into(),
            });
        }
        if !self.runtime.exposes_all_layers() {
            return Err(BenchError::IntermediateOutputsDisabled);
        }

        let mut files = 0;
        for (seq_index, sequence) in sequences.iter().enumerate() {
            self.runtime.reset_state()?;
            for (step_index, step) in sequence.steps().iter().enumerate() {
                self.apply_input(step)?;
                self.runtime.invoke()?;
                files += self.runtime.dump_all_tensors(dir, seq_index, step_index)?;
            }
        }
        tracing::info!("dumped {files} tensor files to {}", dir.display());
        Ok(())
    }

    fn run_sequences(
        &mut self,
        sequences: &[InferenceInOutSequence],
        max_runs: usize,
        timeout_sec: f64,
        flags: RunFlags,
    ) -> Result<(Vec<InferenceResult>, bool), BenchError> {
        let mut results = Vec::new();
        let mut elapsed = Duration::ZERO;

        for n in 0..max_runs {
            let seq_index = n % sequences.len();
            self.runtime.reset_state()?;

            for (step_index, step) in sequences[seq_index].steps().iter().enumerate() {
                self.tracer.begin_section("benchmark::step");
                let timed = self.run_step(step);
                self.tracer.end_section();
                let compute_time = timed?;
                elapsed += compute_time;

                let mut metrics = ErrorMetrics::default();
                if !flags.contains(RunFlags::IGNORE_GOLDEN) {
                    if let Some(expected) = &step.expected_output {
                        let dtype = self.runtime.output_info().dtype;
                        metrics = ErrorMetrics::compute(self.runtime.output_bytes()?, expected, dtype);
                    }
                }
                let output = if flags.contains(RunFlags::DISCARD_OUTPUT) {
                    None
                } else {
                    Some(self.runtime.read_output()?)
                };
                results.push(
                    InferenceResult::new(compute_time, seq_index, step_index)
                        .with_error(metrics)
                        .with_output(output),
                );
            }

            if elapsed.as_secs_f64() > timeout_sec {
                tracing::debug!(
                    "timeout after {} sequence runs ({:.3}s)",
                    n + 1,
                    elapsed.as_secs_f64()
                );
                return Ok((results, true));
            }
        }
        Ok((results, false))
    }

    /// Sets the input and times the invocation.
    fn run_step(&mut self, step: &InferenceInOut) -> Result<Duration, BenchError> {
        self.tracer.begin_section("benchmark::input");
        let set = self.apply_input(step);
        self.tracer.end_section();
        set?;

        let start = Instant::now();
        self.runtime.invoke()?;
        Ok(start.elapsed())
    }

    fn apply_input(&mut self, step: &InferenceInOut) -> Result<(), BenchError> {
        match &step.input {
            InputSource::Bytes(bytes) => self.runtime.set_input(bytes)?,
            InputSource::Deferred(producer) => producer.fill(self.runtime.input_buffer()?)?,
        }
        Ok(())
    }
}

impl std::fmt::Debug for SequenceRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceRunner")
            .field("runtime", &self.runtime.name())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_bits() {
        assert_eq!(RunFlags::DISCARD_OUTPUT.bits(), 1);
        assert_eq!(RunFlags::IGNORE_GOLDEN.bits(), 2);
        let both = RunFlags::from_bits(0b111);
        assert_eq!(both.bits(), 0b11);
        assert!(both.contains(RunFlags::DISCARD_OUTPUT));
        assert!(both.contains(RunFlags::IGNORE_GOLDEN));
        assert!(!RunFlags::NONE.contains(RunFlags::IGNORE_GOLDEN));
    }

    #[test]
    fn test_default_flags() {
        assert_eq!(RunFlags::defaults(true, true), RunFlags::NONE);
        assert_eq!(RunFlags::defaults(false, true), RunFlags::IGNORE_GOLDEN);
        assert_eq!(
            RunFlags::defaults(false, false),
            RunFlags::IGNORE_GOLDEN | RunFlags::DISCARD_OUTPUT
        );
    }
}
