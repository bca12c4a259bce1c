// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runner behaviour against a scripted runtime.
//!
//! `ScriptedRuntime` echoes its input to its output, records every reset and
//! invoke, and can be told to fail or sleep, so the loop's ordering, timeout
//! and failure rules can be checked without a real model.

use benchmark::{
    BenchError, InferenceInOut, InferenceInOutSequence, InputError, InputProducer, RunFlags,
    RunState, SequenceRunner, Tracer,
};
use runtime::{ModelRuntime, RuntimeError, TensorInfo};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tensor_core::{DType, Shape};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Reset,
    Invoke(u8),
}

#[derive(Default)]
struct ScriptedRuntime {
    buffer: Vec<u8>,
    events: Vec<Event>,
    fail_on_invoke: Option<usize>,
    invoke_delay: Duration,
    invokes: usize,
}

impl ScriptedRuntime {
    fn new() -> Self {
        Self {
            buffer: vec![0; 1],
            ..Default::default()
        }
    }
}

impl ModelRuntime for ScriptedRuntime {
    fn name(&self) -> &str {
        "scripted"
    }

    fn resize_input(&mut self, shape: &Shape) -> Result<(), RuntimeError> {
        self.buffer = vec![0; shape.num_elements()];
        Ok(())
    }

    fn input_info(&self) -> TensorInfo {
        TensorInfo {
            name: "in".into(),
            dtype: DType::U8,
            shape: Shape::vector(self.buffer.len()),
        }
    }

    fn set_input(&mut self, data: &[u8]) -> Result<(), RuntimeError> {
        if data.len() != self.buffer.len() {
            return Err(RuntimeError::InputSize {
                expected: self.buffer.len(),
                actual: data.len(),
            });
        }
        self.buffer.copy_from_slice(data);
        Ok(())
    }

    fn input_buffer(&mut self) -> Result<&mut [u8], RuntimeError> {
        Ok(&mut self.buffer)
    }

    fn invoke(&mut self) -> Result<(), RuntimeError> {
        if Some(self.invokes) == self.fail_on_invoke {
            return Err(RuntimeError::Construction("scripted failure".into()));
        }
        self.invokes += 1;
        std::thread::sleep(self.invoke_delay);
        self.events.push(Event::Invoke(self.buffer[0]));
        Ok(())
    }

    fn reset_state(&mut self) -> Result<(), RuntimeError> {
        self.events.push(Event::Reset);
        Ok(())
    }

    fn output_info(&self) -> TensorInfo {
        self.input_info()
    }

    fn output_bytes(&self) -> Result<&[u8], RuntimeError> {
        Ok(&self.buffer)
    }

    fn exposes_all_layers(&self) -> bool {
        false
    }

    fn tensor_count(&self) -> usize {
        1
    }

    fn tensor_bytes(&self, id: usize) -> Option<&[u8]> {
        (id == 0).then_some(self.buffer.as_slice())
    }
}

/// Sequence `tag` with `len` steps; step inputs are `tag * 10 + step`.
fn sequence(tag: u8, len: u8, golden: bool) -> InferenceInOutSequence {
    (0..len)
        .map(|i| {
            let v = tag * 10 + i;
            InferenceInOut::new(vec![v], golden.then(|| vec![v]))
        })
        .collect::<Vec<_>>()
        .into()
}

#[test]
fn test_round_robin_with_state_resets() {
    let mut rt = ScriptedRuntime::new();
    let seqs = [sequence(0, 2, false), sequence(1, 3, false)];
    let outcome = SequenceRunner::new(&mut rt)
        .run(&seqs, 5, f64::INFINITY, RunFlags::NONE)
        .unwrap();

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.results.len(), 2 + 3 + 2 + 3 + 2);
    let visited: Vec<usize> = outcome
        .results
        .iter()
        .filter(|r| r.step_index == 0)
        .map(|r| r.sequence_index)
        .collect();
    assert_eq!(visited, vec![0, 1, 0, 1, 0]);

    let resets = rt.events.iter().filter(|e| **e == Event::Reset).count();
    assert_eq!(resets, 5);
    assert_eq!(
        &rt.events[..4],
        &[Event::Reset, Event::Invoke(0), Event::Invoke(1), Event::Reset]
    );
}

#[test]
fn test_outputs_kept_unless_discarded() {
    let seqs = [sequence(2, 2, false)];

    let mut rt = ScriptedRuntime::new();
    let kept = SequenceRunner::new(&mut rt)
        .run_once(&seqs, RunFlags::NONE)
        .unwrap();
    assert_eq!(kept.results[1].output, Some(vec![21]));

    let mut rt = ScriptedRuntime::new();
    let discarded = SequenceRunner::new(&mut rt)
        .run_once(&seqs, RunFlags::DISCARD_OUTPUT)
        .unwrap();
    assert!(discarded.results.iter().all(|r| r.output.is_none()));
}

#[test]
fn test_golden_comparison() {
    // Echo runtime matches its golden data exactly.
    let mut rt = ScriptedRuntime::new();
    let seqs = [sequence(1, 2, true)];
    let outcome = SequenceRunner::new(&mut rt)
        .run_once(&seqs, RunFlags::NONE)
        .unwrap();
    assert!(outcome.results.iter().all(|r| r.mean_squared_error == 0.0));

    // Golden data off by one.
    let off = InferenceInOutSequence::new(vec![InferenceInOut::new(vec![5], Some(vec![3]))]);
    let mut rt = ScriptedRuntime::new();
    let outcome = SequenceRunner::new(&mut rt)
        .run_once(std::slice::from_ref(&off), RunFlags::NONE)
        .unwrap();
    assert_eq!(outcome.results[0].mean_squared_error, 4.0);
    assert_eq!(outcome.results[0].max_error, 2.0);

    let mut rt = ScriptedRuntime::new();
    let ignored = SequenceRunner::new(&mut rt)
        .run_once(std::slice::from_ref(&off), RunFlags::IGNORE_GOLDEN)
        .unwrap();
    assert_eq!(ignored.results[0].mean_squared_error, 0.0);
}

#[test]
#[should_panic(expected = "does not match golden length")]
fn test_golden_length_mismatch_panics() {
    let mut rt = ScriptedRuntime::new();
    let seqs = [InferenceInOutSequence::new(vec![InferenceInOut::new(
        vec![1],
        Some(vec![1, 2]),
    )])];
    let _ = SequenceRunner::new(&mut rt).run_once(&seqs, RunFlags::NONE);
}

#[test]
#[should_panic(expected = "at least one sequence")]
fn test_empty_sequences_panic() {
    let mut rt = ScriptedRuntime::new();
    let _ = SequenceRunner::new(&mut rt).run(&[], 1, 1.0, RunFlags::NONE);
}

#[test]
fn test_timeout_stops_at_sequence_boundary() {
    let mut rt = ScriptedRuntime {
        invoke_delay: Duration::from_millis(2),
        ..ScriptedRuntime::new()
    };
    let seqs = [sequence(0, 3, false)];
    let mut runner = SequenceRunner::new(&mut rt);
    let outcome = runner.run_for(&seqs, 0.0, RunFlags::NONE).unwrap();

    assert_eq!(outcome.state, RunState::TimedOut);
    assert_eq!(runner.state(), RunState::TimedOut);
    assert_eq!(outcome.results.len(), 3);
}

#[test]
fn test_invoke_failure_discards_results() {
    let mut rt = ScriptedRuntime {
        fail_on_invoke: Some(4),
        ..ScriptedRuntime::new()
    };
    let seqs = [sequence(0, 3, false)];
    let mut runner = SequenceRunner::new(&mut rt);
    let err = runner.run(&seqs, 10, f64::INFINITY, RunFlags::NONE).unwrap_err();

    assert!(matches!(err, BenchError::Runtime(_)));
    assert_eq!(runner.state(), RunState::Failed);
}

#[test]
fn test_set_input_failure_aborts() {
    let mut rt = ScriptedRuntime::new();
    let seqs = [InferenceInOutSequence::new(vec![InferenceInOut::new(vec![1, 2], None)])];
    let err = SequenceRunner::new(&mut rt)
        .run_once(&seqs, RunFlags::NONE)
        .unwrap_err();
    assert!(matches!(
        err,
        BenchError::Runtime(RuntimeError::InputSize { expected: 1, actual: 2 })
    ));
    assert!(rt.events.iter().all(|e| *e == Event::Reset));
}

/// A deferred input whose producer always fails.
struct Broken;

impl InputProducer for Broken {
    fn fill(&self, _buffer: &mut [u8]) -> Result<(), InputError> {
        Err(InputError::Producer("sensor offline".into()))
    }
}

#[test]
fn test_producer_failure_aborts() {
    let mut rt = ScriptedRuntime::new();
    let seqs = [InferenceInOutSequence::new(vec![
        InferenceInOut::new(vec![7], None),
        InferenceInOut::deferred(Box::new(Broken), None),
    ])];
    let (err, state) = {
        let mut runner = SequenceRunner::new(&mut rt);
        let err = runner.run(&seqs, 3, f64::INFINITY, RunFlags::NONE).unwrap_err();
        (err, runner.state())
    };

    assert!(matches!(
        err,
        BenchError::Input(InputError::Producer(ref msg)) if msg == "sensor offline"
    ));
    assert_eq!(state, RunState::Failed);
    assert_eq!(rt.events, vec![Event::Reset, Event::Invoke(7)]);
}

#[test]
fn test_complete_input_set() {
    let seqs = [sequence(0, 2, false), sequence(1, 1, false)];
    let mut rt = ScriptedRuntime::new();
    let outcome = SequenceRunner::new(&mut rt)
        .run_complete_input_set(&seqs, 2, f64::INFINITY, RunFlags::NONE)
        .unwrap();
    assert_eq!(outcome.results.len(), 6);

    let mut rt = ScriptedRuntime {
        invoke_delay: Duration::from_millis(1),
        ..ScriptedRuntime::new()
    };
    let err = SequenceRunner::new(&mut rt)
        .run_complete_input_set(&seqs, 2, 0.0, RunFlags::NONE)
        .unwrap_err();
    assert!(matches!(
        err,
        BenchError::IncompleteInputSet {
            expected: 6,
            actual: 2
        }
    ));
}

#[test]
fn test_dump_requires_exposed_layers() {
    let dir = tempfile::tempdir().unwrap();
    let mut rt = ScriptedRuntime::new();
    let seqs = [sequence(0, 1, false)];
    let mut runner = SequenceRunner::new(&mut rt);

    assert!(matches!(
        runner.dump_all_layers(&dir.path().join("missing"), &seqs),
        Err(BenchError::DumpDirectory { .. })
    ));
    assert!(matches!(
        runner.dump_all_layers(dir.path(), &seqs),
        Err(BenchError::IntermediateOutputsDisabled)
    ));
}

struct Recorder(Rc<RefCell<Vec<String>>>);

impl Tracer for Recorder {
    fn begin_section(&mut self, name: &'static str) {
        self.0.borrow_mut().push(format!("+{name}"));
    }

    fn end_section(&mut self) {
        self.0.borrow_mut().push("-".into());
    }
}

#[test]
fn test_trace_sections_bracket_each_step() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut rt = ScriptedRuntime::new();
    let seqs = [sequence(0, 2, false)];
    SequenceRunner::new(&mut rt)
        .with_tracer(Box::new(Recorder(Rc::clone(&log))))
        .run_once(&seqs, RunFlags::NONE)
        .unwrap();

    let step = ["+benchmark::step", "+benchmark::input", "-", "-"];
    let expected: Vec<&str> = step.iter().chain(step.iter()).copied().collect();
    assert_eq!(*log.borrow(), expected);
}
