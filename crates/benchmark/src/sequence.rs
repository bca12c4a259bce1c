// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Input/output sequences fed to the runner.
//!
//! A sequence is an ordered list of steps that share model state: the
//! runner resets state once on entering a sequence, never between steps.

use crate::InputError;
use std::fmt;

/// Writes one step's input directly into the runtime's input buffer.
///
/// Lets a dataset defer reading (or generating) inputs until the step runs
/// instead of holding them all in memory.
pub trait InputProducer: Send {
    /// Fills `buffer`, which is exactly the input tensor's size.
    fn fill(&self, buffer: &mut [u8]) -> Result<(), InputError>;
}

/// Where a step's input bytes come from.
pub enum InputSource {
    /// Pre-encoded bytes, copied into the input tensor.
    Bytes(Vec<u8>),
    /// Produced in place at step time.
    Deferred(Box<dyn InputProducer>),
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Self::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// One step: an input and, optionally, the output it should produce.
#[derive(Debug)]
pub struct InferenceInOut {
    pub input: InputSource,
    pub expected_output: Option<Vec<u8>>,
}

impl InferenceInOut {
    /// A step with inline input bytes.
    pub fn new(input: Vec<u8>, expected_output: Option<Vec<u8>>) -> Self {
        Self {
            input: InputSource::Bytes(input),
            expected_output,
        }
    }

    /// A step whose input is produced at run time.
    pub fn deferred(producer: Box<dyn InputProducer>, expected_output: Option<Vec<u8>>) -> Self {
        Self {
            input: InputSource::Deferred(producer),
            expected_output,
        }
    }

    pub fn has_golden_output(&self) -> bool {
        self.expected_output.is_some()
    }
}

/// Ordered steps of one stateful run.
#[derive(Debug, Default)]
pub struct InferenceInOutSequence {
    steps: Vec<InferenceInOut>,
}

impl InferenceInOutSequence {
    pub fn new(steps: Vec<InferenceInOut>) -> Self {
        Self { steps }
    }

    pub fn push(&mut self, step: InferenceInOut) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[InferenceInOut] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `Some(true)` if every step has golden output, `Some(false)` if none
    /// does, `None` if the sequence mixes both (or is empty).
    pub fn golden_presence(&self) -> Option<bool> {
        let with = self.steps.iter().filter(|s| s.has_golden_output()).count();
        match with {
            _ if self.steps.is_empty() => None,
            0 => Some(false),
            n if n == self.steps.len() => Some(true),
            _ => None,
        }
    }

    /// Whether every step carries golden output.
    pub fn has_golden_output(&self) -> bool {
        self.golden_presence() == Some(true)
    }
}

impl From<Vec<InferenceInOut>> for InferenceInOutSequence {
    fn from(steps: Vec<InferenceInOut>) -> Self {
        Self::new(steps)
    }
}

/// Total steps across a set of sequences.
pub fn total_steps(sequences: &[InferenceInOutSequence]) -> usize {
    sequences.iter().map(InferenceInOutSequence::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_presence() {
        let all = InferenceInOutSequence::new(vec![
            InferenceInOut::new(vec![0], Some(vec![1])),
            InferenceInOut::new(vec![0], Some(vec![1])),
        ]);
        let none = InferenceInOutSequence::new(vec![InferenceInOut::new(vec![0], None)]);
        let mixed = InferenceInOutSequence::new(vec![
            InferenceInOut::new(vec![0], Some(vec![1])),
            InferenceInOut::new(vec![0], None),
        ]);

        assert_eq!(all.golden_presence(), Some(true));
        assert!(all.has_golden_output());
        assert_eq!(none.golden_presence(), Some(false));
        assert_eq!(mixed.golden_presence(), None);
        assert_eq!(InferenceInOutSequence::default().golden_presence(), None);
    }

    #[test]
    fn test_total_steps() {
        let seqs = vec![
            InferenceInOutSequence::new(vec![InferenceInOut::new(vec![], None)]),
            InferenceInOutSequence::new(vec![
                InferenceInOut::new(vec![], None),
                InferenceInOut::new(vec![], None),
            ]),
        ];
        assert_eq!(total_steps(&seqs), 3);
    }
}
