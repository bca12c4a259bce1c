// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! On-disk datasets of raw input and golden output files.
//!
//! # TOML Format
//! ```toml
//! lazy = false
//!
//! [[sequences]]
//! steps = [
//!   { input = "seq0/step0.input", output = "seq0/step0.output" },
//!   { input = "seq0/step1.input", output = "seq0/step1.output" },
//! ]
//! ```
//! Paths are relative to the manifest. Files hold raw tensor bytes with no
//! header. With `lazy = true` inputs are read at step time through
//! [`FileInput`] instead of up front.

use crate::sequence::InputProducer;
use crate::{BenchError, InferenceInOut, InferenceInOutSequence, InputError};
use std::path::{Path, PathBuf};

/// The manifest file.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetManifest {
    #[serde(default)]
    pub lazy: bool,
    pub sequences: Vec<SequenceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceEntry {
    pub steps: Vec<StepEntry>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepEntry {
    pub input: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl DatasetManifest {
    pub fn from_toml(toml_str: &str) -> Result<Self, BenchError> {
        toml::from_str(toml_str)
            .map_err(|e| BenchError::Dataset(format!("TOML parse error: {e}")))
    }

    pub fn to_toml(&self) -> Result<String, BenchError> {
        toml::to_string_pretty(self)
            .map_err(|e| BenchError::Dataset(format!("TOML serialise error: {e}")))
    }
}

/// Reads an input file into the input buffer when the step runs.
#[derive(Debug, Clone)]
pub struct FileInput {
    path: PathBuf,
}

impl FileInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InputProducer for FileInput {
    fn fill(&self, buffer: &mut [u8]) -> Result<(), InputError> {
        let data = std::fs::read(&self.path).map_err(|source| InputError::Io {
            path: self.path.clone(),
            source,
        })?;
        if data.len() != buffer.len() {
            return Err(InputError::Size {
                expected: buffer.len(),
                actual: data.len(),
            });
        }
        buffer.copy_from_slice(&data);
        Ok(())
    }
}

/// Sequences loaded from a manifest.
#[derive(Debug)]
pub struct Dataset {
    sequences: Vec<InferenceInOutSequence>,
    has_golden: bool,
}

impl Dataset {
    /// Loads the manifest at `path` and the files it names.
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::Dataset(format!("cannot read manifest '{}': {e}", path.display()))
        })?;
        let manifest = DatasetManifest::from_toml(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_manifest(&manifest, base)
    }

    /// Builds sequences from `manifest`, resolving paths against `base`.
    ///
    /// # Errors
    /// [`BenchError::Dataset`] if there are no sequences, a sequence is
    /// empty, or golden outputs are present for some steps but not others.
    pub fn from_manifest(manifest: &DatasetManifest, base: &Path) -> Result<Self, BenchError> {
        if manifest.sequences.is_empty() {
            return Err(BenchError::Dataset("dataset has no sequences".into()));
        }

        let mut sequences = Vec::with_capacity(manifest.sequences.len());
        let mut has_golden = None;
        for (i, entry) in manifest.sequences.iter().enumerate() {
            let mut sequence = InferenceInOutSequence::default();
            for step in &entry.steps {
                let expected = step
                    .output
                    .as_ref()
                    .map(|p| read_file(&base.join(p)))
                    .transpose()?;
                let input = base.join(&step.input);
                sequence.push(if manifest.lazy {
                    InferenceInOut::deferred(Box::new(FileInput::new(input)), expected)
                } else {
                    InferenceInOut::new(read_file(&input)?, expected)
                });
            }

            if sequence.is_empty() {
                return Err(BenchError::Dataset(format!("sequence {i} has no steps")));
            }
            let golden = sequence.golden_presence().ok_or_else(|| {
                BenchError::Dataset(format!("sequence {i} mixes steps with and without golden output"))
            })?;
            match has_golden {
                Some(prev) if prev != golden => {
                    return Err(BenchError::Dataset(format!(
                        "sequence {i} disagrees with earlier sequences on golden output"
                    )))
                }
                _ => has_golden = Some(golden),
            }
            sequences.push(sequence);
        }

        let dataset = Self {
            sequences,
            has_golden: has_golden.unwrap_or(false),
        };
        tracing::info!(
            "loaded dataset: {} sequences, {} steps, golden={}, lazy={}",
            dataset.sequences.len(),
            dataset.total_steps(),
            dataset.has_golden,
            manifest.lazy
        );
        Ok(dataset)
    }

    /// Wraps in-memory sequences, checking the same golden rules as loading.
    pub fn from_sequences(sequences: Vec<InferenceInOutSequence>) -> Result<Self, BenchError> {
        let mut presence = sequences.iter().map(InferenceInOutSequence::golden_presence);
        let first = presence
            .next()
            .ok_or_else(|| BenchError::Dataset("dataset has no sequences".into()))?;
        let has_golden = first
            .filter(|&g| presence.all(|p| p == Some(g)))
            .ok_or_else(|| BenchError::Dataset("inconsistent golden outputs across steps".into()))?;
        Ok(Self {
            sequences,
            has_golden,
        })
    }

    pub fn sequences(&self) -> &[InferenceInOutSequence] {
        &self.sequences
    }

    pub fn has_golden_output(&self) -> bool {
        self.has_golden
    }

    pub fn total_steps(&self) -> usize {
        crate::sequence::total_steps(&self.sequences)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, BenchError> {
    std::fs::read(path)
        .map_err(|e| BenchError::Dataset(format!("cannot read '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, data: &[u8]) {
        std::fs::write(dir.join(name), data).unwrap();
    }

    #[test]
    fn test_parse_manifest() {
        let m = DatasetManifest::from_toml(
            r#"
            [[sequences]]
            steps = [{ input = "a.in", output = "a.out" }, { input = "b.in" }]
            "#,
        )
        .unwrap();
        assert!(!m.lazy);
        assert_eq!(m.sequences[0].steps.len(), 2);
        assert_eq!(m.sequences[0].steps[1].output, None);

        let back = DatasetManifest::from_toml(&m.to_toml().unwrap()).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_load_eager_and_lazy() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.in", &[1, 2]);
        write(dir.path(), "a.out", &[3, 4]);

        for lazy in [false, true] {
            let manifest = DatasetManifest {
                lazy,
                sequences: vec![SequenceEntry {
                    steps: vec![StepEntry {
                        input: "a.in".into(),
                        output: Some("a.out".into()),
                    }],
                }],
            };
            let path = dir.path().join("dataset.toml");
            std::fs::write(&path, manifest.to_toml().unwrap()).unwrap();

            let ds = Dataset::load(&path).unwrap();
            assert!(ds.has_golden_output());
            assert_eq!(ds.total_steps(), 1);
            let step = &ds.sequences()[0].steps()[0];
            assert_eq!(step.expected_output.as_deref(), Some(&[3u8, 4][..]));
            match &step.input {
                crate::InputSource::Bytes(b) => {
                    assert!(!lazy);
                    assert_eq!(b, &vec![1, 2]);
                }
                crate::InputSource::Deferred(p) => {
                    assert!(lazy);
                    let mut buf = [0u8; 2];
                    p.fill(&mut buf).unwrap();
                    assert_eq!(buf, [1, 2]);
                }
            }
        }
    }

    #[test]
    fn test_mixed_golden_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.in", &[0]);
        write(dir.path(), "a.out", &[0]);
        let step = |output: Option<&str>| StepEntry {
            input: "a.in".into(),
            output: output.map(PathBuf::from),
        };

        let within = DatasetManifest {
            lazy: false,
            sequences: vec![SequenceEntry {
                steps: vec![step(Some("a.out")), step(None)],
            }],
        };
        assert!(matches!(
            Dataset::from_manifest(&within, dir.path()),
            Err(BenchError::Dataset(_))
        ));

        let across = DatasetManifest {
            lazy: false,
            sequences: vec![
                SequenceEntry {
                    steps: vec![step(Some("a.out"))],
                },
                SequenceEntry {
                    steps: vec![step(None)],
                },
            ],
        };
        assert!(Dataset::from_manifest(&across, dir.path()).is_err());
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert!(Dataset::from_manifest(&DatasetManifest::default(), Path::new(".")).is_err());
        assert!(Dataset::from_sequences(Vec::new()).is_err());
    }

    #[test]
    fn test_file_input_size_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "x.in", &[1, 2, 3]);
        let mut buf = [0u8; 4];
        let err = FileInput::new(dir.path().join("x.in")).fill(&mut buf).unwrap_err();
        assert!(matches!(err, InputError::Size { expected: 4, actual: 3 }));
        assert!(FileInput::new(dir.path().join("missing")).fill(&mut buf).is_err());
    }
}
