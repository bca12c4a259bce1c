// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! End-to-end: model file + dataset on disk → session → results and dumps.

use benchmark::{
    BenchmarkConfig, BenchmarkSession, Dataset, DatasetManifest, RunState, SequenceEntry,
    StepEntry,
};
use model_ir::{ModelBuilder, Op};
use runtime::{dump_file_name, LoadOptions};
use std::path::{Path, PathBuf};
use tensor_core::{decode_f32, encode_f32, DType, Shape};

/// x[1,2] -> accumulate(state) -> relu -> out. Ids: x=0 state=1 acc=2 relu=3.
fn write_model(dir: &Path) -> PathBuf {
    let mut b = ModelBuilder::new("running-relu");
    let x = b.input("x", DType::F32, Shape::matrix(1, 2));
    let state = b.variable("state", Shape::matrix(1, 2));
    let acc = b.node("acc", Op::Accumulate, &[x, state]).unwrap();
    let y = b.node("relu", Op::Relu, &[acc]).unwrap();
    b.output(y);
    let path = dir.join("running-relu.nnb");
    std::fs::write(&path, b.build_bytes().unwrap()).unwrap();
    path
}

/// Two sequences; golden outputs follow the running sum, so they only match
/// if state is reset at the start of each sequence.
fn write_dataset(dir: &Path, lazy: bool) -> PathBuf {
    let sequences = [
        vec![([1.0, -1.0], [1.0, 0.0]), ([1.0, -1.0], [2.0, 0.0])],
        vec![([0.5, 3.0], [0.5, 3.0])],
    ];
    let mut manifest = DatasetManifest {
        lazy,
        sequences: Vec::new(),
    };
    for (s, steps) in sequences.iter().enumerate() {
        let mut entry = SequenceEntry::default();
        for (t, (input, output)) in steps.iter().enumerate() {
            let input_name = format!("s{s}_t{t}.input");
            let output_name = format!("s{s}_t{t}.output");
            std::fs::write(dir.join(&input_name), encode_f32(input)).unwrap();
            std::fs::write(dir.join(&output_name), encode_f32(output)).unwrap();
            entry.steps.push(StepEntry {
                input: input_name.into(),
                output: Some(output_name.into()),
            });
        }
        manifest.sequences.push(entry);
    }
    let path = dir.join("dataset.toml");
    std::fs::write(&path, manifest.to_toml().unwrap()).unwrap();
    path
}

fn config(dir: &Path, lazy: bool, runtime: LoadOptions) -> BenchmarkConfig {
    BenchmarkConfig {
        model_path: write_model(dir),
        dataset_path: Some(write_dataset(dir, lazy)),
        max_runs: 4,
        timeout_sec: 60.0,
        keep_output: true,
        runtime,
        ..Default::default()
    }
}

#[test]
fn test_session_matches_golden_outputs() {
    for (lazy, runtime) in [(false, LoadOptions::host()), (true, LoadOptions::accelerated())] {
        let dir = tempfile::tempdir().unwrap();
        let mut session = BenchmarkSession::open(config(dir.path(), lazy, runtime)).unwrap();
        assert!(session.dataset().has_golden_output());

        let (result, outcome) = session.run().unwrap();
        assert_eq!(outcome.state, RunState::Completed);
        assert_eq!(result.iterations, 2 + 1 + 2 + 1);
        assert_eq!(result.sum_of_mses, 0.0);
        assert_eq!(result.max_single_error, 0.0);
        assert!(result.label.starts_with("running-relu/"));

        let last = outcome.results.last().unwrap();
        assert_eq!(decode_f32(last.output.as_ref().unwrap()), vec![0.5, 3.0]);
    }
}

#[test]
fn test_session_requires_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = BenchmarkConfig {
        dataset_path: None,
        ..config(dir.path(), false, LoadOptions::host())
    };
    assert!(BenchmarkSession::open(cfg).is_err());
}

#[test]
fn test_dump_all_layers_writes_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let dump_dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), false, LoadOptions::accelerated().with_all_layers());
    let mut session = BenchmarkSession::open(cfg).unwrap();
    session.dump(dump_dir.path()).unwrap();

    // 2 + 1 steps, 4 tensors each.
    let files = std::fs::read_dir(dump_dir.path()).unwrap().count();
    assert_eq!(files, 3 * 4);

    // Second step of the first sequence: state holds the running sum.
    let state = std::fs::read(dump_dir.path().join(dump_file_name(0, 1, 1))).unwrap();
    assert_eq!(decode_f32(&state), vec![2.0, -2.0]);
    let out = std::fs::read(dump_dir.path().join(dump_file_name(0, 1, 3))).unwrap();
    assert_eq!(decode_f32(&out), vec![2.0, 0.0]);
}

#[test]
fn test_dump_rejects_hidden_layers() {
    let dir = tempfile::tempdir().unwrap();
    let mut session =
        BenchmarkSession::open(config(dir.path(), false, LoadOptions::host())).unwrap();
    assert!(matches!(
        session.dump(dir.path()),
        Err(benchmark::BenchError::IntermediateOutputsDisabled)
    ));
}

#[test]
fn test_mixed_golden_dataset_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a"), [0u8; 8]).unwrap();
    let manifest = DatasetManifest {
        lazy: false,
        sequences: vec![SequenceEntry {
            steps: vec![
                StepEntry {
                    input: "a".into(),
                    output: Some("a".into()),
                },
                StepEntry {
                    input: "a".into(),
                    output: None,
                },
            ],
        }],
    };
    assert!(Dataset::from_manifest(&manifest, dir.path()).is_err());
}
