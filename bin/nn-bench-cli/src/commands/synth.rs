// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `nn-bench synth` command: write a synthetic model, a dataset whose golden
//! outputs come from host execution, and a matching benchmark config.
//!
//! Layout under `--out`:
//! ```text
//! synth.nnb
//! dataset.toml
//! bench.toml
//! seq000/step000.input  seq000/step000.output  ...
//! ```

use anyhow::Context;
use benchmark::{BenchmarkConfig, DatasetManifest, SequenceEntry, StepEntry};
use model_ir::{ModelBuilder, Op};
use runtime::{Interpreter, LoadOptions, ModelRuntime};
use std::path::{Path, PathBuf};
use tensor_core::{encode_f32, DType, Shape};

pub async fn execute(
    out: PathBuf,
    hidden: usize,
    sequences: usize,
    steps: usize,
    seed: u64,
) -> anyhow::Result<()> {
    anyhow::ensure!(hidden > 0 && sequences > 0 && steps > 0, "sizes must be non-zero");
    std::fs::create_dir_all(&out)
        .with_context(|| format!("creating output directory '{}'", out.display()))?;

    let mut rng = Lcg(seed);
    let model_bytes = build_model(hidden, &mut rng)?;
    let model_path = out.join("synth.nnb");
    std::fs::write(&model_path, &model_bytes)?;

    let manifest = write_dataset(&out, &model_bytes, hidden, sequences, steps, &mut rng)?;
    let dataset_path = out.join("dataset.toml");
    std::fs::write(&dataset_path, manifest.to_toml()?)?;

    let config = BenchmarkConfig {
        model_path: model_path.clone(),
        dataset_path: Some(dataset_path.clone()),
        label: Some("synth".into()),
        ..Default::default()
    };
    std::fs::write(out.join("bench.toml"), config.to_toml()?)?;

    println!("  Model:    {}", model_path.display());
    println!("  Dataset:  {} ({sequences} x {steps} steps)", dataset_path.display());
    println!("  Config:   {}", out.join("bench.toml").display());
    Ok(())
}

/// x[1,h] -> fc -> relu -> fc -> accumulate(state) -> softmax
fn build_model(hidden: usize, rng: &mut Lcg) -> anyhow::Result<Vec<u8>> {
    let scale = 1.0 / (hidden as f32).sqrt();
    let mut weights = |n: usize| -> Vec<f32> { (0..n).map(|_| rng.next_f32() * scale).collect() };

    let mut b = ModelBuilder::new("synth");
    let x = b.input("x", DType::F32, Shape::matrix(1, hidden));
    let w1 = b.constant_f32("fc1.weight", Shape::matrix(hidden, hidden), &weights(hidden * hidden));
    let b1 = b.constant_f32("fc1.bias", Shape::vector(hidden), &weights(hidden));
    let w2 = b.constant_f32("fc2.weight", Shape::matrix(hidden, hidden), &weights(hidden * hidden));
    let state = b.variable("state", Shape::matrix(1, hidden));

    let h = b.node("fc1", Op::FullyConnected, &[x, w1, b1])?;
    let g = b.node("relu", Op::Relu, &[h])?;
    let y = b.node("fc2", Op::FullyConnected, &[g, w2])?;
    let acc = b.node("acc", Op::Accumulate, &[y, state])?;
    let out = b.node("softmax", Op::Softmax, &[acc])?;
    b.output(out);
    Ok(b.build_bytes()?)
}

/// Generates inputs and records the host interpreter's outputs as golden.
fn write_dataset(
    out: &Path,
    model_bytes: &[u8],
    hidden: usize,
    sequences: usize,
    steps: usize,
    rng: &mut Lcg,
) -> anyhow::Result<DatasetManifest> {
    let mut interp = Interpreter::load(model_bytes, &LoadOptions::host())?;
    let mut manifest = DatasetManifest::default();

    for s in 0..sequences {
        let dir = format!("seq{s:03}");
        std::fs::create_dir_all(out.join(&dir))?;
        interp.reset_state()?;

        let mut entry = SequenceEntry::default();
        for t in 0..steps {
            let input: Vec<f32> = (0..hidden).map(|_| rng.next_f32()).collect();
            let input = encode_f32(&input);
            interp.set_input(&input)?;
            interp.invoke()?;

            let input_rel = PathBuf::from(&dir).join(format!("step{t:03}.input"));
            let output_rel = PathBuf::from(&dir).join(format!("step{t:03}.output"));
            std::fs::write(out.join(&input_rel), &input)?;
            std::fs::write(out.join(&output_rel), interp.output_bytes()?)?;
            entry.steps.push(StepEntry {
                input: input_rel,
                output: Some(output_rel),
            });
        }
        manifest.sequences.push(entry);
    }
    Ok(manifest)
}

/// 64-bit LCG; values in `[-1, 1)`.
struct Lcg(u64);

impl Lcg {
    fn next_f32(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
    }
}
