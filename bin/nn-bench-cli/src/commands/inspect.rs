// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `nn-bench inspect` command: display the tensor table, nodes and how the
//! simulated accelerator would partition the model.

use runtime::delegate::partition_graph;
use runtime::{SimulatedAccelerator, DEFAULT_DEVICE_MEMORY_BYTES};
use std::path::PathBuf;

pub async fn execute(model: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             nn-bench · Model Inspector              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let graph = model_ir::ModelLoader::load(&model).map_err(|e| {
        anyhow::anyhow!("failed to load model from '{}': {e}", model.display())
    })?;

    println!("  {}", graph.summary());
    println!();

    // ── Tensors ────────────────────────────────────────────────
    println!(
        "  {:<4} {:<24} {:<13} {:<6} {:<14} {:>10}",
        "Id", "Name", "Kind", "DType", "Shape", "Bytes",
    );
    println!("  {}", "-".repeat(76));
    for (id, t) in graph.tensors().iter().enumerate() {
        println!(
            "  {:<4} {:<24} {:<13} {:<6} {:<14} {:>10}",
            id,
            truncate(&t.name, 24),
            format!("{:?}", t.kind),
            t.dtype.as_str(),
            t.shape.to_string(),
            t.size_bytes(),
        );
    }
    println!();

    // ── Nodes ──────────────────────────────────────────────────
    println!("  Nodes:");
    for (i, node) in graph.nodes().iter().enumerate() {
        println!("   {i:>3}  {}", node.summary());
    }
    println!();

    // ── Delegation ─────────────────────────────────────────────
    let accel = SimulatedAccelerator::new(DEFAULT_DEVICE_MEMORY_BYTES);
    let partitions = partition_graph(&graph, &accel, graph.outputs());
    println!("  Simulated accelerator partitions: {}", partitions.len());
    for (k, p) in partitions.iter().enumerate() {
        println!(
            "   [{k}] nodes {:?}, {} inputs, {} outputs, {} internal (not dumpable)",
            p.nodes,
            p.inputs.len(),
            p.outputs.len(),
            p.internal.len(),
        );
    }
    println!();
    Ok(())
}

/// Truncates a string to `max_len` with ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}
