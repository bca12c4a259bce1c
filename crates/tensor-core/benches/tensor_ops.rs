// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the reference tensor kernels.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tensor_core::{matmul, softmax, DType, Shape, Tensor};

fn bench_matmul(c: &mut Criterion) {
    let a = Tensor::from_f32(Shape::matrix(64, 128), &vec![0.5; 64 * 128]).unwrap();
    let b = Tensor::from_f32(Shape::matrix(128, 64), &vec![0.25; 128 * 64]).unwrap();
    let mut out = Tensor::zeros(Shape::matrix(64, 64), DType::F32);

    c.bench_function("matmul_64x128x64", |bench| {
        bench.iter(|| matmul(black_box(&a.view()), black_box(&b.view()), &mut out).unwrap())
    });
}

fn bench_softmax(c: &mut Criterion) {
    let values: Vec<f32> = (0..4096).map(|i| (i % 17) as f32 * 0.1).collect();
    let input = Tensor::from_f32(Shape::matrix(4, 1024), &values).unwrap();
    let mut out = Tensor::zeros(Shape::matrix(4, 1024), DType::F32);

    c.bench_function("softmax_4x1024", |bench| {
        bench.iter(|| softmax(black_box(&input.view()), &mut out).unwrap())
    });
}

criterion_group!(benches, bench_matmul, bench_softmax);
criterion_main!(benches);
