// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Injectable section tracing for the runner loop.

/// Brackets named sections of work. Sections nest; every `begin_section`
/// is matched by one `end_section`.
pub trait Tracer {
    fn begin_section(&mut self, name: &'static str);
    fn end_section(&mut self);
}

/// Discards all sections.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn begin_section(&mut self, _name: &'static str) {}
    fn end_section(&mut self) {}
}

/// Maps sections onto `tracing` spans at `TRACE` level.
#[derive(Debug, Default)]
pub struct SpanTracer {
    open: Vec<tracing::span::EnteredSpan>,
}

impl SpanTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sections currently open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }
}

impl Tracer for SpanTracer {
    fn begin_section(&mut self, name: &'static str) {
        self.open.push(tracing::trace_span!("section", name).entered());
    }

    fn end_section(&mut self) {
        self.open.pop();
    }
}
