// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Supported tensor element data types.

/// Enumerates the element encodings a [`crate::Tensor`] can hold.
///
/// Only `F32` and `U8` are accepted as benchmark inputs and compared against
/// golden outputs. The remaining encodings can appear in a model (weights,
/// index tensors) but are rejected wherever raw bytes cross the benchmark
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit IEEE 754 floating point.
    F32,
    /// 8-bit unsigned integer (affine-quantised activations).
    U8,
    /// 8-bit signed integer.
    I8,
    /// 32-bit signed integer.
    I32,
    /// 16-bit IEEE 754 floating point.
    F16,
}

impl DType {
    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::F16 => 2,
            DType::U8 | DType::I8 => 1,
        }
    }

    /// Returns a human-readable label for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::U8 => "u8",
            DType::I8 => "i8",
            DType::I32 => "i32",
            DType::F16 => "f16",
        }
    }

    /// Parses a dtype label, accepting the common long spellings.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "f32" | "float32" => Some(DType::F32),
            "u8" | "uint8" => Some(DType::U8),
            "i8" | "int8" => Some(DType::I8),
            "i32" | "int32" => Some(DType::I32),
            "f16" | "float16" => Some(DType::F16),
            _ => None,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(DType::F32.size_bytes(), 4);
        assert_eq!(DType::U8.size_bytes(), 1);
        assert_eq!(DType::F16.size_bytes(), 2);
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!(DType::from_str_loose("Float32"), Some(DType::F32));
        assert_eq!(DType::from_str_loose("uint8"), Some(DType::U8));
        assert_eq!(DType::from_str_loose("bf16"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::U8.to_string(), "u8");
        assert_eq!(format!("{}", DType::I32), "i32");
    }
}
