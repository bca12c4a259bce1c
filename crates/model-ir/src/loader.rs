// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model loading from, and serialisation to, the SafeTensors container.
//!
//! A model file is a single SafeTensors file:
//! - `__metadata__["graph"]` holds the JSON [`GraphManifest`].
//! - Each constant tensor is stored as a SafeTensors entry named after its
//!   tensor-table entry.
//!
//! Files are memory-mapped, so only the constants the graph references are
//! copied out of the page cache.

use crate::manifest::GRAPH_METADATA_KEY;
use crate::{graph, GraphManifest, ModelError, ModelGraph};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tensor_core::DType;

/// A read-only memory mapping of a model file.
#[derive(Debug)]
pub struct MappedModel {
    path: PathBuf,
    mmap: memmap2::Mmap,
}

impl MappedModel {
    /// Maps the file at `path`.
    pub fn open(path: &Path) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is read-only and the benchmark does not modify
        // model files while they are loaded.
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    /// The mapped file contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// The path the mapping was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Loads models into a validated [`ModelGraph`].
///
/// # Example
/// ```no_run
/// use model_ir::ModelLoader;
/// use std::path::Path;
///
/// let graph = ModelLoader::load(Path::new("./models/tiny.nnb")).unwrap();
/// println!("{}", graph.summary());
/// ```
pub struct ModelLoader;

impl ModelLoader {
    /// Maps, parses and validates the model file at `path`.
    pub fn load(path: &Path) -> Result<ModelGraph<graph::Validated>, ModelError> {
        let mapped = MappedModel::open(path)?;
        Self::from_bytes(mapped.as_bytes())
    }

    /// Parses and validates a model from its serialised bytes.
    ///
    /// Steps:
    /// 1. Read the SafeTensors header and extract the graph manifest.
    /// 2. Copy out every constant the manifest declares, checking its
    ///    dtype and shape against the tensor table.
    /// 3. Validate the resulting graph.
    pub fn from_bytes(bytes: &[u8]) -> Result<ModelGraph<graph::Validated>, ModelError> {
        let (_, metadata) = safetensors::SafeTensors::read_metadata(bytes).map_err(st_error)?;
        let graph_json = metadata
            .metadata()
            .as_ref()
            .and_then(|m| m.get(GRAPH_METADATA_KEY))
            .ok_or(ModelError::MissingGraph {
                key: GRAPH_METADATA_KEY,
            })?;
        let manifest = GraphManifest::from_json(graph_json)?;

        let container = safetensors::SafeTensors::deserialize(bytes).map_err(st_error)?;
        let mut constants = HashMap::new();
        for id in manifest.constant_ids() {
            let def = &manifest.tensors[id];
            let view = container
                .tensor(&def.name)
                .map_err(|_| ModelError::ConstantNotFound {
                    name: def.name.clone(),
                })?;

            let dtype = convert_safetensor_dtype(view.dtype())?;
            if dtype != def.dtype || view.shape() != def.shape.dims() {
                return Err(ModelError::InvalidTensor {
                    tensor: def.name.clone(),
                    detail: format!(
                        "stored as {dtype} {:?}, declared {} {}",
                        view.shape(),
                        def.dtype,
                        def.shape
                    ),
                });
            }
            constants.insert(id, view.data().to_vec());
        }

        tracing::debug!(
            "parsed model '{}': {} tensors, {} constants",
            manifest.name,
            manifest.tensors.len(),
            constants.len()
        );
        ModelGraph::new(manifest, constants).validate()
    }
}

/// Writes a manifest and its constants into SafeTensors bytes.
pub(crate) fn serialize(
    manifest: &GraphManifest,
    constants: &HashMap<usize, Vec<u8>>,
) -> Result<Vec<u8>, ModelError> {
    let mut views = Vec::new();
    for id in manifest.constant_ids() {
        let def = &manifest.tensors[id];
        let data = constants
            .get(&id)
            .ok_or_else(|| ModelError::ConstantNotFound {
                name: def.name.clone(),
            })?;
        let view = safetensors::tensor::TensorView::new(
            to_safetensor_dtype(def.dtype),
            def.shape.dims().to_vec(),
            data,
        )
        .map_err(st_error)?;
        views.push((def.name.clone(), view));
    }

    let metadata = HashMap::from([(GRAPH_METADATA_KEY.to_string(), manifest.to_json()?)]);
    safetensors::serialize(views, &Some(metadata)).map_err(st_error)
}

fn st_error(e: safetensors::SafeTensorError) -> ModelError {
    ModelError::SafeTensors(e.to_string())
}

/// Converts a SafeTensors `Dtype` to our [`DType`].
fn convert_safetensor_dtype(st_dtype: safetensors::Dtype) -> Result<DType, ModelError> {
    match st_dtype {
        safetensors::Dtype::F32 => Ok(DType::F32),
        safetensors::Dtype::U8 => Ok(DType::U8),
        safetensors::Dtype::I8 => Ok(DType::I8),
        safetensors::Dtype::I32 => Ok(DType::I32),
        safetensors::Dtype::F16 => Ok(DType::F16),
        other => Err(ModelError::SafeTensors(format!(
            "unsupported SafeTensors dtype: {other:?}"
        ))),
    }
}

fn to_safetensor_dtype(dtype: DType) -> safetensors::Dtype {
    match dtype {
        DType::F32 => safetensors::Dtype::F32,
        DType::U8 => safetensors::Dtype::U8,
        DType::I8 => safetensors::Dtype::I8,
        DType::I32 => safetensors::Dtype::I32,
        DType::F16 => safetensors::Dtype::F16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModelBuilder, Op};
    use tensor_core::Shape;

    fn tiny_model() -> ModelGraph<graph::Validated> {
        let mut b = ModelBuilder::new("tiny");
        let x = b.input("x", DType::F32, Shape::matrix(1, 2));
        let w = b.constant_f32("w", Shape::matrix(2, 2), &[1.0, 0.0, 0.0, 1.0]);
        let y = b.node("fc", Op::FullyConnected, &[x, w]).unwrap();
        b.output(y);
        b.finish().validate().unwrap()
    }

    #[test]
    fn test_bytes_roundtrip() {
        let graph = tiny_model();
        let bytes = graph.to_bytes().unwrap();
        let loaded = ModelLoader::from_bytes(&bytes).unwrap();

        assert_eq!(loaded.manifest(), graph.manifest());
        assert_eq!(loaded.constant(1), graph.constant(1));
    }

    #[test]
    fn test_garbage_is_reported() {
        let result = ModelLoader::from_bytes(b"definitely not a model");
        assert!(matches!(result, Err(ModelError::SafeTensors(_))));
    }

    #[test]
    fn test_missing_graph_metadata() {
        let data = [0u8; 4];
        let view =
            safetensors::tensor::TensorView::new(safetensors::Dtype::F32, vec![1], &data).unwrap();
        let bytes = safetensors::serialize(vec![("w", view)], &None).unwrap();
        assert!(matches!(
            ModelLoader::from_bytes(&bytes),
            Err(ModelError::MissingGraph { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.nnb");
        std::fs::write(&path, tiny_model().to_bytes().unwrap()).unwrap();

        let mapped = MappedModel::open(&path).unwrap();
        assert_eq!(mapped.path(), path.as_path());

        let loaded = ModelLoader::load(&path).unwrap();
        assert_eq!(loaded.name(), "tiny");
    }

    #[test]
    fn test_load_missing_file() {
        let result = ModelLoader::load(Path::new("/nonexistent/model.nnb"));
        assert!(matches!(result, Err(ModelError::Io(_))));
    }
}
