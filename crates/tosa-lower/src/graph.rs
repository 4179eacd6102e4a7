//! Traced graph interface consumed by the lowering visitors.

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::DimOrder;
use crate::spec::DType;

/// One tensor operand flowing through a lowering step.
///
/// `logical_shape` may contain a single `-1` when it states a requested shape.
/// `special` holds the declared values of a shape-spec operand, if any. `dtype`
/// is carried through unchanged; a reshape never converts element types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ValueDescriptorRepr")]
pub struct ValueDescriptor {
    name: String,
    logical_shape: Vec<i64>,
    dim_order: DimOrder,
    dtype: Option<DType>,
    special: Option<Vec<i64>>,
}

#[derive(Deserialize)]
struct ValueDescriptorRepr {
    name: String,
    #[serde(default)]
    logical_shape: Vec<i64>,
    #[serde(default)]
    dim_order: Option<DimOrder>,
    #[serde(default)]
    dtype: Option<DType>,
    #[serde(default)]
    special: Option<Vec<i64>>,
}

impl From<ValueDescriptorRepr> for ValueDescriptor {
    fn from(repr: ValueDescriptorRepr) -> Self {
        let dim_order = repr
            .dim_order
            .unwrap_or_else(|| DimOrder::identity(repr.logical_shape.len()));
        Self {
            name: repr.name,
            logical_shape: repr.logical_shape,
            dim_order,
            dtype: repr.dtype,
            special: repr.special,
        }
    }
}

impl ValueDescriptor {
    /// Creates a descriptor with the identity dimension order.
    pub fn new(name: impl Into<String>, logical_shape: impl Into<Vec<i64>>) -> Self {
        let logical_shape = logical_shape.into();
        let dim_order = DimOrder::identity(logical_shape.len());
        Self {
            name: name.into(),
            logical_shape,
            dim_order,
            dtype: None,
            special: None,
        }
    }

    pub fn with_dim_order(mut self, dim_order: impl Into<DimOrder>) -> Self {
        self.dim_order = dim_order.into();
        self
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn with_special(mut self, values: impl Into<Vec<i64>>) -> Self {
        self.special = Some(values.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logical_shape(&self) -> &[i64] {
        &self.logical_shape
    }

    pub fn rank(&self) -> usize {
        self.logical_shape.len()
    }

    pub fn dim_order(&self) -> &DimOrder {
        &self.dim_order
    }

    pub fn dtype(&self) -> Option<DType> {
        self.dtype
    }

    pub fn special(&self) -> Option<&[i64]> {
        self.special.as_deref()
    }
}

/// A traced operator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Operator identifier used for dispatch, e.g. `aten.view_copy.default`.
    pub target: String,
    pub inputs: Vec<ValueDescriptor>,
    pub output: ValueDescriptor,
}

/// Graph placeholders followed by nodes in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub inputs: Vec<String>,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Error)]
pub enum GraphIoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Graph {
    pub fn from_json_str(src: &str) -> Result<Self, GraphIoError> {
        serde_json::from_str(src).map_err(GraphIoError::from)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, GraphIoError> {
        let contents = fs::read_to_string(path)?;
        Graph::from_json_str(&contents)
    }
}
