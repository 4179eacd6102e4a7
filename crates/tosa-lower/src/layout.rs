//! Dimension order helpers.
//!
//! The target IR stores tensors in its own physical axis order, which can differ
//! from the framework's logical order (e.g. channels-last for 4D activations).
//! [`map_shape`] is the single place where logical sizes are rearranged into
//! that physical order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Channels-last order for rank-4 tensors (NCHW -> NHWC).
pub const NHWC_ORDER: [usize; 4] = [0, 2, 3, 1];

/// Channels-last order for rank-5 tensors (NCDHW -> NDHWC).
pub const NDHWC_ORDER: [usize; 5] = [0, 2, 3, 4, 1];

/// Malformed dimension order for a shape of the given rank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dimension order {dim_order:?} is not a permutation of 0..{rank}")]
pub struct LayoutError {
    pub dim_order: Vec<usize>,
    pub rank: usize,
}

/// Maps physical axis positions to logical axis positions.
///
/// Entry `i` names the logical axis stored at physical position `i`. The order
/// is not validated on construction because descriptors arrive from the graph
/// tracer as-is; [`DimOrder::validate`] and [`map_shape`] check it on use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimOrder(Vec<usize>);

impl DimOrder {
    pub fn new(order: impl Into<Vec<usize>>) -> Self {
        Self(order.into())
    }

    pub fn identity(rank: usize) -> Self {
        Self((0..rank).collect())
    }

    /// Channels-last order for 4D and 5D tensors, identity for every other rank.
    pub fn channels_last(rank: usize) -> Self {
        match rank {
            4 => Self(NHWC_ORDER.to_vec()),
            5 => Self(NDHWC_ORDER.to_vec()),
            _ => Self::identity(rank),
        }
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(pos, &axis)| pos == axis)
    }

    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.0.len()];
        for &axis in &self.0 {
            match seen.get_mut(axis) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }

    /// Checks that the order is a permutation of `0..rank`.
    pub fn validate(&self, rank: usize) -> Result<(), LayoutError> {
        if self.rank() == rank && self.is_permutation() {
            Ok(())
        } else {
            Err(LayoutError {
                dim_order: self.0.clone(),
                rank,
            })
        }
    }

    /// Returns the permutation that undoes `self`.
    pub fn inverse(&self) -> Result<DimOrder, LayoutError> {
        self.validate(self.rank())?;
        let mut inverse = vec![0usize; self.0.len()];
        for (pos, &axis) in self.0.iter().enumerate() {
            inverse[axis] = pos;
        }
        Ok(DimOrder(inverse))
    }
}

impl From<Vec<usize>> for DimOrder {
    fn from(order: Vec<usize>) -> Self {
        Self(order)
    }
}

/// Rearranges logical dimension sizes into physical order.
///
/// `result[i] == logical_shape[dim_order[i]]`. Sizes must already be resolved;
/// inference sentinels are handled before this call.
pub fn map_shape(logical_shape: &[usize], dim_order: &DimOrder) -> Result<Vec<usize>, LayoutError> {
    dim_order.validate(logical_shape.len())?;
    Ok(dim_order
        .as_slice()
        .iter()
        .map(|&axis| logical_shape[axis])
        .collect())
}
