//! Shape arithmetic shared by the lowering routines.
//!
//! Nothing here touches a program builder, so sentinel inference can be tested
//! on plain slices.

use thiserror::Error;

/// Requested-shape entry asking for the size to be inferred.
pub const INFER_DIM: i64 = -1;

/// Entry in a requested output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReshapeDim {
    Explicit(usize),
    Infer,
}

/// Reason a requested shape could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InferenceFailure {
    #[error("more than one dimension is marked for inference")]
    MultipleInferDims,
    #[error("dimension {value} at axis {axis} is negative")]
    NegativeDimension { axis: usize, value: i64 },
    #[error("input dimension {value} at axis {axis} is not statically known")]
    UnresolvedInputDim { axis: usize, value: i64 },
    #[error("cannot infer a dimension when the known dimensions hold zero elements")]
    ZeroSizedKnownDims,
    #[error("{elements} elements are not divisible by the known extent {known}")]
    InexactDivision { elements: usize, known: usize },
    #[error("element count overflows usize")]
    Overflow,
}

/// Computes `product(dims)` with overflow checking.
pub fn checked_element_count_or_error<E, F>(dims: &[usize], mut on_overflow: F) -> Result<usize, E>
where
    F: FnMut() -> E,
{
    let mut count = 1usize;
    for dim in dims {
        count = count.checked_mul(*dim).ok_or_else(&mut on_overflow)?;
    }
    Ok(count)
}

/// Converts a fully known shape to `usize` extents.
pub fn static_dims(shape: &[i64]) -> Result<Vec<usize>, InferenceFailure> {
    shape
        .iter()
        .enumerate()
        .map(|(axis, &value)| {
            usize::try_from(value).map_err(|_| InferenceFailure::NegativeDimension { axis, value })
        })
        .collect()
}

/// Classifies each entry of a requested shape; at most one may be [`INFER_DIM`].
pub fn parse_requested_shape(shape: &[i64]) -> Result<Vec<ReshapeDim>, InferenceFailure> {
    let mut dims = Vec::with_capacity(shape.len());
    let mut seen_infer = false;
    for (axis, &value) in shape.iter().enumerate() {
        if value == INFER_DIM {
            if seen_infer {
                return Err(InferenceFailure::MultipleInferDims);
            }
            seen_infer = true;
            dims.push(ReshapeDim::Infer);
            continue;
        }
        let extent = usize::try_from(value)
            .map_err(|_| InferenceFailure::NegativeDimension { axis, value })?;
        dims.push(ReshapeDim::Explicit(extent));
    }
    Ok(dims)
}

/// Replaces the inference sentinel so the shape holds `element_count` elements.
///
/// Shapes without a sentinel are returned as-is; whether their element count
/// matches is checked by the caller after layout mapping.
pub fn resolve_reshape_dims(
    requested: &[i64],
    element_count: usize,
) -> Result<Vec<usize>, InferenceFailure> {
    let dims = parse_requested_shape(requested)?;
    let known: Vec<usize> = dims
        .iter()
        .filter_map(|dim| match dim {
            ReshapeDim::Explicit(extent) => Some(*extent),
            ReshapeDim::Infer => None,
        })
        .collect();
    if known.len() == dims.len() {
        return Ok(known);
    }

    let known_count = checked_element_count_or_error(&known, || InferenceFailure::Overflow)?;
    if known_count == 0 {
        return Err(InferenceFailure::ZeroSizedKnownDims);
    }
    if element_count % known_count != 0 {
        return Err(InferenceFailure::InexactDivision {
            elements: element_count,
            known: known_count,
        });
    }
    let inferred = element_count / known_count;
    Ok(dims
        .into_iter()
        .map(|dim| match dim {
            ReshapeDim::Explicit(extent) => extent,
            ReshapeDim::Infer => inferred,
        })
        .collect())
}
