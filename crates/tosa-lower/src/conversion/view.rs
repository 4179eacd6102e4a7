use crate::graph::{Node, ValueDescriptor};
use crate::layout::{map_shape, DimOrder};
use crate::shape_helpers::{
    checked_element_count_or_error, resolve_reshape_dims, static_dims, InferenceFailure,
};
use crate::spec::{Attribute, ProgramBuilder, ReshapeAttribute, TosaOp};

use super::{emit, LoweringError, LoweringOptions, LoweringResult, NodeVisitor};

pub const VIEW_COPY_TARGET: &str = "aten.view_copy.default";

/// Computes the physical `RESHAPE` shape for `output.logical_shape`.
pub fn lower_reshape(
    input: &ValueDescriptor,
    output: &ValueDescriptor,
) -> LoweringResult<Vec<usize>> {
    lower_reshape_to(input, output.logical_shape(), output.dim_order())
}

/// Resolves `requested` against the input's element count and maps it into
/// `dim_order`. The result always holds exactly as many elements as the input.
pub fn lower_reshape_to(
    input: &ValueDescriptor,
    requested: &[i64],
    dim_order: &DimOrder,
) -> LoweringResult<Vec<usize>> {
    let input_elements = input_element_count(input, requested)?;
    let shape_error = |reason: InferenceFailure| LoweringError::ShapeInference {
        input: input.name().to_string(),
        requested: requested.to_vec(),
        input_elements: Some(input_elements),
        reason,
    };

    let resolved = resolve_reshape_dims(requested, input_elements).map_err(shape_error)?;
    let physical = map_shape(&resolved, dim_order)?;
    let actual =
        checked_element_count_or_error(&physical, || shape_error(InferenceFailure::Overflow))?;
    if actual != input_elements {
        return Err(LoweringError::ElementCountMismatch {
            expected: input_elements,
            actual,
            shape: physical,
        });
    }
    Ok(physical)
}

fn input_element_count(input: &ValueDescriptor, requested: &[i64]) -> LoweringResult<usize> {
    let unresolved = |reason: InferenceFailure| LoweringError::ShapeInference {
        input: input.name().to_string(),
        requested: requested.to_vec(),
        input_elements: None,
        reason,
    };
    let dims = static_dims(input.logical_shape()).map_err(|failure| match failure {
        InferenceFailure::NegativeDimension { axis, value } => {
            unresolved(InferenceFailure::UnresolvedInputDim { axis, value })
        }
        other => unresolved(other),
    })?;
    checked_element_count_or_error(&dims, || unresolved(InferenceFailure::Overflow))
}

/// Lowers `view_copy` to a single `RESHAPE`.
///
/// Inputs are the data tensor and the shape-spec tensor. The requested shape is
/// the shape-spec's declared values when traced, else the output's logical
/// shape; it is always mapped through the output's dimension order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewVisitor {
    options: LoweringOptions,
}

impl ViewVisitor {
    pub fn new(options: LoweringOptions) -> Self {
        Self { options }
    }
}

impl NodeVisitor for ViewVisitor {
    fn target(&self) -> &'static str {
        VIEW_COPY_TARGET
    }

    fn define_node(
        &self,
        node: &Node,
        program: &mut ProgramBuilder,
        inputs: &[ValueDescriptor],
        output: &ValueDescriptor,
    ) -> LoweringResult<()> {
        let [data, shape_spec] = inputs else {
            return Err(LoweringError::malformed(
                node,
                format!(
                    "view expects exactly a data and a shape operand, got {} inputs",
                    inputs.len()
                ),
            ));
        };
        if self.options.check_layout_consistency {
            check_layout_consistency(data, output)?;
        }

        let requested = shape_spec.special().unwrap_or(output.logical_shape());
        let new_shape = lower_reshape_to(data, requested, output.dim_order())?;
        tracing::debug!(
            input = data.name(),
            output = output.name(),
            dtype = ?data.dtype(),
            ?new_shape,
            "lowered view"
        );
        emit(
            program,
            TosaOp::Reshape,
            data.name(),
            output.name(),
            Attribute::Reshape(ReshapeAttribute::new(new_shape)),
        )
    }
}

// Orders are only comparable when the view keeps the rank.
fn check_layout_consistency(
    input: &ValueDescriptor,
    output: &ValueDescriptor,
) -> LoweringResult<()> {
    input.dim_order().validate(input.rank())?;
    if input.rank() == output.rank() && input.dim_order() != output.dim_order() {
        return Err(LoweringError::LayoutMismatch {
            input: input.dim_order().as_slice().to_vec(),
            output: output.dim_order().as_slice().to_vec(),
        });
    }
    Ok(())
}
