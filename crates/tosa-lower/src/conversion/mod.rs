//! Graph-to-program lowering.
//!
//! Each operator kind is handled by a stateless [`NodeVisitor`]. Visitors are
//! collected in an explicitly constructed [`VisitorTable`], and [`lower_graph`]
//! drives a whole traced graph through it.

mod registry;
mod view;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{Graph, Node, ValueDescriptor};
use crate::layout::LayoutError;
use crate::shape_helpers::InferenceFailure;
use crate::spec::{Attribute, Program, ProgramBuilder, ProgramError, TosaOp};

pub use registry::VisitorTable;
pub use view::{lower_reshape, lower_reshape_to, ViewVisitor, VIEW_COPY_TARGET};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoweringError {
    #[error("invalid layout: {0}")]
    InvalidLayout(#[from] LayoutError),
    #[error("input dimension order {input:?} does not match output dimension order {output:?}")]
    LayoutMismatch {
        input: Vec<usize>,
        output: Vec<usize>,
    },
    /// `input_elements` is `None` when the input's own shape is not static.
    #[error("cannot resolve shape {requested:?} against input '{input}': {reason}")]
    ShapeInference {
        input: String,
        requested: Vec<i64>,
        input_elements: Option<usize>,
        reason: InferenceFailure,
    },
    #[error("reshape to {shape:?} holds {actual} elements, input holds {expected}")]
    ElementCountMismatch {
        expected: usize,
        actual: usize,
        shape: Vec<usize>,
    },
    #[error("program rejected instruction: {0}")]
    Serialization(#[from] ProgramError),
    #[error("no visitor registered for operator '{target}'")]
    UnsupportedOperator { target: String },
    #[error("node '{node}' is malformed: {reason}")]
    MalformedNode { node: String, reason: String },
    #[error("failed to lower node '{node}' ({target}): {source}")]
    Node {
        node: String,
        target: String,
        #[source]
        source: Box<LoweringError>,
    },
}

impl LoweringError {
    pub fn malformed(node: &Node, reason: impl Into<String>) -> Self {
        LoweringError::MalformedNode {
            node: node.name.clone(),
            reason: reason.into(),
        }
    }

    /// Attaches the failing node's identity.
    pub fn in_node(self, node: &Node) -> Self {
        LoweringError::Node {
            node: node.name.clone(),
            target: node.target.clone(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping node context.
    pub fn root_cause(&self) -> &LoweringError {
        match self {
            LoweringError::Node { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type LoweringResult<T> = Result<T, LoweringError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoweringOptions {
    /// Require equal-rank inputs and outputs to share a dimension order.
    #[serde(default)]
    pub check_layout_consistency: bool,
}

impl LoweringOptions {
    /// Defaults overlaid with `TOSA_LOWER_STRICT_LAYOUT`.
    pub fn from_env() -> Self {
        Self {
            check_layout_consistency: crate::env::strict_layout_enabled(),
        }
    }

    pub fn with_layout_consistency(mut self, enabled: bool) -> Self {
        self.check_layout_consistency = enabled;
        self
    }
}

/// Lowers one operator kind into target instructions.
pub trait NodeVisitor: Send + Sync {
    /// Operator identifier this visitor handles.
    fn target(&self) -> &'static str;

    fn define_node(
        &self,
        node: &Node,
        program: &mut ProgramBuilder,
        inputs: &[ValueDescriptor],
        output: &ValueDescriptor,
    ) -> LoweringResult<()>;

    fn lower(&self, node: &Node, program: &mut ProgramBuilder) -> LoweringResult<()> {
        self.define_node(node, program, &node.inputs, &node.output)
    }
}

/// Appends a single-input, single-output instruction.
pub fn emit(
    program: &mut ProgramBuilder,
    op: TosaOp,
    input_name: &str,
    output_name: &str,
    attribute: Attribute,
) -> LoweringResult<()> {
    program.add_instruction(
        op,
        vec![input_name.to_string()],
        vec![output_name.to_string()],
        attribute,
    )?;
    tracing::trace!(%op, input = input_name, output = output_name, "emitted instruction");
    Ok(())
}

/// Lowers every node of `graph` in order into a fresh program.
///
/// Stops at the first failing node and reports it with the node's identity.
pub fn lower_graph(graph: &Graph, table: &VisitorTable) -> LoweringResult<Program> {
    let mut builder = ProgramBuilder::new();
    for name in &graph.inputs {
        builder.declare_input(name.clone())?;
    }
    for node in &graph.nodes {
        table
            .lower_node(node, &mut builder)
            .map_err(|err| err.in_node(node))?;
    }
    let program = builder.finish();
    tracing::debug!(
        inputs = program.inputs.len(),
        instructions = program.instructions.len(),
        "lowered graph"
    );
    Ok(program)
}
