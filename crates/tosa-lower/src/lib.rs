//! Lowering of shape-changing graph operators into a TOSA-style program.

pub mod conversion;
mod env;
pub mod graph;
pub mod layout;
pub mod shape_helpers;
pub mod spec;

pub use conversion::{
    lower_graph, lower_reshape, LoweringError, LoweringOptions, LoweringResult, NodeVisitor,
    VisitorTable,
};
pub use graph::{Graph, Node, ValueDescriptor};
pub use layout::{map_shape, DimOrder};
pub use spec::{DType, Program, ProgramBuilder, ProgramFormat};
