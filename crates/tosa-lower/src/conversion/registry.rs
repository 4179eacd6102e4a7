use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::graph::Node;
use crate::spec::ProgramBuilder;

use super::{LoweringError, LoweringOptions, LoweringResult, NodeVisitor, ViewVisitor};

/// Dispatch table from operator identifier to visitor.
///
/// Built once at startup and read-only afterwards, so a table can be shared
/// across threads lowering independent programs.
#[derive(Clone, Default)]
pub struct VisitorTable {
    visitors: HashMap<&'static str, Arc<dyn NodeVisitor>>,
}

impl VisitorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every visitor this crate provides.
    pub fn with_default_visitors(options: LoweringOptions) -> Self {
        Self::new().with(ViewVisitor::new(options))
    }

    pub fn with<V: NodeVisitor + 'static>(mut self, visitor: V) -> Self {
        self.register(Arc::new(visitor));
        self
    }

    /// Inserts `visitor`, returning the one it replaced for the same target.
    pub fn register(&mut self, visitor: Arc<dyn NodeVisitor>) -> Option<Arc<dyn NodeVisitor>> {
        self.visitors.insert(visitor.target(), visitor)
    }

    pub fn get(&self, target: &str) -> Option<&Arc<dyn NodeVisitor>> {
        self.visitors.get(target)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.visitors.contains_key(target)
    }

    pub fn targets(&self) -> Vec<&'static str> {
        let mut targets: Vec<&'static str> = self.visitors.keys().copied().collect();
        targets.sort_unstable();
        targets
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(node = %node.name, target = %node.target)
    )]
    pub fn lower_node(&self, node: &Node, program: &mut ProgramBuilder) -> LoweringResult<()> {
        let visitor = self
            .get(&node.target)
            .ok_or_else(|| LoweringError::UnsupportedOperator {
                target: node.target.clone(),
            })?;
        visitor.lower(node, program)
    }
}

impl fmt::Debug for VisitorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisitorTable")
            .field("targets", &self.targets())
            .finish()
    }
}
