//! Flow validation and the loaded, immutable graph.
//!
//! [`FlowGraph::load`] checks every structural invariant once, up front, and
//! builds an arena of nodes plus adjacency maps so stepping through the graph
//! never re-scans the authored lists. A loaded graph is read-only: authoring
//! changes produce a new graph, so running sessions are isolated from
//! concurrent edits to the same flow definition.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::spec::{EdgeKind, FlowDocument, NodeId, NodeSpec};

/// Load-time structural failures. All are fatal: the flow is rejected before
/// any session can start against it.
#[derive(Debug, Error, Diagnostic)]
pub enum FlowIntegrityError {
    #[error("flow has no nodes")]
    #[diagnostic(code(convoflow::flow::empty))]
    Empty,

    #[error("duplicate node id: {id}")]
    #[diagnostic(
        code(convoflow::flow::duplicate_node),
        help("node ids must be unique within a flow")
    )]
    DuplicateNodeId { id: NodeId },

    #[error("edge {source_node} -> {target} references missing node {missing}")]
    #[diagnostic(code(convoflow::flow::dangling_edge))]
    DanglingEdge {
        source_node: NodeId,
        target: NodeId,
        missing: NodeId,
    },

    #[error("node {id} has more than one outgoing primary edge")]
    #[diagnostic(code(convoflow::flow::multiple_primary_edges))]
    MultiplePrimaryEdges { id: NodeId },

    #[error("condition node {id} has more than one else edge")]
    #[diagnostic(code(convoflow::flow::multiple_else_edges))]
    MultipleElseEdges { id: NodeId },

    #[error("node {id} cannot branch but has an else edge")]
    #[diagnostic(
        code(convoflow::flow::else_from_non_branching),
        help(
            "only condition nodes (false branch) and transport nodes \
             (failure fallback) accept an else edge"
        )
    )]
    ElseFromNonBranching { id: NodeId },

    #[error("flow has no entry node (every node has an incoming edge)")]
    #[diagnostic(
        code(convoflow::flow::missing_entry),
        help("exactly one node must have no incoming edges")
    )]
    MissingEntry,

    #[error("flow entry is ambiguous: {candidates:?} all lack incoming edges")]
    #[diagnostic(
        code(convoflow::flow::ambiguous_entry),
        help("the authoring tool must connect all but one root node")
    )]
    AmbiguousEntry { candidates: Vec<NodeId> },
}

/// A validated, immutable flow graph.
#[derive(Debug)]
pub struct FlowGraph {
    nodes: FxHashMap<NodeId, NodeSpec>,
    primary: FxHashMap<NodeId, NodeId>,
    alternate: FxHashMap<NodeId, NodeId>,
    entry: NodeId,
}

impl FlowGraph {
    /// Validates `doc` and builds the executable graph.
    pub fn load(doc: FlowDocument) -> Result<Self, FlowIntegrityError> {
        if doc.nodes.is_empty() {
            return Err(FlowIntegrityError::Empty);
        }

        let mut nodes: FxHashMap<NodeId, NodeSpec> = FxHashMap::default();
        // Preserve authored order for deterministic entry diagnostics.
        let mut order: Vec<NodeId> = Vec::with_capacity(doc.nodes.len());
        for node in doc.nodes {
            let id = node.id.clone();
            if nodes.insert(id.clone(), node).is_some() {
                return Err(FlowIntegrityError::DuplicateNodeId { id });
            }
            order.push(id);
        }

        let mut primary: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut alternate: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut has_incoming: FxHashSet<NodeId> = FxHashSet::default();

        for edge in doc.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !nodes.contains_key(endpoint) {
                    return Err(FlowIntegrityError::DanglingEdge {
                        source_node: edge.source.clone(),
                        target: edge.target.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
            match edge.kind {
                EdgeKind::Primary => {
                    if primary.insert(edge.source.clone(), edge.target.clone()).is_some() {
                        return Err(FlowIntegrityError::MultiplePrimaryEdges { id: edge.source });
                    }
                }
                EdgeKind::Else => {
                    let source = &nodes[&edge.source];
                    if !source.payload.may_branch() {
                        return Err(FlowIntegrityError::ElseFromNonBranching { id: edge.source });
                    }
                    if alternate.insert(edge.source.clone(), edge.target.clone()).is_some() {
                        return Err(FlowIntegrityError::MultipleElseEdges { id: edge.source });
                    }
                }
            }
            has_incoming.insert(edge.target);
        }

        let mut roots: Vec<NodeId> = order
            .iter()
            .filter(|id| !has_incoming.contains(*id))
            .cloned()
            .collect();
        let entry = match roots.len() {
            0 => return Err(FlowIntegrityError::MissingEntry),
            1 => roots.remove(0),
            _ => return Err(FlowIntegrityError::AmbiguousEntry { candidates: roots }),
        };

        Ok(Self {
            nodes,
            primary,
            alternate,
            entry,
        })
    }

    /// The unique node with no incoming edges; execution starts here.
    #[must_use]
    pub fn entry(&self) -> &NodeSpec {
        &self.nodes[&self.entry]
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeSpec> {
        self.nodes.get(id)
    }

    /// The target of `id`'s primary edge; `None` terminates that branch.
    #[must_use]
    pub fn primary_target(&self, id: &NodeId) -> Option<&NodeId> {
        self.primary.get(id)
    }

    /// The target of a condition node's else (false) edge; `None` means the
    /// false branch terminates the session normally.
    #[must_use]
    pub fn else_target(&self, id: &NodeId) -> Option<&NodeId> {
        self.alternate.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
