//! Flow definition and validation.
//!
//! [`spec`] holds the authored wire types; [`graph`] validates them into an
//! immutable [`FlowGraph`] the session runner walks.

pub mod graph;
pub mod spec;


pub use graph::{FlowGraph, FlowIntegrityError};
pub use spec::{
    EdgeKind, EdgeSpec, FlowDocument, HttpMethod, InputKind, NodeId, NodeLayout, NodePayload,
    NodeSpec, Point, Size,
};
