/// Pairing of a node and the cursor marking its position in the collection.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Edge<N> {
    pub cursor: String,
    pub node: N,
}

impl<N> Edge<N> {
    pub fn new(node: N, cursor: String) -> Self {
        Edge { cursor, node }
    }
}

/// Common trait for Relay edges. Will be implemented by the codegen.
pub trait RelayEdge: From<Edge<Self::NodeType>> {
    /// The underlying type of Node. Will be filled in for you by the codegen.
    type NodeType;

    /// Builds the edge from a node and an already encoded cursor.
    fn new(node: Self::NodeType, cursor: String) -> Self;
}
