use foundation::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The catalog reported an error in place of a node.
    Spec { node: NodeId, message: String },
    DuplicateId(NodeId),
    Parse(String),
    State(String),
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeError::Spec { node, message } => {
                write!(f, "tree spec error at node {node}: {message}")
            }
            TreeError::DuplicateId(id) => write!(f, "duplicate node id: {id}"),
            TreeError::Parse(msg) => write!(f, "tree spec parse error: {msg}"),
            TreeError::State(msg) => write!(f, "tree state parse error: {msg}"),
        }
    }
}

impl std::error::Error for TreeError {}
