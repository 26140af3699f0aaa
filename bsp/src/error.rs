use pvs::PvsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BspError {
    #[error("Could not parse level file: {0}")]
    Parse(String),
    #[error("Level has no leaves")]
    NoLeaves,
    #[error("Node {node} refers to {kind} {index}, but there are only {count}")]
    IndexOutOfRange {
        node: usize,
        kind: &'static str,
        index: usize,
        count: usize,
    },
    /// Child nodes must come after their parent, this keeps the tree free of
    /// cycles
    #[error("Node {node} has node {child} as a child")]
    NotATree { node: usize, child: usize },
    #[error("Leaf {leaf} refers to face {face}, but there are only {count}")]
    FaceOutOfRange {
        leaf: usize,
        face: usize,
        count: usize,
    },
    #[error(transparent)]
    Region(#[from] PvsError),
    #[error("Invalid PVS file format")]
    InvalidFormat,
    #[error("PVS file holds {words} words, {leaves} leaves need {expected}")]
    SizeMismatch {
        leaves: usize,
        words: usize,
        expected: usize,
    },
    #[error("PVS file is {found} bytes long, its header needs {expected}")]
    Truncated { expected: u64, found: u64 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
