pub mod bits;
pub mod lz;
pub mod scan;


/// Error types for parlz operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParlzError {
    /// Input arrays are inconsistent (the LPF and source arrays must have
    /// the same length).
    InvalidInput,
    /// The requested worker thread pool could not be built.
    ThreadPool,
}

impl std::fmt::Display for ParlzError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid input"),
            Self::ThreadPool => write!(f, "worker thread pool could not be built"),
        }
    }
}

impl std::error::Error for ParlzError {}

pub type ParlzResult<T> = Result<T, ParlzError>;
