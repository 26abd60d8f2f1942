//! Registry error types

use std::fmt;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Registry already holds `capacity` subscribers
    CapacityExceeded { capacity: usize },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::CapacityExceeded { capacity } => {
                write!(f, "Capacity exceeded: {} clients connected", capacity)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// A refused admission
///
/// Hands the transport back so the caller can still answer the peer.
pub struct Rejected<T> {
    /// The transport that was not admitted
    pub transport: T,
    /// Why it was refused
    pub error: RegistryError,
}

impl<T> Rejected<T> {
    /// Take the transport back
    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Admission rejected: {}", self.error)
    }
}
