pub mod coordinator;
#[cfg(feature = "github")]
pub mod github;
pub mod memory;
pub mod types;

pub use coordinator::DeliveryCoordinator;
#[cfg(feature = "github")]
pub use github::GitHubTransport;
pub use memory::MemoryTransport;
pub use types::{
    CoordinatorOptions, DeliveryFailure, DeliveryOutcome, DeliveryProgress,
    DeliveryProgressCallback, DeliveryResult, TokenTransport, TransportError, TransportErrorKind,
    TransportResponse, DISPATCH_ACCEPTED,
};
