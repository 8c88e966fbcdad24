//! Trait surfaces for the external collaborators of a synchronized player.
//!
//! The core drives a [`MediaBackend`](backend::MediaBackend), replicates its
//! record through a [`ReplicationTransport`](replication::ReplicationTransport),
//! reads time from a [`SessionClock`](clock::SessionClock), optionally consults an
//! [`AccessPolicy`](access::AccessPolicy) and notifies
//! [`PresentationSink`](presentation::PresentationSink)s. None of these contain
//! synchronization logic of their own.

pub mod access;
pub mod backend;
pub mod clock;
pub mod presentation;
pub mod replication;

/// Frequently used contracts for the core and tooling crates.
pub mod prelude {
    pub use super::access::AccessPolicy;
    pub use super::backend::{BackendCommand, BackendEvent, MediaBackend};
    pub use super::clock::SessionClock;
    pub use super::presentation::PresentationSink;
    pub use super::replication::{ReplicationTransport, TransportError};
}
