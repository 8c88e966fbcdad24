//! # vidsync-core
//!
//! Keeps one logical media player consistent across independent peers.
//!
//! Exactly one peer owns the replicated [`PlaybackRecord`](vidsync_model::PlaybackRecord)
//! and decides what plays and when; every other peer derives its local
//! playback from that record plus a shared network clock.
//!
//! ## Architecture
//!
//! - [`machine`]: the pure [`PlaybackMachine`](machine::PlaybackMachine). One
//!   transition per external event, each returning a list of effects.
//! - [`store`]: the local copy of the record. Edits require an
//!   [`OwnershipToken`](store::OwnershipToken).
//! - [`access`]: control gating for user requests.
//! - [`schedule`]: deferred retries, plays and local stops keyed by fire time.
//! - [`player`]: [`SyncPlayer`](player::SyncPlayer), the driver that feeds
//!   events into the machine and applies its effects to the backend, the
//!   transport and the presentation sinks.
//! - [`timecode`]: start offsets embedded in video-sharing links.
//! - [`loopback`]: in-memory collaborators for multi-peer sessions in one process.
//!
//! ## Example
//!
//! ```
//! use vidsync_core::loopback::LoopbackSession;
//! use vidsync_core::prelude::*;
//!
//! let mut session = LoopbackSession::new(&PlayerConfig::default(), 2, 600.0);
//! session.start();
//! session
//!     .peer_mut(0)
//!     .player
//!     .request_play("https://youtu.be/abc?t=30")
//!     .unwrap();
//! session.step(0.1);
//! session.step(0.1);
//!
//! assert_eq!(session.peer(1).player.state(), PlayerState::Playing);
//! assert!(session.peer(0).backend.position() >= 30.0);
//! ```

#![allow(missing_docs)]

pub mod access;
pub mod error;
pub mod loopback;
pub mod machine;
pub mod player;
pub mod schedule;
pub mod store;
pub mod timecode;

pub use error::{Result, SyncError};
pub use player::SyncPlayer;

pub mod prelude {
    pub use crate::access::{ControlAction, ControlGate};
    pub use crate::error::{Result, SyncError};
    pub use crate::machine::{Phase, SinkEvent};
    pub use crate::player::SyncPlayer;
    pub use crate::timecode::{parse_start_offset, start_offset};
    pub use vidsync_contracts::prelude::*;
    pub use vidsync_model::prelude::*;
}
