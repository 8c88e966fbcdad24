use vidsync_model::PeerIdentity;

/// Answers "may this caller take control now?".
///
/// When no policy is installed the player falls back to: privileged role, or
/// record unlocked.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait AccessPolicy: Send + Sync {
    fn has_control_access(&self, caller: &PeerIdentity) -> bool;
}
