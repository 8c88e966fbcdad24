//! Control gating for user-initiated requests.

use std::{fmt, sync::Arc};

use vidsync_contracts::access::AccessPolicy;
use vidsync_model::{PeerIdentity, PlaybackRecord};

use crate::error::{Result, SyncError};

/// User-initiated operations subject to control checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    /// Play a new URL.
    Play,
    /// Play the replicated or configured URL again.
    Replay,
    Stop,
    Seek,
    Lock,
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ControlAction::Play => "play",
            ControlAction::Replay => "replay",
            ControlAction::Stop => "stop",
            ControlAction::Seek => "seek",
            ControlAction::Lock => "lock",
        };
        f.write_str(label)
    }
}

/// Decides whether the local peer may act on the player.
#[derive(Clone)]
pub struct ControlGate {
    identity: PeerIdentity,
    policy: Option<Arc<dyn AccessPolicy>>,
}

impl fmt::Debug for ControlGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = self
            .policy
            .as_ref()
            .map(|policy| std::any::type_name_of_val(policy.as_ref()));
        f.debug_struct("ControlGate")
            .field("identity", &self.identity)
            .field("policy", &policy)
            .finish()
    }
}

impl ControlGate {
    pub fn new(identity: PeerIdentity) -> Self {
        Self {
            identity,
            policy: None,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn identity(&self) -> &PeerIdentity {
        &self.identity
    }

    /// An installed policy decides alone. Without one, privileged peers and
    /// anyone on an unlocked record may take control.
    pub fn can_take_control(&self, record: &PlaybackRecord) -> bool {
        match &self.policy {
            Some(policy) => policy.has_control_access(&self.identity),
            None => self.identity.is_privileged() || !record.locked,
        }
    }

    /// Check `action` against the current record.
    ///
    /// The owner may do anything, lock or not. Otherwise play, replay and
    /// locking need control, while stop and seek are also open to anyone on
    /// an unlocked record.
    pub fn authorize(
        &self,
        action: ControlAction,
        is_owner: bool,
        record: &PlaybackRecord,
    ) -> Result<()> {
        let can_control = self.can_take_control(record);
        let allowed = is_owner
            || match action {
                ControlAction::Play | ControlAction::Replay | ControlAction::Lock => {
                    can_control
                }
                ControlAction::Stop | ControlAction::Seek => {
                    !record.locked || can_control
                }
            };

        if allowed {
            Ok(())
        } else {
            Err(SyncError::ControlDenied { action })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidsync_contracts::access::MockAccessPolicy;
    use vidsync_model::{PeerId, PeerRole};

    fn record(locked: bool) -> PlaybackRecord {
        PlaybackRecord {
            locked,
            ..PlaybackRecord::default()
        }
    }

    fn guest() -> ControlGate {
        ControlGate::new(PeerIdentity::guest(PeerId::new()))
    }

    #[test]
    fn guest_controls_unlocked_record() {
        let gate = guest();
        let unlocked = record(false);

        assert!(gate.can_take_control(&unlocked));
        assert!(gate.authorize(ControlAction::Play, false, &unlocked).is_ok());
        assert!(gate.authorize(ControlAction::Seek, false, &unlocked).is_ok());
        assert!(gate.authorize(ControlAction::Lock, false, &unlocked).is_ok());
    }

    #[test]
    fn guest_is_denied_on_locked_record() {
        let gate = guest();
        let locked = record(true);

        for action in [
            ControlAction::Play,
            ControlAction::Stop,
            ControlAction::Seek,
            ControlAction::Lock,
        ] {
            let err = gate.authorize(action, false, &locked).unwrap_err();
            assert!(matches!(err, SyncError::ControlDenied { action: a } if a == action));
        }
    }

    #[test]
    fn owner_keeps_authority_on_locked_record() {
        let gate = guest();
        let locked = record(true);

        assert!(!gate.can_take_control(&locked));
        for action in [
            ControlAction::Play,
            ControlAction::Replay,
            ControlAction::Stop,
            ControlAction::Seek,
            ControlAction::Lock,
        ] {
            assert!(gate.authorize(action, true, &locked).is_ok(), "{action}");
        }
    }

    #[test]
    fn owner_may_replay_on_locked_record() {
        let gate = guest();
        assert!(gate.authorize(ControlAction::Replay, true, &record(true)).is_ok());
        assert!(gate.authorize(ControlAction::Replay, false, &record(true)).is_err());
        assert!(gate.authorize(ControlAction::Replay, false, &record(false)).is_ok());
    }

    #[test]
    fn moderator_bypasses_lock() {
        let gate =
            ControlGate::new(PeerIdentity::new(PeerId::new(), PeerRole::Moderator));
        let locked = record(true);

        assert!(gate.can_take_control(&locked));
        assert!(gate.authorize(ControlAction::Play, false, &locked).is_ok());
        assert!(gate.authorize(ControlAction::Lock, false, &locked).is_ok());
    }

    #[test]
    fn policy_overrides_role_and_lock() {
        let mut policy = MockAccessPolicy::new();
        policy.expect_has_control_access().return_const(false);
        let gate = ControlGate::new(PeerIdentity::new(PeerId::new(), PeerRole::Host))
            .with_policy(Arc::new(policy));
        let unlocked = record(false);

        assert!(!gate.can_take_control(&unlocked));
        // Stop stays open on an unlocked record regardless of control.
        assert!(gate.authorize(ControlAction::Stop, false, &unlocked).is_ok());
        assert!(gate.authorize(ControlAction::Play, false, &unlocked).is_err());
        assert!(gate.authorize(ControlAction::Play, true, &unlocked).is_ok());
    }

    #[test]
    fn denial_message_names_the_action() {
        let err = guest()
            .authorize(ControlAction::Seek, false, &record(true))
            .unwrap_err();
        assert_eq!(err.to_string(), "control denied for seek");
    }
}
