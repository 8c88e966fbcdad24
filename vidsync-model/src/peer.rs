use uuid::Uuid;

/// Strongly typed ID for a peer participating in a session
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerId(pub Uuid);

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerId {
    pub fn new() -> Self {
        PeerId(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for PeerId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session role of a peer, independent of record ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PeerRole {
    #[default]
    Guest,
    Moderator,
    /// The peer that created the session.
    Host,
}

/// Who is asking to control the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerIdentity {
    pub id: PeerId,
    pub role: PeerRole,
}

impl PeerIdentity {
    pub fn new(id: PeerId, role: PeerRole) -> Self {
        Self { id, role }
    }

    pub fn guest(id: PeerId) -> Self {
        Self::new(id, PeerRole::Guest)
    }

    /// Hosts and moderators may take control of a locked player.
    pub fn is_privileged(&self) -> bool {
        matches!(self.role, PeerRole::Host | PeerRole::Moderator)
    }
}
