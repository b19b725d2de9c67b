//! Cross-system identity pairs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{DirectoryMemberId, DirectoryTeamId, ParseIdError, PlatformRoleId, PlatformUserId};

/// Which half of an identity pair a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// Organizational directory.
    Directory,
    /// Chat platform.
    Platform,
}

impl IdentityKind {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::Directory => "directory",
            IdentityKind::Platform => "platform",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A member reference where exactly one half is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MemberRef {
    /// Known by directory record ID.
    Directory(DirectoryMemberId),
    /// Known by chat platform user ID.
    Platform(PlatformUserId),
}

impl MemberRef {
    /// Which half is known.
    #[must_use]
    pub fn kind(&self) -> IdentityKind {
        match self {
            MemberRef::Directory(_) => IdentityKind::Directory,
            MemberRef::Platform(_) => IdentityKind::Platform,
        }
    }

    /// Parse an identifier whose kind is not stated.
    ///
    /// Anything that parses as a UUID is taken to be a directory ID; platform
    /// IDs are never UUIDs.
    pub fn parse_auto(value: &str) -> Result<Self, ParseIdError> {
        match value.parse::<DirectoryMemberId>() {
            Ok(id) => Ok(MemberRef::Directory(id)),
            Err(_) => value.parse::<PlatformUserId>().map(MemberRef::Platform),
        }
    }

    /// Parse an identifier of a stated kind.
    pub fn parse_as(kind: IdentityKind, value: &str) -> Result<Self, ParseIdError> {
        match kind {
            IdentityKind::Directory => value.parse().map(MemberRef::Directory),
            IdentityKind::Platform => value.parse().map(MemberRef::Platform),
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRef::Directory(id) => write!(f, "directory:{id}"),
            MemberRef::Platform(id) => write!(f, "platform:{id}"),
        }
    }
}

/// A member resolved on both sides.
///
/// Constructed by identity resolution and left untouched for the rest of a
/// reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberIdentity {
    directory_id: DirectoryMemberId,
    platform_id: PlatformUserId,
}

impl MemberIdentity {
    /// Pair up both halves.
    #[must_use]
    pub fn new(directory_id: DirectoryMemberId, platform_id: PlatformUserId) -> Self {
        Self {
            directory_id,
            platform_id,
        }
    }

    /// Directory half.
    #[must_use]
    pub fn directory_id(&self) -> DirectoryMemberId {
        self.directory_id
    }

    /// Platform half.
    #[must_use]
    pub fn platform_id(&self) -> &PlatformUserId {
        &self.platform_id
    }
}

impl fmt::Display for MemberIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.directory_id, self.platform_id)
    }
}

/// A team in the directory together with the platform role mirroring it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamIdentity {
    /// Directory team.
    pub team_id: DirectoryTeamId,
    /// Platform role configured for the team.
    pub role_id: PlatformRoleId,
}

impl TeamIdentity {
    /// Create a new team/role pair.
    #[must_use]
    pub fn new(team_id: DirectoryTeamId, role_id: PlatformRoleId) -> Self {
        Self { team_id, role_id }
    }
}

impl fmt::Display for TeamIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {} / role {}", self.team_id, self.role_id)
    }
}
