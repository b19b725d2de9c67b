//! Shared enums for planning and reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which store a run brings into line with the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncDirection {
    /// Platform roles are copied into directory teams.
    PlatformToDirectory,
    /// Directory teams are copied onto platform roles.
    DirectoryToPlatform,
    /// Both of the above, planned from one snapshot.
    Both,
}

impl SyncDirection {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::PlatformToDirectory => "platform-to-directory",
            SyncDirection::DirectoryToPlatform => "directory-to-platform",
            SyncDirection::Both => "both",
        }
    }

    /// One-way directions this direction is made of, in execution order.
    #[must_use]
    pub fn legs(&self) -> &'static [SyncDirection] {
        match self {
            SyncDirection::PlatformToDirectory => &[SyncDirection::PlatformToDirectory],
            SyncDirection::DirectoryToPlatform => &[SyncDirection::DirectoryToPlatform],
            SyncDirection::Both => &[
                SyncDirection::DirectoryToPlatform,
                SyncDirection::PlatformToDirectory,
            ],
        }
    }

    /// Whether platform memberships may be written.
    #[must_use]
    pub fn writes_platform(&self) -> bool {
        matches!(
            self,
            SyncDirection::DirectoryToPlatform | SyncDirection::Both
        )
    }

    /// Whether directory memberships may be written.
    #[must_use]
    pub fn writes_directory(&self) -> bool {
        matches!(
            self,
            SyncDirection::PlatformToDirectory | SyncDirection::Both
        )
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SyncDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "platform-to-directory" | "p2d" => Ok(SyncDirection::PlatformToDirectory),
            "directory-to-platform" | "d2p" => Ok(SyncDirection::DirectoryToPlatform),
            "both" => Ok(SyncDirection::Both),
            _ => Err(format!("Unknown sync direction: {s}")),
        }
    }
}

/// How conflicting memberships are settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Memberships are only ever added.
    #[default]
    Union,
    /// The source side's set becomes authoritative for the target side.
    Overwrite,
}

impl MergePolicy {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Union => "union",
            MergePolicy::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "union" => Ok(MergePolicy::Union),
            "overwrite" => Ok(MergePolicy::Overwrite),
            _ => Err(format!("Unknown merge policy: {s}")),
        }
    }
}

/// Kind of membership mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipAction {
    Add,
    Remove,
}

impl MembershipAction {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipAction::Add => "add",
            MembershipAction::Remove => "remove",
        }
    }
}

impl fmt::Display for MembershipAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to one planned operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The store now holds the requested state.
    Applied,
    /// Excluded by the authority filter before dispatch.
    Skipped,
    /// The store rejected the mutation.
    Failed,
    /// Dry run; nothing was sent.
    Planned,
}

impl OutcomeStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Applied => "applied",
            OutcomeStatus::Skipped => "skipped",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Planned => "planned",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of a single sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    ResolvingIdentity,
    FetchingMembership,
    Planning,
    Applying,
    Done,
    Failed,
}

impl SyncState {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::ResolvingIdentity => "resolving_identity",
            SyncState::FetchingMembership => "fetching_membership",
            SyncState::Planning => "planning",
            SyncState::Applying => "applying",
            SyncState::Done => "done",
            SyncState::Failed => "failed",
        }
    }

    /// Check if the run has ended.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Done | SyncState::Failed)
    }

    /// Check if the run may fail from this state. Planning and applying
    /// only ever add entries to the report.
    #[must_use]
    pub fn can_fail(&self) -> bool {
        matches!(
            self,
            SyncState::ResolvingIdentity | SyncState::FetchingMembership
        )
    }

    /// Check if moving to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: SyncState) -> bool {
        match (self, next) {
            (SyncState::ResolvingIdentity, SyncState::FetchingMembership)
            | (SyncState::FetchingMembership, SyncState::Planning)
            | (SyncState::Planning, SyncState::Applying)
            | (SyncState::Applying, SyncState::Done) => true,
            (from, SyncState::Failed) => from.can_fail(),
            _ => false,
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_happy_path() {
        let path = [
            SyncState::ResolvingIdentity,
            SyncState::FetchingMembership,
            SyncState::Planning,
            SyncState::Applying,
            SyncState::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(SyncState::Done.is_terminal());
    }

    #[test]
    fn test_state_failure_only_early() {
        assert!(SyncState::ResolvingIdentity.can_transition_to(SyncState::Failed));
        assert!(SyncState::FetchingMembership.can_transition_to(SyncState::Failed));
        assert!(!SyncState::Planning.can_transition_to(SyncState::Failed));
        assert!(!SyncState::Applying.can_transition_to(SyncState::Failed));
        assert!(!SyncState::Done.can_transition_to(SyncState::Failed));
    }

    #[test]
    fn test_state_rejects_skips_and_rewinds() {
        assert!(!SyncState::ResolvingIdentity.can_transition_to(SyncState::Planning));
        assert!(!SyncState::Done.can_transition_to(SyncState::ResolvingIdentity));
        assert!(!SyncState::Failed.can_transition_to(SyncState::Done));
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(
            "platform-to-directory".parse::<SyncDirection>().unwrap(),
            SyncDirection::PlatformToDirectory
        );
        assert_eq!(
            "DIRECTORY_TO_PLATFORM".parse::<SyncDirection>().unwrap(),
            SyncDirection::DirectoryToPlatform
        );
        assert_eq!("both".parse::<SyncDirection>().unwrap(), SyncDirection::Both);
        assert!("sideways".parse::<SyncDirection>().is_err());
    }

    #[test]
    fn test_direction_sides() {
        assert!(SyncDirection::DirectoryToPlatform.writes_platform());
        assert!(!SyncDirection::DirectoryToPlatform.writes_directory());
        assert!(SyncDirection::PlatformToDirectory.writes_directory());
        assert!(!SyncDirection::PlatformToDirectory.writes_platform());
        assert!(SyncDirection::Both.writes_platform() && SyncDirection::Both.writes_directory());
        assert_eq!(SyncDirection::Both.legs().len(), 2);
    }

    #[test]
    fn test_merge_policy_default_is_union() {
        assert_eq!(MergePolicy::default(), MergePolicy::Union);
        assert_eq!("Overwrite".parse::<MergePolicy>().unwrap(), MergePolicy::Overwrite);
        assert!("merge".parse::<MergePolicy>().is_err());
    }

    #[test]
    fn test_direction_serde_is_kebab_case() {
        let json = serde_json::to_string(&SyncDirection::PlatformToDirectory).unwrap();
        assert_eq!(json, "\"platform-to-directory\"");
    }
}
