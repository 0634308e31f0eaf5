use serde::{Deserialize, Serialize};

/// Collaboration whose administrators are administrators of the whole platform.
pub const ADMIN_COLLABORATION: &str = "neuromorphic-platform-admin";

const TEAM_PREFIX: &str = "collab-";
const PRIVATE_PREFIX: &str = "private-";

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Editor,
    Administrator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Editor, Role::Administrator];
    pub const EDITORS: [Role; 2] = [Role::Editor, Role::Administrator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Administrator => "administrator",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "administrator" => Ok(Role::Administrator),
            _ => crate::common::error::validation_error(format!("Unknown role '{s}'")),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Membership {
    pub collaboration: String,
    pub role: Role,
}

impl Membership {
    pub fn new<T: Into<String>>(collaboration: T, role: Role) -> Self {
        Self {
            collaboration: collaboration.into(),
            role,
        }
    }

    /// Parses a directory team name of the form `collab-<collaboration>-<role>`.
    ///
    /// Collaboration names may contain `-`, so the role is the last token and the
    /// collaboration is everything between the prefix and that token.
    pub fn parse_team_name(team: &str) -> Option<Membership> {
        let rest = team.strip_prefix(TEAM_PREFIX)?;
        let (collaboration, role) = rest.rsplit_once('-')?;
        if collaboration.is_empty() {
            return None;
        }
        let role = role.parse().ok()?;
        Some(Membership::new(collaboration, role))
    }

    pub fn team_name(&self) -> String {
        format!("{TEAM_PREFIX}{}-{}", self.collaboration, self.role)
    }
}

/// Identity of a human caller, rebuilt for every request from its credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Principal {
    pub username: String,
    pub memberships: Vec<Membership>,
}

impl Principal {
    pub fn new<T: Into<String>>(username: T, memberships: Vec<Membership>) -> Self {
        Self {
            username: username.into(),
            memberships,
        }
    }

    /// Builds a principal from raw directory team names, skipping the ones that do not parse.
    pub fn from_team_names<T: Into<String>, S: AsRef<str>>(username: T, teams: &[S]) -> Self {
        let username = username.into();
        let memberships = teams
            .iter()
            .filter_map(|team| {
                let parsed = Membership::parse_team_name(team.as_ref());
                if parsed.is_none() {
                    log::debug!(
                        "Ignoring unrecognized team '{}' of user {username}",
                        team.as_ref()
                    );
                }
                parsed
            })
            .collect();
        Self {
            username,
            memberships,
        }
    }

    /// Every user owns a private collaboration named after them.
    pub fn private_collaboration(&self) -> String {
        format!("{PRIVATE_PREFIX}{}", self.username)
    }

    pub fn has_role(&self, collaboration: &str, roles: &[Role]) -> bool {
        self.memberships
            .iter()
            .any(|m| m.collaboration == collaboration && roles.contains(&m.role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_COLLABORATION, &[Role::Administrator])
    }
}

#[cfg(test)]
mod tests {
    use super::{Membership, Principal, Role, ADMIN_COLLABORATION};

    #[test]
    fn test_parse_team_name() {
        assert_eq!(
            Membership::parse_team_name("collab-neuro-editor"),
            Some(Membership::new("neuro", Role::Editor))
        );
    }

    #[test]
    fn test_parse_team_name_with_separator_in_collaboration() {
        assert_eq!(
            Membership::parse_team_name("collab-my-big-lab-viewer"),
            Some(Membership::new("my-big-lab", Role::Viewer))
        );
        assert_eq!(
            Membership::parse_team_name("collab-neuromorphic-platform-admin-administrator"),
            Some(Membership::new(ADMIN_COLLABORATION, Role::Administrator))
        );
    }

    #[test]
    fn test_parse_invalid_team_names() {
        assert_eq!(Membership::parse_team_name("neuro-editor"), None);
        assert_eq!(Membership::parse_team_name("collab-neuro-owner"), None);
        assert_eq!(Membership::parse_team_name("collab--editor"), None);
        assert_eq!(Membership::parse_team_name("collab-editor"), None);
    }

    #[test]
    fn test_team_name_round_trip() {
        let membership = Membership::new("my-lab", Role::Administrator);
        assert_eq!(
            Membership::parse_team_name(&membership.team_name()),
            Some(membership)
        );
    }

    #[test]
    fn test_from_team_names_skips_garbage() {
        let principal = Principal::from_team_names(
            "alice",
            &["collab-neuro-viewer", "group-foo", "collab-x-superuser"],
        );
        assert_eq!(
            principal.memberships,
            vec![Membership::new("neuro", Role::Viewer)]
        );
        assert_eq!(principal.private_collaboration(), "private-alice");
    }

    #[test]
    fn test_admin_requires_administrator_role() {
        let editor = Principal::new(
            "bob",
            vec![Membership::new(ADMIN_COLLABORATION, Role::Editor)],
        );
        assert!(!editor.is_admin());
        let admin = Principal::new(
            "carol",
            vec![Membership::new(ADMIN_COLLABORATION, Role::Administrator)],
        );
        assert!(admin.is_admin());
    }
}
