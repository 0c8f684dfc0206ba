use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capability level of an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Resolve the effective role from a list of role claims.
    ///
    /// Any claim equal to `admin` (case-insensitive) grants [`Role::Admin`];
    /// everything else is a plain user.
    pub fn from_claims<S: AsRef<str>>(claims: &[S]) -> Self {
        if claims
            .iter()
            .any(|c| c.as_ref().eq_ignore_ascii_case("admin"))
        {
            Role::Admin
        } else {
            Role::User
        }
    }

    /// Claim value for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// An authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
    /// Public name shown as the byline of posts this actor writes.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self {
            id,
            role,
            display_name: None,
        }
    }

    /// Attach a display name. Blank names are ignored.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.trim();
        self.display_name = (!name.is_empty()).then(|| name.to_string());
        self
    }

    pub fn user(id: Uuid) -> Self {
        Self::new(id, Role::User)
    }

    pub fn admin(id: Uuid) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_claims() {
        assert_eq!(Role::from_claims(&["user"]), Role::User);
        assert_eq!(Role::from_claims(&["user", "Admin"]), Role::Admin);
        assert_eq!(Role::from_claims::<&str>(&[]), Role::User);
    }

    #[test]
    fn test_role_claim_round_trips() {
        for role in [Role::User, Role::Admin] {
            assert_eq!(Role::from_claims(&[role.as_str()]), role);
        }
    }

    #[test]
    fn test_display_name_is_trimmed() {
        let id = Uuid::new_v4();
        assert_eq!(
            Identity::user(id).with_display_name("  Ada ").display_name.as_deref(),
            Some("Ada")
        );
        assert_eq!(Identity::user(id).with_display_name("   ").display_name, None);
    }
}
