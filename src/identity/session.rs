use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Demo rule carried over from the dashboard: the backend login response has no role,
    /// so any address containing "admin" is treated as an administrator.
    pub fn from_login_email(email: &str) -> Self {
        if email.contains("admin") { Role::Admin } else { Role::User }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Credentials of the signed-in user as held by the token store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_and_infer() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("Admin".parse::<Role>().is_err());
        assert_eq!(Role::from_login_email("admin@admin.com"), Role::Admin);
        assert_eq!(Role::from_login_email("user@user.com"), Role::User);
    }
}
