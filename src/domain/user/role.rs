//! User roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role stored on an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Client,
    Freelancer,
    Seller,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Freelancer => "freelancer",
            UserRole::Seller => "seller",
            UserRole::Admin => "admin",
        }
    }

    /// Roles that may sell (and therefore promote) gigs.
    pub fn can_sell(&self) -> bool {
        matches!(self, UserRole::Freelancer | UserRole::Seller | UserRole::Admin)
    }

    /// Parses a stored role, treating anything unrecognised as a client.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or(UserRole::Client)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Client
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(UserRole::Client),
            "freelancer" => Ok(UserRole::Freelancer),
            "seller" => Ok(UserRole::Seller),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selling_roles() {
        assert!(!UserRole::Client.can_sell());
        assert!(UserRole::Freelancer.can_sell());
        assert!(UserRole::Seller.can_sell());
        assert!(UserRole::Admin.can_sell());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Freelancer".parse::<UserRole>().unwrap(), UserRole::Freelancer);
        assert_eq!(" ADMIN ".parse::<UserRole>().unwrap(), UserRole::Admin);
    }

    #[test]
    fn unknown_role_falls_back_to_client() {
        assert_eq!(UserRole::parse_lenient("moderator"), UserRole::Client);
    }

    #[test]
    fn round_trips_through_as_str() {
        for role in [UserRole::Client, UserRole::Freelancer, UserRole::Seller, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
    }
}
