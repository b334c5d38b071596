//! User account and promotion eligibility.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::{RevenueLedger, UserRole};

/// Seller classification recorded at onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellerType {
    Individual,
    Company,
}

impl SellerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SellerType::Individual => "individual",
            SellerType::Company => "company",
        }
    }

    /// Parses a stored value; unknown values are treated as absent.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "individual" => Some(SellerType::Individual),
            "company" => Some(SellerType::Company),
            _ => None,
        }
    }
}

/// A marketplace account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_seller: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_company: bool,
    #[serde(default)]
    pub seller_type: Option<SellerType>,
    /// ISO 3166-1 alpha-2 code used for VAT lookup.
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub revenue: RevenueLedger,
    pub created_at: Timestamp,
}

impl User {
    /// Whether this account may buy gig promotions.
    ///
    /// Any selling signal is enough: a selling role, either seller flag,
    /// or a company seller type.
    pub fn can_promote_gigs(&self) -> bool {
        self.role.can_sell()
            || self.is_seller
            || self.is_company
            || self.seller_type == Some(SellerType::Company)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Name shown in notifications.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Deserializes a flag written either as a JSON boolean or as the strings
/// `"true"`/`"false"` found in imported account documents.
///
/// Only import boundaries use this; inside the domain the flag is a `bool`.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Missing(()),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => Ok(text.trim().eq_ignore_ascii_case("true")),
        Flag::Missing(()) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> User {
        User {
            id: UserId::new(),
            email: "client@example.com".to_string(),
            username: "client".to_string(),
            full_name: None,
            role: UserRole::Client,
            is_seller: false,
            is_company: false,
            seller_type: None,
            country_code: None,
            revenue: RevenueLedger::default(),
            created_at: Timestamp::now(),
        }
    }

    // ============================================================
    // Eligibility
    // ============================================================

    #[test]
    fn plain_client_is_not_eligible() {
        assert!(!client().can_promote_gigs());
    }

    #[test]
    fn selling_roles_are_eligible() {
        for role in [UserRole::Freelancer, UserRole::Seller, UserRole::Admin] {
            let user = User { role, ..client() };
            assert!(user.can_promote_gigs(), "{} should be eligible", role);
        }
    }

    #[test]
    fn seller_flag_makes_client_eligible() {
        let user = User { is_seller: true, ..client() };
        assert!(user.can_promote_gigs());
    }

    #[test]
    fn company_flag_makes_client_eligible() {
        let user = User { is_company: true, ..client() };
        assert!(user.can_promote_gigs());
    }

    #[test]
    fn company_seller_type_makes_client_eligible() {
        let user = User {
            seller_type: Some(SellerType::Company),
            ..client()
        };
        assert!(user.can_promote_gigs());

        let individual = User {
            seller_type: Some(SellerType::Individual),
            ..client()
        };
        assert!(!individual.can_promote_gigs());
    }

    // ============================================================
    // Import tolerance
    // ============================================================

    fn parse(flags: &str) -> User {
        let json = format!(
            r#"{{
                "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                "email": "a@example.com",
                "username": "a",
                "full_name": null,
                "created_at": "2024-01-01T00:00:00Z"
                {}
            }}"#,
            flags
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn string_true_is_accepted_for_seller_flags() {
        let user = parse(r#", "is_seller": "true", "is_company": "false""#);
        assert!(user.is_seller);
        assert!(!user.is_company);
        assert!(user.can_promote_gigs());
    }

    #[test]
    fn real_booleans_still_work() {
        let user = parse(r#", "is_company": true"#);
        assert!(user.is_company);
    }

    #[test]
    fn missing_flags_default_to_false_and_role_to_client() {
        let user = parse("");
        assert!(!user.is_seller);
        assert_eq!(user.role, UserRole::Client);
        assert!(!user.can_promote_gigs());
    }

    #[test]
    fn null_flag_is_false() {
        let user = parse(r#", "is_seller": null"#);
        assert!(!user.is_seller);
    }

    #[test]
    fn display_name_prefers_full_name() {
        let named = User {
            full_name: Some("Ada Lovelace".to_string()),
            ..client()
        };
        assert_eq!(named.display_name(), "Ada Lovelace");
        assert_eq!(client().display_name(), "client");
    }
}
