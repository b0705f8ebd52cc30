use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::storage::StoredImage;

/// Account kind, fixed at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "membro")]
    Member,
    #[serde(rename = "nutricionista")]
    Nutritionist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "membro",
            Role::Nutritionist => "nutricionista",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "membro" => Some(Role::Member),
            "nutricionista" => Some(Role::Nutritionist),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NutritionistProfileInput {
    pub crn: String,
    pub education: String,
    pub focus: String,
}

/// Registration payload, tagged by role so a nutritionist can never be
/// created without its profile
#[derive(Debug, Clone)]
pub enum NewAccount {
    Member(NewUser),
    Nutritionist(NewUser, NutritionistProfileInput),
}

impl NewAccount {
    pub fn user(&self) -> &NewUser {
        match self {
            NewAccount::Member(user) | NewAccount::Nutritionist(user, _) => user,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            NewAccount::Member(_) => Role::Member,
            NewAccount::Nutritionist(..) => Role::Nutritionist,
        }
    }
}

/// Row read during login
#[derive(Debug, Clone, FromRow)]
pub struct LoginRecord {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub password_hash: String,
}

/// Public profile (`userData`); nutritionist columns are null for members
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub id: i64,
    #[serde(rename = "type")]
    pub role: String,
    pub name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub cover_picture: Option<String>,
    pub focus: Option<String>,
    pub about: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub crn: Option<String>,
    pub education: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRecipeCard {
    pub id: i64,
    pub image: Option<String>,
    pub title: String,
    pub summary: String,
}

/// New profile/cover images; `None` leaves the current one in place
#[derive(Debug, Clone, Default)]
pub struct PictureUpdate {
    pub profile: Option<StoredImage>,
    pub cover: Option<StoredImage>,
}

impl PictureUpdate {
    pub fn into_images(self) -> Vec<StoredImage> {
        self.profile.into_iter().chain(self.cover).collect()
    }
}

#[derive(Debug, Clone)]
pub struct MemberUpdate {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default)]
pub struct NutritionistUpdate {
    pub name: String,
    pub email: String,
    pub crn: String,
    pub education: String,
    pub focus: String,
    pub about: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_names() {
        assert_eq!(Role::parse("membro"), Some(Role::Member));
        assert_eq!(Role::parse("nutricionista"), Some(Role::Nutritionist));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(serde_json::to_value(Role::Nutritionist).unwrap(), "nutricionista");
    }

    #[test]
    fn user_details_serialize_with_profile_keys() {
        let details = UserDetails {
            id: 3,
            role: "membro".into(),
            name: "Caio".into(),
            email: "caio@example.com".into(),
            profile_picture: None,
            cover_picture: Some("http://cover".into()),
            focus: None,
            about: None,
            city: None,
            state: None,
            linkedin: None,
            instagram: None,
            website: None,
            phone: None,
            crn: None,
            education: None,
        };
        let value = serde_json::to_value(details).unwrap();
        assert_eq!(value["type"], "membro");
        assert_eq!(value["coverPicture"], "http://cover");
        assert!(value["profilePicture"].is_null());
    }
}
