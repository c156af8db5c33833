use super::{media_url, OrNull};
use crate::models::{ProfileModel, UserModel};
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileDetail {
    pub id: i32,
    pub user: UserSummary,
    pub date_of_birth: Option<NaiveDate>,
    #[schema(value_type = String)]
    pub photo: OrNull<String>,
}

pub fn profile_detail(profile: ProfileModel, user: UserModel, base_url: &str) -> ProfileDetail {
    ProfileDetail {
        id: profile.id,
        user: UserSummary {
            id: user.id,
            username: user.username,
            email: user.email,
            is_staff: user.is_staff,
        },
        date_of_birth: profile.date_of_birth,
        photo: media_url(base_url, profile.photo.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_without_photo() {
        let user = UserModel {
            id: 3,
            username: "carol".into(),
            email: "carol@example.com".into(),
            password_hash: "x".into(),
            is_staff: false,
            date_joined: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };
        let profile = ProfileModel {
            id: 8,
            user_id: 3,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15),
            photo: None,
        };
        let value = serde_json::to_value(profile_detail(profile, user, "http://h")).unwrap();
        assert_eq!(value["photo"], json!("null"));
        assert_eq!(value["date_of_birth"], json!("1990-06-15"));
        assert_eq!(value["user"]["username"], json!("carol"));
        assert!(value["user"].get("password_hash").is_none());
    }
}
