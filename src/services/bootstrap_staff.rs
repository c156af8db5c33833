use crate::config::env_flag;
use crate::error::AppResult;
use crate::models::{user, User};
use crate::services::account::create_user_with_profile;
use crate::utils::hash_password;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapStaffConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl BootstrapStaffConfig {
    pub fn from_env() -> Option<Self> {
        if !env_flag("BOOTSTRAP_STAFF_ENABLED", false) {
            return None;
        }

        Some(Self {
            username: env::var("BOOTSTRAP_STAFF_USERNAME").ok()?,
            email: env::var("BOOTSTRAP_STAFF_EMAIL").ok()?,
            password: env::var("BOOTSTRAP_STAFF_PASSWORD").ok()?,
        })
    }
}

/// Make sure a staff account exists at startup:
/// - any staff user already present: nothing to do
/// - the configured username exists: promote it
/// - otherwise create it, with a profile
pub async fn ensure_bootstrap_staff(db: &DatabaseConnection) -> AppResult<()> {
    let Some(cfg) = BootstrapStaffConfig::from_env() else {
        return Ok(());
    };
    promote_or_create_staff(db, &cfg).await
}

pub async fn promote_or_create_staff(
    db: &DatabaseConnection,
    cfg: &BootstrapStaffConfig,
) -> AppResult<()> {
    let staff_exists = User::find()
        .filter(user::Column::IsStaff.eq(true))
        .one(db)
        .await?
        .is_some();
    if staff_exists {
        return Ok(());
    }

    let existing = User::find()
        .filter(user::Column::Username.eq(cfg.username.as_str()))
        .one(db)
        .await?;

    if let Some(found) = existing {
        let mut active: user::ActiveModel = found.into();
        active.is_staff = Set(true);
        active.update(db).await?;
        tracing::info!("Promoted {} to staff", cfg.username);
        return Ok(());
    }

    let password_hash = hash_password(&cfg.password)?;
    let txn = db.begin().await?;
    create_user_with_profile(&txn, &cfg.username, &cfg.email, password_hash, true).await?;
    txn.commit().await?;
    tracing::info!("Created staff user {}", cfg.username);
    Ok(())
}
