use crate::{
    error::{AppError, AppResult},
    models::{profile, user, Profile, ProfileModel, User, UserModel},
    presentation::{profile_detail, ProfileDetail},
    services::account::{delete_user_with_dependents, USERNAME_TAKEN},
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};

/// Partial profile update; `date_of_birth: Some(None)` clears the date.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<Option<NaiveDate>>,
}

pub struct ProfileService {
    db: DatabaseConnection,
}

impl ProfileService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        base_url: &str,
        page: u64,
        page_size: u64,
    ) -> AppResult<(Vec<ProfileDetail>, u64)> {
        let paginator = Profile::find()
            .find_also_related(User)
            .order_by_asc(profile::Column::Id)
            .paginate(&self.db, page_size);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let items = rows
            .into_iter()
            .filter_map(|(profile, user)| user.map(|u| profile_detail(profile, u, base_url)))
            .collect();
        Ok((items, total))
    }

    async fn load_with_user(&self, profile: Option<ProfileModel>) -> AppResult<(ProfileModel, UserModel)> {
        let profile = profile.ok_or(AppError::NotFound)?;
        let user = User::find_by_id(profile.user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok((profile, user))
    }

    async fn find_own(&self, user_id: i32) -> AppResult<Option<ProfileModel>> {
        let profile = Profile::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(profile)
    }

    pub async fn get(&self, id: i32, base_url: &str) -> AppResult<ProfileDetail> {
        let profile = Profile::find_by_id(id).one(&self.db).await?;
        let (profile, user) = self.load_with_user(profile).await?;
        Ok(profile_detail(profile, user, base_url))
    }

    pub async fn get_own(&self, user_id: i32, base_url: &str) -> AppResult<ProfileDetail> {
        let profile = self.find_own(user_id).await?;
        let (profile, user) = self.load_with_user(profile).await?;
        Ok(profile_detail(profile, user, base_url))
    }

    /// Username and email live on the user row, date of birth on the
    /// profile; both rows are written in one transaction.
    pub async fn update_own(
        &self,
        user_id: i32,
        changes: ProfileChanges,
        base_url: &str,
    ) -> AppResult<ProfileDetail> {
        let profile = self.find_own(user_id).await?;
        let (profile, user) = self.load_with_user(profile).await?;

        if let Some(username) = changes.username.as_deref() {
            let taken = User::find()
                .filter(user::Column::Username.eq(username))
                .filter(user::Column::Id.ne(user_id))
                .one(&self.db)
                .await?
                .is_some();
            if taken {
                return Err(AppError::field("username", USERNAME_TAKEN));
            }
        }

        let txn = self.db.begin().await?;

        let user = if changes.username.is_some() || changes.email.is_some() {
            let mut user_active: user::ActiveModel = user.into();
            if let Some(username) = changes.username {
                user_active.username = Set(username);
            }
            if let Some(email) = changes.email {
                user_active.email = Set(email);
            }
            user_active.update(&txn).await.map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AppError::field("username", USERNAME_TAKEN)
                }
                _ => AppError::Database(e),
            })?
        } else {
            user
        };

        let profile = match changes.date_of_birth {
            Some(date_of_birth) => {
                let mut active: profile::ActiveModel = profile.into();
                active.date_of_birth = Set(date_of_birth);
                active.update(&txn).await?
            }
            None => profile,
        };

        txn.commit().await?;
        Ok(profile_detail(profile, user, base_url))
    }

    /// Stores a new photo path and returns the one it replaced.
    pub async fn set_photo(&self, user_id: i32, photo: String) -> AppResult<Option<String>> {
        let profile = self.find_own(user_id).await?.ok_or(AppError::NotFound)?;
        let previous = profile.photo.clone();

        let mut active: profile::ActiveModel = profile.into();
        active.photo = Set(Some(photo));
        active.update(&self.db).await?;
        Ok(previous)
    }

    /// Staff-only removal by profile id. Deletes the owning user and
    /// everything that hangs off it.
    pub async fn delete_by_id(&self, id: i32) -> AppResult<Vec<String>> {
        let txn = self.db.begin().await?;
        let profile = Profile::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let media = delete_user_with_dependents(&txn, profile.user_id).await?;
        txn.commit().await?;

        tracing::info!("Profile {} and user {} deleted", id, profile.user_id);
        Ok(media)
    }
}
