use crate::{
    error::{AppError, AppResult},
    models::{category, post, Category, CategoryModel, Post},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};

pub struct CategoryService {
    db: DatabaseConnection,
}

impl CategoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<CategoryModel>> {
        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CategoryModel> {
        Category::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, name: &str) -> AppResult<CategoryModel> {
        let name = name.trim();
        let existing = Category::find()
            .filter(category::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(duplicate_name());
        }

        let created = category::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_name(),
            _ => AppError::Database(e),
        })?;

        tracing::info!("Category {} created", created.name);
        Ok(created)
    }

    /// Deletion hook: posts in the category lose it but are kept.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;

        Category::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let detached = Post::update_many()
            .col_expr(post::Column::CategoryId, Expr::value(Option::<i32>::None))
            .filter(post::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;

        Category::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            "Category {} deleted, {} posts left without category",
            id,
            detached.rows_affected
        );
        Ok(())
    }
}

fn duplicate_name() -> AppError {
    AppError::field("name", "category with this name already exists.")
}
