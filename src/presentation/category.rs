use crate::models::CategoryModel;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryDetail {
    pub id: i32,
    pub name: String,
}

impl From<CategoryModel> for CategoryDetail {
    fn from(c: CategoryModel) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}
