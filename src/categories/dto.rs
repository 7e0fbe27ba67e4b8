use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::categories::repo::{Category, CategoryKind};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub icon: Option<String>,
    pub kind: CategoryKind,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: String,
    pub icon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub kind: CategoryKind,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            icon: category.icon,
            kind: category.kind,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_uses_lowercase_wire_names() {
        let json = serde_json::to_string(&CategoryKind::Income).expect("serialize");
        assert_eq!(json, r#""income""#);
        let kind: CategoryKind = serde_json::from_str(r#""expense""#).expect("deserialize");
        assert_eq!(kind, CategoryKind::Expense);
    }

    #[test]
    fn create_request_accepts_missing_icon() {
        let req: CreateCategoryRequest =
            serde_json::from_str(r#"{"name":"Groceries","kind":"expense"}"#).expect("parse");
        assert_eq!(req.name, "Groceries");
        assert!(req.icon.is_none());
        assert_eq!(req.kind, CategoryKind::Expense);
    }
}
