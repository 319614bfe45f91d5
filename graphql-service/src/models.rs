//! Catalog types exposed through the GraphQL schema.

use std::sync::Arc;

use async_graphql::{ComplexObject, Context, Enum, InputObject, Result, SimpleObject, ID};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schema::graphql_error;
use crate::store::CatalogStore;

/// Course difficulty.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

/// A course and its enrolled students.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Course {
    pub id: ID,
    pub title: String,
    pub teacher: Option<String>,
    pub description: String,
    pub topic: Option<String>,
    pub level: Option<Level>,
    #[graphql(skip)]
    pub people_ids: Vec<String>,
}

#[ComplexObject]
impl Course {
    /// Students enrolled in the course.
    async fn people(&self, ctx: &Context<'_>) -> Result<Vec<Student>> {
        let store = ctx.data::<Arc<dyn CatalogStore>>()?;
        store
            .get_students(&self.people_ids)
            .await
            .map_err(|e| graphql_error(ctx, e))
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Student {
    pub id: ID,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, InputObject, Validate)]
pub struct CourseInput {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    pub teacher: Option<String>,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    pub topic: Option<String>,
    pub level: Option<Level>,
}

/// Partial course update; absent fields are left untouched.
#[derive(Debug, Clone, Default, InputObject, Validate, Serialize)]
pub struct CourseEditInput {
    #[validate(length(min = 1, message = "title must not be empty"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    #[validate(length(min = 1, message = "description must not be empty"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
}

#[derive(Debug, Clone, InputObject, Validate)]
pub struct PersonInput {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
}

#[derive(Debug, Clone, Default, InputObject, Validate, Serialize)]
pub struct PersonEditInput {
    #[validate(length(min = 1, message = "name must not be empty"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(email(message = "email is not valid"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_input_validation() {
        let input = CourseInput {
            title: String::new(),
            teacher: None,
            description: "GraphQL from scratch".into(),
            topic: None,
            level: None,
        };
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("title must not be empty"));
    }

    #[test]
    fn test_person_input_requires_valid_email() {
        let input = PersonInput {
            name: "Ada".into(),
            email: "not-an-email".into(),
        };
        assert!(input.validate().is_err());

        let edit = PersonEditInput {
            email: Some("ada@example.com".into()),
            ..Default::default()
        };
        assert!(edit.validate().is_ok());
    }

    #[test]
    fn test_edit_input_serializes_only_present_fields() {
        let edit = CourseEditInput {
            level: Some(Level::Advanced),
            ..Default::default()
        };
        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(json, serde_json::json!({ "level": "advanced" }));
    }
}
