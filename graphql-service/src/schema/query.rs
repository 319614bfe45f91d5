//! Read resolvers.

use async_graphql::{Context, Object, Result, ID};

use super::{catalog, graphql_error};
use crate::models::{Course, Student};

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All courses.
    async fn get_courses(&self, ctx: &Context<'_>) -> Result<Vec<Course>> {
        catalog(ctx)?.list_courses().await.map_err(|e| graphql_error(ctx, e))
    }

    /// A single course by id.
    async fn get_course(&self, ctx: &Context<'_>, id: ID) -> Result<Course> {
        catalog(ctx)?.get_course(&id).await.map_err(|e| graphql_error(ctx, e))
    }

    /// All students.
    async fn get_people(&self, ctx: &Context<'_>) -> Result<Vec<Student>> {
        catalog(ctx)?.list_students().await.map_err(|e| graphql_error(ctx, e))
    }

    /// A single student by id.
    async fn get_person(&self, ctx: &Context<'_>, id: ID) -> Result<Student> {
        catalog(ctx)?.get_student(&id).await.map_err(|e| graphql_error(ctx, e))
    }
}
