//! Write resolvers.
//!
//! Inputs are validated before the catalog is touched, so invalid requests
//! never open the database connection.

use async_graphql::{Context, Object, Result, ID};
use validator::Validate;

use common::errors::AppError;

use super::{catalog, graphql_error};
use crate::models::{Course, CourseEditInput, CourseInput, PersonEditInput, PersonInput, Student};

#[derive(Default)]
pub struct MutationRoot;

fn validated<T: Validate>(ctx: &Context<'_>, input: T) -> Result<T> {
    input
        .validate()
        .map_err(|e| graphql_error(ctx, AppError::Validation(e.to_string())))?;
    Ok(input)
}

#[Object]
impl MutationRoot {
    async fn create_course(&self, ctx: &Context<'_>, input: CourseInput) -> Result<Course> {
        let input = validated(ctx, input)?;
        catalog(ctx)?.create_course(input).await.map_err(|e| graphql_error(ctx, e))
    }

    async fn edit_course(&self, ctx: &Context<'_>, id: ID, input: CourseEditInput) -> Result<Course> {
        let input = validated(ctx, input)?;
        catalog(ctx)?
            .update_course(&id, input)
            .await
            .map_err(|e| graphql_error(ctx, e))
    }

    async fn delete_course(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        catalog(ctx)?.delete_course(&id).await.map_err(|e| graphql_error(ctx, e))?;
        Ok(true)
    }

    async fn create_person(&self, ctx: &Context<'_>, input: PersonInput) -> Result<Student> {
        let input = validated(ctx, input)?;
        catalog(ctx)?.create_student(input).await.map_err(|e| graphql_error(ctx, e))
    }

    async fn edit_person(&self, ctx: &Context<'_>, id: ID, input: PersonEditInput) -> Result<Student> {
        let input = validated(ctx, input)?;
        catalog(ctx)?
            .update_student(&id, input)
            .await
            .map_err(|e| graphql_error(ctx, e))
    }

    /// Deletes a student and drops it from every course roster.
    async fn delete_person(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        catalog(ctx)?.delete_student(&id).await.map_err(|e| graphql_error(ctx, e))?;
        Ok(true)
    }

    /// Enrolls a student in a course.
    async fn add_people(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "courseID")] course_id: ID,
        #[graphql(name = "personID")] person_id: ID,
    ) -> Result<Course> {
        catalog(ctx)?
            .enroll(&course_id, &person_id)
            .await
            .map_err(|e| graphql_error(ctx, e))
    }
}
