//! Catalog persistence.

use async_trait::async_trait;

use common::db::ConnectionState;
use common::errors::AppResult;

use crate::models::{Course, CourseEditInput, CourseInput, PersonEditInput, PersonInput, Student};

#[cfg(test)]
pub mod memory;
pub mod mongo;

pub use mongo::MongoCatalog;

/// Data access used by the resolvers.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// State of the underlying database connection.
    fn connection_state(&self) -> ConnectionState;

    /// Logical database name the store reads from.
    fn database_name(&self) -> &str;

    async fn list_courses(&self) -> AppResult<Vec<Course>>;

    async fn get_course(&self, id: &str) -> AppResult<Course>;

    async fn create_course(&self, input: CourseInput) -> AppResult<Course>;

    async fn update_course(&self, id: &str, changes: CourseEditInput) -> AppResult<Course>;

    async fn delete_course(&self, id: &str) -> AppResult<()>;

    async fn list_students(&self) -> AppResult<Vec<Student>>;

    async fn get_student(&self, id: &str) -> AppResult<Student>;

    /// Resolves a roster. Unknown ids are skipped.
    async fn get_students(&self, ids: &[String]) -> AppResult<Vec<Student>>;

    async fn create_student(&self, input: PersonInput) -> AppResult<Student>;

    async fn update_student(&self, id: &str, changes: PersonEditInput) -> AppResult<Student>;

    /// Deletes a student and removes it from every course roster.
    async fn delete_student(&self, id: &str) -> AppResult<()>;

    /// Adds a student to a course roster. Enrolling twice is a no-op.
    async fn enroll(&self, course_id: &str, student_id: &str) -> AppResult<Course>;
}
