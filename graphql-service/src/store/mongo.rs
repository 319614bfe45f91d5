//! MongoDB backed catalog.
//!
//! Every operation obtains the database handle from the shared
//! [`ConnectionCache`]; the first one to run opens the connection.

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_document, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use common::db::{ConnectionCache, ConnectionState, Connector, MongoConnector};
use common::errors::{AppError, AppResult};

use super::CatalogStore;
use crate::models::{Course, CourseEditInput, CourseInput, Level, PersonEditInput, PersonInput, Student};

const COURSES: &str = "courses";
const STUDENTS: &str = "students";

#[derive(Debug, Serialize, Deserialize)]
struct CourseDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    teacher: Option<String>,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<Level>,
    #[serde(default)]
    people: Vec<ObjectId>,
}

impl From<CourseDocument> for Course {
    fn from(doc: CourseDocument) -> Self {
        Self {
            id: doc.id.map(|id| id.to_hex()).unwrap_or_default().into(),
            title: doc.title,
            teacher: doc.teacher,
            description: doc.description,
            topic: doc.topic,
            level: doc.level,
            people_ids: doc.people.iter().map(|id| id.to_hex()).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StudentDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    email: String,
}

impl From<StudentDocument> for Student {
    fn from(doc: StudentDocument) -> Self {
        Self {
            id: doc.id.map(|id| id.to_hex()).unwrap_or_default().into(),
            name: doc.name,
            email: doc.email,
        }
    }
}

/// Catalog stored in the `courses` and `students` collections.
pub struct MongoCatalog<C: Connector<Handle = Database> = MongoConnector> {
    cache: Arc<ConnectionCache<C>>,
}

impl<C: Connector<Handle = Database>> MongoCatalog<C> {
    pub fn new(cache: Arc<ConnectionCache<C>>) -> Self {
        Self { cache }
    }

    async fn courses(&self) -> AppResult<Collection<CourseDocument>> {
        Ok(self.cache.get().await?.collection(COURSES))
    }

    async fn students(&self) -> AppResult<Collection<StudentDocument>> {
        Ok(self.cache.get().await?.collection(STUDENTS))
    }
}

pub(super) fn parse_id(id: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| AppError::Validation(format!("'{}' is not a valid id", id)))
}

fn set_document<T: Serialize>(changes: &T) -> AppResult<Document> {
    to_document(changes).map_err(|e| AppError::DatabaseQuery(e.to_string()))
}

#[async_trait]
impl<C: Connector<Handle = Database>> CatalogStore for MongoCatalog<C> {
    fn connection_state(&self) -> ConnectionState {
        self.cache.state()
    }

    fn database_name(&self) -> &str {
        self.cache.database_name()
    }

    async fn list_courses(&self) -> AppResult<Vec<Course>> {
        let docs: Vec<CourseDocument> = self.courses().await?.find(doc! {}).await?.try_collect().await?;
        Ok(docs.into_iter().map(Course::from).collect())
    }

    async fn get_course(&self, id: &str) -> AppResult<Course> {
        let oid = parse_id(id)?;
        self.courses()
            .await?
            .find_one(doc! { "_id": oid })
            .await?
            .map(Course::from)
            .ok_or_else(|| AppError::NotFound(format!("course {}", id)))
    }

    async fn create_course(&self, input: CourseInput) -> AppResult<Course> {
        let mut course = CourseDocument {
            id: None,
            title: input.title,
            teacher: input.teacher,
            description: input.description,
            topic: input.topic,
            level: input.level,
            people: Vec::new(),
        };
        let result = self.courses().await?.insert_one(&course).await?;
        course.id = result.inserted_id.as_object_id();
        tracing::info!(id = ?course.id, title = %course.title, "Course created");
        Ok(course.into())
    }

    async fn update_course(&self, id: &str, changes: CourseEditInput) -> AppResult<Course> {
        let oid = parse_id(id)?;
        let set = set_document(&changes)?;
        if set.is_empty() {
            return self.get_course(id).await;
        }
        self.courses()
            .await?
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .map(Course::from)
            .ok_or_else(|| AppError::NotFound(format!("course {}", id)))
    }

    async fn delete_course(&self, id: &str) -> AppResult<()> {
        let oid = parse_id(id)?;
        let result = self.courses().await?.delete_one(doc! { "_id": oid }).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound(format!("course {}", id)));
        }
        tracing::info!(id = %id, "Course deleted");
        Ok(())
    }

    async fn list_students(&self) -> AppResult<Vec<Student>> {
        let docs: Vec<StudentDocument> = self.students().await?.find(doc! {}).await?.try_collect().await?;
        Ok(docs.into_iter().map(Student::from).collect())
    }

    async fn get_student(&self, id: &str) -> AppResult<Student> {
        let oid = parse_id(id)?;
        self.students()
            .await?
            .find_one(doc! { "_id": oid })
            .await?
            .map(Student::from)
            .ok_or_else(|| AppError::NotFound(format!("student {}", id)))
    }

    async fn get_students(&self, ids: &[String]) -> AppResult<Vec<Student>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let oids = ids
            .iter()
            .map(|id| parse_id(id))
            .collect::<AppResult<Vec<_>>>()?;
        let docs: Vec<StudentDocument> = self
            .students()
            .await?
            .find(doc! { "_id": { "$in": oids } })
            .await?
            .try_collect()
            .await?;
        Ok(docs.into_iter().map(Student::from).collect())
    }

    async fn create_student(&self, input: PersonInput) -> AppResult<Student> {
        let mut student = StudentDocument {
            id: None,
            name: input.name,
            email: input.email,
        };
        let result = self.students().await?.insert_one(&student).await?;
        student.id = result.inserted_id.as_object_id();
        tracing::info!(id = ?student.id, "Student created");
        Ok(student.into())
    }

    async fn update_student(&self, id: &str, changes: PersonEditInput) -> AppResult<Student> {
        let oid = parse_id(id)?;
        let set = set_document(&changes)?;
        if set.is_empty() {
            return self.get_student(id).await;
        }
        self.students()
            .await?
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .map(Student::from)
            .ok_or_else(|| AppError::NotFound(format!("student {}", id)))
    }

    async fn delete_student(&self, id: &str) -> AppResult<()> {
        let oid = parse_id(id)?;
        let result = self.students().await?.delete_one(doc! { "_id": oid }).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound(format!("student {}", id)));
        }
        self.courses()
            .await?
            .update_many(doc! { "people": oid }, doc! { "$pull": { "people": oid } })
            .await?;
        tracing::info!(id = %id, "Student deleted");
        Ok(())
    }

    async fn enroll(&self, course_id: &str, student_id: &str) -> AppResult<Course> {
        let course_oid = parse_id(course_id)?;
        let student = self.get_student(student_id).await?;
        let student_oid = parse_id(&student.id)?;

        self.courses()
            .await?
            .find_one_and_update(
                doc! { "_id": course_oid },
                doc! { "$addToSet": { "people": student_oid } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .map(Course::from)
            .ok_or_else(|| AppError::NotFound(format!("course {}", course_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use common::config::DatabaseConfig;
    use common::errors::ConnectionError;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct RefusingConnector {
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Connector for RefusingConnector {
        type Handle = Database;

        async fn connect(&self, _config: &DatabaseConfig) -> Result<Database, ConnectionError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(ConnectionError::Unreachable("connection refused".into()))
        }
    }

    fn database_config() -> DatabaseConfig {
        DatabaseConfig {
            user: None,
            password: String::new(),
            host: "localhost".into(),
            database_name: "platzi".into(),
            use_srv: false,
            uri: None,
            connect_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_first_operation_opens_connection() {
        let connector = RefusingConnector::default();
        let attempts = connector.attempts.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cache = Arc::new(ConnectionCache::new(connector, database_config()).with_fatal_notifier(tx));
        let catalog = MongoCatalog::new(cache);

        assert_eq!(catalog.connection_state(), ConnectionState::Uninitialized);
        assert_eq!(catalog.database_name(), "platzi");
        assert_eq!(attempts.load(Ordering::SeqCst), 0);

        let err = catalog.list_courses().await.unwrap_err();
        assert_eq!(err.code(), "CONNECTION_ERROR");
        assert_eq!(catalog.connection_state(), ConnectionState::Failed);
        assert!(matches!(rx.try_recv(), Ok(ConnectionError::Unreachable(_))));

        // 失败是终态，后续操作不再重连
        assert_eq!(catalog.list_students().await.unwrap_err().code(), "CONNECTION_ERROR");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected_before_connecting() {
        let connector = RefusingConnector::default();
        let attempts = connector.attempts.clone();
        let catalog = MongoCatalog::new(Arc::new(ConnectionCache::new(connector, database_config())));

        assert_eq!(catalog.get_course("42").await.unwrap_err().code(), "VALIDATION_ERROR");
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parse_id_rejects_malformed_ids() {
        let err = parse_id("42").unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(parse_id("5f1b2c3d4e5f6a7b8c9d0e1f").is_ok());
    }

    #[test]
    fn test_course_document_conversion() {
        let course_id = ObjectId::new();
        let student_id = ObjectId::new();
        let course = Course::from(CourseDocument {
            id: Some(course_id),
            title: "GraphQL".into(),
            teacher: Some("Adrián".into()),
            description: "Curso de GraphQL".into(),
            topic: None,
            level: Some(Level::Beginner),
            people: vec![student_id],
        });
        assert_eq!(course.id.as_str(), course_id.to_hex());
        assert_eq!(course.people_ids, vec![student_id.to_hex()]);
    }

    #[test]
    fn test_course_document_omits_missing_id() {
        let doc = to_document(&CourseDocument {
            id: None,
            title: "GraphQL".into(),
            teacher: None,
            description: "Curso".into(),
            topic: None,
            level: Some(Level::Advanced),
            people: Vec::new(),
        })
        .unwrap();
        assert!(!doc.contains_key("_id"));
        assert_eq!(doc.get_str("level").unwrap(), "advanced");
    }
}
