//! In-memory catalog used by the resolver and router tests.
//!
//! Ids follow the same 24-hex format and validation as the MongoDB store.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use common::db::ConnectionState;
use common::errors::{AppError, AppResult};

use super::mongo::parse_id;
use super::CatalogStore;
use crate::models::{Course, CourseEditInput, CourseInput, PersonEditInput, PersonInput, Student};

#[derive(Default)]
struct Tables {
    courses: Vec<Course>,
    students: Vec<Student>,
}

impl Tables {
    fn course(&self, id: &str) -> AppResult<&Course> {
        parse_id(id)?;
        self.courses
            .iter()
            .find(|c| c.id.as_str() == id)
            .ok_or_else(|| AppError::NotFound(format!("course {}", id)))
    }

    fn student(&self, id: &str) -> AppResult<&Student> {
        parse_id(id)?;
        self.students
            .iter()
            .find(|s| s.id.as_str() == id)
            .ok_or_else(|| AppError::NotFound(format!("student {}", id)))
    }

    fn course_mut(&mut self, id: &str) -> AppResult<&mut Course> {
        parse_id(id)?;
        self.courses
            .iter_mut()
            .find(|c| c.id.as_str() == id)
            .ok_or_else(|| AppError::NotFound(format!("course {}", id)))
    }

    fn student_mut(&mut self, id: &str) -> AppResult<&mut Student> {
        parse_id(id)?;
        self.students
            .iter_mut()
            .find(|s| s.id.as_str() == id)
            .ok_or_else(|| AppError::NotFound(format!("student {}", id)))
    }
}

pub struct MemoryCatalog {
    tables: RwLock<Tables>,
    state: ConnectionState,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::with_state(ConnectionState::Uninitialized)
    }

    pub fn with_state(state: ConnectionState) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            state,
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    fn connection_state(&self) -> ConnectionState {
        self.state
    }

    fn database_name(&self) -> &str {
        "memory"
    }

    async fn list_courses(&self) -> AppResult<Vec<Course>> {
        Ok(self.tables.read().await.courses.clone())
    }

    async fn get_course(&self, id: &str) -> AppResult<Course> {
        self.tables.read().await.course(id).cloned()
    }

    async fn create_course(&self, input: CourseInput) -> AppResult<Course> {
        let course = Course {
            id: ObjectId::new().to_hex().into(),
            title: input.title,
            teacher: input.teacher,
            description: input.description,
            topic: input.topic,
            level: input.level,
            people_ids: Vec::new(),
        };
        self.tables.write().await.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(&self, id: &str, changes: CourseEditInput) -> AppResult<Course> {
        let mut tables = self.tables.write().await;
        let course = tables.course_mut(id)?;
        if let Some(title) = changes.title {
            course.title = title;
        }
        if let Some(teacher) = changes.teacher {
            course.teacher = Some(teacher);
        }
        if let Some(description) = changes.description {
            course.description = description;
        }
        if let Some(topic) = changes.topic {
            course.topic = Some(topic);
        }
        if let Some(level) = changes.level {
            course.level = Some(level);
        }
        Ok(course.clone())
    }

    async fn delete_course(&self, id: &str) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.course(id)?;
        tables.courses.retain(|c| c.id.as_str() != id);
        Ok(())
    }

    async fn list_students(&self) -> AppResult<Vec<Student>> {
        Ok(self.tables.read().await.students.clone())
    }

    async fn get_student(&self, id: &str) -> AppResult<Student> {
        self.tables.read().await.student(id).cloned()
    }

    async fn get_students(&self, ids: &[String]) -> AppResult<Vec<Student>> {
        for id in ids {
            parse_id(id)?;
        }
        let tables = self.tables.read().await;
        Ok(tables
            .students
            .iter()
            .filter(|s| ids.iter().any(|id| id == s.id.as_str()))
            .cloned()
            .collect())
    }

    async fn create_student(&self, input: PersonInput) -> AppResult<Student> {
        let student = Student {
            id: ObjectId::new().to_hex().into(),
            name: input.name,
            email: input.email,
        };
        self.tables.write().await.students.push(student.clone());
        Ok(student)
    }

    async fn update_student(&self, id: &str, changes: PersonEditInput) -> AppResult<Student> {
        let mut tables = self.tables.write().await;
        let student = tables.student_mut(id)?;
        if let Some(name) = changes.name {
            student.name = name;
        }
        if let Some(email) = changes.email {
            student.email = email;
        }
        Ok(student.clone())
    }

    async fn delete_student(&self, id: &str) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.student(id)?;
        tables.students.retain(|s| s.id.as_str() != id);
        for course in tables.courses.iter_mut() {
            course.people_ids.retain(|p| p != id);
        }
        Ok(())
    }

    async fn enroll(&self, course_id: &str, student_id: &str) -> AppResult<Course> {
        parse_id(course_id)?;
        let mut tables = self.tables.write().await;
        tables.student(student_id)?;
        let course = tables.course_mut(course_id)?;
        if !course.people_ids.iter().any(|p| p == student_id) {
            course.people_ids.push(student_id.to_string());
        }
        Ok(course.clone())
    }
}
