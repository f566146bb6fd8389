use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db::course_cache;
use crate::error::AppError;
use crate::models::CourseId;

/// Decides whether a user may mark assignments of a course as done.
#[async_trait]
pub trait CourseAccess: Send + Sync {
    async fn user_has_course(&self, user_id: &str, course_id: CourseId) -> Result<bool, AppError>;
}

/// Grants access to courses that appear in the user's cached LMS snapshots.
pub struct CachedCourseAccess {
    db: SqlitePool,
}

impl CachedCourseAccess {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CourseAccess for CachedCourseAccess {
    async fn user_has_course(&self, user_id: &str, course_id: CourseId) -> Result<bool, AppError> {
        Ok(course_cache::user_has_cached_course(&self.db, user_id, course_id).await?)
    }
}
