use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::access::CourseAccess;
use crate::db::assignments;
use crate::error::AppError;
use crate::models::{Assignment, CourseId, NewAssignmentRequest, UpdateAssignmentRequest};

pub struct AssignmentService {
    db: SqlitePool,
    access: Arc<dyn CourseAccess>,
}

impl AssignmentService {
    pub fn new(db: SqlitePool, access: Arc<dyn CourseAccess>) -> Self {
        Self { db, access }
    }

    pub async fn create(
        &self,
        creator_id: &str,
        req: NewAssignmentRequest,
    ) -> Result<Assignment, AppError> {
        if req.title.trim().is_empty() {
            return Err(AppError::BadRequest("title must not be empty".to_string()));
        }
        let assignment = assignments::insert_assignment(&self.db, creator_id, req).await?;
        info!("assignment {} created by {}", assignment.id, creator_id);
        Ok(assignment)
    }

    pub async fn get(&self, id: &str) -> Result<Assignment, AppError> {
        assignments::find_assignment_by_id(&self.db, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Title and due date only; restricted to the creator.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        req: UpdateAssignmentRequest,
    ) -> Result<Assignment, AppError> {
        let current = self.get(id).await?;
        ensure_creator(&current, actor_id)?;

        if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::BadRequest("title must not be empty".to_string()));
        }

        assignments::update_assignment(&self.db, id, req)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Hard delete; returns the record as it was.
    pub async fn delete(&self, actor_id: &str, id: &str) -> Result<Assignment, AppError> {
        let current = self.get(id).await?;
        ensure_creator(&current, actor_id)?;

        if !assignments::delete_assignment(&self.db, id).await? {
            return Err(AppError::NotFound);
        }
        info!("assignment {} deleted by {}", id, actor_id);
        Ok(current)
    }

    pub async fn list_by_creator(
        &self,
        user_id: &str,
        max_age_days: Option<u32>,
    ) -> Result<Vec<Assignment>, AppError> {
        Ok(assignments::fetch_assignments_by_creator(&self.db, user_id, max_age_days).await?)
    }

    /// Every assignment of a course the user has access to.
    pub async fn list_by_course(
        &self,
        user_id: &str,
        course_id: CourseId,
    ) -> Result<Vec<Assignment>, AppError> {
        self.ensure_course_access(user_id, course_id).await?;
        Ok(assignments::fetch_assignments_by_course(&self.db, course_id).await?)
    }

    /// Marks or unmarks the assignment as done for `user_id`. Safe to repeat.
    pub async fn set_done(&self, id: &str, user_id: &str, done: bool) -> Result<Assignment, AppError> {
        let current = self.get(id).await?;
        self.ensure_course_access(user_id, current.course_id).await?;

        if !assignments::set_done(&self.db, id, user_id, done).await? {
            return Err(AppError::NotFound);
        }
        debug!("assignment {} done={} for {}", id, done, user_id);
        self.get(id).await
    }

    async fn ensure_course_access(&self, user_id: &str, course_id: CourseId) -> Result<(), AppError> {
        if !self.access.user_has_course(user_id, course_id).await? {
            return Err(AppError::Forbidden(format!("no access to course {}", course_id)));
        }
        Ok(())
    }
}

fn ensure_creator(assignment: &Assignment, actor_id: &str) -> Result<(), AppError> {
    if assignment.creator_id != actor_id {
        return Err(AppError::Forbidden(
            "you are not the creator of this assignment".to_string(),
        ));
    }
    Ok(())
}
