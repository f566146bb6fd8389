use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{assignments, course_cache};
use crate::error::AppError;
use crate::lms::{LiveCourses, LmsClient};
use crate::models::{Course, CourseStat};
use crate::reconcile::{active_courses, reconcile};

pub struct CourseService {
    db: SqlitePool,
    lms: Arc<dyn LmsClient>,
    reference_offset: FixedOffset,
}

impl CourseService {
    pub fn new(db: SqlitePool, lms: Arc<dyn LmsClient>, reference_offset: FixedOffset) -> Self {
        Self {
            db,
            lms,
            reference_offset,
        }
    }

    /// Courses with at least one assignment due today or later.
    pub async fn active_courses(&self, user_id: &str) -> Result<Vec<Course>, AppError> {
        let courses = self.load_courses(user_id).await?;
        let now = Utc::now().with_timezone(&self.reference_offset);
        Ok(active_courses(courses, &now))
    }

    /// Cached courses of `user_id` matching `term`, one entry per course.
    pub async fn search(&self, user_id: &str, term: &str) -> Result<Vec<Course>, AppError> {
        let matches = course_cache::search_cached_courses(&self.db, user_id, term).await?;
        Ok(reconcile(Vec::new(), matches))
    }

    /// Number of assignments per course, keyed by course id.
    pub async fn course_stats(&self, user_id: &str) -> Result<Vec<CourseStat>, AppError> {
        let courses = self.load_courses(user_id).await?;
        Ok(courses
            .into_iter()
            .map(|c| CourseStat {
                course_id: c.id,
                name: c.name,
                assignment_count: c.assignments.len(),
            })
            .collect())
    }

    /// Stores a fresh snapshot of `courses` and then drops the previous rows
    /// for the same user and URL. Readers may briefly see both, never neither.
    pub async fn refresh_cache(
        &self,
        user_id: &str,
        lms_url: &str,
        courses: Vec<Course>,
    ) -> Result<usize, AppError> {
        let previous = course_cache::fetch_cache_ids(&self.db, user_id, lms_url).await?;

        for mut course in courses.iter().cloned() {
            course.user_id = user_id.to_string();
            course_cache::insert_cached_course(&self.db, user_id, lms_url, &course).await?;
        }

        let removed = course_cache::delete_cached_courses(&self.db, &previous).await?;
        info!(
            "cache refreshed for {}: {} stored, {} replaced",
            user_id,
            courses.len(),
            removed
        );
        Ok(courses.len())
    }

    pub async fn invalidate_cache(&self, user_id: &str) -> Result<u64, AppError> {
        let removed = course_cache::delete_cached_courses_for_user(&self.db, user_id).await?;
        info!("cache invalidated for {}: {} rows removed", user_id, removed);
        Ok(removed)
    }

    /// Live courses merged with the cached ones, each carrying its current
    /// assignments. Empty when the user has no LMS configured.
    async fn load_courses(&self, user_id: &str) -> Result<Vec<Course>, AppError> {
        let (lms_url, mut live) = match self.lms.fetch_live_courses(user_id).await? {
            LiveCourses::NotConfigured => {
                info!("no moodle access configured for user {}", user_id);
                return Ok(Vec::new());
            }
            LiveCourses::Fetched { lms_url, courses } => (lms_url, courses),
        };

        let cached = course_cache::fetch_cached_courses(&self.db, user_id, &lms_url).await?;

        if !live.is_empty() {
            if let Err(e) = self.refresh_cache(user_id, &lms_url, live.clone()).await {
                warn!("failed to cache courses for {}: {}", user_id, e);
            }
        }

        for course in &mut live {
            course.user_id = user_id.to_string();
            course.assignments = assignments::fetch_assignments_by_course(&self.db, course.id).await?;
        }

        Ok(reconcile(live, cached))
    }
}
