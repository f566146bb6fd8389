use async_trait::async_trait;

use crate::error::AppError;
use crate::models::Course;

/// Result of asking the LMS for a user's courses.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveCourses {
    /// The user has no LMS URL or token. Not an error.
    NotConfigured,
    Fetched { lms_url: String, courses: Vec<Course> },
}

/// The LMS HTTP client lives outside this crate; it resolves the user's LMS
/// credentials itself. Failures are reported as `AppError::Upstream` and are
/// not retried here.
#[async_trait]
pub trait LmsClient: Send + Sync {
    async fn fetch_live_courses(&self, user_id: &str) -> Result<LiveCourses, AppError>;
}

pub struct NoopLmsClient;

#[async_trait]
impl LmsClient for NoopLmsClient {
    async fn fetch_live_courses(&self, _user_id: &str) -> Result<LiveCourses, AppError> {
        Ok(LiveCourses::NotConfigured)
    }
}
