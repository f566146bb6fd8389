use std::sync::Arc;

use chrono::FixedOffset;
use sqlx::SqlitePool;

use crate::access::CourseAccess;
use crate::lms::LmsClient;
use crate::services::{AssignmentService, CourseService};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub lms: Arc<dyn LmsClient>,
    pub access: Arc<dyn CourseAccess>,
    pub reference_offset: FixedOffset,
}

impl AppState {
    pub fn assignments(&self) -> AssignmentService {
        AssignmentService::new(self.db.clone(), self.access.clone())
    }

    pub fn courses(&self) -> CourseService {
        CourseService::new(self.db.clone(), self.lms.clone(), self.reference_offset)
    }
}
