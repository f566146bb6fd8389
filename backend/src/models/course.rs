use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Assignment, CourseId};

/// A course as fetched from the LMS or inflated from a cache snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub from_moodle: bool,
    #[serde(rename = "user")]
    pub user_id: String,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedCourse {
    pub id: String,
    pub course: Course,
    pub lms_url: String,
    pub user_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct CacheRow {
    pub id: String,
    pub user_id: String,
    pub lms_url: String,
    pub course_json: String,
    pub cached_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseStat {
    pub course_id: CourseId,
    pub name: String,
    pub assignment_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshCacheRequest {
    pub lms_url: String,
    pub courses: Vec<Course>,
}
