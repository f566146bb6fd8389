use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{CourseId, InvalidIdentifier, RawCourseId, normalize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub due_date: DateTime<Utc>,
    pub course_id: CourseId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub from_moodle: bool,
    #[serde(default)]
    pub done_by: Vec<String>,
}

impl Assignment {
    pub fn is_done_by(&self, user_id: &str) -> bool {
        self.done_by.iter().any(|u| u == user_id)
    }
}

/// Storage shape of an assignment; timestamps are millisecond epochs and
/// `done_by` arrives as a JSON array built by SQLite.
#[derive(Debug, FromRow)]
pub struct AssignmentRow {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub course_id: i64,
    pub due_date: i64,
    pub created_at: i64,
    pub from_moodle: bool,
    pub done_by: String,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = sqlx::Error;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        let done_by: Vec<String> = serde_json::from_str(&row.done_by)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Assignment {
            due_date: millis_to_utc(row.due_date, "due_date")?,
            created_at: millis_to_utc(row.created_at, "created_at")?,
            id: row.id,
            creator_id: row.creator_id,
            title: row.title,
            course_id: CourseId::from(row.course_id),
            from_moodle: row.from_moodle,
            done_by,
        })
    }
}

pub(crate) fn millis_to_utc(ms: i64, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        sqlx::Error::Decode(format!("{} out of range: {}", column, ms).into())
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignmentRequest {
    pub title: String,
    pub course_id: CourseId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub from_moodle: bool,
}

/// Body of a create call. The course id is kept raw so a malformed one is
/// reported as an invalid identifier rather than a generic decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssignmentRequest {
    pub title: String,
    pub course_id: RawCourseId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub from_moodle: bool,
}

impl TryFrom<CreateAssignmentRequest> for NewAssignmentRequest {
    type Error = InvalidIdentifier;

    fn try_from(req: CreateAssignmentRequest) -> Result<Self, Self::Error> {
        Ok(NewAssignmentRequest {
            title: req.title,
            course_id: normalize(req.course_id)?,
            due_date: req.due_date,
            from_moodle: req.from_moodle,
        })
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAssignmentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDoneRequest {
    pub done: bool,
}
