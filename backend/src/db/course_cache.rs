use chrono::{SubsecRound, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use crate::db::assignments;
use crate::error::AppError;
use crate::models::{CacheRow, CachedCourse, Course, CourseId, assignment::millis_to_utc};

/// Appends a snapshot of `course`. Existing rows for the same user and URL are
/// left alone; a refresh has to delete them explicitly.
pub async fn insert_cached_course(
    db: &SqlitePool,
    user_id: &str,
    lms_url: &str,
    course: &Course,
) -> Result<CachedCourse, AppError> {
    let id = Uuid::now_v7().to_string();
    let cached_at = Utc::now().trunc_subsecs(3);
    let course_json = serde_json::to_string(course)?;

    sqlx::query(
        r#"
        INSERT INTO course_cache (id, user_id, lms_url, course_id, course_json, course_json_lower, cached_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(lms_url)
    .bind(course.id.get())
    .bind(&course_json)
    .bind(course_json.to_lowercase())
    .bind(cached_at.timestamp_millis())
    .execute(db)
    .await?;

    Ok(CachedCourse {
        id,
        course: course.clone(),
        lms_url: lms_url.to_string(),
        user_id: user_id.to_string(),
        cached_at,
    })
}

/// Every snapshot of `user_id` taken from `lms_url`, with each course's
/// assignments replaced by the current ones from the assignment store.
/// Unreadable rows are logged and skipped.
pub async fn fetch_cached_courses(
    db: &SqlitePool,
    user_id: &str,
    lms_url: &str,
) -> Result<Vec<CachedCourse>, AppError> {
    let rows = sqlx::query_as::<_, CacheRow>(
        r#"
        SELECT id, user_id, lms_url, course_json, cached_at
        FROM course_cache
        WHERE user_id = ?1 AND lms_url = ?2
        ORDER BY cached_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .bind(lms_url)
    .fetch_all(db)
    .await?;

    inflate_rows(db, rows).await
}

pub async fn fetch_cache_ids(
    db: &SqlitePool,
    user_id: &str,
    lms_url: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM course_cache WHERE user_id = ?1 AND lms_url = ?2")
        .bind(user_id)
        .bind(lms_url)
        .fetch_all(db)
        .await
}

pub async fn delete_cached_courses(db: &SqlitePool, ids: &[String]) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM course_cache WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let result = builder.build().execute(db).await?;
    Ok(result.rows_affected())
}

pub async fn delete_cached_courses_for_user(db: &SqlitePool, user_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM course_cache WHERE user_id = ?1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Snapshots of `user_id` whose JSON contains `term` (case-insensitive, with
/// Unicode case folding) or matches it in the full-text index.
///
/// The ownership predicate sits inside both branches of the `OR`, so neither
/// branch can return another user's rows.
pub async fn search_cached_courses(
    db: &SqlitePool,
    user_id: &str,
    term: &str,
) -> Result<Vec<CachedCourse>, AppError> {
    let needle = term.to_lowercase();
    let rows = match fts_query(term) {
        Some(fts) => {
            sqlx::query_as::<_, CacheRow>(
                r#"
                SELECT id, user_id, lms_url, course_json, cached_at
                FROM course_cache
                WHERE (user_id = ?1 AND instr(course_json_lower, ?2) > 0)
                   OR (user_id = ?1 AND id IN (
                        SELECT cache_id FROM course_cache_fts
                        WHERE course_cache_fts MATCH ?3 AND user_id = ?1))
                ORDER BY cached_at DESC, id DESC
                "#,
            )
            .bind(user_id)
            .bind(&needle)
            .bind(fts)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, CacheRow>(
                r#"
                SELECT id, user_id, lms_url, course_json, cached_at
                FROM course_cache
                WHERE user_id = ?1 AND instr(course_json_lower, ?2) > 0
                ORDER BY cached_at DESC, id DESC
                "#,
            )
            .bind(user_id)
            .bind(&needle)
            .fetch_all(db)
            .await?
        }
    };

    inflate_rows(db, rows).await
}

/// Whether any snapshot of `user_id` is for `course_id`.
pub async fn user_has_cached_course(
    db: &SqlitePool,
    user_id: &str,
    course_id: CourseId,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM course_cache WHERE user_id = ?1 AND course_id = ?2)",
    )
    .bind(user_id)
    .bind(course_id.get())
    .fetch_one(db)
    .await
}

async fn inflate_rows(db: &SqlitePool, rows: Vec<CacheRow>) -> Result<Vec<CachedCourse>, AppError> {
    let mut courses = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cached = match decode_row(row) {
            Ok(cached) => cached,
            Err(e) => {
                warn!("skipping cache row: {}", e);
                continue;
            }
        };
        cached.course.assignments =
            assignments::fetch_assignments_by_course(db, cached.course.id).await?;
        courses.push(cached);
    }
    Ok(courses)
}

fn decode_row(row: CacheRow) -> Result<CachedCourse, AppError> {
    let mut course: Course = serde_json::from_str(&row.course_json).map_err(|source| {
        AppError::CorruptCacheEntry {
            id: row.id.clone(),
            source,
        }
    })?;

    // the row column is the owner; the blob's copy may be stale
    course.user_id = row.user_id.clone();

    Ok(CachedCourse {
        cached_at: millis_to_utc(row.cached_at, "cached_at")?,
        id: row.id,
        course,
        lms_url: row.lms_url,
        user_id: row.user_id,
    })
}

/// Turns free text into an FTS5 query of quoted terms, all of which must
/// match. `None` when there is nothing to search for.
fn fts_query(term: &str) -> Option<String> {
    let terms: Vec<String> = term
        .split_whitespace()
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}
