use chrono::{Duration, SubsecRound, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{Assignment, AssignmentRow, CourseId, NewAssignmentRequest, UpdateAssignmentRequest};

const SELECT_ASSIGNMENT: &str = r#"
    SELECT
        a.id,
        a.creator_id,
        a.title,
        a.course_id,
        a.due_date,
        a.created_at,
        a.from_moodle,
        (SELECT json_group_array(d.user_id)
            FROM assignment_done_by d
            WHERE d.assignment_id = a.id) AS done_by
    FROM assignments a
"#;

fn into_assignments(rows: Vec<AssignmentRow>) -> Result<Vec<Assignment>, sqlx::Error> {
    rows.into_iter().map(Assignment::try_from).collect()
}

pub async fn insert_assignment(
    db: &SqlitePool,
    creator_id: &str,
    req: NewAssignmentRequest,
) -> Result<Assignment, sqlx::Error> {
    let id = Uuid::now_v7().to_string();
    let now = Utc::now().trunc_subsecs(3);
    let due_date = req.due_date.trunc_subsecs(3);

    sqlx::query(
        r#"
        INSERT INTO assignments
            (id, creator_id, title, course_id, due_date, created_at, from_moodle)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&id)
    .bind(creator_id)
    .bind(&req.title)
    .bind(req.course_id.get())
    .bind(due_date.timestamp_millis())
    .bind(now.timestamp_millis())
    .bind(req.from_moodle)
    .execute(db)
    .await?;

    Ok(Assignment {
        id,
        creator_id: creator_id.to_string(),
        title: req.title,
        due_date,
        course_id: req.course_id,
        created_at: now,
        from_moodle: req.from_moodle,
        done_by: Vec::new(),
    })
}

pub async fn find_assignment_by_id(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    let sql = format!("{} WHERE a.id = ?1", SELECT_ASSIGNMENT);
    sqlx::query_as::<_, AssignmentRow>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?
        .map(Assignment::try_from)
        .transpose()
}

pub async fn delete_assignment(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_assignments_by_course(
    db: &SqlitePool,
    course_id: CourseId,
) -> Result<Vec<Assignment>, sqlx::Error> {
    let sql = format!("{} WHERE a.course_id = ?1 ORDER BY a.due_date", SELECT_ASSIGNMENT);
    let rows = sqlx::query_as::<_, AssignmentRow>(&sql)
        .bind(course_id.get())
        .fetch_all(db)
        .await?;
    into_assignments(rows)
}

/// Assignments authored by `creator_id`. With `max_age_days` only those due
/// at or after `now - max_age_days` are returned; a window reaching past the
/// earliest representable date is treated as unbounded.
pub async fn fetch_assignments_by_creator(
    db: &SqlitePool,
    creator_id: &str,
    max_age_days: Option<u32>,
) -> Result<Vec<Assignment>, sqlx::Error> {
    let cutoff = max_age_days.and_then(|days| {
        Duration::try_days(i64::from(days)).and_then(|age| Utc::now().checked_sub_signed(age))
    });

    match cutoff {
        Some(cutoff) => {
            let sql = format!(
                "{} WHERE a.creator_id = ?1 AND a.due_date >= ?2 ORDER BY a.due_date",
                SELECT_ASSIGNMENT
            );
            let rows = sqlx::query_as::<_, AssignmentRow>(&sql)
                .bind(creator_id)
                .bind(cutoff.timestamp_millis())
                .fetch_all(db)
                .await?;
            into_assignments(rows)
        }
        None => {
            let sql = format!("{} WHERE a.creator_id = ?1 ORDER BY a.due_date", SELECT_ASSIGNMENT);
            let rows = sqlx::query_as::<_, AssignmentRow>(&sql)
                .bind(creator_id)
                .fetch_all(db)
                .await?;
            into_assignments(rows)
        }
    }
}

pub async fn fetch_all_assignments(db: &SqlitePool) -> Result<Vec<Assignment>, sqlx::Error> {
    let sql = format!("{} ORDER BY a.due_date", SELECT_ASSIGNMENT);
    let rows = sqlx::query_as::<_, AssignmentRow>(&sql).fetch_all(db).await?;
    into_assignments(rows)
}

/// Changes only the fields present in `req`. Returns `None` when the id is unknown.
pub async fn update_assignment(
    db: &SqlitePool,
    id: &str,
    req: UpdateAssignmentRequest,
) -> Result<Option<Assignment>, sqlx::Error> {
    let due_date = req.due_date.map(|d| d.trunc_subsecs(3).timestamp_millis());

    let result = sqlx::query(
        r#"
        UPDATE assignments
        SET title = COALESCE(?1, title),
            due_date = COALESCE(?2, due_date)
        WHERE id = ?3
        "#,
    )
    .bind(req.title)
    .bind(due_date)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    if result == 0 {
        return Ok(None);
    }
    find_assignment_by_id(db, id).await
}

/// Adds or removes `user_id` in the assignment's completion set. Each branch
/// is a single statement so concurrent toggles never overwrite each other.
/// Returns `false` when the assignment does not exist.
pub async fn set_done(
    db: &SqlitePool,
    assignment_id: &str,
    user_id: &str,
    done: bool,
) -> Result<bool, sqlx::Error> {
    let affected = if done {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO assignment_done_by (assignment_id, user_id, marked_at)
            SELECT id, ?2, ?3 FROM assignments WHERE id = ?1
            "#,
        )
        .bind(assignment_id)
        .bind(user_id)
        .bind(Utc::now().timestamp_millis())
        .execute(db)
        .await?
        .rows_affected()
    } else {
        sqlx::query("DELETE FROM assignment_done_by WHERE assignment_id = ?1 AND user_id = ?2")
            .bind(assignment_id)
            .bind(user_id)
            .execute(db)
            .await?
            .rows_affected()
    };

    if affected > 0 {
        return Ok(true);
    }

    // no-op toggle: tell "already in that state" apart from "no such assignment"
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM assignments WHERE id = ?1)")
        .bind(assignment_id)
        .fetch_one(db)
        .await?;
    Ok(exists)
}
