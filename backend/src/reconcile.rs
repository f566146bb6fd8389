use std::collections::HashSet;

use chrono::{DateTime, TimeZone};

use crate::models::{CachedCourse, Course, CourseId};

/// Merges live and cached courses into one list with a single entry per
/// `(owner, course id)`. Live courses come first, so they win over any cached
/// snapshot of the same course.
pub fn reconcile(live: Vec<Course>, cached: Vec<CachedCourse>) -> Vec<Course> {
    let mut seen: HashSet<(String, CourseId)> = HashSet::new();
    let mut merged = Vec::with_capacity(live.len() + cached.len());

    for course in live.into_iter().chain(cached.into_iter().map(|c| c.course)) {
        if seen.insert((course.user_id.clone(), course.id)) {
            merged.push(course);
        }
    }

    merged
}

/// Keeps only assignments due today or later, judged by calendar day in the
/// time zone of `now`, and drops courses left without any.
pub fn active_courses<Tz: TimeZone>(courses: Vec<Course>, now: &DateTime<Tz>) -> Vec<Course> {
    let today = now.date_naive();
    let tz = now.timezone();

    courses
        .into_iter()
        .filter_map(|mut course| {
            course
                .assignments
                .retain(|a| a.due_date.with_timezone(&tz).date_naive() >= today);
            if course.assignments.is_empty() {
                None
            } else {
                Some(course)
            }
        })
        .collect()
}
