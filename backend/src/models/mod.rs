pub mod assignment;
pub mod course;
pub mod course_id;

pub use assignment::{
    Assignment, AssignmentRow, CreateAssignmentRequest, NewAssignmentRequest, SetDoneRequest, UpdateAssignmentRequest,
};
pub use course::{CacheRow, CachedCourse, Course, CourseStat, RefreshCacheRequest};
pub use course_id::{CourseId, InvalidIdentifier, RawCourseId, normalize};
