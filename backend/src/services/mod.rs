pub mod assignment_service;
pub mod course_service;

pub use assignment_service::AssignmentService;
pub use course_service::CourseService;
