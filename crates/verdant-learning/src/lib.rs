//! Verdant: Learning Progress bounded context.
//!
//! Responsible for enrollments, saved activity responses, quality-control
//! validation of lesson submissions, lesson completion, and gamification
//! (XP, levels, streaks and achievements).

pub mod application;
pub mod domain;
