// Public API - what other modules can use
pub use schedule::WeeklyWindow;
pub use task::{spawn_weekly_reset_task, start_weekly_reset_task, ResetOutcome, WeeklyReset};

// Internal modules
mod schedule;
mod task;
