pub mod appointment;
pub mod lifecycle;
pub mod search;

pub use appointment::AppointmentService;
pub use lifecycle::AppointmentLifecycleService;
pub use search::{apply_filters, summarize};
