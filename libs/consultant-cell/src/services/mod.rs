pub mod consultant;

pub use consultant::{apply_filters, ConsultantService};
