pub mod hospital;

pub use hospital::{unwrap_item, unwrap_list, ApiError, HospitalApiClient};
