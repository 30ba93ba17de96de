pub mod availability;
pub mod range;
pub mod slot;

pub use availability::{filter_available, filter_by_status, sort_slots};
pub use range::generate_slot_range;
pub use slot::SlotService;
