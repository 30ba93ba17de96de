pub mod store;
pub mod wizard;

pub use store::{MemoryWizardStore, RedisWizardStore, WizardStore};
pub use wizard::BookingWizardService;
