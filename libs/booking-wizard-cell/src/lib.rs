pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

pub use error::WizardError;
pub use models::*;
pub use router::booking_wizard_routes;
pub use services::*;
pub use state::WizardState;
