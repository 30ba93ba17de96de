pub mod payment;
pub mod signature;

pub use payment::PaymentService;
pub use signature::{sign_payment, verify_payment_signature};
