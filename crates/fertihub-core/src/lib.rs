//! Configuration, secret handling and consultation orchestration.

pub mod config;
pub mod consultation;
pub mod vault;

pub use config::Config;
pub use consultation::{ConsultationError, ConsultationOutcome, ConsultationService, Phase};
