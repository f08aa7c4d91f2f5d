//! HTTP API for the clinic network: consultations, clinics, patients and
//! file storage, behind optional bearer auth and per-IP rate limiting.

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use server::{AiSettings, GatewayServer};

#[cfg(test)]
mod test_support;
