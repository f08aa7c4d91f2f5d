//! `SQLite` persistence for the clinic network: clinics, staff and patients.

pub mod error;
pub mod password;
pub mod sqlite;
pub mod types;

pub use error::StoreError;
pub use sqlite::SqliteStore;
pub use types::{
    ApiKey, Clinic, ClinicId, ClinicType, ClinicWithLinks, NewClinic, NewPatient, NewStaff,
    Patient, PatientId, Staff, StaffId,
};
