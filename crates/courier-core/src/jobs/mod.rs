//! Background work: download jobs and delayed artifact reclamation.

pub mod reclaimer;
pub mod runner;

pub use reclaimer::Reclaimer;
pub use runner::{JobHandle, JobReport, JobRunner, JobSettings};
