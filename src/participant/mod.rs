pub mod participant_models;
pub mod participant_repository;

pub use participant_models::Participant;
pub use participant_repository::{ParticipantRepository, PgParticipantRepository};
