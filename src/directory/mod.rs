pub mod directory_models;
pub mod directory_repository;

pub use directory_models::{AgencyStatus, OfferContext, SubscriptionStatus};
pub use directory_repository::{OfferDirectory, PgOfferDirectory};
