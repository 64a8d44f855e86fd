use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "agency_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AgencyStatus {
    Active,
    Suspended,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    None,
    Pending,
    Active,
    Expired,
    Rejected,
}

/// Everything the messaging core needs to know about an offer: the agency
/// behind it, who owns that agency, and whether the agency is eligible to be
/// messaged. Read-only; the marketplace service owns these rows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferContext {
    pub offer_id: Uuid,
    pub agency_id: Uuid,
    pub agency_owner_id: Uuid,
    pub agency_status: AgencyStatus,
    pub subscription_status: SubscriptionStatus,
}

impl OfferContext {
    /// Starting a new conversation requires a fully active, paying agency.
    pub fn accepts_new_conversations(&self) -> bool {
        self.agency_status == AgencyStatus::Active
            && self.subscription_status == SubscriptionStatus::Active
    }

    /// Replying in an existing conversation is looser: agencies keep their
    /// open conversations usable while a subscription renewal is pending.
    /// Only suspension or a lapsed/rejected subscription blocks replies.
    pub fn accepts_replies(&self) -> bool {
        self.agency_status != AgencyStatus::Suspended
            && matches!(
                self.subscription_status,
                SubscriptionStatus::Active | SubscriptionStatus::Pending
            )
    }
}
