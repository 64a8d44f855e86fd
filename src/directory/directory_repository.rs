use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{directory::directory_models::OfferContext, error::Result};

#[async_trait]
pub trait OfferDirectory: Send + Sync {
    async fn find_offer(&self, offer_id: Uuid) -> Result<Option<OfferContext>>;
}

#[derive(Clone)]
pub struct PgOfferDirectory {
    pool: PgPool,
}

impl PgOfferDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfferDirectory for PgOfferDirectory {
    async fn find_offer(&self, offer_id: Uuid) -> Result<Option<OfferContext>> {
        let context = sqlx::query_as::<_, OfferContext>(
            "SELECT o.id AS offer_id,
                    a.id AS agency_id,
                    a.owner_id AS agency_owner_id,
                    a.status AS agency_status,
                    a.subscription_status
             FROM offers o
             JOIN agencies a ON a.id = o.agency_id
             WHERE o.id = $1",
        )
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(context)
    }
}
