use {
    super::{
        models,
        Repository,
    },
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    /// Soft delete a bid, and when the retracted bid was the winning one,
    /// write the recomputed auction in the same atomic unit. Returns
    /// `false` without writing anything when the bid was already dead.
    pub async fn retract_bid(
        &self,
        bid_id: entities::BidId,
        deleted_at: OffsetDateTime,
        auction_update: Option<&entities::Auction>,
    ) -> Result<bool, RestError> {
        self.db
            .retract_bid(bid_id, deleted_at, auction_update.map(models::Auction::new))
            .await
    }
}
