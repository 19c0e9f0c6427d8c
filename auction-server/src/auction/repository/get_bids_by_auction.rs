use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    /// Full bid history, live and dead, best bid first (highest amount,
    /// ties by earliest creation).
    pub async fn get_bids_by_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Vec<entities::Bid>, RestError> {
        Ok(self
            .db
            .get_bids_by_auction(auction_id)
            .await?
            .iter()
            .map(|bid| bid.get_bid_entity())
            .collect())
    }
}
