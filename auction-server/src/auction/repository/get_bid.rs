use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn get_bid(&self, bid_id: entities::BidId) -> Result<entities::Bid, RestError> {
        Ok(self.db.get_bid(bid_id).await?.get_bid_entity())
    }
}
