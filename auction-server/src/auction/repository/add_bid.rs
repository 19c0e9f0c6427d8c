use {
    super::{
        models,
        Repository,
    },
    crate::{
        api::RestError,
        auction::entities,
    },
    bigdecimal::BigDecimal,
};

impl Repository {
    /// Persist a freshly accepted bid together with the auction's new
    /// price and winner as one atomic unit. Returns `false` without
    /// writing anything when the stored price no longer matches
    /// `expected_price` (another writer got there first).
    pub async fn add_bid(
        &self,
        bid: &entities::Bid,
        auction: &entities::Auction,
        expected_price: &BigDecimal,
    ) -> Result<bool, RestError> {
        self.db
            .add_bid(
                &models::Bid::new(bid),
                &models::Auction::new(auction),
                expected_price,
            )
            .await
    }
}
