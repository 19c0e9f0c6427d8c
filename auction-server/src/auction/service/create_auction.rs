use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

pub struct CreateAuctionInput {
    pub auction: entities::AuctionCreate,
}

impl Service {
    /// Shapes and dates are validated at the API boundary; the only
    /// business default applied here is that a new auction opens at its
    /// starting price with no winner.
    #[tracing::instrument(skip_all, fields(seller_id = %input.auction.seller_id))]
    pub async fn create_auction(
        &self,
        input: CreateAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let now = OffsetDateTime::now_utc();
        let auction = entities::Auction::new(input.auction, now);
        self.repo.add_auction(&auction).await?;
        tracing::info!(auction_id = %auction.id, "Created auction");
        Ok(auction)
    }
}
