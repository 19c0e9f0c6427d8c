use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
    time::OffsetDateTime,
};

pub struct UpdateAuctionInput {
    pub auction_id:   entities::AuctionId,
    pub requester_id: UserId,
    pub title:        Option<String>,
    pub description:  Option<String>,
}

impl Service {
    /// Only title and description are editable after creation, and only
    /// by the seller. Prices and dates are fixed for the auction's life.
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id))]
    pub async fn update_auction(
        &self,
        input: UpdateAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let now = OffsetDateTime::now_utc();
        let mut auction = self.repo.get_auction(input.auction_id).await?;
        if auction.seller_id != input.requester_id {
            return Err(RestError::NotAuctionSeller);
        }

        if auction.update_details(input.title, input.description, now)? {
            self.repo.update_auction(&auction).await?;
        }
        Ok(auction)
    }
}
