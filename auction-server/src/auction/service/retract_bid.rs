use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
    time::OffsetDateTime,
};

#[derive(Clone, Debug)]
pub struct RetractBidInput {
    pub bid_id:       entities::BidId,
    pub requester_id: UserId,
}

impl Service {
    async fn retract_bid_for_lock(
        &self,
        mut bid: entities::Bid,
        lock: entities::AuctionLock,
    ) -> Result<(), RestError> {
        let _lock = lock.lock().await;
        let now = OffsetDateTime::now_utc();

        // A retraction must not resurrect a finished auction's state.
        let mut auction = self.repo.get_auction(bid.auction_id).await?;
        if auction.state.is_terminal() {
            return Err(RestError::AuctionClosedForRetraction);
        }

        // The retracted bid is the winning bid only if both the bidder and
        // the amount match: the bidder may have a later, higher bid that is
        // still live, in which case this retraction must not touch the
        // auction at all.
        let was_winning_bid = auction.winner_id() == Some(bid.bidder_id)
            && auction.current_price() == bid.amount();

        let auction_update = if was_winning_bid {
            let remaining: Vec<entities::Bid> = self
                .repo
                .get_bids_by_auction(bid.auction_id)
                .await?
                .into_iter()
                .filter(|other| other.is_live() && other.id != bid.id)
                .collect();
            auction.recompute_winner(&remaining, now);
            Some(&auction)
        } else {
            None
        };

        bid.delete(now);
        let deleted_at = bid.deleted_at().unwrap_or(now);
        if !self.repo.retract_bid(bid.id, deleted_at, auction_update).await? {
            // Lost the race against another retraction of the same bid.
            return Err(RestError::BidAlreadyRetracted);
        }

        if was_winning_bid {
            tracing::info!(
                auction_id = %auction.id,
                bid_id = %bid.id,
                new_price = %auction.current_price(),
                "Winning bid retracted, recomputed auction price"
            );
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(bid_id = %input.bid_id))]
    pub async fn retract_bid(&self, input: RetractBidInput) -> Result<(), RestError> {
        let bid = self.repo.get_bid(input.bid_id).await?;
        if !bid.is_live() {
            return Err(RestError::BidAlreadyRetracted);
        }
        if bid.bidder_id != input.requester_id {
            return Err(RestError::NotBidOwner);
        }

        let auction_id = bid.auction_id;
        let auction_lock = self.repo.get_or_create_auction_lock(auction_id).await;
        let result = self.retract_bid_for_lock(bid, auction_lock).await;
        self.repo.remove_auction_lock(&auction_id).await;
        result
    }
}
