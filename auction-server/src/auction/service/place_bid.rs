use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
    bigdecimal::BigDecimal,
    time::OffsetDateTime,
};

/// Attempts per placement before a concurrent-write conflict is surfaced
/// to the caller. Only conflicts are retried; domain rejections are
/// deterministic and final.
pub const BID_PLACEMENT_MAX_ATTEMPTS: usize = 3;

#[derive(Clone, Debug)]
pub struct PlaceBidInput {
    pub auction_id: entities::AuctionId,
    pub bidder_id:  UserId,
    pub amount:     BigDecimal,
}

impl Service {
    async fn place_bid_for_lock(
        &self,
        input: &PlaceBidInput,
        lock: entities::AuctionLock,
    ) -> Result<entities::Bid, RestError> {
        let _lock = lock.lock().await;
        for _ in 0..BID_PLACEMENT_MAX_ATTEMPTS {
            let now = OffsetDateTime::now_utc();
            let mut auction = self.repo.get_auction(input.auction_id).await?;
            let expected_price = auction.current_price().clone();

            let bid = auction.place_bid(input.amount.clone(), input.bidder_id, now)?;

            // The bid insert and the price/winner move commit as one unit,
            // conditional on the price the entity just validated against.
            if self.repo.add_bid(&bid, &auction, &expected_price).await? {
                tracing::info!(
                    auction_id = %input.auction_id,
                    bid_id = %bid.id,
                    amount = %bid.amount(),
                    "Accepted bid"
                );
                return Ok(bid);
            }

            tracing::warn!(
                auction_id = %input.auction_id,
                "Auction changed between validation and commit, retrying placement"
            );
        }
        Err(RestError::ConcurrentBidConflict)
    }

    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id, bidder_id = %input.bidder_id))]
    pub async fn place_bid(&self, input: PlaceBidInput) -> Result<entities::Bid, RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let result = self.place_bid_for_lock(&input, auction_lock).await;
        self.repo.remove_auction_lock(&input.auction_id).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::tests::{
                auction_row,
                price,
            },
            *,
        },
        crate::auction::repository::MockDatabase,
        mockall::Sequence,
        uuid::Uuid,
    };

    #[tokio::test]
    async fn bid_is_persisted_with_the_new_price_and_winner() {
        let row = auction_row("100.00", "100.00", None);
        let auction_id = row.id;
        let bidder_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .returning(move |_| Ok(row.clone()));
        db.expect_add_bid()
            .withf(move |bid, auction, expected_price| {
                bid.bidder_id == bidder_id
                    && bid.amount == price("150.00")
                    && auction.current_price == price("150.00")
                    && auction.winner_id == Some(bidder_id)
                    && *expected_price == price("100.00")
            })
            .returning(|_, _, _| Ok(true));

        let service = Service::new(db);
        let bid = service
            .place_bid(PlaceBidInput {
                auction_id,
                bidder_id,
                amount: price("150.00"),
            })
            .await
            .unwrap();

        assert_eq!(*bid.amount(), price("150.00"));
        assert_eq!(bid.bidder_id, bidder_id);
        assert_eq!(bid.auction_id, auction_id);
        assert!(bid.is_live());
    }

    #[tokio::test]
    async fn placement_retries_after_a_price_conflict() {
        let row = auction_row("100.00", "100.00", None);
        let auction_id = row.id;
        let bidder_id = Uuid::new_v4();

        let mut db = MockDatabase::new();
        let mut seq = Sequence::new();
        let stale = row.clone();
        db.expect_get_auction()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(stale.clone()));
        db.expect_add_bid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(false));
        // Another bidder committed 120 in between; the retry revalidates
        // against the fresh price.
        let mut fresh = row.clone();
        fresh.current_price = price("120.00");
        fresh.winner_id = Some(Uuid::new_v4());
        db.expect_get_auction()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(fresh.clone()));
        db.expect_add_bid()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, _, expected_price| *expected_price == price("120.00"))
            .returning(|_, _, _| Ok(true));

        let service = Service::new(db);
        let bid = service
            .place_bid(PlaceBidInput {
                auction_id,
                bidder_id,
                amount: price("150.00"),
            })
            .await
            .unwrap();
        assert_eq!(*bid.amount(), price("150.00"));
    }

    #[tokio::test]
    async fn conflict_is_surfaced_after_retries_are_exhausted() {
        let row = auction_row("100.00", "100.00", None);
        let auction_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .times(BID_PLACEMENT_MAX_ATTEMPTS)
            .returning(move |_| Ok(row.clone()));
        db.expect_add_bid()
            .times(BID_PLACEMENT_MAX_ATTEMPTS)
            .returning(|_, _, _| Ok(false));

        let service = Service::new(db);
        let err = service
            .place_bid(PlaceBidInput {
                auction_id,
                bidder_id: Uuid::new_v4(),
                amount: price("150.00"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::ConcurrentBidConflict));
    }

    #[tokio::test]
    async fn domain_rejections_are_not_retried() {
        let row = auction_row("100.00", "150.00", Some(Uuid::new_v4()));
        let auction_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .times(1)
            .returning(move |_| Ok(row.clone()));

        let service = Service::new(db);
        let err = service
            .place_bid(PlaceBidInput {
                auction_id,
                bidder_id: Uuid::new_v4(),
                amount: price("150.00"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::BidTooLow(_)));
    }

    #[tokio::test]
    async fn seller_cannot_bid_on_their_own_auction() {
        let row = auction_row("100.00", "100.00", None);
        let auction_id = row.id;
        let seller_id = row.seller_id;

        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .returning(move |_| Ok(row.clone()));

        let service = Service::new(db);
        let err = service
            .place_bid(PlaceBidInput {
                auction_id,
                bidder_id: seller_id,
                amount: price("500.00"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::SelfBidNotAllowed));
    }

    #[tokio::test]
    async fn unknown_auction_is_reported() {
        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .returning(|_| Err(RestError::AuctionNotFound));

        let service = Service::new(db);
        let err = service
            .place_bid(PlaceBidInput {
                auction_id: Uuid::new_v4(),
                bidder_id: Uuid::new_v4(),
                amount: price("150.00"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::AuctionNotFound));
    }
}
