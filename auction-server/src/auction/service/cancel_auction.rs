use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
    time::OffsetDateTime,
};

pub struct CancelAuctionInput {
    pub auction_id:   entities::AuctionId,
    pub requester_id: UserId,
}

impl Service {
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id))]
    pub async fn cancel_auction(
        &self,
        input: CancelAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let now = OffsetDateTime::now_utc();
        let mut auction = self.repo.get_auction(input.auction_id).await?;
        if auction.seller_id != input.requester_id {
            return Err(RestError::NotAuctionSeller);
        }

        if auction.cancel(now)? {
            self.repo.update_auction(&auction).await?;
            tracing::info!(auction_id = %auction.id, "Cancelled auction");
        }
        Ok(auction)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::tests::auction_row,
            *,
        },
        crate::auction::repository::{
            AuctionState,
            MockDatabase,
        },
        uuid::Uuid,
    };

    #[tokio::test]
    async fn the_seller_can_cancel_an_active_auction() {
        let row = auction_row("50.00", "50.00", None);
        let auction_id = row.id;
        let seller_id = row.seller_id;

        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .returning(move |_| Ok(row.clone()));
        db.expect_update_auction()
            .withf(|auction| auction.state == AuctionState::Cancelled)
            .returning(|_| Ok(()));

        let service = Service::new(db);
        let auction = service
            .cancel_auction(CancelAuctionInput {
                auction_id,
                requester_id: seller_id,
            })
            .await
            .unwrap();
        assert_eq!(auction.state, entities::AuctionState::Cancelled);
    }

    #[tokio::test]
    async fn cancelling_twice_is_a_no_op() {
        let mut row = auction_row("50.00", "50.00", None);
        row.state = AuctionState::Cancelled;
        let auction_id = row.id;
        let seller_id = row.seller_id;

        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .returning(move |_| Ok(row.clone()));

        let service = Service::new(db);
        let auction = service
            .cancel_auction(CancelAuctionInput {
                auction_id,
                requester_id: seller_id,
            })
            .await
            .unwrap();
        assert_eq!(auction.state, entities::AuctionState::Cancelled);
    }

    #[tokio::test]
    async fn a_completed_auction_cannot_be_cancelled() {
        let mut row = auction_row("50.00", "50.00", None);
        row.state = AuctionState::Completed;
        let auction_id = row.id;
        let seller_id = row.seller_id;

        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .returning(move |_| Ok(row.clone()));

        let service = Service::new(db);
        let err = service
            .cancel_auction(CancelAuctionInput {
                auction_id,
                requester_id: seller_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::AuctionAlreadyFinished));
    }

    #[tokio::test]
    async fn only_the_seller_may_cancel() {
        let row = auction_row("50.00", "50.00", None);
        let auction_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .returning(move |_| Ok(row.clone()));

        let service = Service::new(db);
        let err = service
            .cancel_auction(CancelAuctionInput {
                auction_id,
                requester_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::NotAuctionSeller));
    }
}
