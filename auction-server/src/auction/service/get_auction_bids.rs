use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

pub struct GetAuctionBidsInput {
    pub auction_id: entities::AuctionId,
}

impl Service {
    /// The live bid history, highest amount first. A plain read: callers
    /// may re-fetch freely.
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id))]
    pub async fn get_auction_bids(
        &self,
        input: GetAuctionBidsInput,
    ) -> Result<Vec<entities::Bid>, RestError> {
        self.repo.get_auction(input.auction_id).await?;
        let bids = self.repo.get_bids_by_auction(input.auction_id).await?;
        Ok(bids.into_iter().filter(|bid| bid.is_live()).collect())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::tests::{
                auction_row,
                bid_row,
                price,
            },
            *,
        },
        crate::auction::repository::MockDatabase,
        time::{
            OffsetDateTime,
            PrimitiveDateTime,
        },
        uuid::Uuid,
    };

    #[tokio::test]
    async fn only_live_bids_are_listed() {
        let row = auction_row("50.00", "100.00", Some(Uuid::new_v4()));
        let auction_id = row.id;

        let mut dead = bid_row(auction_id, Uuid::new_v4(), "95.00");
        let now = OffsetDateTime::now_utc();
        dead.deleted_at = Some(PrimitiveDateTime::new(now.date(), now.time()));
        let history = vec![
            bid_row(auction_id, Uuid::new_v4(), "100.00"),
            dead,
            bid_row(auction_id, Uuid::new_v4(), "90.00"),
        ];

        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .returning(move |_| Ok(row.clone()));
        db.expect_get_bids_by_auction()
            .returning(move |_| Ok(history.clone()));

        let service = Service::new(db);
        let bids = service
            .get_auction_bids(GetAuctionBidsInput { auction_id })
            .await
            .unwrap();

        assert_eq!(bids.len(), 2);
        assert_eq!(*bids[0].amount(), price("100.00"));
        assert_eq!(*bids[1].amount(), price("90.00"));
        assert!(bids.iter().all(|bid| bid.is_live()));
    }

    #[tokio::test]
    async fn listing_an_unknown_auction_is_a_not_found() {
        let mut db = MockDatabase::new();
        db.expect_get_auction()
            .returning(|_| Err(RestError::AuctionNotFound));

        let service = Service::new(db);
        let err = service
            .get_auction_bids(GetAuctionBidsInput {
                auction_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::AuctionNotFound));
    }
}
