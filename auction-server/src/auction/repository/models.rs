#[cfg(test)]
use mockall::automock;
use {
    super::entities,
    crate::{
        api::RestError,
        kernel::{
            db::DB,
            entities::UserId,
        },
    },
    axum::async_trait,
    bigdecimal::BigDecimal,
    sqlx::FromRow,
    std::fmt::Debug,
    time::{
        OffsetDateTime,
        PrimitiveDateTime,
        UtcOffset,
    },
    tracing::instrument,
};

#[derive(Clone, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "auction_state", rename_all = "lowercase")]
pub enum AuctionState {
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl From<entities::AuctionState> for AuctionState {
    fn from(state: entities::AuctionState) -> Self {
        match state {
            entities::AuctionState::Draft => AuctionState::Draft,
            entities::AuctionState::Active => AuctionState::Active,
            entities::AuctionState::Completed => AuctionState::Completed,
            entities::AuctionState::Cancelled => AuctionState::Cancelled,
        }
    }
}

impl From<AuctionState> for entities::AuctionState {
    fn from(state: AuctionState) -> Self {
        match state {
            AuctionState::Draft => entities::AuctionState::Draft,
            AuctionState::Active => entities::AuctionState::Active,
            AuctionState::Completed => entities::AuctionState::Completed,
            AuctionState::Cancelled => entities::AuctionState::Cancelled,
        }
    }
}

// Timestamps are stored without an offset; everything is UTC.
fn to_primitive(time: OffsetDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(time.date(), time.time())
}

#[derive(Clone, Debug, FromRow)]
pub struct Auction {
    pub id:             entities::AuctionId,
    pub title:          String,
    pub description:    Option<String>,
    pub starting_price: BigDecimal,
    pub current_price:  BigDecimal,
    pub start_time:     PrimitiveDateTime,
    pub end_time:       PrimitiveDateTime,
    pub state:          AuctionState,
    pub seller_id:      UserId,
    pub winner_id:      Option<UserId>,
    pub created_at:     PrimitiveDateTime,
    pub updated_at:     PrimitiveDateTime,
    pub deleted_at:     Option<PrimitiveDateTime>,
}

impl Auction {
    pub fn new(auction: &entities::Auction) -> Auction {
        Auction {
            id:             auction.id,
            title:          auction.title.clone(),
            description:    auction.description.clone(),
            starting_price: auction.starting_price.clone(),
            current_price:  auction.current_price().clone(),
            start_time:     to_primitive(auction.start_time),
            end_time:       to_primitive(auction.end_time),
            state:          auction.state.clone().into(),
            seller_id:      auction.seller_id,
            winner_id:      auction.winner_id(),
            created_at:     to_primitive(auction.created_at),
            updated_at:     to_primitive(auction.updated_at),
            deleted_at:     auction.deleted_at.map(to_primitive),
        }
    }

    pub fn get_auction_entity(&self) -> entities::Auction {
        entities::Auction::restore(
            self.id,
            self.title.clone(),
            self.description.clone(),
            self.starting_price.clone(),
            self.current_price.clone(),
            self.start_time.assume_offset(UtcOffset::UTC),
            self.end_time.assume_offset(UtcOffset::UTC),
            self.state.clone().into(),
            self.seller_id,
            self.winner_id,
            self.created_at.assume_offset(UtcOffset::UTC),
            self.updated_at.assume_offset(UtcOffset::UTC),
            self.deleted_at.map(|t| t.assume_offset(UtcOffset::UTC)),
        )
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct Bid {
    pub id:         entities::BidId,
    pub auction_id: entities::AuctionId,
    pub bidder_id:  UserId,
    pub amount:     BigDecimal,
    pub created_at: PrimitiveDateTime,
    pub deleted_at: Option<PrimitiveDateTime>,
}

impl Bid {
    pub fn new(bid: &entities::Bid) -> Bid {
        Bid {
            id:         bid.id,
            auction_id: bid.auction_id,
            bidder_id:  bid.bidder_id,
            amount:     bid.amount().clone(),
            created_at: to_primitive(bid.created_at),
            deleted_at: bid.deleted_at().map(to_primitive),
        }
    }

    pub fn get_bid_entity(&self) -> entities::Bid {
        entities::Bid::restore(
            self.id,
            self.auction_id,
            self.bidder_id,
            self.amount.clone(),
            self.created_at.assume_offset(UtcOffset::UTC),
            self.deleted_at.map(|t| t.assume_offset(UtcOffset::UTC)),
        )
    }
}

/// The durable store contract the engine depends on. Per-auction
/// serialization of bid-mutating operations happens above this trait
/// (the repository's in-memory auction locks); the conditional writes
/// here additionally refuse to commit against state they did not
/// validate, reporting `false` instead of writing so the caller can
/// retry or surface the conflict.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn add_auction(&self, auction: &Auction) -> Result<(), RestError>;
    async fn get_auction(&self, auction_id: entities::AuctionId) -> Result<Auction, RestError>;
    async fn update_auction(&self, auction: &Auction) -> Result<(), RestError>;
    async fn add_bid(
        &self,
        bid: &Bid,
        auction: &Auction,
        expected_price: &BigDecimal,
    ) -> Result<bool, RestError>;
    async fn get_bid(&self, bid_id: entities::BidId) -> Result<Bid, RestError>;
    async fn get_bids_by_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Vec<Bid>, RestError>;
    async fn retract_bid(
        &self,
        bid_id: entities::BidId,
        deleted_at: OffsetDateTime,
        auction_update: Option<Auction>,
    ) -> Result<bool, RestError>;
}

#[async_trait]
impl Database for DB {
    #[instrument(name = "db_add_auction", skip_all)]
    async fn add_auction(&self, auction: &Auction) -> Result<(), RestError> {
        sqlx::query(
            "INSERT INTO auction (id, title, description, starting_price, current_price, start_time, end_time, state, seller_id, winner_id, created_at, updated_at, deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(auction.id)
        .bind(auction.title.clone())
        .bind(auction.description.clone())
        .bind(auction.starting_price.clone())
        .bind(auction.current_price.clone())
        .bind(auction.start_time)
        .bind(auction.end_time)
        .bind(auction.state.clone())
        .bind(auction.seller_id)
        .bind(auction.winner_id)
        .bind(auction.created_at)
        .bind(auction.updated_at)
        .bind(auction.deleted_at)
        .execute(self)
        .await
        .map_err(|e| {
            tracing::error!(error = e.to_string(), auction = ?auction, "DB: Failed to insert auction");
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(name = "db_get_auction", skip_all)]
    async fn get_auction(&self, auction_id: entities::AuctionId) -> Result<Auction, RestError> {
        sqlx::query_as("SELECT * FROM auction WHERE id = $1")
            .bind(auction_id)
            .fetch_one(self)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => RestError::AuctionNotFound,
                _ => {
                    tracing::error!(
                        error = e.to_string(),
                        auction_id = auction_id.to_string(),
                        "Failed to get auction from db"
                    );
                    RestError::TemporarilyUnavailable
                }
            })
    }

    // Metadata and lifecycle state only. Price and winner always travel
    // through the guarded paths below.
    #[instrument(name = "db_update_auction", skip_all)]
    async fn update_auction(&self, auction: &Auction) -> Result<(), RestError> {
        sqlx::query(
            "UPDATE auction SET title = $2, description = $3, state = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(auction.id)
        .bind(auction.title.clone())
        .bind(auction.description.clone())
        .bind(auction.state.clone())
        .bind(auction.updated_at)
        .execute(self)
        .await
        .map_err(|e| {
            tracing::error!(error = e.to_string(), auction = ?auction, "DB: Failed to update auction");
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(name = "db_add_bid", skip_all)]
    async fn add_bid(
        &self,
        bid: &Bid,
        auction: &Auction,
        expected_price: &BigDecimal,
    ) -> Result<bool, RestError> {
        let mut tx = self.begin().await.map_err(|e| {
            tracing::error!(error = e.to_string(), "DB: Failed to begin bid transaction");
            RestError::TemporarilyUnavailable
        })?;

        // The price/winner move and the bid insert are one unit, and the
        // move only commits against the price the entity validated.
        let result = sqlx::query(
            "UPDATE auction SET current_price = $2, winner_id = $3, updated_at = $4 \
             WHERE id = $1 AND current_price = $5 AND state = $6",
        )
        .bind(auction.id)
        .bind(auction.current_price.clone())
        .bind(auction.winner_id)
        .bind(auction.updated_at)
        .bind(expected_price.clone())
        .bind(AuctionState::Active)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = e.to_string(), auction = ?auction, "DB: Failed to update auction price");
            RestError::TemporarilyUnavailable
        })?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                tracing::error!(error = e.to_string(), "DB: Failed to roll back bid transaction");
                RestError::TemporarilyUnavailable
            })?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO bid (id, auction_id, bidder_id, amount, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(bid.id)
        .bind(bid.auction_id)
        .bind(bid.bidder_id)
        .bind(bid.amount.clone())
        .bind(bid.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = e.to_string(), bid = ?bid, "DB: Failed to insert bid");
            RestError::TemporarilyUnavailable
        })?;

        tx.commit().await.map_err(|e| {
            tracing::error!(error = e.to_string(), "DB: Failed to commit bid transaction");
            RestError::TemporarilyUnavailable
        })?;
        Ok(true)
    }

    #[instrument(name = "db_get_bid", skip_all)]
    async fn get_bid(&self, bid_id: entities::BidId) -> Result<Bid, RestError> {
        sqlx::query_as("SELECT * FROM bid WHERE id = $1")
            .bind(bid_id)
            .fetch_one(self)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => RestError::BidNotFound,
                _ => {
                    tracing::error!(
                        error = e.to_string(),
                        bid_id = bid_id.to_string(),
                        "Failed to get bid from db"
                    );
                    RestError::TemporarilyUnavailable
                }
            })
    }

    // Live and dead rows, best bid first. The recomputation and the
    // history listing both rely on this order.
    #[instrument(name = "db_get_bids_by_auction", skip_all)]
    async fn get_bids_by_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Vec<Bid>, RestError> {
        sqlx::query_as(
            "SELECT * FROM bid WHERE auction_id = $1 ORDER BY amount DESC, created_at ASC",
        )
        .bind(auction_id)
        .fetch_all(self)
        .await
        .map_err(|e| {
            tracing::error!(
                error = e.to_string(),
                auction_id = auction_id.to_string(),
                "DB: Failed to fetch bids"
            );
            RestError::TemporarilyUnavailable
        })
    }

    #[instrument(name = "db_retract_bid", skip_all)]
    async fn retract_bid(
        &self,
        bid_id: entities::BidId,
        deleted_at: OffsetDateTime,
        auction_update: Option<Auction>,
    ) -> Result<bool, RestError> {
        let mut tx = self.begin().await.map_err(|e| {
            tracing::error!(error = e.to_string(), "DB: Failed to begin retraction transaction");
            RestError::TemporarilyUnavailable
        })?;

        let result = sqlx::query("UPDATE bid SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
            .bind(bid_id)
            .bind(to_primitive(deleted_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = e.to_string(), bid_id = bid_id.to_string(), "DB: Failed to soft delete bid");
                RestError::TemporarilyUnavailable
            })?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                tracing::error!(error = e.to_string(), "DB: Failed to roll back retraction transaction");
                RestError::TemporarilyUnavailable
            })?;
            return Ok(false);
        }

        if let Some(auction) = auction_update {
            sqlx::query(
                "UPDATE auction SET current_price = $2, winner_id = $3, updated_at = $4 WHERE id = $1",
            )
            .bind(auction.id)
            .bind(auction.current_price.clone())
            .bind(auction.winner_id)
            .bind(auction.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = e.to_string(), auction = ?auction, "DB: Failed to update auction after retraction");
                RestError::TemporarilyUnavailable
            })?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!(error = e.to_string(), "DB: Failed to commit retraction transaction");
            RestError::TemporarilyUnavailable
        })?;
        Ok(true)
    }
}
