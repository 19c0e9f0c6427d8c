use {
    super::auction::AuctionId,
    crate::kernel::entities::UserId,
    bigdecimal::BigDecimal,
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type BidId = Uuid;

/// One bidder's offer. Immutable after creation except for the soft
/// delete marker: `amount` never changes (the bid history is the audit
/// trail the winner recomputation scans), and retraction only ever sets
/// `deleted_at`.
#[derive(Clone, Debug, PartialEq)]
pub struct Bid {
    pub id:         BidId,
    pub auction_id: AuctionId,
    pub bidder_id:  UserId,
    amount:         BigDecimal,
    pub created_at: OffsetDateTime,
    deleted_at:     Option<OffsetDateTime>,
}

impl Bid {
    /// Bids are only born through `Auction::place_bid`.
    pub(crate) fn new(
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: BigDecimal,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            auction_id,
            bidder_id,
            amount,
            created_at: now,
            deleted_at: None,
        }
    }

    pub(crate) fn restore(
        id: BidId,
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: BigDecimal,
        created_at: OffsetDateTime,
        deleted_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            id,
            auction_id,
            bidder_id,
            amount,
            created_at,
            deleted_at,
        }
    }

    pub fn amount(&self) -> &BigDecimal {
        &self.amount
    }

    pub fn deleted_at(&self) -> Option<OffsetDateTime> {
        self.deleted_at
    }

    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Soft delete. Deleting twice leaves the first marker in place.
    pub fn delete(&mut self, now: OffsetDateTime) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(now);
        }
    }
}
