use {
    super::bid::Bid,
    crate::{
        api::RestError,
        kernel::entities::UserId,
    },
    bigdecimal::BigDecimal,
    std::sync::Arc,
    time::OffsetDateTime,
    tokio::sync::Mutex,
    uuid::Uuid,
};

pub type AuctionId = Uuid;
pub type AuctionLock = Arc<Mutex<()>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuctionState {
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl AuctionState {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuctionState::Completed | AuctionState::Cancelled)
    }
}

pub struct AuctionCreate {
    pub title:          String,
    pub description:    Option<String>,
    pub starting_price: BigDecimal,
    pub start_time:     OffsetDateTime,
    pub end_time:       OffsetDateTime,
    pub state:          AuctionState,
    pub seller_id:      UserId,
}

/// A listing and its pricing state.
///
/// `current_price` and `winner_id` are deliberately private: the only
/// code paths that may move them are `place_bid` and `recompute_winner`,
/// so the pair always describes the highest live bid (or the starting
/// price when no live bid exists).
#[derive(Clone, Debug, PartialEq)]
pub struct Auction {
    pub id:             AuctionId,
    pub title:          String,
    pub description:    Option<String>,
    pub starting_price: BigDecimal,
    current_price:      BigDecimal,
    pub start_time:     OffsetDateTime,
    pub end_time:       OffsetDateTime,
    pub state:          AuctionState,
    pub seller_id:      UserId,
    winner_id:          Option<UserId>,
    pub created_at:     OffsetDateTime,
    pub updated_at:     OffsetDateTime,
    pub deleted_at:     Option<OffsetDateTime>,
}

impl Auction {
    pub fn new(create: AuctionCreate, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: create.title,
            description: create.description,
            current_price: create.starting_price.clone(),
            starting_price: create.starting_price,
            start_time: create.start_time,
            end_time: create.end_time,
            state: create.state,
            seller_id: create.seller_id,
            winner_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Rehydration from storage. Not a mutation path: the stored pair was
    /// written by `place_bid`/`recompute_winner` in the first place.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: AuctionId,
        title: String,
        description: Option<String>,
        starting_price: BigDecimal,
        current_price: BigDecimal,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
        state: AuctionState,
        seller_id: UserId,
        winner_id: Option<UserId>,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
        deleted_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            starting_price,
            current_price,
            start_time,
            end_time,
            state,
            seller_id,
            winner_id,
            created_at,
            updated_at,
            deleted_at,
        }
    }

    pub fn current_price(&self) -> &BigDecimal {
        &self.current_price
    }

    pub fn winner_id(&self) -> Option<UserId> {
        self.winner_id
    }

    /// Whether the auction accepts bids at `now`. A pure clock check: no
    /// timer ever fires at `end_time`, an expired auction simply stops
    /// accepting bids on the next attempt.
    pub fn is_open(&self, now: OffsetDateTime) -> bool {
        self.state == AuctionState::Active && self.start_time <= now && now <= self.end_time
    }

    pub fn place_bid(
        &mut self,
        amount: BigDecimal,
        bidder_id: UserId,
        now: OffsetDateTime,
    ) -> Result<Bid, RestError> {
        if !self.is_open(now) {
            if now > self.end_time {
                return Err(RestError::AuctionEnded);
            }
            return Err(RestError::AuctionNotActive);
        }

        if bidder_id == self.seller_id {
            return Err(RestError::SelfBidNotAllowed);
        }

        // Ties are rejected: two bidders can never "win" at the same price.
        if amount <= self.current_price {
            return Err(RestError::BidTooLow(self.current_price.to_string()));
        }

        let bid = Bid::new(self.id, bidder_id, amount.clone(), now);
        self.current_price = amount;
        self.winner_id = Some(bidder_id);
        self.updated_at = now;
        Ok(bid)
    }

    /// Only title and description are mutable after creation. Returns
    /// whether anything actually changed; `updated_at` moves only then.
    pub fn update_details(
        &mut self,
        title: Option<String>,
        description: Option<String>,
        now: OffsetDateTime,
    ) -> Result<bool, RestError> {
        if self.state == AuctionState::Cancelled {
            return Err(RestError::AuctionCancelled);
        }

        let mut changed = false;
        if let Some(title) = title {
            if title != self.title {
                self.title = title;
                changed = true;
            }
        }
        if let Some(description) = description {
            if self.description.as_ref() != Some(&description) {
                self.description = Some(description);
                changed = true;
            }
        }

        if changed {
            self.updated_at = now;
        }
        Ok(changed)
    }

    /// Cancellation is the closure mechanism; records are never deleted.
    /// Returns whether the state moved (a second cancel is a no-op).
    pub fn cancel(&mut self, now: OffsetDateTime) -> Result<bool, RestError> {
        match self.state {
            AuctionState::Completed => Err(RestError::AuctionAlreadyFinished),
            AuctionState::Cancelled => Ok(false),
            _ => {
                self.state = AuctionState::Cancelled;
                self.updated_at = now;
                Ok(true)
            }
        }
    }

    /// Re-derive price and winner from the remaining live bid set after
    /// the winning bid was retracted. The best remaining bid is the
    /// highest amount, ties broken by earliest `created_at` (the first
    /// bidder to reach a price wins ties). With no live bids left the
    /// auction returns to its starting price with no winner.
    pub fn recompute_winner(&mut self, live_bids: &[Bid], now: OffsetDateTime) {
        let best = live_bids.iter().max_by(|a, b| {
            a.amount()
                .cmp(b.amount())
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        match best {
            Some(bid) => {
                self.current_price = bid.amount().clone();
                self.winner_id = Some(bid.bidder_id);
            }
            None => {
                self.current_price = self.starting_price.clone();
                self.winner_id = None;
            }
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        time::{
            macros::datetime,
            Duration,
        },
    };

    fn price(value: &str) -> BigDecimal {
        value.parse().unwrap()
    }

    fn now() -> OffsetDateTime {
        datetime!(2026-07-01 12:00 UTC)
    }

    fn open_auction(starting_price: &str) -> Auction {
        Auction::new(
            AuctionCreate {
                title:          "Vintage synthesizer".to_string(),
                description:    None,
                starting_price: price(starting_price),
                start_time:     now() - Duration::hours(1),
                end_time:       now() + Duration::hours(1),
                state:          AuctionState::Active,
                seller_id:      Uuid::new_v4(),
            },
            now() - Duration::hours(1),
        )
    }

    #[test]
    fn new_auction_starts_at_starting_price_with_no_winner() {
        let auction = open_auction("100.00");
        assert_eq!(*auction.current_price(), price("100.00"));
        assert_eq!(auction.winner_id(), None);
    }

    #[test]
    fn accepted_bids_keep_price_monotonic() {
        let mut auction = open_auction("100.00");
        let bidder_a = Uuid::new_v4();
        let bidder_b = Uuid::new_v4();

        auction.place_bid(price("150"), bidder_a, now()).unwrap();
        assert_eq!(*auction.current_price(), price("150"));
        assert_eq!(auction.winner_id(), Some(bidder_a));

        auction.place_bid(price("200"), bidder_b, now()).unwrap();
        assert_eq!(*auction.current_price(), price("200"));
        assert_eq!(auction.winner_id(), Some(bidder_b));
    }

    #[test]
    fn tie_with_current_price_is_rejected() {
        let mut auction = open_auction("100.00");
        let bidder_a = Uuid::new_v4();
        let bidder_b = Uuid::new_v4();
        auction.place_bid(price("150"), bidder_a, now()).unwrap();

        let err = auction.place_bid(price("150"), bidder_b, now()).unwrap_err();
        assert!(matches!(err, RestError::BidTooLow(_)));
        assert_eq!(*auction.current_price(), price("150"));
        assert_eq!(auction.winner_id(), Some(bidder_a));
    }

    #[test]
    fn lower_bid_is_rejected() {
        let mut auction = open_auction("100.00");
        let err = auction
            .place_bid(price("50"), Uuid::new_v4(), now())
            .unwrap_err();
        assert!(matches!(err, RestError::BidTooLow(_)));
    }

    #[test]
    fn equal_decimal_representations_tie() {
        let mut auction = open_auction("100.00");
        auction
            .place_bid(price("150.00"), Uuid::new_v4(), now())
            .unwrap();
        let err = auction
            .place_bid(price("150"), Uuid::new_v4(), now())
            .unwrap_err();
        assert!(matches!(err, RestError::BidTooLow(_)));
    }

    #[test]
    fn seller_cannot_bid_regardless_of_amount() {
        let mut auction = open_auction("100.00");
        let seller = auction.seller_id;

        let err = auction.place_bid(price("500"), seller, now()).unwrap_err();
        assert!(matches!(err, RestError::SelfBidNotAllowed));
        let err = auction.place_bid(price("101"), seller, now()).unwrap_err();
        assert!(matches!(err, RestError::SelfBidNotAllowed));
        assert_eq!(auction.winner_id(), None);
    }

    #[test]
    fn bid_after_end_time_reports_ended() {
        let mut auction = open_auction("100.00");
        let late = auction.end_time + Duration::minutes(1);
        let err = auction
            .place_bid(price("200"), Uuid::new_v4(), late)
            .unwrap_err();
        assert!(matches!(err, RestError::AuctionEnded));
    }

    #[test]
    fn bid_before_start_time_reports_not_active() {
        let mut auction = open_auction("100.00");
        let early = auction.start_time - Duration::minutes(1);
        let err = auction
            .place_bid(price("200"), Uuid::new_v4(), early)
            .unwrap_err();
        assert!(matches!(err, RestError::AuctionNotActive));
    }

    #[test]
    fn draft_and_cancelled_auctions_reject_bids() {
        let mut draft = open_auction("100.00");
        draft.state = AuctionState::Draft;
        let err = draft
            .place_bid(price("200"), Uuid::new_v4(), now())
            .unwrap_err();
        assert!(matches!(err, RestError::AuctionNotActive));

        let mut cancelled = open_auction("100.00");
        cancelled.cancel(now()).unwrap();
        let err = cancelled
            .place_bid(price("200"), Uuid::new_v4(), now())
            .unwrap_err();
        assert!(matches!(err, RestError::AuctionNotActive));
    }

    #[test]
    fn is_open_is_inclusive_at_both_window_edges() {
        let auction = open_auction("100.00");
        assert!(auction.is_open(auction.start_time));
        assert!(auction.is_open(auction.end_time));
        assert!(!auction.is_open(auction.end_time + Duration::seconds(1)));
        assert!(!auction.is_open(auction.start_time - Duration::seconds(1)));
    }

    #[test]
    fn update_details_is_idempotent() {
        let mut auction = open_auction("100.00");
        let before = auction.updated_at;

        let changed = auction
            .update_details(Some(auction.title.clone()), None, now())
            .unwrap();
        assert!(!changed);
        assert_eq!(auction.updated_at, before);

        let changed = auction
            .update_details(Some("Analog synthesizer".to_string()), None, now())
            .unwrap();
        assert!(changed);
        assert_eq!(auction.title, "Analog synthesizer");
        assert_eq!(auction.updated_at, now());
    }

    #[test]
    fn update_details_rejected_once_cancelled() {
        let mut auction = open_auction("100.00");
        auction.cancel(now()).unwrap();
        let err = auction
            .update_details(Some("New title".to_string()), None, now())
            .unwrap_err();
        assert!(matches!(err, RestError::AuctionCancelled));
    }

    #[test]
    fn cancel_is_idempotent_and_completed_is_terminal() {
        let mut auction = open_auction("100.00");
        assert!(auction.cancel(now()).unwrap());
        assert!(!auction.cancel(now()).unwrap());
        assert_eq!(auction.state, AuctionState::Cancelled);

        let mut finished = open_auction("100.00");
        finished.state = AuctionState::Completed;
        let err = finished.cancel(now()).unwrap_err();
        assert!(matches!(err, RestError::AuctionAlreadyFinished));
        assert_eq!(finished.state, AuctionState::Completed);
    }

    #[test]
    fn draft_auction_can_be_cancelled() {
        let mut auction = open_auction("100.00");
        auction.state = AuctionState::Draft;
        assert!(auction.cancel(now()).unwrap());
        assert_eq!(auction.state, AuctionState::Cancelled);
    }

    #[test]
    fn recompute_picks_highest_remaining_live_bid() {
        let mut auction = open_auction("50.00");
        let remaining: Vec<Bid> = ["90", "80", "70"]
            .iter()
            .map(|amount| Bid::new(auction.id, Uuid::new_v4(), price(amount), now()))
            .collect();

        auction.recompute_winner(&remaining, now());
        assert_eq!(*auction.current_price(), price("90"));
        assert_eq!(auction.winner_id(), Some(remaining[0].bidder_id));
    }

    #[test]
    fn recompute_breaks_amount_ties_by_earliest_bid() {
        let mut auction = open_auction("50.00");
        let late = Bid::new(auction.id, Uuid::new_v4(), price("90"), now());
        let early = Bid::new(
            auction.id,
            Uuid::new_v4(),
            price("90"),
            now() - Duration::minutes(5),
        );

        auction.recompute_winner(&[late, early.clone()], now());
        assert_eq!(auction.winner_id(), Some(early.bidder_id));
    }

    #[test]
    fn recompute_with_no_live_bids_resets_to_starting_price() {
        let mut auction = open_auction("100.00");
        auction
            .place_bid(price("150"), Uuid::new_v4(), now())
            .unwrap();

        auction.recompute_winner(&[], now());
        assert_eq!(*auction.current_price(), price("100.00"));
        assert_eq!(auction.winner_id(), None);
    }

    // The worked example: A bids 150, B ties at 150 (rejected), B bids 200,
    // then B's winning bid is retracted and A's 150 wins again.
    #[test]
    fn bidding_war_with_retraction_restores_runner_up() {
        let mut auction = open_auction("100.00");
        let bidder_a = Uuid::new_v4();
        let bidder_b = Uuid::new_v4();

        let bid_a = auction.place_bid(price("150"), bidder_a, now()).unwrap();
        assert!(auction
            .place_bid(price("150"), bidder_b, now())
            .is_err());
        auction.place_bid(price("200"), bidder_b, now()).unwrap();
        assert_eq!(*auction.current_price(), price("200"));
        assert_eq!(auction.winner_id(), Some(bidder_b));

        auction.recompute_winner(std::slice::from_ref(&bid_a), now());
        assert_eq!(*auction.current_price(), price("150"));
        assert_eq!(auction.winner_id(), Some(bidder_a));
    }
}
