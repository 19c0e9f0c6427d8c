use {
    super::{
        entities,
        service::{
            cancel_auction::CancelAuctionInput,
            create_auction::CreateAuctionInput,
            get_auction::GetAuctionInput,
            get_auction_bids::GetAuctionBidsInput,
            place_bid::PlaceBidInput,
            retract_bid::RetractBidInput,
            update_auction::UpdateAuctionInput,
            Service,
        },
    },
    crate::{
        api::RestError,
        kernel::entities::UserId,
    },
    axum::{
        extract::{
            Path,
            State,
        },
        Json,
    },
    bigdecimal::BigDecimal,
    serde::{
        Deserialize,
        Serialize,
    },
    time::OffsetDateTime,
    utoipa::ToSchema,
    uuid::Uuid,
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
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

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AuctionCreate {
    /// Display title, 3 to 100 characters.
    #[schema(example = "Vintage camera")]
    pub title:          String,
    pub description:    Option<String>,
    #[schema(value_type = String, example = "100.00")]
    pub starting_price: BigDecimal,
    /// Defaults to now: the auction opens immediately.
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub start_time:     Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub end_time:       OffsetDateTime,
    /// Initial state, `draft` or `active`. Defaults to `active`.
    #[serde(default)]
    pub state:          Option<AuctionState>,
    #[schema(value_type = Uuid)]
    pub seller_id:      UserId,
}

impl AuctionCreate {
    fn validate(&self, now: OffsetDateTime) -> Result<(), RestError> {
        let title_length = self.title.chars().count();
        if !(3..=100).contains(&title_length) {
            return Err(RestError::BadParameters(
                "title must be between 3 and 100 characters".to_string(),
            ));
        }
        if self.starting_price <= BigDecimal::from(0) {
            return Err(RestError::BadParameters(
                "starting_price must be positive".to_string(),
            ));
        }
        let start_time = self.start_time.unwrap_or(now);
        if start_time >= self.end_time {
            return Err(RestError::BadParameters(
                "end_time must be after start_time".to_string(),
            ));
        }
        if start_time < now {
            return Err(RestError::BadParameters(
                "start_time must not be in the past".to_string(),
            ));
        }
        match self.state {
            None | Some(AuctionState::Draft) | Some(AuctionState::Active) => Ok(()),
            _ => Err(RestError::BadParameters(
                "state must be draft or active".to_string(),
            )),
        }
    }

    fn into_entity(self, now: OffsetDateTime) -> entities::AuctionCreate {
        entities::AuctionCreate {
            title:          self.title,
            description:    self.description,
            starting_price: self.starting_price,
            start_time:     self.start_time.unwrap_or(now),
            end_time:       self.end_time,
            state:          match self.state {
                Some(AuctionState::Draft) => entities::AuctionState::Draft,
                _ => entities::AuctionState::Active,
            },
            seller_id:      self.seller_id,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AuctionUpdate {
    #[schema(value_type = Uuid)]
    pub requester_id: UserId,
    pub title:        Option<String>,
    pub description:  Option<String>,
}

impl AuctionUpdate {
    fn validate(&self) -> Result<(), RestError> {
        if let Some(title) = &self.title {
            let title_length = title.chars().count();
            if !(3..=100).contains(&title_length) {
                return Err(RestError::BadParameters(
                    "title must be between 3 and 100 characters".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AuctionCancel {
    #[schema(value_type = Uuid)]
    pub requester_id: UserId,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Auction {
    #[schema(value_type = Uuid)]
    pub id:             entities::AuctionId,
    pub title:          String,
    pub description:    Option<String>,
    #[schema(value_type = String, example = "100.00")]
    pub starting_price: BigDecimal,
    #[schema(value_type = String, example = "150.00")]
    pub current_price:  BigDecimal,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub start_time:     OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub end_time:       OffsetDateTime,
    pub state:          AuctionState,
    #[schema(value_type = Uuid)]
    pub seller_id:      UserId,
    #[schema(value_type = Option<Uuid>)]
    pub winner_id:      Option<UserId>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub created_at:     OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub updated_at:     OffsetDateTime,
}

impl From<entities::Auction> for Auction {
    fn from(auction: entities::Auction) -> Self {
        Auction {
            id:             auction.id,
            title:          auction.title.clone(),
            description:    auction.description.clone(),
            starting_price: auction.starting_price.clone(),
            current_price:  auction.current_price().clone(),
            start_time:     auction.start_time,
            end_time:       auction.end_time,
            state:          auction.state.clone().into(),
            seller_id:      auction.seller_id,
            winner_id:      auction.winner_id(),
            created_at:     auction.created_at,
            updated_at:     auction.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BidCreate {
    #[schema(value_type = Uuid)]
    pub bidder_id: UserId,
    #[schema(value_type = String, example = "150.00")]
    pub amount:    BigDecimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BidRetract {
    #[schema(value_type = Uuid)]
    pub requester_id: UserId,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Bid {
    #[schema(value_type = Uuid)]
    pub id:         entities::BidId,
    #[schema(value_type = Uuid)]
    pub auction_id: entities::AuctionId,
    #[schema(value_type = Uuid)]
    pub bidder_id:  UserId,
    #[schema(value_type = String, example = "150.00")]
    pub amount:     BigDecimal,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub created_at: OffsetDateTime,
}

impl From<entities::Bid> for Bid {
    fn from(bid: entities::Bid) -> Self {
        Bid {
            id:         bid.id,
            auction_id: bid.auction_id,
            bidder_id:  bid.bidder_id,
            amount:     bid.amount().clone(),
            created_at: bid.created_at,
        }
    }
}

/// Create a new auction listing.
///
/// The auction opens at its starting price with no winner.
#[utoipa::path(post, path = "/v1/auctions", request_body = AuctionCreate, responses(
    (status = 200, description = "Auction was created successfully", body = Auction),
    (status = 400, response = crate::api::ErrorBodyResponse),
),)]
pub async fn post_auction(
    State(service): State<Service>,
    Json(auction_create): Json<AuctionCreate>,
) -> Result<Json<Auction>, RestError> {
    let now = OffsetDateTime::now_utc();
    auction_create.validate(now)?;
    let auction = service
        .create_auction(CreateAuctionInput {
            auction: auction_create.into_entity(now),
        })
        .await?;
    Ok(Json(auction.into()))
}

/// Get an auction by id.
#[utoipa::path(get, path = "/v1/auctions/{auction_id}",
    params(("auction_id" = Uuid, Path, description = "Id of the auction")),
    responses(
    (status = 200, description = "The auction", body = Auction),
    (status = 404, description = "Auction was not found", body = crate::api::ErrorBodyResponse),
),)]
pub async fn get_auction(
    State(service): State<Service>,
    Path(auction_id): Path<entities::AuctionId>,
) -> Result<Json<Auction>, RestError> {
    let auction = service.get_auction(GetAuctionInput { auction_id }).await?;
    Ok(Json(auction.into()))
}

/// Edit an auction's title or description.
///
/// Only the seller may edit, and only while the auction is not cancelled.
/// Prices and dates cannot be changed.
#[utoipa::path(patch, path = "/v1/auctions/{auction_id}", request_body = AuctionUpdate,
    params(("auction_id" = Uuid, Path, description = "Id of the auction")),
    responses(
    (status = 200, description = "The updated auction", body = Auction),
    (status = 400, response = crate::api::ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = crate::api::ErrorBodyResponse),
),)]
pub async fn patch_auction(
    State(service): State<Service>,
    Path(auction_id): Path<entities::AuctionId>,
    Json(auction_update): Json<AuctionUpdate>,
) -> Result<Json<Auction>, RestError> {
    auction_update.validate()?;
    let auction = service
        .update_auction(UpdateAuctionInput {
            auction_id,
            requester_id: auction_update.requester_id,
            title: auction_update.title,
            description: auction_update.description,
        })
        .await?;
    Ok(Json(auction.into()))
}

/// Cancel an auction.
///
/// Only the seller may cancel. Cancelling twice is a no-op; a completed
/// auction cannot be cancelled.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/cancel", request_body = AuctionCancel,
    params(("auction_id" = Uuid, Path, description = "Id of the auction")),
    responses(
    (status = 200, description = "The cancelled auction", body = Auction),
    (status = 404, description = "Auction was not found", body = crate::api::ErrorBodyResponse),
),)]
pub async fn post_cancel_auction(
    State(service): State<Service>,
    Path(auction_id): Path<entities::AuctionId>,
    Json(auction_cancel): Json<AuctionCancel>,
) -> Result<Json<Auction>, RestError> {
    let auction = service
        .cancel_auction(CancelAuctionInput {
            auction_id,
            requester_id: auction_cancel.requester_id,
        })
        .await?;
    Ok(Json(auction.into()))
}

/// Place a bid on an auction.
///
/// The bid must strictly beat the current price; ties are rejected. The
/// accepted bid becomes the auction's current price and its bidder the
/// current winner.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/bids", request_body = BidCreate,
    params(("auction_id" = Uuid, Path, description = "Id of the auction")),
    responses(
    (status = 200, description = "Bid was placed successfully", body = Bid),
    (status = 400, response = crate::api::ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = crate::api::ErrorBodyResponse),
),)]
pub async fn post_bid(
    State(service): State<Service>,
    Path(auction_id): Path<entities::AuctionId>,
    Json(bid_create): Json<BidCreate>,
) -> Result<Json<Bid>, RestError> {
    if bid_create.amount <= BigDecimal::from(0) {
        return Err(RestError::BadParameters(
            "amount must be positive".to_string(),
        ));
    }
    let bid = service
        .place_bid(PlaceBidInput {
            auction_id,
            bidder_id: bid_create.bidder_id,
            amount: bid_create.amount,
        })
        .await?;
    Ok(Json(bid.into()))
}

/// List the live bids of an auction, highest first.
#[utoipa::path(get, path = "/v1/auctions/{auction_id}/bids",
    params(("auction_id" = Uuid, Path, description = "Id of the auction")),
    responses(
    (status = 200, description = "The live bids of the auction", body = Vec<Bid>),
    (status = 404, description = "Auction was not found", body = crate::api::ErrorBodyResponse),
),)]
pub async fn get_auction_bids(
    State(service): State<Service>,
    Path(auction_id): Path<entities::AuctionId>,
) -> Result<Json<Vec<Bid>>, RestError> {
    let bids = service
        .get_auction_bids(GetAuctionBidsInput { auction_id })
        .await?;
    Ok(Json(bids.into_iter().map(Bid::from).collect()))
}

/// Retract a bid.
///
/// Only the bidder who placed the bid may retract it, and only while the
/// auction is not finished. Retracting the winning bid recomputes the
/// auction's price and winner from the remaining live bids.
#[utoipa::path(post, path = "/v1/bids/{bid_id}/retract", request_body = BidRetract,
    params(("bid_id" = Uuid, Path, description = "Id of the bid")),
    responses(
    (status = 200, description = "Bid was retracted successfully"),
    (status = 403, description = "Only the bid owner may retract", body = crate::api::ErrorBodyResponse),
    (status = 404, description = "Bid was not found", body = crate::api::ErrorBodyResponse),
),)]
pub async fn post_retract_bid(
    State(service): State<Service>,
    Path(bid_id): Path<entities::BidId>,
    Json(bid_retract): Json<BidRetract>,
) -> Result<Json<()>, RestError> {
    service
        .retract_bid(RetractBidInput {
            bid_id,
            requester_id: bid_retract.requester_id,
        })
        .await?;
    Ok(Json(()))
}
