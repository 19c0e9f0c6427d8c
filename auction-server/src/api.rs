use {
    crate::{
        auction::{
            api as auction_api,
            service::Service,
        },
        config::RunOptions,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
    },
    anyhow::Result,
    axum::{
        http::StatusCode,
        response::{
            IntoResponse,
            Response,
        },
        routing::{
            get,
            patch,
            post,
        },
        Json,
        Router,
    },
    clap::crate_version,
    serde::Serialize,
    std::sync::atomic::Ordering,
    tower_http::cors::CorsLayer,
    utoipa::{
        OpenApi,
        ToResponse,
        ToSchema,
    },
    utoipa_redoc::{
        Redoc,
        Servable,
    },
};

async fn root() -> String {
    format!("Auction Marketplace Server API {}", crate_version!())
}

#[derive(Clone, Debug)]
pub enum RestError {
    /// The request contained invalid parameters
    BadParameters(String),
    /// No auction exists with the requested id
    AuctionNotFound,
    /// No bid exists with the requested id
    BidNotFound,
    /// The auction has passed its end time
    AuctionEnded,
    /// The auction is not open for bidding (draft, cancelled, or not yet started)
    AuctionNotActive,
    /// The seller tried to bid on their own auction
    SelfBidNotAllowed,
    /// The bid does not beat the current price; carries the price to beat
    BidTooLow(String),
    /// The auction was cancelled and no longer accepts edits
    AuctionCancelled,
    /// The auction already completed and cannot be cancelled
    AuctionAlreadyFinished,
    /// The bid was already retracted
    BidAlreadyRetracted,
    /// The auction finished; its bids can no longer be retracted
    AuctionClosedForRetraction,
    /// Only the bidder who placed a bid may retract it
    NotBidOwner,
    /// Only the seller may edit or cancel an auction
    NotAuctionSeller,
    /// The auction kept changing concurrently; the request may be resubmitted
    ConcurrentBidConflict,
    /// Internal error occurred during processing the request
    TemporarilyUnavailable,
}

impl RestError {
    pub fn to_status_and_message(&self) -> (StatusCode, String) {
        match self {
            RestError::BadParameters(msg) => {
                (StatusCode::BAD_REQUEST, format!("Bad parameters: {}", msg))
            }
            RestError::AuctionNotFound => (
                StatusCode::NOT_FOUND,
                "Auction with the specified id was not found".to_string(),
            ),
            RestError::BidNotFound => (
                StatusCode::NOT_FOUND,
                "Bid with the specified id was not found".to_string(),
            ),
            RestError::AuctionEnded => (
                StatusCode::BAD_REQUEST,
                "The auction has already ended".to_string(),
            ),
            RestError::AuctionNotActive => (
                StatusCode::BAD_REQUEST,
                "The auction is not open for bidding".to_string(),
            ),
            RestError::SelfBidNotAllowed => (
                StatusCode::BAD_REQUEST,
                "Sellers cannot bid on their own auction".to_string(),
            ),
            RestError::BidTooLow(current_price) => (
                StatusCode::BAD_REQUEST,
                format!("The bid must be higher than the current price of {}", current_price),
            ),
            RestError::AuctionCancelled => (
                StatusCode::CONFLICT,
                "The auction was cancelled and can no longer be edited".to_string(),
            ),
            RestError::AuctionAlreadyFinished => (
                StatusCode::CONFLICT,
                "The auction has already finished".to_string(),
            ),
            RestError::BidAlreadyRetracted => (
                StatusCode::CONFLICT,
                "The bid has already been retracted".to_string(),
            ),
            RestError::AuctionClosedForRetraction => (
                StatusCode::CONFLICT,
                "Bids of a finished auction cannot be retracted".to_string(),
            ),
            RestError::NotBidOwner => (
                StatusCode::FORBIDDEN,
                "Only the bidder who placed this bid may retract it".to_string(),
            ),
            RestError::NotAuctionSeller => (
                StatusCode::FORBIDDEN,
                "Only the seller may modify this auction".to_string(),
            ),
            RestError::ConcurrentBidConflict => (
                StatusCode::CONFLICT,
                "The auction is receiving concurrent updates, please resubmit".to_string(),
            ),
            RestError::TemporarilyUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "This service is temporarily unavailable".to_string(),
            ),
        }
    }
}

#[derive(ToResponse, ToSchema, Serialize)]
#[response(description = "An error occurred processing the request")]
pub struct ErrorBodyResponse {
    error: String,
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, msg) = self.to_status_and_message();
        (status, Json(ErrorBodyResponse { error: msg })).into_response()
    }
}

pub async fn live() -> Response {
    (StatusCode::OK, "OK").into_response()
}

pub async fn start_api(run_options: RunOptions, service: Service) -> Result<()> {
    // Make sure functions included in the paths section have distinct names, otherwise some api generators will fail
    #[derive(OpenApi)]
    #[openapi(
    paths(
    auction_api::post_auction,
    auction_api::get_auction,
    auction_api::patch_auction,
    auction_api::post_cancel_auction,
    auction_api::post_bid,
    auction_api::get_auction_bids,
    auction_api::post_retract_bid,
    ),
    components(
    schemas(
    auction_api::Auction,
    auction_api::AuctionCancel,
    auction_api::AuctionCreate,
    auction_api::AuctionState,
    auction_api::AuctionUpdate,
    auction_api::Bid,
    auction_api::BidCreate,
    auction_api::BidRetract,
    ErrorBodyResponse,
    ),
    responses(
    ErrorBodyResponse,
    ),
    ),
    tags(
    (name = "Auction Marketplace Server", description = "The auction server owns listings and their bid history.\
    It enforces the bidding rules and keeps each auction's price and winner consistent under concurrent bids and retractions.")
    )
    )]
    struct ApiDoc;

    let auction_routes = Router::new()
        .route("/", post(auction_api::post_auction))
        .route("/:auction_id", get(auction_api::get_auction))
        .route("/:auction_id", patch(auction_api::patch_auction))
        .route("/:auction_id/cancel", post(auction_api::post_cancel_auction))
        .route("/:auction_id/bids", post(auction_api::post_bid))
        .route("/:auction_id/bids", get(auction_api::get_auction_bids));
    let bid_routes = Router::new().route("/:bid_id/retract", post(auction_api::post_retract_bid));

    let v1_routes = Router::new().nest(
        "/v1",
        Router::new()
            .nest("/auctions", auction_routes)
            .nest("/bids", bid_routes),
    );

    let app: Router<()> = Router::new()
        .merge(Redoc::with_url("/docs", ApiDoc::openapi()))
        .merge(v1_routes)
        .route("/", get(root))
        .route("/live", get(live))
        .layer(CorsLayer::permissive())
        .with_state(service);

    let listener = tokio::net::TcpListener::bind(&run_options.listen_addr).await?;
    tracing::info!("API server listening on {}", &run_options.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            while !SHOULD_EXIT.load(Ordering::Acquire) {
                tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
            }
            tracing::info!("Shutting down API server...");
        })
        .await?;
    Ok(())
}
