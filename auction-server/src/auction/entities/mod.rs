pub mod auction;
pub mod bid;

pub use {
    auction::{
        Auction,
        AuctionCreate,
        AuctionId,
        AuctionLock,
        AuctionState,
    },
    bid::{
        Bid,
        BidId,
    },
};
