use {
    super::entities,
    std::collections::HashMap,
    tokio::sync::Mutex,
};

mod add_auction;
mod add_bid;
mod get_auction;
mod get_bid;
mod get_bids_by_auction;
mod get_or_create_auction_lock;
mod models;
mod remove_auction_lock;
mod retract_bid;
mod update_auction;

pub use models::*;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub auction_lock: Mutex<HashMap<entities::AuctionId, entities::AuctionLock>>,
}

#[derive(Debug)]
pub struct Repository {
    pub in_memory_store: InMemoryStore,
    db:                  Box<dyn Database>,
}

impl Repository {
    pub fn new(db: impl Database) -> Self {
        Self {
            in_memory_store: InMemoryStore::default(),
            db:              Box::new(db),
        }
    }
}
