use {
    super::repository::{
        Database,
        Repository,
    },
    std::sync::Arc,
};

pub mod cancel_auction;
pub mod create_auction;
pub mod get_auction;
pub mod get_auction_bids;
pub mod place_bid;
pub mod retract_bid;
pub mod update_auction;

pub struct ServiceInner {
    repo: Arc<Repository>,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(db: impl Database) -> Self {
        Self(Arc::new(ServiceInner {
            repo: Arc::new(Repository::new(db)),
        }))
    }
}
