//! Live order feeds: the status subscription hub and the simulated
//! position feed used by the storefront's tracking view.

pub mod feed;
pub mod route_feed;

pub use feed::{OrderFeeds, OrderSnapshot};
pub use route_feed::spawn_route_feed;
