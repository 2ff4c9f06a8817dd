pub mod catalog;
pub mod cleanup;
pub mod friends;
pub mod messages;
pub mod recommendations;
pub mod users;
pub mod watchlist;

pub use catalog::{CatalogGateway, CatalogProvider, TmdbProvider, TtlCache, TvMazeProvider};
pub use cleanup::{RecommendationSweeper, SweeperHandle};
pub use friends::FriendService;
pub use messages::MessageService;
pub use recommendations::RecommendationService;
pub use users::{AuthSession, Registration, UserService};
pub use watchlist::{FriendMedia, WatchlistService};
