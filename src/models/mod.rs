pub mod catalog;
pub mod friend_request;
pub mod message;
pub mod recommendation;
pub mod user;
pub mod watchlist;

pub use catalog::{
    CatalogItem, CatalogKind, CatalogPage, CatalogQuery, TmdbGenreList, TmdbListResponse,
    TmdbMovie, TvMazeShow, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use friend_request::{FriendEdge, FriendRequest, FriendRequestStatus, FriendRequestWithUser};
pub use message::Message;
pub use recommendation::{IncomingRecommendation, Recommendation, RecommendedItem};
pub use user::{normalize_email, NewUser, ProfileUpdate, PublicProfile, User, UserId};
pub use watchlist::{SaveMovieInput, SaveShowInput, SavedMovie, SavedShow, WatchStatus};
