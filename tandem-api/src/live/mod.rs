pub mod feed;
pub mod sse;
pub mod view;

pub use feed::{LiveEvent, LiveEventKind, LocalFeed, MatchFeed, Subscription};
pub use view::ThreadView;
