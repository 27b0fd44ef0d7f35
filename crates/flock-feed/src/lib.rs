//! Feed readers for live streaming and paginated replay.
//!
//! Both readers implement [`FeedReader`] and absorb transport faults
//! internally: the live reader reconnects forever, the replay reader retries
//! each page a bounded number of times and then ends. Neither surfaces an
//! error to the caller.

pub mod error;
pub mod live;
pub mod pagination;
pub mod reader;
pub mod replay;
pub mod shutdown;

mod retry;

pub use error::FeedError;
pub use live::{
    HttpStreamSource, LiveReader, StreamSource, DEFAULT_MAX_LINE_BYTES, DEFAULT_STALL_TIMEOUT,
};
pub use pagination::extract_next_token;
pub use reader::{FeedMode, FeedReader, ReaderState, ReaderStats};
pub use replay::{HttpSearchSource, ReplayOptions, ReplayReader, SearchPage, SearchSource};
pub use shutdown::{channel as shutdown_channel, Shutdown, ShutdownTrigger};
