//! Page fetching
//!
//! One paginated request against the FEC API, decoded into a [`Page`].
//! The budget check happens before dispatch so a denied call never reaches
//! the network.

mod fetcher;
mod types;

pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use types::{Page, Pagination, RawRecord};
