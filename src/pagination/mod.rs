//! Pagination module
//!
//! Supports: Offset (`startAt`/`maxResults`), Token (`nextPageToken`)
//!
//! # Overview
//!
//! [`Paginator::walk`] turns a [`CollectionQuery`] into the full list of
//! records, one page at a time. [`Paginator::fan_out`] walks a child
//! collection for every parent record. Both return everything or nothing.

mod fanout;
mod types;
mod walker;

pub use fanout::{FanOut, ParentSource, DEFAULT_FAN_OUT_CONCURRENCY};
pub use types::{
    lookup, CollectionQuery, NextPage, PageCursor, PageParams, PageStrategy, PARENT_PLACEHOLDER,
};
pub use walker::Paginator;
