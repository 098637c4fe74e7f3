//! Infrastructure layer - backing store families and the change feed

pub mod change_feed;
pub mod content;
pub mod storage;
