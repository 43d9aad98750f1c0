//! Database access for homestay-web
//!
//! Schema lives in `homestay_common::db`; this module holds the queries.

pub mod homes;
pub mod sessions;
pub mod users;
