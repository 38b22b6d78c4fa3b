//! API delegates: thin handlers in front of the upstream clients.
//!
//! Each returns a `Reply` (or a `SiteError`); security and cache headers
//! are added afterwards by the server.

pub mod crumb;
pub mod mailing_list;
pub mod purge;
