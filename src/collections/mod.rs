//! Collections
//!
//! Named groupings of swipe ids owned by the user that created them. Every
//! route here needs a bearer token, and every lookup is filtered on the
//! caller's id, so another user's collection simply does not exist to them.
//!
//! Quotas are checked by counting before writing. There is no transaction,
//! so concurrent requests from the same user can overshoot them.
//!
//! # Usage
//!
//! ```rust,ignore
//! let protected = collections::routes()
//!     .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));
//! ```

mod handler;
mod routes;

pub use routes::routes;
