//! Read-through caches used by the lookup endpoints.

mod ttl;

pub use ttl::TtlCache;
