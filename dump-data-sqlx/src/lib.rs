//! # dump-data-sqlx
//!
//! SQLx backend for the dump data layer. One generic engine,
//! [`SqlxRepository<T>`], serves every entity over an `sqlx::AnyPool`.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Database`] | Shared handle: pool, SQL dialect and metrics sink |
//! | [`DatabaseConfig`] | Pool settings from the `database.*` config section |
//! | [`SqlxRepository`] | find / find-list / by-primary-keys / create / save |
//! | [`entity!`] | Defines an entity struct with change-tracking setters |
//! | [`SqlxErrorExt`] | `sqlx::Error` → `DataError` |
//!
//! # Feature flags
//!
//! Enable the drivers you connect to: `sqlite`, `postgres`, `mysql`.
//!
//! ```ignore
//! let db = Database::connect(&config.section::<DatabaseConfig>()?)
//!     .await?
//!     .with_metrics(Arc::new(PrometheusMetrics::new(&metrics_config)?));
//! let repo = db.repository::<Goods>();
//! let mut pager = Pager::desc("price", &[]).set_page(1, 20);
//! let page = repo.find_list_by_map(&filter, (&mut pager).into()).await?;
//! ```

mod bind;
pub mod connection;
pub mod error;
mod macros;
pub mod repository;

pub use connection::{Database, DatabaseConfig};
pub use error::SqlxErrorExt;
pub use repository::SqlxRepository;

#[doc(hidden)]
pub mod __private {
    pub use dump_data::{Changes, Entity, Value};
    pub use sqlx;
}

/// Re-exports of the most commonly used types from both `dump-data` and this crate.
pub mod prelude {
    pub use crate::{entity, Database, DatabaseConfig, SqlxErrorExt, SqlxRepository};
    pub use dump_data::prelude::*;
}
