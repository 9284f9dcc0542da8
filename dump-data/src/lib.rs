pub mod entity;
pub mod error;
pub mod instrument;
pub mod pager;
pub mod query;
pub mod value;

pub use entity::{Changes, Entity};
pub use error::DataError;
pub use instrument::{Instrument, MetricsSink, NoopMetrics, Operation, Outcome};
pub use pager::{Builder, Destination, Pager, Shape};
pub use query::{Dialect, IdentifierPolicy, Insert, QueryError, Select, SortDirection, Statement, Update};
pub use value::{FilterMap, Value};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        filter_map, Builder, DataError, Entity, FilterMap, MetricsSink, Pager, Shape,
        SortDirection, Value,
    };
}
