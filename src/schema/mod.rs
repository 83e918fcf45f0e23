pub mod resolved;
pub mod discovery;
pub mod derive;
pub mod assemble;

pub use resolved::*;
pub use discovery::{bind_resolver, bind_resolvers, check_cardinality, DEFAULT_DATA_SOURCE};
pub use derive::{classify, filter_from_object, filter_name, input_from_object, ScalarClass, FILTERABLE_SCALARS};
pub use assemble::resolve;
