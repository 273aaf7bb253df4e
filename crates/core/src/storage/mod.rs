mod error;
mod http_mapping;
pub mod metadata;
mod traits;
mod types;

pub use error::{Result, StoreError};
pub use http_mapping::store_error_to_status_code;
pub use metadata::ResourcePath;
pub use traits::DocumentStore;
pub use types::{
    bare_parameter_name, ContinuationToken, PageRequest, Query, QueryPage, MATCH_ALL_QUERY,
};
