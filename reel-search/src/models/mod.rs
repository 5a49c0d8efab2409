//! Data model for search screens

pub mod entity;
pub mod envelope;
pub mod filter;

pub use entity::Entity;
pub use envelope::{decode_envelope, PagedEnvelope, ResultItem, SearchRequest};
pub use filter::{
    Cardinality, EntityParam, FilterKind, FilterSpec, FilterValue, LookupBinding, LookupName,
    RangeValue,
};
