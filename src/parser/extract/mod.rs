//! Field extractors, one module per field group. Each writes only its own
//! fields into the shared [`RecordBuilder`](crate::record::RecordBuilder).

pub mod attributes;
pub mod credits;
pub mod identity;
pub mod incomplete;
pub mod relations;
pub mod romanization;
