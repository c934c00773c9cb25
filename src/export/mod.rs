pub mod csv;
pub mod payload;

pub use csv::{export_file_name, to_csv, write_csv_file};
pub use payload::{BatchSaveRequest, NewCollectionRequest, SamplePayload};
