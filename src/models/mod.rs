pub mod collection;
pub mod entry;
pub mod sampling;
pub mod stage;

pub use collection::{CollectionSummary, CreatedCollection};
pub use entry::{FishEntry, Measurement, MeasurementDraft, WorkflowTimes};
pub use sampling::{SamplingInfo, SamplingPatch};
pub use stage::{Stage, StageRecord, Stages};
