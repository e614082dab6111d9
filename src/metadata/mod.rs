mod extractor;
mod worker;

pub use extractor::{TrackMeta, extract_metadata};
pub use worker::{MetadataResult, MetadataService};
