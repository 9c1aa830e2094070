mod client;

pub use client::{GroupMetadataFetcher, TerminationApiClient};
