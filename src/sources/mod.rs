//! Remote sources: downloading archives and unpacking them.

pub mod archive;
pub mod fetch;

pub use archive::{Extractor, TarballExtractor};
pub use fetch::{Fetcher, HttpFetcher};
