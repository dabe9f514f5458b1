mod fetcher;

pub use fetcher::{DirFetcher, FetchError, FetchResult, Fetcher, HttpFetcher};
