pub mod site_fetcher;

pub use site_fetcher::{FetchError, PageSource, SiteFetcher};
