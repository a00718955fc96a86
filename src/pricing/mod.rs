pub mod cache;
pub mod fetcher;
pub mod providers;
pub mod search;

pub use cache::PriceCache;
pub use fetcher::{FetchError, PriceFetcher, Quote};
pub use providers::PriceProvider;
pub use search::{SymbolMatch, SymbolSearch};
