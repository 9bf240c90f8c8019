//! Naver Search: client library for the Naver Open API search and DataLab endpoints.

pub mod client;
pub mod datalab;
pub mod search;
pub mod types;

pub use client::{NaverClient, DEFAULT_BASE_URL};
pub use datalab::{
    CategoryGroup, DatalabEndpoint, DatalabSearchArgs, Device, Gender, KeywordGroup,
    Period, ShoppingCategoryArgs, ShoppingCategoryBreakdownArgs, ShoppingFilters,
    ShoppingKeywordBreakdownArgs, ShoppingKeywordsArgs, TimeUnit,
};
pub use search::{LocalSearchArgs, LocalSort, SearchArgs, SearchKind, SearchSort};
pub use types::*;
