//! Search endpoints (`/v1/search/{kind}.json`) and their query arguments.

use serde::{Deserialize, Serialize};

use crate::types::{invalid, NaverResult, Validate};

/// One of the Naver search verticals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Webkr,
    News,
    Blog,
    Shop,
    Image,
    Kin,
    Book,
    Encyc,
    Academic,
    Local,
    CafeArticle,
}

impl SearchKind {
    /// Path segment under `/search/`, without the `.json` suffix.
    pub fn endpoint(&self) -> &'static str {
        match self {
            SearchKind::Webkr => "webkr",
            SearchKind::News => "news",
            SearchKind::Blog => "blog",
            SearchKind::Shop => "shop",
            SearchKind::Image => "image",
            SearchKind::Kin => "kin",
            SearchKind::Book => "book",
            SearchKind::Encyc => "encyc",
            SearchKind::Academic => "doc",
            SearchKind::Local => "local",
            SearchKind::CafeArticle => "cafearticle",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSort {
    #[default]
    Sim,
    Date,
}

/// Arguments accepted by every search vertical except local search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default = "default_display")]
    pub display: u32,
    #[serde(default = "default_start")]
    pub start: u32,
    #[serde(default)]
    pub sort: SearchSort,
}

fn default_display() -> u32 {
    10
}

fn default_start() -> u32 {
    1
}

impl Validate for SearchArgs {
    fn validate(&self) -> NaverResult<()> {
        check_query(&self.query)?;
        if !(1..=100).contains(&self.display) {
            return Err(invalid(format!(
                "display must be between 1 and 100, got {}",
                self.display
            )));
        }
        if !(1..=1000).contains(&self.start) {
            return Err(invalid(format!(
                "start must be between 1 and 1000, got {}",
                self.start
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalSort {
    #[default]
    Random,
    Comment,
}

/// Local search is capped at five results and a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSearchArgs {
    pub query: String,
    #[serde(default = "default_start")]
    pub display: u32,
    #[serde(default = "default_start")]
    pub start: u32,
    #[serde(default)]
    pub sort: LocalSort,
}

impl Validate for LocalSearchArgs {
    fn validate(&self) -> NaverResult<()> {
        check_query(&self.query)?;
        if !(1..=5).contains(&self.display) {
            return Err(invalid(format!(
                "display must be between 1 and 5 for local search, got {}",
                self.display
            )));
        }
        if self.start != 1 {
            return Err(invalid(format!(
                "start must be 1 for local search, got {}",
                self.start
            )));
        }
        Ok(())
    }
}

fn check_query(query: &str) -> NaverResult<()> {
    if query.trim().is_empty() {
        return Err(invalid("query must not be empty"));
    }
    Ok(())
}
