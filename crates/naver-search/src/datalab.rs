//! DataLab trend endpoints: search-keyword trends and shopping insight.
//!
//! Request bodies mirror the provider's JSON field names (camelCase). Every
//! body carries a [`Period`]; shopping bodies may also carry [`ShoppingFilters`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{invalid, NaverResult, Validate};

const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_KEYWORD_GROUPS: usize = 5;
const MAX_KEYWORDS_PER_GROUP: usize = 20;
const MAX_CATEGORY_GROUPS: usize = 3;
const SEARCH_AGE_CODES: [&str; 11] = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11"];
const SHOPPING_AGE_CODES: [&str; 6] = ["10", "20", "30", "40", "50", "60"];

/// Target of a DataLab request, relative to `/datalab/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatalabEndpoint {
    Search,
    ShoppingCategories,
    ShoppingCategoryDevice,
    ShoppingCategoryGender,
    ShoppingCategoryAge,
    ShoppingKeywords,
    ShoppingKeywordDevice,
    ShoppingKeywordGender,
    ShoppingKeywordAge,
}

impl DatalabEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            DatalabEndpoint::Search => "search",
            DatalabEndpoint::ShoppingCategories => "shopping/categories",
            DatalabEndpoint::ShoppingCategoryDevice => "shopping/category/device",
            DatalabEndpoint::ShoppingCategoryGender => "shopping/category/gender",
            DatalabEndpoint::ShoppingCategoryAge => "shopping/category/age",
            DatalabEndpoint::ShoppingKeywords => "shopping/category/keywords",
            DatalabEndpoint::ShoppingKeywordDevice => "shopping/category/keyword/device",
            DatalabEndpoint::ShoppingKeywordGender => "shopping/category/keyword/gender",
            DatalabEndpoint::ShoppingKeywordAge => "shopping/category/keyword/age",
        }
    }

    /// Earliest start date the endpoint accepts.
    pub fn earliest_date(&self) -> NaiveDate {
        match self {
            DatalabEndpoint::Search => NaiveDate::from_ymd_opt(2016, 1, 1),
            _ => NaiveDate::from_ymd_opt(2017, 8, 1),
        }
        .unwrap_or(NaiveDate::MIN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Date,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Pc,
    Mo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    M,
    F,
}

/// Date range and aggregation unit shared by every DataLab body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: String,
    pub end_date: String,
    pub time_unit: TimeUnit,
}

impl Period {
    pub fn validate_since(&self, earliest: NaiveDate) -> NaverResult<()> {
        let start = parse_date("startDate", &self.start_date)?;
        let end = parse_date("endDate", &self.end_date)?;
        if start > end {
            return Err(invalid(format!(
                "startDate {} is after endDate {}",
                self.start_date, self.end_date
            )));
        }
        if start < earliest {
            return Err(invalid(format!(
                "startDate must not be earlier than {}",
                earliest.format(DATE_FORMAT)
            )));
        }
        Ok(())
    }
}

fn parse_date(field: &str, value: &str) -> NaverResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| invalid(format!("{field} must be formatted as yyyy-mm-dd, got {value:?}")))
}

/// Optional audience filters for shopping insight requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShoppingFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ages: Option<Vec<String>>,
}

impl ShoppingFilters {
    fn validate(&self) -> NaverResult<()> {
        check_ages(self.ages.as_deref(), &SHOPPING_AGE_CODES)
    }
}

fn check_ages(ages: Option<&[String]>, allowed: &[&str]) -> NaverResult<()> {
    for age in ages.unwrap_or_default() {
        if !allowed.contains(&age.as_str()) {
            return Err(invalid(format!(
                "unsupported age code {age:?}, expected one of {}",
                allowed.join(", ")
            )));
        }
    }
    Ok(())
}

/// A named set of search keywords compared as one trend line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordGroup {
    pub group_name: String,
    pub keywords: Vec<String>,
}

/// Body of `POST /datalab/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatalabSearchArgs {
    #[serde(flatten)]
    pub period: Period,
    pub keyword_groups: Vec<KeywordGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ages: Option<Vec<String>>,
}

impl Validate for DatalabSearchArgs {
    fn validate(&self) -> NaverResult<()> {
        self.period
            .validate_since(DatalabEndpoint::Search.earliest_date())?;
        check_count("keywordGroups", self.keyword_groups.len(), MAX_KEYWORD_GROUPS)?;
        for group in &self.keyword_groups {
            check_name("groupName", &group.group_name)?;
            check_count(
                &format!("keywords of group {:?}", group.group_name),
                group.keywords.len(),
                MAX_KEYWORDS_PER_GROUP,
            )?;
        }
        check_ages(self.ages.as_deref(), &SEARCH_AGE_CODES)
    }
}

/// A named shopping category (or keyword) and its codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub name: String,
    pub param: Vec<String>,
}

/// Body of `POST /datalab/shopping/categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingCategoryArgs {
    #[serde(flatten)]
    pub period: Period,
    pub category: Vec<CategoryGroup>,
    #[serde(flatten)]
    pub filters: ShoppingFilters,
}

impl Validate for ShoppingCategoryArgs {
    fn validate(&self) -> NaverResult<()> {
        self.period
            .validate_since(DatalabEndpoint::ShoppingCategories.earliest_date())?;
        check_count("category", self.category.len(), MAX_CATEGORY_GROUPS)?;
        for group in &self.category {
            check_name("category name", &group.name)?;
            check_count(&format!("param of {:?}", group.name), group.param.len(), 1)?;
        }
        self.filters.validate()
    }
}

/// Body of the per-category device, gender, and age breakdown endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingCategoryBreakdownArgs {
    #[serde(flatten)]
    pub period: Period,
    pub category: String,
    #[serde(flatten)]
    pub filters: ShoppingFilters,
}

impl Validate for ShoppingCategoryBreakdownArgs {
    fn validate(&self) -> NaverResult<()> {
        self.period
            .validate_since(DatalabEndpoint::ShoppingCategoryDevice.earliest_date())?;
        check_name("category", &self.category)?;
        self.filters.validate()
    }
}

/// Body of `POST /datalab/shopping/category/keywords`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingKeywordsArgs {
    #[serde(flatten)]
    pub period: Period,
    pub category: String,
    pub keyword: Vec<CategoryGroup>,
    #[serde(flatten)]
    pub filters: ShoppingFilters,
}

impl Validate for ShoppingKeywordsArgs {
    fn validate(&self) -> NaverResult<()> {
        self.period
            .validate_since(DatalabEndpoint::ShoppingKeywords.earliest_date())?;
        check_name("category", &self.category)?;
        check_count("keyword", self.keyword.len(), MAX_KEYWORD_GROUPS)?;
        for group in &self.keyword {
            check_name("keyword name", &group.name)?;
            check_count(&format!("param of {:?}", group.name), group.param.len(), 1)?;
        }
        self.filters.validate()
    }
}

/// Body of the per-keyword device, gender, and age breakdown endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingKeywordBreakdownArgs {
    #[serde(flatten)]
    pub period: Period,
    pub category: String,
    pub keyword: String,
    #[serde(flatten)]
    pub filters: ShoppingFilters,
}

impl Validate for ShoppingKeywordBreakdownArgs {
    fn validate(&self) -> NaverResult<()> {
        self.period
            .validate_since(DatalabEndpoint::ShoppingKeywordDevice.earliest_date())?;
        check_name("category", &self.category)?;
        check_name("keyword", &self.keyword)?;
        self.filters.validate()
    }
}

fn check_name(field: &str, value: &str) -> NaverResult<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn check_count(field: &str, len: usize, max: usize) -> NaverResult<()> {
    if len == 0 || len > max {
        return Err(invalid(format!(
            "{field} must contain between 1 and {max} entries, got {len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_body() -> serde_json::Value {
        json!({
            "startDate": "2024-01-01",
            "endDate": "2024-03-31",
            "timeUnit": "month",
            "keywordGroups": [
                { "groupName": "rust", "keywords": ["rust", "cargo"] }
            ]
        })
    }

    #[test]
    fn test_search_body_serializes_flat() {
        let args: DatalabSearchArgs = serde_json::from_value(search_body()).unwrap();
        assert!(args.validate().is_ok());

        let out = serde_json::to_value(&args).unwrap();
        assert_eq!(out["startDate"], "2024-01-01");
        assert_eq!(out["timeUnit"], "month");
        assert_eq!(out["keywordGroups"][0]["groupName"], "rust");
        assert!(out.get("device").is_none());
        assert!(out.get("period").is_none());
    }

    #[test]
    fn test_period_rejects_reversed_and_early_ranges() {
        let mut body = search_body();
        body["startDate"] = json!("2024-05-01");
        let args: DatalabSearchArgs = serde_json::from_value(body).unwrap();
        assert!(args.validate().is_err());

        let mut body = search_body();
        body["startDate"] = json!("2015-12-31");
        let args: DatalabSearchArgs = serde_json::from_value(body).unwrap();
        assert!(args.validate().is_err());

        let mut body = search_body();
        body["endDate"] = json!("2024/03/31");
        let args: DatalabSearchArgs = serde_json::from_value(body).unwrap();
        let err = args.validate().unwrap_err().to_string();
        assert!(err.contains("yyyy-mm-dd"), "{err}");
    }

    #[test]
    fn test_keyword_group_limits() {
        let mut body = search_body();
        body["keywordGroups"] = json!([]);
        let args: DatalabSearchArgs = serde_json::from_value(body).unwrap();
        assert!(args.validate().is_err());

        let mut body = search_body();
        body["ages"] = json!(["1", "12"]);
        let args: DatalabSearchArgs = serde_json::from_value(body).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_shopping_breakdown_filters() {
        let args: ShoppingCategoryBreakdownArgs = serde_json::from_value(json!({
            "startDate": "2023-01-01",
            "endDate": "2023-12-31",
            "timeUnit": "week",
            "category": "50000000",
            "device": "mo"
        }))
        .unwrap();
        assert!(args.validate().is_ok());
        let out = serde_json::to_value(&args).unwrap();
        assert_eq!(out["device"], "mo");
        assert_eq!(out["category"], "50000000");

        let args: ShoppingCategoryBreakdownArgs = serde_json::from_value(json!({
            "startDate": "2017-07-01",
            "endDate": "2017-12-31",
            "timeUnit": "month",
            "category": "50000000"
        }))
        .unwrap();
        assert!(args.validate().is_err(), "shopping insight starts 2017-08-01");
    }

    #[test]
    fn test_shopping_category_single_param() {
        let args: ShoppingCategoryArgs = serde_json::from_value(json!({
            "startDate": "2023-01-01",
            "endDate": "2023-02-01",
            "timeUnit": "date",
            "category": [{ "name": "fashion", "param": ["50000000", "50000001"] }]
        }))
        .unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_keyword_breakdown_requires_keyword() {
        let args: ShoppingKeywordBreakdownArgs = serde_json::from_value(json!({
            "startDate": "2023-01-01",
            "endDate": "2023-02-01",
            "timeUnit": "date",
            "category": "50000000",
            "keyword": "",
            "ages": ["20", "30"]
        }))
        .unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(DatalabEndpoint::Search.path(), "search");
        assert_eq!(
            DatalabEndpoint::ShoppingKeywordAge.path(),
            "shopping/category/keyword/age"
        );
    }
}
