//! DataLab tools: search keyword trends and shopping insight.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use naver_search::{
    DatalabEndpoint, DatalabSearchArgs, NaverClient, ShoppingCategoryArgs,
    ShoppingCategoryBreakdownArgs, ShoppingKeywordBreakdownArgs, ShoppingKeywordsArgs, Validate,
};

use crate::types::{McpResult, ToolDefinition};

use super::registry::{parse_args, ToolEntry, ToolGroup, ToolHandler};

/// Extra filter a breakdown tool exposes in its schema.
#[derive(Clone, Copy)]
enum Breakdown {
    Device,
    Gender,
    Age,
}

#[derive(Clone, Copy)]
enum Shape {
    SearchTrend,
    Categories,
    CategoryBreakdown(Breakdown),
    Keywords,
    KeywordBreakdown(Breakdown),
}

const TOOLS: [(&str, DatalabEndpoint, Shape, &str); 9] = [
    (
        "datalab_search",
        DatalabEndpoint::Search,
        Shape::SearchTrend,
        "Perform a trend analysis on Naver search keywords. (네이버 검색어 트렌드 분석)",
    ),
    (
        "datalab_shopping_category",
        DatalabEndpoint::ShoppingCategories,
        Shape::Categories,
        "Perform a trend analysis on Naver Shopping category. (네이버 쇼핑 카테고리별 트렌드 분석)",
    ),
    (
        "datalab_shopping_by_device",
        DatalabEndpoint::ShoppingCategoryDevice,
        Shape::CategoryBreakdown(Breakdown::Device),
        "Perform a trend analysis on Naver Shopping by device. (네이버 쇼핑 기기별 트렌드 분석)",
    ),
    (
        "datalab_shopping_by_gender",
        DatalabEndpoint::ShoppingCategoryGender,
        Shape::CategoryBreakdown(Breakdown::Gender),
        "Perform a trend analysis on Naver Shopping by gender. (네이버 쇼핑 성별 트렌드 분석)",
    ),
    (
        "datalab_shopping_by_age",
        DatalabEndpoint::ShoppingCategoryAge,
        Shape::CategoryBreakdown(Breakdown::Age),
        "Perform a trend analysis on Naver Shopping by age. (네이버 쇼핑 연령별 트렌드 분석)",
    ),
    (
        "datalab_shopping_keywords",
        DatalabEndpoint::ShoppingKeywords,
        Shape::Keywords,
        "Perform a trend analysis on Naver Shopping keywords. (네이버 쇼핑 키워드별 트렌드 분석)",
    ),
    (
        "datalab_shopping_keyword_by_device",
        DatalabEndpoint::ShoppingKeywordDevice,
        Shape::KeywordBreakdown(Breakdown::Device),
        "Perform a trend analysis on Naver Shopping keywords by device. (네이버 쇼핑 키워드 기기별 트렌드 분석)",
    ),
    (
        "datalab_shopping_keyword_by_gender",
        DatalabEndpoint::ShoppingKeywordGender,
        Shape::KeywordBreakdown(Breakdown::Gender),
        "Perform a trend analysis on Naver Shopping keywords by gender. (네이버 쇼핑 키워드 성별 트렌드 분석)",
    ),
    (
        "datalab_shopping_keyword_by_age",
        DatalabEndpoint::ShoppingKeywordAge,
        Shape::KeywordBreakdown(Breakdown::Age),
        "Perform a trend analysis on Naver Shopping keywords by age. (네이버 쇼핑 키워드 연령별 트렌드 분석)",
    ),
];

pub fn definitions() -> Vec<ToolDefinition> {
    TOOLS
        .iter()
        .map(|(name, _, shape, description)| definition(name, *shape, description))
        .collect()
}

fn definition(name: &str, shape: Shape, description: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: schema(shape),
    }
}

pub fn group(client: Arc<NaverClient>) -> ToolGroup {
    TOOLS
        .iter()
        .fold(ToolGroup::new("datalab"), |group, (name, endpoint, shape, description)| {
            let def = definition(name, *shape, description);
            let client = client.clone();
            let entry = match shape {
                Shape::SearchTrend => {
                    ToolEntry::new(def, DatalabTool::<DatalabSearchArgs>::new(client, *endpoint))
                }
                Shape::Categories => {
                    ToolEntry::new(def, DatalabTool::<ShoppingCategoryArgs>::new(client, *endpoint))
                }
                Shape::CategoryBreakdown(_) => ToolEntry::new(
                    def,
                    DatalabTool::<ShoppingCategoryBreakdownArgs>::new(client, *endpoint),
                ),
                Shape::Keywords => {
                    ToolEntry::new(def, DatalabTool::<ShoppingKeywordsArgs>::new(client, *endpoint))
                }
                Shape::KeywordBreakdown(_) => ToolEntry::new(
                    def,
                    DatalabTool::<ShoppingKeywordBreakdownArgs>::new(client, *endpoint),
                ),
            };
            group.with(entry)
        })
}

// ── Schemas ─────────────────────────────────────────────────────

fn schema(shape: Shape) -> Value {
    let mut properties = period_properties();
    let mut required = vec!["startDate", "endDate", "timeUnit"];

    match shape {
        Shape::SearchTrend => {
            properties.insert(
                "keywordGroups".into(),
                json!({
                    "type": "array",
                    "minItems": 1,
                    "maxItems": 5,
                    "description": "Keyword groups to compare (max 5)",
                    "items": {
                        "type": "object",
                        "properties": {
                            "groupName": { "type": "string", "description": "Group name" },
                            "keywords": {
                                "type": "array",
                                "items": { "type": "string" },
                                "minItems": 1,
                                "maxItems": 20,
                                "description": "Keywords in the group (max 20)"
                            }
                        },
                        "required": ["groupName", "keywords"]
                    }
                }),
            );
            properties.insert("device".into(), device_schema());
            properties.insert("gender".into(), gender_schema());
            properties.insert(
                "ages".into(),
                ages_schema(&["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11"]),
            );
            required.push("keywordGroups");
        }
        Shape::Categories => {
            properties.insert(
                "category".into(),
                named_groups_schema("Shopping categories to compare (max 3)", 3, "Category code"),
            );
            required.push("category");
        }
        Shape::CategoryBreakdown(breakdown) => {
            properties.insert("category".into(), category_code_schema());
            insert_breakdown(&mut properties, breakdown);
            required.push("category");
        }
        Shape::Keywords => {
            properties.insert("category".into(), category_code_schema());
            properties.insert(
                "keyword".into(),
                named_groups_schema("Keywords to compare (max 5)", 5, "Keyword"),
            );
            required.extend(["category", "keyword"]);
        }
        Shape::KeywordBreakdown(breakdown) => {
            properties.insert("category".into(), category_code_schema());
            properties.insert(
                "keyword".into(),
                json!({ "type": "string", "description": "Keyword to analyse" }),
            );
            insert_breakdown(&mut properties, breakdown);
            required.extend(["category", "keyword"]);
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn period_properties() -> Map<String, Value> {
    let mut props = Map::new();
    props.insert(
        "startDate".into(),
        json!({ "type": "string", "description": "Start date (yyyy-mm-dd)" }),
    );
    props.insert(
        "endDate".into(),
        json!({ "type": "string", "description": "End date (yyyy-mm-dd)" }),
    );
    props.insert(
        "timeUnit".into(),
        json!({
            "type": "string",
            "enum": ["date", "week", "month"],
            "description": "Aggregation unit"
        }),
    );
    props
}

fn insert_breakdown(properties: &mut Map<String, Value>, breakdown: Breakdown) {
    match breakdown {
        Breakdown::Device => properties.insert("device".into(), device_schema()),
        Breakdown::Gender => properties.insert("gender".into(), gender_schema()),
        Breakdown::Age => properties.insert(
            "ages".into(),
            ages_schema(&["10", "20", "30", "40", "50", "60"]),
        ),
    };
}

fn device_schema() -> Value {
    json!({ "type": "string", "enum": ["pc", "mo"], "description": "Device: pc or mo (mobile)" })
}

fn gender_schema() -> Value {
    json!({ "type": "string", "enum": ["m", "f"], "description": "Gender: m or f" })
}

fn ages_schema(codes: &[&str]) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string", "enum": codes },
        "description": "Age group codes"
    })
}

fn category_code_schema() -> Value {
    json!({ "type": "string", "description": "Shopping category code, e.g. 50000000" })
}

fn named_groups_schema(description: &str, max: usize, param_description: &str) -> Value {
    json!({
        "type": "array",
        "minItems": 1,
        "maxItems": max,
        "description": description,
        "items": {
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Display name" },
                "param": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": 1,
                    "maxItems": 1,
                    "description": param_description
                }
            },
            "required": ["name", "param"]
        }
    })
}

// ── Handler ─────────────────────────────────────────────────────

struct DatalabTool<A> {
    client: Arc<NaverClient>,
    endpoint: DatalabEndpoint,
    _args: PhantomData<fn() -> A>,
}

impl<A> DatalabTool<A> {
    fn new(client: Arc<NaverClient>, endpoint: DatalabEndpoint) -> Self {
        Self {
            client,
            endpoint,
            _args: PhantomData,
        }
    }
}

#[async_trait]
impl<A> ToolHandler for DatalabTool<A>
where
    A: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
{
    async fn call(&self, args: Value) -> McpResult<Value> {
        let body: A = parse_args(args)?;
        body.validate()?;
        Ok(self.client.datalab(self.endpoint, &body).await?)
    }
}
