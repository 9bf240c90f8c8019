//! Search tools, one per Naver search vertical.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use naver_search::{LocalSearchArgs, NaverClient, SearchArgs, SearchKind, Validate};

use crate::types::{McpResult, ToolDefinition};

use super::registry::{parse_args, ToolEntry, ToolGroup, ToolHandler};

const TOOLS: [(&str, SearchKind, &str); 11] = [
    ("search_webkr", SearchKind::Webkr, "Perform a search on Naver Web Documents. (네이버 웹문서 검색)"),
    ("search_news", SearchKind::News, "Perform a search on Naver News. (네이버 뉴스 검색)"),
    ("search_blog", SearchKind::Blog, "Perform a search on Naver Blog. (네이버 블로그 검색)"),
    ("search_shop", SearchKind::Shop, "Perform a search on Naver Shopping. (네이버 쇼핑 검색)"),
    ("search_image", SearchKind::Image, "Perform a search on Naver Image. (네이버 이미지 검색)"),
    ("search_kin", SearchKind::Kin, "Perform a search on Naver KnowledgeiN. (네이버 지식iN 검색)"),
    ("search_book", SearchKind::Book, "Perform a search on Naver Book. (네이버 책 검색)"),
    ("search_encyc", SearchKind::Encyc, "Perform a search on Naver Encyclopedia. (네이버 지식백과 검색)"),
    ("search_academic", SearchKind::Academic, "Perform a search on Naver Academic. (네이버 전문자료 검색)"),
    ("search_local", SearchKind::Local, "Perform a search on Naver Local. (네이버 지역 검색)"),
    ("search_cafearticle", SearchKind::CafeArticle, "Perform a search on Naver Cafe Articles. (네이버 카페글 검색)"),
];

pub fn definitions() -> Vec<ToolDefinition> {
    TOOLS
        .iter()
        .map(|(name, kind, description)| definition(name, *kind, description))
        .collect()
}

fn definition(name: &str, kind: SearchKind, description: &str) -> ToolDefinition {
    let input_schema = match kind {
        SearchKind::Local => local_schema(),
        _ => search_schema(),
    };
    ToolDefinition {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

pub fn group(client: Arc<NaverClient>) -> ToolGroup {
    TOOLS
        .iter()
        .fold(ToolGroup::new("search"), |group, (name, kind, description)| {
            let def = definition(name, *kind, description);
            let entry = match kind {
                SearchKind::Local => {
                    ToolEntry::new(def, SearchTool::<LocalSearchArgs>::new(client.clone(), *kind))
                }
                _ => ToolEntry::new(def, SearchTool::<SearchArgs>::new(client.clone(), *kind)),
            };
            group.with(entry)
        })
}

fn search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "Search query" },
            "display": {
                "type": "integer", "minimum": 1, "maximum": 100, "default": 10,
                "description": "Number of results to return"
            },
            "start": {
                "type": "integer", "minimum": 1, "maximum": 1000, "default": 1,
                "description": "Start position of the results"
            },
            "sort": {
                "type": "string", "enum": ["sim", "date"], "default": "sim",
                "description": "Sort order: sim (similarity) or date"
            }
        },
        "required": ["query"]
    })
}

fn local_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "Search query" },
            "display": {
                "type": "integer", "minimum": 1, "maximum": 5, "default": 1,
                "description": "Number of results to return (max 5)"
            },
            "start": {
                "type": "integer", "minimum": 1, "maximum": 1, "default": 1,
                "description": "Start position (local search only supports 1)"
            },
            "sort": {
                "type": "string", "enum": ["random", "comment"], "default": "random",
                "description": "Sort order: random (accuracy) or comment (review count)"
            }
        },
        "required": ["query"]
    })
}

/// Handler for one search vertical, generic over its argument shape.
struct SearchTool<A> {
    client: Arc<NaverClient>,
    kind: SearchKind,
    _args: PhantomData<fn() -> A>,
}

impl<A> SearchTool<A> {
    fn new(client: Arc<NaverClient>, kind: SearchKind) -> Self {
        Self {
            client,
            kind,
            _args: PhantomData,
        }
    }
}

#[async_trait]
impl<A> ToolHandler for SearchTool<A>
where
    A: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
{
    async fn call(&self, args: Value) -> McpResult<Value> {
        let params: A = parse_args(args)?;
        params.validate()?;
        Ok(self.client.search(self.kind, &params).await?)
    }
}
