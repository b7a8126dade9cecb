use serde::{Deserialize, Serialize};

/// Body for create and update.
#[derive(Debug, Deserialize)]
pub struct BlogRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Raw `?limit=&offset=`; parsed by the handler so bad values get a JSON 400.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
