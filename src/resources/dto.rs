use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub location: String,
    pub minimum_threshold: i32,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateResourceRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i32>,
    pub location: Option<String>,
    pub minimum_threshold: Option<i32>,
}
