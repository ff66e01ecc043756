// src/api.rs
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::Workout;

const API_KEY_HEADER: &str = "api-key";

/// Thin client for the remote fitness-tracking API. Endpoints are paged via a
/// `page` query parameter; each response carries the requested array field
/// and, on list endpoints, a `page_count` total.
pub struct ApiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn get_page(&self, endpoint: &str, page: u32) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {url}?page={page}");
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("page", page)])
            .send()
            .await
            .with_context(|| format!("Failed to request {endpoint} page {page}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            bail!("Server returned error for {endpoint} page {page}: {status} - {error_body}");
        }

        response
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to deserialize {endpoint} page {page}"))
    }

    /// Fetches every page of `endpoint`, concatenating the `items_field`
    /// array of each page in page order. A missing `page_count` means the
    /// first page is the only page. Any failed page request aborts the whole
    /// operation; no partial result is returned.
    pub async fn fetch_all_pages<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        items_field: &str,
    ) -> Result<Vec<T>> {
        let first = self.get_page(endpoint, 1).await?;
        let page_count = declared_page_count(&first);
        info!("Fetching {page_count} page(s) of {endpoint}");

        let mut items: Vec<T> = take_items(first, items_field)?;
        for page in 2..=page_count {
            let body = self.get_page(endpoint, page).await?;
            items.extend(take_items(body, items_field)?);
        }
        info!("Fetched {} item(s) from {endpoint}", items.len());
        Ok(items)
    }

    /// Fetches only workouts created strictly after `watermark`. Pages are
    /// returned newest-first, so the first page that also contains an
    /// already-seen workout is the last page that can hold anything new.
    pub async fn fetch_workouts_since(&self, watermark: DateTime<Utc>) -> Result<Vec<Workout>> {
        info!("Fetching workouts newer than {watermark}");
        let mut fresh = Vec::new();
        let mut page = 1;
        let mut page_count = 1;
        loop {
            let body = self.get_page("workouts", page).await?;
            if page == 1 {
                page_count = declared_page_count(&body);
            }
            let batch: Vec<Workout> = take_items(body, "workouts")?;
            let (new, exhausted) = split_fresh(batch, watermark);
            fresh.extend(new);
            if exhausted || page >= page_count {
                break;
            }
            page += 1;
        }
        info!("Fetched {} new workout(s)", fresh.len());
        Ok(fresh)
    }
}

/// Total page count declared by a list response; absent means one page.
fn declared_page_count(body: &Value) -> u32 {
    body.get("page_count")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(1)
}

/// Pulls the named array field out of a page body. A missing field is an
/// empty page, not an error.
fn take_items<T: DeserializeOwned>(mut body: Value, field: &str) -> Result<Vec<T>> {
    match body.get_mut(field) {
        Some(items) => serde_json::from_value(items.take())
            .with_context(|| format!("Malformed `{field}` array in response")),
        None => {
            warn!("Response body has no `{field}` field, treating page as empty");
            Ok(Vec::new())
        }
    }
}

/// Keeps only workouts newer than the watermark. The second value is true
/// when the batch contained anything at or before the watermark, meaning no
/// later page can hold new data.
fn split_fresh(batch: Vec<Workout>, watermark: DateTime<Utc>) -> (Vec<Workout>, bool) {
    let total = batch.len();
    let fresh: Vec<Workout> = batch
        .into_iter()
        .filter(|w| w.created_at > watermark)
        .collect();
    let exhausted = fresh.len() < total;
    (fresh, exhausted)
}
