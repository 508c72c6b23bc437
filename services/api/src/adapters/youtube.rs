//! services/api/src/adapters/youtube.rs
//!
//! This module contains the adapter for the YouTube Data API search endpoint.
//! It implements the `VideoSearchService` port from the `core` crate.

use async_trait::async_trait;
use course_core::domain::VideoRef;
use course_core::ports::{PortError, PortResult, VideoSearchService};
use serde::Deserialize;

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

/// YouTube's category id for "Education".
const EDUCATION_CATEGORY: &str = "27";

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct Snippet {
    title: String,
}

impl SearchResponse {
    fn into_videos(self) -> Vec<VideoRef> {
        self.items
            .into_iter()
            .filter_map(|item| {
                item.id.video_id.map(|video_id| VideoRef {
                    video_id,
                    title: item.snippet.title,
                })
            })
            .collect()
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `VideoSearchService` with the YouTube Data API v3.
#[derive(Clone)]
pub struct YouTubeAdapter {
    http: reqwest::Client,
    api_key: String,
}

impl YouTubeAdapter {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl VideoSearchService for YouTubeAdapter {
    /// Searches high-definition educational videos ordered by relevance.
    async fn search(&self, query: &str, limit: usize) -> PortResult<Vec<VideoRef>> {
        let max_results = limit.to_string();
        let response = self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("order", "relevance"),
                ("videoDefinition", "high"),
                ("videoCategoryId", EDUCATION_CATEGORY),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(body.into_videos())
    }
}

/// Used when no YouTube API key is configured: every search finds nothing.
pub struct DisabledVideoSearch;

#[async_trait]
impl VideoSearchService for DisabledVideoSearch {
    async fn search(&self, _query: &str, _limit: usize) -> PortResult<Vec<VideoRef>> {
        Ok(Vec::new())
    }
}
