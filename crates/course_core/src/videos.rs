//! crates/course_core/src/videos.rs
//!
//! The Video Finder. Video enrichment is best-effort: any provider failure or
//! timeout yields an empty list instead of an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::VideoRef;
use crate::ports::VideoSearchService;

#[derive(Clone)]
pub struct VideoFinder {
    search: Arc<dyn VideoSearchService>,
    timeout: Duration,
}

impl VideoFinder {
    pub fn new(search: Arc<dyn VideoSearchService>, timeout: Duration) -> Self {
        Self { search, timeout }
    }

    /// Returns at most `max_results` videos (at least one is requested),
    /// in the provider's relevance order.
    pub async fn find_videos(&self, query: &str, max_results: usize) -> Vec<VideoRef> {
        let limit = max_results.max(1);

        match tokio::time::timeout(self.timeout, self.search.search(query, limit)).await {
            Ok(Ok(mut videos)) => {
                videos.truncate(limit);
                debug!("Found {} videos for '{}'", videos.len(), query);
                videos
            }
            Ok(Err(e)) => {
                warn!("Video search for '{}' failed: {}", query, e);
                Vec::new()
            }
            Err(_) => {
                warn!("Video search for '{}' timed out after {:?}", query, self.timeout);
                Vec::new()
            }
        }
    }
}
