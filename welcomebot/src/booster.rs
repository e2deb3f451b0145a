use std::sync::Arc;

use crate::eligibility::skip_reason;
use crate::error::{BotError, ConfigError, Result};
use crate::models::{PageQuery, StatusId};
use crate::timeline::Timeline;

pub const DEFAULT_BATCH_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoosterSettings {
    pub batch_size: u32,
    pub dry_run: bool,
}

impl Default for BoosterSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
        }
    }
}

/// Boundaries of one fetched page.
///
/// An empty page reports the `since_id` it was asked for as both bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub oldest_id: Option<StatusId>,
    pub latest_id: Option<StatusId>,
    pub count: usize,
}

/// Watches a hashtag timeline and boosts original public posts.
pub struct Booster<T: ?Sized> {
    timeline: Arc<T>,
    settings: BoosterSettings,
}

impl<T: Timeline + ?Sized> Booster<T> {
    pub fn new(timeline: Arc<T>, settings: BoosterSettings) -> Result<Self> {
        if settings.batch_size == 0 {
            return Err(ConfigError::NonPositive { key: "batch_size" }.into());
        }
        Ok(Self { timeline, settings })
    }

    /// Fetch the newest page in `(since_id, max_id)` and boost every eligible
    /// post in it, newest first. Stops at the first failed boost.
    pub async fn process_batch(
        &self,
        hashtag: &str,
        since_id: Option<&StatusId>,
        max_id: Option<&StatusId>,
    ) -> Result<BatchOutcome> {
        tracing::debug!(limit = self.settings.batch_size, "fetching page");
        let query = PageQuery {
            hashtag: hashtag.to_string(),
            since_id: since_id.cloned(),
            max_id: max_id.cloned(),
            limit: self.settings.batch_size,
            local_only: true,
        };
        let page = self
            .timeline
            .hashtag_page(&query)
            .await
            .map_err(|source| BotError::Fetch {
                hashtag: hashtag.to_string(),
                source,
            })?;

        let (Some(latest), Some(oldest)) = (page.first(), page.last()) else {
            return Ok(BatchOutcome {
                oldest_id: since_id.cloned(),
                latest_id: since_id.cloned(),
                count: 0,
            });
        };
        let outcome = BatchOutcome {
            oldest_id: Some(oldest.id.clone()),
            latest_id: Some(latest.id.clone()),
            count: page.len(),
        };
        tracing::info!(count = outcome.count, "got statuses");
        tracing::debug!(latest = %latest.id, "most recent status in page");

        for status in &page {
            tracing::info!(id = %status.id, author = status.author(), "saw status");
            tracing::trace!(?status, "full status");
            if let Some(reason) = skip_reason(status) {
                tracing::debug!(id = %status.id, reason = reason.as_str(), "skipping status");
                continue;
            }
            if self.settings.dry_run {
                tracing::info!(id = %status.id, "would have boosted status");
                continue;
            }
            tracing::info!(id = %status.id, "boosting status");
            self.timeline
                .reblog(&status.id)
                .await
                .map_err(|source| BotError::Action {
                    id: status.id.clone(),
                    source,
                })?;
        }

        Ok(outcome)
    }

    /// Boost everything posted after `since_id` and return the cursor for the
    /// next scan.
    ///
    /// Pages backwards from the newest post until a short page comes back.
    /// The cursor is the newest id on the first page; later pages are older
    /// and never move it. With nothing new the input cursor comes back as is.
    pub async fn scan(&self, hashtag: &str, since_id: Option<&StatusId>) -> Result<Option<StatusId>> {
        tracing::info!(hashtag, since_id = ?since_id, "boosting new statuses");
        let page_size = self.settings.batch_size as usize;

        let first = self.process_batch(hashtag, since_id, None).await?;
        let latest_id = first.latest_id;
        let mut max_id = first.oldest_id;
        let mut count = first.count;

        while count == page_size {
            let next = self
                .process_batch(hashtag, since_id, max_id.as_ref())
                .await?;
            max_id = next.oldest_id;
            count = next.count;
        }

        tracing::info!(
            started_at = ?since_id,
            finished_at = ?latest_id,
            "done with all statuses"
        );
        Ok(latest_id)
    }

    /// Id of the newest post currently on the hashtag, if any.
    pub async fn most_recent_id(&self, hashtag: &str) -> Result<Option<StatusId>> {
        tracing::info!(hashtag, "looking up most recent status");
        let query = PageQuery {
            hashtag: hashtag.to_string(),
            since_id: None,
            max_id: None,
            limit: 1,
            local_only: true,
        };
        let page = self
            .timeline
            .hashtag_page(&query)
            .await
            .map_err(|source| BotError::Fetch {
                hashtag: hashtag.to_string(),
                source,
            })?;
        match page.into_iter().next() {
            Some(status) => {
                tracing::info!(id = %status.id, "most recent status");
                tracing::trace!(?status, "full status");
                Ok(Some(status.id))
            }
            None => {
                tracing::info!("found no statuses");
                Ok(None)
            }
        }
    }

    /// Use the supplied cursor, or start after whatever is newest right now so
    /// a first run never boosts old history.
    pub async fn resolve_cursor(
        &self,
        hashtag: &str,
        supplied: Option<StatusId>,
    ) -> Result<Option<StatusId>> {
        match supplied {
            Some(cursor) => Ok(Some(cursor)),
            None => self.most_recent_id(hashtag).await,
        }
    }
}
