use async_trait::async_trait;

use crate::error::ClientError;
use crate::models::{PageQuery, Status, StatusId};

/// The two remote operations the booster needs: reading one page of a
/// hashtag timeline and boosting a status.
#[async_trait]
pub trait Timeline: Send + Sync {
    /// Fetch one page, newest first, no longer than `query.limit`.
    async fn hashtag_page(&self, query: &PageQuery) -> Result<Vec<Status>, ClientError>;

    async fn reblog(&self, id: &StatusId) -> Result<(), ClientError>;
}
