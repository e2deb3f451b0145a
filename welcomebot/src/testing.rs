//! In-memory [`Timeline`] for exercising the booster without a server.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::ClientError;
use crate::models::{PageQuery, Status, StatusId};
use crate::timeline::Timeline;

/// Record of a call made against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTimelineCall {
    Page(PageQuery),
    Reblog(StatusId),
}

#[derive(Default)]
struct MockState {
    /// Pages handed out verbatim, in order, before falling back to `posts`.
    scripted: VecDeque<Result<Vec<Status>, ClientError>>,
    /// Everything on the simulated server.
    posts: Vec<Status>,
    failing_reblogs: HashSet<StatusId>,
    calls: Vec<MockTimelineCall>,
}

/// Answers page requests either from a script of canned pages or by
/// filtering a simulated timeline the way Mastodon does (`since_id` and
/// `max_id` both exclusive, newest first, truncated to `limit`).
#[derive(Clone, Default)]
pub struct MockTimeline {
    state: Arc<Mutex<MockState>>,
}

impl MockTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated server holding `posts`, in any order.
    pub fn with_posts(posts: impl IntoIterator<Item = Status>) -> Self {
        let mock = Self::new();
        mock.publish(posts);
        mock
    }

    /// Queue a canned page. Scripted pages are consumed before the simulated
    /// timeline answers anything.
    pub fn push_page(&self, page: Vec<Status>) -> &Self {
        self.lock().scripted.push_back(Ok(page));
        self
    }

    pub fn push_page_error(&self, error: ClientError) -> &Self {
        self.lock().scripted.push_back(Err(error));
        self
    }

    /// Add posts to the simulated timeline.
    pub fn publish(&self, posts: impl IntoIterator<Item = Status>) {
        let mut state = self.lock();
        state.posts.extend(posts);
        state.posts.sort_by(|a, b| b.id.cmp(&a.id));
    }

    pub fn fail_reblog(&self, id: impl Into<StatusId>) -> &Self {
        self.lock().failing_reblogs.insert(id.into());
        self
    }

    pub fn calls(&self) -> Vec<MockTimelineCall> {
        self.lock().calls.clone()
    }

    pub fn page_queries(&self) -> Vec<PageQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockTimelineCall::Page(query) => Some(query),
                MockTimelineCall::Reblog(_) => None,
            })
            .collect()
    }

    pub fn reblogged(&self) -> Vec<StatusId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockTimelineCall::Reblog(id) => Some(id),
                MockTimelineCall::Page(_) => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test already failed; keep the state readable.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Timeline for MockTimeline {
    async fn hashtag_page(&self, query: &PageQuery) -> Result<Vec<Status>, ClientError> {
        let mut state = self.lock();
        state.calls.push(MockTimelineCall::Page(query.clone()));
        if let Some(scripted) = state.scripted.pop_front() {
            return scripted;
        }
        let page = state
            .posts
            .iter()
            .filter(|post| query.since_id.as_ref().map_or(true, |since| post.id > *since))
            .filter(|post| query.max_id.as_ref().map_or(true, |max| post.id < *max))
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(page)
    }

    async fn reblog(&self, id: &StatusId) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(MockTimelineCall::Reblog(id.clone()));
        if state.failing_reblogs.contains(id) {
            return Err(ClientError::Api {
                status: 500,
                body: format!("could not reblog {id}"),
            });
        }
        Ok(())
    }
}
