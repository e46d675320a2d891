// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory job queue with named one-shot, repeating and daily jobs.
//!
//! Every job runs on its own tokio task guarded by a [`CancellationToken`]
//! derived from the queue's shutdown token. Jobs are keyed by name;
//! scheduling a job under a name that is already taken replaces (cancels)
//! the previous one. Cancellation only affects jobs that are still waiting:
//! once a job body has started it runs to completion.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// What a repeating job wants after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobControl {
    Continue,
    Stop,
}

/// How a job is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Once,
    Repeating,
    Daily,
}

/// A snapshot of a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub name: String,
    pub kind: JobKind,
    pub next_run: Option<DateTime<Utc>>,
}

struct Entry {
    id: u64,
    kind: JobKind,
    token: CancellationToken,
    next_run: Option<DateTime<Utc>>,
}

struct Inner {
    jobs: DashMap<String, Entry>,
    shutdown: CancellationToken,
    next_id: AtomicU64,
}

impl Inner {
    /// Register `name`, cancelling any job previously registered under it.
    fn register(&self, name: &str, kind: JobKind, delay: Duration) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = self.shutdown.child_token();
        let entry = Entry {
            id,
            kind,
            token: token.clone(),
            next_run: next_run_after(delay),
        };
        if let Some(previous) = self.jobs.insert(name.to_string(), entry) {
            debug!(job = name, "replacing scheduled job");
            previous.token.cancel();
        }
        (id, token)
    }

    /// Remove `name` unless it has since been replaced by another job.
    fn remove_if_current(&self, name: &str, id: u64) {
        self.jobs.remove_if(name, |_, entry| entry.id == id);
    }

    fn reschedule(&self, name: &str, id: u64, delay: Duration) {
        if let Some(mut entry) = self.jobs.get_mut(name) {
            if entry.id == id {
                entry.next_run = next_run_after(delay);
            }
        }
    }
}

fn next_run_after(delay: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| Utc::now().checked_add_signed(d))
}

/// Handle to the job queue. Cheap to clone; clones share the same jobs.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<Inner>,
}

impl JobQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: DashMap::new(),
                shutdown: CancellationToken::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Run `job` once after `delay`.
    pub fn run_once<F>(&self, name: impl Into<String>, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let (id, token) = self.inner.register(&name, JobKind::Once, delay);
        let inner = Arc::clone(&self.inner);
        debug!(job = %name, delay_secs = delay.as_secs(), "scheduled one-shot job");

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(job = %name, "one-shot job cancelled");
                    inner.remove_if_current(&name, id);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            inner.remove_if_current(&name, id);
            job.await;
        });
    }

    /// Run `job` after `first`, then every `interval` until it returns
    /// [`JobControl::Stop`] or is cancelled.
    pub fn run_repeating<F, Fut>(
        &self,
        name: impl Into<String>,
        first: Duration,
        interval: Duration,
        mut job: F,
    ) where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = JobControl> + Send + 'static,
    {
        let name = name.into();
        let (id, token) = self.inner.register(&name, JobKind::Repeating, first);
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let mut delay = first;
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(job = %name, "repeating job cancelled");
                        inner.remove_if_current(&name, id);
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                if job().await == JobControl::Stop {
                    break;
                }
                delay = interval;
                inner.reschedule(&name, id, delay);
            }
            inner.remove_if_current(&name, id);
        });
    }

    /// Run `job` every day at each of `times`, interpreted at `offset`.
    pub fn run_daily<F, Fut>(
        &self,
        name: impl Into<String>,
        times: Vec<NaiveTime>,
        offset: FixedOffset,
        mut job: F,
    ) where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let Some(first) = next_daily_delay(Utc::now(), &times, offset) else {
            debug!(job = %name, "daily job has no times, not scheduling");
            return;
        };
        let (id, token) = self.inner.register(&name, JobKind::Daily, first);
        let inner = Arc::clone(&self.inner);
        info!(job = %name, first_in_secs = first.as_secs(), "scheduled daily job");

        tokio::spawn(async move {
            let mut delay = first;
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(job = %name, "daily job cancelled");
                        inner.remove_if_current(&name, id);
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                job().await;
                // Step past the slot that just fired before computing the next one.
                let after = Utc::now() + chrono::Duration::seconds(1);
                match next_daily_delay(after, &times, offset) {
                    Some(next) => delay = next + Duration::from_secs(1),
                    None => break,
                }
                inner.reschedule(&name, id, delay);
            }
            inner.remove_if_current(&name, id);
        });
    }

    /// Cancel a waiting job. Returns `false` if no job has that name.
    pub fn cancel_by_name(&self, name: &str) -> bool {
        match self.inner.jobs.remove(name) {
            Some((_, entry)) => {
                entry.token.cancel();
                debug!(job = name, "job cancelled by name");
                true
            }
            None => false,
        }
    }

    /// Whether a job with that name is waiting to run.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.jobs.contains_key(name)
    }

    /// Snapshot of all waiting jobs, sorted by name.
    pub fn jobs(&self) -> Vec<JobInfo> {
        let mut jobs: Vec<JobInfo> = self
            .inner
            .jobs
            .iter()
            .map(|e| JobInfo {
                name: e.key().clone(),
                kind: e.value().kind,
                next_run: e.value().next_run,
            })
            .collect();
        jobs.sort_by(|a, b| a.name.cmp(&b.name));
        jobs
    }

    /// Cancel every waiting job. Jobs scheduled afterwards are cancelled at once.
    pub fn shutdown(&self) {
        info!(pending = self.inner.jobs.len(), "shutting down job queue");
        self.inner.shutdown.cancel();
        self.inner.jobs.clear();
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Delay from `now` until the next of `times` at `offset`.
///
/// A time equal to the current local time counts as already passed.
/// Returns `None` when `times` is empty.
pub fn next_daily_delay(
    now: DateTime<Utc>,
    times: &[NaiveTime],
    offset: FixedOffset,
) -> Option<Duration> {
    let local = now.with_timezone(&offset).naive_local();
    let today = local.date();
    let tomorrow = today.succ_opt()?;
    times
        .iter()
        .filter_map(|t| {
            let candidate = today.and_time(*t);
            let at = if candidate > local {
                candidate
            } else {
                tomorrow.and_time(*t)
            };
            let at = at.and_local_timezone(offset).single()?;
            (at.with_timezone(&Utc) - now).to_std().ok()
        })
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_once_fires_after_delay() {
        let queue = JobQueue::new();
        let hits = counter();
        let h = hits.clone();
        queue.run_once("job", Duration::from_secs(10), async move {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(queue.contains("job"));

        tokio::time::sleep(Duration::from_secs(9)).await;
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!queue.contains("job"));
        assert!(!queue.cancel_by_name("job"));
    }

    #[tokio::test(start_paused = true)]
    async fn same_name_replaces_previous_job() {
        let queue = JobQueue::new();
        let first = counter();
        let second = counter();
        let f = first.clone();
        queue.run_once("reset", Duration::from_secs(10), async move {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let s = second.clone();
        queue.run_once("reset", Duration::from_secs(20), async move {
            s.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(queue.jobs().len(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_by_name_prevents_firing() {
        let queue = JobQueue::new();
        let hits = counter();
        let h = hits.clone();
        queue.run_once("job", Duration::from_secs(5), async move {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(queue.cancel_by_name("job"));
        assert!(!queue.cancel_by_name("job"));

        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_job_runs_until_stop() {
        let queue = JobQueue::new();
        let hits = counter();
        let h = hits.clone();
        queue.run_repeating(
            "tick",
            Duration::from_secs(3),
            Duration::from_secs(3),
            move || {
                let h = h.clone();
                async move {
                    let n = h.fetch_add(1, Ordering::SeqCst) + 1;
                    if n >= 3 { JobControl::Stop } else { JobControl::Continue }
                }
            },
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(queue.jobs()[0].kind, JobKind::Repeating);

        tokio::time::sleep(Duration::from_secs(20)).await;
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert!(queue.jobs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_everything() {
        let queue = JobQueue::new();
        let hits = counter();
        for name in ["a", "b"] {
            let h = hits.clone();
            queue.run_once(name, Duration::from_secs(1), async move {
                h.fetch_add(1, Ordering::SeqCst);
            });
        }
        queue.shutdown();
        assert!(queue.jobs().is_empty());

        let h = hits.clone();
        queue.run_once("late", Duration::from_secs(1), async move {
            h.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn next_daily_delay_picks_the_nearest_slot() {
        // 10:00 IST
        let now = at("2026-03-01T04:30:00Z");
        let delay = next_daily_delay(now, &[hm(21, 0), hm(11, 0)], ist()).unwrap();
        assert_eq!(delay, Duration::from_secs(3600));
    }

    #[test]
    fn next_daily_delay_wraps_to_tomorrow() {
        // 22:00 IST
        let now = at("2026-03-01T16:30:00Z");
        let delay = next_daily_delay(now, &[hm(11, 0), hm(21, 0)], ist()).unwrap();
        assert_eq!(delay, Duration::from_secs(13 * 3600));
    }

    #[test]
    fn next_daily_delay_treats_exact_time_as_passed() {
        // exactly 11:00 IST
        let now = at("2026-03-01T05:30:00Z");
        let delay = next_daily_delay(now, &[hm(11, 0)], ist()).unwrap();
        assert_eq!(delay, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn next_daily_delay_without_times_is_none() {
        assert!(next_daily_delay(Utc::now(), &[], ist()).is_none());
    }
}
