//! Deduplicating generation loop.
//!
//! Generators are expensive and flaky: a call may return nothing new, or
//! nothing usable at all. [`retry_with_deduplication`] keeps calling until
//! enough unique items exist or too many calls in a row added nothing.

use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, warn};

/// Default number of unproductive calls tolerated after the first.
pub const DEFAULT_MAX_CONSECUTIVE_RETRIES: usize = 2;

/// Default number of non-batch results plugins tolerate before giving up.
pub const DEFAULT_MAX_SKIPPED: usize = 3;

/// Bookkeeping for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationState {
    /// Operation calls made.
    pub calls: usize,
    /// Calls whose result was not a batch.
    pub skipped: usize,
    /// Consecutive calls that added no unique item.
    pub consecutive_empty_retries: usize,
}

async fn run_loop<T, E, F, Fut, D>(
    mut operation: F,
    target_count: usize,
    max_consecutive_retries: usize,
    max_skipped: Option<usize>,
    mut dedup: D,
    state: &mut GenerationState,
) -> Result<Vec<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<Vec<T>>, E>>,
    D: FnMut(Vec<T>) -> Vec<T>,
{
    let mut collected: Vec<T> = Vec::new();

    while collected.len() < target_count
        && state.consecutive_empty_retries <= max_consecutive_retries
    {
        state.calls += 1;
        let Some(batch) = operation().await? else {
            warn!("Operation returned non-iterable result. Skipping this iteration.");
            state.skipped += 1;
            if max_skipped.is_some_and(|max| state.skipped > max) {
                warn!(skipped = state.skipped, "Too many non-iterable results, giving up");
                break;
            }
            continue;
        };

        let before = collected.len();
        let mut pool = std::mem::take(&mut collected);
        pool.extend(batch);
        collected = dedup(pool);

        if collected.len() > before {
            state.consecutive_empty_retries = 0;
        } else {
            state.consecutive_empty_retries += 1;
            debug!(
                "No new unique items. Consecutive retries: {}",
                state.consecutive_empty_retries
            );
        }
    }

    debug!(
        collected = collected.len(),
        target_count,
        calls = state.calls,
        "Generation finished"
    );
    Ok(collected)
}

/// Call `operation` until `dedup` leaves at least `target_count` items.
///
/// `operation` returns `Ok(Some(batch))` for a usable batch and `Ok(None)`
/// for a result that is not a batch; the latter is skipped without counting
/// as a retry. After each batch, `dedup` receives everything collected so far
/// plus the new batch. The loop stops once `target_count` is reached (the
/// result may exceed it) or after `max_consecutive_retries` unproductive
/// calls beyond the first. Errors from `operation` abort the loop.
///
/// # Example
///
/// ```ignore
/// use rubricate_redteam::{dedup_by_value, retry_with_deduplication};
///
/// let prompts = retry_with_deduplication(
///     || async { generate_batch().await.map(Some) },
///     10,
///     2,
///     dedup_by_value,
/// )
/// .await?;
/// ```
pub async fn retry_with_deduplication<T, E, F, Fut, D>(
    operation: F,
    target_count: usize,
    max_consecutive_retries: usize,
    dedup: D,
) -> Result<Vec<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<Vec<T>>, E>>,
    D: FnMut(Vec<T>) -> Vec<T>,
{
    let mut state = GenerationState::default();
    run_loop(
        operation,
        target_count,
        max_consecutive_retries,
        None,
        dedup,
        &mut state,
    )
    .await
}

/// [`retry_with_deduplication`], also returning the loop state.
pub async fn retry_with_deduplication_state<T, E, F, Fut, D>(
    operation: F,
    target_count: usize,
    max_consecutive_retries: usize,
    dedup: D,
) -> (Result<Vec<T>, E>, GenerationState)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<Vec<T>>, E>>,
    D: FnMut(Vec<T>) -> Vec<T>,
{
    let mut state = GenerationState::default();
    let result = run_loop(
        operation,
        target_count,
        max_consecutive_retries,
        None,
        dedup,
        &mut state,
    )
    .await;
    (result, state)
}

/// Builder for deduplicating generation.
#[derive(Debug, Clone)]
pub struct DedupRetry {
    target_count: usize,
    max_consecutive_retries: usize,
    max_skipped: Option<usize>,
}

impl DedupRetry {
    /// Collect `target_count` unique items.
    pub fn new(target_count: usize) -> Self {
        Self {
            target_count,
            max_consecutive_retries: DEFAULT_MAX_CONSECUTIVE_RETRIES,
            max_skipped: None,
        }
    }

    /// Unproductive calls tolerated after the first.
    #[must_use]
    pub fn max_consecutive_retries(mut self, retries: usize) -> Self {
        self.max_consecutive_retries = retries;
        self
    }

    /// Give up after more than `skips` non-batch results. Unbounded by default.
    #[must_use]
    pub fn max_skipped(mut self, skips: usize) -> Self {
        self.max_skipped = Some(skips);
        self
    }

    /// Run with [`dedup_by_value`].
    pub async fn run<T, E, F, Fut>(self, operation: F) -> Result<Vec<T>, E>
    where
        T: Serialize,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<Vec<T>>, E>>,
    {
        self.run_with(operation, dedup_by_value).await
    }

    /// Run with a custom dedup function.
    pub async fn run_with<T, E, F, Fut, D>(self, operation: F, dedup: D) -> Result<Vec<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<Vec<T>>, E>>,
        D: FnMut(Vec<T>) -> Vec<T>,
    {
        let (result, _) = self.run_with_state(operation, dedup).await;
        result
    }

    /// Run with a custom dedup function and get state.
    pub async fn run_with_state<T, E, F, Fut, D>(
        self,
        operation: F,
        dedup: D,
    ) -> (Result<Vec<T>, E>, GenerationState)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<Vec<T>>, E>>,
        D: FnMut(Vec<T>) -> Vec<T>,
    {
        let mut state = GenerationState::default();
        let result = run_loop(
            operation,
            self.target_count,
            self.max_consecutive_retries,
            self.max_skipped,
            dedup,
            &mut state,
        )
        .await;
        (result, state)
    }
}

/// Keep the first occurrence of each distinct value.
///
/// Values are compared by their JSON serialization; values that fail to
/// serialize are always kept.
pub fn dedup_by_value<T: Serialize>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match serde_json::to_value(item) {
            Ok(value) => seen.insert(value.to_string()),
            Err(_) => true,
        })
        .collect()
}

/// Pick `min(n, items.len())` distinct elements at random.
pub fn sample_items<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    let mut rng = rand::thread_rng();
    items.choose_multiple(&mut rng, n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Operation replaying scripted results, repeating the last one.
    fn scripted<'a, T: Clone + 'a>(
        results: Vec<Option<Vec<T>>>,
        calls: &'a AtomicUsize,
    ) -> impl FnMut() -> std::future::Ready<Result<Option<Vec<T>>, Infallible>> + 'a {
        let mut queue: VecDeque<_> = results.into();
        let mut last = None;
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            if let Some(next) = queue.pop_front() {
                last = Some(next);
            }
            std::future::ready(Ok(last.clone().flatten()))
        }
    }

    fn set_dedup(items: Vec<i32>) -> Vec<i32> {
        let mut seen = HashSet::new();
        items.into_iter().filter(|i| seen.insert(*i)).collect()
    }

    #[tokio::test]
    async fn test_collects_until_target() {
        let calls = AtomicUsize::new(0);
        let mut seen_pools = Vec::new();
        let result = retry_with_deduplication(
            scripted(vec![Some(vec![1, 2]), Some(vec![2, 3]), Some(vec![3, 4])], &calls),
            4,
            2,
            |pool: Vec<i32>| {
                seen_pools.push(pool.clone());
                set_dedup(pool)
            },
        )
        .await
        .unwrap();

        assert_eq!(result, vec![1, 2, 3, 4]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            seen_pools,
            vec![vec![1, 2], vec![1, 2, 2, 3], vec![1, 2, 3, 3, 4]]
        );
    }

    #[tokio::test]
    async fn test_stops_after_max_consecutive_retries() {
        let calls = AtomicUsize::new(0);
        let (result, state) = retry_with_deduplication_state(
            scripted::<i32>(vec![Some(vec![])], &calls),
            4,
            2,
            |items| items,
        )
        .await;

        assert_eq!(result.unwrap(), Vec::<i32>::new());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            state,
            GenerationState {
                calls: 3,
                skipped: 0,
                consecutive_empty_retries: 3
            }
        );
    }

    #[tokio::test]
    async fn test_skips_non_batch_results() {
        let calls = AtomicUsize::new(0);
        let (result, state) = retry_with_deduplication_state(
            scripted(vec![Some(vec![1]), None, None, Some(vec![2])], &calls),
            2,
            2,
            set_dedup,
        )
        .await;

        assert_eq!(result.unwrap(), vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(state.skipped, 2);
        assert_eq!(state.consecutive_empty_retries, 0);
    }

    #[tokio::test]
    async fn test_default_dedup_by_value() {
        let calls = AtomicUsize::new(0);
        let result = DedupRetry::new(3)
            .run(scripted(
                vec![
                    Some(vec![json!({"id": 1}), json!({"id": 2})]),
                    Some(vec![json!({"id": 2}), json!({"id": 3})]),
                ],
                &calls,
            ))
            .await
            .unwrap();

        assert_eq!(result, vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_results_small_target() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_deduplication(
            scripted::<i32>(vec![Some(vec![])], &calls),
            2,
            2,
            |items| items,
        )
        .await
        .unwrap();
        assert!(result.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_result_may_exceed_target() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_deduplication(
            scripted(vec![Some(vec![1, 2, 3])], &calls),
            2,
            2,
            set_dedup,
        )
        .await
        .unwrap();
        assert_eq!(result, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_target_never_calls() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_deduplication(
            scripted(vec![Some(vec![1])], &calls),
            0,
            2,
            set_dedup,
        )
        .await
        .unwrap();
        assert!(result.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_progress_resets_retry_counter() {
        let calls = AtomicUsize::new(0);
        let (result, state) = retry_with_deduplication_state(
            scripted(
                vec![
                    Some(vec![1]),
                    Some(vec![1]),
                    Some(vec![1]),
                    Some(vec![2]),
                    Some(vec![2]),
                    Some(vec![3]),
                ],
                &calls,
            ),
            3,
            2,
            set_dedup,
        )
        .await;
        assert_eq!(result.unwrap(), vec![1, 2, 3]);
        assert_eq!(state.calls, 6);
    }

    #[tokio::test]
    async fn test_error_aborts_loop() {
        let calls = AtomicUsize::new(0);
        let result: Result<Vec<i32>, String> = retry_with_deduplication(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(Some(vec![1]))
                    } else {
                        Err("generator down".to_string())
                    }
                }
            },
            5,
            2,
            set_dedup,
        )
        .await;
        assert_eq!(result.unwrap_err(), "generator down");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_max_skipped_bounds_loop() {
        let calls = AtomicUsize::new(0);
        let (result, state) = DedupRetry::new(2)
            .max_skipped(3)
            .run_with_state(scripted::<i32>(vec![None], &calls), set_dedup)
            .await;
        assert!(result.unwrap().is_empty());
        assert_eq!(state.skipped, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_max_skipped_keeps_partial_result() {
        let calls = AtomicUsize::new(0);
        let (result, state) = DedupRetry::new(2)
            .max_skipped(1)
            .run_with_state(scripted(vec![None, Some(vec![1]), None], &calls), set_dedup)
            .await;
        assert_eq!(result.unwrap(), vec![1]);
        assert_eq!(
            state,
            GenerationState {
                calls: 3,
                skipped: 2,
                consecutive_empty_retries: 0
            }
        );
    }

    #[tokio::test]
    async fn test_skips_do_not_consume_retries() {
        let calls = AtomicUsize::new(0);
        let (result, state) = retry_with_deduplication_state(
            scripted(
                vec![None, None, None, None, None, Some(vec![1]), Some(vec![2])],
                &calls,
            ),
            2,
            0,
            set_dedup,
        )
        .await;
        assert_eq!(result.unwrap(), vec![1, 2]);
        assert_eq!(state.skipped, 5);
        assert_eq!(state.calls, 7);
    }

    #[test]
    fn test_dedup_by_value() {
        let items = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 2}), json!({"id": 3})];
        assert_eq!(
            dedup_by_value(items),
            vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]
        );
        assert_eq!(dedup_by_value(vec!["a", "b", "a"]), vec!["a", "b"]);
        assert_eq!(dedup_by_value(Vec::<Value>::new()), Vec::<Value>::new());
    }

    #[test]
    fn test_sample_items() {
        let items = [1, 2, 3, 4, 5];
        let sample = sample_items(&items, 3);
        assert_eq!(sample.len(), 3);
        assert!(sample.iter().all(|i| items.contains(i)));
        let distinct: HashSet<_> = sample.iter().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_sample_more_than_available() {
        let items = [1, 2, 3];
        let mut sample = sample_items(&items, 5);
        sample.sort();
        assert_eq!(sample, vec![1, 2, 3]);
    }

    #[test]
    fn test_sample_empty() {
        assert!(sample_items::<i32>(&[], 3).is_empty());
    }
}
