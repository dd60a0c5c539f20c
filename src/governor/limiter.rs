//! The governor: admission control, queue drain and the monitoring ticker.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{GovernorConfig, DANGER_PERCENT, WARNING_PERCENT};
use crate::error_handling::{AdmissionOutcome, GovernorStats};

use super::clock::{Clock, MonotonicClock};
use super::frequency::EndpointFrequency;
use super::priority::{EndpointKind, Priority};
use super::queue::{DeferredAction, QueuedRequest, RequestId};
use super::snapshot::UsageSnapshot;
use super::state::UsageState;

/// Client-side governor for a rate-limited upstream API.
///
/// Every outbound call goes through [`execute_request`](Self::execute_request),
/// which admits it, defers it (high priority only) or denies it based on the
/// requests made in the trailing usage window:
///
/// - high priority may use up to 98% of the budget and is queued above that
/// - normal priority may use up to 90% and is denied above that
/// - low priority may use up to 80% and is denied above that
///
/// A background ticker ([`start_monitoring`](Self::start_monitoring)) refreshes
/// the windows once per tick and drains at most one queued request per tick.
///
/// The governor is a cheap handle: clones share the same state, so one instance
/// is created per session and handed to every consumer.
#[derive(Clone)]
pub struct ApiGovernor {
    shared: Arc<Shared>,
}

struct Shared {
    config: GovernorConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<UsageState>,
    stats: GovernorStats,
    monitor: Mutex<Option<CancellationToken>>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, UsageState> {
        // The state stays consistent across a panicking producer: producers never
        // run under the lock.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn monitor(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.monitor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let monitor = self.monitor.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = monitor.take() {
            token.cancel();
        }
    }
}

/// Clears the departures loading flag when an admitted request finishes,
/// including on error, panic or cancellation of the caller's future.
pub(crate) struct InFlightGuard {
    shared: Arc<Shared>,
    kind: EndpointKind,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.shared.state().finish(self.kind);
    }
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Queued request handed to execution on this tick
    pub drained: Option<RequestId>,
    /// Queued requests dropped for outliving their TTL
    pub expired: usize,
    /// Usage after the tick, including a drained request
    pub requests_per_min: usize,
    pub queue_len: usize,
    pub recommended_interval: Duration,
}

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

enum Decision<R> {
    Admit,
    Queued(RequestId, R),
    Blocked,
    Shed,
}

impl ApiGovernor {
    /// Creates a governor with the given configuration and a monotonic clock.
    pub fn new(config: GovernorConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Creates a governor reading time from `clock`.
    pub fn with_clock(config: GovernorConfig, clock: Arc<dyn Clock>) -> Self {
        let state = UsageState::new(&config);
        ApiGovernor {
            shared: Arc::new(Shared {
                config,
                clock,
                state: Mutex::new(state),
                stats: GovernorStats::new(),
                monitor: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.shared.config
    }

    fn now(&self) -> u64 {
        self.shared.clock.now_millis()
    }

    /// Runs `producer` under the request budget.
    ///
    /// Returns:
    /// - `Ok(Some(value))` when the request ran, immediately or after waiting
    ///   in the queue
    /// - `Ok(None)` when budget is exhausted: normal and low priority requests
    ///   are denied without running, and a high-priority request gets `None`
    ///   if the queue is full or its entry is dropped before it runs
    /// - `Err(e)` with the producer's own error, unchanged
    ///
    /// A queued high-priority request waits without timeout until a tick
    /// drains it; wrap the call in `tokio::time::timeout` to bound the wait.
    /// Dropping the returned future does not withdraw the queued entry.
    pub async fn execute_request<T, E, F, Fut>(
        &self,
        kind: EndpointKind,
        producer: F,
        priority: Priority,
    ) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let now = self.now();
        let mut producer = Some(producer);
        let decision = {
            let mut state = self.shared.state();
            if state.admits(priority, now) {
                state.record_admission(kind, now);
                Decision::Admit
            } else if priority == Priority::High {
                let (tx, rx) = oneshot::channel();
                let id = state.next_request_id();
                let deferred = producer.take();
                let action: DeferredAction = Box::new(move |guard: InFlightGuard| {
                    async move {
                        if let Some(deferred) = deferred {
                            let result = deferred().await;
                            drop(guard);
                            // The caller may have stopped waiting; the call still happened.
                            let _ = tx.send(result);
                        }
                    }
                    .boxed()
                });
                let request = QueuedRequest {
                    id,
                    priority,
                    kind,
                    enqueued_at: now,
                    action,
                };
                match state.queue.push(request) {
                    Ok(()) => Decision::Queued(id, rx),
                    Err(_) => {
                        state.record_blocked(now);
                        Decision::Shed
                    }
                }
            } else {
                state.record_blocked(now);
                Decision::Blocked
            }
        };

        match decision {
            Decision::Admit => {
                self.shared.stats.increment(AdmissionOutcome::Admitted);
                log::debug!("Admitted {} request ({} priority)", kind, priority);
                let _guard = InFlightGuard {
                    shared: Arc::clone(&self.shared),
                    kind,
                };
                match producer.take() {
                    Some(producer) => producer().await.map(Some),
                    None => Ok(None),
                }
            }
            Decision::Queued(id, rx) => {
                self.shared.stats.increment(AdmissionOutcome::Queued);
                log::debug!(
                    "Queued {} request #{} until budget frees up ({} waiting)",
                    kind,
                    id,
                    self.queue_len()
                );
                match rx.await {
                    Ok(result) => result.map(Some),
                    // Entry dropped before running: expired, or monitoring stopped
                    Err(_) => Ok(None),
                }
            }
            Decision::Blocked => {
                self.shared.stats.increment(AdmissionOutcome::Blocked);
                log::debug!(
                    "Blocked {} request ({} priority): budget above {}% threshold",
                    kind,
                    priority,
                    priority.threshold_percent()
                );
                Ok(None)
            }
            Decision::Shed => {
                self.shared.stats.increment(AdmissionOutcome::Shed);
                log::warn!(
                    "Priority queue full ({} entries), shedding {} request",
                    self.shared.config.max_queue_len,
                    kind
                );
                Ok(None)
            }
        }
    }

    /// One ticker step: refresh the windows, expire stale entries and drain at
    /// most one queued request if the high-priority threshold allows it.
    ///
    /// The drained request runs on a spawned task, so this must be called from
    /// within a Tokio runtime.
    pub fn tick(&self) -> TickReport {
        let now = self.now();
        let (drained, expired, requests_per_min, queue_len, recommended_interval) = {
            let mut state = self.shared.state();
            state.refresh(now);
            let expired = match self.shared.config.queued_request_ttl {
                Some(ttl) => state.queue.expire(now, ttl),
                None => Vec::new(),
            };
            let drained = if !state.queue.is_empty() && state.admits(Priority::High, now) {
                let next = state.queue.pop_oldest();
                if let Some(request) = &next {
                    state.record_admission(request.kind, now);
                }
                next
            } else {
                None
            };
            (
                drained,
                expired,
                state.usage.requests_per_min(),
                state.queue.len(),
                state.refresh_interval(),
            )
        };

        if !expired.is_empty() {
            self.shared
                .stats
                .add(AdmissionOutcome::Expired, expired.len());
            log::warn!(
                "Dropped {} stale queued request(s): {:?}",
                expired.len(),
                expired
            );
        }

        let drained_id = drained.map(|request| {
            self.shared.stats.increment(AdmissionOutcome::Drained);
            log::info!(
                "Draining queued {} request #{} after {}ms ({} still waiting)",
                request.kind,
                request.id,
                now.saturating_sub(request.enqueued_at),
                queue_len
            );
            let guard = InFlightGuard {
                shared: Arc::clone(&self.shared),
                kind: request.kind,
            };
            tokio::spawn((request.action)(guard));
            request.id
        });

        TickReport {
            drained: drained_id,
            expired: expired.len(),
            requests_per_min,
            queue_len,
            recommended_interval,
        }
    }

    /// Starts the once-per-tick background task.
    ///
    /// Returns `false` without starting a second ticker if one is already
    /// running. Must be called from within a Tokio runtime.
    pub fn start_monitoring(&self) -> bool {
        let mut monitor = self.shared.monitor();
        if monitor.as_ref().is_some_and(|token| !token.is_cancelled()) {
            return false;
        }

        let shutdown = CancellationToken::new();
        let task_shutdown = shutdown.clone();
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        // tokio's interval rejects a zero period
        let mut ticker = interval(self.shared.config.tick_interval.max(MIN_TICK_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // The ticker must not keep a dropped governor alive
                        let Some(shared) = weak.upgrade() else {
                            break;
                        };
                        ApiGovernor { shared }.tick();
                    }
                    _ = task_shutdown.cancelled() => {
                        log::debug!("API governor ticker shutting down");
                        break;
                    }
                }
            }
        });

        log::debug!(
            "API governor ticker started ({}ms cadence)",
            self.shared.config.tick_interval.as_millis()
        );
        *monitor = Some(shutdown);
        true
    }

    /// Stops the ticker and drops every queued request.
    ///
    /// Nothing drains the queue once the ticker is gone, so waiting callers
    /// receive `None` instead of hanging. Stopping when not running only
    /// clears the queue.
    pub fn stop_monitoring(&self) {
        if let Some(token) = self.shared.monitor().take() {
            token.cancel();
        }

        // Dropped outside the lock; each drop wakes its caller with `None`
        let abandoned = self.shared.state().queue.drain_all();
        if !abandoned.is_empty() {
            self.shared
                .stats
                .add(AdmissionOutcome::Expired, abandoned.len());
            log::warn!(
                "Dropped {} queued request(s) on shutdown: {:?}",
                abandoned.len(),
                abandoned.iter().map(|request| request.id).collect::<Vec<_>>()
            );
        }
        drop(abandoned);
    }

    pub fn is_monitoring(&self) -> bool {
        self.shared
            .monitor()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    pub fn set_hovered_station(&self, station: Option<&str>) {
        self.shared.state().hover.set_station(station);
    }

    pub fn set_hovered_line(&self, line: Option<&str>) {
        self.shared.state().hover.set_line(line);
    }

    pub fn hovered_station(&self) -> Option<String> {
        self.shared.state().hover.station().map(str::to_owned)
    }

    pub fn hovered_line(&self) -> Option<String> {
        self.shared.state().hover.line().map(str::to_owned)
    }

    /// Priority for a departures lookup, raised to high for the hovered station.
    pub fn departures_priority(&self, station: &str, is_hovered: bool) -> Priority {
        self.shared
            .state()
            .hover
            .departures_priority(station, is_hovered)
    }

    /// Priority for train polling, raised to normal while a line is hovered.
    pub fn trains_priority(&self) -> Priority {
        self.shared.state().hover.trains_priority()
    }

    /// Admitted requests in the trailing usage window.
    pub fn requests_per_min(&self) -> usize {
        let now = self.now();
        let mut state = self.shared.state();
        state.usage.refresh(now);
        state.usage.requests_per_min()
    }

    pub fn available_slots(&self) -> usize {
        let now = self.now();
        self.shared.state().usage.available_slots(now)
    }

    pub fn usage_percent(&self) -> u32 {
        let now = self.now();
        let mut state = self.shared.state();
        state.usage.refresh(now);
        state.usage.usage_percent()
    }

    pub fn is_warning(&self) -> bool {
        self.usage_percent() > WARNING_PERCENT
    }

    pub fn is_danger(&self) -> bool {
        self.usage_percent() > DANGER_PERCENT
    }

    pub fn queue_len(&self) -> usize {
        self.shared.state().queue.len()
    }

    /// Requests denied within the last blocked-decay period.
    pub fn blocked_count(&self) -> usize {
        let now = self.now();
        self.shared.state().blocked_count(now)
    }

    /// The polling interval callers should throttle to.
    pub fn recommended_interval(&self) -> Duration {
        let now = self.now();
        let mut state = self.shared.state();
        state.refresh(now);
        state.refresh_interval()
    }

    pub fn endpoint_frequency(&self) -> EndpointFrequency {
        let now = self.now();
        self.shared.state().endpoint_frequency(now)
    }

    pub fn departures_loading(&self) -> bool {
        self.shared.state().departures_loading()
    }

    pub fn stats(&self) -> &GovernorStats {
        &self.shared.stats
    }

    /// Everything above in one consistent read.
    pub fn snapshot(&self) -> UsageSnapshot {
        let now = self.now();
        let monitoring = self.is_monitoring();
        let mut state = self.shared.state();
        state.refresh(now);
        let usage_percent = state.usage.usage_percent();
        UsageSnapshot {
            requests_per_min: state.usage.requests_per_min(),
            max_requests_per_min: state.usage.budget(),
            usage_percent,
            available_slots: state.usage.available_slots(now),
            is_warning: usage_percent > WARNING_PERCENT,
            is_danger: usage_percent > DANGER_PERCENT,
            queue_len: state.queue.len(),
            blocked_count: state.blocked_count(now),
            recommended_interval_ms: u64::try_from(state.refresh_interval().as_millis())
                .unwrap_or(u64::MAX),
            endpoint_frequency: state.endpoint_frequency(now),
            departures_loading: state.departures_loading(),
            hovered_station: state.hover.station().map(str::to_owned),
            hovered_line: state.hover.line().map(str::to_owned),
            monitoring,
            outcomes: self.shared.stats.to_map(),
        }
    }

    /// Records `count` admitted requests at the current time without running
    /// anything. Used to seed usage in tests and to account for calls made
    /// outside the governor.
    pub fn record_external_requests(&self, kind: EndpointKind, count: usize) {
        let now = self.now();
        let mut state = self.shared.state();
        for _ in 0..count {
            state.usage.record(now);
            state.frequency.record_call(kind, now);
        }
    }
}

impl Default for ApiGovernor {
    fn default() -> Self {
        Self::new(GovernorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::clock::ManualClock;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn governor_at(clock: &ManualClock) -> ApiGovernor {
        ApiGovernor::with_clock(GovernorConfig::default(), Arc::new(clock.clone()))
    }

    async fn ok_value(value: u32) -> Result<u32, String> {
        Ok(value)
    }

    #[tokio::test]
    async fn test_admitted_request_runs_and_records() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);

        let result = governor
            .execute_request(EndpointKind::Trains, || ok_value(7), Priority::Low)
            .await;

        assert_eq!(result, Ok(Some(7)));
        assert_eq!(governor.requests_per_min(), 1);
        assert_eq!(governor.endpoint_frequency().trains, 1);
        assert_eq!(governor.stats().get(AdmissionOutcome::Admitted), 1);
    }

    #[tokio::test]
    async fn test_priority_headroom_at_85_percent() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        governor.record_external_requests(EndpointKind::Trains, 85);

        let low = governor
            .execute_request(EndpointKind::Trains, || ok_value(1), Priority::Low)
            .await;
        assert_eq!(low, Ok(None));

        let normal = governor
            .execute_request(EndpointKind::Trains, || ok_value(2), Priority::Normal)
            .await;
        assert_eq!(normal, Ok(Some(2)));

        let high = governor
            .execute_request(EndpointKind::Departures, || ok_value(3), Priority::High)
            .await;
        assert_eq!(high, Ok(Some(3)));
        assert_eq!(governor.requests_per_min(), 87);
    }

    #[tokio::test]
    async fn test_denied_request_never_invokes_producer() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        governor.record_external_requests(EndpointKind::Trains, 95);

        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let result = governor
            .execute_request(
                EndpointKind::Locations,
                move || async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok::<_, String>(())
                },
                Priority::Low,
            )
            .await;

        assert_eq!(result, Ok(None));
        assert!(!invoked.load(Ordering::SeqCst));
        assert_eq!(governor.blocked_count(), 1);
        assert_eq!(governor.requests_per_min(), 95);
    }

    #[tokio::test]
    async fn test_high_priority_admitted_at_95_percent() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        governor.record_external_requests(EndpointKind::Trains, 95);

        let result = governor
            .execute_request(EndpointKind::Departures, || ok_value(42), Priority::High)
            .await;

        assert_eq!(result, Ok(Some(42)));
        assert_eq!(governor.requests_per_min(), 96);
    }

    #[tokio::test]
    async fn test_blocked_counter_decays() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        governor.record_external_requests(EndpointKind::Trains, 90);

        for _ in 0..3 {
            let _ = governor
                .execute_request(EndpointKind::Trains, || ok_value(0), Priority::Normal)
                .await;
        }
        assert_eq!(governor.blocked_count(), 3);
        clock.advance(1_000);
        assert_eq!(governor.blocked_count(), 0);
        assert_eq!(governor.stats().get(AdmissionOutcome::Blocked), 3);
    }

    #[tokio::test]
    async fn test_producer_error_propagates_and_clears_loading() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);

        let result: Result<Option<()>, String> = governor
            .execute_request(
                EndpointKind::Departures,
                || async { Err("upstream 502".to_string()) },
                Priority::High,
            )
            .await;

        assert_eq!(result, Err("upstream 502".to_string()));
        assert!(!governor.departures_loading());
        // The failed call still used budget
        assert_eq!(governor.requests_per_min(), 1);
    }

    #[tokio::test]
    async fn test_loading_flag_set_while_departures_in_flight() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let worker = governor.clone();
        let call = tokio::spawn(async move {
            worker
                .execute_request(
                    EndpointKind::Departures,
                    move || async move {
                        let _ = release_rx.await;
                        Ok::<_, String>(())
                    },
                    Priority::Normal,
                )
                .await
        });

        for _ in 0..50 {
            if governor.departures_loading() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(governor.departures_loading());

        let _ = release_tx.send(());
        let result = call.await.expect("task completes");
        assert_eq!(result, Ok(Some(())));
        assert!(!governor.departures_loading());
    }

    #[tokio::test]
    async fn test_trains_do_not_touch_loading_flag() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        let _ = governor
            .execute_request(EndpointKind::Trains, || ok_value(1), Priority::Normal)
            .await;
        assert!(!governor.departures_loading());
    }

    #[tokio::test]
    async fn test_high_priority_queued_at_99_percent_then_drained() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        governor.record_external_requests(EndpointKind::Trains, 99);

        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let worker = governor.clone();
        let pending = tokio::spawn(async move {
            worker
                .execute_request(
                    EndpointKind::Departures,
                    move || async move {
                        flag.store(true, Ordering::SeqCst);
                        Ok::<_, String>("board")
                    },
                    Priority::High,
                )
                .await
        });

        for _ in 0..50 {
            if governor.queue_len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(governor.queue_len(), 1);
        assert!(!invoked.load(Ordering::SeqCst));

        // Still over threshold: the entry keeps waiting
        let report = governor.tick();
        assert_eq!(report.drained, None);
        assert_eq!(report.queue_len, 1);

        // Window slides past the seeded requests
        clock.advance(60_000);
        let report = governor.tick();
        assert!(report.drained.is_some());
        assert_eq!(report.queue_len, 0);
        assert_eq!(report.requests_per_min, 1);

        let result = pending.await.expect("task completes");
        assert_eq!(result, Ok(Some("board")));
        assert!(invoked.load(Ordering::SeqCst));
        assert_eq!(governor.stats().get(AdmissionOutcome::Queued), 1);
        assert_eq!(governor.stats().get(AdmissionOutcome::Drained), 1);
    }

    #[tokio::test]
    async fn test_one_drain_per_tick_in_fifo_order() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        governor.record_external_requests(EndpointKind::Trains, 98);

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for n in 0..5u32 {
            let worker = governor.clone();
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                worker
                    .execute_request(
                        EndpointKind::Departures,
                        move || async move {
                            order.lock().unwrap_or_else(PoisonError::into_inner).push(n);
                            Ok::<_, String>(n)
                        },
                        Priority::High,
                    )
                    .await
            }));
            // Enqueue in a known order
            for _ in 0..50 {
                if governor.queue_len() == n as usize + 1 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        }
        assert_eq!(governor.queue_len(), 5);

        clock.advance(60_000);
        let mut drained = Vec::new();
        for remaining in (0..5).rev() {
            let report = governor.tick();
            assert_eq!(report.queue_len, remaining);
            drained.push(report.drained.expect("one entry per tick"));
        }
        assert!(drained.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(governor.tick().drained, None);

        for (n, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.expect("task completes"), Ok(Some(n as u32)));
        }
        let order = order.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(order.len(), 5);
    }

    #[tokio::test]
    async fn test_full_queue_sheds_high_priority() {
        let clock = ManualClock::new(0);
        let config = GovernorConfig {
            max_queue_len: 1,
            ..Default::default()
        };
        let governor = ApiGovernor::with_clock(config, Arc::new(clock.clone()));
        governor.record_external_requests(EndpointKind::Trains, 99);

        let worker = governor.clone();
        let _waiting = tokio::spawn(async move {
            worker
                .execute_request(EndpointKind::Departures, || ok_value(1), Priority::High)
                .await
        });
        for _ in 0..50 {
            if governor.queue_len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let shed = governor
            .execute_request(EndpointKind::Departures, || ok_value(2), Priority::High)
            .await;
        assert_eq!(shed, Ok(None));
        assert_eq!(governor.queue_len(), 1);
        assert_eq!(governor.stats().get(AdmissionOutcome::Shed), 1);
        assert_eq!(governor.blocked_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_queue_entries_expire_with_ttl() {
        let clock = ManualClock::new(0);
        let config = GovernorConfig {
            queued_request_ttl: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let governor = ApiGovernor::with_clock(config, Arc::new(clock.clone()));
        governor.record_external_requests(EndpointKind::Trains, 99);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let worker = governor.clone();
        let pending = tokio::spawn(async move {
            worker
                .execute_request(
                    EndpointKind::Departures,
                    move || async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(())
                    },
                    Priority::High,
                )
                .await
        });
        for _ in 0..50 {
            if governor.queue_len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        clock.advance(5_000);
        let report = governor.tick();
        assert_eq!(report.expired, 1);
        assert_eq!(report.drained, None);
        assert_eq!(pending.await.expect("task completes"), Ok(None));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recommended_interval_tracks_usage() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        assert_eq!(governor.recommended_interval(), Duration::from_millis(3000));

        governor.record_external_requests(EndpointKind::Trains, 60);
        assert_eq!(governor.recommended_interval(), Duration::from_millis(15000));

        clock.advance(20_000);
        // Frequency window emptied, 40 slots left
        assert_eq!(governor.recommended_interval(), Duration::from_millis(8000));
    }

    #[tokio::test]
    async fn test_warning_and_danger_thresholds() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        governor.record_external_requests(EndpointKind::Trains, 70);
        assert!(!governor.is_warning());
        governor.record_external_requests(EndpointKind::Trains, 1);
        assert!(governor.is_warning());
        assert!(!governor.is_danger());
        governor.record_external_requests(EndpointKind::Trains, 20);
        assert!(governor.is_danger());
        assert_eq!(governor.usage_percent(), 91);
    }

    #[tokio::test]
    async fn test_hover_signal_sets_priorities() {
        let governor = ApiGovernor::default();
        assert_eq!(governor.trains_priority(), Priority::Low);
        governor.set_hovered_line(Some("U5"));
        governor.set_hovered_station(Some("Alexanderplatz"));
        assert_eq!(governor.trains_priority(), Priority::Normal);
        assert_eq!(
            governor.departures_priority("Alexanderplatz", false),
            Priority::High
        );
        assert_eq!(governor.hovered_line().as_deref(), Some("U5"));
        governor.set_hovered_station(None);
        assert_eq!(governor.hovered_station(), None);
    }

    #[tokio::test]
    async fn test_snapshot_is_consistent() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        governor.record_external_requests(EndpointKind::Departures, 92);
        governor.set_hovered_station(Some("Hönow"));

        let snapshot = governor.snapshot();
        assert_eq!(snapshot.requests_per_min, 92);
        assert_eq!(snapshot.max_requests_per_min, 100);
        assert_eq!(snapshot.available_slots, 8);
        assert!(snapshot.is_warning && snapshot.is_danger);
        assert_eq!(snapshot.recommended_interval_ms, 30000);
        assert_eq!(snapshot.endpoint_frequency.departures, 92);
        assert_eq!(snapshot.hovered_station.as_deref(), Some("Hönow"));
        assert!(!snapshot.monitoring);
        assert_eq!(snapshot.outcomes.get("admitted"), Some(&0));
    }

    #[tokio::test]
    async fn test_start_monitoring_is_idempotent() {
        let config = GovernorConfig {
            tick_interval: Duration::from_millis(10),
            ..Default::default()
        };
        let governor = ApiGovernor::new(config);

        assert!(governor.start_monitoring());
        assert!(!governor.start_monitoring());
        assert!(governor.is_monitoring());

        governor.stop_monitoring();
        assert!(!governor.is_monitoring());
        // Stopping twice is a no-op
        governor.stop_monitoring();

        assert!(governor.start_monitoring());
        governor.stop_monitoring();
    }

    #[tokio::test]
    async fn test_stop_monitoring_releases_queued_callers() {
        let clock = ManualClock::new(0);
        let governor = governor_at(&clock);
        governor.record_external_requests(EndpointKind::Trains, 99);
        governor.start_monitoring();

        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let worker = governor.clone();
        let pending = tokio::spawn(async move {
            worker
                .execute_request(
                    EndpointKind::Departures,
                    move || async move {
                        flag.store(true, Ordering::SeqCst);
                        Ok::<_, String>(())
                    },
                    Priority::High,
                )
                .await
        });
        for _ in 0..50 {
            if governor.queue_len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(governor.queue_len(), 1);

        governor.stop_monitoring();
        assert_eq!(governor.queue_len(), 0);

        let result = tokio::time::timeout(Duration::from_secs(3), pending)
            .await
            .expect("queued caller released on stop")
            .expect("task completes");
        assert_eq!(result, Ok(None));
        assert!(!invoked.load(Ordering::SeqCst));
        assert_eq!(governor.stats().get(AdmissionOutcome::Expired), 1);
        // Waiting caller still holds a governor clone; it must not matter
        assert!(!governor.is_monitoring());
    }

    #[tokio::test]
    async fn test_zero_tick_interval_does_not_panic() {
        let config = GovernorConfig {
            tick_interval: Duration::ZERO,
            ..Default::default()
        };
        let governor = ApiGovernor::new(config);
        assert!(governor.start_monitoring());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(governor.is_monitoring());
        governor.stop_monitoring();
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let governor = ApiGovernor::default();
        governor.stop_monitoring();
        assert!(!governor.is_monitoring());
    }

    #[tokio::test]
    async fn test_ticker_drains_queue_in_background() {
        let clock = ManualClock::new(0);
        let config = GovernorConfig {
            tick_interval: Duration::from_millis(20),
            ..Default::default()
        };
        let governor = ApiGovernor::with_clock(config, Arc::new(clock.clone()));
        governor.record_external_requests(EndpointKind::Trains, 99);
        governor.start_monitoring();

        let worker = governor.clone();
        let pending = tokio::spawn(async move {
            worker
                .execute_request(EndpointKind::Departures, || ok_value(5), Priority::High)
                .await
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(governor.queue_len(), 1);

        clock.advance(60_000);
        let result = tokio::time::timeout(Duration::from_secs(2), pending)
            .await
            .expect("drained within timeout")
            .expect("task completes");
        assert_eq!(result, Ok(Some(5)));
        governor.stop_monitoring();
    }
}
