use crate::error::{UiError, UiResult};
use crate::schedule::time_source::TimeSource;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

fn next_scheduled_item_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

pub type ScheduledCallback<C> = Rc<RefCell<dyn FnMut(&mut C, TimerState) -> UiResult<()>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScheduleHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerState {
    pub start_ms: u64,
    pub now_ms: u64,
}

impl TimerState {
    pub fn delta_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.start_ms)
    }
}

#[derive(Clone)]
pub enum StopCondition {
    Once,
    Never,
    Until(Rc<dyn Fn() -> bool>),
    /// Counted from the moment the item joins the active set.
    ForDuration(u64),
}

impl fmt::Debug for StopCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once => f.write_str("Once"),
            Self::Never => f.write_str("Never"),
            Self::Until(_) => f.write_str("Until(..)"),
            Self::ForDuration(ms) => f.debug_tuple("ForDuration").field(ms).finish(),
        }
    }
}

pub struct ScheduledItem<C> {
    id: u64,
    callback: ScheduledCallback<C>,
    delay_ms: u64,
    interval_ms: u64,
    stop: StopCondition,
    start_ms: u64,
    added_ms: u64,
    paused: bool,
}

impl<C> Clone for ScheduledItem<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: self.callback.clone(),
            delay_ms: self.delay_ms,
            interval_ms: self.interval_ms,
            stop: self.stop.clone(),
            start_ms: self.start_ms,
            added_ms: self.added_ms,
            paused: self.paused,
        }
    }
}

impl<C> fmt::Debug for ScheduledItem<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledItem")
            .field("id", &self.id)
            .field("delay_ms", &self.delay_ms)
            .field("interval_ms", &self.interval_ms)
            .field("stop", &self.stop)
            .field("paused", &self.paused)
            .finish()
    }
}

impl<C> ScheduledItem<C> {
    /// A one-shot item with no delay.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(&mut C, TimerState) -> UiResult<()> + 'static,
    {
        Self {
            id: next_scheduled_item_id(),
            callback: Rc::new(RefCell::new(callback)),
            delay_ms: 0,
            interval_ms: 0,
            stop: StopCondition::Once,
            start_ms: 0,
            added_ms: 0,
            paused: false,
        }
    }

    pub fn handle(&self) -> ScheduleHandle {
        ScheduleHandle(self.id)
    }

    pub fn delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Repeats every `interval_ms` until stopped.
    pub fn every(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        if matches!(self.stop, StopCondition::Once) {
            self.stop = StopCondition::Never;
        }
        self
    }

    pub fn until(mut self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.stop = StopCondition::Until(Rc::new(predicate));
        self
    }

    pub fn for_duration(mut self, duration_ms: u64) -> Self {
        self.stop = StopCondition::ForDuration(duration_ms);
        self
    }

    pub fn stop_condition(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    fn is_due(&self, now_ms: u64) -> bool {
        !self.paused && now_ms >= self.start_ms.saturating_add(self.delay_ms)
    }

    fn should_stop(&self, now_ms: u64) -> bool {
        match &self.stop {
            StopCondition::Once => true,
            StopCondition::Never => false,
            StopCondition::Until(predicate) => predicate(),
            StopCondition::ForDuration(duration) => {
                now_ms >= self.added_ms.saturating_add(*duration)
            }
        }
    }
}

/// Owner of a [`Scheduler`] whose callbacks receive the owner itself.
pub trait SchedulerHost: Sized + 'static {
    fn scheduler_mut(&mut self) -> &mut Scheduler<Self>;
}

pub struct Scheduler<C> {
    items: Vec<ScheduledItem<C>>,
    pending_add: Vec<ScheduledItem<C>>,
    pending_remove: Vec<ScheduleHandle>,
    last_index: Option<usize>,
    ticking: bool,
    budget_ms: u64,
    clock: Box<dyn TimeSource>,
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("items", &self.items.len())
            .field("pending_add", &self.pending_add.len())
            .field("pending_remove", &self.pending_remove.len())
            .field("ticking", &self.ticking)
            .finish()
    }
}

impl<C: 'static> Scheduler<C> {
    pub fn new(clock: Box<dyn TimeSource>, budget_ms: u64) -> Self {
        Self {
            items: Vec::new(),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
            last_index: None,
            ticking: false,
            budget_ms,
            clock,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn set_budget_ms(&mut self, budget_ms: u64) {
        self.budget_ms = budget_ms;
    }

    pub fn len(&self) -> usize {
        self.items.len() + self.pending_add.len() - self.pending_remove.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn is_scheduled(&self, handle: ScheduleHandle) -> bool {
        if self.pending_position(handle).is_some() {
            return true;
        }
        self.position(handle).is_some() && !self.pending_remove.contains(&handle)
    }

    pub fn schedule_once<F>(&mut self, callback: F, delay_ms: u64) -> UiResult<ScheduleHandle>
    where
        F: FnMut(&mut C, TimerState) -> UiResult<()> + 'static,
    {
        self.schedule(ScheduledItem::new(callback).delay(delay_ms))
    }

    pub fn schedule_repeating<F>(
        &mut self,
        callback: F,
        delay_ms: u64,
        interval_ms: u64,
        stop: StopCondition,
    ) -> UiResult<ScheduleHandle>
    where
        F: FnMut(&mut C, TimerState) -> UiResult<()> + 'static,
    {
        self.schedule(
            ScheduledItem::new(callback)
                .delay(delay_ms)
                .every(interval_ms)
                .stop_condition(stop),
        )
    }

    pub fn schedule(&mut self, mut item: ScheduledItem<C>) -> UiResult<ScheduleHandle> {
        let handle = item.handle();
        let now = self.clock.now_ms();
        item.start_ms = now;
        item.added_ms = now;

        if self.ticking {
            if self.pending_position(handle).is_some() {
                return Err(UiError::AlreadyScheduled);
            }
            // Unscheduled earlier in this tick: the old entry goes at tick end,
            // the fresh one joins after it.
            if self.pending_remove.contains(&handle) {
                self.pending_add.push(item);
                return Ok(handle);
            }
            if self.position(handle).is_some() {
                return Err(UiError::AlreadyScheduled);
            }
            self.pending_add.push(item);
            return Ok(handle);
        }

        if self.position(handle).is_some() {
            return Err(UiError::AlreadyScheduled);
        }
        self.items.push(item);
        Ok(handle)
    }

    pub fn unschedule(&mut self, handle: ScheduleHandle) -> UiResult<()> {
        if self.ticking {
            if let Some(i) = self.pending_position(handle) {
                self.pending_add.remove(i);
                return Ok(());
            }
            if self.position(handle).is_some() && !self.pending_remove.contains(&handle) {
                self.pending_remove.push(handle);
                return Ok(());
            }
            return Err(UiError::UnknownScheduledItem);
        }

        let index = self
            .position(handle)
            .ok_or(UiError::UnknownScheduledItem)?;
        self.remove_index(index);
        Ok(())
    }

    pub fn pause(&mut self, handle: ScheduleHandle) -> UiResult<()> {
        self.item_mut(handle)?.paused = true;
        Ok(())
    }

    /// Resumes a paused item; its delay restarts from now.
    pub fn resume(&mut self, handle: ScheduleHandle) -> UiResult<()> {
        let now = self.clock.now_ms();
        let item = self.item_mut(handle)?;
        if item.paused {
            item.paused = false;
            item.start_ms = now;
        }
        Ok(())
    }

    pub fn is_paused(&self, handle: ScheduleHandle) -> bool {
        self.pending_position(handle)
            .map(|i| self.pending_add[i].paused)
            .or_else(|| self.position(handle).map(|i| self.items[i].paused))
            .unwrap_or(false)
    }

    /// The live entry for `handle`; a pending re-add shadows an entry queued for removal.
    fn item_mut(&mut self, handle: ScheduleHandle) -> UiResult<&mut ScheduledItem<C>> {
        if let Some(i) = self.pending_position(handle) {
            return Ok(&mut self.pending_add[i]);
        }
        if self.pending_remove.contains(&handle) {
            return Err(UiError::UnknownScheduledItem);
        }
        if let Some(i) = self.position(handle) {
            return Ok(&mut self.items[i]);
        }
        Err(UiError::UnknownScheduledItem)
    }

    fn position(&self, handle: ScheduleHandle) -> Option<usize> {
        self.items.iter().position(|item| item.id == handle.0)
    }

    fn pending_position(&self, handle: ScheduleHandle) -> Option<usize> {
        self.pending_add.iter().position(|item| item.id == handle.0)
    }

    fn remove_index(&mut self, index: usize) {
        self.items.remove(index);
        self.last_index = match self.last_index {
            Some(last) if index < last => Some(last - 1),
            Some(last) if index == last => last.checked_sub(1),
            other => other,
        };
    }

    fn begin_tick(&mut self) -> Option<(u64, usize, usize)> {
        if self.ticking {
            return None;
        }
        self.ticking = true;
        let len = self.items.len();
        let start = match self.last_index {
            Some(last) if last + 1 < len => last + 1,
            _ => 0,
        };
        Some((self.clock.now_ms(), start, len))
    }

    fn take_due(&mut self, index: usize, now: u64) -> Option<(ScheduledCallback<C>, TimerState)> {
        self.last_index = Some(index);
        let item = &self.items[index];
        if self.pending_remove.contains(&item.handle()) || !item.is_due(now) {
            return None;
        }
        Some((
            item.callback.clone(),
            TimerState {
                start_ms: item.start_ms,
                now_ms: now,
            },
        ))
    }

    fn after_fire(&mut self, index: usize, now: u64) {
        let item = &mut self.items[index];
        item.start_ms = now;
        item.delay_ms = item.interval_ms;
        let handle = item.handle();
        if item.should_stop(now) && !self.pending_remove.contains(&handle) {
            self.pending_remove.push(handle);
        }
    }

    fn over_budget(&self, tick_started: u64) -> bool {
        self.clock.now_ms().saturating_sub(tick_started) > self.budget_ms
    }

    fn end_tick(&mut self) {
        self.ticking = false;
        for handle in std::mem::take(&mut self.pending_remove) {
            if let Some(index) = self.position(handle) {
                self.remove_index(index);
            }
        }
        self.items.append(&mut self.pending_add);
    }
}

impl<C: SchedulerHost> Scheduler<C> {
    /// Fires every due item, round-robin from where the previous tick stopped,
    /// until the time budget runs out. Returns how many callbacks ran.
    ///
    /// Structural changes made by callbacks are applied once the tick ends,
    /// removals first. A nested tick from inside a callback does nothing.
    pub fn tick(host: &mut C) -> UiResult<usize> {
        let Some((now, start, len)) = host.scheduler_mut().begin_tick() else {
            return Ok(0);
        };

        let mut fired = 0;
        let mut outcome = Ok(());
        for step in 0..len {
            let index = (start + step) % len;
            if let Some((callback, state)) = host.scheduler_mut().take_due(index, now) {
                let result = match callback.try_borrow_mut() {
                    Ok(mut callback) => callback(host, state),
                    Err(_) => {
                        tracing::warn!("scheduled callback re-entered; skipping");
                        Ok(())
                    }
                };
                fired += 1;
                host.scheduler_mut().after_fire(index, now);
                if let Err(err) = result {
                    outcome = Err(err);
                    break;
                }
            }
            if host.scheduler_mut().over_budget(now) {
                tracing::trace!(visited = step + 1, len, "scheduler budget exhausted");
                break;
            }
        }

        host.scheduler_mut().end_tick();
        outcome.map(|()| fired)
    }
}
