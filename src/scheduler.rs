//! Scheduler: lane placement, travel timing, pause/resume and overflow.
//!
//! [`Danmaku`] owns one lane registry, one timer queue and one overflow
//! queue. Separate schedulers never share lane state.
//!
//! Everything runs on the caller's thread. Time only moves when the owner
//! calls [`advance_to`](Danmaku::advance_to) or
//! [`advance_by`](Danmaku::advance_by), which fires due timers in order:
//!
//! | Timer | Fires | Effect |
//! |-------|-------|--------|
//! | `Sample` | every ~16.7ms per flight | frees the lane once past the release threshold |
//! | `Arrive` | once, after the travel time | removes the element, runs its callback |
//! | `HoldExpired` | once, after a centered hold | removes the element, frees the priority slot |
//! | `Drain` | every 500ms while draining | replays one overflow entry |
//! | `Batch` | every batch cadence | sends the next batch item |
//!
//! Every scrolling lane acquisition is paired with exactly one release:
//! either the sampler crosses the threshold, or the element is removed
//! before it did.

use crate::batch::{BatchItem, BatchPlayback, BatchStep};
use crate::config::{DanmakuConfig, DRAIN_INTERVAL, SAMPLE_INTERVAL};
use crate::error::{ConfigError, Result};
use crate::lane::{LaneKind, LaneRegistry};
use crate::layout::LaneGeometry;
use crate::overflow::{DrainStep, OverflowEntry, OverflowQueue};
use crate::stage::{Anchor, Content, ElementId, Rgb, Stage};
use crate::timer::{Fired, TimerId, TimerQueue};
use crate::travel::{Completion, CompletionCallback, Hold, Travel, TravelState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

/// Timer payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Sample(ElementId),
    Arrive(ElementId),
    HoldExpired(ElementId),
    Drain,
    Batch,
}

/// Outcome of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// On stage in `lane`.
    Placed {
        /// The new element.
        element: ElementId,
        /// Lane it occupies.
        lane: usize,
    },
    /// Queued until a lane frees up.
    Deferred,
    /// Centered message with no free priority lane; discarded.
    Dropped,
    /// Empty body; nothing happened.
    Ignored,
}

impl Placement {
    /// The placed element, if any.
    pub const fn element(&self) -> Option<ElementId> {
        match *self {
            Self::Placed { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Whether the message went on stage.
    pub const fn is_placed(&self) -> bool {
        matches!(self, Self::Placed { .. })
    }
}

type BatchHook = Box<dyn FnMut() + Send>;
type HoverHook = Box<dyn FnMut(ElementId) + Send>;

/// A danmaku scheduler bound to one stage.
pub struct Danmaku<S> {
    config: DanmakuConfig,
    stage: S,
    geometry: LaneGeometry,
    lanes: LaneRegistry,
    timers: TimerQueue<Timer>,
    travels: BTreeMap<ElementId, Travel>,
    holds: BTreeMap<ElementId, Hold>,
    overflow: OverflowQueue,
    batch: Option<BatchPlayback>,
    running: bool,
    rng: StdRng,
    next_element: u64,
    on_batch_complete: Option<BatchHook>,
    on_hover_enter: Option<HoverHook>,
}

impl<S: Stage> Danmaku<S> {
    /// Build a scheduler over `stage`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if an option is malformed or the stage has
    /// no usable area.
    pub fn new(stage: S, config: DanmakuConfig) -> Result<Self> {
        config.validate()?;
        let (width, height) = (stage.width(), stage.height());
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::StageUnavailable { width, height });
        }

        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let geometry = LaneGeometry::new(height, config.line_count);
        debug!(
            lanes = config.line_count,
            width,
            height,
            line_height = geometry.line_height(),
            "danmaku scheduler ready"
        );

        Ok(Self {
            lanes: LaneRegistry::new(config.line_count),
            geometry,
            config,
            stage,
            timers: TimerQueue::new(),
            travels: BTreeMap::new(),
            holds: BTreeMap::new(),
            overflow: OverflowQueue::new(),
            batch: None,
            running: true,
            rng,
            next_element: 0,
            on_batch_complete: None,
            on_hover_enter: None,
        })
    }

    /// Call `hook` every time a batch finishes.
    #[must_use]
    pub fn on_batch_complete(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_batch_complete = Some(Box::new(hook));
        self
    }

    /// Call `hook` when the pointer enters a scrolling message.
    #[must_use]
    pub fn on_hover_enter(mut self, hook: impl FnMut(ElementId) + Send + 'static) -> Self {
        self.on_hover_enter = Some(Box::new(hook));
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current clock time.
    pub const fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Whether the scheduler is globally playing.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// The configuration in use.
    pub const fn config(&self) -> &DanmakuConfig {
        &self.config
    }

    /// Lane geometry over the stage.
    pub const fn geometry(&self) -> &LaneGeometry {
        &self.geometry
    }

    /// Lane occupancy.
    pub const fn lanes(&self) -> &LaneRegistry {
        &self.lanes
    }

    /// Deferred messages.
    pub const fn overflow(&self) -> &OverflowQueue {
        &self.overflow
    }

    /// The stage.
    pub const fn stage(&self) -> &S {
        &self.stage
    }

    /// The stage, mutably.
    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    /// Flight record of a scrolling message still on stage.
    pub fn travel(&self, id: ElementId) -> Option<&Travel> {
        self.travels.get(&id)
    }

    /// All scrolling messages on stage, oldest first.
    pub fn flights(&self) -> impl Iterator<Item = (ElementId, &Travel)> {
        self.travels.iter().map(|(id, travel)| (*id, travel))
    }

    /// Hold record of a centered message still on stage.
    pub fn hold(&self, id: ElementId) -> Option<&Hold> {
        self.holds.get(&id)
    }

    /// Number of centered messages on stage.
    pub fn held(&self) -> usize {
        self.holds.len()
    }

    /// Whether a batch is playing.
    pub const fn is_batch_playing(&self) -> bool {
        self.batch.is_some()
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    /// Send a scrolling message with default class and no callback.
    pub fn send(&mut self, body: &str) -> Placement {
        self.send_with(body, None, None)
    }

    /// Send a scrolling message.
    ///
    /// Empty bodies are ignored. While paused, or when every lane is busy,
    /// the message is queued and replayed later.
    pub fn send_with(
        &mut self,
        body: &str,
        class: Option<&str>,
        on_complete: Option<CompletionCallback>,
    ) -> Placement {
        if body.is_empty() {
            return Placement::Ignored;
        }
        self.place(OverflowEntry {
            body: body.to_string(),
            class: class.map(str::to_string),
            on_complete,
        })
    }

    /// Send a centered message with the default hold time.
    pub fn centered_send(&mut self, body: &str) -> Placement {
        self.centered_send_with(body, None, None, None)
    }

    /// Send a centered message.
    ///
    /// Takes the first free priority lane from the top. When none is free the
    /// message is dropped; centered messages are never queued.
    pub fn centered_send_with(
        &mut self,
        body: &str,
        class: Option<&str>,
        duration: Option<Duration>,
        on_complete: Option<CompletionCallback>,
    ) -> Placement {
        if body.is_empty() {
            return Placement::Ignored;
        }
        let Some(lane) = self.lanes.try_acquire(LaneKind::Centered, &mut self.rng) else {
            debug!(body, "no free priority lane, dropping centered message");
            return Placement::Dropped;
        };

        let id = self.next_id();
        let class = class.or(self.config.wrapper_class.as_deref());
        let width = self.stage.attach(id, &Content { body, class });
        self.stage.anchor(
            id,
            Anchor::Centered {
                lane,
                top: self.geometry.top(lane),
                line_height: self.geometry.line_height(),
            },
        );

        let duration = duration.unwrap_or(self.config.centered_duration);
        let timer = self.timers.schedule_once(duration, Timer::HoldExpired(id));
        self.holds.insert(
            id,
            Hold {
                lane,
                width,
                duration,
                timer,
                on_complete,
            },
        );
        debug!(element = %id, lane, ?duration, "placed centered message");
        Placement::Placed { element: id, lane }
    }

    /// Place a scrolling message or defer it.
    fn place(&mut self, entry: OverflowEntry) -> Placement {
        if !self.running {
            debug!(body = %entry.body, "paused, deferring message");
            self.overflow.enqueue(entry);
            return Placement::Deferred;
        }

        // Re-sample until a free lane is hit; only saturation stops the loop.
        loop {
            if let Some(lane) = self.lanes.try_acquire(LaneKind::Scrolling, &mut self.rng) {
                let element = self.launch(lane, entry);
                return Placement::Placed { element, lane };
            }
            if self.lanes.is_fully_occupied(LaneKind::Scrolling) {
                debug!(
                    body = %entry.body,
                    queued = self.overflow.len() + 1,
                    "all lanes busy, deferring message"
                );
                self.overflow.enqueue(entry);
                if !self.overflow.is_draining() {
                    self.start_drain();
                }
                return Placement::Deferred;
            }
        }
    }

    /// Put a message on stage in `lane` and arm its timers.
    fn launch(&mut self, lane: usize, entry: OverflowEntry) -> ElementId {
        let id = self.next_id();
        let class = entry
            .class
            .as_deref()
            .or(self.config.wrapper_class.as_deref());
        let width = self.stage.attach(
            id,
            &Content {
                body: &entry.body,
                class,
            },
        );

        let container_width = self.stage.width();
        let now = self.timers.now();
        let mut travel = Travel::launch(
            lane,
            width,
            container_width,
            self.config.base_speed,
            self.config.margin,
            self.config.coefficient,
            now,
        );
        let color = self
            .config
            .colorize
            .then(|| Rgb::from_u32(self.rng.random_range(0..=0x00FF_FFFF)));

        self.stage.anchor(
            id,
            Anchor::Scrolling {
                lane,
                top: self.geometry.top(lane),
                line_height: self.geometry.line_height(),
                start_x: container_width + self.config.margin,
                color,
            },
        );
        self.stage.transition(id, travel.transition);

        travel.sampler = Some(
            self.timers
                .schedule_repeating(SAMPLE_INTERVAL, Timer::Sample(id)),
        );
        travel.arrive_timer = Some(self.timers.schedule_once(travel.speed(), Timer::Arrive(id)));
        travel.on_complete = entry.on_complete;

        debug!(
            element = %id,
            lane,
            width,
            speed = travel.speed_seconds,
            distance = travel.distance_total,
            "placed scrolling message"
        );
        self.travels.insert(id, travel);
        id
    }

    fn next_id(&mut self) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        id
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Move the clock to `now`, firing every timer due on the way.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some(fired) = self.timers.pop_due(now) {
            self.dispatch(fired);
        }
        self.timers.advance_to(now);
    }

    /// Move the clock forward by `delta`.
    pub fn advance_by(&mut self, delta: Duration) {
        self.advance_to(self.now() + delta);
    }

    fn dispatch(&mut self, fired: Fired<Timer>) {
        match fired.event {
            Timer::Sample(id) => self.on_sample(id, fired.id),
            Timer::Arrive(id) => self.on_arrive(id, fired.id),
            Timer::HoldExpired(id) => self.on_hold_expired(id),
            Timer::Drain => self.on_drain(fired.id),
            Timer::Batch => self.on_batch(fired.id),
        }
    }

    fn on_sample(&mut self, id: ElementId, timer: TimerId) {
        let Some(travel) = self.travels.get_mut(&id) else {
            self.timers.cancel(timer);
            return;
        };
        if travel.sample() {
            travel.lane_released = true;
            travel.sampler = None;
            self.lanes.release(travel.lane, LaneKind::Scrolling);
            self.timers.cancel(timer);
            trace!(element = %id, lane = travel.lane, progress = travel.progress, "lane released early");
        }
    }

    fn on_arrive(&mut self, id: ElementId, timer: TimerId) {
        let armed = self.travels.get(&id).is_some_and(|travel| {
            travel.state == TravelState::Armed && travel.arrive_timer == Some(timer)
        });
        if armed {
            self.finish(id);
        }
    }

    /// Take a flight off stage, releasing its lane if the sampler has not.
    fn finish(&mut self, id: ElementId) {
        let Some(mut travel) = self.travels.remove(&id) else {
            return;
        };
        travel.state = TravelState::Completed;
        if let Some(sampler) = travel.sampler.take() {
            self.timers.cancel(sampler);
        }
        if !travel.lane_released {
            travel.lane_released = true;
            self.lanes.release(travel.lane, LaneKind::Scrolling);
        }

        if travel.interrupted {
            trace!(element = %id, "removing resumed message");
        } else if let Some(callback) = travel.on_complete.take() {
            callback(&Completion {
                duration: travel.speed(),
                element: id,
                width: travel.width,
            });
        }
        self.stage.remove(id);
    }

    fn on_hold_expired(&mut self, id: ElementId) {
        let Some(mut hold) = self.holds.remove(&id) else {
            return;
        };
        if let Some(callback) = hold.on_complete.take() {
            callback(&Completion {
                duration: hold.duration,
                element: id,
                width: hold.width,
            });
        }
        self.stage.remove(id);
        self.lanes.release(hold.lane, LaneKind::Centered);
    }

    // -----------------------------------------------------------------------
    // Pause / resume
    // -----------------------------------------------------------------------

    /// Pause every scrolling message and defer new sends.
    pub fn pause(&mut self) {
        let ids: Vec<ElementId> = self.travels.keys().copied().collect();
        for id in ids {
            self.pause_element(id);
        }
        self.running = false;
        debug!(frozen = self.travels.len(), "paused");
    }

    /// Resume every paused message and drain anything deferred meanwhile.
    pub fn play(&mut self) {
        let ids: Vec<ElementId> = self.travels.keys().copied().collect();
        for id in ids {
            self.resume_element(id);
        }
        self.running = true;
        if !self.overflow.is_empty() {
            self.start_drain();
        }
        debug!(queued = self.overflow.len(), "playing");
    }

    /// Freeze one scrolling message where it is.
    ///
    /// Returns `false` if it is not on stage or not moving.
    pub fn pause_element(&mut self, id: ElementId) -> bool {
        let now = self.timers.now();
        let Some(travel) = self.travels.get_mut(&id) else {
            return false;
        };
        let Some(frozen) = travel.pause(now) else {
            return false;
        };
        let timers = [travel.arrive_timer.take(), travel.sampler.take()];
        for timer in timers.into_iter().flatten() {
            self.timers.cancel(timer);
        }
        self.stage.transition(id, frozen);
        true
    }

    /// Restart one paused scrolling message toward its exit.
    ///
    /// The remaining distance is covered at the message's original speed,
    /// counted from now. Returns `false` if it was not paused.
    pub fn resume_element(&mut self, id: ElementId) -> bool {
        let now = self.timers.now();
        let Some(travel) = self.travels.get_mut(&id) else {
            return false;
        };
        let Some(motion) = travel.resume(now) else {
            return false;
        };
        travel.arrive_timer = Some(self.timers.schedule_once(motion.duration, Timer::Arrive(id)));
        if !travel.lane_released {
            travel.sampler = Some(
                self.timers
                    .schedule_repeating(SAMPLE_INTERVAL, Timer::Sample(id)),
            );
        }
        self.stage.transition(id, motion);
        true
    }

    // -----------------------------------------------------------------------
    // Hover
    // -----------------------------------------------------------------------

    /// The pointer entered an element.
    ///
    /// Scrolling messages are raised and paused, and the hover hook runs.
    /// Ignored unless hover is enabled; centered messages never react.
    pub fn pointer_enter(&mut self, id: ElementId) -> bool {
        if !self.config.hover || !self.travels.contains_key(&id) {
            return false;
        }
        self.stage.raise(id, true);
        self.pause_element(id);
        if let Some(hook) = self.on_hover_enter.as_mut() {
            hook(id);
        }
        true
    }

    /// The pointer left an element.
    ///
    /// The message is lowered and, if the scheduler is playing, resumed.
    pub fn pointer_leave(&mut self, id: ElementId) -> bool {
        if !self.config.hover || !self.travels.contains_key(&id) {
            return false;
        }
        self.stage.raise(id, false);
        if self.running {
            self.resume_element(id);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Overflow drain
    // -----------------------------------------------------------------------

    /// (Re)start the drain loop.
    fn start_drain(&mut self) {
        if let Some(old) = self.overflow.stop() {
            self.timers.cancel(old);
        }
        let timer = self.timers.schedule_repeating(DRAIN_INTERVAL, Timer::Drain);
        self.overflow.start(timer);
        debug!(queued = self.overflow.len(), "overflow drain started");
    }

    fn on_drain(&mut self, timer: TimerId) {
        if self.overflow.timer() != Some(timer) {
            self.timers.cancel(timer);
            return;
        }
        match self.overflow.tick() {
            DrainStep::Replay(entry) => {
                // A failed replay lands back on the tail.
                self.place(entry);
            }
            DrainStep::Idle => {}
            DrainStep::Stop => {
                self.overflow.stop();
                self.timers.cancel(timer);
                debug!("overflow drain idle, stopping");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Batch playback
    // -----------------------------------------------------------------------

    /// Send `items` one at a time, spread over the configured runtime.
    ///
    /// Replaces a batch that is already playing. An empty list does nothing.
    pub fn batch_send(&mut self, items: Vec<BatchItem>, class: Option<&str>) {
        if items.is_empty() {
            return;
        }
        self.stop_batch();
        let cadence = self.config.batch_cadence(items.len());
        let timer = self.timers.schedule_repeating(cadence, Timer::Batch);
        debug!(items = items.len(), ?cadence, "batch started");
        self.batch = Some(BatchPlayback::new(
            items,
            class.map(str::to_string),
            timer,
        ));
    }

    /// Stop batch playback without firing the completion hook.
    pub fn stop_batch(&mut self) {
        if let Some(batch) = self.batch.take() {
            self.timers.cancel(batch.timer);
        }
    }

    fn on_batch(&mut self, timer: TimerId) {
        let Some(batch) = self.batch.as_mut().filter(|batch| batch.timer == timer) else {
            self.timers.cancel(timer);
            return;
        };
        match batch.step() {
            BatchStep::Send(body) => {
                let class = batch.class().map(str::to_string);
                self.send_with(&body, class.as_deref(), None);
            }
            BatchStep::Finished => {
                debug!(looping = self.config.loop_batches, "batch complete");
                if !self.config.loop_batches {
                    self.stop_batch();
                }
                if let Some(hook) = self.on_batch_complete.as_mut() {
                    hook();
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Remove everything: elements, queued messages, timers and batch.
    ///
    /// No callbacks run. The scheduler stays usable afterwards.
    pub fn teardown(&mut self) {
        self.stop_batch();
        if let Some(timer) = self.overflow.stop() {
            self.timers.cancel(timer);
        }
        self.overflow.clear();

        for (id, travel) in std::mem::take(&mut self.travels) {
            for timer in [travel.arrive_timer, travel.sampler].into_iter().flatten() {
                self.timers.cancel(timer);
            }
            if !travel.lane_released {
                self.lanes.release(travel.lane, LaneKind::Scrolling);
            }
            self.stage.remove(id);
        }
        for (id, hold) in std::mem::take(&mut self.holds) {
            self.timers.cancel(hold.timer);
            self.lanes.release(hold.lane, LaneKind::Centered);
            self.stage.remove(id);
        }
        debug!("torn down");
    }
}

impl<S> std::fmt::Debug for Danmaku<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Danmaku")
            .field("running", &self.running)
            .field("lanes", &self.lanes)
            .field("in_flight", &self.travels.len())
            .field("held", &self.holds.len())
            .field("queued", &self.overflow.len())
            .field("draining", &self.overflow.is_draining())
            .finish_non_exhaustive()
    }
}
