//! # Pool actor: admission, dispatch, supervision, recovery.
//!
//! The pool is a single tokio task that exclusively owns every piece of
//! scheduler state — worker table, priority queue, in-flight map, counters.
//! Nothing else mutates that state, so no locking exists anywhere in the
//! scheduling path; concurrency lives only in the workers, which are reached
//! solely through channels.
//!
//! ## Architecture
//! ```text
//! PoolHandle ── Command ──► ┌────────────────────────────────┐
//!                           │  Pool actor (select loop)      │
//! worker 1 ──┐              │  - slots: Vec<Slot>            │
//! worker 2 ──┼── Notice ──► │  - spawning: HashMap           │
//! worker N ──┘   [feed]     │  - queue: TaskQueue            │
//!                           │  - in_flight: HashMap          │
//! deadline timers ─ Tick ──►│  - completed/failed counters   │
//!                           └───────────┬────────────────────┘
//!                                       └── publish(Event) ──► Bus
//! ```
//!
//! ## Dispatch cycle
//! ```text
//! Submit ─► queue.push ─► drain (assign to idle workers)
//!                     └─► grow: no idle worker && below max_units
//!                              └─► spawn one worker (handshake pending)
//! Ready  ─► promote to slot ─► drain
//! Completed/Failed ─► resolve submitter ─► release worker ─► drain
//! TaskDeadline ─► give up on task, release worker ─► drain
//! Down   ─► fail held task ─► remove slot ─► spawn one replacement
//! ```
//!
//! ## Rules
//! - A task is in exactly one of: queue, in-flight map, resolved (gone).
//! - `slots.len() + spawning.len() <= max_units` at every instant.
//! - Replies whose id is not in the in-flight map are dropped as stale; ids
//!   are monotone and never reused, so a late reply can never touch another
//!   task.
//! - Timeout gives up on the *result*, not the computation: the worker stays
//!   in the pool and is marked idle immediately.
//! - Idle workers are never reclaimed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::error::{PoolError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::pool::handle::{Command, PoolHandle};
use crate::pool::queue::{QueuedTask, TaskQueue};
use crate::pool::status::PoolStatus;
use crate::workers::runtime::{self, Notice};
use crate::workers::{Job, Reply, TaskId, UnitId, Worker, WorkerFactory};

/// Capacity of the worker→pool notice channel.
const FEED_CAPACITY: usize = 256;
/// Capacity of the deadline tick channel.
const TICK_CAPACITY: usize = 64;
/// Capacity of the handle→pool command channel.
const COMMAND_CAPACITY: usize = 64;

/// Deadline notifications delivered back to the actor by timer tasks.
enum Tick {
    /// A spawned worker's handshake window elapsed.
    InitDeadline { unit: UnitId },
    /// A dispatched task's reply window elapsed.
    TaskDeadline { id: TaskId },
}

/// One ready worker.
struct Slot<W: Worker> {
    id: UnitId,
    inbox: mpsc::UnboundedSender<Job<W::Payload>>,
    join: JoinHandle<()>,
    /// Task currently bound to this worker, if any.
    current: Option<TaskId>,
    assigned_at: Option<Instant>,
}

impl<W: Worker> Slot<W> {
    fn is_busy(&self) -> bool {
        self.current.is_some()
    }
}

/// A worker spawned but not yet through its ready handshake.
struct Spawning<W: Worker> {
    inbox: mpsc::UnboundedSender<Job<W::Payload>>,
    join: JoinHandle<()>,
}

/// A dispatched task awaiting its reply.
struct InFlight<W: Worker> {
    unit: UnitId,
    respond: oneshot::Sender<Result<W::Output, TaskError>>,
}

/// Bookkeeping for one `initialize()` call awaiting its worker batch.
struct InitWait {
    respond: oneshot::Sender<Result<(), PoolError>>,
    pending: HashSet<UnitId>,
    failure: Option<PoolError>,
}

/// The scheduler actor. Constructed and consumed by [`Pool::spawn`]; callers
/// interact through the returned [`PoolHandle`].
pub struct Pool<F: WorkerFactory> {
    name: Arc<str>,
    cfg: PoolConfig,
    factory: F,
    bus: Bus,
    token: CancellationToken,

    slots: Vec<Slot<F::Worker>>,
    spawning: HashMap<UnitId, Spawning<F::Worker>>,
    queue: TaskQueue<F::Worker>,
    in_flight: HashMap<TaskId, InFlight<F::Worker>>,
    init_wait: Option<InitWait>,

    completed: u64,
    failed: u64,
    /// Admission counter: task ids are admission-ordered, so the same value
    /// doubles as the FIFO tie-break sequence.
    next_task: u64,
    next_unit: u64,
    terminated: bool,

    feed_tx: mpsc::Sender<Notice<F::Worker>>,
    tick_tx: mpsc::Sender<Tick>,
}

impl<F: WorkerFactory> Pool<F> {
    /// Spawns the pool actor and returns a handle to it.
    ///
    /// The pool starts empty; call [`PoolHandle::initialize`] to spawn the
    /// initial worker batch, or let demand-driven scaling create workers as
    /// submissions arrive.
    pub fn spawn(name: impl Into<Arc<str>>, cfg: PoolConfig, factory: F, bus: Bus) -> PoolHandle<F::Worker> {
        let name: Arc<str> = name.into();
        let cfg = PoolConfig {
            max_units: cfg.max_units.max(1),
            ..cfg
        };

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (feed_tx, feed_rx) = mpsc::channel(FEED_CAPACITY);
        let (tick_tx, tick_rx) = mpsc::channel(TICK_CAPACITY);

        let actor = Pool {
            name: Arc::clone(&name),
            cfg,
            factory,
            bus,
            token: CancellationToken::new(),
            slots: Vec::new(),
            spawning: HashMap::new(),
            queue: TaskQueue::new(),
            in_flight: HashMap::new(),
            init_wait: None,
            completed: 0,
            failed: 0,
            next_task: 0,
            next_unit: 0,
            terminated: false,
            feed_tx,
            tick_tx,
        };
        tokio::spawn(actor.run(cmd_rx, feed_rx, tick_rx));

        PoolHandle::new(name, cmd_tx)
    }

    /// Actor loop: runs until every handle is dropped.
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<Command<F::Worker>>,
        mut feed_rx: mpsc::Receiver<Notice<F::Worker>>,
        mut tick_rx: mpsc::Receiver<Tick>,
    ) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.on_command(cmd),
                    None => break,
                },
                Some(notice) = feed_rx.recv() => self.on_notice(notice),
                Some(tick) = tick_rx.recv() => self.on_tick(tick),
            }
        }
        self.shutdown();
    }

    fn on_command(&mut self, cmd: Command<F::Worker>) {
        match cmd {
            Command::Submit {
                kind,
                payload,
                priority,
                respond,
            } => self.admit(kind, payload, priority, respond),
            Command::Initialize { respond } => self.start_initialize(respond),
            Command::Status { respond } => {
                let _ = respond.send(self.snapshot());
            }
            Command::Terminate { respond } => {
                self.shutdown();
                let _ = respond.send(());
            }
        }
    }

    // ---------------------------
    // Admission & dispatch
    // ---------------------------

    fn admit(
        &mut self,
        kind: Arc<str>,
        payload: <F::Worker as Worker>::Payload,
        priority: i32,
        respond: oneshot::Sender<Result<<F::Worker as Worker>::Output, TaskError>>,
    ) {
        if self.terminated {
            let _ = respond.send(Err(TaskError::Terminated));
            return;
        }
        let seq = self.next_task;
        self.next_task += 1;
        let id = TaskId(seq);

        self.publish(
            Event::now(EventKind::TaskQueued)
                .with_task(id)
                .with_priority(priority),
        );
        self.queue.push(QueuedTask {
            id,
            kind,
            payload,
            priority,
            seq,
            respond,
        });
        self.drain_queue();
        self.maybe_grow();
    }

    /// Assigns queued tasks to idle workers until either runs out.
    fn drain_queue(&mut self) {
        while !self.queue.is_empty() {
            let Some(idx) = self.slots.iter().position(|s| !s.is_busy()) else {
                break;
            };
            let task = self.queue.pop().expect("queue checked non-empty");
            self.dispatch(idx, task);
        }
    }

    fn dispatch(&mut self, idx: usize, task: QueuedTask<F::Worker>) {
        let QueuedTask {
            id,
            kind,
            payload,
            respond,
            ..
        } = task;

        let unit = {
            let slot = &mut self.slots[idx];
            slot.current = Some(id);
            slot.assigned_at = Some(Instant::now());
            // A failed send means the worker already died; the Down notice
            // sitting in the feed will fail this task through the normal path.
            let _ = slot.inbox.send(Job { id, kind, payload });
            slot.id
        };

        self.in_flight.insert(id, InFlight { unit, respond });
        self.arm_deadline(Tick::TaskDeadline { id }, self.cfg.task_timeout);
        self.publish(
            Event::now(EventKind::TaskDispatched)
                .with_task(id)
                .with_unit(unit),
        );
    }

    /// Spawns one more worker if the queue has work, nobody is idle, and the
    /// pool is below its ceiling.
    fn maybe_grow(&mut self) {
        if self.terminated || self.queue.is_empty() {
            return;
        }
        let has_idle = self.slots.iter().any(|s| !s.is_busy());
        if !has_idle && self.unit_count() < self.cfg.max_units {
            self.spawn_unit();
        }
    }

    fn unit_count(&self) -> usize {
        self.slots.len() + self.spawning.len()
    }

    // ---------------------------
    // Worker lifecycle
    // ---------------------------

    fn spawn_unit(&mut self) -> UnitId {
        let unit = UnitId(self.next_unit);
        self.next_unit += 1;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let worker = self.factory.build();
        let join = runtime::spawn_worker(
            unit,
            worker,
            inbox_rx,
            self.feed_tx.clone(),
            self.token.child_token(),
        );
        self.spawning.insert(
            unit,
            Spawning {
                inbox: inbox_tx,
                join,
            },
        );
        self.arm_deadline(Tick::InitDeadline { unit }, self.cfg.init_timeout);
        self.publish(Event::now(EventKind::UnitStarting).with_unit(unit));
        unit
    }

    fn start_initialize(&mut self, respond: oneshot::Sender<Result<(), PoolError>>) {
        if self.terminated {
            let _ = respond.send(Err(PoolError::Closed));
            return;
        }
        if self.init_wait.is_some() {
            let _ = respond.send(Err(PoolError::AlreadyInitializing));
            return;
        }
        let missing = self.cfg.initial_units().saturating_sub(self.unit_count());
        if missing == 0 {
            let _ = respond.send(Ok(()));
            return;
        }
        let mut pending = HashSet::with_capacity(missing);
        for _ in 0..missing {
            pending.insert(self.spawn_unit());
        }
        self.init_wait = Some(InitWait {
            respond,
            pending,
            failure: None,
        });
    }

    /// Accounts one spawn outcome against a pending `initialize()` call.
    fn settle_init(&mut self, unit: UnitId, failure: Option<PoolError>) {
        let finished = {
            let Some(wait) = self.init_wait.as_mut() else {
                return;
            };
            if !wait.pending.remove(&unit) {
                return;
            }
            if let Some(failure) = failure {
                wait.failure.get_or_insert(failure);
            }
            wait.pending.is_empty()
        };
        if finished {
            if let Some(wait) = self.init_wait.take() {
                let result = match wait.failure {
                    Some(e) => Err(e),
                    None => Ok(()),
                };
                let _ = wait.respond.send(result);
            }
        }
    }

    // ---------------------------
    // Notices from workers
    // ---------------------------

    fn on_notice(&mut self, notice: Notice<F::Worker>) {
        match notice {
            Notice::Reply { unit, reply } => match reply {
                Reply::Ready => self.on_ready(unit),
                Reply::Completed { id, output } => self.on_completed(unit, id, output),
                Reply::Failed { id, error } => self.on_failed(unit, id, error),
            },
            Notice::Down { unit, error } => self.on_down(unit, error),
        }
    }

    fn on_ready(&mut self, unit: UnitId) {
        let Some(spawning) = self.spawning.remove(&unit) else {
            // Handshake for a unit nothing tracks (init deadline already
            // fired, or the pool terminated); discard.
            return;
        };
        self.slots.push(Slot {
            id: unit,
            inbox: spawning.inbox,
            join: spawning.join,
            current: None,
            assigned_at: None,
        });
        self.publish(Event::now(EventKind::UnitReady).with_unit(unit));
        self.settle_init(unit, None);
        self.drain_queue();
    }

    fn on_completed(&mut self, unit: UnitId, id: TaskId, output: <F::Worker as Worker>::Output) {
        if !self.tracks(id, unit) {
            self.drop_stale(unit, id);
            return;
        }
        let flight = self.in_flight.remove(&id).expect("tracked above");
        let elapsed = self.release_unit(unit, id);
        self.completed += 1;
        let _ = flight.respond.send(Ok(output));

        let mut ev = Event::now(EventKind::TaskCompleted)
            .with_task(id)
            .with_unit(unit);
        if let Some(elapsed) = elapsed {
            ev = ev.with_elapsed(elapsed);
        }
        self.publish(ev);
        self.drain_queue();
    }

    fn on_failed(&mut self, unit: UnitId, id: TaskId, error: String) {
        if !self.tracks(id, unit) {
            self.drop_stale(unit, id);
            return;
        }
        let flight = self.in_flight.remove(&id).expect("tracked above");
        self.release_unit(unit, id);
        self.failed += 1;
        self.publish(
            Event::now(EventKind::TaskFailed)
                .with_task(id)
                .with_reason(error.clone()),
        );
        let _ = flight.respond.send(Err(TaskError::Execution { error }));
        self.drain_queue();
    }

    fn on_down(&mut self, unit: UnitId, error: String) {
        // Death during the handshake: the creation attempt simply fails.
        if self.spawning.remove(&unit).is_some() {
            self.publish(
                Event::now(EventKind::UnitDown)
                    .with_unit(unit)
                    .with_reason(error.clone()),
            );
            self.settle_init(unit, Some(PoolError::WorkerInit { error }));
            return;
        }
        let Some(idx) = self.slots.iter().position(|s| s.id == unit) else {
            return;
        };
        let slot = self.slots.swap_remove(idx);
        self.publish(
            Event::now(EventKind::UnitDown)
                .with_unit(unit)
                .with_reason(error.clone()),
        );

        // Only the task bound to the dead worker fails; queue and the other
        // workers are untouched.
        if let Some(id) = slot.current {
            if let Some(flight) = self.in_flight.remove(&id) {
                self.failed += 1;
                self.publish(
                    Event::now(EventKind::TaskFailed)
                        .with_task(id)
                        .with_reason(error.clone()),
                );
                let _ = flight.respond.send(Err(TaskError::WorkerDied { error }));
            }
        }

        // Exactly one replacement; never while terminating.
        if !self.terminated {
            self.spawn_unit();
        }
    }

    /// True when `id` is in flight on exactly this unit.
    fn tracks(&self, id: TaskId, unit: UnitId) -> bool {
        self.in_flight.get(&id).is_some_and(|f| f.unit == unit)
    }

    fn drop_stale(&self, unit: UnitId, id: TaskId) {
        self.publish(
            Event::now(EventKind::StaleReplyDropped)
                .with_task(id)
                .with_unit(unit),
        );
    }

    /// Marks the worker idle; returns how long the task was assigned.
    fn release_unit(&mut self, unit: UnitId, id: TaskId) -> Option<Duration> {
        let slot = self.slots.iter_mut().find(|s| s.id == unit)?;
        if slot.current == Some(id) {
            slot.current = None;
            slot.assigned_at.take().map(|t| t.elapsed())
        } else {
            None
        }
    }

    // ---------------------------
    // Deadlines
    // ---------------------------

    fn on_tick(&mut self, tick: Tick) {
        match tick {
            Tick::InitDeadline { unit } => self.on_init_deadline(unit),
            Tick::TaskDeadline { id } => self.on_task_deadline(id),
        }
    }

    fn on_init_deadline(&mut self, unit: UnitId) {
        let Some(spawning) = self.spawning.remove(&unit) else {
            // Already ready, already down, or pool terminated.
            return;
        };
        spawning.join.abort();
        self.publish(
            Event::now(EventKind::UnitInitTimeout)
                .with_unit(unit)
                .with_timeout(self.cfg.init_timeout),
        );
        self.settle_init(
            unit,
            Some(PoolError::InitializationTimeout {
                timeout: self.cfg.init_timeout,
            }),
        );
    }

    fn on_task_deadline(&mut self, id: TaskId) {
        let Some(flight) = self.in_flight.remove(&id) else {
            // Task resolved before its deadline; stale tick.
            return;
        };
        // Give up waiting for the result. The worker is not stopped: it is
        // marked idle immediately, and its late reply for this id will be
        // dropped as stale.
        self.release_unit(flight.unit, id);
        self.failed += 1;
        self.publish(
            Event::now(EventKind::TaskTimedOut)
                .with_task(id)
                .with_unit(flight.unit)
                .with_timeout(self.cfg.task_timeout),
        );
        let _ = flight.respond.send(Err(TaskError::Timeout {
            timeout: self.cfg.task_timeout,
        }));
        self.drain_queue();
    }

    /// Spawns a timer that delivers `tick` after `after`, unless the pool is
    /// terminated first.
    fn arm_deadline(&self, tick: Tick, after: Duration) {
        let tx = self.tick_tx.clone();
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep(after) => {
                    let _ = tx.send(tick).await;
                }
            }
        });
    }

    // ---------------------------
    // Status & teardown
    // ---------------------------

    fn snapshot(&self) -> PoolStatus {
        PoolStatus {
            max_units: self.cfg.max_units,
            active_units: self.slots.len(),
            busy_units: self.slots.iter().filter(|s| s.is_busy()).count(),
            queued_tasks: self.queue.len(),
            completed_tasks: self.completed,
            failed_tasks: self.failed,
        }
    }

    /// Destroys all workers and rejects everything still pending.
    ///
    /// Idempotent. The actor itself keeps running so late `status()` calls
    /// observe zeroed gauges; it exits once every handle is dropped.
    fn shutdown(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.token.cancel();

        for (_, spawning) in self.spawning.drain() {
            spawning.join.abort();
        }
        for slot in self.slots.drain(..) {
            slot.join.abort();
        }
        if let Some(wait) = self.init_wait.take() {
            let _ = wait.respond.send(Err(PoolError::Closed));
        }
        for (_, flight) in self.in_flight.drain() {
            self.failed += 1;
            let _ = flight.respond.send(Err(TaskError::Terminated));
        }
        for task in self.queue.drain() {
            self.failed += 1;
            let _ = task.respond.send(Err(TaskError::Terminated));
        }
        self.publish(Event::now(EventKind::PoolTerminated));
    }

    fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_pool(Arc::clone(&self.name)));
    }
}
