//! Deterministic discrete-event scheduler.
//!
//! Events are kept in a `BinaryHeap` with a reversed ordering on `(time, id)`, which
//! turns it into a min-heap. Event ids are strictly increasing, so events scheduled at
//! the same logical time are executed in submission order.
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::ops::ControlFlow;

use crate::neuron::NeuronId;
use crate::synapse::SynapseId;

/// A strictly increasing event identifier, used to break ties between events scheduled at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
    /// Returns the raw value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

/// The deferred operation carried by an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A neuron fires at the event time (self-initiated activity).
    Fire { neuron: NeuronId },
    /// A synapse delivers a spike emitted at `fired_at`.
    /// The delivery happens at the event time, but the synapse fires with the emission time.
    Deliver { synapse: SynapseId, fired_at: f64 },
    /// The activity reporter samples the fire counts.
    Report,
    /// The simulation must stop after this event.
    Stop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Action::Fire { neuron } => write!(f, "Fire({})", neuron),
            Action::Deliver { synapse, fired_at } => {
                write!(f, "Deliver({}, fired at {})", synapse, fired_at)
            }
            Action::Report => write!(f, "Report"),
            Action::Stop => write!(f, "Stop"),
        }
    }
}

/// A scheduled action.
#[derive(Debug, Clone)]
pub struct Event {
    /// The submission order of the event.
    pub id: EventId,
    /// The logical time at which the event is executed.
    pub time: f64,
    /// The operation to execute.
    pub action: Action,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

/// Ordering: smallest `(time, id)` first.
/// The natural ordering is reversed since `BinaryHeap` is a max-heap.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Something able to execute the events popped by the scheduler.
/// Returning `ControlFlow::Break` requests the drain loop to stop.
pub trait EventHandler {
    fn handle(&mut self, scheduler: &mut Scheduler, event: Event) -> ControlFlow<()>;
}

impl<F> EventHandler for F
where
    F: FnMut(&mut Scheduler, Event) -> ControlFlow<()>,
{
    fn handle(&mut self, scheduler: &mut Scheduler, event: Event) -> ControlFlow<()> {
        (self)(scheduler, event)
    }
}

/// Why a drain loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The queue is empty.
    Idle,
    /// An executed event requested a stop.
    Stopped,
    /// The next pending event lies beyond the horizon.
    HorizonReached,
}

/// The time-ordered queue of pending events.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Event>,
    next_id: u64,
    now: f64,
    processed: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    /// Submit a new event at the given logical time.
    /// An event submitted before the current time, or at no time at all (NaN), is executed at the
    /// current time, so that execution never goes back in time.
    pub fn submit(&mut self, time: f64, action: Action) -> EventId {
        let time = if !(time >= self.now) {
            log::debug!("{} submitted at {} before {}, clamped", action, time, self.now);
            self.now
        } else {
            time
        };
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.queue.push(Event { id, time, action });
        id
    }

    /// Pop the next event (earliest time, lowest id).
    pub fn pop_next(&mut self) -> Option<Event> {
        self.queue.pop()
    }

    /// Peek at the next event without removing it.
    pub fn peek_next(&self) -> Option<&Event> {
        self.queue.peek()
    }

    /// Returns true if no event is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns the time of the last executed event.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Returns the total number of executed events.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Execute the next event, if any.
    pub fn step<H: EventHandler + ?Sized>(&mut self, handler: &mut H) -> Option<ControlFlow<()>> {
        let event = self.pop_next()?;
        log::trace!("{} at {}: {}", event.id, event.time, event.action);
        self.now = event.time;
        self.processed += 1;
        Some(handler.handle(self, event))
    }

    /// Execute events until the queue is empty or the handler requests a stop.
    pub fn run_until_idle<H: EventHandler + ?Sized>(&mut self, handler: &mut H) -> RunOutcome {
        self.run_until(f64::INFINITY, handler)
    }

    /// Execute events until the queue is empty, the handler requests a stop, or the next event lies beyond `horizon`.
    /// Events beyond the horizon stay queued.
    pub fn run_until<H: EventHandler + ?Sized>(
        &mut self,
        horizon: f64,
        handler: &mut H,
    ) -> RunOutcome {
        loop {
            match self.peek_next() {
                None => return RunOutcome::Idle,
                Some(event) if event.time > horizon => return RunOutcome::HorizonReached,
                Some(_) => {}
            }
            if let Some(ControlFlow::Break(())) = self.step(handler) {
                return RunOutcome::Stopped;
            }
        }
    }

    /// Drain all events in execution order without executing them.
    pub fn drain_ordered(&mut self) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(event) = self.queue.pop() {
            events.push(event);
        }
        events
    }
}
