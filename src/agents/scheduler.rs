use crate::agents::agent::Ticket;
use log::trace;
use std::{cmp::Ordering, collections::BinaryHeap, time::Duration};

/// deferred work, each bound to the ticket it was submitted under
#[derive(Clone, Debug)]
pub enum Job {
    /// run the task of an agent on the next turn
    Run(Ticket),
    /// resume a yielded field interpolation
    Sweep(Ticket),
    /// draw the next animation frame
    Frame(Ticket),
}

impl Job {
    pub fn ticket(&self) -> &Ticket {
        match self {
            Job::Run(ticket) | Job::Sweep(ticket) | Job::Frame(ticket) => ticket,
        }
    }
}

#[derive(Debug)]
struct Entry {
    due: Duration,
    order: u64,
    job: Job,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.order == other.order
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// earliest due first, then insertion order
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// single-threaded timer queue on the session clock
#[derive(Debug, Default)]
pub struct Scheduler {
    next_order: u64,
    queue: BinaryHeap<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, job: Job) {
        trace!("scheduling {:?} at {}ms", job, due.as_millis());
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        self.queue.push(Entry { due, order, job });
    }

    pub fn after(&mut self, now: Duration, millis: u64, job: Job) {
        self.schedule(now + Duration::from_millis(millis), job);
    }

    /// the next job whose time has come
    ///
    /// cancelled jobs are still handed out, so their owners can clean up
    pub fn pop_due(&mut self, now: Duration) -> Option<Job> {
        if self.queue.peek()?.due <= now {
            self.queue.pop().map(|entry| entry.job)
        } else {
            None
        }
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|entry| entry.due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::agents::{agent::Agent, graph::Stage};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn runs_in_due_then_insertion_order() {
        let mut field = Agent::<()>::new(Stage::Field);
        let mut overlay = Agent::<()>::new(Stage::Overlay);
        let mut mesh = Agent::<()>::new(Stage::Mesh);
        let mut scheduler = Scheduler::new();
        scheduler.after(ms(0), 40, Job::Frame(field.submit()));
        scheduler.after(ms(0), 0, Job::Run(overlay.submit()));
        scheduler.after(ms(0), 40, Job::Run(mesh.submit()));
        assert!(matches!(scheduler.pop_due(ms(0)), Some(Job::Run(_))));
        assert!(scheduler.pop_due(ms(39)).is_none());
        assert!(matches!(scheduler.pop_due(ms(40)), Some(Job::Frame(_))));
        assert!(matches!(scheduler.pop_due(ms(40)), Some(Job::Run(_))));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelled_jobs_are_handed_out() {
        let mut agent = Agent::<()>::new(Stage::Field);
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(0), Job::Sweep(agent.submit()));
        agent.cancel();
        let job = scheduler.pop_due(ms(10)).expect("due job");
        assert!(job.ticket().is_cancelled());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn next_due_peeks() {
        let mut agent = Agent::<()>::new(Stage::Animator);
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.next_due(), None);
        scheduler.after(ms(100), 25, Job::Frame(agent.submit()));
        assert_eq!(scheduler.next_due(), Some(ms(125)));
    }
}
