use crate::{
    agents::{cancel::CancelToken, graph::Stage},
    error::Error,
};
use log::{trace, warn};

/// handle on one submitted task
#[derive(Clone, Debug)]
pub struct Ticket {
    pub stage: Stage,
    generation: u64,
    token: CancelToken,
}

impl Ticket {
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// holder of at most one in-flight task and the last value a task resolved with
///
/// a later submit always supersedes an earlier one, so a stale ticket can
/// never store its value or report its failure
#[derive(Debug)]
pub struct Agent<T> {
    pub stage: Stage,
    value: Option<T>,
    current: Option<Ticket>,
    generation: u64,
    in_flight: bool,
}

impl<T> Agent<T> {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            value: None,
            current: None,
            generation: 0,
            in_flight: false,
        }
    }

    /// cancel whatever is in flight and hand out a fresh ticket
    pub fn submit(&mut self) -> Ticket {
        self.cancel();
        self.generation += 1;
        let ticket = Ticket {
            stage: self.stage,
            generation: self.generation,
            token: CancelToken::new(),
        };
        trace!("{:?} submitted task {}", self.stage, self.generation);
        self.current = Some(ticket.clone());
        self.in_flight = true;
        ticket
    }

    /// mark the in-flight task without waiting for it
    pub fn cancel(&mut self) {
        if let Some(ticket) = &self.current {
            ticket.token.cancel();
        }
    }

    /// whether no later task has been submitted, cancelled or not
    pub fn is_latest(&self, ticket: &Ticket) -> bool {
        self.current
            .as_ref()
            .map_or(false, |current| current.generation == ticket.generation)
    }

    /// a ticket is current if it is the latest submitted and nobody cancelled it
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.is_latest(ticket) && !ticket.is_cancelled()
    }

    /// store the value of a current ticket, reporting whether it was stored
    pub fn accept(&mut self, ticket: &Ticket, value: T) -> bool {
        if self.is_current(ticket) {
            trace!("{:?} updated by task {}", self.stage, ticket.generation);
            self.value = Some(value);
            self.in_flight = false;
            true
        } else {
            trace!("{:?} dropped stale task {}", self.stage, ticket.generation);
            false
        }
    }

    /// hand back the error of a current ticket, swallowing stale ones
    pub fn reject(&mut self, ticket: &Ticket, error: Error) -> Option<Error> {
        if self.is_current(ticket) {
            warn!("{:?} rejected: {}", self.stage, error);
            self.in_flight = false;
            Some(error)
        } else {
            None
        }
    }

    /// finish a current ticket that had nothing to compute
    pub fn settle(&mut self, ticket: &Ticket) {
        if self.is_current(ticket) {
            self.in_flight = false;
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    /// the token of the latest submission, cancelled once superseded
    pub fn token(&self) -> Option<&CancelToken> {
        self.current.as_ref().map(|ticket| &ticket.token)
    }

    /// whether the latest submission is still waiting to resolve or running
    pub fn is_requested(&self) -> bool {
        self.in_flight
            && self
                .current
                .as_ref()
                .map_or(false, |ticket| !ticket.is_cancelled())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn submit_cancels_previous() {
        let mut agent = Agent::<u32>::new(Stage::Field);
        let first = agent.submit();
        let second = agent.submit();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!agent.accept(&first, 1));
        assert!(agent.accept(&second, 2));
        assert_eq!(agent.value(), Some(&2));
    }

    #[test]
    fn cancelled_ticket_cannot_store() {
        let mut agent = Agent::<u32>::new(Stage::Grid);
        let ticket = agent.submit();
        agent.cancel();
        assert!(!agent.accept(&ticket, 7));
        assert_eq!(agent.value(), None);
    }

    #[test]
    fn stale_rejections_are_swallowed() {
        let mut agent = Agent::<u32>::new(Stage::Field);
        let stale = agent.submit();
        let current = agent.submit();
        assert!(agent.reject(&stale, Error::Released).is_none());
        assert!(matches!(
            agent.reject(&current, Error::Released),
            Some(Error::Released)
        ));
    }

    #[test]
    fn value_survives_later_submit() {
        let mut agent = Agent::<u32>::new(Stage::Globe);
        let ticket = agent.submit();
        assert!(agent.is_requested());
        agent.accept(&ticket, 3);
        assert!(!agent.is_requested());
        let _ = agent.submit();
        assert_eq!(agent.value(), Some(&3));
        assert!(agent.is_requested());
    }

    #[test]
    fn settled_and_cancelled_tickets_are_not_requested() {
        let mut agent = Agent::<u32>::new(Stage::Renderer);
        let ticket = agent.submit();
        agent.settle(&ticket);
        assert!(!agent.is_requested());
        let ticket = agent.submit();
        agent.cancel();
        assert!(!agent.is_requested());
        assert!(agent.is_latest(&ticket));
        assert!(!agent.is_current(&ticket));
    }
}
