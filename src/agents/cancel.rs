use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// shared flag polled by long-running work at its iteration boundaries
///
/// cancelling never interrupts anything; it only makes the next check fail
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn fresh_tokens_are_independent() {
        let first = CancelToken::new();
        first.cancel();
        assert!(!CancelToken::new().is_cancelled());
    }
}
