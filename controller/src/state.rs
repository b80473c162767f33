//! Arm/disarm state and the single timer slot.

use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Unarmed,
    Armed,
}

/// The one authoritative timer handle.
///
/// `generation` increases on every arm and disarm. A timer task only acts
/// while the slot is armed with its own generation, so a tick that was
/// already due when the timer got replaced or cancelled does nothing.
#[derive(Debug, Default)]
pub(crate) struct TimerSlot {
    pub(crate) state: LoopState,
    pub(crate) generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    /// Cancels the running timer (if any) and returns the generation the
    /// next timer must carry.
    pub(crate) fn begin_arm(&mut self) -> u64 {
        self.cancel();
        self.generation += 1;
        self.generation
    }

    pub(crate) fn install(&mut self, handle: JoinHandle<()>) {
        debug_assert!(self.handle.is_none(), "timer installed over a live timer");
        self.handle = Some(handle);
        self.state = LoopState::Armed;
    }

    /// Returns true if a timer was running.
    pub(crate) fn disarm(&mut self) -> bool {
        let had_timer = self.cancel();
        self.generation += 1;
        self.state = LoopState::Unarmed;
        had_timer
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.state == LoopState::Armed && self.generation == generation
    }

    pub(crate) fn has_timer(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn arm_replaces_generation_and_disarm_invalidates_it() {
        let mut slot = TimerSlot::default();
        assert_eq!(slot.state, LoopState::Unarmed);

        let g1 = slot.begin_arm();
        slot.install(tokio::spawn(std::future::pending()));
        assert!(slot.is_current(g1));

        let g2 = slot.begin_arm();
        slot.install(tokio::spawn(std::future::pending()));
        assert!(!slot.is_current(g1));
        assert!(slot.is_current(g2));

        assert!(slot.disarm());
        assert!(!slot.is_current(g2));
        assert_eq!(slot.state, LoopState::Unarmed);
    }

    #[test]
    fn disarm_when_unarmed_is_harmless() {
        let mut slot = TimerSlot::default();
        assert!(!slot.disarm());
        assert!(!slot.disarm());
        assert!(!slot.has_timer());
        assert_eq!(slot.state, LoopState::Unarmed);
    }
}
