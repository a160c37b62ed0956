//! Confirmation window: fixed-capacity FIFO of the last K per-frame
//! detection booleans. A detection is confirmed only when the window is
//! full and every entry is positive, so one noisy frame cannot trigger
//! the alarm machine on its own.

use std::collections::VecDeque;

pub struct ConfirmationWindow {
    entries: VecDeque<bool>,
    capacity: usize,
}

impl ConfirmationWindow {
    /// `capacity` is the consecutive-frame threshold K (must be >= 1;
    /// config sanitization enforces this upstream).
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record one per-frame detection, dropping the oldest entry when full.
    pub fn push(&mut self, detected: bool) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(detected);
    }

    /// True iff the window holds K entries and all of them are positive.
    /// False during the startup grace period (fewer than K entries seen).
    pub fn is_confirmed(&self) -> bool {
        self.entries.len() == self.capacity && self.entries.iter().all(|&d| d)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_confirmed_until_k_consecutive_positives() {
        let mut window = ConfirmationWindow::new(3);
        assert!(!window.is_confirmed());
        window.push(true);
        assert!(!window.is_confirmed());
        window.push(true);
        assert!(!window.is_confirmed());
        window.push(true);
        assert!(window.is_confirmed());
    }

    #[test]
    fn single_negative_resets_the_run() {
        let mut window = ConfirmationWindow::new(3);
        window.push(true);
        window.push(true);
        window.push(false);
        assert!(!window.is_confirmed());
        // Needs K fresh positives after the gap.
        window.push(true);
        window.push(true);
        assert!(!window.is_confirmed());
        window.push(true);
        assert!(window.is_confirmed());
    }

    #[test]
    fn capacity_one_confirms_immediately() {
        let mut window = ConfirmationWindow::new(1);
        window.push(true);
        assert!(window.is_confirmed());
        window.push(false);
        assert!(!window.is_confirmed());
    }

    #[test]
    fn clear_restores_startup_grace() {
        let mut window = ConfirmationWindow::new(2);
        window.push(true);
        window.push(true);
        assert!(window.is_confirmed());
        window.clear();
        assert!(window.is_empty());
        assert!(!window.is_confirmed());
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut window = ConfirmationWindow::new(2);
        for _ in 0..10 {
            window.push(true);
            assert!(window.len() <= 2);
        }
    }
}
