//! Recording display sink for asserting on pushed frames.

use metarmap_core::{Color, DisplaySink, Result};

/// A [`DisplaySink`] that records every staged color and snapshots the
/// full slot array at each commit.
#[derive(Debug)]
pub struct MockDisplay {
    slots: Vec<Color>,
    frames: Vec<Vec<Color>>,
    commits: usize,
}

impl MockDisplay {
    /// Create a display with `len` slots, all off.
    pub fn new(len: usize) -> Self {
        MockDisplay {
            slots: vec![Color::OFF; len],
            frames: Vec::new(),
            commits: 0,
        }
    }

    /// The currently staged color of one slot.
    pub fn slot(&self, index: usize) -> Color {
        self.slots[index]
    }

    /// Snapshots of the slot array taken at each commit, in order.
    pub fn frames(&self) -> &[Vec<Color>] {
        &self.frames
    }

    /// Number of `commit()` calls so far.
    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl DisplaySink for MockDisplay {
    fn set(&mut self, slot: usize, color: Color) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = color;
        }
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        self.frames.push(self.slots.clone());
        Ok(())
    }
}
