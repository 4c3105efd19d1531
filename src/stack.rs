//! Per-node history of sampled walk steps.

/// Ordered record of the steps one node has drawn in one forest.
///
/// `Some(v)` is a step to neighbor `v`, `None` is absorption. Only `column[..top]` is valid
/// history; entries past `top` are stale and get overwritten by later pushes, so repairs can
/// rewind a node without freeing memory.
///
/// Invariant: `None` can only be the last valid entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStack {
    column: Vec<Option<usize>>,
    top: usize,
}

impl WalkStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Allocated length, including stale entries.
    pub fn capacity(&self) -> usize {
        self.column.len()
    }

    pub fn valid(&self) -> &[Option<usize>] {
        &self.column[..self.top]
    }

    /// Entry `index` of the valid history. Panics past `top`.
    pub fn get(&self, index: usize) -> Option<usize> {
        assert!(
            index < self.top,
            "walk stack index {index} out of range (top={})",
            self.top
        );
        self.column[index]
    }

    pub fn push(&mut self, step: Option<usize>) {
        if self.top == self.column.len() {
            self.column.push(step);
        } else {
            self.column[self.top] = step;
        }
        self.top += 1;
    }

    /// Rewrite a valid entry. Panics past `top`.
    pub fn overwrite(&mut self, index: usize, step: Option<usize>) {
        assert!(
            index < self.top,
            "walk stack overwrite at {index} out of range (top={})",
            self.top
        );
        self.column[index] = step;
    }

    /// Move the valid cursor back to `top`. Entries past it become stale.
    ///
    /// Panics if `top` exceeds the allocated length.
    pub fn truncate(&mut self, top: usize) {
        assert!(
            top <= self.column.len(),
            "walk stack truncate to {top} beyond capacity {}",
            self.column.len()
        );
        self.top = top;
    }

    /// First valid position holding `step`.
    pub fn position(&self, step: Option<usize>) -> Option<usize> {
        self.valid().iter().position(|&s| s == step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_reuses_stale_slots() {
        let mut s = WalkStack::new();
        s.push(Some(3));
        s.push(Some(1));
        s.push(None);
        assert_eq!(s.valid(), &[Some(3), Some(1), None]);

        s.truncate(1);
        assert_eq!(s.valid(), &[Some(3)]);
        assert_eq!(s.capacity(), 3);

        s.push(Some(7));
        assert_eq!(s.valid(), &[Some(3), Some(7)]);
        assert_eq!(s.capacity(), 3);
        assert_eq!(s.position(Some(7)), Some(1));
        assert_eq!(s.position(None), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn get_past_top_panics() {
        let mut s = WalkStack::new();
        s.push(Some(0));
        s.truncate(0);
        let _ = s.get(0);
    }

    #[test]
    #[should_panic(expected = "beyond capacity")]
    fn truncate_past_capacity_panics() {
        let mut s = WalkStack::new();
        s.truncate(1);
    }
}
