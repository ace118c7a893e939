use std::cell::Cell;
use std::rc::Rc;

/// Hands out tokens for payment generation attempts. Only the most recent
/// token is current; work started under an older one must drop its results.
#[derive(Clone, Debug, Default)]
pub struct AttemptTracker {
    latest: Rc<Cell<u64>>,
}

#[derive(Clone, Debug)]
pub struct Attempt {
    id: u64,
    latest: Rc<Cell<u64>>,
}

impl AttemptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Attempt {
        let id = self.latest.get() + 1;
        self.latest.set(id);
        Attempt { id, latest: self.latest.clone() }
    }

    /// Makes every outstanding attempt stale, e.g. when the modal closes.
    pub fn invalidate(&self) {
        self.latest.set(self.latest.get() + 1);
    }
}

impl Attempt {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.latest.get() == self.id
    }
}

impl PartialEq for AttemptTracker {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.latest, &other.latest)
    }
}
