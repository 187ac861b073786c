use std::collections::{HashSet, VecDeque};

/// A path waiting to be fetched, tagged with how many wordlist hops it is
/// from the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub path: String,
    pub depth: usize,
}

impl FrontierEntry {
    pub fn new(path: impl Into<String>, depth: usize) -> Self {
        Self {
            path: path.into(),
            depth,
        }
    }

    /// The scan root: the base URL itself.
    pub fn root() -> Self {
        Self::new("", 0)
    }

    /// Child path for a wordlist entry appended under this entry.
    pub fn child(&self, word: &str) -> Self {
        let base = self.path.trim_end_matches('/');
        let path = if base.is_empty() {
            word.to_string()
        } else {
            format!("{}/{}", base, word)
        };
        Self::new(path, self.depth + 1)
    }
}

/// FIFO work queue deduplicated by path.
///
/// Paths are marked visited when they are dequeued, not when they are
/// pushed, so duplicate pushes are harmless and the first-seen depth wins.
/// The frontier has a single owner (the scheduler) and is never shared
/// across tasks.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    max_depth: usize,
}

impl Frontier {
    pub fn new(max_depth: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            max_depth,
        }
    }

    /// Queue an entry. No-op if its path was already dequeued.
    pub fn push(&mut self, entry: FrontierEntry) {
        if self.visited.contains(&entry.path) {
            return;
        }
        self.queue.push_back(entry);
    }

    /// Dequeue up to `n` unvisited entries in FIFO order, marking each one
    /// visited. Entries deeper than `max_depth` are marked visited and
    /// dropped without being returned.
    pub fn pop_batch(&mut self, n: usize) -> Vec<FrontierEntry> {
        let mut batch = Vec::with_capacity(n.min(self.queue.len()));
        while batch.len() < n {
            let Some(entry) = self.queue.pop_front() else {
                break;
            };
            if !self.visited.insert(entry.path.clone()) {
                continue;
            }
            if entry.depth > self.max_depth {
                continue;
            }
            batch.push(entry);
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_visited(&self, path: &str) -> bool {
        self.visited.contains(path)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
