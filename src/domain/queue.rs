use crate::app::FeedreaderError;

/// Progress of one queue entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EntryState {
    #[default]
    Pending,
    UrlParsed,
    Loaded,
    ResponseParsed,
    Succeeded,
    /// Handed over to a new entry spliced right after this one.
    Redirected,
    Failed(FeedreaderError),
}

impl EntryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EntryState::Succeeded | EntryState::Redirected | EntryState::Failed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub url: String,
    pub redirect_depth: u32,
    pub state: EntryState,
}

impl QueueEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            redirect_depth: 0,
            state: EntryState::Pending,
        }
    }

    pub fn redirect(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            redirect_depth: depth,
            state: EntryState::Pending,
        }
    }
}

/// Ordered list of sources; redirect targets are inserted directly after
/// the entry that produced them so they are visited next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlQueue {
    entries: Vec<QueueEntry>,
}

impl UrlQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(url: impl Into<String>) -> Self {
        let mut queue = Self::new();
        queue.push(QueueEntry::new(url));
        queue
    }

    pub fn push(&mut self, entry: QueueEntry) {
        self.entries.push(entry);
    }

    pub fn insert_after(&mut self, index: usize, entry: QueueEntry) {
        let at = (index + 1).min(self.entries.len());
        self.entries.insert(at, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut QueueEntry> {
        self.entries.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// The first failure in list order, if any entry failed.
    pub fn first_failure(&self) -> Option<&FeedreaderError> {
        self.entries.iter().find_map(|entry| match &entry.state {
            EntryState::Failed(err) => Some(err),
            _ => None,
        })
    }

    /// Exit code of the whole run: that of the first failure, else 0.
    pub fn exit_code(&self) -> u8 {
        self.first_failure().map_or(0, FeedreaderError::exit_code)
    }

    /// Build a queue from feed file content: one URL per line, surrounding
    /// whitespace trimmed, blank lines and `#` comments skipped.
    pub fn from_feedfile(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(QueueEntry::new)
            .collect();
        Self { entries }
    }
}
