use hashbrown::HashSet;

/// Ordered, duplicate-rejecting set of destroyed-unit identifiers.
///
/// Identifiers are removed as they are matched during reconciliation, so each
/// claim can be credited at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadUnitSet {
    order: Vec<i64>,
    members: HashSet<i64>,
}

impl DeadUnitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an identifier. Returns false and leaves the set untouched on duplicates.
    pub fn insert(&mut self, id: i64) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    pub fn contains(&self, id: i64) -> bool {
        self.members.contains(&id)
    }

    /// Consume an identifier. Returns true if it was present.
    pub fn take(&mut self, id: i64) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|&x| x == id) {
            self.order.remove(pos);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Identifiers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.order.iter().copied()
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.order
    }
}

impl FromIterator<i64> for DeadUnitSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut set = DeadUnitSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}
