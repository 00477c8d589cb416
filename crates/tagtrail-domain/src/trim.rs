/// Strategy for bounding a tag's history log.
///
/// Cap enforcement is advisory housekeeping: the approximate variant lets the
/// store defer eviction so appends stay O(1), at the cost of the retained
/// length briefly exceeding the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimStrategy {
    /// Trim lazily; the retained length may slightly exceed the cap.
    Approximate(usize),
    /// Trim to exactly the cap on every pass.
    Exact(usize),
}

impl TrimStrategy {
    pub fn max_len(&self) -> usize {
        match self {
            TrimStrategy::Approximate(n) | TrimStrategy::Exact(n) => *n,
        }
    }
}
