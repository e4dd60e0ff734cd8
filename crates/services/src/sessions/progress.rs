use serde::Serialize;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    /// 1-based position of the current card, 0 when the set is empty.
    pub position: usize,
    pub known: usize,
    pub is_last: bool,
}

impl SessionProgress {
    /// `position / total`, or 0 for an empty set.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.position as f32 / self.total as f32;
        fraction
    }
}
