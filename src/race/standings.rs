use crate::sim::{Elimination, MarbleStatus};

/// Finish order and drop-outs, in the order they happened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Standings {
    finishers: Vec<(u32, f32)>,
    eliminated: Vec<(u32, Elimination)>,
}

impl Standings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a terminal status. Racing and repeated ids are ignored.
    pub fn record(&mut self, id: u32, status: MarbleStatus) {
        if self.contains(id) {
            return;
        }
        match status {
            MarbleStatus::Finished { time } => self.finishers.push((id, time)),
            MarbleStatus::Eliminated(reason) => self.eliminated.push((id, reason)),
            MarbleStatus::Racing => {}
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.finishers.iter().any(|&(f, _)| f == id) || self.eliminated.iter().any(|&(e, _)| e == id)
    }

    /// Marble ids in finishing order.
    pub fn finish_order(&self) -> impl Iterator<Item = u32> + '_ {
        self.finishers.iter().map(|&(id, _)| id)
    }

    /// (id, race time) per finisher, in finishing order.
    pub fn finishers(&self) -> &[(u32, f32)] {
        &self.finishers
    }

    pub fn eliminated(&self) -> &[(u32, Elimination)] {
        &self.eliminated
    }

    /// 1-based finishing place.
    pub fn place_of(&self, id: u32) -> Option<usize> {
        self.finishers.iter().position(|&(f, _)| f == id).map(|i| i + 1)
    }

    pub fn time_of(&self, id: u32) -> Option<f32> {
        self.finishers.iter().find(|&&(f, _)| f == id).map(|&(_, t)| t)
    }

    pub fn finished_count(&self) -> usize {
        self.finishers.len()
    }

    pub fn eliminated_count(&self) -> usize {
        self.eliminated.len()
    }

    pub fn clear(&mut self) {
        self.finishers.clear();
        self.eliminated.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finishers_are_ranked_by_arrival() {
        let mut standings = Standings::new();
        standings.record(3, MarbleStatus::Finished { time: 10.0 });
        standings.record(1, MarbleStatus::Eliminated(Elimination::Fell));
        standings.record(0, MarbleStatus::Finished { time: 11.5 });

        assert_eq!(standings.finish_order().collect::<Vec<_>>(), vec![3, 0]);
        assert_eq!(standings.place_of(0), Some(2));
        assert_eq!(standings.time_of(3), Some(10.0));
        assert_eq!(standings.eliminated(), &[(1, Elimination::Fell)]);
    }

    #[test]
    fn duplicate_and_racing_records_are_ignored() {
        let mut standings = Standings::new();
        standings.record(2, MarbleStatus::Racing);
        standings.record(2, MarbleStatus::Finished { time: 1.0 });
        standings.record(2, MarbleStatus::Finished { time: 2.0 });
        assert_eq!(standings.finished_count(), 1);
        assert_eq!(standings.time_of(2), Some(1.0));
    }

    #[test]
    fn clear_empties_everything() {
        let mut standings = Standings::new();
        standings.record(0, MarbleStatus::Eliminated(Elimination::Stalled));
        standings.clear();
        assert_eq!(standings, Standings::new());
    }
}
