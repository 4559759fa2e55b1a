//! Cursor state shared by the encode- and decode-side sessions.
//!
//! Both directions run the same machine: an arena of per-point states, the
//! point-id cursor, the two timestamp slots with their active flag, and the
//! four most recently observed time deltas. Every mutation here must happen
//! in the same order on both sides or the adaptive coders desynchronize.

use std::collections::HashMap;

use crate::codes::CodeWord;
use crate::point::PointState;

pub(crate) struct SessionState {
    /// Arena of point states; slot 0 is the synthetic initial cursor.
    points: Vec<PointState>,
    /// pointID → arena index. States live for the whole session.
    index: HashMap<u32, usize>,
    /// Arena index of the most recently coded point.
    pub(crate) last_point: usize,
    /// The last pointID coded; XOR base for explicit id changes.
    pub(crate) prev_point_id: u32,

    prev_timestamp1: i64,
    prev_timestamp2: i64,
    timestamp1_active: bool,
    prev_time_delta1: i64,
    prev_time_delta2: i64,
    prev_time_delta3: i64,
    prev_time_delta4: i64,
}

/// Cursor snapshot taken at record entry, restored on `BufferFull`.
pub(crate) struct SessionMark {
    last_point: usize,
    prev_point_id: u32,
    prev_timestamp1: i64,
    prev_timestamp2: i64,
    timestamp1_active: bool,
    deltas: [i64; 4],
    /// The two point states a record can mutate: the cursor's and the
    /// record's own. Identical indices are stored twice; restoring twice
    /// is harmless.
    saved: [(usize, PointState); 2],
}

impl SessionState {
    pub(crate) fn new() -> Self {
        SessionState {
            points: vec![PointState::new(0)],
            index: HashMap::new(),
            last_point: 0,
            prev_point_id: 0,
            prev_timestamp1: 0,
            prev_timestamp2: 0,
            timestamp1_active: true,
            prev_time_delta1: i64::MAX,
            prev_time_delta2: i64::MAX,
            prev_time_delta3: i64::MAX,
            prev_time_delta4: i64::MAX,
        }
    }

    /// Arena index for `id`, creating the state on first sight. A fresh
    /// state predicts `id + 1` as its successor.
    pub(crate) fn intern(&mut self, id: u32) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.points.len();
        self.points.push(PointState::new(id.wrapping_add(1)));
        self.index.insert(id, idx);
        idx
    }

    #[inline]
    pub(crate) fn point(&self, idx: usize) -> &PointState {
        &self.points[idx]
    }

    #[inline]
    pub(crate) fn point_mut(&mut self, idx: usize) -> &mut PointState {
        &mut self.points[idx]
    }

    #[inline]
    pub(crate) fn active_timestamp(&self) -> i64 {
        if self.timestamp1_active {
            self.prev_timestamp1
        } else {
            self.prev_timestamp2
        }
    }

    #[inline]
    pub(crate) fn inactive_timestamp(&self) -> i64 {
        if self.timestamp1_active {
            self.prev_timestamp2
        } else {
            self.prev_timestamp1
        }
    }

    pub(crate) fn switch_timestamp_slot(&mut self) {
        self.timestamp1_active = !self.timestamp1_active;
    }

    pub(crate) fn set_active_timestamp(&mut self, timestamp: i64) {
        if self.timestamp1_active {
            self.prev_timestamp1 = timestamp;
        } else {
            self.prev_timestamp2 = timestamp;
        }
    }

    /// Matches a signed delta against the four stored deltas, forward then
    /// reverse, lowest rank first.
    pub(crate) fn time_delta_code(&self, d: i64) -> Option<CodeWord> {
        if d == self.prev_time_delta1 {
            Some(CodeWord::TimeDelta1Forward)
        } else if d == self.prev_time_delta2 {
            Some(CodeWord::TimeDelta2Forward)
        } else if d == self.prev_time_delta3 {
            Some(CodeWord::TimeDelta3Forward)
        } else if d == self.prev_time_delta4 {
            Some(CodeWord::TimeDelta4Forward)
        } else if d == self.prev_time_delta1.wrapping_neg() {
            Some(CodeWord::TimeDelta1Reverse)
        } else if d == self.prev_time_delta2.wrapping_neg() {
            Some(CodeWord::TimeDelta2Reverse)
        } else if d == self.prev_time_delta3.wrapping_neg() {
            Some(CodeWord::TimeDelta3Reverse)
        } else if d == self.prev_time_delta4.wrapping_neg() {
            Some(CodeWord::TimeDelta4Reverse)
        } else {
            None
        }
    }

    /// The signed delta a forward/reverse codeword stands for.
    pub(crate) fn delta_for(&self, code: CodeWord) -> i64 {
        match code {
            CodeWord::TimeDelta1Forward => self.prev_time_delta1,
            CodeWord::TimeDelta2Forward => self.prev_time_delta2,
            CodeWord::TimeDelta3Forward => self.prev_time_delta3,
            CodeWord::TimeDelta4Forward => self.prev_time_delta4,
            CodeWord::TimeDelta1Reverse => self.prev_time_delta1.wrapping_neg(),
            CodeWord::TimeDelta2Reverse => self.prev_time_delta2.wrapping_neg(),
            CodeWord::TimeDelta3Reverse => self.prev_time_delta3.wrapping_neg(),
            CodeWord::TimeDelta4Reverse => self.prev_time_delta4.wrapping_neg(),
            _ => 0,
        }
    }

    /// Insert-sorts `|timestamp - base|` into the delta slots, keeping them
    /// ascending. Zero is excluded so equality never displaces a delta.
    pub(crate) fn observe_time_delta(&mut self, timestamp: i64, base: i64) {
        let md = timestamp.wrapping_sub(base).wrapping_abs();
        if md > 0 && md < self.prev_time_delta4 {
            if md < self.prev_time_delta1 {
                self.prev_time_delta4 = self.prev_time_delta3;
                self.prev_time_delta3 = self.prev_time_delta2;
                self.prev_time_delta2 = self.prev_time_delta1;
                self.prev_time_delta1 = md;
            } else if md < self.prev_time_delta2 {
                self.prev_time_delta4 = self.prev_time_delta3;
                self.prev_time_delta3 = self.prev_time_delta2;
                self.prev_time_delta2 = md;
            } else if md < self.prev_time_delta3 {
                self.prev_time_delta4 = self.prev_time_delta3;
                self.prev_time_delta3 = md;
            } else {
                self.prev_time_delta4 = md;
            }
        }
    }

    /// Snapshots every cursor a record can touch: the scalar cursors plus
    /// full copies of the cursor point and the record's point.
    pub(crate) fn mark(&self, record_point: usize) -> SessionMark {
        let saved = [
            (self.last_point, self.points[self.last_point].clone()),
            (record_point, self.points[record_point].clone()),
        ];
        SessionMark {
            last_point: self.last_point,
            prev_point_id: self.prev_point_id,
            prev_timestamp1: self.prev_timestamp1,
            prev_timestamp2: self.prev_timestamp2,
            timestamp1_active: self.timestamp1_active,
            deltas: [
                self.prev_time_delta1,
                self.prev_time_delta2,
                self.prev_time_delta3,
                self.prev_time_delta4,
            ],
            saved,
        }
    }

    pub(crate) fn restore(&mut self, mark: SessionMark) {
        self.last_point = mark.last_point;
        self.prev_point_id = mark.prev_point_id;
        self.prev_timestamp1 = mark.prev_timestamp1;
        self.prev_timestamp2 = mark.prev_timestamp2;
        self.timestamp1_active = mark.timestamp1_active;
        self.prev_time_delta1 = mark.deltas[0];
        self.prev_time_delta2 = mark.deltas[1];
        self.prev_time_delta3 = mark.deltas[2];
        self.prev_time_delta4 = mark.deltas[3];
        for (idx, state) in mark.saved {
            self.points[idx] = state;
        }
    }

    #[cfg(test)]
    pub(crate) fn states(&self) -> &[PointState] {
        &self.points
    }
}
