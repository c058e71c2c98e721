use std::collections::VecDeque;

/// A value placed on the timeline, in minutes since the reference time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedValue {
    pub offset: f64,
    pub value: f64,
}

/// Mean of a changing set of values, updated one value at a time.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RunningMean {
    mean: f64,
    count: usize,
}

impl RunningMean {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        self.mean += (value - self.mean) / (self.count + 1) as f64;
        self.count += 1;
    }

    /// Removing from an empty mean does nothing.
    pub fn remove(&mut self, value: f64) {
        match self.count {
            0 => return,
            1 => self.mean -= value,
            n => self.mean = (self.mean * n as f64 - value) / (n - 1) as f64,
        }
        self.count -= 1;
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Averages the values inside a window that only ever moves forward.
///
/// A value joins the window when `upper_bound` reaches it, but only if its
/// offset is above `lower_bound` at that moment. Once in, it stays until its
/// offset drops below a later `lower_bound`, so a value sitting exactly on
/// the lower bound is kept if it was already inside and never added if it
/// arrives there. The values must be sorted by offset, and successive
/// queries must not move either bound backwards.
///
/// For windows under one minute this keeps the window mean exact instead of
/// reproducing what the bare add/remove rules output: values passed over on
/// arrival are never subtracted when they later leave.
#[derive(Debug)]
pub struct WindowAverager<'a> {
    values: &'a [TimedValue],
    lower: usize,
    upper: usize,
    /// Indices in `[lower, upper)` that were passed over without being added.
    skipped: VecDeque<usize>,
    running: RunningMean,
}

impl<'a> WindowAverager<'a> {
    pub fn new(values: &'a [TimedValue]) -> Self {
        Self {
            values,
            lower: 0,
            upper: 0,
            skipped: VecDeque::new(),
            running: RunningMean::new(),
        }
    }

    pub fn window_average(&mut self, lower_bound: f64, upper_bound: f64) -> f64 {
        // Values that the window has moved past.
        while let Some(old) = self.values.get(self.lower) {
            if old.offset >= lower_bound {
                break;
            }
            if self.lower < self.upper {
                if self.skipped.front() == Some(&self.lower) {
                    self.skipped.pop_front();
                } else {
                    self.running.remove(old.value);
                }
            }
            self.lower += 1;
        }
        self.upper = self.upper.max(self.lower);

        // Values the window has reached. A value sitting exactly on the lower
        // bound is never added, which happens when the window is narrower
        // than the gap between two ticks.
        while let Some(new) = self.values.get(self.upper) {
            if new.offset > upper_bound {
                break;
            }
            if new.offset > lower_bound {
                self.running.add(new.value);
            } else {
                self.skipped.push_back(self.upper);
            }
            self.upper += 1;
        }

        self.running.mean()
    }

    pub fn lower_cursor(&self) -> usize {
        self.lower
    }

    pub fn upper_cursor(&self) -> usize {
        self.upper
    }

    pub fn count(&self) -> usize {
        self.running.count()
    }
}
