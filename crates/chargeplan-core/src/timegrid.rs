//! Discretization of the operating day into fixed-width intervals.
//!
//! The grid classifies intervals into a contiguous day band and its
//! complementary night band, and answers the per-tour membership predicates
//! the model builder generates constraints from. Intervals are 1-based; the
//! day wraps logically (interval `N` is followed by interval `1`) for state
//! continuity, but tours never wrap.

use crate::catalog::Tour;
use crate::error::{PlanError, PlanResult};
use serde::{Deserialize, Serialize};

/// 1-based index of a time interval within the operating day.
pub type Interval = usize;

/// One operating day split into `intervals_per_day` equal intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeGrid {
    intervals_per_day: usize,
    interval_hours: f64,
    day_start: Interval,
    day_end: Interval,
    unplug_grace: usize,
}

impl TimeGrid {
    /// Create a grid with a day band `[day_start, day_end]` and an unplug
    /// grace window of `unplug_grace` intervals immediately before
    /// `day_start`.
    pub fn new(
        intervals_per_day: usize,
        interval_hours: f64,
        day_start: Interval,
        day_end: Interval,
        unplug_grace: usize,
    ) -> PlanResult<Self> {
        if intervals_per_day < 2 {
            return Err(PlanError::TimeGrid(format!(
                "need at least 2 intervals per day, got {}",
                intervals_per_day
            )));
        }
        if !(interval_hours > 0.0 && interval_hours.is_finite()) {
            return Err(PlanError::TimeGrid(format!(
                "interval width must be a positive number of hours, got {}",
                interval_hours
            )));
        }
        if day_start < 1 || day_end > intervals_per_day || day_start > day_end {
            return Err(PlanError::TimeGrid(format!(
                "day band [{}, {}] does not fit into 1..={}",
                day_start, day_end, intervals_per_day
            )));
        }
        Ok(Self {
            intervals_per_day,
            interval_hours,
            day_start,
            day_end,
            unplug_grace,
        })
    }

    /// The standard pattern: 96 quarter-hour intervals with a 06:00–17:45
    /// day band and a one-interval unplug grace before day start.
    pub fn quarter_hourly() -> Self {
        Self {
            intervals_per_day: 96,
            interval_hours: 0.25,
            day_start: 25,
            day_end: 72,
            unplug_grace: 1,
        }
    }

    /// Number of intervals in one day.
    pub fn len(&self) -> usize {
        self.intervals_per_day
    }

    /// Always false; a grid has at least two intervals.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Width of one interval in hours.
    pub fn interval_hours(&self) -> f64 {
        self.interval_hours
    }

    /// First interval of the day (always 1).
    pub fn first(&self) -> Interval {
        1
    }

    /// Last interval of the day.
    pub fn last(&self) -> Interval {
        self.intervals_per_day
    }

    /// First interval of the day band.
    pub fn day_start(&self) -> Interval {
        self.day_start
    }

    /// Last interval of the day band.
    pub fn day_end(&self) -> Interval {
        self.day_end
    }

    /// Iterate over all intervals, 1..=N.
    pub fn intervals(&self) -> impl Iterator<Item = Interval> {
        1..=self.intervals_per_day
    }

    /// True iff `z` is a valid interval of this grid.
    pub fn contains(&self, z: Interval) -> bool {
        (1..=self.intervals_per_day).contains(&z)
    }

    /// True iff `z` lies in the contiguous day band.
    pub fn is_day(&self, z: Interval) -> bool {
        (self.day_start..=self.day_end).contains(&z)
    }

    /// True iff `z` lies in the night band (the day band's complement).
    pub fn is_night(&self, z: Interval) -> bool {
        self.contains(z) && !self.is_day(z)
    }

    /// Iterate over the night band in ascending order.
    pub fn night_intervals(&self) -> impl Iterator<Item = Interval> + '_ {
        self.intervals().filter(|&z| self.is_night(z))
    }

    /// The interval following `z`, or `None` at the end of the day.
    ///
    /// Dynamics constraints are generated only where a successor exists;
    /// the day's closure is expressed by an explicit cyclic equality.
    pub fn successor(&self, z: Interval) -> Option<Interval> {
        if z < self.intervals_per_day {
            Some(z + 1)
        } else {
            None
        }
    }

    /// Whether a charging connection may be dropped between `z` and `z+1`.
    ///
    /// Allowed throughout the day band, and within the grace window
    /// immediately before day start so vehicles can be ready for morning
    /// departures. The grace window never wraps past interval 1.
    pub fn unplug_allowed(&self, z: Interval) -> bool {
        self.is_day(z) || (z < self.day_start && self.day_start - z <= self.unplug_grace)
    }

    /// True iff `tour` is underway during `z` (departure interval inclusive,
    /// arrival interval exclusive).
    pub fn active_during(&self, tour: &Tour, z: Interval) -> bool {
        tour.start <= z && z < tour.end
    }

    /// True iff `tour` departs in `z`.
    pub fn starts_at(&self, tour: &Tour, z: Interval) -> bool {
        tour.start == z
    }

    /// True iff `tour` arrives in `z`.
    pub fn ends_at(&self, tour: &Tour, z: Interval) -> bool {
        tour.end == z
    }
}
