use uom::si::f64::Time;

/// Decides when accumulated simulation state is snapshotted to the result
/// stream, independent of the routing step size.
///
/// The schedule is primed one report interval past the start of the run and
/// advances by exactly one interval each time the routing clock crosses it,
/// so snapshot instants stay evenly spaced even when the final routing step
/// overshoots the scheduled instant. At most one snapshot is taken per step
/// call: a step longer than the interval skips the intermediate instants
/// rather than catching up on them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReportSchedule {
    interval: Time,
    next: Time,
}

impl ReportSchedule {
    /// Creates a schedule with its first snapshot due one `interval` in.
    #[must_use]
    pub fn new(interval: Time) -> Self {
        Self {
            interval,
            next: interval,
        }
    }

    /// Whether the routing clock has reached or passed the next instant.
    #[must_use]
    pub fn is_due(&self, routing_clock: Time) -> bool {
        routing_clock >= self.next
    }

    /// The scheduled snapshot instant.
    ///
    /// Snapshots are keyed by this value, not by the routing clock that
    /// crossed it, which may sit past the scheduled instant.
    #[must_use]
    pub fn instant(&self) -> Time {
        self.next
    }

    /// Moves the schedule forward by one report interval.
    pub fn advance(&mut self) {
        self.next = self.next + self.interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use uom::si::time::hour;

    #[test]
    fn first_snapshot_is_due_one_interval_in() {
        let schedule = ReportSchedule::new(Time::new::<hour>(24.0));
        assert!(!schedule.is_due(Time::new::<hour>(23.9)));
        assert!(schedule.is_due(Time::new::<hour>(24.0)));
    }

    #[test]
    fn instants_stay_evenly_spaced_under_overshoot() {
        let mut schedule = ReportSchedule::new(Time::new::<hour>(24.0));

        // Routing clock overshoots the first instant by 5 hours; the
        // snapshot key is still the scheduled instant.
        assert!(schedule.is_due(Time::new::<hour>(29.0)));
        assert_relative_eq!(schedule.instant().get::<hour>(), 24.0);

        schedule.advance();
        assert_relative_eq!(schedule.instant().get::<hour>(), 48.0);
        assert!(!schedule.is_due(Time::new::<hour>(29.0)));
    }
}
