use std::time::Duration;

/// Sleep intervals between two polls of the same operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollSchedule {
    /// Same interval before every poll.
    Fixed(Duration),
    /// Eight 1s ticks, then 2s, 5s, 8s, ... up to 29s, then 30s forever.
    #[default]
    Ramp,
}

impl PollSchedule {
    const RAMP_FAST_TICKS: usize = 8;
    const RAMP_FAST_INTERVAL_SECS: u64 = 1;
    const RAMP_START_SECS: u64 = 2;
    const RAMP_STEP_SECS: u64 = 3;
    const RAMP_CAP_SECS: u64 = 30;

    pub const fn intervals(self) -> PollIntervals {
        PollIntervals {
            schedule: self,
            tick: 0,
        }
    }

    fn interval(self, tick: usize) -> Duration {
        match self {
            Self::Fixed(interval) => interval,
            Self::Ramp if tick < Self::RAMP_FAST_TICKS => {
                Duration::from_secs(Self::RAMP_FAST_INTERVAL_SECS)
            }
            Self::Ramp => {
                let step = (tick - Self::RAMP_FAST_TICKS) as u64;
                let secs = Self::RAMP_START_SECS
                    .saturating_add(step.saturating_mul(Self::RAMP_STEP_SECS));

                if secs < Self::RAMP_CAP_SECS {
                    Duration::from_secs(secs)
                } else {
                    Duration::from_secs(Self::RAMP_CAP_SECS)
                }
            }
        }
    }
}

/// Endless iterator over the intervals of a [`PollSchedule`].
#[derive(Debug, Clone)]
pub struct PollIntervals {
    schedule: PollSchedule,
    tick: usize,
}

impl Iterator for PollIntervals {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let interval = self.schedule.interval(self.tick);
        self.tick = self.tick.saturating_add(1);

        Some(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_starts_fast_and_settles_at_thirty_seconds() {
        let intervals = PollSchedule::Ramp
            .intervals()
            .take(22)
            .map(|interval| interval.as_secs())
            .collect::<Vec<_>>();

        assert_eq!(
            intervals,
            vec![
                1, 1, 1, 1, 1, 1, 1, 1, 2, 5, 8, 11, 14, 17, 20, 23, 26, 29, 30, 30, 30, 30
            ]
        );
    }

    #[test]
    fn default_schedule_is_the_ramp() {
        assert_eq!(PollSchedule::default(), PollSchedule::Ramp);
    }

    #[test]
    fn fixed_schedule_never_changes() {
        let interval = Duration::from_millis(250);

        assert!(
            PollSchedule::Fixed(interval)
                .intervals()
                .take(50)
                .all(|value| value == interval)
        );
    }
}
