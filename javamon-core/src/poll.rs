#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Poll {
    pub force_report: bool,
}

/// Tick counter deciding when to read the scale. Keeps counting while the
/// bus is busy; a poll that lands mid-transaction just queues the next one.
#[derive(Debug)]
pub struct PollTimer {
    poll_interval: u32,
    force_every: u32,
    ticks: u32,
    polls: u32,
}

impl PollTimer {
    pub const fn new(poll_interval: u32, force_every: u32) -> Self {
        Self {
            poll_interval,
            force_every,
            ticks: 0,
            polls: 0,
        }
    }

    pub fn tick(&mut self) -> Option<Poll> {
        self.ticks += 1;
        if self.ticks < self.poll_interval {
            return None;
        }
        self.ticks = 0;
        self.polls += 1;
        let force_report = self.polls >= self.force_every;
        if force_report {
            self.polls = 0;
        }
        Some(Poll { force_report })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fires_every_interval() {
        let mut timer = PollTimer::new(5, 3);
        let mut fired_at = Vec::new();
        for n in 1..=20 {
            if timer.tick().is_some() {
                fired_at.push(n);
            }
        }
        assert_eq!(fired_at, [5, 10, 15, 20]);
    }

    #[test]
    fn every_nth_poll_forces_a_report() {
        let mut timer = PollTimer::new(2, 3);
        let forced: Vec<bool> = (0..12)
            .filter_map(|_| timer.tick())
            .map(|poll| poll.force_report)
            .collect();
        assert_eq!(forced, [false, false, true, false, false, true]);
    }
}
