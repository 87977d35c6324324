use std::time::Duration;

use bevy::core::Timer;

/// Repeating timer that pulls the active piece down. Owned by the engine:
/// started on spawn, dropped the moment the piece lands.
pub struct GravityTimer {
    interval: Duration,
    timer: Option<Timer>,
}

impl GravityTimer {
    pub fn new(interval: Duration) -> GravityTimer {
        assert!(!interval.is_zero(), "gravity interval must be positive");
        GravityTimer {
            interval,
            timer: None,
        }
    }

    pub fn start(&mut self) {
        self.timer = Some(Timer::new(self.interval, true));
    }

    pub fn stop(&mut self) {
        self.timer = None;
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Advances the timer and returns how many steps fell due.
    pub fn tick(&mut self, delta: Duration) -> u32 {
        match self.timer.as_mut() {
            Some(timer) => timer.tick(delta).times_finished(),
            None => 0,
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::GravityTimer;

    #[test]
    fn fires_once_per_interval() {
        let mut timer = GravityTimer::new(Duration::from_secs(1));
        timer.start();
        assert_eq!(timer.tick(Duration::from_millis(400)), 0);
        assert_eq!(timer.tick(Duration::from_millis(600)), 1);
        assert_eq!(timer.tick(Duration::from_millis(2500)), 2);
        assert_eq!(timer.tick(Duration::from_millis(500)), 1);
    }

    #[test]
    fn stopped_timer_never_fires() {
        let mut timer = GravityTimer::new(Duration::from_secs(1));
        assert!(!timer.is_running());
        assert_eq!(timer.tick(Duration::from_secs(5)), 0);

        timer.start();
        timer.tick(Duration::from_millis(900));
        timer.stop();
        assert_eq!(timer.tick(Duration::from_secs(5)), 0);
    }

    #[test]
    fn restarting_resets_progress() {
        let mut timer = GravityTimer::new(Duration::from_secs(1));
        timer.start();
        timer.tick(Duration::from_millis(900));
        timer.start();
        assert_eq!(timer.tick(Duration::from_millis(200)), 0);
    }
}
