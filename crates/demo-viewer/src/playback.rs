//! Frame clock for point-cloud episodes.

/// Playback rate at speed 1.0.
pub const TARGET_FPS: f32 = 30.0;
pub const MIN_SPEED: f32 = 0.1;
pub const MAX_SPEED: f32 = 3.0;

/// Current frame, play/pause flag, and speed of the displayed episode.
///
/// The frame index is always `< total_frames`, or `0` when there are none.
#[derive(Debug, Clone)]
pub struct Playback {
    current: usize,
    total: usize,
    pub playing: bool,
    speed: f32,
    accumulator: f32,
}

impl Playback {
    pub fn new(total_frames: usize) -> Self {
        Self {
            current: 0,
            total: total_frames,
            playing: false,
            speed: 1.0,
            accumulator: 0.0,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }

    /// A new episode was loaded: stop, rewind, and adopt its length.
    pub fn reset(&mut self, total_frames: usize) {
        self.total = total_frames;
        self.current = 0;
        self.playing = false;
        self.accumulator = 0.0;
    }

    /// Jump to `frame`, clamped into range. Returns the new index if it
    /// differs from the old one.
    pub fn seek(&mut self, frame: usize) -> Option<usize> {
        let target = frame.min(self.total.saturating_sub(1));
        if target == self.current {
            return None;
        }
        self.current = target;
        Some(target)
    }

    /// Advances the clock by `dt_s` seconds. Returns the new frame index when
    /// the frame changed; at most one frame per call.
    pub fn tick(&mut self, dt_s: f32) -> Option<usize> {
        if !self.playing || self.total == 0 {
            return None;
        }

        self.accumulator += dt_s * self.speed;
        if self.accumulator < 1.0 / TARGET_FPS {
            return None;
        }

        self.accumulator = 0.0;
        self.current = (self.current + 1) % self.total;
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / TARGET_FPS;

    #[test]
    fn paused_does_not_advance() {
        let mut p = Playback::new(10);
        assert_eq!(p.tick(1.0), None);
        assert_eq!(p.current(), 0);
    }

    #[test]
    fn advances_once_per_frame_duration() {
        let mut p = Playback::new(10);
        p.playing = true;
        assert_eq!(p.tick(FRAME * 0.5), None);
        assert_eq!(p.tick(FRAME * 0.6), Some(1));
        // A long stall still moves a single frame.
        assert_eq!(p.tick(10.0), Some(2));
    }

    #[test]
    fn wraps_after_last_frame() {
        let mut p = Playback::new(3);
        p.playing = true;
        let seen: Vec<_> = (0..4).filter_map(|_| p.tick(FRAME * 1.01)).collect();
        assert_eq!(seen, vec![1, 2, 0, 1]);
    }

    #[test]
    fn speed_scales_time_and_is_clamped() {
        let mut p = Playback::new(5);
        p.playing = true;
        p.set_speed(2.0);
        assert_eq!(p.tick(FRAME * 0.55), Some(1));

        p.set_speed(100.0);
        assert_eq!(p.speed(), MAX_SPEED);
        p.set_speed(0.0);
        assert_eq!(p.speed(), MIN_SPEED);
    }

    #[test]
    fn index_stays_in_range_under_any_operation() {
        let mut p = Playback::new(4);
        p.playing = true;
        for step in 0..200 {
            match step % 7 {
                0 => {
                    p.seek(step * 3);
                }
                3 => p.reset(1 + step % 5),
                _ => {
                    p.tick(FRAME * 1.5);
                }
            }
            if step % 3 == 0 {
                p.playing = true;
            }
            assert!(p.current() < p.total());
        }
    }

    #[test]
    fn reset_stops_and_rewinds() {
        let mut p = Playback::new(10);
        p.playing = true;
        p.seek(7);
        p.reset(20);
        assert!(!p.playing);
        assert_eq!(p.current(), 0);
        assert_eq!(p.total(), 20);
    }

    #[test]
    fn empty_episode_is_inert() {
        let mut p = Playback::new(0);
        p.playing = true;
        assert_eq!(p.tick(1.0), None);
        assert_eq!(p.seek(5), None);
        assert_eq!(p.current(), 0);
    }

    #[test]
    fn seek_clamps_and_reports_change() {
        let mut p = Playback::new(5);
        assert_eq!(p.seek(99), Some(4));
        assert_eq!(p.seek(4), None);
        assert_eq!(p.seek(0), Some(0));
    }
}
