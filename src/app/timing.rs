use std::time::{Duration, Instant};

/// Longest step fed to animation; a stalled frame does not cause a jump.
const MAX_FRAME_DT: f32 = 0.1;

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_fps_time: Option<Instant>,
    frame_count: u32,
    pub frame_dt: f32,
}

impl FrameTiming {
    pub fn new() -> Self {
        Self {
            last_frame_time: None,
            last_fps_time: None,
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
        }
    }

    pub fn update(&mut self, now: Instant) {
        let dt_duration = if let Some(last) = self.last_frame_time {
            now.saturating_duration_since(last)
        } else {
            Duration::from_millis(16)
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().clamp(0.0, MAX_FRAME_DT);

        self.frame_count = self.frame_count.saturating_add(1);
        let fps_start = *self.last_fps_time.get_or_insert(now);
        let elapsed = now.saturating_duration_since(fps_start);
        if elapsed.as_secs_f32() >= 0.5 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            log::trace!("{:.1} fps (cadence {:.2} ms)", fps, self.frame_dt * 1000.0);
            self.frame_count = 0;
            self.last_fps_time = Some(now);
        }
    }
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new()
    }
}
