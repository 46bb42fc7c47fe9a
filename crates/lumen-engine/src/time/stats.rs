/// Frames-per-second counter, refreshed once per elapsed second.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frames: u32,
    window_start: f32,
    latest: Option<(f32, f32)>,
}

impl FrameStats {
    /// Counts one frame at game time `total` (seconds). Returns
    /// `(fps, ms per frame)` whenever a new one-second window closes.
    pub fn frame(&mut self, total: f32) -> Option<(f32, f32)> {
        self.frames += 1;
        let elapsed = total - self.window_start;
        if elapsed < 1.0 {
            return None;
        }

        let fps = self.frames as f32 / elapsed;
        let mspf = 1000.0 / fps;
        self.frames = 0;
        self.window_start = total;
        self.latest = Some((fps, mspf));
        self.latest
    }

    pub fn latest(&self) -> Option<(f32, f32)> {
        self.latest
    }

    pub fn title(base: &str, fps: f32, mspf: f32) -> String {
        format!("{base}    fps: {fps:.0}   mspf: {mspf:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_second() {
        let mut stats = FrameStats::default();
        let mut reports = Vec::new();
        for i in 1..=120 {
            if let Some(r) = stats.frame(i as f32 / 60.0) {
                reports.push(r);
            }
        }
        assert_eq!(reports.len(), 2);
        let (fps, mspf) = reports[0];
        assert!((fps - 60.0).abs() < 0.5);
        assert!((mspf - 16.667).abs() < 0.2);
    }
}
