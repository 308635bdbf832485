// Visible time window over the elapsed-time axis
use super::time::TimeRange;
use serde::Deserialize;

/// Share of the visible width moved by a single pan step.
const PAN_FRACTION: f64 = 0.2;
/// Share of the global span a zero-width window opens to on zoom out.
const ZOOM_OUT_SEED_FRACTION: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Start,
    End,
}

/// Owns the visible window and keeps it inside the global extent.
///
/// Every mutation leaves `global.start <= current.start <= current.end <= global.end`.
#[derive(Debug, Clone, Default)]
pub struct TimeRangeController {
    global: TimeRange,
    current: TimeRange,
}

impl TimeRangeController {
    pub fn new(global: TimeRange) -> Self {
        let global = if global.start <= global.end {
            global
        } else {
            TimeRange::new(global.end, global.start)
        };
        Self {
            global,
            current: global,
        }
    }

    pub fn global(&self) -> TimeRange {
        self.global
    }

    pub fn current(&self) -> TimeRange {
        self.current
    }

    /// Replace the window, clamping both ends into the global extent.
    pub fn set_range(&mut self, range: TimeRange) -> TimeRange {
        self.current = self.clamp(range.start, range.end);
        self.current
    }

    /// Map two slider percentages onto the global extent.
    ///
    /// Percentages are clamped to `[0, 100]` and reordered if reversed.
    pub fn set_from_normalized(&mut self, start_pct: f64, end_pct: f64) -> TimeRange {
        let span = self.global.width();
        let to_ms = |pct: f64| {
            let pct = if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) };
            self.global.start + pct / 100.0 * span
        };
        let (start, end) = (to_ms(start_pct), to_ms(end_pct));
        self.current = self.clamp(start, end);
        self.current
    }

    pub fn zoom_in(&mut self) -> TimeRange {
        let width = self.current.width() / 2.0;
        self.zoom_to(width)
    }

    pub fn zoom_out(&mut self) -> TimeRange {
        let width = self.current.width();
        let width = if width > 0.0 {
            width * 2.0
        } else {
            self.global.width() * ZOOM_OUT_SEED_FRACTION
        };
        self.zoom_to(width)
    }

    fn zoom_to(&mut self, width: f64) -> TimeRange {
        let center = self.current.center();
        self.current = self.clamp(center - width / 2.0, center + width / 2.0);
        self.current
    }

    pub fn reset_zoom(&mut self) -> TimeRange {
        self.current = self.global;
        self.current
    }

    /// Shift the window by a fifth of its width, stopping flush at the edge.
    pub fn pan(&mut self, direction: PanDirection) -> TimeRange {
        let width = self.current.width();
        let shift = width * PAN_FRACTION;
        self.current = match direction {
            PanDirection::Left => {
                let start = (self.current.start - shift).max(self.global.start);
                TimeRange::new(start, (start + width).min(self.global.end))
            }
            PanDirection::Right => {
                let end = (self.current.end + shift).min(self.global.end);
                TimeRange::new((end - width).max(self.global.start), end)
            }
        };
        self.current
    }

    /// Move the window flush against one edge, keeping its width.
    pub fn jump_to_edge(&mut self, edge: Edge) -> TimeRange {
        let width = self.current.width();
        self.current = match edge {
            Edge::Start => TimeRange::new(self.global.start, (self.global.start + width).min(self.global.end)),
            Edge::End => TimeRange::new((self.global.end - width).max(self.global.start), self.global.end),
        };
        self.current
    }

    /// Current window as percentages of the global span, for a dual-handle slider.
    pub fn normalized_slider(&self) -> [f64; 2] {
        let span = self.global.width();
        if span == 0.0 {
            return [0.0, 100.0];
        }
        [
            (self.current.start - self.global.start) / span * 100.0,
            (self.current.end - self.global.start) / span * 100.0,
        ]
    }

    fn clamp(&self, start: f64, end: f64) -> TimeRange {
        let (lo, hi) = (self.global.start, self.global.end);
        let start = start.clamp(lo, hi);
        let end = end.clamp(lo, hi);
        if start <= end {
            TimeRange::new(start, end)
        } else {
            TimeRange::new(end, start)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn controller() -> TimeRangeController {
        TimeRangeController::new(TimeRange::new(0.0, 2000.0))
    }

    fn assert_range(actual: TimeRange, start: f64, end: f64) {
        assert!((actual.start - start).abs() < EPS, "start {} != {}", actual.start, start);
        assert!((actual.end - end).abs() < EPS, "end {} != {}", actual.end, end);
    }

    #[test]
    fn test_seeded_to_global() {
        let c = controller();
        assert_range(c.current(), 0.0, 2000.0);
        assert_eq!(c.normalized_slider(), [0.0, 100.0]);
    }

    #[test]
    fn test_zoom_in_then_out_restores() {
        let mut c = controller();
        c.set_range(TimeRange::new(500.0, 1500.0));
        assert_range(c.zoom_in(), 750.0, 1250.0);
        assert_range(c.zoom_out(), 500.0, 1500.0);
    }

    #[test]
    fn test_zoom_in_never_inverts() {
        let mut c = controller();
        for _ in 0..2000 {
            let r = c.zoom_in();
            assert!(r.start <= r.end);
        }
        assert!(c.current().width() >= 0.0);
    }

    #[test]
    fn test_zoom_out_converges_to_global() {
        let mut c = controller();
        c.set_range(TimeRange::new(10.0, 20.0));
        let mut steps = 0;
        while c.current() != c.global() {
            c.zoom_out();
            steps += 1;
            assert!(steps < 100, "zoom out did not converge");
        }
        assert_range(c.zoom_out(), 0.0, 2000.0);
    }

    #[test]
    fn test_zoom_out_from_zero_width() {
        let mut c = controller();
        c.set_from_normalized(50.0, 50.0);
        assert_eq!(c.current().width(), 0.0);
        let r = c.zoom_out();
        assert!(r.width() > 0.0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut c = controller();
        c.set_range(TimeRange::new(100.0, 200.0));
        let once = c.reset_zoom();
        let twice = c.reset_zoom();
        assert_eq!(once, twice);
        assert_range(twice, 0.0, 2000.0);
    }

    #[test]
    fn test_pan_keeps_width_inside_bounds() {
        let mut c = controller();
        c.set_range(TimeRange::new(100.0, 600.0));
        assert_range(c.pan(PanDirection::Left), 0.0, 500.0);
        assert_range(c.pan(PanDirection::Left), 0.0, 500.0);
        assert_range(c.pan(PanDirection::Right), 100.0, 600.0);

        c.set_range(TimeRange::new(1400.0, 1950.0));
        assert_range(c.pan(PanDirection::Right), 1450.0, 2000.0);
    }

    #[test]
    fn test_jump_to_edges() {
        let mut c = controller();
        c.set_range(TimeRange::new(700.0, 1000.0));
        assert_range(c.jump_to_edge(Edge::End), 1700.0, 2000.0);
        assert_range(c.jump_to_edge(Edge::Start), 0.0, 300.0);
    }

    #[test]
    fn test_normalized_round_trip() {
        let mut c = controller();
        assert_range(c.set_from_normalized(25.0, 75.0), 500.0, 1500.0);
        let [s, e] = c.normalized_slider();
        assert!((s - 25.0).abs() < EPS && (e - 75.0).abs() < EPS);
    }

    #[test]
    fn test_normalized_clamps_and_orders() {
        let mut c = controller();
        assert_range(c.set_from_normalized(80.0, 20.0), 400.0, 1600.0);
        assert_range(c.set_from_normalized(-10.0, 150.0), 0.0, 2000.0);
    }

    #[test]
    fn test_set_range_clamps() {
        let mut c = controller();
        assert_range(c.set_range(TimeRange::new(-500.0, 2500.0)), 0.0, 2000.0);
    }

    #[test]
    fn test_single_point_global() {
        let mut c = TimeRangeController::new(TimeRange::new(5.0, 5.0));
        assert_eq!(c.normalized_slider(), [0.0, 100.0]);
        assert_range(c.zoom_out(), 5.0, 5.0);
        assert_range(c.pan(PanDirection::Right), 5.0, 5.0);
    }
}
