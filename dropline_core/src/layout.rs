use sheet_schema::Seconds;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneRect {
    pub x: f32,
    pub width: f32,
}

/// Vertical scroll parameters shared by every lane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scroll {
    pub hit_line_y: f32,
    pub speed_px_per_sec: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub viewport: Viewport,
    pub lanes: Vec<LaneRect>,
    pub scroll: Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub lane_count: usize,
    pub lane_max_width: f32,
    pub lane_gap: f32,
    pub hit_line_ratio: f32,
    pub lead_time: Seconds,
}

/// Centers `lane_count` lanes in the viewport. Lanes share the width evenly
/// up to `lane_max_width`, separated by `lane_gap`.
pub fn compute(viewport: Viewport, params: LayoutParams) -> Layout {
    let count = params.lane_count.max(1) as f32;
    let lane_width = (viewport.width / count).min(params.lane_max_width);
    let start_x = viewport.width / 2.0 - (count * lane_width) / 2.0;

    let lanes = (0..params.lane_count)
        .map(|i| LaneRect {
            x: start_x + (lane_width + params.lane_gap) * i as f32,
            width: lane_width,
        })
        .collect();

    let hit_line_y = viewport.height * params.hit_line_ratio;
    // Avoid division by zero
    let speed_px_per_sec = if params.lead_time > 0.0 {
        hit_line_y / params.lead_time as f32
    } else {
        0.0
    };

    Layout {
        viewport,
        lanes,
        scroll: Scroll {
            hit_line_y,
            speed_px_per_sec,
        },
    }
}
