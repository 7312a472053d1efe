//! Colors for the heatmap ramp and the rider layers

/// Control points of the viridis ramp, dark purple to yellow
const VIRIDIS: [(u8, u8, u8); 10] = [
    (0x44, 0x01, 0x54),
    (0x48, 0x28, 0x78),
    (0x3e, 0x49, 0x89),
    (0x31, 0x68, 0x8e),
    (0x26, 0x82, 0x8e),
    (0x1f, 0x9e, 0x89),
    (0x35, 0xb7, 0x79),
    (0x6e, 0xce, 0x58),
    (0xb5, 0xde, 0x2b),
    (0xfd, 0xe7, 0x25),
];

/// Distinct colors for the top riders of a participant
pub const TOP_RIDER_PALETTE: [&str; 6] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949",
];

/// Shared color for everyone outside the top riders
pub const NEUTRAL: &str = "#c7c7c7";

/// Sample the ramp at `t` in `[0, 1]`, values outside are clamped
pub fn viridis(t: f64) -> String {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - i as f64;

    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Evenly spaced gradient stops for a legend, as (offset, color)
pub fn gradient_stops(count: usize) -> Vec<(f64, String)> {
    let count = count.max(2);
    (0..count)
        .map(|i| {
            let t = i as f64 / (count - 1) as f64;
            (t, viridis(t))
        })
        .collect()
}

/// Color for the rider at `position` in the top list, neutral past it
pub fn rider_color(position: Option<usize>) -> &'static str {
    position
        .and_then(|p| TOP_RIDER_PALETTE.get(p).copied())
        .unwrap_or(NEUTRAL)
}
