//! Attribution chart as a dependency-free SVG string: horizontal bars from a
//! zero axis, risk-increasing contributors in red to the right, protective
//! ones in blue to the left.

use crate::explain::AttributionResult;
use std::path::Path;

/// Fill for contributors that push the death probability up.
pub const INCREASE_COLOR: &str = "#ff4d4d";
/// Fill for protective contributors.
pub const DECREASE_COLOR: &str = "#2196F3";

const WIDTH: u32 = 800;
const HEIGHT: u32 = 500;
const LABEL_GUTTER: f64 = 250.0;
const RIGHT_MARGIN: f64 = 30.0;
const ROWS_TOP: f64 = 60.0;
const ROWS_BOTTOM: f64 = 410.0;

/// Render the attribution chart. Returns an empty string when there is
/// nothing to draw.
pub fn render_attribution_svg(result: &AttributionResult, axis_max: Option<f64>) -> String {
    if result.contributions.is_empty() {
        return String::new();
    }

    let axis_max = result.symmetric_axis_max(axis_max);
    let center = (LABEL_GUTTER + (WIDTH as f64 - RIGHT_MARGIN)) / 2.0;
    let half_span = (WIDTH as f64 - RIGHT_MARGIN - LABEL_GUTTER) / 2.0;
    let rows = result.contributions.len() as f64;
    let row_h = (ROWS_BOTTOM - ROWS_TOP) / rows;
    let bar_h = row_h * 0.6;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" viewBox=\"0 0 {WIDTH} {HEIGHT}\">"
    );
    svg.push_str(&format!(
        "<rect width=\"{WIDTH}\" height=\"{HEIGHT}\" fill=\"white\"/>"
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"32\" text-anchor=\"middle\" font-size=\"20\">Feature impact on prediction</text>",
        WIDTH as f64 / 2.0
    ));

    // zero axis
    svg.push_str(&format!(
        "<line x1=\"{center:.1}\" y1=\"{:.1}\" x2=\"{center:.1}\" y2=\"{:.1}\" stroke=\"#888888\" stroke-width=\"1\"/>",
        ROWS_TOP - 10.0,
        ROWS_BOTTOM + 10.0
    ));

    for (i, c) in result.contributions.iter().enumerate() {
        let y = ROWS_TOP + i as f64 * row_h + (row_h - bar_h) / 2.0;
        let y_mid = y + bar_h / 2.0;
        let len = if axis_max > 0.0 {
            (c.score.abs() / axis_max * half_span).min(half_span)
        } else {
            0.0
        };
        let (x, color) = if c.score >= 0.0 {
            (center, INCREASE_COLOR)
        } else {
            (center - len, DECREASE_COLOR)
        };
        svg.push_str(&format!(
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{len:.1}\" height=\"{bar_h:.1}\" fill=\"{color}\"/>"
        ));

        // signed score at the bar tip
        if c.score >= 0.0 {
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{y_mid:.1}\" text-anchor=\"start\" dominant-baseline=\"middle\" font-size=\"12\">{:+.2}</text>",
                center + len + 6.0,
                c.score
            ));
        } else {
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{y_mid:.1}\" text-anchor=\"end\" dominant-baseline=\"middle\" font-size=\"12\">{:+.2}</text>",
                center - len - 6.0,
                c.score
            ));
        }

        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{y_mid:.1}\" text-anchor=\"end\" dominant-baseline=\"middle\" font-size=\"13\">{}</text>",
            LABEL_GUTTER - 10.0,
            c.caption()
        ));
    }

    // axis ticks and title
    let tick_y = ROWS_BOTTOM + 28.0;
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{tick_y:.1}\" text-anchor=\"middle\" font-size=\"11\">{:.2}</text>",
        center - half_span,
        -axis_max
    ));
    svg.push_str(&format!(
        "<text x=\"{center:.1}\" y=\"{tick_y:.1}\" text-anchor=\"middle\" font-size=\"11\">0</text>"
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{tick_y:.1}\" text-anchor=\"middle\" font-size=\"11\">{:.2}</text>",
        center + half_span,
        axis_max
    ));
    svg.push_str(&format!(
        "<text x=\"{center:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"13\">Shapley value</text>",
        tick_y + 22.0
    ));

    // baseline annotation, bottom left
    svg.push_str(&format!(
        "<text x=\"20\" y=\"{:.1}\" font-size=\"12\">f(x) = {:.3}</text>",
        HEIGHT as f64 - 18.0,
        result.baseline_value
    ));

    // legend, bottom right
    let legend_x = WIDTH as f64 - 190.0;
    svg.push_str(&format!(
        "<rect x=\"{legend_x:.1}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{INCREASE_COLOR}\"/>",
        HEIGHT as f64 - 48.0
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" dominant-baseline=\"middle\">Increases risk</text>",
        legend_x + 18.0,
        HEIGHT as f64 - 42.0
    ));
    svg.push_str(&format!(
        "<rect x=\"{legend_x:.1}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{DECREASE_COLOR}\"/>",
        HEIGHT as f64 - 30.0
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" dominant-baseline=\"middle\">Decreases risk</text>",
        legend_x + 18.0,
        HEIGHT as f64 - 24.0
    ));

    svg.push_str("</svg>");
    svg
}

/// Write the chart to the well-known artifact location, replacing any chart
/// from a previous request. Nothing is written when there is nothing to draw.
pub fn write_attribution_svg(
    path: &Path,
    result: &AttributionResult,
    axis_max: Option<f64>,
) -> std::io::Result<()> {
    let svg = render_attribution_svg(result, axis_max);
    if svg.is_empty() {
        return Ok(());
    }
    std::fs::write(path, svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::Contribution;

    fn sample() -> AttributionResult {
        AttributionResult {
            baseline_value: 0.316,
            contributions: vec![
                Contribution {
                    feature: "TNM_stage".to_string(),
                    score: 0.30,
                    display_value: "Stage III".to_string(),
                },
                Contribution {
                    feature: "albumin".to_string(),
                    score: -0.12,
                    display_value: "38.6".to_string(),
                },
            ],
        }
    }

    #[test]
    fn chart_carries_bars_captions_legend_and_baseline() {
        let svg = render_attribution_svg(&sample(), None);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(INCREASE_COLOR));
        assert!(svg.contains(DECREASE_COLOR));
        assert!(svg.contains("Stage III = TNM_stage"));
        assert!(svg.contains("38.6 = albumin"));
        assert!(svg.contains("+0.30"));
        assert!(svg.contains("-0.12"));
        assert!(svg.contains("f(x) = 0.316"));
        assert!(svg.contains("Increases risk"));
        assert!(svg.contains("Decreases risk"));
        assert!(svg.contains("Shapley value"));
    }

    #[test]
    fn empty_result_renders_nothing() {
        let empty = AttributionResult {
            baseline_value: 0.5,
            contributions: vec![],
        };
        assert_eq!(render_attribution_svg(&empty, None), String::new());
    }

    #[test]
    fn writes_and_overwrites_the_artifact_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attribution_plot.svg");
        write_attribution_svg(&path, &sample(), None).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        assert!(first.contains("TNM_stage"));

        let mut second_result = sample();
        second_result.contributions[0].display_value = "Stage IV".to_string();
        second_result.contributions[0].score = 0.41;
        write_attribution_svg(&path, &second_result, None).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert!(second.contains("Stage IV = TNM_stage"));
        assert!(second.contains("+0.41"));
    }
}
