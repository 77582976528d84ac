//! SVG rendering of chart figures

use crate::chart::{Figure, SeriesKind};

const WIDTH: f32 = 1200.0;
const HEIGHT: f32 = 600.0;
const MARGIN_LEFT: f32 = 80.0;
const MARGIN_RIGHT: f32 = 40.0;
const MARGIN_TOP: f32 = 50.0;
const MARGIN_BOTTOM: f32 = 60.0;
const TARGET_TICKS: usize = 8;

/// Data range mapped onto one plot axis
#[derive(Debug, Clone, Copy, PartialEq)]
struct Axis {
    min: f32,
    max: f32,
    step: f32,
}

impl Axis {
    /// Axis covering `values`, widened outwards to round tick positions
    fn fit(values: impl Iterator<Item = f32>) -> Self {
        let (lo, hi) = values
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        let (lo, hi) = if lo > hi {
            (0.0, 1.0)
        } else if (hi - lo).abs() < f32::EPSILON {
            (lo - 1.0, hi + 1.0)
        } else {
            (lo, hi)
        };

        let step = nice_step((hi - lo) / TARGET_TICKS as f32);
        Self {
            min: (lo / step).floor() * step,
            max: (hi / step).ceil() * step,
            step,
        }
    }

    fn ticks(&self) -> Vec<f32> {
        let count = ((self.max - self.min) / self.step).round() as usize;
        (0..=count).map(|i| self.min + i as f32 * self.step).collect()
    }

    /// Position of `value` in `0.0..=1.0`
    fn fraction(&self, value: f32) -> f32 {
        (value - self.min) / (self.max - self.min)
    }
}

/// Round a raw step up to 1, 2 or 5 times a power of ten
fn nice_step(raw: f32) -> f32 {
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10f32.powf(raw.log10().floor());
    let normalised = raw / magnitude;
    let nice = if normalised <= 1.0 {
        1.0
    } else if normalised <= 2.0 {
        2.0
    } else if normalised <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_tick(value: f32, step: f32) -> String {
    if step >= 1.0 {
        format!("{}", value.round() as i64)
    } else {
        let decimals = (-step.log10().floor()) as usize;
        format!("{:.*}", decimals, value)
    }
}

/// Escape text for use in SVG or HTML content and attributes
pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a figure as a standalone SVG document
pub fn render(figure: &Figure) -> String {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let x_axis = Axis::fit(
        figure
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.x))
            .chain(figure.markers.iter().map(|m| m.x)),
    );
    let y_axis = Axis::fit(figure.series.iter().flat_map(|s| s.points.iter().map(|p| p.y)));

    let sx = |x: f32| MARGIN_LEFT + x_axis.fraction(x) * plot_w;
    let sy = |y: f32| MARGIN_TOP + (1.0 - y_axis.fraction(y)) * plot_h;

    let mut svg = String::with_capacity(4096);

    svg.push_str(&format!(
        r#"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}">
  <defs>
    <style>
      .title {{ font: bold 18px sans-serif; }}
      .label {{ font: 14px sans-serif; }}
      .tick {{ font: 12px sans-serif; fill: #444; }}
      .grid {{ stroke: #ddd; stroke-width: 1; }}
      .axis {{ stroke: #000; stroke-width: 1; }}
      .marker {{ stroke: gray; stroke-width: 1.5; stroke-dasharray: 6,4; opacity: 0.7; }}
      .annotation {{ font: 12px sans-serif; fill: black; }}
    </style>
  </defs>
  <rect width="100%" height="100%" fill="white" />"#,
        w = WIDTH,
        h = HEIGHT
    ));

    svg.push_str(&format!(
        "\n  <text class=\"title\" x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>",
        MARGIN_LEFT + plot_w / 2.0,
        MARGIN_TOP / 2.0 + 6.0,
        escape(&figure.title)
    ));

    // Grid and tick labels
    for x in x_axis.ticks() {
        let px = sx(x);
        if figure.grid {
            svg.push_str(&format!(
                "\n  <line class=\"grid\" x1=\"{px:.2}\" y1=\"{:.2}\" x2=\"{px:.2}\" y2=\"{:.2}\" />",
                MARGIN_TOP,
                MARGIN_TOP + plot_h
            ));
        }
        svg.push_str(&format!(
            "\n  <text class=\"tick\" x=\"{px:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
            MARGIN_TOP + plot_h + 18.0,
            format_tick(x, x_axis.step)
        ));
    }
    for y in y_axis.ticks() {
        let py = sy(y);
        if figure.grid {
            svg.push_str(&format!(
                "\n  <line class=\"grid\" x1=\"{:.2}\" y1=\"{py:.2}\" x2=\"{:.2}\" y2=\"{py:.2}\" />",
                MARGIN_LEFT,
                MARGIN_LEFT + plot_w
            ));
        }
        svg.push_str(&format!(
            "\n  <text class=\"tick\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>",
            MARGIN_LEFT - 8.0,
            py + 4.0,
            format_tick(y, y_axis.step)
        ));
    }

    // Axes frame
    svg.push_str(&format!(
        "\n  <rect class=\"axis\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" />",
        MARGIN_LEFT, MARGIN_TOP, plot_w, plot_h
    ));
    svg.push_str(&format!(
        "\n  <text class=\"label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 15.0,
        escape(&figure.x_label)
    ));
    svg.push_str(&format!(
        "\n  <text class=\"label\" x=\"20\" y=\"{y:.2}\" text-anchor=\"middle\" transform=\"rotate(-90 20 {y:.2})\">{}</text>",
        escape(&figure.y_label),
        y = MARGIN_TOP + plot_h / 2.0
    ));

    // Series
    for series in &figure.series {
        match series.kind {
            SeriesKind::Line => {
                if series.points.is_empty() {
                    continue;
                }
                svg.push_str(&format!(
                    "\n  <polyline fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\" points=\"",
                    escape(&series.color)
                ));
                for (i, point) in series.points.iter().enumerate() {
                    if i > 0 {
                        svg.push(' ');
                    }
                    svg.push_str(&format!("{:.2},{:.2}", sx(point.x), sy(point.y)));
                }
                svg.push_str("\" />");
            }
            SeriesKind::Scatter => {
                for point in &series.points {
                    svg.push_str(&format!(
                        "\n  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"4\" fill=\"{}\" />",
                        sx(point.x),
                        sy(point.y),
                        escape(&series.color)
                    ));
                }
            }
        }
    }

    // Markers
    for marker in &figure.markers {
        let px = sx(marker.x);
        svg.push_str(&format!(
            "\n  <line class=\"marker\" x1=\"{px:.2}\" y1=\"{:.2}\" x2=\"{px:.2}\" y2=\"{:.2}\" />",
            MARGIN_TOP,
            MARGIN_TOP + plot_h
        ));
        let tx = sx(marker.text_at.x);
        svg.push_str(&format!(
            "\n  <text class=\"annotation\" x=\"{tx:.2}\" y=\"{:.2}\">",
            sy(marker.text_at.y)
        ));
        for (i, line) in marker.text.lines().enumerate() {
            let dy = if i == 0 { "0" } else { "1.2em" };
            svg.push_str(&format!("<tspan x=\"{tx:.2}\" dy=\"{}\">{}</tspan>", dy, escape(line)));
        }
        svg.push_str("</text>");
    }

    // Legend
    if figure.legend && !figure.series.is_empty() {
        let x = MARGIN_LEFT + plot_w - 140.0;
        let mut y = MARGIN_TOP + 16.0;
        svg.push_str(&format!(
            "\n  <rect x=\"{:.2}\" y=\"{:.2}\" width=\"130\" height=\"{:.2}\" fill=\"white\" stroke=\"#ccc\" />",
            x - 8.0,
            MARGIN_TOP + 4.0,
            figure.series.len() as f32 * 20.0 + 8.0
        ));
        for series in &figure.series {
            svg.push_str(&format!(
                "\n  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"5\" fill=\"{}\" />",
                x + 4.0,
                y - 4.0,
                escape(&series.color)
            ));
            svg.push_str(&format!(
                "\n  <text class=\"tick\" x=\"{:.2}\" y=\"{:.2}\">{}</text>",
                x + 16.0,
                y,
                escape(&series.label)
            ));
            y += 20.0;
        }
    }

    svg.push_str("\n</svg>");
    svg
}
