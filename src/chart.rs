//! Chart rendering
//!
//! Charts are standalone SVG documents: candlesticks for OHLC data and a
//! polyline for close prices. Rendering is pure; `write_chart` stores the
//! result under the charts directory.

use crate::candles::{Candle, ClosePoint};
use crate::errors::BotResult;
use crate::logger::{self, LogTag};
use crate::paths;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 40.0;
const Y_TICKS: usize = 5;

const UP_COLOR: &str = "#26a69a";
const DOWN_COLOR: &str = "#ef5350";
const LINE_COLOR: &str = "#2962ff";

#[derive(Debug, Clone, Copy)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
        }
    }
}

impl ChartSize {
    fn plot_width(&self) -> f64 {
        (f64::from(self.width) - MARGIN_LEFT - MARGIN_RIGHT).max(1.0)
    }

    fn plot_height(&self) -> f64 {
        (f64::from(self.height) - MARGIN_TOP - MARGIN_BOTTOM).max(1.0)
    }
}

/// Vertical mapping from price to pixel row
struct PriceScale {
    min: f64,
    max: f64,
    top: f64,
    height: f64,
}

impl PriceScale {
    fn new(prices: impl Iterator<Item = f64>, size: &ChartSize) -> Option<Self> {
        let (mut min, mut max) = (f64::MAX, f64::MIN);
        for price in prices.filter(|p| p.is_finite() && *p > 0.0) {
            min = min.min(price);
            max = max.max(price);
        }
        if min > max {
            return None;
        }
        if (max - min).abs() < f64::EPSILON {
            // Flat series: pad so the line sits mid-chart
            let pad = (max.abs() * 0.01).max(0.01);
            min -= pad;
            max += pad;
        }
        Some(Self {
            min,
            max,
            top: MARGIN_TOP,
            height: size.plot_height(),
        })
    }

    fn y(&self, price: f64) -> f64 {
        let clamped = price.clamp(self.min, self.max);
        self.top + (self.max - clamped) / (self.max - self.min) * self.height
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_price(price: f64) -> String {
    if price >= 100.0 {
        format!("{:.2}", price)
    } else if price >= 1.0 {
        format!("{:.4}", price)
    } else {
        format!("{:.8}", price)
    }
}

fn open_document(out: &mut String, size: &ChartSize, title: &str, scale: &PriceScale, x_label: &str) {
    let _ = write!(
        out,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">
<rect width="100%" height="100%" fill="#ffffff"/>
<text x="{cx}" y="30" font-size="18" text-anchor="middle">{title}</text>
"##,
        w = size.width,
        h = size.height,
        cx = f64::from(size.width) / 2.0,
        title = escape_xml(title),
    );

    let right = MARGIN_LEFT + size.plot_width();
    for i in 0..=Y_TICKS {
        let price = scale.min + (scale.max - scale.min) * i as f64 / Y_TICKS as f64;
        let y = scale.y(price);
        let _ = writeln!(
            out,
            r##"<line x1="{l}" y1="{y:.1}" x2="{r}" y2="{y:.1}" stroke="#dddddd" stroke-dasharray="4 4"/><text x="{tx}" y="{ty:.1}" font-size="12" text-anchor="end">{label}</text>"##,
            l = MARGIN_LEFT,
            r = right,
            y = y,
            tx = MARGIN_LEFT - 6.0,
            ty = y + 4.0,
            label = format_price(price),
        );
    }

    let _ = writeln!(
        out,
        r##"<text x="{cx}" y="{by}" font-size="13" text-anchor="middle">{label}</text><text x="16" y="{my}" font-size="13" transform="rotate(-90 16 {my})" text-anchor="middle">Price (USDT)</text>"##,
        cx = MARGIN_LEFT + size.plot_width() / 2.0,
        by = f64::from(size.height) - 12.0,
        label = escape_xml(x_label),
        my = MARGIN_TOP + size.plot_height() / 2.0,
    );
}

/// Candlestick chart; `None` when there is nothing to draw
pub fn render_ohlc(candles: &[Candle], title: &str, size: ChartSize) -> Option<String> {
    if candles.is_empty() {
        logger::warning(LogTag::Chart, "No candles to chart");
        return None;
    }
    if !candles.iter().any(Candle::has_prices) {
        logger::error(LogTag::Chart, "Every price is zero, nothing to chart");
        return None;
    }

    let scale = PriceScale::new(
        candles.iter().flat_map(|c| [c.open, c.high, c.low, c.close]),
        &size,
    )?;

    let mut svg = String::new();
    open_document(
        &mut svg,
        &size,
        title,
        &scale,
        &format!("Candles ({})", candles.len()),
    );

    let slot = size.plot_width() / candles.len() as f64;
    let body_width = (slot * 0.7).max(1.0);
    for (i, candle) in candles.iter().enumerate() {
        if !candle.has_prices() {
            continue;
        }
        let center = MARGIN_LEFT + slot * (i as f64 + 0.5);
        let color = if candle.close >= candle.open {
            UP_COLOR
        } else {
            DOWN_COLOR
        };
        let top = scale.y(candle.open.max(candle.close));
        let bottom = scale.y(candle.open.min(candle.close));
        let _ = writeln!(
            svg,
            r#"<line x1="{x:.2}" y1="{hi:.2}" x2="{x:.2}" y2="{lo:.2}" stroke="black" stroke-width="0.8" stroke-opacity="0.7"/><rect x="{bx:.2}" y="{top:.2}" width="{bw:.2}" height="{bh:.2}" fill="{color}"/>"#,
            x = center,
            hi = scale.y(candle.high),
            lo = scale.y(candle.low),
            bx = center - body_width / 2.0,
            top = top,
            bw = body_width,
            bh = (bottom - top).max(0.5),
            color = color,
        );
    }

    svg.push_str("</svg>\n");
    Some(svg)
}

/// Close-price line chart; `None` when there is nothing to draw
pub fn render_close(points: &[ClosePoint], title: &str, size: ChartSize) -> Option<String> {
    if points.is_empty() {
        logger::warning(LogTag::Chart, "No close prices to chart");
        return None;
    }
    if points.iter().all(|p| p.close == 0.0) {
        logger::error(LogTag::Chart, "Every close price is zero, nothing to chart");
        return None;
    }

    let scale = PriceScale::new(points.iter().map(|p| p.close), &size)?;

    let mut svg = String::new();
    open_document(
        &mut svg,
        &size,
        title,
        &scale,
        &format!("Records ({})", points.len()),
    );

    let step = if points.len() > 1 {
        size.plot_width() / (points.len() - 1) as f64
    } else {
        0.0
    };
    let coords: Vec<String> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.close > 0.0)
        .map(|(i, p)| format!("{:.2},{:.2}", MARGIN_LEFT + step * i as f64, scale.y(p.close)))
        .collect();
    let _ = writeln!(
        svg,
        r#"<polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
        LINE_COLOR,
        coords.join(" ")
    );

    svg.push_str("</svg>\n");
    Some(svg)
}

/// Store `svg` as `<prefix>_<uuid>.svg` in `dir`
pub async fn write_chart_in(dir: &Path, prefix: &str, svg: &str) -> BotResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}_{}.svg", prefix, uuid::Uuid::new_v4()));
    tokio::fs::write(&path, svg).await?;
    logger::info(LogTag::Chart, &format!("Chart saved: {}", path.display()));
    Ok(path)
}

/// Store `svg` in the charts directory
pub async fn write_chart(prefix: &str, svg: &str) -> BotResult<PathBuf> {
    write_chart_in(&paths::get_charts_directory(), prefix, svg).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: 0,
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn test_empty_and_zero_data_rejected() {
        assert!(render_ohlc(&[], "BTCUSDT", ChartSize::default()).is_none());
        assert!(render_ohlc(&[candle(0.0, 0.0, 0.0, 0.0)], "BTCUSDT", ChartSize::default()).is_none());
        assert!(render_close(&[], "BTCUSDT", ChartSize::default()).is_none());
        assert!(render_close(
            &[ClosePoint { timestamp: 0, close: 0.0 }],
            "BTCUSDT",
            ChartSize::default()
        )
        .is_none());
    }

    #[test]
    fn test_candles_drawn_with_direction_colors() {
        let svg = render_ohlc(
            &[candle(10.0, 12.0, 9.0, 11.0), candle(11.0, 11.5, 8.0, 9.0)],
            "BTC <test>",
            ChartSize::default(),
        )
        .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(UP_COLOR));
        assert!(svg.contains(DOWN_COLOR));
        assert!(svg.contains("BTC &lt;test&gt;"));
        assert_eq!(svg.matches("<rect x=").count(), 2);
    }

    #[test]
    fn test_flat_close_series_renders() {
        let points: Vec<ClosePoint> = (0..3)
            .map(|i| ClosePoint {
                timestamp: i,
                close: 5.0,
            })
            .collect();
        let svg = render_close(&points, "flat", ChartSize::default()).unwrap();
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn test_scale_maps_extremes_to_plot_edges() {
        let size = ChartSize::default();
        let scale = PriceScale::new([1.0, 3.0].into_iter(), &size).unwrap();
        assert_eq!(scale.y(3.0), MARGIN_TOP);
        assert_eq!(scale.y(1.0), MARGIN_TOP + size.plot_height());
    }

    #[tokio::test]
    async fn test_write_chart_unique_names() {
        let dir = tempdir().unwrap();
        let first = write_chart_in(dir.path(), "chart", "<svg/>").await.unwrap();
        let second = write_chart_in(dir.path(), "chart", "<svg/>").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(std::fs::read_to_string(first).unwrap(), "<svg/>");
    }
}
