//! Render spectrograms as time-frequency images.

use crate::{errors::SrsDataErr, srs::SpectralView};
use ab_glyph::FontRef;
use chrono::DateTime;
use colorous::Gradient;
use image::{imageops, ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size},
    rect::Rect,
};
use std::{cmp::Ordering, path::Path};

const MARGIN: u32 = 10;
const PANEL_GAP: u32 = 10;
const TITLE_HEIGHT: u32 = 20;
const LEFT_AXIS: u32 = 56;
const BOTTOM_AXIS: u32 = 36;
const COLORBAR_WIDTH: u32 = 15;
const COLORBAR_AXIS: u32 = 56;
const TICK_LEN: u32 = 4;
const TICK_SCALE: f32 = 12.0;
const LABEL_SCALE: f32 = 14.0;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);
/// Above this many values the colour limits are estimated from an even subsample.
const MAX_SCALE_SAMPLES: usize = 2_000_000;
/// Candidate spacings of the time ticks, seconds.
const TIME_STEPS: [i64; 18] = [
    1, 2, 5, 10, 15, 30, 60, 120, 300, 600, 900, 1800, 3600, 7200, 10800, 21600, 43200, 86400,
];

static FONT_DATA: &[u8] = include_bytes!("plot/DejaVuSans.ttf");

/// Colour maps available for intensity.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, EnumString, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ColorMap {
    /// Perceptually uniform blue-green-yellow.
    Viridis,
    /// Blue-yellow, friendly to colour blind readers.
    Cividis,
    /// Black-red-yellow.
    Inferno,
    /// Black-purple-cream.
    Magma,
    /// Blue-purple-yellow.
    Plasma,
    /// White to black.
    Greys,
}

impl ColorMap {
    fn gradient(self) -> Gradient {
        match self {
            ColorMap::Viridis => colorous::VIRIDIS,
            ColorMap::Cividis => colorous::CIVIDIS,
            ColorMap::Inferno => colorous::INFERNO,
            ColorMap::Magma => colorous::MAGMA,
            ColorMap::Plasma => colorous::PLASMA,
            ColorMap::Greys => colorous::GREYS,
        }
    }

    fn color(self, fraction: f64) -> Rgb<u8> {
        let c = self.gradient().eval_continuous(fraction.clamp(0.0, 1.0));
        Rgb([c.r, c.g, c.b])
    }
}

/// How intensity maps onto the colour map.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ColorScale {
    /// Fixed limits in dB.
    Fixed {
        /// Power at the bottom of the colour map.
        vmin: f64,
        /// Power at the top of the colour map.
        vmax: f64,
    },
    /// Limits at percentiles (0-100) of the finite data.
    Percentile {
        /// Percentile at the bottom of the colour map.
        low: f64,
        /// Percentile at the top of the colour map.
        high: f64,
    },
}

impl Default for ColorScale {
    fn default() -> Self {
        ColorScale::Percentile {
            low: 5.0,
            high: 95.0,
        }
    }
}

/// Options for `plot_srs` and `plot_stack`.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotOptions {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Colour map for intensity.
    pub colormap: ColorMap,
    /// Colour limits.
    pub scale: ColorScale,
    /// Time axis limits as UNIX seconds, the data's span if `None`.
    pub time_limits: Option<(f64, f64)>,
    /// Frequency axis limits in MHz, the data's span if `None`.
    pub freq_limits: Option<(f64, f64)>,
    /// Draw a colour bar right of each panel.
    pub colorbar: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            width: 1200,
            height: 400,
            colormap: ColorMap::Viridis,
            scale: ColorScale::default(),
            time_limits: None,
            freq_limits: None,
            colorbar: true,
        }
    }
}

impl PlotOptions {
    /// Same options with fixed colour limits.
    pub fn with_limits(self, vmin: f64, vmax: f64) -> Self {
        PlotOptions {
            scale: ColorScale::Fixed { vmin, vmax },
            ..self
        }
    }

    /// Same options with the image height that gives each of `num_panels` panels
    /// `panel_height` rows of data.
    pub fn with_panel_height(self, num_panels: u32, panel_height: u32) -> Self {
        let num_panels = num_panels.max(1);
        let height = 2 * MARGIN
            + BOTTOM_AXIS
            + num_panels * (TITLE_HEIGHT + panel_height)
            + (num_panels - 1) * PANEL_GAP;

        PlotOptions { height, ..self }
    }
}

/// One spectrogram panel of a figure.
#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    /// `"{site} @ {YYYY-MM-DD}"`.
    pub title: String,
    /// Label of the frequency axis.
    pub y_label: String,
    /// Frequency axis limits, MHz, bottom then top.
    pub freq_extent: (f64, f64),
    /// Power at the bottom of the colour map, dB.
    pub vmin: f64,
    /// Power at the top of the colour map, dB.
    pub vmax: f64,
    /// First pixel column of the data area.
    pub left: u32,
    /// First pixel row of the data area.
    pub top: u32,
    /// Width of the data area in pixels.
    pub width: u32,
    /// Height of the data area in pixels.
    pub height: u32,
}

/// A rendered plot and the annotations that go with it.
#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    /// The pixels.
    pub image: RgbImage,
    /// Label of the shared time axis.
    pub x_label: String,
    /// Label of the colour bars.
    pub colorbar_label: String,
    /// Time axis limits as UNIX seconds.
    pub time_extent: (f64, f64),
    /// Panels from top to bottom.
    pub panels: Vec<Panel>,
}

impl Figure {
    /// Title of the top panel.
    pub fn title(&self) -> &str {
        self.panels
            .first()
            .map(|panel| panel.title.as_str())
            .unwrap_or("")
    }

    /// Colour limits of the top panel.
    pub fn color_limits(&self) -> Option<(f64, f64)> {
        self.panels.first().map(|panel| (panel.vmin, panel.vmax))
    }

    /// Write the image as a PNG.
    pub fn save(&self, path: &dyn AsRef<Path>) -> Result<(), SrsDataErr> {
        self.image.save_with_format(path.as_ref(), ImageFormat::Png)?;
        Ok(())
    }
}

/// Plot one spectrogram, time on the x axis and frequency increasing upward.
///
/// Nothing is written to disk; see [`Figure::save`].
pub fn plot_srs(data: &dyn SpectralView, options: &PlotOptions) -> Result<Figure, SrsDataErr> {
    plot_stack(&[data], options)
}

/// Plot several spectrograms in panels stacked top to bottom, sharing the time axis.
///
/// Each panel carries its title above it and a frequency axis on its left. Only the bottom
/// panel labels the time axis.
pub fn plot_stack(
    views: &[&dyn SpectralView],
    options: &PlotOptions,
) -> Result<Figure, SrsDataErr> {
    if views.is_empty() {
        return Err(SrsDataErr::NotEnoughData);
    }

    for view in views {
        if view.frequencies().is_empty() || view.timestamps().is_empty() {
            return Err(SrsDataErr::NotEnoughData);
        }
    }

    let font = FontRef::try_from_slice(FONT_DATA)
        .map_err(|_| SrsDataErr::LogicError("bundled font is invalid"))?;

    let bar_space = if options.colorbar {
        PANEL_GAP + COLORBAR_WIDTH + COLORBAR_AXIS
    } else {
        0
    };
    let num_panels = views.len() as u32;

    let plot_width = options
        .width
        .checked_sub(2 * MARGIN + LEFT_AXIS + bar_space)
        .filter(|&w| w > 0)
        .ok_or(SrsDataErr::LogicError("image too narrow to plot"))?;
    let panel_height = options
        .height
        .checked_sub(
            2 * MARGIN + BOTTOM_AXIS + num_panels * TITLE_HEIGHT + (num_panels - 1) * PANEL_GAP,
        )
        .map(|h| h / num_panels)
        .filter(|&h| h > 0)
        .ok_or(SrsDataErr::LogicError("image too short to plot"))?;

    let time_extent = match options.time_limits {
        Some(limits) => limits,
        None => {
            let (start, end) = views
                .iter()
                .map(|view| {
                    let times = view.timestamps();
                    (times[0], times[times.len() - 1])
                })
                .fold((f64::INFINITY, f64::NEG_INFINITY), |acc, (s, e)| {
                    (acc.0.min(s), acc.1.max(e))
                });
            if end > start {
                (start, end)
            } else {
                (start - 0.5, start + 0.5)
            }
        }
    };

    let mut image = RgbImage::from_pixel(options.width, options.height, BACKGROUND);
    let mut panels = Vec::with_capacity(views.len());

    for (i, view) in views.iter().enumerate() {
        let top = MARGIN + TITLE_HEIGHT + i as u32 * (TITLE_HEIGHT + panel_height + PANEL_GAP);
        let area = Area {
            left: MARGIN + LEFT_AXIS,
            top,
            width: plot_width,
            height: panel_height,
        };

        let panel = draw_panel(&mut image, *view, options, area, time_extent)?;

        draw_title(&mut image, &font, &panel.title, area);
        draw_frame(&mut image, area);
        draw_value_ticks(&mut image, &font, area, panel.freq_extent, Side::Left);
        draw_vertical_label(&mut image, &font, &panel.y_label, MARGIN, area);

        let bottom_panel = i + 1 == views.len();
        draw_time_axis(&mut image, &font, area, time_extent, bottom_panel);

        if options.colorbar {
            let bar = Area {
                left: area.right() + PANEL_GAP,
                top,
                width: COLORBAR_WIDTH,
                height: panel_height,
            };
            draw_colorbar(&mut image, options.colormap, bar);
            draw_frame(&mut image, bar);
            draw_value_ticks(&mut image, &font, bar, (panel.vmin, panel.vmax), Side::Right);
            draw_vertical_label(
                &mut image,
                &font,
                "PSD [dB]",
                bar.right() + COLORBAR_AXIS - 18,
                bar,
            );
        }

        panels.push(panel);
    }

    Ok(Figure {
        image,
        x_label: "UTC Time".to_owned(),
        colorbar_label: "PSD [dB]".to_owned(),
        time_extent,
        panels,
    })
}

#[derive(Clone, Copy, Debug)]
struct Area {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
}

impl Area {
    fn right(&self) -> u32 {
        self.left + self.width
    }

    fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

fn draw_panel(
    image: &mut RgbImage,
    view: &dyn SpectralView,
    options: &PlotOptions,
    area: Area,
    (t0, t1): (f64, f64),
) -> Result<Panel, SrsDataErr> {
    let times = view.timestamps();
    let freqs = view.frequencies();

    let (f0, f1) = options
        .freq_limits
        .unwrap_or((freqs[0] / 1.0e6, freqs[freqs.len() - 1] / 1.0e6));
    let (vmin, vmax) = color_limits(view, options.scale)?;
    let span = if vmax > vmin { vmax - vmin } else { 1.0 };

    // Columns further than this from any sweep are left blank.
    let secs_per_px = (t1 - t0) / f64::from(area.width);
    let reach = median_step(&times).max(secs_per_px / 2.0);

    let columns: Vec<Option<usize>> = (0..area.width)
        .map(|px| {
            let t = t0 + (f64::from(px) + 0.5) * secs_per_px;
            nearest(&times, t).filter(|&i| (times[i] - t).abs() <= reach)
        })
        .collect();

    let (lo_hz, hi_hz) = (freqs[0], freqs[freqs.len() - 1]);
    let rows: Vec<Option<usize>> = (0..area.height)
        .map(|py| {
            let f = (f1 - (f64::from(py) + 0.5) / f64::from(area.height) * (f1 - f0)) * 1.0e6;
            if f < lo_hz || f > hi_hz {
                None
            } else {
                nearest(freqs, f)
            }
        })
        .collect();

    for (py, row) in rows.iter().enumerate() {
        for (px, col) in columns.iter().enumerate() {
            let pixel = match (col, row) {
                (Some(ti), Some(ch)) => {
                    let val = view.intensity(*ti, *ch);
                    if val.is_finite() {
                        options.colormap.color((val - vmin) / span)
                    } else {
                        BACKGROUND
                    }
                }
                _ => BACKGROUND,
            };

            image.put_pixel(area.left + px as u32, area.top + py as u32, pixel);
        }
    }

    Ok(Panel {
        title: title(view, &times),
        y_label: "Frequency [MHz]".to_owned(),
        freq_extent: (f0, f1),
        vmin,
        vmax,
        left: area.left,
        top: area.top,
        width: area.width,
        height: area.height,
    })
}

fn draw_colorbar(image: &mut RgbImage, colormap: ColorMap, area: Area) {
    let last = f64::from(area.height.saturating_sub(1).max(1));

    for py in 0..area.height {
        let pixel = colormap.color(1.0 - f64::from(py) / last);
        for px in 0..area.width {
            image.put_pixel(area.left + px, area.top + py, pixel);
        }
    }
}

fn draw_title(image: &mut RgbImage, font: &FontRef, text: &str, area: Area) {
    let (w, _) = text_size(LABEL_SCALE, font, text);
    let x = area.left as i32 + (area.width as i32 - w as i32) / 2;
    let y = (area.top - TITLE_HEIGHT + 2) as i32;

    draw_text_mut(image, INK, x.max(0), y, LABEL_SCALE, font, text);
}

/// Outline one pixel outside the area.
fn draw_frame(image: &mut RgbImage, area: Area) {
    let rect = Rect::at(area.left as i32 - 1, area.top as i32 - 1)
        .of_size(area.width + 2, area.height + 2);
    draw_hollow_rect_mut(image, rect, INK);
}

/// Text reading bottom to top, centred on the area's rows, starting at column `left`.
fn draw_vertical_label(image: &mut RgbImage, font: &FontRef, text: &str, left: u32, area: Area) {
    let (w, h) = text_size(LABEL_SCALE, font, text);
    if w == 0 || h == 0 {
        return;
    }

    let mut strip = RgbImage::from_pixel(w, h + 2, BACKGROUND);
    draw_text_mut(&mut strip, INK, 0, 0, LABEL_SCALE, font, text);
    let strip = imageops::rotate270(&strip);

    let top = i64::from(area.top) + (i64::from(area.height) - i64::from(w)) / 2;
    imageops::overlay(image, &strip, i64::from(left), top.max(0));
}

/// Ticks and labels for a vertical axis running from `bottom` at the area's last row to
/// `top` at its first.
fn draw_value_ticks(
    image: &mut RgbImage,
    font: &FontRef,
    area: Area,
    (bottom, top): (f64, f64),
    side: Side,
) {
    let span = top - bottom;
    if !span.is_finite() || span == 0.0 {
        return;
    }

    let step = nice_step(span.abs(), 5);
    let (lo, hi) = (bottom.min(top), bottom.max(top));
    let first = (lo / step).ceil() as i64;
    let last = (hi / step + 1.0e-9).floor() as i64;

    for k in first..=last {
        let val = k as f64 * step;
        let y = area.top as f32 + ((top - val) / span * f64::from(area.height)) as f32;

        let label = if step >= 1.0 {
            format!("{:.0}", val)
        } else {
            format!("{:.1}", val)
        };
        let (w, h) = text_size(TICK_SCALE, font, &label);
        let text_y = y as i32 - h as i32 / 2;

        match side {
            Side::Left => {
                let edge = area.left as f32 - 1.0;
                draw_line_segment_mut(image, (edge - TICK_LEN as f32, y), (edge, y), INK);
                let x = area.left as i32 - 1 - TICK_LEN as i32 - 3 - w as i32;
                draw_text_mut(image, INK, x, text_y, TICK_SCALE, font, &label);
            }
            Side::Right => {
                let edge = area.right() as f32;
                draw_line_segment_mut(image, (edge, y), (edge + TICK_LEN as f32, y), INK);
                let x = (area.right() + TICK_LEN + 3) as i32;
                draw_text_mut(image, INK, x, text_y, TICK_SCALE, font, &label);
            }
        }
    }
}

/// Tick marks under the area, with `HH:MM` labels and the axis title when `labelled`.
fn draw_time_axis(
    image: &mut RgbImage,
    font: &FontRef,
    area: Area,
    (t0, t1): (f64, f64),
    labelled: bool,
) {
    let span = t1 - t0;
    if !span.is_finite() || span <= 0.0 {
        return;
    }

    let step = time_step(span, (area.width / 70).max(1));
    let first = (t0 / step as f64).ceil() as i64 * step;
    let last = t1.floor() as i64;
    let format = if step < 60 { "%H:%M:%S" } else { "%H:%M" };
    let edge = area.bottom() as f32;
    let label_y = (area.bottom() + TICK_LEN + 2) as i32;

    for t in (first..=last).step_by(step as usize) {
        let x = area.left as f32 + ((t as f64 - t0) / span * f64::from(area.width)) as f32;
        draw_line_segment_mut(image, (x, edge), (x, edge + TICK_LEN as f32), INK);

        if !labelled {
            continue;
        }

        if let Some(dt) = DateTime::from_timestamp(t, 0) {
            let label = dt.format(format).to_string();
            let (w, _) = text_size(TICK_SCALE, font, &label);
            let x = x as i32 - w as i32 / 2;
            draw_text_mut(image, INK, x, label_y, TICK_SCALE, font, &label);
        }
    }

    if labelled {
        let text = "UTC Time";
        let (w, _) = text_size(LABEL_SCALE, font, text);
        let x = area.left as i32 + (area.width as i32 - w as i32) / 2;
        draw_text_mut(image, INK, x, label_y + 14, LABEL_SCALE, font, text);
    }
}

/// 1, 2 or 5 times a power of ten, giving at most about `max_ticks` ticks over `span`.
fn nice_step(span: f64, max_ticks: u32) -> f64 {
    let raw = span / f64::from(max_ticks.max(1));
    let magnitude = 10f64.powf(raw.log10().floor());

    [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|&step| step >= raw)
        .unwrap_or(10.0 * magnitude)
}

/// Seconds between time ticks, the first candidate giving at most `max_ticks` over `span`.
fn time_step(span: f64, max_ticks: u32) -> i64 {
    TIME_STEPS
        .iter()
        .copied()
        .find(|&step| span / step as f64 <= f64::from(max_ticks))
        .unwrap_or(TIME_STEPS[TIME_STEPS.len() - 1])
}

fn title(view: &dyn SpectralView, times: &[f64]) -> String {
    let middle = times[times.len() / 2];
    let date = DateTime::from_timestamp(middle as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    format!("{} @ {}", view.label(), date)
}

fn color_limits(view: &dyn SpectralView, scale: ColorScale) -> Result<(f64, f64), SrsDataErr> {
    match scale {
        ColorScale::Fixed { vmin, vmax } => Ok((vmin, vmax)),
        ColorScale::Percentile { low, high } => {
            if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low > high {
                return Err(SrsDataErr::LogicError("percentiles must be 0-100, low to high"));
            }

            let mut vals = finite_values(view);
            vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

            match (percentile(&vals, low), percentile(&vals, high)) {
                (Some(vmin), Some(vmax)) => Ok((vmin, vmax)),
                _ => Ok((0.0, 1.0)),
            }
        }
    }
}

fn finite_values(view: &dyn SpectralView) -> Vec<f64> {
    let num_times = view.timestamps().len();
    let num_channels = view.frequencies().len();
    let total = num_times * num_channels;
    let stride = (total / MAX_SCALE_SAMPLES).max(1);

    (0..total)
        .step_by(stride)
        .map(|k| view.intensity(k / num_channels, k % num_channels))
        .filter(|val| val.is_finite())
        .collect()
}

/// Percentile of sorted values, interpolating linearly between ranks.
fn percentile(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let below = rank.floor() as usize;
    let above = rank.ceil() as usize;
    let frac = rank - below as f64;

    Some(sorted[below] + (sorted[above] - sorted[below]) * frac)
}

fn median_step(times: &[f64]) -> f64 {
    let mut steps: Vec<f64> = times.windows(2).map(|pair| pair[1] - pair[0]).collect();
    if steps.is_empty() {
        return 0.0;
    }

    steps.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    steps[steps.len() / 2]
}

/// Index of the value closest to `x` in an ascending slice.
fn nearest(sorted: &[f64], x: f64) -> Option<usize> {
    if sorted.is_empty() {
        return None;
    }

    let i = sorted.partition_point(|&v| v < x);
    if i == 0 {
        Some(0)
    } else if i == sorted.len() {
        Some(i - 1)
    } else if x - sorted[i - 1] <= sorted[i] - x {
        Some(i - 1)
    } else {
        Some(i)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
