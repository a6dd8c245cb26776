//! Stitch spectrograms from several sites into one day long spectrogram.

use super::{SpectralView, Spectrogram};
use crate::{errors::SrsDataErr, site::Site};
use chrono::{DateTime, NaiveDateTime};
use std::{cmp::Ordering, collections::BTreeMap, ops::Range};

/// Spacing of the combined time line, seconds.
const STEP_SECS: f64 = 10.0;
/// A sweep within this many seconds of a step can fill it.
const HALF_WINDOW_SECS: f64 = 5.0;
/// Channels compared when matching gains, 50-75 MHz. Above 100 MHz there is a lot of RFI.
const GAIN_MATCH_CHANNELS: Range<usize> = 200..401;

/// Several spectrograms merged onto a regular 10 second time line.
///
/// Steps with no data from any site hold NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct CombinedSpectrogram {
    sites: Vec<Site>,
    frequencies: Vec<f64>,
    times: Vec<f64>,
    sources: Vec<Option<usize>>,
    data: Vec<Vec<f64>>,
    adjustments: BTreeMap<usize, f64>,
}

impl CombinedSpectrogram {
    /// Sites of the inputs, in input order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// UNIX time of each step.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Time of each step as a date and time.
    pub fn datetimes(&self) -> Vec<NaiveDateTime> {
        self.times
            .iter()
            .filter_map(|&t| DateTime::from_timestamp(t as i64, 0))
            .map(|dt| dt.naive_utc())
            .collect()
    }

    /// Index of the input each step came from, `None` for gaps.
    pub fn sources(&self) -> &[Option<usize>] {
        &self.sources
    }

    /// Time by frequency matrix in dB.
    pub fn data(&self) -> &[Vec<f64>] {
        &self.data
    }

    /// Gain correction (dB) applied to each input by `rectify`, empty before then.
    pub fn adjustments(&self) -> &BTreeMap<usize, f64> {
        &self.adjustments
    }
}

impl SpectralView for CombinedSpectrogram {
    fn label(&self) -> String {
        self.sites
            .iter()
            .map(|site| site.name())
            .collect::<Vec<_>>()
            .join("+")
    }

    fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    fn timestamps(&self) -> Vec<f64> {
        self.times.clone()
    }

    fn intensity(&self, time_index: usize, channel: usize) -> f64 {
        self.data[time_index][channel]
    }
}

struct Candidate {
    time: f64,
    weight: f64,
    source: usize,
    index: usize,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        self.weight > other.weight
            || (self.weight == other.weight && (self.source, self.index) < (other.source, other.index))
    }
}

/// Merge spectrograms with a common frequency axis.
///
/// The time line runs from the earliest to the latest sweep in 10 second steps. Each step takes the
/// sweep within 5 seconds that is closest to the middle of its own spectrogram, as sites are
/// usually best calibrated around local noon.
pub fn combine(parts: &[Spectrogram]) -> Result<CombinedSpectrogram, SrsDataErr> {
    let first = parts.first().ok_or(SrsDataErr::NotEnoughData)?;
    let frequencies = first.frequencies();

    for srs in parts {
        let other = srs.frequencies();
        if other.len() != frequencies.len() {
            return Err(SrsDataErr::IncompatibleSpectrograms(
                "mismatched frequency axis",
            ));
        }
        if other[0] != frequencies[0] {
            return Err(SrsDataErr::IncompatibleSpectrograms(
                "mismatched frequency start",
            ));
        }
        if other[other.len() - 1] != frequencies[frequencies.len() - 1] {
            return Err(SrsDataErr::IncompatibleSpectrograms(
                "mismatched frequency stop",
            ));
        }
    }

    let mut candidates = vec![];
    for (source, srs) in parts.iter().enumerate() {
        let times = srs.timestamps();
        let middle = times[times.len() / 2];

        candidates.extend(times.iter().enumerate().map(|(index, &time)| Candidate {
            time,
            weight: 1.0 - (time - middle).abs() / 86_400.0,
            source,
            index,
        }));
    }
    candidates.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));

    let start = candidates[0].time;
    let end = candidates[candidates.len() - 1].time;
    let num_steps = ((end - start) / STEP_SECS).floor() as usize + 1;

    let mut times = Vec::with_capacity(num_steps);
    let mut sources = Vec::with_capacity(num_steps);
    let mut data = Vec::with_capacity(num_steps);

    for step in 0..num_steps {
        let t = start + STEP_SECS * step as f64;

        let lo = candidates.partition_point(|c| c.time <= t - HALF_WINDOW_SECS);
        let hi = candidates.partition_point(|c| c.time < t + HALF_WINDOW_SECS);

        let best = candidates[lo..hi].iter().fold(None, |best: Option<&Candidate>, c| {
            match best {
                Some(b) if !c.beats(b) => Some(b),
                _ => Some(c),
            }
        });

        match best.and_then(|c| parts[c.source].spectrum(c.index).map(|s| (c, s))) {
            Some((c, spectrum)) => {
                times.push(c.time);
                sources.push(Some(c.source));
                data.push(spectrum);
            }
            None => {
                times.push(t);
                sources.push(None);
                data.push(vec![f64::NAN; frequencies.len()]);
            }
        }
    }

    Ok(CombinedSpectrogram {
        sites: parts.iter().map(Spectrogram::site).collect(),
        frequencies: frequencies.to_vec(),
        times,
        sources,
        data,
        adjustments: BTreeMap::new(),
    })
}

/// Remove gain differences between the sites in a combined spectrogram.
///
/// Where one input hands over to another, the median power over 50-75 MHz on either side of the
/// hand over is matched. Starting from a reference input, the correction spreads to neighbours
/// until every input is adjusted.
pub fn rectify(combined: &CombinedSpectrogram) -> Result<CombinedSpectrogram, SrsDataErr> {
    let sources = &combined.sources;

    let mut unique: Vec<usize> = sources.iter().flatten().copied().collect();
    unique.sort_unstable();
    unique.dedup();

    if unique.is_empty() {
        return Err(SrsDataErr::NotEnoughData);
    }

    let reference = sources
        .windows(2)
        .find_map(|pair| match pair[0] {
            Some(src) if pair[1] != pair[0] => Some(src),
            _ => None,
        })
        .unwrap_or(unique[0]);

    let mut data = combined.data.clone();
    let mut adjustments = BTreeMap::new();
    adjustments.insert(reference, 0.0);

    let mut attempts = 0;
    while adjustments.len() < unique.len() {
        attempts += 1;
        if attempts > 5 * unique.len() {
            return Err(SrsDataErr::RectifyFailed(attempts));
        }

        for &src in &unique {
            if adjustments.contains_key(&src) {
                continue;
            }

            let adjusted = |i: usize| matches!(sources[i], Some(s) if adjustments.contains_key(&s));

            let first = sources.iter().position(|&s| s == Some(src));
            let last = sources.iter().rposition(|&s| s == Some(src));
            let (first, last) = match (first, last) {
                (Some(first), Some(last)) => (first, last),
                _ => return Err(SrsDataErr::LogicError("source without spectra")),
            };

            let shift = if first > 0 && adjusted(first - 1) {
                Some(gain_level(&data[first - 1]) - gain_level(&data[first]))
            } else if last + 1 < sources.len() && adjusted(last + 1) {
                Some(gain_level(&data[last + 1]) - gain_level(&data[last]))
            } else {
                None
            };

            if let Some(shift) = shift {
                for (row, _) in data
                    .iter_mut()
                    .zip(sources.iter())
                    .filter(|(_, s)| **s == Some(src))
                {
                    row.iter_mut().for_each(|val| *val += shift);
                }
                adjustments.insert(src, shift);
            }
        }
    }

    Ok(CombinedSpectrogram {
        data,
        adjustments,
        ..combined.clone()
    })
}

fn gain_level(spectrum: &[f64]) -> f64 {
    median(&spectrum[GAIN_MATCH_CHANNELS])
}

fn median(vals: &[f64]) -> f64 {
    let mut sorted = vals.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let n = sorted.len();
    if n == 0 {
        f64::NAN
    } else if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
