//! Parsed solar radio spectrograph data.

use crate::{
    dates::Mjd,
    errors::{FormatErr, SrsDataErr},
    site::Site,
};
use chrono::{NaiveDate, NaiveDateTime};
use flate2::{read::MultiGzDecoder, write::GzEncoder, Compression};
use std::{
    io::{Read, Write},
    path::Path,
};

mod combine;
mod record;

pub use combine::{combine, rectify, CombinedSpectrogram};
pub use record::{BandHeader, Sweep, CHANNELS_PER_BAND, NUM_BANDS, RECORD_LEN};

/// Anything with intensity laid out on a time by frequency grid, ready to plot.
pub trait SpectralView {
    /// Name for titles, usually the site.
    fn label(&self) -> String;
    /// Channel frequencies in Hz, ascending.
    fn frequencies(&self) -> &[f64];
    /// UNIX time of each spectrum, in seconds, non-decreasing.
    fn timestamps(&self) -> Vec<f64>;
    /// Power in dB for a spectrum and channel, NaN where there is no data.
    fn intensity(&self, time_index: usize, channel: usize) -> f64;
}

/// One file of SRS data: a day of sweeps from a single site.
///
/// There is always at least one sweep. All sweeps share the station and the band layout, and they
/// are in time order.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrogram {
    site: Site,
    bands: [BandHeader; NUM_BANDS],
    frequencies: Vec<f64>,
    sweeps: Vec<Sweep>,
}

impl Spectrogram {
    /// Start a spectrogram from its first sweep.
    pub fn new(first: Sweep) -> Self {
        let bands = *first.bands();
        let frequencies = bands.iter().flat_map(|band| band.frequencies()).collect();

        Spectrogram {
            site: first.site(),
            bands,
            frequencies,
            sweeps: vec![first],
        }
    }

    /// Append a sweep, enforcing the same station, the same frequency axis, and time order.
    pub fn push(&mut self, sweep: Sweep) -> Result<(), SrsDataErr> {
        let offset = self.sweeps.len() * RECORD_LEN;

        if sweep.site() != self.site {
            return Err(FormatErr::StationMismatch { offset }.into());
        }

        if !sweep
            .bands()
            .iter()
            .zip(self.bands.iter())
            .all(|(a, b)| a.same_axis(b))
        {
            return Err(FormatErr::FrequencyMismatch { offset }.into());
        }

        if let Some(last) = self.sweeps.last() {
            if sweep.time() < last.time() {
                return Err(FormatErr::TimeReversal { offset }.into());
            }
        }

        self.sweeps.push(sweep);
        Ok(())
    }

    /// Load a file, gzip'd or not.
    pub fn from_file(path: &dyn AsRef<Path>) -> Result<Self, SrsDataErr> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Decode from a reader, gzip'd or not.
    pub fn from_reader(mut rdr: impl Read) -> Result<Self, SrsDataErr> {
        let mut data = vec![];
        rdr.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Decode from bytes, detecting gzip by its magic number.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SrsDataErr> {
        if is_gzip(data) {
            let raw = gunzip(data)?;
            Self::decode(&raw)
        } else {
            Self::decode(data)
        }
    }

    fn decode(data: &[u8]) -> Result<Self, SrsDataErr> {
        if data.is_empty() {
            return Err(FormatErr::Empty.into());
        }

        let mut srs: Option<Spectrogram> = None;
        let mut offset = 0;

        while offset < data.len() {
            let remaining = data.len() - offset;
            if remaining < RECORD_LEN {
                return Err(FormatErr::Truncated { offset, remaining }.into());
            }

            let sweep = Sweep::decode(data, offset)?;
            match srs.as_mut() {
                Some(srs) => srs.push(sweep)?,
                None => srs = Some(Spectrogram::new(sweep)),
            }

            offset += RECORD_LEN;
        }

        srs.ok_or_else(|| FormatErr::Empty.into())
    }

    /// Serialize in the original record layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.sweeps.len() * RECORD_LEN);
        for sweep in &self.sweeps {
            sweep.encode(&mut out);
        }
        out
    }

    /// Write the records, uncompressed.
    pub fn write_to(&self, writer: &mut dyn Write) -> Result<(), SrsDataErr> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Save to a file, gzip'd if the path ends in `.gz`.
    pub fn save(&self, path: &dyn AsRef<Path>) -> Result<(), SrsDataErr> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;

        let compress = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        if compress {
            let mut encoder = GzEncoder::new(file, Compression::default());
            self.write_to(&mut encoder)?;
            encoder.finish()?;
        } else {
            let mut file = file;
            self.write_to(&mut file)?;
        }

        Ok(())
    }

    /// The observing site.
    pub fn site(&self) -> Site {
        self.site
    }

    /// The UTC observing day, taken from the middle sweep.
    ///
    /// Western sites begin their day before 00 UTC, so the first sweep can fall on the day
    /// before the one the file belongs to.
    pub fn date(&self) -> NaiveDate {
        self.sweeps[self.sweeps.len() / 2].time().date()
    }

    /// Band layout shared by every sweep.
    pub fn bands(&self) -> &[BandHeader; NUM_BANDS] {
        &self.bands
    }

    /// All the sweeps in time order.
    pub fn sweeps(&self) -> &[Sweep] {
        &self.sweeps
    }

    /// Number of sweeps, never zero.
    pub fn num_sweeps(&self) -> usize {
        self.sweeps.len()
    }

    /// Time of the first sweep.
    pub fn first_time(&self) -> NaiveDateTime {
        self.sweeps[0].time()
    }

    /// Time of the last sweep.
    pub fn last_time(&self) -> NaiveDateTime {
        self.sweeps[self.sweeps.len() - 1].time()
    }

    /// Sweep times.
    pub fn times(&self) -> Vec<NaiveDateTime> {
        self.sweeps.iter().map(Sweep::time).collect()
    }

    /// Sweep times as Modified Julian Dates.
    pub fn mjds(&self) -> Vec<Mjd> {
        self.sweeps
            .iter()
            .map(|sweep| Mjd::from_datetime(&sweep.time()))
            .collect()
    }

    /// The calibrated spectrum of one sweep.
    pub fn spectrum(&self, index: usize) -> Option<Vec<f64>> {
        self.sweeps.get(index).map(Sweep::spectrum)
    }

    /// The full time by frequency matrix of calibrated power.
    pub fn data(&self) -> Vec<Vec<f64>> {
        self.sweeps.iter().map(Sweep::spectrum).collect()
    }
}

impl SpectralView for Spectrogram {
    fn label(&self) -> String {
        self.site.to_string()
    }

    fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    fn timestamps(&self) -> Vec<f64> {
        self.sweeps
            .iter()
            .map(|sweep| sweep.time().and_utc().timestamp() as f64)
            .collect()
    }

    fn intensity(&self, time_index: usize, channel: usize) -> f64 {
        // Gains are per sweep.
        let sweep = &self.sweeps[time_index];
        let band = channel / CHANNELS_PER_BAND;

        f64::from(sweep.raw()[channel]) + sweep.bands()[band].offset()
    }
}

pub(crate) fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

pub(crate) fn gunzip(data: &[u8]) -> Result<Vec<u8>, SrsDataErr> {
    let mut decoder = MultiGzDecoder::new(data);
    let mut raw = vec![];
    decoder
        .read_to_end(&mut raw)
        .map_err(|err| FormatErr::Compression(err.to_string()))?;
    Ok(raw)
}

pub(crate) fn gzip(data: &[u8]) -> Result<Vec<u8>, SrsDataErr> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Load an SRS file, gzip'd or not.
pub fn load_srs_data(path: &dyn AsRef<Path>) -> Result<Spectrogram, SrsDataErr> {
    Spectrogram::from_file(path)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
