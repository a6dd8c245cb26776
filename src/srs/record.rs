//! The fixed layout of an RSTN SRS record.
//!
//! Each record is 826 bytes: a 24 byte big-endian header followed by 401 one-byte samples for each
//! of two bands. Band A normally covers 25-75 MHz and band B 75-180 MHz.

use crate::{
    errors::{FormatErr, SrsDataErr},
    site::Site,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Size of the record header in bytes.
pub const HEADER_LEN: usize = 24;
/// Samples in each band.
pub const CHANNELS_PER_BAND: usize = 401;
/// Number of bands in a record.
pub const NUM_BANDS: usize = 2;
/// Size of a full record in bytes.
pub const RECORD_LEN: usize = HEADER_LEN + NUM_BANDS * CHANNELS_PER_BAND;

/// Settings for one band of a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandHeader {
    /// Lowest frequency, MHz.
    pub start_mhz: u16,
    /// Highest frequency, MHz.
    pub end_mhz: u16,
    /// Number of channels, always 401 in valid data.
    pub channels: u16,
    /// Reference level, dB.
    pub reference: u8,
    /// Attenuator setting, dB.
    pub attenuator: u8,
}

impl BandHeader {
    /// A band with 401 channels and no reference or attenuator offset.
    pub fn new(start_mhz: u16, end_mhz: u16) -> Self {
        BandHeader {
            start_mhz,
            end_mhz,
            channels: CHANNELS_PER_BAND as u16,
            reference: 0,
            attenuator: 0,
        }
    }

    /// Same band with the given reference level and attenuator setting.
    pub fn with_gain(self, reference: u8, attenuator: u8) -> Self {
        BandHeader {
            reference,
            attenuator,
            ..self
        }
    }

    /// True if the two bands sample the same frequencies.
    pub fn same_axis(&self, other: &BandHeader) -> bool {
        self.start_mhz == other.start_mhz
            && self.end_mhz == other.end_mhz
            && self.channels == other.channels
    }

    /// Channel frequencies in Hz, evenly spaced from start to end inclusive.
    pub fn frequencies(&self) -> impl Iterator<Item = f64> {
        let start = f64::from(self.start_mhz);
        let span = f64::from(self.end_mhz) - start;
        let last = f64::from(self.channels.saturating_sub(1).max(1));

        (0..self.channels).map(move |i| (start + span * f64::from(i) / last) * 1.0e6)
    }

    /// Added to each raw sample to get calibrated power in dB.
    pub fn offset(&self) -> f64 {
        f64::from(self.reference) + f64::from(self.attenuator)
    }

    fn decode(bytes: &[u8]) -> Self {
        BandHeader {
            start_mhz: u16::from_be_bytes([bytes[0], bytes[1]]),
            end_mhz: u16::from_be_bytes([bytes[2], bytes[3]]),
            channels: u16::from_be_bytes([bytes[4], bytes[5]]),
            reference: bytes[6],
            attenuator: bytes[7],
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.start_mhz.to_be_bytes());
        out.extend_from_slice(&self.end_mhz.to_be_bytes());
        out.extend_from_slice(&self.channels.to_be_bytes());
        out.push(self.reference);
        out.push(self.attenuator);
    }
}

/// One record: a full spectrum over both bands at a single time.
#[derive(Clone, Debug, PartialEq)]
pub struct Sweep {
    time: NaiveDateTime,
    site: Site,
    num_bands: u8,
    bands: [BandHeader; NUM_BANDS],
    samples: Vec<u8>,
}

impl Sweep {
    /// Build a sweep from raw samples, band A followed by band B.
    pub fn new(
        time: NaiveDateTime,
        site: Site,
        bands: [BandHeader; NUM_BANDS],
        samples: Vec<u8>,
    ) -> Result<Self, SrsDataErr> {
        if !(1951..=2050).contains(&time.year()) {
            return Err(SrsDataErr::LogicError("SRS years must be in 1951-2050"));
        }

        if bands
            .iter()
            .any(|band| usize::from(band.channels) != CHANNELS_PER_BAND)
        {
            return Err(SrsDataErr::LogicError("SRS bands have 401 channels"));
        }

        if samples.len() != NUM_BANDS * CHANNELS_PER_BAND {
            return Err(SrsDataErr::LogicError("SRS sweeps have 802 samples"));
        }

        Ok(Sweep {
            time,
            site,
            num_bands: NUM_BANDS as u8,
            bands,
            samples,
        })
    }

    /// Time of the sweep, UTC, whole seconds.
    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    /// The station that recorded it.
    pub fn site(&self) -> Site {
        self.site
    }

    /// Band settings, A then B.
    pub fn bands(&self) -> &[BandHeader; NUM_BANDS] {
        &self.bands
    }

    /// Uncalibrated samples, A then B.
    pub fn raw(&self) -> &[u8] {
        &self.samples
    }

    /// Calibrated power in dB, one value per channel.
    pub fn spectrum(&self) -> Vec<f64> {
        self.samples
            .chunks(CHANNELS_PER_BAND)
            .zip(self.bands.iter())
            .flat_map(|(samples, band)| {
                let offset = band.offset();
                samples.iter().map(move |&s| f64::from(s) + offset)
            })
            .collect()
    }

    /// Decode the record starting at `offset`. The caller guarantees `RECORD_LEN` bytes are there.
    pub(crate) fn decode(buf: &[u8], offset: usize) -> Result<Self, FormatErr> {
        debug_assert!(buf.len() >= offset + RECORD_LEN);

        let header = &buf[offset..offset + HEADER_LEN];

        if header[0] > 99 {
            return Err(FormatErr::InvalidTimestamp { offset });
        }
        let year = i32::from(header[0]) + if header[0] > 50 { 1900 } else { 2000 };
        let time = NaiveDate::from_ymd_opt(year, u32::from(header[1]), u32::from(header[2]))
            .and_then(|date| {
                date.and_hms_opt(
                    u32::from(header[3]),
                    u32::from(header[4]),
                    u32::from(header[5]),
                )
            })
            .ok_or(FormatErr::InvalidTimestamp { offset })?;

        let site = Site::from_station_id(header[6]).ok_or(FormatErr::UnknownStation {
            offset,
            id: header[6],
        })?;

        let num_bands = header[7];
        let bands = [
            BandHeader::decode(&header[8..16]),
            BandHeader::decode(&header[16..24]),
        ];

        for band in &bands {
            if usize::from(band.channels) != CHANNELS_PER_BAND {
                return Err(FormatErr::ChannelCount {
                    offset,
                    found: band.channels,
                });
            }
            if band.start_mhz > band.end_mhz {
                return Err(FormatErr::InvalidFrequencyRange { offset });
            }
        }

        let samples = buf[offset + HEADER_LEN..offset + RECORD_LEN].to_vec();

        Ok(Sweep {
            time,
            site,
            num_bands,
            bands,
            samples,
        })
    }

    /// Append the record bytes to `out`.
    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        // Sweep::new and decode only admit 1951-2050, so the two digit year is unambiguous.
        out.push((self.time.year() % 100) as u8);
        out.push(self.time.month() as u8);
        out.push(self.time.day() as u8);
        out.push(self.time.hour() as u8);
        out.push(self.time.minute() as u8);
        out.push(self.time.second() as u8);
        out.push(self.site.station_id());
        out.push(self.num_bands);

        for band in &self.bands {
            band.encode(out);
        }

        out.extend_from_slice(&self.samples);
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
