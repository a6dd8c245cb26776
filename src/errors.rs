//! Module for errors.
use crate::site::Site;
use chrono::NaiveDate;
use std::{error::Error, fmt::Display};

/// Error from the SRS client, parser, plotter, or archive.
#[derive(Debug)]
pub enum SrsDataErr {
    // Inherited errors from std
    /// Error forwarded from std
    IO(::std::io::Error),

    // Other forwarded errors
    /// Database error
    Database(::rusqlite::Error),
    /// Transport error from the http client, this includes timeouts.
    Http(::reqwest::Error),
    /// Error encoding or writing an image.
    Image(::image::ImageError),
    /// Error parsing a configuration file.
    Config(::toml::de::Error),
    /// Error forwarded from the strum crate
    StrumError(strum::ParseError),
    /// General error described only by a string
    GeneralError(String),

    // My own errors from this crate
    /// The remote data source could not be reached.
    Unreachable(String),
    /// The remote data source answered with a server error.
    HttpStatus {
        /// The URL requested.
        url: String,
        /// The status code returned.
        status: u16,
    },
    /// Site name is not one of the network members.
    UnknownSite(String),
    /// No data published for the site (or any site) on this date.
    NoData {
        /// The site requested, `None` if any site would do.
        site: Option<Site>,
        /// The observing day requested.
        date: NaiveDate,
    },
    /// File not found in the index.
    NotInIndex,
    /// The database structure is wrong.
    InvalidSchema,
    /// Could not interpret a value as a calendar date.
    InvalidDate(String),
    /// The SRS data did not match the expected layout.
    Format(FormatErr),
    /// Spectrograms that cannot be combined.
    IncompatibleSpectrograms(&'static str),
    /// Gain matching between sites did not converge.
    RectifyFailed(usize),
    /// Not enough data to complete the task.
    NotEnoughData,
    /// There was an internal logic error.
    LogicError(&'static str),
}

impl SrsDataErr {
    /// True if the remote source was unreachable, timed out, or failed on its end.
    pub fn is_network(&self) -> bool {
        use crate::errors::SrsDataErr::*;

        matches!(self, Http(_) | Unreachable(_) | HttpStatus { .. })
    }

    /// True if the requested site, date, or archive entry does not exist.
    pub fn is_not_found(&self) -> bool {
        use crate::errors::SrsDataErr::*;

        matches!(self, UnknownSite(_) | NoData { .. } | NotInIndex)
    }

    /// True if the data could not be decoded.
    pub fn is_format(&self) -> bool {
        matches!(self, SrsDataErr::Format(_))
    }
}

impl Display for SrsDataErr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        use crate::errors::SrsDataErr::*;

        match self {
            IO(err) => write!(f, "std lib io error: {}", err),

            Database(err) => write!(f, "database error: {}", err),
            Http(err) => write!(f, "network error: {}", err),
            Image(err) => write!(f, "image error: {}", err),
            Config(err) => write!(f, "invalid configuration: {}", err),
            StrumError(err) => write!(f, "error forwarded from strum crate: {}", err),
            GeneralError(msg) => write!(f, "general error forwarded: {}", msg),

            Unreachable(msg) => write!(f, "network error: {}", msg),
            HttpStatus { url, status } => write!(f, "HTTP error ({}): {}", status, url),
            UnknownSite(name) => write!(f, "unknown RSTN site: {}", name),
            NoData {
                site: Some(site),
                date,
            } => write!(f, "no data for {} on {}", site, date),
            NoData { site: None, date } => write!(f, "no data available for {}", date),
            NotInIndex => write!(f, "no match in the index"),
            InvalidSchema => write!(f, "invalid index format"),
            InvalidDate(val) => write!(f, "invalid date: {}", val),
            Format(err) => write!(f, "invalid SRS data: {}", err),
            IncompatibleSpectrograms(msg) => write!(f, "cannot combine spectrograms: {}", msg),
            RectifyFailed(attempts) => {
                write!(f, "failed to adjust all sites after {} attempts", attempts)
            }
            NotEnoughData => write!(f, "not enough data to complete task"),
            LogicError(msg) => write!(f, "internal logic error: {}", msg),
        }
    }
}

impl Error for SrsDataErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use crate::errors::SrsDataErr::*;

        match self {
            IO(err) => Some(err),
            Database(err) => Some(err),
            Http(err) => Some(err),
            Image(err) => Some(err),
            Config(err) => Some(err),
            StrumError(err) => Some(err),
            Format(err) => Some(err),
            _ => None,
        }
    }
}

/// Ways SRS data can fail to decode. Offsets are byte offsets into the uncompressed data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatErr {
    /// No records at all.
    Empty,
    /// The data ends part way through a record.
    Truncated {
        /// Offset of the partial record.
        offset: usize,
        /// Bytes left at that offset.
        remaining: usize,
    },
    /// A band did not have the expected number of channels.
    ChannelCount {
        /// Offset of the record.
        offset: usize,
        /// Channel count found in the header.
        found: u16,
    },
    /// Station id that is not a network member.
    UnknownStation {
        /// Offset of the record.
        offset: usize,
        /// The id found.
        id: u8,
    },
    /// Date or time fields out of range.
    InvalidTimestamp {
        /// Offset of the record.
        offset: usize,
    },
    /// A band's start frequency is above its end frequency.
    InvalidFrequencyRange {
        /// Offset of the record.
        offset: usize,
    },
    /// Band layout differs from the first record.
    FrequencyMismatch {
        /// Offset of the record.
        offset: usize,
    },
    /// Station id differs from the first record.
    StationMismatch {
        /// Offset of the record.
        offset: usize,
    },
    /// Record is earlier than the one before it.
    TimeReversal {
        /// Offset of the record.
        offset: usize,
    },
    /// The gzip stream is corrupt.
    Compression(String),
}

impl Display for FormatErr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        use crate::errors::FormatErr::*;

        match self {
            Empty => write!(f, "no records"),
            Truncated { offset, remaining } => write!(
                f,
                "truncated record at byte {} ({} bytes remaining)",
                offset, remaining
            ),
            ChannelCount { offset, found } => write!(
                f,
                "record at byte {} has {} channels in a band",
                offset, found
            ),
            UnknownStation { offset, id } => {
                write!(f, "record at byte {} has unknown station id {}", offset, id)
            }
            InvalidTimestamp { offset } => write!(f, "record at byte {} has a bad time", offset),
            InvalidFrequencyRange { offset } => {
                write!(f, "record at byte {} has a reversed band", offset)
            }
            FrequencyMismatch { offset } => {
                write!(f, "record at byte {} changes the frequency axis", offset)
            }
            StationMismatch { offset } => {
                write!(f, "record at byte {} changes the station", offset)
            }
            TimeReversal { offset } => write!(f, "record at byte {} goes back in time", offset),
            Compression(msg) => write!(f, "corrupt gzip stream: {}", msg),
        }
    }
}

impl Error for FormatErr {}

impl From<FormatErr> for SrsDataErr {
    fn from(err: FormatErr) -> SrsDataErr {
        SrsDataErr::Format(err)
    }
}

impl From<::std::io::Error> for SrsDataErr {
    fn from(err: ::std::io::Error) -> SrsDataErr {
        SrsDataErr::IO(err)
    }
}

impl From<::rusqlite::Error> for SrsDataErr {
    fn from(err: ::rusqlite::Error) -> SrsDataErr {
        SrsDataErr::Database(err)
    }
}

impl From<::reqwest::Error> for SrsDataErr {
    fn from(err: ::reqwest::Error) -> SrsDataErr {
        SrsDataErr::Http(err)
    }
}

impl From<::image::ImageError> for SrsDataErr {
    fn from(err: ::image::ImageError) -> SrsDataErr {
        SrsDataErr::Image(err)
    }
}

impl From<::toml::de::Error> for SrsDataErr {
    fn from(err: ::toml::de::Error) -> SrsDataErr {
        SrsDataErr::Config(err)
    }
}

impl From<strum::ParseError> for SrsDataErr {
    fn from(err: strum::ParseError) -> SrsDataErr {
        SrsDataErr::StrumError(err)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn test_error_classes() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        assert!(SrsDataErr::UnknownSite("Missoula".to_owned()).is_not_found());
        assert!(SrsDataErr::NoData { site: None, date }.is_not_found());
        assert!(SrsDataErr::NotInIndex.is_not_found());

        assert!(SrsDataErr::Unreachable("down".to_owned()).is_network());
        assert!(SrsDataErr::HttpStatus {
            url: "https://example.com".to_owned(),
            status: 503
        }
        .is_network());

        assert!(SrsDataErr::from(FormatErr::Empty).is_format());
        assert!(!SrsDataErr::from(FormatErr::Empty).is_network());
        assert!(!SrsDataErr::NotEnoughData.is_not_found());
    }

    #[test]
    fn test_display_names_site() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let err = SrsDataErr::NoData {
            site: Some(Site::SanVito),
            date,
        };

        assert_eq!(err.to_string(), "no data for San Vito on 2025-01-10");
    }
}
