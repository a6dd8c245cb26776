//! Data centres that publish RSTN spectrograph files, and where they keep them.

use crate::{config::Config, site::Site};
use chrono::NaiveDate;
use std::fmt;

/// Data centres hosting SRS files, in the order they are searched.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, EnumString, IntoStaticStr, EnumIter, Hash,
)]
#[strum(ascii_case_insensitive)]
pub enum Provider {
    /// NOAA National Centers for Environmental Information (formerly NGDC).
    #[strum(to_string = "noaa", serialize = "ngdc")]
    Noaa,
    /// The Australian Bureau of Meteorology World Data Centre.
    #[strum(to_string = "wdc", serialize = "bom")]
    Wdc,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Provider::Noaa => write!(f, "NOAA"),
            Provider::Wdc => write!(f, "WDC"),
        }
    }
}

impl Provider {
    /// File name prefixes this provider uses for a site, empty if it doesn't carry the site.
    pub fn codes(self, site: Site) -> &'static [&'static str] {
        match self {
            Provider::Noaa => site.noaa_codes(),
            Provider::Wdc => site.wdc_codes(),
        }
    }

    /// Every URL the file for this site and date might be found at, in the order to try them.
    ///
    /// NOAA file names switched case at some point, so both spellings are listed.
    pub fn candidates(self, config: &Config, site: Site, date: NaiveDate) -> Vec<RemoteFile> {
        let yymmdd = date.format("%y%m%d");
        let mut urls: Vec<String> = vec![];

        match self {
            Provider::Noaa => {
                let dir = format!(
                    "{}/{}/{}",
                    config.noaa_url.trim_end_matches('/'),
                    site.slug(),
                    date.format("%Y/%m")
                );

                for code in self.codes(site) {
                    let file_name = format!("{}{}.SRS.gz", code, yymmdd);
                    urls.push(format!("{}/{}", dir, file_name));
                    urls.push(format!("{}/{}", dir, file_name.to_lowercase()));
                }
            }
            Provider::Wdc => {
                let dir = format!(
                    "{}/{}/raw/{}",
                    config.wdc_url.trim_end_matches('/'),
                    site.slug(),
                    date.format("%y")
                );

                for code in self.codes(site) {
                    urls.push(format!("{}/{}{}.srs", dir, code, yymmdd));
                }
            }
        }

        urls.dedup();

        urls.into_iter()
            .map(|url| RemoteFile {
                site,
                provider: self,
                url,
            })
            .collect()
    }
}

/// A file on a remote server holding one day of data for one site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFile {
    /// The site the data is from.
    pub site: Site,
    /// Where it is hosted.
    pub provider: Provider,
    /// Full URL of the file.
    pub url: String,
}

impl RemoteFile {
    /// The last path segment of the URL.
    pub fn file_name(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(&self.url)
    }

    /// True if the file is stored gzip'd on the server.
    pub fn is_compressed(&self) -> bool {
        self.file_name().to_lowercase().ends_with(".gz")
    }

    /// Name to save the file under locally: the remote stem with a lower case `.srs.gz` extension.
    pub fn local_name(&self) -> String {
        let mut stem = self.file_name();

        for ext in &[".gz", ".srs"] {
            if stem.to_lowercase().ends_with(ext) {
                stem = &stem[..stem.len() - ext.len()];
            }
        }

        format!("{}.srs.gz", stem)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
