//! An archive of SRS files.

use crate::errors::SrsDataErr;
use std::path::PathBuf;

/// The archive.
#[derive(Debug)]
pub struct Archive {
    root: PathBuf,                 // The root directory.
    db_conn: rusqlite::Connection, // An sqlite connection.
}

mod add_data;
mod clean;
mod query;
mod root;

/// The default archive location, `${HOME}/srs`.
pub fn default_root() -> Result<PathBuf, SrsDataErr> {
    dirs::home_dir()
        .map(|home| home.join("srs"))
        .ok_or_else(|| SrsDataErr::GeneralError("unable to find the home directory".to_owned()))
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
