//! Command line options that are used across applications.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;

use crate::{archive::default_root, client::SiteSelection, config::Config, errors::SrsDataErr};

/// Struct to package up command line arguments.
#[derive(Clone, Debug)]
pub struct CommonCmdLineArgs {
    // Sites to work with, all of them if none were given.
    sites: SiteSelection,
    // Path to the root of the archive
    root: PathBuf,
    // Number of days back to consider when running a command.
    days_back: i64,
    // Settings for the network, from a file and then the command line.
    config: Config,
    // How chatty to be.
    verbosity: u8,
}

impl CommonCmdLineArgs {
    /// Create a new set of args.
    pub fn new_app(app_name: &'static str, about: &'static str) -> Command {
        Command::new(app_name)
            .author("Ryan Leach <clumsycodemonkey@gmail.com>")
            .about(about)
            .version(crate_version!())
            .arg(
                Arg::new("sites")
                    .short('s')
                    .long("sites")
                    .num_args(1..)
                    .action(ArgAction::Append)
                    .help("Site names (e.g. learmonth, 'San Vito', sagamore-hill).")
                    .long_help(concat!(
                        "Site names, case insensitive. Separate them with spaces or commas, ",
                        "or use 'all'."
                    )),
            )
            .arg(
                Arg::new("root")
                    .short('r')
                    .long("root")
                    .value_parser(value_parser!(PathBuf))
                    .help("Path to the archive.")
                    .long_help("Path to the archive. Defaults to '${HOME}/srs/'"),
            )
            .arg(
                Arg::new("days-back")
                    .short('d')
                    .long("days-back")
                    .value_parser(value_parser!(i64).range(0..))
                    .default_value("0")
                    .help("Number of days back to consider.")
                    .long_help("The number of days back to consider, 0 is just today."),
            )
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_parser(value_parser!(PathBuf))
                    .help("TOML file with network settings."),
            )
            .arg(
                Arg::new("timeout")
                    .short('t')
                    .long("timeout")
                    .value_parser(value_parser!(u64))
                    .help("Seconds to wait on each request."),
            )
            .arg(
                Arg::new("overwrite")
                    .long("overwrite")
                    .action(ArgAction::SetTrue)
                    .help("Replace files that already exist."),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .action(ArgAction::Count)
                    .help("Print more about what is going on, repeat for more."),
            )
            .after_help(concat!(
                "If no sites are provided then the default is to use all of them.\n\n",
                "Command line settings override those in the config file."
            ))
    }

    /// Process a `Command` to get the parsed values out of it and the matches object so an
    /// application can continue with further argument parsing.
    pub fn matches(app: Command) -> Result<(Self, ArgMatches), SrsDataErr> {
        let matches = app.get_matches();
        let args = Self::from_arg_matches(&matches)?;

        Ok((args, matches))
    }

    /// Pull the common values out of parsed arguments.
    pub fn from_arg_matches(matches: &ArgMatches) -> Result<Self, SrsDataErr> {
        let site_names: Vec<String> = matches
            .get_many::<String>("sites")
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        let sites = if site_names.is_empty() {
            SiteSelection::All
        } else {
            SiteSelection::from_str(&site_names.join(","))?
        };

        let root = match matches.get_one::<PathBuf>("root") {
            Some(root) => root.clone(),
            None => default_root()?,
        };

        let days_back = matches.get_one::<i64>("days-back").copied().unwrap_or(0);

        let mut config = match matches.get_one::<PathBuf>("config") {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(&timeout) = matches.get_one::<u64>("timeout") {
            config = config.with_timeout(timeout);
        }

        if matches.get_flag("overwrite") {
            config = config.with_overwrite(true);
        }

        let verbosity = matches.get_count("verbose");

        Ok(CommonCmdLineArgs {
            sites,
            root,
            days_back,
            config,
            verbosity,
        })
    }

    /// Start logging to stderr at a level set by the number of `-v` flags. `RUST_LOG` still wins.
    pub fn init_logging(&self) {
        let level = match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        env_logger::builder()
            .filter_level(level)
            .parse_default_env()
            .format_timestamp(None)
            .format_target(false)
            .init();
    }

    /// Get the sites
    pub fn sites(&self) -> &SiteSelection {
        &self.sites
    }

    /// Get the root of the archive
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the number of days back for this operation.
    pub fn days_back(&self) -> i64 {
        self.days_back
    }

    /// Get the network settings.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
