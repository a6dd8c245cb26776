//! SRS Plotter.
//!
//! Finds every site with data for a day, downloads the files, and plots them.

use anyhow::{bail, Context, Error};
use clap::{value_parser, Arg, ArgAction};
use rstn_srs::{
    combine, load_srs_data, parse_date, plot_srs, plot_stack, rectify, Client, ColorMap,
    CommonCmdLineArgs, PlotOptions, SiteSelection, SpectralView, Spectrogram,
};
use std::{path::PathBuf, str::FromStr};

fn main() {
    if let Err(ref e) = run() {
        println!("error: {}", e);

        for cause in e.chain().skip(1) {
            println!("caused by: {}", cause);
        }

        ::std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let app = CommonCmdLineArgs::new_app("srsplot", "Plot a day of RSTN spectrograph data.")
        .arg(
            Arg::new("date")
                .index(1)
                .required(true)
                .help("The day to plot, YYYY-MM-DD."),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .help("PNG file to write. Defaults to 'srs_YYYYMMDD.png'."),
        )
        .arg(
            Arg::new("save-dir")
                .long("save-dir")
                .value_parser(value_parser!(PathBuf))
                .default_value(".")
                .help("Where to keep the downloaded files."),
        )
        .arg(
            Arg::new("combine")
                .long("combine")
                .action(ArgAction::SetTrue)
                .help("Plot all sites combined in one panel, with gains matched."),
        )
        .arg(
            Arg::new("colormap")
                .long("colormap")
                .default_value("viridis")
                .help("viridis, cividis, inferno, magma, plasma, or greys."),
        )
        .arg(
            Arg::new("vmin")
                .long("vmin")
                .value_parser(value_parser!(f64))
                .requires("vmax")
                .help("Power at the bottom of the colour scale, dB."),
        )
        .arg(
            Arg::new("vmax")
                .long("vmax")
                .value_parser(value_parser!(f64))
                .requires("vmin")
                .help("Power at the top of the colour scale, dB."),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_parser(value_parser!(u32))
                .default_value("1200")
                .help("Image width in pixels."),
        )
        .arg(
            Arg::new("panel-height")
                .long("panel-height")
                .value_parser(value_parser!(u32))
                .default_value("300")
                .help("Height of each panel in pixels."),
        );

    let (common_args, matches) = CommonCmdLineArgs::matches(app)?;
    common_args.init_logging();

    // Safe to unwrap because these have defaults or are required.
    let date = parse_date(matches.get_one::<String>("date").unwrap())?;
    let save_dir = matches.get_one::<PathBuf>("save-dir").unwrap();
    let colormap = ColorMap::from_str(matches.get_one::<String>("colormap").unwrap())
        .context("unknown colour map")?;
    let width = *matches.get_one::<u32>("width").unwrap();
    let panel_height = *matches.get_one::<u32>("panel-height").unwrap();

    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(format!("srs_{}.png", date.format("%Y%m%d"))));

    let client = Client::new(common_args.config().clone())?;

    let available = client.check_data_availability(&date, common_args.sites())?;
    if available.is_empty() {
        bail!("no data for {} on {}", common_args.sites(), date);
    }
    println!("Found data for {} sites.", available.len());

    let selection = SiteSelection::Only(available.into_iter().collect());
    let paths = client.download_data(&date, &selection, &save_dir)?;

    let spectrograms = paths
        .iter()
        .map(|path| load_srs_data(path).with_context(|| format!("loading {}", path.display())))
        .collect::<Result<Vec<Spectrogram>, _>>()?;

    let mut options = PlotOptions {
        width,
        colormap,
        ..PlotOptions::default()
    };
    if let (Some(&vmin), Some(&vmax)) = (
        matches.get_one::<f64>("vmin"),
        matches.get_one::<f64>("vmax"),
    ) {
        options = options.with_limits(vmin, vmax);
    }

    let figure = if matches.get_flag("combine") {
        let combined = combine(&spectrograms)?;
        let combined = match rectify(&combined) {
            Ok(rectified) => rectified,
            Err(err) => {
                println!("Unable to match gains, plotting as is: {}", err);
                combined
            }
        };
        plot_srs(&combined, &options.with_panel_height(1, panel_height))?
    } else {
        let views: Vec<&dyn SpectralView> = spectrograms
            .iter()
            .map(|srs| srs as &dyn SpectralView)
            .collect();
        let options = options.with_panel_height(views.len() as u32, panel_height);
        plot_stack(&views, &options)?
    };

    figure.save(&output)?;
    println!("Saved {}", output.display());

    Ok(())
}
