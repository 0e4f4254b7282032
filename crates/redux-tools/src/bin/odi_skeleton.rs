use std::path::Path;
use std::process;

use redux_instruments::wiyn::layout::DEFAULT_BINNING;
use redux_instruments::wiyn::skeleton::{SkeletonMap, DEFAULT_CRVAL};
use redux_instruments::MosaicLayout;
use redux_tools::init_logging;

const USAGE: &str = "Usage: odi-skeleton [-b BINNING] [--ra DEG] [--dec DEG] [--clobber] [out.fits]\n\n\
Write the ODI focal-plane flag image with a TAN WCS.";

struct Options {
    binning: f64,
    crval: (f64, f64),
    clobber: bool,
    output: String,
}

fn parse_f64(flag: &str, value: Option<&String>) -> Result<f64, String> {
    let value = value.ok_or_else(|| format!("Missing value for {}", flag))?;
    value
        .parse()
        .map_err(|_| format!("Invalid value for {}: {}", flag, value))
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut opts = Options {
        binning: DEFAULT_BINNING,
        crval: DEFAULT_CRVAL,
        clobber: false,
        output: "wiyn_skeleton.fits".to_string(),
    };
    let mut positional = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-b" | "--binning" => opts.binning = parse_f64(arg, iter.next())?,
            "--ra" => opts.crval.0 = parse_f64(arg, iter.next())?,
            "--dec" => opts.crval.1 = parse_f64(arg, iter.next())?,
            "--clobber" => opts.clobber = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            s if s.starts_with('-') => return Err(format!("Unknown option: {}", s)),
            s => {
                if positional.is_some() {
                    return Err("Too many arguments".to_string());
                }
                positional = Some(s.to_string());
            }
        }
    }
    if let Some(out) = positional {
        opts.output = out;
    }
    Ok(opts)
}

fn run(args: &[String]) -> Result<String, String> {
    let opts = parse_args(args)?;
    let layout = MosaicLayout::new(opts.binning).map_err(|e| e.to_string())?;
    let map = SkeletonMap::build(&layout, opts.crval);
    let path = map
        .write(Path::new(&opts.output), opts.clobber)
        .map_err(|e| format!("Error writing '{}': {}", opts.output, e))?;
    Ok(format!(
        "{} ({} x {} px, {:.3} arcsec/px)\n",
        path.display(),
        map.ncols,
        map.nrows,
        layout.pixel_scale
    ))
}

fn main() {
    let _log = init_logging("info");
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => print!("{}", output),
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    }
}
