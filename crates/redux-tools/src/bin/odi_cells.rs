use std::process;

use redux_instruments::wiyn::facts::{broken_cells, logical_position, split_code, unit_id};
use redux_instruments::wiyn::layout::DEFAULT_BINNING;
use redux_instruments::wiyn::Generation;
use redux_instruments::MosaicLayout;
use redux_tools::init_logging;

const USAGE: &str = "Usage: odi-cells [-b BINNING] [--podi] <ext>...\n\n\
Print OTA position, serial, rectangle and known-bad cells for each extension.";

fn format_extension(
    layout: &MosaicLayout,
    ext: usize,
    generation: Generation,
) -> Result<String, String> {
    let code = logical_position(ext, generation).map_err(|e| e.to_string())?;
    let (ux, uy) = split_code(code);
    let serial = unit_id(code)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let ((l, r), (b, t)) = layout.unit_rect(ux as usize, uy as usize);

    let mut out = String::new();
    out.push_str(&format!("ext {:2}: OTA {:02} serial {}\n", ext, code, serial));
    out.push_str(&format!("  rect: x [{:.1}, {:.1}] y [{:.1}, {:.1}]\n", l, r, b, t));
    let cells = broken_cells(ux, uy);
    if cells.is_empty() {
        out.push_str("  broken cells: none\n");
    } else {
        out.push_str("  broken cells:\n");
        for &(cx, cy) in cells {
            out.push_str(&format!("    ({}, {})\n", cx, cy));
        }
    }
    Ok(out)
}

fn run(args: &[String]) -> Result<String, String> {
    let mut binning = DEFAULT_BINNING;
    let mut generation = Generation::Full;
    let mut exts = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-b" | "--binning" => {
                let value = iter.next().ok_or("Missing value for -b")?;
                binning = value
                    .parse()
                    .map_err(|_| format!("Invalid binning: {}", value))?;
            }
            "--podi" => generation = Generation::Reduced,
            s if s.starts_with('-') => return Err(format!("Unknown option: {}", s)),
            s => exts.push(
                s.parse::<usize>()
                    .map_err(|_| format!("Invalid extension: {}", s))?,
            ),
        }
    }
    if exts.is_empty() {
        return Err(USAGE.to_string());
    }

    let layout = MosaicLayout::new(binning).map_err(|e| e.to_string())?;
    let mut out = String::new();
    for ext in exts {
        out.push_str(&format_extension(&layout, ext, generation)?);
    }
    Ok(out)
}

fn main() {
    let _log = init_logging("warn");
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => print!("{}", output),
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    }
}
