use std::path::Path;
use std::process;

use redux_instruments::paths::check_clobber;
use redux_instruments::ParamTemplate;
use redux_tools::{collect_overrides, init_logging};

const USAGE: &str = "Usage: namelist [--clobber] <template> <output> [KEY=VALUE | SECTION.KEY=VALUE]...\n\n\
Render a MOPEX namelist template with parameter overrides.";

fn run(args: &[String]) -> Result<String, String> {
    let mut clobber = false;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--clobber" => clobber = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            s if s.starts_with('-') => return Err(format!("Unknown option: {}", s)),
            _ => positional.push(arg.clone()),
        }
    }
    if positional.len() < 2 {
        return Err(USAGE.to_string());
    }
    let template = Path::new(&positional[0]);
    let output = Path::new(&positional[1]);
    let overrides = collect_overrides(&positional[2..])?;

    let nl = ParamTemplate::open(template)
        .map_err(|e| format!("Error reading '{}': {}", template.display(), e))?;
    check_clobber(output, clobber).map_err(|e| e.to_string())?;
    let written = nl
        .dump(output, overrides)
        .map_err(|e| format!("Error writing '{}': {}", output.display(), e))?;
    Ok(format!("{}\n", written.display()))
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
