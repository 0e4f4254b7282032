//! Configuration and parameter files for the Astromatic tools (SExtractor,
//! SCAMP, SWarp).
//!
//! Configuration files are `KEY value # comment` lines as produced by
//! `sex -dd`; only the value part of overridden keys is rewritten.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};
use crate::paths::check_clobber;

/// Catalogue columns every SExtractor run produces.
pub const COMMON_PARAMS: [&str; 32] = [
    "ALPHA_J2000",
    "DELTA_J2000",
    "X_IMAGE",
    "Y_IMAGE",
    "NUMBER",
    "EXT_NUMBER",
    "MAG_AUTO",
    "MAGERR_AUTO",
    "MAG_APER",
    "MAGERR_APER",
    "FLUX_AUTO",
    "FLUXERR_AUTO",
    "FLUX_APER",
    "FLUXERR_APER",
    "BACKGROUND",
    "THRESHOLD",
    "XWIN_IMAGE",
    "YWIN_IMAGE",
    "ERRAWIN_IMAGE",
    "ERRBWIN_IMAGE",
    "ERRTHETAWIN_IMAGE",
    "X_WORLD",
    "Y_WORLD",
    "ERRA_WORLD",
    "ERRB_WORLD",
    "ERRTHETA_WORLD",
    "FLAGS",
    "FLAGS_WEIGHT",
    "FLAGS_WIN",
    "FWHM_IMAGE",
    "ELLIPTICITY",
    "CLASS_STAR",
];

/// SCAMP check-plot types, in the order SCAMP expects them.
pub const SCAMP_CHECKPLOTS: [&str; 8] = [
    "fgroups",
    "distort",
    "astr_interror2d",
    "astr_interror1d",
    "astr_referror2d",
    "astr_referror1d",
    "astr_chi2",
    "psphot_error",
];

/// Comma-separated check-plot names `<dir>/<prefix>_<type>` for SCAMP's
/// `CHECKPLOT_NAME`.
pub fn checkplot_names(dir: &Path, prefix: &str) -> String {
    SCAMP_CHECKPLOTS
        .iter()
        .map(|kind| dir.join(format!("{prefix}_{kind}")).display().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn rewrite_line(line: &str, overrides: &HashMap<String, String>) -> String {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return line.to_string();
    }
    let keyval = trimmed.split('#').next().unwrap_or("").trim();
    let (key, val) = match keyval.split_once(char::is_whitespace) {
        Some((k, v)) => (k, Some(v.trim())),
        None => (keyval, None),
    };
    let Some(new_val) = overrides.get(key) else {
        return line.to_string();
    };
    match val {
        None => line.replacen(key, &format!("{key}  {new_val}"), 1),
        Some(val) => {
            let iv = line.find(key).map_or(0, |i| i + key.len());
            let jv = line[iv..].find('#').map_or_else(
                || line.trim_end_matches(['\n', '\r']).len(),
                |j| iv + j,
            );
            format!(
                "{}{}{}",
                &line[..iv],
                line[iv..jv].replacen(val, new_val, 1),
                &line[jv..]
            )
        }
    }
}

/// Rewrite `template` with `overrides`, leaving comments, spacing and
/// untouched keys as they are.
pub fn render_conf<K, V, I>(template: &str, overrides: I) -> String
where
    K: Into<String>,
    V: Display,
    I: IntoIterator<Item = (K, V)>,
{
    let overrides: HashMap<String, String> = overrides
        .into_iter()
        .map(|(k, v)| (k.into(), v.to_string()))
        .collect();
    template
        .split_inclusive('\n')
        .map(|line| rewrite_line(line, &overrides))
        .collect()
}

/// Write `template` with `overrides` applied to `outfile`.
pub fn dump_conf<K, V, I>(
    template: &str,
    outfile: &Path,
    clobber: bool,
    overrides: I,
) -> Result<PathBuf>
where
    K: Into<String>,
    V: Display,
    I: IntoIterator<Item = (K, V)>,
{
    check_clobber(outfile, clobber)?;
    fs::write(outfile, render_conf(template, overrides))?;
    info!("+> {}", outfile.display());
    Ok(outfile.to_path_buf())
}

/// Build a SExtractor parameter file: the common columns plus `extra`, a
/// separator, then the full list of available columns from `content`
/// (the output of `sex -dp`).
pub fn render_sex_param(content: &str, extra: &[&str]) -> Result<String> {
    let mut out = String::new();
    for key in COMMON_PARAMS.iter().chain(extra) {
        if !content.contains(key) {
            return Err(Error::UnknownParameter(key.to_string()));
        }
        out.push_str(&format!("{key:23}  #\n"));
    }
    out.push_str(&"#".repeat(26));
    out.push('\n');
    out.push_str(content);
    Ok(out)
}

/// Write the parameter file built by [`render_sex_param`] to `outfile`.
pub fn dump_sex_param(
    content: &str,
    outfile: &Path,
    extra: &[&str],
    clobber: bool,
) -> Result<PathBuf> {
    check_clobber(outfile, clobber)?;
    let text = render_sex_param(content, extra)?;
    fs::write(outfile, text)?;
    info!("+> {}", outfile.display());
    Ok(outfile.to_path_buf())
}
