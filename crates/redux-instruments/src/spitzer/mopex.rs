//! Preparing input lists and namelists for MOPEX jobs.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use regex::Regex;

use crate::error::{Error, Result};
use crate::paths::get_or_create_dir;
use crate::spitzer::bcd::{BcdLists, Instrument, SpitzerObs};
use crate::template::ParamTemplate;

/// Environment variable naming the MOPEX installation root.
pub const MOPEX_ENV: &str = "MOPEX_INSTALLATION";

/// File names of the three primary input lists.
pub const IMAGE_LIST: &str = "imageList.txt";
pub const SIGMA_LIST: &str = "sigmaList.txt";
pub const DMASK_LIST: &str = "dmaskList.txt";

/// An additional per-image list, e.g. for intermediate outputs:
/// `<outdir>/<subdir>/<listname>` holding
/// `<outdir>/<subdir>/<prefix><stem><suffix>.fits` per image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraList {
    pub subdir: String,
    pub listname: String,
    pub prefix: String,
    pub suffix: String,
}

/// MOPEX job setup for one observation.
#[derive(Debug, Clone)]
pub struct MopexConf {
    pub root: PathBuf,
    pub obs: SpitzerObs,
    pub pmask: Option<PathBuf>,
}

impl MopexConf {
    /// Use `root`, or `$MOPEX_INSTALLATION` when `root` is `None`.
    pub fn new(obs: SpitzerObs, root: Option<PathBuf>) -> Result<Self> {
        let root = root
            .or_else(|| std::env::var_os(MOPEX_ENV).map(PathBuf::from))
            .ok_or_else(|| Error::Configuration("unable to find MOPEX installation".into()))?;
        let pmask = pmask_for(&root, &obs);
        Ok(MopexConf { root, obs, pmask })
    }

    /// Write the image, sigma and mask lists (and any `extra` lists) into
    /// `outdir`, returning the lists written.
    pub fn compose_image_lists(
        &self,
        outdir: &Path,
        exclude: Option<&Regex>,
        extra: &[ExtraList],
    ) -> Result<BcdLists> {
        let outdir = get_or_create_dir(outdir)?;
        let lists = self.obs.image_lists(exclude);
        write_list(&outdir.join(IMAGE_LIST), &lists.images)?;
        write_list(&outdir.join(SIGMA_LIST), &lists.sigmas)?;
        write_list(&outdir.join(DMASK_LIST), &lists.dmasks)?;

        for ex in extra {
            let exdir = get_or_create_dir(&outdir.join(&ex.subdir))?;
            let derived: Vec<PathBuf> = lists
                .images
                .iter()
                .map(|image| {
                    let name = image
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let stem = name.strip_suffix(".fits").unwrap_or(&name);
                    exdir.join(format!("{}{}{}.fits", ex.prefix, stem, ex.suffix))
                })
                .collect();
            write_list(&exdir.join(&ex.listname), &derived)?;
        }
        Ok(lists)
    }

    /// Open a namelist template for this job.
    pub fn namelist(&self, template: &Path) -> Result<ParamTemplate> {
        ParamTemplate::open(template)
    }
}

fn pmask_for(root: &Path, obs: &SpitzerObs) -> Option<PathBuf> {
    match obs.instrument() {
        Instrument::Mips => Some(
            root.join("cal")
                .join(format!("{}_pmask.fits", obs.channel())),
        ),
        Instrument::Irac => {
            warn!("Auto-pmask for IRAC is not implemented yet.");
            None
        }
    }
}

fn write_list(path: &Path, entries: &[PathBuf]) -> Result<()> {
    let mut text = String::new();
    for entry in entries {
        text.push_str(&entry.to_string_lossy());
        text.push('\n');
    }
    fs::write(path, text)?;
    info!("+> {}", path.display());
    Ok(())
}
