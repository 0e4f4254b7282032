//! Locating Spitzer basic calibrated data (BCD) products on disk.
//!
//! Archive downloads are laid out as `<root>/r<AOR>/<chan>/bcd/S*<suffix>`
//! for BCDs and `<root>/r<AOR>/<chan>/pbcd/S*<suffix>` for post-BCD mosaics.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use regex::Regex;

use crate::error::{Error, Result};
use crate::paths::list_matching;

/// Per-frame BCD product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcdKind {
    Image,
    Sigma,
    Dmask,
}

impl BcdKind {
    fn label(self) -> &'static str {
        match self {
            BcdKind::Image => "image",
            BcdKind::Sigma => "sigma",
            BcdKind::Dmask => "dmask",
        }
    }
}

/// Post-BCD mosaic product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PbcdKind {
    Image,
    Sigma,
    Cover,
}

impl PbcdKind {
    pub fn suffix(self) -> &'static str {
        match self {
            PbcdKind::Image => "_maic.fits",
            PbcdKind::Sigma => "_munc.fits",
            PbcdKind::Cover => "_mcov.fits",
        }
    }
}

/// Candidate file suffixes per BCD product, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BcdSuffixes {
    pub image: Vec<String>,
    pub sigma: Vec<String>,
    pub dmask: Vec<String>,
}

impl Default for BcdSuffixes {
    fn default() -> Self {
        let owned = |s: &[&str]| s.iter().map(|s| s.to_string()).collect();
        BcdSuffixes {
            // corrected products first
            image: owned(&["_cbcd.fits", "_bcd.fits"]),
            sigma: owned(&["_cbunc.fits", "_bunc.fits"]),
            dmask: owned(&["_bimsk.fits", "_bbmsk.fits"]),
        }
    }
}

impl BcdSuffixes {
    pub fn get(&self, kind: BcdKind) -> &[String] {
        match kind {
            BcdKind::Image => &self.image,
            BcdKind::Sigma => &self.sigma,
            BcdKind::Dmask => &self.dmask,
        }
    }

    pub fn set(&mut self, kind: BcdKind, suffixes: Vec<String>) {
        match kind {
            BcdKind::Image => self.image = suffixes,
            BcdKind::Sigma => self.sigma = suffixes,
            BcdKind::Dmask => self.dmask = suffixes,
        }
    }
}

/// Matched image, sigma and mask lists; entry `i` of each belongs to the
/// same frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BcdLists {
    pub images: Vec<PathBuf>,
    pub sigmas: Vec<PathBuf>,
    pub dmasks: Vec<PathBuf>,
}

impl BcdLists {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn extend(&mut self, other: BcdLists) {
        self.images.extend(other.images);
        self.sigmas.extend(other.sigmas);
        self.dmasks.extend(other.dmasks);
    }
}

/// The data of one AOR (astronomical observation request).
#[derive(Debug, Clone)]
pub struct SpitzerBcd {
    pub aor: u32,
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub suffixes: BcdSuffixes,
}

impl SpitzerBcd {
    pub fn new(aor: u32, root: &Path) -> Result<Self> {
        let root = std::path::absolute(root)?;
        let data_dir = root.join(format!("r{aor}"));
        Ok(SpitzerBcd {
            aor,
            root,
            data_dir,
            suffixes: BcdSuffixes::default(),
        })
    }

    /// Replace the candidate suffixes of `kind`.
    pub fn with_suffixes(mut self, kind: BcdKind, suffixes: &[&str]) -> Self {
        self.suffixes
            .set(kind, suffixes.iter().map(|s| s.to_string()).collect());
        self
    }

    fn bcd_dir(&self, chan: &str) -> PathBuf {
        self.data_dir.join(chan).join("bcd")
    }

    /// Files of `kind` for channel `chan`, using the first suffix that
    /// matches anything.
    pub fn image_list(&self, chan: &str, kind: BcdKind) -> Result<Vec<PathBuf>> {
        let (_, files) = self.first_match(chan, kind)?;
        Ok(files)
    }

    fn first_match(&self, chan: &str, kind: BcdKind) -> Result<(&str, Vec<PathBuf>)> {
        let dir = self.bcd_dir(chan);
        for suffix in self.suffixes.get(kind) {
            let files = list_matching(&dir, "S", suffix)?;
            if !files.is_empty() {
                return Ok((suffix, files));
            }
        }
        Err(Error::EmptyFileList(kind.label()))
    }

    /// The post-BCD product of `kind`, if present.
    pub fn pbcd(&self, chan: &str, kind: PbcdKind) -> Result<Option<PathBuf>> {
        let dir = self.data_dir.join(chan).join("pbcd");
        Ok(list_matching(&dir, "S", kind.suffix())?.into_iter().next())
    }

    /// Images for `chan` with their sigma and mask companions, derived by
    /// swapping the image suffix.
    pub fn image_lists(&self, chan: &str) -> Result<BcdLists> {
        info!("collect files from {}", self.data_dir.display());
        let (image_suffix, images) = self.first_match(chan, BcdKind::Image)?;
        let sigmas = self.companions(&images, image_suffix, BcdKind::Sigma)?;
        let dmasks = self.companions(&images, image_suffix, BcdKind::Dmask)?;
        Ok(BcdLists {
            images,
            sigmas,
            dmasks,
        })
    }

    fn companions(
        &self,
        images: &[PathBuf],
        image_suffix: &str,
        kind: BcdKind,
    ) -> Result<Vec<PathBuf>> {
        let swap = |p: &PathBuf, suffix: &str| {
            PathBuf::from(p.to_string_lossy().replace(image_suffix, suffix))
        };
        for suffix in self.suffixes.get(kind) {
            if images.first().is_some_and(|first| swap(first, suffix).is_file()) {
                return Ok(images.iter().map(|p| swap(p, suffix)).collect());
            }
        }
        Err(Error::EmptyFileList(kind.label()))
    }
}

/// AOR numbers of the `r<AOR>` directories under `root`, sorted.
pub fn resolve_aors(root: &Path) -> Result<Vec<u32>> {
    let mut aors = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        if let Some(aor) = name
            .to_str()
            .and_then(|n| n.strip_prefix('r'))
            .and_then(|n| n.parse().ok())
        {
            aors.push(aor);
        }
    }
    aors.sort_unstable();
    Ok(aors)
}

/// Spitzer imaging instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instrument {
    Irac,
    Mips,
}

impl Instrument {
    pub fn name(self) -> &'static str {
        match self {
            Instrument::Irac => "IRAC",
            Instrument::Mips => "MIPS",
        }
    }
}

/// Observing band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Ch1,
    Ch2,
    Ch3,
    Ch4,
    Mips24,
    Mips70,
    Mips160,
}

impl Band {
    /// Instrument and archive channel directory holding this band.
    pub fn location(self) -> (Instrument, &'static str) {
        match self {
            Band::Ch1 => (Instrument::Irac, "ch1"),
            Band::Ch2 => (Instrument::Irac, "ch2"),
            Band::Ch3 => (Instrument::Irac, "ch2"),
            Band::Ch4 => (Instrument::Irac, "ch3"),
            Band::Mips24 => (Instrument::Mips, "ch1"),
            Band::Mips70 => (Instrument::Mips, "ch2"),
            Band::Mips160 => (Instrument::Mips, "ch3"),
        }
    }

    pub fn instrument(self) -> Instrument {
        self.location().0
    }

    pub fn channel(self) -> &'static str {
        self.location().1
    }
}

impl FromStr for Band {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ch1" => Ok(Band::Ch1),
            "ch2" => Ok(Band::Ch2),
            "ch3" => Ok(Band::Ch3),
            "ch4" => Ok(Band::Ch4),
            "mips24" => Ok(Band::Mips24),
            "mips70" => Ok(Band::Mips70),
            "mips160" => Ok(Band::Mips160),
            other => Err(Error::UnknownBand(other.to_string())),
        }
    }
}

/// The BCDs of several AORs in one band.
#[derive(Debug, Clone)]
pub struct SpitzerObs {
    pub band: Band,
    pub bcds: Vec<SpitzerBcd>,
    pub lists: BcdLists,
}

impl SpitzerObs {
    pub fn new(bcds: Vec<SpitzerBcd>, band: Band) -> Result<Self> {
        let mut lists = BcdLists::default();
        info!(
            "{} {}: {} AOR(s)",
            band.instrument().name(),
            band.channel(),
            bcds.len()
        );
        for bcd in &bcds {
            lists.extend(bcd.image_lists(band.channel())?);
        }
        Ok(SpitzerObs { band, bcds, lists })
    }

    pub fn instrument(&self) -> Instrument {
        self.band.instrument()
    }

    pub fn channel(&self) -> &'static str {
        self.band.channel()
    }

    /// Lists with paths matching `exclude` dropped from each list.
    pub fn image_lists(&self, exclude: Option<&Regex>) -> BcdLists {
        let keep = |paths: &[PathBuf]| -> Vec<PathBuf> {
            paths
                .iter()
                .filter(|p| exclude.is_none_or(|re| !re.is_match(&p.to_string_lossy())))
                .cloned()
                .collect()
        };
        BcdLists {
            images: keep(&self.lists.images),
            sigmas: keep(&self.lists.sigmas),
            dmasks: keep(&self.lists.dmasks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn archive(root: &Path, aor: u32, chan: &str, frames: &[&str], suffixes: &[&str]) {
        let bcd = root.join(format!("r{aor}")).join(chan).join("bcd");
        for frame in frames {
            for suffix in suffixes {
                touch(&bcd.join(format!("{frame}{suffix}")));
            }
        }
    }

    #[test]
    fn prefers_corrected_images() {
        let dir = tempfile::tempdir().unwrap();
        archive(
            dir.path(),
            1234,
            "ch1",
            &["SPITZER_I1_1234_0001", "SPITZER_I1_1234_0002"],
            &["_cbcd.fits", "_bcd.fits", "_cbunc.fits", "_bimsk.fits"],
        );
        let bcd = SpitzerBcd::new(1234, dir.path()).unwrap();
        let lists = bcd.image_lists("ch1").unwrap();
        assert_eq!(lists.len(), 2);
        assert!(lists.images[0].to_string_lossy().ends_with("0001_cbcd.fits"));
        assert!(lists.sigmas[1].to_string_lossy().ends_with("0002_cbunc.fits"));
        assert!(lists.dmasks[0].to_string_lossy().ends_with("0001_bimsk.fits"));
    }

    #[test]
    fn falls_back_to_plain_bcd() {
        let dir = tempfile::tempdir().unwrap();
        archive(
            dir.path(),
            7,
            "ch2",
            &["SPITZER_M2_7_0001"],
            &["_bcd.fits", "_bunc.fits", "_bbmsk.fits"],
        );
        let bcd = SpitzerBcd::new(7, dir.path()).unwrap();
        let lists = bcd.image_lists("ch2").unwrap();
        assert!(lists.sigmas[0].to_string_lossy().ends_with("_bunc.fits"));
        assert!(lists.dmasks[0].to_string_lossy().ends_with("_bbmsk.fits"));
    }

    #[test]
    fn missing_aor_has_empty_image_list() {
        let dir = tempfile::tempdir().unwrap();
        let bcd = SpitzerBcd::new(42, &dir.path().join("nowhere")).unwrap();
        assert!(bcd.root.is_absolute());
        assert!(matches!(
            bcd.image_lists("ch1"),
            Err(Error::EmptyFileList("image"))
        ));
    }

    #[test]
    fn missing_companions_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        archive(dir.path(), 5, "ch1", &["SPITZER_I1_5_0001"], &["_cbcd.fits", "_cbunc.fits"]);
        let bcd = SpitzerBcd::new(5, dir.path()).unwrap();
        assert!(matches!(
            bcd.image_lists("ch1"),
            Err(Error::EmptyFileList("dmask"))
        ));
        assert!(matches!(
            bcd.image_list("ch3", BcdKind::Image),
            Err(Error::EmptyFileList("image"))
        ));
    }

    #[test]
    fn custom_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        archive(dir.path(), 9, "ch1", &["SPITZER_I1_9_0001"], &["_xbcd.fits"]);
        let bcd = SpitzerBcd::new(9, dir.path())
            .unwrap()
            .with_suffixes(BcdKind::Image, &["_xbcd.fits"]);
        assert_eq!(bcd.image_list("ch1", BcdKind::Image).unwrap().len(), 1);
    }

    #[test]
    fn post_bcd_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let pbcd = dir.path().join("r3").join("ch1").join("pbcd");
        touch(&pbcd.join("SPITZER_I1_3_maic.fits"));
        let bcd = SpitzerBcd::new(3, dir.path()).unwrap();
        assert!(bcd.pbcd("ch1", PbcdKind::Image).unwrap().is_some());
        assert!(bcd.pbcd("ch1", PbcdKind::Cover).unwrap().is_none());
    }

    #[test]
    fn resolves_aor_directories() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["r200", "r13", "raw", "x5"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        touch(&dir.path().join("r99"));
        assert_eq!(resolve_aors(dir.path()).unwrap(), vec![13, 200]);
    }

    #[test]
    fn band_table() {
        assert_eq!("ch1".parse::<Band>().unwrap().location(), (Instrument::Irac, "ch1"));
        assert_eq!("ch3".parse::<Band>().unwrap().channel(), "ch2");
        assert_eq!("ch4".parse::<Band>().unwrap().channel(), "ch3");
        assert_eq!("mips160".parse::<Band>().unwrap().location(), (Instrument::Mips, "ch3"));
        assert!(matches!("J".parse::<Band>(), Err(Error::UnknownBand(_))));
        assert_eq!(Band::Ch2.instrument().name(), "IRAC");
        assert_eq!(Band::Mips70.instrument().name(), "MIPS");
    }

    #[test]
    fn obs_aggregates_and_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let sfx = ["_bcd.fits", "_bunc.fits", "_bbmsk.fits"];
        archive(dir.path(), 1, "ch1", &["SPITZER_M1_1_0001", "SPITZER_M1_1_0002"], &sfx);
        archive(dir.path(), 2, "ch1", &["SPITZER_M1_2_0001"], &sfx);
        let bcds = vec![
            SpitzerBcd::new(1, dir.path()).unwrap(),
            SpitzerBcd::new(2, dir.path()).unwrap(),
        ];
        let obs = SpitzerObs::new(bcds, Band::Mips24).unwrap();
        assert_eq!(obs.instrument(), Instrument::Mips);
        assert_eq!(obs.image_lists(None).len(), 3);

        let re = Regex::new("_0002_").unwrap();
        let kept = obs.image_lists(Some(&re));
        assert_eq!(kept.images.len(), 2);
        assert_eq!(kept.sigmas.len(), 2);
        assert_eq!(kept.dmasks.len(), 2);
    }
}
