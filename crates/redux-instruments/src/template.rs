//! Key/value parameter templates with named sections (MOPEX namelists).
//!
//! ```text
//! # comment
//! run_pointing = 1
//! &SNESTIMATORIN
//! Gain = 1.0
//! &END
//! ```
//!
//! The original lines are kept verbatim; each parsed key remembers the index
//! of its defining line so rendering only replaces those lines.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};

/// Comment marker.
const COMMENT: char = '#';
/// Opens a section, `&NAME`.
const SECTION_OPEN: char = '&';
/// Closes a section; matched as a prefix.
const SECTION_CLOSE: &str = "&END";

/// A top-level parameter value or a whole section of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    Section(BTreeMap<String, String>),
}

impl Value {
    /// A scalar from anything displayable.
    pub fn scalar(v: impl Display) -> Self {
        Value::Scalar(v.to_string())
    }

    /// A section override from `(key, value)` pairs.
    pub fn section<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Display,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Section(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_string()))
                .collect(),
        )
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Value::Scalar(_) => None,
            Value::Section(m) => Some(m),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

/// Line index of a top-level key, or of every key within a section.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Line(usize),
    Section(BTreeMap<String, usize>),
}

/// A parsed parameter template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamTemplate {
    lines: Vec<String>,
    comments: Vec<(usize, String)>,
    parameters: BTreeMap<String, Value>,
    indices: BTreeMap<String, Slot>,
}

/// Split `key[=value]` on the first `=`; a line without one is all key.
fn split_key_value(line: &str) -> (&str, &str) {
    match line.split_once('=') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (line, ""),
    }
}

impl ParamTemplate {
    /// Parse template text. Never fails: lines that are not comments or
    /// section markers are taken as `key[=value]`.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<String> = text.split_inclusive('\n').map(String::from).collect();
        let mut comments = Vec::new();
        let mut parameters: BTreeMap<String, Value> = BTreeMap::new();
        let mut indices: BTreeMap<String, Slot> = BTreeMap::new();
        let mut section: Option<String> = None;

        for (i, raw) in lines.iter().enumerate() {
            let ln = raw.trim();
            if ln.starts_with(COMMENT) {
                comments.push((i, ln.to_string()));
            } else if ln.starts_with(SECTION_OPEN) {
                section = if ln.starts_with(SECTION_CLOSE) {
                    None
                } else {
                    Some(ln.trim_start_matches(SECTION_OPEN))
                        .filter(|name| !name.is_empty())
                        .map(String::from)
                };
            } else if ln.is_empty() {
                continue;
            } else {
                let (key, value) = split_key_value(ln);
                match &section {
                    Some(name) => {
                        let entry = parameters
                            .entry(name.clone())
                            .or_insert_with(|| Value::Section(BTreeMap::new()));
                        if !matches!(entry, Value::Section(_)) {
                            *entry = Value::Section(BTreeMap::new());
                        }
                        if let Value::Section(m) = entry {
                            m.insert(key.to_string(), value.to_string());
                        }

                        let slot = indices
                            .entry(name.clone())
                            .or_insert_with(|| Slot::Section(BTreeMap::new()));
                        if !matches!(slot, Slot::Section(_)) {
                            *slot = Slot::Section(BTreeMap::new());
                        }
                        if let Slot::Section(m) = slot {
                            m.insert(key.to_string(), i);
                        }
                    }
                    None => {
                        parameters.insert(key.to_string(), Value::Scalar(value.to_string()));
                        indices.insert(key.to_string(), Slot::Line(i));
                    }
                }
            }
        }

        ParamTemplate {
            lines,
            comments,
            parameters,
            indices,
        }
    }

    /// Read and parse the template at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Original lines, each with its line terminator.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Comment lines as `(line index, trimmed text)`.
    pub fn comments(&self) -> &[(usize, String)] {
        &self.comments
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    /// Value of `key` inside `section`.
    pub fn get_in(&self, section: &str, key: &str) -> Option<&str> {
        self.parameters
            .get(section)?
            .as_section()?
            .get(key)
            .map(String::as_str)
    }

    /// Line index tracked for top-level `key`.
    pub fn line_of(&self, key: &str) -> Option<usize> {
        match self.indices.get(key)? {
            Slot::Line(i) => Some(*i),
            Slot::Section(_) => None,
        }
    }

    /// Line index tracked for `key` inside `section`.
    pub fn line_of_in(&self, section: &str, key: &str) -> Option<usize> {
        match self.indices.get(section)? {
            Slot::Line(_) => None,
            Slot::Section(m) => m.get(key).copied(),
        }
    }

    /// Apply `overrides` to the stored parameters.
    ///
    /// Section overrides merge key by key; scalar overrides replace. Keys
    /// that were never parsed are rejected, since they have no line to
    /// render into.
    pub fn update<K, I>(&mut self, overrides: I) -> Result<()>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut parameters = self.parameters.clone();
        self.merge_into(&mut parameters, overrides)?;
        self.parameters = parameters;
        Ok(())
    }

    fn merge_into<K, I>(&self, parameters: &mut BTreeMap<String, Value>, overrides: I) -> Result<()>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        for (key, value) in overrides {
            let key = key.into();
            let slot = self
                .indices
                .get(&key)
                .ok_or_else(|| Error::UnknownParameter(key.clone()))?;
            match (slot, value) {
                (Slot::Section(lines), Value::Section(entries)) => {
                    if let Some(missing) = entries.keys().find(|k| !lines.contains_key(*k)) {
                        return Err(Error::UnknownParameter(format!("{key}.{missing}")));
                    }
                    if let Some(Value::Section(current)) = parameters.get_mut(&key) {
                        current.extend(entries);
                    }
                }
                (Slot::Line(_), Value::Scalar(v)) => {
                    parameters.insert(key, Value::Scalar(v));
                }
                _ => return Err(Error::ParameterShape(key)),
            }
        }
        Ok(())
    }

    /// Render the template with `overrides` applied on top of the stored
    /// parameters. Every tracked line becomes `key = value`; all other lines
    /// are reproduced verbatim and the line count never changes.
    pub fn render<K, I>(&self, overrides: I) -> Result<String>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut parameters = self.parameters.clone();
        self.merge_into(&mut parameters, overrides)?;

        let mut lines = self.lines.clone();
        for (key, value) in &parameters {
            match (value, self.indices.get(key)) {
                (Value::Scalar(v), Some(Slot::Line(i))) => {
                    lines[*i] = format!("{key} = {v}\n");
                }
                (Value::Section(entries), Some(Slot::Section(slots))) => {
                    for (nk, nv) in entries {
                        if let Some(i) = slots.get(nk) {
                            lines[*i] = format!("{nk} = {nv}\n");
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(lines.concat())
    }

    /// Render with `overrides` and write to `output`, replacing any existing
    /// file. Overwrite protection is up to the caller.
    pub fn dump<K, I>(&self, output: &Path, overrides: I) -> Result<PathBuf>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let text = self.render(overrides)?;
        fs::write(output, text)?;
        info!("+> {}", output.display());
        Ok(output.to_path_buf())
    }
}

/// No overrides, for [`ParamTemplate::render`] and [`ParamTemplate::dump`].
pub fn no_overrides() -> std::iter::Empty<(String, Value)> {
    std::iter::empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMELIST: &str = "\
# mosaic namelist
run_overlap = 1
 run_mosaic_geom=1   \n\
BACKGROUND_SUBTRACTION
&SNESTIMATORIN
Gain = 5.0
Read_Noise = 40.0
&END

&MOSAICINTIN
INTERPOLATION_METHOD = 1
&END
   # trailing comment
";

    #[test]
    fn parses_top_level_and_sections() {
        let t = ParamTemplate::parse(NAMELIST);
        assert_eq!(t.get("run_overlap"), Some(&Value::from("1")));
        assert_eq!(t.get("run_mosaic_geom"), Some(&Value::from("1")));
        assert_eq!(t.get("BACKGROUND_SUBTRACTION"), Some(&Value::from("")));
        assert_eq!(t.get_in("SNESTIMATORIN", "Gain"), Some("5.0"));
        assert_eq!(t.get_in("MOSAICINTIN", "INTERPOLATION_METHOD"), Some("1"));
        assert_eq!(t.line_of("run_overlap"), Some(1));
        assert_eq!(t.line_of_in("SNESTIMATORIN", "Read_Noise"), Some(6));
        assert_eq!(t.line_of("Gain"), None);
        assert_eq!(t.get("run_overlap").and_then(Value::as_scalar), Some("1"));
        assert_eq!(t.get("SNESTIMATORIN").and_then(Value::as_scalar), None);
    }

    #[test]
    fn records_comments_with_indices() {
        let t = ParamTemplate::parse(NAMELIST);
        assert_eq!(
            t.comments(),
            &[
                (0, "# mosaic namelist".to_string()),
                (12, "# trailing comment".to_string())
            ]
        );
    }

    #[test]
    fn every_parameter_has_an_index() {
        let t = ParamTemplate::parse(NAMELIST);
        for (key, value) in t.parameters() {
            match value {
                Value::Scalar(_) => assert!(t.line_of(key).is_some()),
                Value::Section(m) => {
                    for nk in m.keys() {
                        assert!(t.line_of_in(key, nk).is_some());
                    }
                }
            }
        }
    }

    #[test]
    fn render_without_overrides_normalizes_only_parameter_lines() {
        let t = ParamTemplate::parse(NAMELIST);
        let out = t.render(no_overrides()).unwrap();
        let lines: Vec<&str> = out.split_inclusive('\n').collect();
        assert_eq!(lines.len(), t.lines().len());
        assert_eq!(lines[2], "run_mosaic_geom = 1\n");
        assert_eq!(lines[3], "BACKGROUND_SUBTRACTION = \n");
        for i in [0, 4, 7, 8, 9, 11, 12] {
            assert_eq!(lines[i], t.lines()[i]);
        }
    }

    #[test]
    fn canonical_template_round_trips() {
        let text = "# header\na = 1\n\n&S\nb = 2\n&END\n";
        let t = ParamTemplate::parse(text);
        assert_eq!(t.render(no_overrides()).unwrap(), text);
    }

    #[test]
    fn section_update_touches_one_line() {
        let mut t = ParamTemplate::parse(NAMELIST);
        let before = t.render(no_overrides()).unwrap();
        t.update([("SNESTIMATORIN", Value::section([("Gain", 5)]))])
            .unwrap();
        let after = t.render(no_overrides()).unwrap();
        let changed: Vec<usize> = before
            .split_inclusive('\n')
            .zip(after.split_inclusive('\n'))
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(changed, vec![5]);
        assert_eq!(t.get_in("SNESTIMATORIN", "Gain"), Some("5"));
        assert_eq!(t.get_in("SNESTIMATORIN", "Read_Noise"), Some("40.0"));
    }

    #[test]
    fn render_overrides_do_not_mutate() {
        let t = ParamTemplate::parse(NAMELIST);
        let out = t.render([("run_overlap", Value::scalar(0))]).unwrap();
        assert!(out.contains("run_overlap = 0\n"));
        assert_eq!(t.get("run_overlap"), Some(&Value::from("1")));
    }

    #[test]
    fn scalar_update_replaces() {
        let mut t = ParamTemplate::parse(NAMELIST);
        t.update([("run_overlap", Value::scalar(2.5))]).unwrap();
        assert_eq!(t.get("run_overlap"), Some(&Value::from("2.5")));
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let t = ParamTemplate::parse("a = 1\na = 2\n");
        assert_eq!(t.get("a"), Some(&Value::from("2")));
        assert_eq!(t.line_of("a"), Some(1));
        let out = t.render([("a", Value::from("3"))]).unwrap();
        assert_eq!(out, "a = 1\na = 3\n");
    }

    #[test]
    fn value_keeps_extra_equals() {
        let t = ParamTemplate::parse("expr = a=b\n");
        assert_eq!(t.get("expr"), Some(&Value::from("a=b")));
    }

    #[test]
    fn end_marker_is_prefix_and_bare_ampersand_is_top_level() {
        let t = ParamTemplate::parse("&S\nx = 1\n&ENDS\ny = 2\n&\nz = 3\n");
        assert_eq!(t.get_in("S", "x"), Some("1"));
        assert_eq!(t.get("y"), Some(&Value::from("2")));
        assert_eq!(t.get("z"), Some(&Value::from("3")));
    }

    #[test]
    fn rejects_unknown_and_mismatched_overrides() {
        let mut t = ParamTemplate::parse(NAMELIST);
        assert!(matches!(
            t.update([("nope", Value::from("1"))]),
            Err(Error::UnknownParameter(_))
        ));
        assert!(matches!(
            t.update([("SNESTIMATORIN", Value::section([("Nope", 1)]))]),
            Err(Error::UnknownParameter(k)) if k == "SNESTIMATORIN.Nope"
        ));
        assert!(matches!(
            t.update([("SNESTIMATORIN", Value::from("1"))]),
            Err(Error::ParameterShape(_))
        ));
        assert!(matches!(
            t.render([("run_overlap", Value::section([("a", 1)]))]),
            Err(Error::ParameterShape(_))
        ));
        assert_eq!(t, ParamTemplate::parse(NAMELIST));
    }

    #[test]
    fn missing_trailing_newline_is_kept_for_untouched_lines() {
        let t = ParamTemplate::parse("# only a comment");
        assert_eq!(t.render(no_overrides()).unwrap(), "# only a comment");
    }

    #[test]
    fn dump_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("template.nl");
        fs::write(&src, NAMELIST).unwrap();
        let t = ParamTemplate::open(&src).unwrap();
        let out = dir.path().join("job.nl");
        let written = t
            .dump(&out, [("MOSAICINTIN", Value::section([("INTERPOLATION_METHOD", 2)]))])
            .unwrap();
        assert_eq!(written, out);
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("INTERPOLATION_METHOD = 2\n"));
        assert_eq!(text.lines().count(), NAMELIST.lines().count());
    }
}
