//! Codec for unit 55, the synthesis run-configuration file.
//!
//! `fort.55` is eight lines of list-directed values controlling one synthesis
//! run. Field names follow the SYNSPEC documentation; most are mode switches,
//! line 6 carries the wavelength interval and line 7 the list of molecular
//! line-list units.

use anyhow::{Context, Result, anyhow};

use crate::core::fortran::parse_fortran_float;

/// Parsed contents of a `fort.55` file.
#[derive(Debug, Clone, PartialEq)]
pub struct SynConfig {
    pub imode: i32,
    pub idstd: i32,
    pub iprin: i32,
    pub inmod: i32,
    pub intrpl: i32,
    pub ichang: i32,
    pub ichemc: i32,
    pub iophli: i32,
    pub nunalp: i32,
    pub nunbet: i32,
    pub nungam: i32,
    pub nunbal: i32,
    pub ifreq: i32,
    pub inlte: i32,
    pub icontl: i32,
    pub inlist: i32,
    pub ifhe2: i32,
    pub ihydpr: i32,
    pub ihe1pr: i32,
    pub ihe2pr: i32,
    pub alam0: f64,
    pub alam1: f64,
    pub cutof0: f64,
    pub cutofs: f64,
    pub relop: f64,
    pub space: f64,
    /// Unit numbers of molecular line lists, count-prefixed on line 7.
    pub iunitm: Vec<i32>,
    pub vtb: f64,
}

/// Parse the contents of a unit 55 file.
pub fn parse_unit55(text: &str) -> Result<SynConfig> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return Err(anyhow!("unit 55 is empty"));
    }
    let line = |index: usize| -> Result<Vec<&str>> {
        let raw = lines
            .get(index)
            .ok_or_else(|| anyhow!("unit 55 is missing line {}", index + 1))?;
        Ok(raw.split_whitespace().collect())
    };

    let l1 = line(0)?;
    let l2 = line(1)?;
    let l3 = line(2)?;
    let l4 = line(3)?;
    let l5 = line(4)?;
    let l6 = line(5)?;
    let l7 = line(6)?;
    let l8 = line(7)?;

    let nunits: usize = {
        let raw = value_at(&l7, 7, 0)?;
        raw.parse()
            .with_context(|| format!("unit 55 line 7 count {raw:?}"))?
    };
    // The count is file-provided; reserve no more than the line holds.
    let mut iunitm = Vec::with_capacity(nunits.min(l7.len()));
    for pos in 1..=nunits {
        iunitm.push(int_at(&l7, 7, pos)?);
    }

    Ok(SynConfig {
        imode: int_at(&l1, 1, 0)?,
        idstd: int_at(&l1, 1, 1)?,
        iprin: int_at(&l1, 1, 2)?,
        inmod: int_at(&l2, 2, 0)?,
        intrpl: int_at(&l2, 2, 1)?,
        ichang: int_at(&l2, 2, 2)?,
        ichemc: int_at(&l2, 2, 3)?,
        iophli: int_at(&l3, 3, 0)?,
        nunalp: int_at(&l3, 3, 1)?,
        nunbet: int_at(&l3, 3, 2)?,
        nungam: int_at(&l3, 3, 3)?,
        nunbal: int_at(&l3, 3, 4)?,
        ifreq: int_at(&l4, 4, 0)?,
        inlte: int_at(&l4, 4, 1)?,
        icontl: int_at(&l4, 4, 2)?,
        inlist: int_at(&l4, 4, 3)?,
        ifhe2: int_at(&l4, 4, 4)?,
        ihydpr: int_at(&l5, 5, 0)?,
        ihe1pr: int_at(&l5, 5, 1)?,
        ihe2pr: int_at(&l5, 5, 2)?,
        alam0: float_at(&l6, 6, 0)?,
        alam1: float_at(&l6, 6, 1)?,
        cutof0: float_at(&l6, 6, 2)?,
        cutofs: float_at(&l6, 6, 3)?,
        relop: float_at(&l6, 6, 4)?,
        space: float_at(&l6, 6, 5)?,
        iunitm,
        vtb: float_at(&l8, 8, 0)?,
    })
}

/// Render a [`SynConfig`] as unit 55 file contents.
///
/// Line 7 is written space-separated with the conventional trailing `0i`
/// filler token, which list-directed reads (and [`parse_unit55`]) ignore.
pub fn render_unit55(config: &SynConfig) -> String {
    let mut line7 = config.iunitm.len().to_string();
    for unit in &config.iunitm {
        line7.push_str(&format!(" {unit}"));
    }
    line7.push_str(" 0i");

    let lines = [
        format!("{} {} {}", config.imode, config.idstd, config.iprin),
        format!(
            "{} {} {} {}",
            config.inmod, config.intrpl, config.ichang, config.ichemc
        ),
        format!(
            "{} {} {} {} {}",
            config.iophli, config.nunalp, config.nunbet, config.nungam, config.nunbal
        ),
        format!(
            "{} {} {} {} {}",
            config.ifreq, config.inlte, config.icontl, config.inlist, config.ifhe2
        ),
        format!("{} {} {}", config.ihydpr, config.ihe1pr, config.ihe2pr),
        format!(
            "{} {} {} {} {:.1e} {}",
            config.alam0, config.alam1, config.cutof0, config.cutofs, config.relop, config.space
        ),
        line7,
        config.vtb.to_string(),
    ];
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn value_at<'a>(fields: &[&'a str], line: usize, pos: usize) -> Result<&'a str> {
    fields
        .get(pos)
        .copied()
        .ok_or_else(|| anyhow!("unit 55 line {line} is missing value {}", pos + 1))
}

fn int_at(fields: &[&str], line: usize, pos: usize) -> Result<i32> {
    let raw = value_at(fields, line, pos)?;
    raw.parse()
        .with_context(|| format!("unit 55 line {line} value {raw:?}"))
}

fn float_at(fields: &[&str], line: usize, pos: usize) -> Result<f64> {
    let raw = value_at(fields, line, pos)?;
    parse_fortran_float(raw).with_context(|| format!("unit 55 line {line} value {raw:?}"))
}
