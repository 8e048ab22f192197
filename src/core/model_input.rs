//! Reader for the list-directed head of a model input (`{model}.5`) file.
//!
//! Covers the part of unit 5 shared by every model: stellar parameters, the
//! LTE switches, the standard-input filename, and the explicit atom and ion
//! lists. The numerical depth data that follows is left to the program.

use anyhow::{Result, anyhow};

use crate::core::fortran::{Token, token_lines};

/// Basic parameters from the first input line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StellarParams {
    /// Classical stellar atmosphere: effective temperature and log gravity.
    Star { teff: f64, grav: f64 },
    /// Accretion disk around a star of mass `xmstar`.
    Disk {
        xmstar: f64,
        xmdot: f64,
        rstar: f64,
        reldst: f64,
    },
    /// Disk ring described directly by temperature, gravity and column mass.
    DiskRing { teff: f64, qgrav: f64, dmtot: f64 },
}

/// One explicit-atom record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomConfig {
    pub mode: i64,
    pub abundance: f64,
    pub modpf: i64,
}

/// One explicit-ion record.
#[derive(Debug, Clone, PartialEq)]
pub struct IonConfig {
    pub iat: i64,
    pub iz: i64,
    pub nlevs: i64,
    pub ilvlin: i64,
    pub nonstd: i64,
    pub typion: String,
    pub filei: String,
}

/// Parsed head of a model input file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub params: StellarParams,
    pub lte: bool,
    pub ltgray: bool,
    /// Name of the standard (non-default) parameter file.
    pub finstd: String,
    pub nfread: i64,
    pub atoms: Vec<AtomConfig>,
    pub ions: Vec<IonConfig>,
}

/// Parse the head of a `{model}.5` file.
pub fn parse_model_input(text: &str) -> Result<ModelInput> {
    let lines = token_lines(text);

    let params = parse_params(line_at(&lines, 0, "stellar parameters")?)?;

    let flags = line_at(&lines, 1, "lte flags")?;
    let lte = logical_token(flags, 0, "lte flag")?;
    let ltgray = logical_token(flags, 1, "ltgray flag")?;

    let finstd = text_token(
        line_at(&lines, 2, "standard input filename")?,
        0,
        "standard input filename",
    )?;
    let nfread = int_token(line_at(&lines, 3, "nfread")?, 0, "nfread")?;
    let natoms = int_token(line_at(&lines, 4, "natoms")?, 0, "natoms")?;
    let natoms = usize::try_from(natoms).map_err(|_| anyhow!("natoms must be non-negative"))?;

    // The count is file-provided; reserve no more than the lines present.
    let mut atoms = Vec::with_capacity(natoms.min(lines.len().saturating_sub(5)));
    for index in 0..natoms {
        let atom = line_at(&lines, 5 + index, "atom record")?;
        atoms.push(AtomConfig {
            mode: int_token(atom, 0, "atom mode")?,
            abundance: float_token(atom, 1, "atom abundance")?,
            modpf: int_token(atom, 2, "atom modpf")?,
        });
    }

    // Ion records run to the end of the token stream; a non-zero fourth value
    // closes the list for one atom and carries no ion of its own.
    let mut ions = Vec::new();
    for ion in lines.iter().skip(5 + natoms) {
        let ion = ion.as_slice();
        if int_token(ion, 3, "ion ilast")? != 0 {
            continue;
        }
        ions.push(IonConfig {
            iat: int_token(ion, 0, "ion iat")?,
            iz: int_token(ion, 1, "ion iz")?,
            nlevs: int_token(ion, 2, "ion nlevs")?,
            ilvlin: int_token(ion, 4, "ion ilvlin")?,
            nonstd: int_token(ion, 5, "ion nonstd")?,
            typion: text_token(ion, 6, "ion typion")?,
            filei: text_token(ion, 7, "ion filei")?,
        });
    }

    Ok(ModelInput {
        params,
        lte,
        ltgray,
        finstd,
        nfread,
        atoms,
        ions,
    })
}

fn parse_params(line: &[Token]) -> Result<StellarParams> {
    if line.len() == 2 {
        return Ok(StellarParams::Star {
            teff: float_token(line, 0, "teff")?,
            grav: float_token(line, 1, "grav")?,
        });
    }
    let xmstar = float_token(line, 0, "xmstar")?;
    if xmstar > 0.0 {
        Ok(StellarParams::Disk {
            xmstar,
            xmdot: float_token(line, 1, "xmdot")?,
            rstar: float_token(line, 2, "rstar")?,
            reldst: float_token(line, 3, "reldst")?,
        })
    } else if xmstar == 0.0 {
        Ok(StellarParams::DiskRing {
            teff: float_token(line, 1, "teff")?,
            qgrav: float_token(line, 2, "qgrav")?,
            dmtot: float_token(line, 3, "dmtot")?,
        })
    } else {
        Err(anyhow!("negative xmstar {xmstar} in model input"))
    }
}

fn line_at<'a>(lines: &'a [Vec<Token>], index: usize, what: &str) -> Result<&'a [Token]> {
    lines
        .get(index)
        .map(Vec::as_slice)
        .ok_or_else(|| anyhow!("model input ends before {what}"))
}

fn token<'a>(line: &'a [Token], pos: usize, what: &str) -> Result<&'a Token> {
    line.get(pos)
        .ok_or_else(|| anyhow!("model input is missing {what}"))
}

fn int_token(line: &[Token], pos: usize, what: &str) -> Result<i64> {
    token(line, pos, what)?
        .as_int()
        .ok_or_else(|| anyhow!("model input {what} is not an integer"))
}

fn float_token(line: &[Token], pos: usize, what: &str) -> Result<f64> {
    token(line, pos, what)?
        .as_float()
        .ok_or_else(|| anyhow!("model input {what} is not a number"))
}

fn logical_token(line: &[Token], pos: usize, what: &str) -> Result<bool> {
    token(line, pos, what)?
        .as_logical()
        .ok_or_else(|| anyhow!("model input {what} is not a logical"))
}

fn text_token(line: &[Token], pos: usize, what: &str) -> Result<String> {
    token(line, pos, what)?
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("model input {what} is not a string"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAR_DECK: &str = "\
* model hhe35lt
35000. 4.0
T F
'nstd.dat'
0
2
1 0. 0
2 0. 0
1 0 9 0 0 0 ' H 1' 'none'
1 1 1 1 0 0 ' H 2' ' '
0 0 0 -1 0 0 ' ' ' '
";

    /// Verifies a classical stellar deck parses end to end: parameters,
    /// switches, atom list and the open ion records.
    #[test]
    fn parses_star_deck() {
        let input = parse_model_input(STAR_DECK).expect("parse");
        assert_eq!(
            input.params,
            StellarParams::Star {
                teff: 35_000.0,
                grav: 4.0,
            }
        );
        assert!(input.lte);
        assert!(!input.ltgray);
        assert_eq!(input.finstd, "nstd.dat");
        assert_eq!(input.nfread, 0);
        assert_eq!(
            input.atoms,
            vec![
                AtomConfig {
                    mode: 1,
                    abundance: 0.0,
                    modpf: 0,
                },
                AtomConfig {
                    mode: 2,
                    abundance: 0.0,
                    modpf: 0,
                },
            ]
        );
        // Records with a non-zero close marker carry no ion.
        assert_eq!(input.ions.len(), 1);
        assert_eq!(input.ions[0].iat, 1);
        assert_eq!(input.ions[0].nlevs, 9);
        assert_eq!(input.ions[0].typion, " H 1");
        assert_eq!(input.ions[0].filei, "none");
    }

    #[test]
    fn parses_disk_parameters() {
        let deck = "1.5 1.0e18 9.0e8 0.5\nT T\n'nstd.dat'\n0\n0\n";
        let input = parse_model_input(deck).expect("parse");
        assert_eq!(
            input.params,
            StellarParams::Disk {
                xmstar: 1.5,
                xmdot: 1.0e18,
                rstar: 9.0e8,
                reldst: 0.5,
            }
        );
        assert!(input.atoms.is_empty());
        assert!(input.ions.is_empty());
    }

    #[test]
    fn zero_mass_selects_ring_parameters() {
        let deck = "0 12000. 0.5 1.0e3\nF F\n'nstd.dat'\n0\n0\n";
        let input = parse_model_input(deck).expect("parse");
        assert_eq!(
            input.params,
            StellarParams::DiskRing {
                teff: 12_000.0,
                qgrav: 0.5,
                dmtot: 1.0e3,
            }
        );
    }

    #[test]
    fn negative_mass_is_rejected() {
        let deck = "-1. 1. 1. 1.\nT T\n'nstd.dat'\n0\n0\n";
        assert!(parse_model_input(deck).is_err());
    }

    #[test]
    fn truncated_deck_names_missing_part() {
        let err = parse_model_input("35000. 4.0\nT F\n").expect_err("truncated");
        assert!(
            err.to_string()
                .contains("ends before standard input filename")
        );
    }

    /// Verifies an atom count far beyond the deck's lines fails on the first
    /// missing record instead of sizing a buffer to the count.
    #[test]
    fn huge_atom_count_is_an_error() {
        let deck = "35000. 4.0\nT F\n'nstd.dat'\n0\n999999999999\n";
        let err = parse_model_input(deck).expect_err("bogus count");
        assert!(err.to_string().contains("ends before atom record"));
    }
}
