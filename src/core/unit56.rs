//! Codec for unit 56 abundance-override files.
//!
//! A `fort.56` file lists changes to chemical abundances: a count line, then
//! one `atomic-number abundance` pair per line.

use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};

/// One abundance override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Abundance {
    /// Atomic number of the element.
    pub atomic_number: u32,
    /// Abundance as a number fraction.
    pub abundance: f64,
}

/// Parse the contents of a unit 56 file.
pub fn parse_unit56(text: &str) -> Result<Vec<Abundance>> {
    let mut lines = text.lines();
    let header = lines.next().ok_or_else(|| anyhow!("unit 56 is empty"))?;
    let count: usize = header
        .trim()
        .parse()
        .with_context(|| format!("unit 56 count line {header:?}"))?;

    let records: Vec<&str> = lines.collect();
    // The count is file-provided; reserve no more than the records present.
    let mut abundances = Vec::with_capacity(count.min(records.len()));
    for line in records {
        let mut fields = line.split_whitespace();
        let (Some(atom), Some(abn)) = (fields.next(), fields.next()) else {
            return Err(anyhow!("unit 56 record {line:?} is malformed"));
        };
        abundances.push(Abundance {
            atomic_number: atom
                .parse()
                .with_context(|| format!("unit 56 atomic number {atom:?}"))?,
            abundance: abn
                .parse()
                .with_context(|| format!("unit 56 abundance {abn:?}"))?,
        });
    }
    if abundances.len() != count {
        return Err(anyhow!(
            "unit 56 has {} records, but {count} expected",
            abundances.len()
        ));
    }
    ensure_unique(&abundances)?;
    Ok(abundances)
}

/// Render abundances as unit 56 file contents.
pub fn render_unit56(abundances: &[Abundance]) -> Result<String> {
    ensure_unique(abundances)?;
    let mut out = format!("{}\n", abundances.len());
    for entry in abundances {
        if !(1..=118).contains(&entry.atomic_number) {
            return Err(anyhow!("atomic number {} out of range", entry.atomic_number));
        }
        if !(0.0..=1.0).contains(&entry.abundance) {
            return Err(anyhow!(
                "abundance {} out of range (0 to 1)",
                entry.abundance
            ));
        }
        out.push_str(&format!("{} {:.6e}\n", entry.atomic_number, entry.abundance));
    }
    Ok(out)
}

fn ensure_unique(abundances: &[Abundance]) -> Result<()> {
    let mut seen = HashSet::new();
    for entry in abundances {
        if !seen.insert(entry.atomic_number) {
            return Err(anyhow!(
                "atomic numbers must be unique (duplicate {})",
                entry.atomic_number
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_record() {
        let parsed = parse_unit56("1\n8 3.847575e-03\n").expect("parse");
        assert_eq!(
            parsed,
            vec![Abundance {
                atomic_number: 8,
                abundance: 3.847575e-3,
            }]
        );
    }

    #[test]
    fn parses_empty_table() {
        assert_eq!(parse_unit56("0\n").expect("parse"), Vec::new());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_unit56("").is_err());
    }

    #[test]
    fn record_count_mismatch_is_an_error() {
        let err = parse_unit56("3\n1 1.2e-04\n2 1.4e-04\n").expect_err("mismatch");
        assert!(err.to_string().contains("3 expected"));
    }

    /// Verifies a count far beyond the records present fails the mismatch
    /// check instead of sizing a buffer to the count.
    #[test]
    fn huge_count_is_an_error() {
        let err = parse_unit56("999999999999\n8 1.0e-03\n").expect_err("bogus count");
        assert!(err.to_string().contains("999999999999 expected"));
    }

    #[test]
    fn duplicate_atoms_are_rejected() {
        assert!(parse_unit56("2\n8 1.0e-03\n8 2.0e-03\n").is_err());
    }

    #[test]
    fn render_matches_fixed_format() {
        let rendered = render_unit56(&[Abundance {
            atomic_number: 8,
            abundance: 3.847575e-3,
        }])
        .expect("render");
        assert_eq!(rendered, "1\n8 3.847575e-3\n");
    }

    #[test]
    fn render_validates_ranges() {
        let out_of_range = [Abundance {
            atomic_number: 119,
            abundance: 0.1,
        }];
        assert!(render_unit56(&out_of_range).is_err());

        let bad_fraction = [Abundance {
            atomic_number: 8,
            abundance: 1.5,
        }];
        assert!(render_unit56(&bad_fraction).is_err());
    }
}
