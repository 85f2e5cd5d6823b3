//! Atmosphere file reader and writer.
//!
//! Layout of an atmosphere file:
//!
//! ```text
//! # free-form header lines ...
//! #SPECIES
//! H2 He H2O CO
//! #TEADATA
//! #Radius   Pressure    Temp       H2         He        H2O         CO
//!  7000.000 1.0000e+02 1500.00 8.5000e-01 1.4900e-01 5.0000e-04 5.0000e-04
//!  ...
//! ```
//!
//! Files come with either pressure ordering. The parsed representation is
//! always **increasing pressure**; the original ordering is remembered and
//! restored when writing, so callers never branch on ordering themselves.

use std::fs;
use std::path::Path;

use nalgebra::DMatrix;

use crate::domain::PressureOrder;
use crate::error::AppError;

const SPECIES_MARKER: &str = "#SPECIES";
const DATA_MARKER: &str = "#TEADATA";

/// A parsed atmosphere file (layers in increasing pressure).
#[derive(Debug, Clone)]
pub struct AtmosphereFile {
    /// Header lines up to and including the data column header, verbatim.
    pub header: Vec<String>,
    /// Species names from the `#SPECIES` line.
    pub species: Vec<String>,
    /// Abundance column names from the data header (after radius, pressure, temperature).
    pub columns: Vec<String>,
    /// Pressure ordering found in the file.
    pub order: PressureOrder,
    /// Layer radius (km).
    pub radius: Vec<f64>,
    /// Layer pressure (bar), strictly increasing.
    pub pressure: Vec<f64>,
    /// Layer temperature (K).
    pub temperature: Vec<f64>,
    /// Mixing ratios indexed `[species, layer]`.
    pub abundances: DMatrix<f64>,
}

impl AtmosphereFile {
    pub fn n_layers(&self) -> usize {
        self.pressure.len()
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    /// Index of a species by its `#SPECIES` name or its data-column name.
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species
            .iter()
            .position(|s| s == name)
            .or_else(|| self.columns.iter().position(|c| c == name))
    }

    /// Render the file with replacement radius, temperature, and abundances.
    ///
    /// All inputs are in increasing pressure; rows are emitted in the file's
    /// original ordering.
    pub fn render(
        &self,
        radius: &[f64],
        temperature: &[f64],
        abundances: &DMatrix<f64>,
    ) -> Result<String, AppError> {
        let n = self.n_layers();
        if radius.len() != n || temperature.len() != n {
            return Err(AppError::input(format!(
                "Atmosphere has {n} layers but got {} radii and {} temperatures.",
                radius.len(),
                temperature.len()
            )));
        }
        if abundances.nrows() != self.n_species() || abundances.ncols() != n {
            return Err(AppError::input(format!(
                "Abundance table is {}x{}, expected {}x{n}.",
                abundances.nrows(),
                abundances.ncols(),
                self.n_species()
            )));
        }

        let mut out = String::new();
        for line in &self.header {
            out.push_str(line);
            out.push('\n');
        }

        let rows: Box<dyn Iterator<Item = usize>> = match self.order {
            PressureOrder::Increasing => Box::new(0..n),
            PressureOrder::Decreasing => Box::new((0..n).rev()),
        };
        for i in rows {
            out.push_str(&format!("{:10.3} ", radius[i]));
            out.push_str(&format!("{:>10} ", fmt_sci(self.pressure[i], 4)));
            out.push_str(&format!("{:7.2} ", temperature[i]));
            for s in 0..self.n_species() {
                out.push_str(&fmt_sci(abundances[(s, i)], 4));
                out.push(' ');
            }
            out.push('\n');
        }
        Ok(out)
    }
}

/// Read and parse an atmosphere file.
pub fn read_atm(path: &Path) -> Result<AtmosphereFile, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::input(format!("Failed to read atmosphere file '{}': {e}", path.display()))
    })?;
    parse_atm(&text).map_err(|e| {
        AppError::new(
            e.exit_code(),
            format!("Atmosphere file '{}': {}", path.display(), e.message()),
        )
    })
}

/// Parse atmosphere file text.
pub fn parse_atm(text: &str) -> Result<AtmosphereFile, AppError> {
    let lines: Vec<&str> = text.lines().collect();

    let i_species = find_marker(&lines, SPECIES_MARKER)?;
    let species: Vec<String> = lines
        .get(i_species + 1)
        .map(|l| l.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    if species.is_empty() {
        return Err(AppError::input("no species listed after #SPECIES"));
    }

    let i_data = find_marker(&lines, DATA_MARKER)?;
    let header_line = lines
        .get(i_data + 1)
        .ok_or_else(|| AppError::input("missing column header after #TEADATA"))?;
    let headers: Vec<&str> = header_line.split_whitespace().collect();
    let n_cols = headers.len();
    if n_cols != species.len() + 3 {
        return Err(AppError::input(format!(
            "data header has {n_cols} columns but #SPECIES lists {} species (expected {})",
            species.len(),
            species.len() + 3
        )));
    }
    let columns: Vec<String> = headers[3..].iter().map(|s| s.to_string()).collect();

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (idx, line) in lines.iter().enumerate().skip(i_data + 2) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != n_cols {
            return Err(AppError::input(format!(
                "line {}: expected {n_cols} columns, found {}",
                idx + 1,
                fields.len()
            )));
        }
        let row = fields
            .iter()
            .map(|f| {
                f.parse::<f64>()
                    .map_err(|_| AppError::input(format!("line {}: invalid number '{f}'", idx + 1)))
            })
            .collect::<Result<Vec<f64>, AppError>>()?;
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(AppError::input("no layer rows after #TEADATA"));
    }

    let raw_pressure: Vec<f64> = rows.iter().map(|r| r[1]).collect();
    let order = PressureOrder::detect(&raw_pressure);
    if order == PressureOrder::Decreasing {
        rows.reverse();
    }
    if rows.windows(2).any(|w| !(w[1][1] > w[0][1])) {
        return Err(AppError::input("layer pressures are not strictly monotonic"));
    }

    let n_layers = rows.len();
    let n_species = species.len();
    let abundances = DMatrix::from_fn(n_species, n_layers, |s, i| rows[i][s + 3]);

    Ok(AtmosphereFile {
        header: lines[..i_data + 2].iter().map(|s| s.to_string()).collect(),
        species,
        columns,
        order,
        radius: rows.iter().map(|r| r[0]).collect(),
        pressure: rows.iter().map(|r| r[1]).collect(),
        temperature: rows.iter().map(|r| r[2]).collect(),
        abundances,
    })
}

fn find_marker(lines: &[&str], marker: &str) -> Result<usize, AppError> {
    lines
        .iter()
        .position(|l| l.trim() == marker)
        .ok_or_else(|| AppError::input(format!("missing {marker} marker")))
}

/// Scientific notation with a signed, two-digit exponent (`1.2346e-05`).
pub fn fmt_sci(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let raw = format!("{value:.precision$e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
# test atmosphere
ur 1.0
#SPECIES
H2 He H2O
#TEADATA
#Radius    Pressure   Temp     H2        He        H2O
  7100.000 1.0000e-04 1200.00 8.5000e-01 1.0000e-01 5.0000e-02
  7050.000 1.0000e-02 1300.00 8.0000e-01 1.5000e-01 5.0000e-02
  7000.000 1.0000e+00 1400.00 8.0000e-01 1.5000e-01 5.0000e-02
";

    #[test]
    fn fmt_sci_uses_two_digit_signed_exponent() {
        assert_eq!(fmt_sci(100.0, 4), "1.0000e+02");
        assert_eq!(fmt_sci(1.23457e-5, 4), "1.2346e-05");
        assert_eq!(fmt_sci(0.0, 4), "0.0000e+00");
        assert_eq!(fmt_sci(-2.5e120, 2), "-2.50e+120");
    }

    #[test]
    fn increasing_file_is_kept_in_order() {
        let atm = parse_atm(FIXTURE).unwrap();
        // The fixture lists pressure increasing (top of atmosphere first).
        assert_eq!(atm.order, PressureOrder::Increasing);
        assert_eq!(atm.pressure, vec![1e-4, 1e-2, 1.0]);
        assert_eq!(atm.species, vec!["H2", "He", "H2O"]);
        assert_eq!(atm.abundances[(0, 0)], 0.85);
        assert_eq!(atm.abundances[(2, 2)], 0.05);
    }

    #[test]
    fn decreasing_file_is_canonicalized_and_restored() {
        let mut lines: Vec<&str> = FIXTURE.lines().collect();
        let data = lines.split_off(6);
        lines.extend(data.iter().rev());
        let text = lines.join("\n");

        let atm = parse_atm(&text).unwrap();
        assert_eq!(atm.order, PressureOrder::Decreasing);
        assert_eq!(atm.pressure, vec![1e-4, 1e-2, 1.0]);
        assert_eq!(atm.radius, vec![7100.0, 7050.0, 7000.0]);

        let rendered = atm.render(&atm.radius, &atm.temperature, &atm.abundances).unwrap();
        let reparsed = parse_atm(&rendered).unwrap();
        assert_eq!(reparsed.order, PressureOrder::Decreasing);
        let first_row = rendered.lines().nth(6).unwrap();
        assert_eq!(
            first_row,
            "  7000.000 1.0000e+00 1400.00 8.0000e-01 1.5000e-01 5.0000e-02 "
        );
    }

    #[test]
    fn header_lines_are_preserved_verbatim() {
        let atm = parse_atm(FIXTURE).unwrap();
        let rendered = atm.render(&atm.radius, &atm.temperature, &atm.abundances).unwrap();
        let head: Vec<&str> = rendered.lines().take(6).collect();
        let expected: Vec<&str> = FIXTURE.lines().take(6).collect();
        assert_eq!(head, expected);
    }

    #[test]
    fn missing_markers_are_reported() {
        let err = parse_atm("#TEADATA\n#R P T H2\n1 1 1 1\n").unwrap_err();
        assert!(err.message().contains("#SPECIES"));

        let err = parse_atm("#SPECIES\nH2\n").unwrap_err();
        assert!(err.message().contains("#TEADATA"));
    }

    #[test]
    fn column_mismatches_are_reported() {
        let text = "#SPECIES\nH2 He\n#TEADATA\n#R P T H2\n1 1 1 1\n";
        let err = parse_atm(text).unwrap_err();
        assert!(err.message().contains("expected 5"));

        let text = "#SPECIES\nH2 He\n#TEADATA\n#R P T H2 He\n1 1 1 1\n";
        let err = parse_atm(text).unwrap_err();
        assert!(err.message().contains("line 5"));
    }

    #[test]
    fn species_lookup_accepts_column_names() {
        let text = "#SPECIES\nH2_ref He_ref H2O_g\n#TEADATA\n#R P T H2 He H2O\n1 1 1 0.8 0.1 0.1\n";
        let atm = parse_atm(text).unwrap();
        assert_eq!(atm.species_index("H2O"), Some(2));
        assert_eq!(atm.species_index("H2O_g"), Some(2));
        assert_eq!(atm.species_index("CO"), None);
    }
}
