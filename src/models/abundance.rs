//! Abundance scaling, H2/He renormalization, and mean molecular mass.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use nalgebra::DMatrix;

use crate::error::AppError;
use crate::io::atm::AtmosphereFile;

/// Multiply each `molfit` species' abundance column by `10^factor`.
///
/// Returns a new `[species, layer]` matrix; the atmosphere itself is not touched.
pub fn scale_abundances(
    atm: &AtmosphereFile,
    molfit: &[String],
    factors: &[f64],
) -> Result<DMatrix<f64>, AppError> {
    if molfit.len() != factors.len() {
        return Err(AppError::input(format!(
            "{} molecules to fit but {} abundance factors.",
            molfit.len(),
            factors.len()
        )));
    }
    let mut abundances = atm.abundances.clone();
    for (name, &factor) in molfit.iter().zip(factors) {
        let row = atm
            .species_index(name)
            .ok_or_else(|| AppError::input(format!("Molecule '{name}' is not in the atmosphere file.")))?;
        let scale = 10f64.powf(factor);
        abundances.row_mut(row).iter_mut().for_each(|x| *x *= scale);
    }
    Ok(abundances)
}

/// Absorb each layer's excess over unit sum into H2 and He.
///
/// The excess is split in proportion to the layer's H2 and He abundances, so
/// their ratio is preserved. A negative result is rejected rather than
/// written out.
pub fn renormalize_h2_he(abundances: &mut DMatrix<f64>, atm: &AtmosphereFile) -> Result<(), AppError> {
    let ih2 = atm
        .species_index("H2")
        .ok_or_else(|| AppError::physical("Atmosphere file has no H2 column to renormalize against."))?;
    let ihe = atm
        .species_index("He")
        .ok_or_else(|| AppError::physical("Atmosphere file has no He column to renormalize against."))?;

    for layer in 0..abundances.ncols() {
        let excess = abundances.column(layer).sum() - 1.0;
        let h2 = abundances[(ih2, layer)];
        let he = abundances[(ihe, layer)];
        let background = h2 + he;
        if background <= 0.0 {
            if excess.abs() > 1e-12 {
                return Err(AppError::physical(format!(
                    "Layer {layer}: no H2/He left to absorb an abundance excess of {excess:.4e}."
                )));
            }
            continue;
        }
        abundances[(ih2, layer)] = h2 - excess * h2 / background;
        abundances[(ihe, layer)] = he - excess * he / background;
    }

    if let Some(((s, layer), value)) = abundances
        .iter()
        .enumerate()
        .map(|(k, &v)| ((k % abundances.nrows(), k / abundances.nrows()), v))
        .find(|&(_, v)| v < 0.0)
    {
        let name = atm.species.get(s).map(String::as_str).unwrap_or("?");
        return Err(AppError::physical(format!(
            "Layer {layer}: {name} abundance is negative ({value:.4e}) after renormalization."
        )));
    }
    Ok(())
}

/// Atomic masses (g/mol) by element symbol.
#[derive(Debug, Clone)]
pub struct AtomicMasses {
    masses: HashMap<String, f64>,
}

const BUILTIN_MASSES: &[(&str, f64)] = &[
    ("H", 1.00794),
    ("He", 4.002602),
    ("Li", 6.941),
    ("C", 12.0107),
    ("N", 14.0067),
    ("O", 15.9994),
    ("F", 18.9984032),
    ("Ne", 20.1797),
    ("Na", 22.98976928),
    ("Mg", 24.305),
    ("Al", 26.9815386),
    ("Si", 28.0855),
    ("P", 30.973762),
    ("S", 32.065),
    ("Cl", 35.453),
    ("Ar", 39.948),
    ("K", 39.0983),
    ("Ca", 40.078),
    ("Ti", 47.867),
    ("V", 50.9415),
    ("Cr", 51.9961),
    ("Fe", 55.845),
];

impl AtomicMasses {
    pub fn builtin() -> Self {
        Self {
            masses: BUILTIN_MASSES.iter().map(|&(s, m)| (s.to_string(), m)).collect(),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.masses.get(symbol).copied()
    }

    /// Molecular mass of a species name such as `H2O` or `CO2_g`.
    pub fn molecular_mass(&self, species: &str) -> Result<f64, AppError> {
        let formula = species.split('_').next().unwrap_or(species);
        let mut total = 0.0;
        let mut chars = formula.chars().peekable();
        while let Some(c) = chars.next() {
            if !c.is_ascii_uppercase() {
                return Err(AppError::input(format!(
                    "Cannot parse species formula '{species}' at '{c}'."
                )));
            }
            let mut symbol = c.to_string();
            while let Some(&l) = chars.peek().filter(|l| l.is_ascii_lowercase()) {
                symbol.push(l);
                chars.next();
            }
            let mut digits = String::new();
            while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(d);
                chars.next();
            }
            let count: f64 = if digits.is_empty() {
                1.0
            } else {
                digits
                    .parse::<u32>()
                    .map(f64::from)
                    .map_err(|e| AppError::input(format!("Bad atom count in '{species}': {e}")))?
            };
            let mass = self
                .get(&symbol)
                .ok_or_else(|| AppError::input(format!("Unknown element '{symbol}' in species '{species}'.")))?;
            total += count * mass;
        }
        if total == 0.0 {
            return Err(AppError::input(format!("Empty species formula '{species}'.")));
        }
        Ok(total)
    }
}

/// Read an elemental abundance file (`Z symbol dex name mass` per line).
pub fn read_abundance_file(path: &Path) -> Result<AtomicMasses, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read abundance file '{}': {e}", path.display())))?;
    parse_abundance_file(&text)
}

pub fn parse_abundance_file(text: &str) -> Result<AtomicMasses, AppError> {
    let mut masses = HashMap::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(AppError::input(format!(
                "Abundance file line {}: expected 5 columns, found {}.",
                idx + 1,
                fields.len()
            )));
        }
        let mass: f64 = fields[4]
            .parse()
            .map_err(|e| AppError::input(format!("Abundance file line {}: bad mass: {e}", idx + 1)))?;
        masses.insert(fields[1].to_string(), mass);
    }
    if masses.is_empty() {
        return Err(AppError::input("Abundance file lists no elements."));
    }
    Ok(AtomicMasses { masses })
}

/// Per-layer mean molecular mass `sum_i x_i m_i` (g/mol).
pub fn mean_molar_mass(
    abundances: &DMatrix<f64>,
    species: &[String],
    masses: &AtomicMasses,
) -> Result<Vec<f64>, AppError> {
    let molecular: Vec<f64> = species
        .iter()
        .map(|s| masses.molecular_mass(s))
        .collect::<Result<_, _>>()?;
    Ok(abundances
        .column_iter()
        .map(|col| col.iter().zip(&molecular).map(|(x, m)| x * m).sum())
        .collect())
}
