//! Transit configuration rewriting.
//!
//! The best-fit transit run reuses the retrieval's transit config verbatim,
//! except that its `atm` entry points at the freshly written best-fit
//! atmosphere file.

use std::fs;
use std::path::Path;

use crate::error::AppError;

/// Name of the rewritten config inside the output directory.
pub const BEST_FIT_TCONFIG: &str = "bestFit_tconfig.cfg";

/// Replace the `atm` line of `template` with one pointing at `atm_path`.
///
/// Only the first `atm` entry changes; every other line is kept verbatim.
pub fn rewrite_atm_line(template: &str, atm_path: &Path) -> Result<String, AppError> {
    let mut replaced = false;
    let mut out = String::with_capacity(template.len() + 64);
    for line in template.lines() {
        let is_atm = line.split_whitespace().next() == Some("atm");
        if is_atm && !replaced {
            out.push_str(&format!("atm {}", atm_path.display()));
            replaced = true;
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    if !replaced {
        return Err(AppError::input("transit config has no `atm` entry to rewrite"));
    }
    Ok(out)
}

/// Write `bestFit_tconfig.cfg` into `output_dir` from the template `tconfig`.
pub fn write_best_fit_tconfig(
    tconfig: &Path,
    atm_path: &Path,
    output_dir: &Path,
) -> Result<std::path::PathBuf, AppError> {
    let template = fs::read_to_string(tconfig).map_err(|e| {
        AppError::input(format!("Failed to read transit config '{}': {e}", tconfig.display()))
    })?;
    let text = rewrite_atm_line(&template, atm_path)
        .map_err(|e| AppError::input(format!("Transit config '{}': {}", tconfig.display(), e.message())))?;

    let out_path = output_dir.join(BEST_FIT_TCONFIG);
    fs::write(&out_path, text).map_err(|e| {
        AppError::output(format!("Failed to write '{}': {e}", out_path.display()))
    })?;
    Ok(out_path)
}
