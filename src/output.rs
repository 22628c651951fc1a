use log::debug;
use std::io::{self, Write};

use crate::env::{Selection, VariableOrder};
use crate::error::Result;
use crate::utils::quote_value;

#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    pub json: bool,
    pub export: bool,
    pub verbose: bool,
}

/// Render one shell assignment line
pub fn shell_line(name: &str, value: &str, export: bool) -> String {
    let value = quote_value(value);
    if export {
        format!("export {}={}", name, value)
    } else {
        format!("{}={}", name, value)
    }
}

/// Render the selection as a single flat JSON object
pub fn render_json(selection: &Selection) -> Result<String> {
    Ok(serde_json::to_string(selection)?)
}

/// Render shell lines for every selected variable, in variable order
pub fn render_lines(selection: &Selection, order: &VariableOrder, export: bool) -> Vec<String> {
    order
        .iter()
        .filter_map(|name| selection.get(name).map(|value| shell_line(name, value, export)))
        .collect()
}

/// Write the selection to `out`, with diagnostics on `diag`
///
/// Verbose echo of shell lines to `diag` only happens when `out_is_terminal`
/// is false. The closing count line is always written.
pub fn emit<W: Write, D: Write>(
    selection: &Selection,
    order: &VariableOrder,
    options: Options,
    out: &mut W,
    diag: &mut D,
    out_is_terminal: bool,
) -> io::Result<()> {
    if options.json {
        match render_json(selection) {
            Ok(json) => writeln!(out, "{}", json)?,
            Err(err) => writeln!(diag, "{}", err)?,
        }
    } else {
        for line in render_lines(selection, order, options.export) {
            writeln!(out, "{}", line)?;
            if options.verbose && !out_is_terminal {
                writeln!(diag, "{}", line)?;
            }
        }
    }

    debug!("Emitted {} variables", selection.len());
    writeln!(diag, "-- {} env variables loaded --", selection.len())?;
    out.flush()
}
