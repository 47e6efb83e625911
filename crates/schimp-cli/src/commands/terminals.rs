// Command handler for: Terminals
//
// Labels the terminating configurations the attacker model starts from, as
// plain text or as Graphviz nodes.

use std::fmt::Write as _;
use std::path::Path;

use schimp_attacker::{StateDecorator, TerminalDistributionOracle};

use super::{parse_output_format, OutputFormat};
use crate::program_model::ProgramModel;

pub(crate) fn run_terminals_command(
    file: &Path,
    horizon: u32,
    show_observations: bool,
    format: &str,
) -> miette::Result<()> {
    let format = parse_output_format(format, &[OutputFormat::Text, OutputFormat::Dot])?;
    let mut program = ProgramModel::load(file)?;
    print!(
        "{}",
        render_terminals(&mut program, horizon, show_observations, format)?
    );
    Ok(())
}

pub(crate) fn render_terminals(
    program: &mut ProgramModel,
    horizon: u32,
    show_observations: bool,
    format: OutputFormat,
) -> miette::Result<String> {
    let distribution = program
        .terminal_distribution(horizon)
        .map_err(|e| miette::miette!("{e}"))?;
    let names: Vec<String> = program.secrets.iter().map(|s| s.name.clone()).collect();
    let decorator = StateDecorator::new(&*program, &names, show_observations);

    let mut out = String::new();
    if format == OutputFormat::Dot {
        out.push_str("digraph terminals {\n    node [shape=box];\n");
    }
    for (index, (configuration, probability)) in distribution.iter().enumerate() {
        let decoration = decorator.decorate(index, configuration);
        if format == OutputFormat::Dot {
            let _ = writeln!(out, "    n{index} {};", decoration.to_dot_attributes());
        } else {
            let _ = writeln!(out, "{}\np = {probability}\n", decoration.label);
        }
    }
    if format == OutputFormat::Dot {
        out.push_str("}\n");
    }
    Ok(out)
}
