// Command handler for: Explore
//
// Builds the reachable attacker model of a program model and prints it.

use std::fmt::Write as _;
use std::path::Path;

use miette::IntoDiagnostic;
use tracing::info;

use schimp_attacker::{build_explicit_model, AttackerModelGenerator, ExplicitModel, ExploreLimits};

use super::{parse_output_format, OutputFormat};
use crate::program_model::ProgramModel;

pub(crate) fn run_explore_command(
    file: &Path,
    horizon: u32,
    max_states: usize,
    format: &str,
) -> miette::Result<()> {
    let format = parse_output_format(format, &[OutputFormat::Text, OutputFormat::Json])?;
    let program = ProgramModel::load(file)?;
    let model = explore_program(program, horizon, max_states)?;
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&model).into_diagnostic()?
            );
        }
        _ => print!("{}", render_model_text(&model)),
    }
    Ok(())
}

pub(crate) fn explore_program(
    program: ProgramModel,
    horizon: u32,
    max_states: usize,
) -> miette::Result<ExplicitModel> {
    let config = program.attacker_config(horizon);
    info!(
        secrets = config.secrets.len(),
        horizon, "Building attacker model..."
    );
    let mut generator =
        AttackerModelGenerator::new(program, config).map_err(|e| miette::miette!("{e}"))?;
    build_explicit_model(&mut generator, ExploreLimits { max_states })
        .map_err(|e| miette::miette!("Exploration failed: {e}"))
}

pub(crate) fn render_model_text(model: &ExplicitModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Model type: {:?}", model.model_type);
    let _ = writeln!(out, "Variables:  {}", model.var_names.join(", "));
    let _ = writeln!(
        out,
        "States: {}  Choices: {}  Transitions: {}",
        model.num_states(),
        model.num_choices(),
        model.num_transitions()
    );
    for (index, state) in model.states.iter().enumerate() {
        let marker = if model.initial_states.contains(&index) {
            "*"
        } else {
            " "
        };
        let _ = writeln!(out, "{marker}{index:>4} {state}");
        for choice in model.choices(index) {
            let targets: Vec<String> = choice
                .transitions
                .iter()
                .map(|(target, p)| format!("{target}:{p}"))
                .collect();
            let action = choice.action.as_deref().unwrap_or("-");
            let _ = writeln!(out, "        [{action}] -> {}", targets.join(" + "));
        }
    }
    out
}
