// Command handler for: Guesses

use std::fmt::Write as _;
use std::path::Path;

use schimp_attacker::GuessEnumerator;

use crate::program_model::ProgramModel;

pub(crate) fn run_guesses_command(file: &Path, limit: Option<usize>) -> miette::Result<()> {
    let program = ProgramModel::load(file)?;
    let enumerator =
        GuessEnumerator::new(&program.secret_variables()).map_err(|e| miette::miette!("{e}"))?;
    print!("{}", render_guesses(&enumerator, limit));
    Ok(())
}

pub(crate) fn render_guesses(enumerator: &GuessEnumerator, limit: Option<usize>) -> String {
    let shown = limit.unwrap_or(usize::MAX).min(enumerator.size());
    let mut out = String::new();
    for (index, guess) in enumerator.iter().take(shown).enumerate() {
        let _ = writeln!(out, "{index:>6}  {guess}");
    }
    if shown < enumerator.size() {
        let _ = writeln!(out, "... {} more", enumerator.size() - shown);
    }
    let _ = writeln!(out, "{} guesses", enumerator.size());
    out
}
