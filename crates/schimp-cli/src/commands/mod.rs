pub(crate) mod explore;
pub(crate) mod guesses;
pub(crate) mod terminals;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
    Dot,
}

pub(crate) fn parse_output_format(
    raw: &str,
    allowed: &[OutputFormat],
) -> miette::Result<OutputFormat> {
    let format = match raw {
        "text" => OutputFormat::Text,
        "json" => OutputFormat::Json,
        "dot" => OutputFormat::Dot,
        other => miette::bail!("Unknown output format '{other}'"),
    };
    if !allowed.contains(&format) {
        miette::bail!("Output format '{raw}' is not supported by this command");
    }
    Ok(format)
}
