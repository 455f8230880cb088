//! Architecture description rendering.

use super::EvaluatorError;
use crate::schema::Genome;

/// Placeholder that every template must contain.
pub const K_PLACEHOLDER: &str = "{{K}}";
pub const N_PLACEHOLDER: &str = "{{N}}";
pub const W_PLACEHOLDER: &str = "{{W}}";
/// Replaced by `K` lines, each holding the per-input LUT delay.
pub const K_DELAYS_PLACEHOLDER: &str = "{{K_DELAYS}}";

/// Substitute a genome's parameters into an architecture template.
///
/// A template without `{{K}}` cannot describe the genome and is rejected.
/// The other placeholders are optional.
pub fn render_template(
    template: &str,
    genome: &Genome,
    lut_delay: &str,
) -> Result<String, EvaluatorError> {
    if !template.contains(K_PLACEHOLDER) {
        return Err(EvaluatorError::MissingPlaceholder(K_PLACEHOLDER));
    }

    let delays = lut_delays(genome.k, lut_delay);

    Ok(template
        .replace(K_DELAYS_PLACEHOLDER, &delays)
        .replace(K_PLACEHOLDER, &genome.k.to_string())
        .replace(N_PLACEHOLDER, &genome.n.to_string())
        .replace(W_PLACEHOLDER, &genome.w.to_string()))
}

fn lut_delays(k: u32, lut_delay: &str) -> String {
    (0..k).map(|_| lut_delay).collect::<Vec<_>>().join("\n")
}

/// Substitute per-invocation values into a command argument.
pub fn render_arg(arg: &str, genome: &Genome, vars: &ArgVars<'_>) -> String {
    arg.replace("{arch}", vars.arch)
        .replace("{benchmark}", vars.benchmark)
        .replace("{workdir}", vars.workdir)
        .replace("{K}", &genome.k.to_string())
        .replace("{N}", &genome.n.to_string())
        .replace("{W}", &genome.w.to_string())
}

/// Paths available to argument placeholders.
#[derive(Debug, Clone, Copy)]
pub struct ArgVars<'a> {
    pub arch: &'a str,
    pub benchmark: &'a str,
    pub workdir: &'a str,
}
