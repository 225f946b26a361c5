//! `morph synth`: print synthesized class source.

use super::{load_config, load_contract};
use morph_engine::{ClassGenerator, DelegatingHooks, StubHooks, SynthesisHooks};
use std::path::Path;

pub fn execute(contract: &Path, stub: bool, config: Option<&Path>) -> anyhow::Result<()> {
    let text = if stub {
        render(StubHooks, contract, config)?
    } else {
        render(DelegatingHooks, contract, config)?
    };
    print!("{}", text);
    Ok(())
}

fn render<H: SynthesisHooks>(hooks: H, contract: &Path, config: Option<&Path>) -> anyhow::Result<String> {
    let contract = load_contract(contract)?;
    let generator = ClassGenerator::with_config(hooks, load_config(config)?)?;
    let source = generator.synthesize(&contract)?;
    tracing::debug!(class = %source.class_name, "synthesized");
    Ok(source.text)
}
