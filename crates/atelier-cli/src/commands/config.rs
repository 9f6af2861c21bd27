use anyhow::{Context as _, Result};

use super::Context;

pub fn show(ctx: &Context) -> Result<()> {
    let mut printable = ctx.config.clone();
    printable.gemini = printable.gemini.redacted();

    let rendered = toml::to_string_pretty(&printable).context("Failed to render configuration")?;
    println!("# {}", ctx.config_file.display());
    print!("{rendered}");
    Ok(())
}
