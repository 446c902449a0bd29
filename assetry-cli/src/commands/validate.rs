use anyhow::Context;

use assetry_md2::import_file;

use crate::cli::Input;

pub fn run(input: &Input) -> anyhow::Result<()> {
    let imported = import_file(&input.file, &input.options())
        .with_context(|| format!("{} is not a valid MD2 scene", input.file.display()))?;

    for warning in &imported.warnings {
        println!("warning: {warning}");
    }
    println!(
        "{}: ok ({} warnings)",
        input.file.display(),
        imported.warnings.len()
    );
    Ok(())
}
