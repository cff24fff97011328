use std::path::Path;

use anyhow::bail;
use clap::error::ErrorKind;
use clap::Parser;
use log::info;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use modelmatcher::alignment::Alignment;
use modelmatcher::io::{read_model_dir, read_paml_model, read_sequences};
use modelmatcher::matcher::ModelMatcher;
use modelmatcher::output::{render, render_tool};
use modelmatcher::ranking::DownstreamTool;
use modelmatcher::sampling::sample_size_from;
use modelmatcher::substitution_models::{ModelRegistry, ProteinModelType, RateMatrix};
use modelmatcher::Result;

mod cli;
use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => error.exit(),
            _ => bail!("Unable to parse command line arguments: \n {}", error),
        },
    };
    TermLogger::init(
        cli.log_level(),
        Default::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let sample_size = sample_size_from(cli.sample_size)?;
    let tool = cli.tool.as_deref().map(DownstreamTool::from_name).transpose()?;

    let msa = Alignment::from_records(read_sequences(&cli.alignment)?)?;
    let extra_model = cli.model.as_deref().map(read_user_model).transpose()?;
    let registry = build_registry(&cli)?;

    info!("modelmatcher run started");
    let report = ModelMatcher::new(&msa, &registry)
        .sample_size(sample_size)
        .seed(cli.seed)
        .extra_model(extra_model.as_ref())
        .empirical_freqs(!cli.no_frequencies)
        .run()?;

    let rendered = match tool {
        Some(tool) => render_tool(&report, tool)?,
        None => render(&report, cli.format.into(), cli.simple)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn build_registry(cli: &Cli) -> Result<ModelRegistry> {
    let mut registry = if cli.models.is_empty() {
        ModelRegistry::builtin()?
    } else {
        let model_types = cli
            .models
            .iter()
            .map(|name| ProteinModelType::from_name(name.trim()))
            .collect::<Result<Vec<_>>>()?;
        ModelRegistry::from_types(&model_types)?
    };
    if let Some(dir) = &cli.model_dir {
        for model in read_model_dir(dir)? {
            registry.insert(model);
        }
    }
    info!("Testing models {}", registry.names().join(", "));
    Ok(registry)
}

fn read_user_model(path: &Path) -> Result<RateMatrix> {
    let name = match path.file_stem() {
        Some(stem) => stem.to_string_lossy().into_owned(),
        None => bail!("Cannot name model file {}", path.display()),
    };
    read_paml_model(path, &name)
}
