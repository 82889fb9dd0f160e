use std::path::PathBuf;

use anyhow::{Result, anyhow};
use node_forge_scene_export::{
    diagnostics::{Diagnostics, Level},
    dsl,
    export,
};

#[derive(Debug, Default, Clone)]
struct Cli {
    scene_json: Option<PathBuf>,
    output: Option<PathBuf>,
    no_materials: bool,
    no_lights: bool,
    no_background: bool,
    selection: bool,
}

const USAGE: &str = "supported: --scene-json <scene.json>, --output <scene.xml>, --no-materials, --no-lights, --no-background, --selection";

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--scene-json" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --scene-json"));
                };
                cli.scene_json = Some(PathBuf::from(v));
                i += 2;
            }
            "--output" | "-o" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --output"));
                };
                cli.output = Some(PathBuf::from(v));
                i += 2;
            }
            "--no-materials" => {
                cli.no_materials = true;
                i += 1;
            }
            "--no-lights" => {
                cli.no_lights = true;
                i += 1;
            }
            "--no-background" => {
                cli.no_background = true;
                i += 1;
            }
            "--selection" => {
                cli.selection = true;
                i += 1;
            }
            other => {
                return Err(anyhow!("unknown argument: {other} ({USAGE})"));
            }
        }
    }
    Ok(cli)
}

fn apply_overrides(cli: &Cli, settings: &mut dsl::ExportSettings) {
    if cli.no_materials {
        settings.export_materials = false;
    }
    if cli.no_lights {
        settings.export_lights = false;
    }
    if cli.no_background {
        settings.enable_background = false;
    }
    if cli.selection {
        settings.use_selection = true;
    }
}

fn print_summary(diagnostics: &Diagnostics) {
    for entry in diagnostics.entries() {
        if entry.level > Level::Debug {
            eprintln!("[{}] {}", entry.level, entry.message);
        }
    }
    eprintln!(
        "[export] {} error(s), {} warning(s)",
        diagnostics.count(Level::Error),
        diagnostics.count(Level::Warning)
    );
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&args)?;

    let scene_path = cli
        .scene_json
        .clone()
        .ok_or_else(|| anyhow!("--scene-json is required ({USAGE})"))?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| scene_path.with_extension("xml"));

    let mut scene = dsl::load_scene_from_path(&scene_path)?;
    apply_overrides(&cli, &mut scene.settings);

    let result = export::export_scene_to_file(&scene, &output)?;
    print_summary(&result.diagnostics);
    println!("{}", output.display());
    Ok(())
}
