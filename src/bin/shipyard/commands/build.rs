//! `shipyard build` command

use anyhow::Result;

use super::load_project;
use crate::cli::{BuildArgs, GlobalArgs};
use shipyard::ops::bundle::{build, BundleOptions};
use shipyard::util::diagnostic;

pub fn execute(global: &GlobalArgs, args: BuildArgs) -> Result<()> {
    let (project, ctx) = load_project(global)?;

    let opts = BundleOptions {
        mode: global.mode,
        install: !args.no_install,
    };

    let result = build(&project, &opts)?;

    if let Some(ref warning) = result.license_warning {
        diagnostic::emit(&warning.to_diagnostic_for(global.mode), ctx.color());
    }

    eprintln!(
        "    Finished {} bundle at {}",
        global.mode,
        project.output_dir().display()
    );
    if let Some(ref path) = result.summary_path {
        eprintln!("     Summary {}", path.display());
    }

    Ok(())
}
