//! `shipyard prune` command

use anyhow::Result;

use super::load_project;
use crate::cli::{GlobalArgs, PruneArgs};
use shipyard::ops::prune::{pruned_descriptor, write_pruned_descriptor};

pub fn execute(global: &GlobalArgs, args: PruneArgs) -> Result<()> {
    let (project, _ctx) = load_project(global)?;

    if args.stdout {
        let externals = project.externals()?;
        let (descriptor, _) = pruned_descriptor(
            project.descriptor(),
            &externals,
            global.mode,
            &project.config().bundle.drop_fields,
        )?;
        print!("{}", descriptor.to_json_pretty()?);
        return Ok(());
    }

    let (path, _, _) = write_pruned_descriptor(&project, global.mode)?;
    eprintln!("     Pruned {}", path.display());

    Ok(())
}
