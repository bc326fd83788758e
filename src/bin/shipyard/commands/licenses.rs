//! `shipyard licenses` command

use anyhow::Result;

use super::load_project;
use crate::cli::{GlobalArgs, LicensesArgs};
use shipyard::ops::LicenseAggregator;
use shipyard::util::diagnostic;
use shipyard::util::fs::remove_file_if_exists;

pub fn execute(global: &GlobalArgs, args: LicensesArgs) -> Result<()> {
    let (project, ctx) = load_project(global)?;
    let aggregator = LicenseAggregator::for_project(&project);
    let path = args.output.unwrap_or_else(|| project.summary_path());

    let result = if args.check {
        aggregator.check().map(|()| None)
    } else {
        let host = project.host()?;
        aggregator.aggregate(&host).map(Some)
    };

    if result.is_err() && !args.check {
        remove_file_if_exists(&path)?;
    }

    let summary = match result {
        Ok(summary) => summary,
        Err(err) if err.is_fatal(global.mode) => return Err(err.into()),
        Err(err) => {
            diagnostic::emit(&err.to_diagnostic_for(global.mode), ctx.color());
            return Ok(());
        }
    };

    match summary {
        Some(summary) => {
            summary.save(&path)?;
            eprintln!(
                "    Finished license summary for {} packages at {}",
                summary.len(),
                path.display()
            );
        }
        None => eprintln!("     Checked all dependency licenses are approved"),
    }

    Ok(())
}
