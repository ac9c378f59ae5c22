//! Command implementations

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::analyser::ActivitySummary;
use crate::app::{AppContainer, ChopRequest, SampleInput};
use crate::cli::args::{AnalyseArgs, BatchArgs, ChopArgs, PlanArgs, SampleArgs};
use crate::domain::model::ActivityMatrix;
use crate::planner::ObjectPlan;
use crate::utils::time::format_ns;

fn sample_input(args: &SampleArgs) -> SampleInput {
    SampleInput::new(&args.samples)
}

/// Execute the analyse command
pub fn analyse(container: &dyn AppContainer, args: AnalyseArgs) -> Result<()> {
    let interactor = container.chop_interactor();
    let mut source = sample_input(&args.samples)
        .open(interactor.settings().block_size)
        .context("Failed to open sample file")?;
    let matrix = interactor.analyse(&mut source).context("Activity analysis failed")?;

    if args.json {
        let summary = ActivitySummary::from_matrix(&matrix);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_matrix(&matrix));
    }
    Ok(())
}

/// One line per block: start time then one flag per channel
pub fn render_matrix(matrix: &ActivityMatrix) -> String {
    let mut out = String::new();
    for block in 0..matrix.len() {
        let flags: String = (0..matrix.channel_count(block))
            .map(|ch| if matrix.is_active(block, ch) { '#' } else { '.' })
            .collect();
        out.push_str(&format!("{:>6}  {}  {}\n", block, format_ns(matrix.block_time(block)), flags));
    }
    out.push_str(&format!("length  {}\n", format_ns(matrix.file_length_ns)));
    out
}

/// Human-readable plan, one object per line
pub fn render_plan(plan: &ObjectPlan) -> String {
    let mut out = String::new();
    for entry in plan.entries() {
        out.push_str(&format!(
            "{}  {:<24} {}  {}\n",
            entry.object_id, entry.name, entry.original, entry.resolution
        ));
    }
    for condition in &plan.recovered {
        out.push_str(&format!("warning: {}\n", condition));
    }
    out
}

/// Execute the plan command
pub fn plan(container: &dyn AppContainer, args: PlanArgs) -> Result<()> {
    let interactor = container.chop_interactor();
    let mut source = sample_input(&args.samples)
        .open(interactor.settings().block_size)
        .context("Failed to open sample file")?;
    let (_, plan) = interactor
        .plan(&args.document, &mut source)
        .with_context(|| format!("Failed to plan {}", args.document.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan.entries())?);
    } else {
        print!("{}", render_plan(&plan));
    }
    Ok(())
}

/// Execute the chop command
pub fn chop(container: &dyn AppContainer, args: ChopArgs) -> Result<()> {
    let interactor = container.chop_interactor();
    let mut source = sample_input(&args.samples)
        .open(interactor.settings().block_size)
        .context("Failed to open sample file")?;
    let request = ChopRequest {
        document: args.document,
        output: args.output,
        report: args.report,
    };
    let response = interactor
        .chop(&request, &mut source)
        .with_context(|| format!("Failed to chop {}", request.document.display()))?;

    for object in &response.report.objects {
        println!("{}  {}  {}", object.object_id, object.name, object.resolution);
    }
    info!(output = %response.output.display(), "Wrote document");
    Ok(())
}

/// Execute the batch command
pub fn batch(container: &dyn AppContainer, args: BatchArgs) -> Result<()> {
    let interactor = container.chop_interactor();
    let outcomes = interactor
        .batch(&args.dir, &args.output_dir)
        .with_context(|| format!("Failed to process {}", args.dir.display()))?;

    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
    for outcome in &outcomes {
        match &outcome.error {
            None => println!("ok      {}", outcome.name),
            Some(e) => println!("failed  {}  {}", outcome.name, e),
        }
    }
    if failed > 0 {
        bail!("{} of {} batch items failed", failed, outcomes.len());
    }
    Ok(())
}
