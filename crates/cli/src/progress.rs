//! Terminal rendering of pipeline progress.

use colored::Colorize;
use sp_core::store::PipelineView;
use sp_protocol::pipeline_models::StepStatus;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

/// Print a line whenever the displayed progress or a step status changes.
pub async fn print_updates(mut updates: WatchStream<PipelineView>, cancel: CancellationToken) {
    let mut last_line = String::new();
    let mut last_steps = Vec::new();

    loop {
        let view = tokio::select! {
            _ = cancel.cancelled() => break,
            next = updates.next() => match next {
                Some(view) => view,
                None => break,
            },
        };

        let steps: Vec<(u32, StepStatus)> =
            view.steps.iter().map(|s| (s.step_number, s.status)).collect();
        if steps != last_steps {
            print_layers(&view);
            last_steps = steps;
        }

        let line = progress_line(&view);
        if line != last_line {
            println!("{line}");
            last_line = line;
        }
    }
}

fn progress_line(view: &PipelineView) -> String {
    let display = view.display;
    let filled = usize::from(display.overall) / 5;
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(20 - filled.min(20)));
    let step = view.current_step.as_deref().unwrap_or("-");
    format!(
        "[{bar}] {:>3}% {} ({step})",
        display.overall,
        display.caption()
    )
}

fn print_layers(view: &PipelineView) {
    for (layer, steps) in view.layers() {
        println!("{}", layer.label().bold());
        for step in steps {
            let status = match step.status {
                StepStatus::Pending => "pending".dimmed(),
                StepStatus::Running => "running".yellow(),
                StepStatus::Done => "done".green(),
                StepStatus::Failed => "failed".red(),
            };
            let retries = if step.retry_count > 0 {
                format!(" (retried {}x)", step.retry_count)
            } else {
                String::new()
            };
            println!("  {:>2}. {:<22} {status}{retries}", step.step_number, step.step_name);
            if let Some(error) = &step.error_message {
                println!("      {}", error.red());
            }
        }
    }
}
