/*!
 * Background execution of a pipeline run.
 *
 * The pipeline is submitted to the tokio runtime as a task. Progress and the
 * final outcome come back over a channel, so the caller (a progress bar, a
 * UI loop) never polls shared state.
 */

use anyhow::{anyhow, Result};
use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::pipeline::{PipelineOutput, PipelineProgress, RubyPipeline};

/// Message sent from a running pipeline
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A stage started, or translation advanced
    Progress(PipelineProgress),

    /// The run completed
    Finished(PipelineOutput),

    /// The run aborted; the error text
    Failed(String),
}

/// Handle to a pipeline running in the background
pub struct PipelineHandle {
    /// Event stream, closed when the run ends
    pub events: mpsc::UnboundedReceiver<PipelineEvent>,

    /// Result of the run, errors unchanged
    pub task: JoinHandle<Result<PipelineOutput>>,
}

impl PipelineHandle {
    /// Wait for the run to finish, discarding remaining events
    pub async fn wait(self) -> Result<PipelineOutput> {
        let PipelineHandle { mut events, task } = self;
        while events.recv().await.is_some() {}
        task.await.map_err(|e| anyhow!("Pipeline task failed: {}", e))?
    }
}

/// Start `pipeline` on the runtime and return its event stream.
///
/// Any progress callback already installed on the pipeline is replaced.
/// Must be called from within a tokio runtime.
pub fn spawn_pipeline(mut pipeline: RubyPipeline) -> PipelineHandle {
    let (tx, rx) = mpsc::unbounded_channel();

    let progress_tx = tx.clone();
    pipeline.set_progress_callback(Box::new(move |progress| {
        // receiver gone means nobody is listening
        let _ = progress_tx.send(PipelineEvent::Progress(progress));
    }));

    let task = tokio::spawn(async move {
        let result = pipeline.run().await;

        let event = match &result {
            Ok(output) => PipelineEvent::Finished(output.clone()),
            Err(e) => PipelineEvent::Failed(format!("{:#}", e)),
        };
        let _ = tx.send(event);
        debug!("Pipeline task finished");

        // drop the progress sender held by the pipeline so the stream closes
        drop(pipeline);
        result
    });

    PipelineHandle { events: rx, task }
}
