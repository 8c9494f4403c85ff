use panvm_core::{Release, Result, RunArtifact, WorkflowRun};

/// Remote listing of upstream releases and nightly build runs.
pub trait ReleaseSource {
    /// Releases newest first, exactly as the remote lists them.
    fn list_releases(&self) -> Result<Vec<Release>>;

    /// Recent runs of the nightly build workflow, newest first.
    fn list_workflow_runs(&self) -> Result<Vec<WorkflowRun>>;

    fn run_artifacts(&self, run: &WorkflowRun) -> Result<Vec<RunArtifact>>;
}
