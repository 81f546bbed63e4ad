use super::{PhaseKind, TargetRun};
use crate::Result;

impl TargetRun {
  /// Check that the local system is in a state worth testing on.
  pub(crate) async fn setup(&mut self) -> Result<()> {
    self.test_header(PhaseKind::Setup);

    let pm = self.config.package_manager.clone();

    // `config` output is worth having in the log even when the step passes
    let step = self.step([pm.as_str(), "config"]).verbose(true);
    self.run_step(step).await?;

    self.test([pm.as_str(), "doctor"]).await?;

    Ok(())
  }
}
