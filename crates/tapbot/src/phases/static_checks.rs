use super::{PhaseKind, TargetRun};
use crate::Result;

impl TargetRun {
  /// Style, readability and audit checks over the whole tap.
  pub(crate) async fn static_checks(&mut self) -> Result<()> {
    self.test_header(PhaseKind::StaticChecks);

    let pm = self.config.package_manager.clone();
    let tap = self.config.tap.name.clone();

    self.test([pm.as_str(), "style", tap.as_str()]).await?;
    self
      .test([pm.as_str(), "readall", "--aliases", tap.as_str()])
      .await?;

    let audit_tap = format!("--tap={}", tap);
    self.test([pm.as_str(), "audit", audit_tap.as_str()]).await?;

    Ok(())
  }
}
