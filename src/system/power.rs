use std::process::Command;
use tracing::{error, info};

/// Reboot the machine after the wizard closed
pub fn reboot(dryrun: bool) -> std::io::Result<()> {
    if dryrun {
        info!("Dryrun: skipping reboot");
        return Ok(());
    }
    info!("Executing reboot");
    run_systemctl("reboot")
}

fn run_systemctl(action: &str) -> std::io::Result<()> {
    let status = Command::new("systemctl").arg(action).status()?;

    if status.success() {
        Ok(())
    } else {
        error!("systemctl {} failed with status: {:?}", action, status);
        Err(std::io::Error::other(format!("systemctl {} failed", action)))
    }
}
