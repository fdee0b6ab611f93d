//! Virtual machine launch.

use std::path::Path;

use crate::error::Result;
use crate::invocation::{CommandRunner, Invocation};

/// Boot a raw disk image under QEMU with KVM.
pub fn run_disk_invocation(disk: &Path) -> Invocation {
    Invocation::new("sudo")
        .args(["qemu-system-x86_64", "-enable-kvm", "-m", "4G"])
        .args(["-usb", "-device", "usb-tablet"])
        .args(["-vga", "cirrus"])
        .arg("-drive")
        .arg(format!("format=raw,file={}", disk.display()))
}

pub fn run_disk(runner: &mut dyn CommandRunner, disk: &Path) -> Result<()> {
    let invocation = run_disk_invocation(disk);
    runner.run(&invocation)?.require(&invocation)?;
    Ok(())
}
