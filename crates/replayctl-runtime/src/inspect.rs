//! Process details for diagnostics (who owns the replayer ports).

use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

/// Executable name of a process, if it is visible to us.
pub fn owner_process_name(pid: u32) -> Option<String> {
    let mut system = System::new();
    let pid = Pid::from_u32(pid);
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    system
        .process(pid)
        .map(|process| process.name().to_string_lossy().into_owned())
}

/// Whether the process is alive and not a zombie.
pub fn is_process_alive(pid: u32) -> bool {
    let mut system = System::new();
    let pid = Pid::from_u32(pid);
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    system.process(pid).is_some_and(|process| {
        !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
    })
}

/// One line describing a PID for log messages, e.g. `4242 (php)`.
pub fn describe_pid(pid: u32) -> String {
    match owner_process_name(pid) {
        Some(name) => format!("{pid} ({name})"),
        None => pid.to_string(),
    }
}
