//! Port owner lookup through `/proc` (Linux).
//!
//! Listening sockets are read from `net/tcp` and `net/tcp6`, then matched to
//! processes by scanning `/proc/<pid>/fd` for `socket:[<inode>]` links.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use replayctl_core::{PortOwnerProbe, SupervisorError};
use tracing::{debug, trace};

/// `st` column value for a socket in `LISTEN` state.
const TCP_LISTEN: &str = "0A";

const TCP_TABLES: [&str; 2] = ["net/tcp", "net/tcp6"];

/// Resolves port owners by reading the proc filesystem directly.
#[derive(Debug, Clone)]
pub struct ProcNetProbe {
    proc_root: PathBuf,
}

impl ProcNetProbe {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Read from an alternative proc tree (used by tests).
    pub fn with_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    /// Whether the proc tree exposes the TCP tables this probe needs.
    pub fn is_supported(&self) -> bool {
        TCP_TABLES
            .iter()
            .any(|table| self.proc_root.join(table).is_file())
    }

    fn listening_inodes(&self, port: u16) -> Result<HashSet<u64>, SupervisorError> {
        let mut inodes = HashSet::new();
        let mut tables_read = 0;

        for table in TCP_TABLES {
            let path = self.proc_root.join(table);
            let Ok(content) = fs::read_to_string(&path) else {
                trace!(path = %path.display(), "TCP table not readable, skipping");
                continue;
            };
            tables_read += 1;
            inodes.extend(parse_listening_inodes(&content, port));
        }

        if tables_read == 0 {
            return Err(SupervisorError::ProbeFailed(format!(
                "no TCP tables under {}",
                self.proc_root.display()
            )));
        }

        Ok(inodes)
    }

    fn pids_holding(&self, inodes: &HashSet<u64>) -> Result<Vec<u32>, SupervisorError> {
        let entries = fs::read_dir(&self.proc_root).map_err(|e| {
            SupervisorError::ProbeFailed(format!("cannot list {}: {e}", self.proc_root.display()))
        })?;

        let mut pids = BTreeSet::new();
        for entry in entries.flatten() {
            let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) else {
                continue;
            };
            if holds_any_socket(&entry.path().join("fd"), inodes) {
                pids.insert(pid);
            }
        }

        Ok(pids.into_iter().collect())
    }
}

impl Default for ProcNetProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PortOwnerProbe for ProcNetProbe {
    fn listeners(&self, port: u16) -> Result<Vec<u32>, SupervisorError> {
        let inodes = self.listening_inodes(port)?;
        if inodes.is_empty() {
            return Ok(Vec::new());
        }

        let pids = self.pids_holding(&inodes)?;
        debug!(port, ?pids, "Resolved port listeners from /proc");
        Ok(pids)
    }
}

/// Extract inodes of sockets listening on `port` from one TCP table.
///
/// Rows that do not parse are skipped.
fn parse_listening_inodes(content: &str, port: u16) -> Vec<u64> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 10 || fields[3] != TCP_LISTEN {
                return None;
            }
            let (_, hex_port) = fields[1].rsplit_once(':')?;
            if u16::from_str_radix(hex_port, 16).ok()? != port {
                return None;
            }
            fields[9].parse::<u64>().ok().filter(|inode| *inode != 0)
        })
        .collect()
}

fn socket_inode(link: &Path) -> Option<u64> {
    link.to_str()?
        .strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

/// Processes we are not allowed to inspect are treated as not holding the
/// socket.
fn holds_any_socket(fd_dir: &Path, inodes: &HashSet<u64>) -> bool {
    let Ok(fds) = fs::read_dir(fd_dir) else {
        return false;
    };

    fds.flatten().any(|fd| {
        fd.path()
            .read_link()
            .ok()
            .and_then(|target| socket_inode(&target))
            .is_some_and(|inode| inodes.contains(&inode))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

    fn row(local: &str, state: &str, inode: u64) -> String {
        format!(
            "   0: {local} 00000000:0000 {state} 00000000:00000000 00:00000000 00000000  1000        0 {inode} 1 0000000000000000 100 0 0 10 0"
        )
    }

    #[test]
    fn only_listening_rows_on_the_port_match() {
        let table = [
            HEADER.to_string(),
            row("0100007F:1B59", TCP_LISTEN, 111),
            row("0100007F:1B59", "01", 222),
            row("0100007F:1B5A", TCP_LISTEN, 333),
            row("00000000:1B59", TCP_LISTEN, 0),
        ]
        .join("\n");

        assert_eq!(parse_listening_inodes(&table, 7001), vec![111]);
        assert_eq!(parse_listening_inodes(&table, 7002), vec![333]);
        assert!(parse_listening_inodes(&table, 8080).is_empty());
    }

    #[test]
    fn garbage_rows_are_ignored() {
        let table = format!("{HEADER}\nnot a row\n   1: zz:zz 0 0A\n");
        assert!(parse_listening_inodes(&table, 7001).is_empty());
    }

    #[test]
    fn socket_links_parse() {
        assert_eq!(socket_inode(Path::new("socket:[4242]")), Some(4242));
        assert_eq!(socket_inode(Path::new("pipe:[4242]")), None);
        assert_eq!(socket_inode(Path::new("/dev/null")), None);
    }

    #[cfg(unix)]
    mod fake_proc {
        use super::*;
        use std::os::unix::fs::symlink;
        use tempfile::TempDir;

        fn fake_proc(tcp: &str, processes: &[(u32, &[&str])]) -> TempDir {
            let root = tempfile::tempdir().unwrap();
            fs::create_dir_all(root.path().join("net")).unwrap();
            fs::write(root.path().join("net/tcp"), tcp).unwrap();
            for (pid, links) in processes {
                let fd_dir = root.path().join(pid.to_string()).join("fd");
                fs::create_dir_all(&fd_dir).unwrap();
                for (i, target) in links.iter().enumerate() {
                    symlink(target, fd_dir.join(i.to_string())).unwrap();
                }
            }
            fs::create_dir_all(root.path().join("self")).unwrap();
            root
        }

        #[test]
        fn finds_the_process_holding_the_socket() {
            let tcp = [HEADER.to_string(), row("0100007F:1B59", TCP_LISTEN, 9001)].join("\n");
            let root = fake_proc(
                &tcp,
                &[
                    (100, &["/dev/null", "socket:[9001]"]),
                    (200, &["socket:[1234]"]),
                ],
            );

            let probe = ProcNetProbe::with_root(root.path());
            assert!(probe.is_supported());
            assert_eq!(probe.listeners(7001).unwrap(), vec![100]);
            assert!(probe.listeners(7002).unwrap().is_empty());
        }

        #[test]
        fn shared_socket_reports_every_holder() {
            let tcp = [HEADER.to_string(), row("00000000:1B59", TCP_LISTEN, 9001)].join("\n");
            let root = fake_proc(
                &tcp,
                &[(300, &["socket:[9001]"]), (100, &["socket:[9001]"])],
            );

            let probe = ProcNetProbe::with_root(root.path());
            assert_eq!(probe.listeners(7001).unwrap(), vec![100, 300]);
        }

        #[test]
        fn missing_tables_fail_the_probe() {
            let root = tempfile::tempdir().unwrap();
            let probe = ProcNetProbe::with_root(root.path());
            assert!(!probe.is_supported());
            assert!(matches!(
                probe.listeners(7001),
                Err(SupervisorError::ProbeFailed(_))
            ));
        }
    }
}
