//! Discovery of local JVM processes and their advertised agents.
//!
//! [`ProcessDiscovery`] is the narrow capability the rest of the crate needs:
//! list live processes with their command lines, and look up the management
//! address a process advertises. [`PerfDataDiscovery`] implements it over the
//! `hsperfdata_*` directories; [`ProcessLocator`] turns it into the operator
//! facing process listing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::CORE_TARGET;
use crate::agent::agent_url_from_jvm_args;
use crate::perfdata::{PerfData, PerfDataError};

const PERFDATA_DIR_PREFIX: &str = "hsperfdata_";
const JAVA_COMMAND_COUNTER: &str = "sun.rt.javaCommand";
const JVM_ARGS_COUNTER: &str = "java.rt.vmArgs";
const UNKNOWN_COMMAND: &str = "Unknown";

/// A local process as shown by the `jobs` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessDescriptor {
    /// Operating-system process id.
    pub pid: u32,
    /// Main class or jar plus arguments.
    pub command_line: String,
    /// Whether the process advertises a management agent.
    pub reachable: bool,
}

/// Errors raised while inspecting a single process.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No live process publishes performance data under this pid.
    #[error("no JVM with pid {pid} was found")]
    NoSuchProcess { pid: u32 },
    /// The performance-data file could not be read.
    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The performance-data file could not be decoded.
    #[error("failed to decode {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: PerfDataError,
    },
}

/// Capability to enumerate local processes and their management addresses.
pub trait ProcessDiscovery {
    /// Lists live processes as `(pid, command line)` pairs.
    ///
    /// Processes that cannot be inspected are left out.
    fn active_local_processes(&self) -> Vec<(u32, String)>;

    /// Returns the management address advertised by `pid`, if any.
    fn advertised_management_address(&self, pid: u32) -> Result<Option<String>, DiscoveryError>;
}

/// Discovery backed by HotSpot performance-data files.
#[derive(Debug, Clone)]
pub struct PerfDataDiscovery {
    root: PathBuf,
    agent_marker: String,
}

impl PerfDataDiscovery {
    /// Scans `hsperfdata_*` directories below `root`; agents are recognised
    /// by `agent_marker` in their jar path.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, agent_marker: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            agent_marker: agent_marker.into(),
        }
    }

    fn perfdata_directories(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) => {
                debug!(target: CORE_TARGET, root = %self.root.display(), %error, "perf-data root unreadable");
                return Vec::new();
            }
        };
        entries
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with(PERFDATA_DIR_PREFIX))
            })
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect()
    }

    fn perfdata_files(&self) -> Vec<(u32, PathBuf)> {
        let mut files: Vec<(u32, PathBuf)> = self
            .perfdata_directories()
            .into_iter()
            .filter_map(|directory| fs::read_dir(directory).ok())
            .flat_map(|entries| entries.filter_map(Result::ok))
            .filter_map(|entry| {
                let pid = entry.file_name().to_str()?.parse::<u32>().ok()?;
                Some((pid, entry.path()))
            })
            .collect();
        files.sort_by_key(|(pid, _)| *pid);
        files
    }

    fn perfdata_file(&self, pid: u32) -> Option<PathBuf> {
        let name = pid.to_string();
        self.perfdata_directories()
            .into_iter()
            .map(|directory| directory.join(&name))
            .find(|path| path.is_file())
    }

    fn read(path: &Path) -> Result<PerfData, DiscoveryError> {
        let bytes = fs::read(path).map_err(|source| DiscoveryError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        PerfData::parse(&bytes).map_err(|source| DiscoveryError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ProcessDiscovery for PerfDataDiscovery {
    fn active_local_processes(&self) -> Vec<(u32, String)> {
        let own_pid = std::process::id();
        self.perfdata_files()
            .into_iter()
            .filter(|(pid, _)| *pid != own_pid)
            .filter(|(pid, path)| {
                let alive = is_alive(*pid);
                if !alive {
                    debug!(target: CORE_TARGET, pid, path = %path.display(), "skipping stale perf-data file");
                }
                alive
            })
            .filter_map(|(pid, path)| match Self::read(&path) {
                Ok(data) => {
                    let command = data
                        .text(JAVA_COMMAND_COUNTER)
                        .map(str::trim)
                        .filter(|command| !command.is_empty())
                        .unwrap_or(UNKNOWN_COMMAND)
                        .to_owned();
                    Some((pid, command))
                }
                Err(error) => {
                    debug!(target: CORE_TARGET, pid, %error, "skipping uninspectable process");
                    None
                }
            })
            .collect()
    }

    fn advertised_management_address(&self, pid: u32) -> Result<Option<String>, DiscoveryError> {
        let path = self
            .perfdata_file(pid)
            .filter(|_| is_alive(pid))
            .ok_or(DiscoveryError::NoSuchProcess { pid })?;
        let data = Self::read(&path)?;
        let jvm_args = data.text(JVM_ARGS_COUNTER).unwrap_or_default();
        Ok(agent_url_from_jvm_args(jvm_args, &self.agent_marker))
    }
}

/// Produces the process listing, hiding the tool itself.
pub struct ProcessLocator<'a> {
    discovery: &'a dyn ProcessDiscovery,
    self_name: String,
}

impl<'a> ProcessLocator<'a> {
    /// Creates a locator that hides processes whose command line contains
    /// `self_name` (case-insensitively).
    #[must_use]
    pub fn new(discovery: &'a dyn ProcessDiscovery, self_name: &str) -> Self {
        Self {
            discovery,
            self_name: self_name.to_lowercase(),
        }
    }

    /// Lists local processes with their reachability.
    ///
    /// Each call re-reads the process table. A process whose agent lookup
    /// fails (for example because it exited mid-listing) is left out.
    #[must_use]
    pub fn list_processes(&self) -> Vec<ProcessDescriptor> {
        self.discovery
            .active_local_processes()
            .into_iter()
            .filter(|(_, command_line)| !self.is_self(command_line))
            .filter_map(|(pid, command_line)| {
                match self.discovery.advertised_management_address(pid) {
                    Ok(address) => Some(ProcessDescriptor {
                        pid,
                        command_line,
                        reachable: address.is_some(),
                    }),
                    Err(error) => {
                        debug!(target: CORE_TARGET, pid, %error, "process vanished during listing");
                        None
                    }
                }
            })
            .collect()
    }

    fn is_self(&self, command_line: &str) -> bool {
        !self.self_name.is_empty() && command_line.to_lowercase().contains(&self.self_name)
    }
}

#[cfg(unix)]
fn is_alive(pid: u32) -> bool {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: signal 0 only performs the existence and permission checks.
    let result = unsafe { libc::kill(raw, 0) };
    result == 0 || io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
}

#[cfg(not(unix))]
fn is_alive(_pid: u32) -> bool {
    true
}
