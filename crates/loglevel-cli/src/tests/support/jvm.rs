//! Stand-in JVM processes for discovery-driven tests.
//!
//! A `sleep` child provides a live pid; a synthetic perf-data file written for
//! that pid makes it look like a JVM to the perf-data discovery.

use std::fs;
use std::path::Path;
use std::process::{Child, Command};

use anyhow::{Context, Result};
use loglevel_core::perfdata::ByteOrder;
use loglevel_core::test_support::PerfDataImage;

const PERFDATA_DIR: &str = "hsperfdata_tester";
const AGENT_JAR: &str = "/opt/agents/jolokia-agent-jvm.jar";
pub(in crate::tests) const JAVA_COMMAND: &str = "com.app.Main --port 8080";

/// A live process published under a perf-data root; killed on drop.
pub(in crate::tests) struct FakeJvm {
    child: Child,
}

impl FakeJvm {
    /// Starts a process and publishes it below `root`. When `agent_port` is
    /// set the JVM arguments advertise a management agent on that port.
    pub fn launch(root: &Path, agent_port: Option<u16>) -> Result<Self> {
        let child = Command::new("sleep")
            .arg("30")
            .spawn()
            .context("spawn stand-in process")?;
        let jvm = Self { child };

        let jvm_args = agent_port.map_or_else(
            || String::from("-Xmx256m"),
            |port| format!("-Xmx256m -javaagent:{AGENT_JAR}=port={port},host=127.0.0.1"),
        );
        let image = PerfDataImage::new(ByteOrder::Little)
            .text("sun.rt.javaCommand", JAVA_COMMAND)
            .text("java.rt.vmArgs", &jvm_args)
            .build();

        let directory = root.join(PERFDATA_DIR);
        fs::create_dir_all(&directory).context("create perf-data directory")?;
        fs::write(directory.join(jvm.pid().to_string()), image).context("write perf-data file")?;
        Ok(jvm)
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for FakeJvm {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
