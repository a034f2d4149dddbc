//! Test support utilities for CLI behavioural coverage.
//!
//! Supplies a harness that runs the CLI in-process against a fake management
//! agent or stand-in JVMs and captures its output, so step definitions and
//! unit tests stay focused on their assertions.

mod jvm;

use std::cell::RefCell;
use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail, ensure};
use camino::Utf8PathBuf;
use loglevel_config::Config;
use loglevel_core::test_support::{
    BRIDGED_REGISTRY, FakeAgent, FakeRegistry, FakeTarget, NATIVE_REGISTRY,
};
use rstest::fixture;
use tempfile::TempDir;

use crate::{AppError, ConfigLoader, IoStreams, run_with_loader};

pub(in crate::tests) use jvm::{FakeJvm, JAVA_COMMAND};

/// Token in a command line replaced with the target pid.
const PID_PLACEHOLDER: &str = "PID";
/// Pid used when commands address a configured agent URL.
const CONFIGURED_PID: u32 = 4242;

/// A config loader that returns a fixed configuration for tests.
pub(in crate::tests) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(in crate::tests) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Test world holding configuration, collaborators and captured output.
pub(in crate::tests) struct TestWorld {
    pub config: Config,
    pub native: Option<FakeRegistry>,
    pub bridged: Option<FakeRegistry>,
    pub agent: Option<FakeAgent>,
    pub jvms: Vec<FakeJvm>,
    pub perfdata: TempDir,
    pub pid: u32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
}

impl TestWorld {
    pub fn new() -> Result<Self> {
        let perfdata = TempDir::new().context("create perf-data root")?;
        let root = Utf8PathBuf::from_path_buf(perfdata.path().to_path_buf())
            .map_err(|path| anyhow!("non UTF-8 temp dir {}", path.display()))?;
        let config = Config {
            perfdata_root: Some(root),
            ..Config::default()
        };
        Ok(Self {
            config,
            native: None,
            bridged: None,
            agent: None,
            jvms: Vec::new(),
            perfdata,
            pid: CONFIGURED_PID,
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
        })
    }

    /// Adds a logger to the native registry of the simulated target.
    pub fn add_native_logger(&mut self, name: &str, level: Option<&str>) {
        self.add_logger(NATIVE_REGISTRY, name, level);
    }

    /// Adds a logger to the bridged registry of the simulated target.
    pub fn add_bridged_logger(&mut self, name: &str, level: Option<&str>) {
        self.add_logger(BRIDGED_REGISTRY, name, level);
    }

    fn add_logger(&mut self, registry: &str, name: &str, level: Option<&str>) {
        let slot = if registry == NATIVE_REGISTRY {
            &mut self.native
        } else {
            &mut self.bridged
        };
        let current = slot.take().unwrap_or_else(|| {
            if registry == NATIVE_REGISTRY {
                FakeRegistry::native(registry)
            } else {
                FakeRegistry::bridged(registry)
            }
        });
        *slot = Some(current.logger(name, level, ""));
    }

    fn target(&self) -> FakeTarget {
        [&self.native, &self.bridged]
            .into_iter()
            .flatten()
            .fold(FakeTarget::new(), |target, registry| {
                target.with_registry(registry.clone())
            })
    }

    /// Serves the simulated target and points `agent_url` at it.
    pub fn start_agent(&mut self) -> Result<()> {
        let agent = self.spawn_agent()?;
        self.config.agent_url = Some(agent.url());
        self.agent = Some(agent);
        Ok(())
    }

    /// Serves the simulated target behind a JVM that advertises the agent in
    /// its perf-data file.
    pub fn start_advertising_jvm(&mut self) -> Result<()> {
        let agent = self.spawn_agent()?;
        let jvm = FakeJvm::launch(self.perfdata.path(), Some(agent.port()))?;
        self.pid = jvm.pid();
        self.jvms.push(jvm);
        self.agent = Some(agent);
        Ok(())
    }

    /// Publishes a JVM without a management agent.
    pub fn start_unreachable_jvm(&mut self) -> Result<()> {
        let jvm = FakeJvm::launch(self.perfdata.path(), None)?;
        self.pid = jvm.pid();
        self.jvms.push(jvm);
        Ok(())
    }

    fn spawn_agent(&mut self) -> Result<FakeAgent> {
        if self.agent.is_some() {
            bail!("agent already running");
        }
        FakeAgent::spawn(self.target()).context("start fake agent")
    }

    pub fn run(&mut self, command: &str) {
        self.stdout.clear();
        self.stderr.clear();
        let args = self.build_args(command);
        let loader = StaticConfigLoader::new(self.config.clone());
        let mut io = IoStreams::new(&mut self.stdout, &mut self.stderr);
        let exit = run_with_loader(args, &mut io, &loader);
        self.exit_code = Some(exit);
    }

    fn build_args(&self, command: &str) -> Vec<OsString> {
        let pid = self.pid.to_string();
        let mut args = vec![OsString::from("loglevel")];
        args.extend(command.split_whitespace().map(|token| {
            match token.trim_matches('"') {
                PID_PLACEHOLDER => OsString::from(&pid),
                other => OsString::from(other),
            }
        }));
        args
    }

    pub fn stdout_text(&self) -> Result<String> {
        String::from_utf8(self.stdout.clone()).context("stdout utf8")
    }

    pub fn stderr_text(&self) -> Result<String> {
        String::from_utf8(self.stderr.clone()).context("stderr utf8")
    }

    /// Explicit level of `logger` as currently held by the served target.
    pub fn served_level(&self, registry: &str, logger: &str) -> Result<Option<String>> {
        let agent = self.agent.as_ref().context("no agent running")?;
        Ok(agent.target().level_of(registry, logger))
    }

    pub fn assert_success(&self) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(
            exit == ExitCode::SUCCESS,
            "expected success, got {exit:?}; stderr: {}",
            self.stderr_text()?
        );
        Ok(())
    }

    pub fn assert_failure(&self) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(exit == ExitCode::FAILURE, "expected failure, got {exit:?}");
        Ok(())
    }
}

#[fixture]
pub(in crate::tests) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new().expect("test world"))
}
