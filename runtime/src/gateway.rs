//! External command gateway.
//!
//! Every hypervisor call and shell utility the runtime needs is a
//! [`HostCommand`] variant. Variants carry structured arguments and are
//! serialised to an argv without a shell, so names and paths are never
//! interpolated into a command string.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use boxes_core::error::{BoxError, Result};
use boxes_core::ContainerId;

/// Program used to gain privileges.
const SUDO: &str = "sudo";

/// A command the runtime can issue on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// `vzlist -N <name>`: succeeds only while the container runs
    ListRunning { name: String },
    /// `vzlist -a -H -o ctid`: every container id, one per line
    ListIds,
    /// `vzlist -a -H -o ctid <name>`: the id of one container
    LookupId { name: String },
    /// `vzctl create <id> --ostemplate <template>`
    Create { id: ContainerId, template: String },
    /// `vzctl set <id> --name <name> --save`
    SetName { id: ContainerId, name: String },
    /// Replace all interfaces with a single bridged one
    SetNetwork { id: ContainerId, bridge: String },
    /// `vzctl set <id> --nameserver <addr> --save`
    SetNameserver { id: ContainerId, nameserver: String },
    /// `vzctl start <name>`
    Start { name: String },
    /// `vzctl stop <name>`
    Stop { name: String },
    /// `vzdump --dumpdir <dir> <id>`
    Dump { id: ContainerId, dump_dir: PathBuf },
    /// `wget -q <url> -P <dir>`
    Download { url: String, dest_dir: PathBuf },
    /// `rm -f <path>`
    RemoveFile { path: PathBuf },
    /// `cp -f <from> <to>`
    CopyFile { from: PathBuf, to: PathBuf },
    /// `mv -f <from> <to>`
    MoveFile { from: PathBuf, to: PathBuf },
    /// `mv -f <from> <to>` on files owned by the invoking user
    RelocateFile { from: PathBuf, to: PathBuf },
    /// `veewee openvz build <definition> --force`
    VeeweeBuild { definition: String },
    /// `veewee openvz export <definition>`
    VeeweeExport { definition: String },
}

impl HostCommand {
    /// Executable to run.
    pub fn program(&self) -> &'static str {
        match self {
            HostCommand::ListRunning { .. }
            | HostCommand::ListIds
            | HostCommand::LookupId { .. } => "vzlist",
            HostCommand::Create { .. }
            | HostCommand::SetName { .. }
            | HostCommand::SetNetwork { .. }
            | HostCommand::SetNameserver { .. }
            | HostCommand::Start { .. }
            | HostCommand::Stop { .. } => "vzctl",
            HostCommand::Dump { .. } => "vzdump",
            HostCommand::Download { .. } => "wget",
            HostCommand::RemoveFile { .. } => "rm",
            HostCommand::CopyFile { .. } => "cp",
            HostCommand::MoveFile { .. } | HostCommand::RelocateFile { .. } => "mv",
            HostCommand::VeeweeBuild { .. } | HostCommand::VeeweeExport { .. } => "veewee",
        }
    }

    /// Arguments, in order.
    pub fn args(&self) -> Vec<OsString> {
        fn os(parts: &[&str]) -> Vec<OsString> {
            parts.iter().map(OsString::from).collect()
        }

        match self {
            HostCommand::ListRunning { name } => os(&["-N", name]),
            HostCommand::ListIds => os(&["-a", "-H", "-o", "ctid"]),
            HostCommand::LookupId { name } => os(&["-a", "-H", "-o", "ctid", name]),
            HostCommand::Create { id, template } => {
                os(&["create", &id.to_string(), "--ostemplate", template])
            }
            HostCommand::SetName { id, name } => {
                os(&["set", &id.to_string(), "--name", name, "--save"])
            }
            HostCommand::SetNetwork { id, bridge } => os(&[
                "set",
                &id.to_string(),
                "--netif_del",
                "all",
                "--netif_add",
                &format!("eth0,,,,{bridge}"),
                "--save",
            ]),
            HostCommand::SetNameserver { id, nameserver } => {
                os(&["set", &id.to_string(), "--nameserver", nameserver, "--save"])
            }
            HostCommand::Start { name } => os(&["start", name]),
            HostCommand::Stop { name } => os(&["stop", name]),
            HostCommand::Dump { id, dump_dir } => vec![
                "--dumpdir".into(),
                dump_dir.clone().into_os_string(),
                id.to_string().into(),
            ],
            HostCommand::Download { url, dest_dir } => vec![
                "-q".into(),
                url.into(),
                "-P".into(),
                dest_dir.clone().into_os_string(),
            ],
            HostCommand::RemoveFile { path } => vec!["-f".into(), path.clone().into_os_string()],
            HostCommand::CopyFile { from, to }
            | HostCommand::MoveFile { from, to }
            | HostCommand::RelocateFile { from, to } => vec![
                "-f".into(),
                from.clone().into_os_string(),
                to.clone().into_os_string(),
            ],
            HostCommand::VeeweeBuild { definition } => {
                os(&["openvz", "build", definition, "--force"])
            }
            HostCommand::VeeweeExport { definition } => os(&["openvz", "export", definition]),
        }
    }

    /// Whether the command needs elevated rights.
    ///
    /// Hypervisor calls and file operations on hypervisor-owned paths do;
    /// downloads, template builds and their exports run as the invoking user.
    pub fn requires_privilege(&self) -> bool {
        !matches!(
            self,
            HostCommand::Download { .. }
                | HostCommand::RelocateFile { .. }
                | HostCommand::VeeweeBuild { .. }
                | HostCommand::VeeweeExport { .. }
        )
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())?;
        for arg in self.args() {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Failed output with the given exit code.
    pub fn failed(exit_code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(exit_code),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Uniform interface for running host commands.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Run a command to completion.
    ///
    /// A non-zero exit is not an error here; only failing to launch the
    /// program is.
    async fn run(&self, command: &HostCommand) -> Result<CommandOutput>;

    /// Run a command and fail with [`BoxError::ExternalCommand`] unless it
    /// exits successfully. Returns stdout.
    async fn run_or_fail(&self, command: &HostCommand, message: &str) -> Result<String> {
        let output = self.run(command).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(BoxError::ExternalCommand {
                command: command.to_string(),
                exit_code: output.exit_code,
                message: message.to_string(),
            })
        }
    }
}

/// Gateway that spawns real processes.
#[derive(Debug, Clone)]
pub struct ProcessGateway {
    /// Prefix privileged commands with `sudo`
    use_sudo: bool,
}

impl ProcessGateway {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    fn build(&self, command: &HostCommand) -> tokio::process::Command {
        let mut cmd = if self.use_sudo && command.requires_privilege() {
            let mut cmd = tokio::process::Command::new(SUDO);
            cmd.arg(command.program());
            cmd
        } else {
            tokio::process::Command::new(command.program())
        };
        cmd.args(command.args());
        cmd.stdin(std::process::Stdio::null());
        cmd
    }
}

#[async_trait]
impl CommandGateway for ProcessGateway {
    async fn run(&self, command: &HostCommand) -> Result<CommandOutput> {
        tracing::debug!(command = %command, sudo = self.use_sudo && command.requires_privilege(), "Running host command");

        let output = self
            .build(command)
            .output()
            .await
            .map_err(|e| BoxError::CommandSpawn {
                command: command.to_string(),
                source: e,
            })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };

        tracing::debug!(command = %command, exit_code = ?result.exit_code, "Host command finished");
        Ok(result)
    }
}
