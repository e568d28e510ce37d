//! In-memory test doubles for the gateway and artifact store.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use boxes_core::error::{BoxError, Result};

use crate::gateway::{CommandGateway, CommandOutput, HostCommand};
use crate::publish::ArtifactStore;

type Responder = Box<dyn Fn(&HostCommand) -> CommandOutput + Send + Sync>;

/// Records every command and answers from a scripted responder.
pub(crate) struct FakeGateway {
    commands: Mutex<Vec<HostCommand>>,
    responder: Responder,
}

impl FakeGateway {
    /// Every command succeeds with empty output.
    pub(crate) fn new() -> Self {
        Self::with_responder(|_| CommandOutput::ok(""))
    }

    pub(crate) fn with_responder(
        responder: impl Fn(&HostCommand) -> CommandOutput + Send + Sync + 'static,
    ) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub(crate) fn commands(&self) -> Vec<HostCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandGateway for FakeGateway {
    async fn run(&self, command: &HostCommand) -> Result<CommandOutput> {
        self.commands.lock().unwrap().push(command.clone());
        Ok((self.responder)(command))
    }
}

/// Artifact store call, as recorded by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreCall {
    Put { local: PathBuf, key: String },
    Alias { key: String, alias: String },
}

/// Records calls; optionally rejects alias requests.
#[derive(Default)]
pub(crate) struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    fail_alias: bool,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_alias() -> Self {
        Self {
            fail_alias: true,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for RecordingStore {
    async fn put(&self, local: &Path, key: &str) -> Result<()> {
        self.calls.lock().unwrap().push(StoreCall::Put {
            local: local.to_path_buf(),
            key: key.to_string(),
        });
        Ok(())
    }

    async fn alias(&self, key: &str, alias: &str) -> Result<()> {
        self.calls.lock().unwrap().push(StoreCall::Alias {
            key: key.to_string(),
            alias: alias.to_string(),
        });
        if self.fail_alias {
            return Err(BoxError::StoreError {
                key: alias.to_string(),
                message: "503 Service Unavailable".to_string(),
            });
        }
        Ok(())
    }
}
