//! Remote merges: a wish shipped as JSON, answered with the receipt.

use serde::{Deserialize, Serialize};
use tracing::debug;
use wish_compiler::{Level2Command, ResolveOptions};
use wish_core::{SliceMarker, TargetGraph};

use crate::effect::resolve_commands;
use crate::error::TransactionResult;
use crate::receipt::Receipt;

/// A wish sent by another process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWish {
    pub commands: Vec<Level2Command>,
    #[serde(default)]
    pub retain_internal_ids: bool,
}

impl RemoteWish {
    pub fn new(commands: Vec<Level2Command>) -> Self {
        Self {
            commands,
            retain_internal_ids: false,
        }
    }

    pub fn retain_internal_ids(mut self, retain: bool) -> Self {
        self.retain_internal_ids = retain;
        self
    }

    pub fn to_bytes(&self) -> TransactionResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// The answer to a remote wish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMergeReply {
    /// The slice the merge produced.
    pub slice: SliceMarker,
    pub receipt: Receipt,
}

impl RemoteMergeReply {
    pub fn from_bytes(bytes: &[u8]) -> TransactionResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Decode a `RemoteWish`, merge it into `graph` and encode the reply.
pub fn handle_remote_merge<G: TargetGraph>(
    request: &[u8],
    graph: &mut G,
) -> TransactionResult<Vec<u8>> {
    let wish: RemoteWish = serde_json::from_slice(request)?;
    debug!(commands = wish.commands.len(), "remote merge");
    let options = ResolveOptions::new().retain_internal_ids(wish.retain_internal_ids);
    let output = resolve_commands(wish.commands, graph, &options)?.run(graph)?;
    let reply = RemoteMergeReply {
        slice: output.marker,
        receipt: output.receipt,
    };
    Ok(serde_json::to_vec(&reply)?)
}
