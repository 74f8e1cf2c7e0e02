//! Canonical JSON emission for gate results

use anyhow::Context;
use quorum_utils::canonicalization::emit_jcs;

use crate::types::GateResult;

/// Emit a gate result as canonical JSON (RFC 8785) so repeated emission of
/// the same result is byte-identical.
pub fn emit_gate_json(result: &GateResult) -> anyhow::Result<String> {
    emit_jcs(result).context("Failed to emit gate JSON")
}
