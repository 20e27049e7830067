//! JSON reports printed on stdout.

use cross_query::{CrossQueryInfo, SignatureInfo, TxQueryInfo};
use serde::Serialize;

/// Endorser signature, hex encoded.
#[derive(Debug, Serialize)]
pub struct SignatureReport {
    pub public_key: String,
    pub sign: String,
}

/// Verified contract pre-execution.
#[derive(Debug, Serialize)]
pub struct ContractReport {
    pub bcname: String,
    pub contract: String,
    pub method: String,
    pub status: i32,
    pub message: String,
    /// Body as UTF-8 when it decodes, otherwise absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub body_hex: String,
    pub signatures: Vec<SignatureReport>,
}

/// Verified transaction lookup.
#[derive(Debug, Serialize)]
pub struct TxReport {
    pub bcname: String,
    pub txid: String,
    pub blockid: String,
    pub confirmed: bool,
    pub initiator: String,
    pub timestamp: i64,
    pub desc: String,
    pub signatures: Vec<SignatureReport>,
}

fn signatures(signs: &[SignatureInfo]) -> Vec<SignatureReport> {
    signs
        .iter()
        .map(|s| SignatureReport {
            public_key: s.public_key.clone(),
            sign: hex::encode(&s.sign),
        })
        .collect()
}

impl From<&CrossQueryInfo> for ContractReport {
    fn from(info: &CrossQueryInfo) -> Self {
        let response = &info.response.response;
        Self {
            bcname: info.request.bcname.clone(),
            contract: info.request.request.contract_name.clone(),
            method: info.request.request.method_name.clone(),
            status: response.status,
            message: response.message.clone(),
            body: String::from_utf8(response.body.clone()).ok(),
            body_hex: hex::encode(&response.body),
            signatures: signatures(&info.signs),
        }
    }
}

impl From<&TxQueryInfo> for TxReport {
    fn from(info: &TxQueryInfo) -> Self {
        Self {
            bcname: info.request.bcname.clone(),
            txid: hex::encode(&info.response.txid),
            blockid: hex::encode(&info.response.blockid),
            confirmed: !info.response.blockid.is_empty(),
            initiator: info.response.initiator.clone(),
            timestamp: info.response.timestamp,
            desc: String::from_utf8_lossy(&info.response.desc).into_owned(),
            signatures: signatures(&info.signs),
        }
    }
}
