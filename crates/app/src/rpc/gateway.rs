//! Contract gateway backed by a JSON-RPC node that manages the signing account.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use primitive_types::U256;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use sciquip::{
    failures::Failure,
    models::{Address, Booking, BookingId, Equipment},
    operations::{Inclusion, ReadError, SubmissionHandle},
};

use crate::gateway::{Connection, ConnectionError, Connector, ContractCall, ContractGateway};

use super::{
    abi::Decoder,
    client::{RpcClient, RpcError, RpcTransport},
    contract,
};

/// Where the contract lives and how to reach it.
#[derive(Debug, Clone)]
pub struct RpcSettings {
    pub url: String,
    pub contract: Address,

    /// Signing account; the node's first account when unset.
    pub account: Option<Address>,

    /// Delay between receipt polls while awaiting inclusion.
    pub poll_interval: Duration,
}

pub struct RpcConnector {
    rpc: Arc<dyn RpcTransport>,
    settings: RpcSettings,
}

impl RpcConnector {
    #[must_use]
    pub fn new(settings: RpcSettings) -> Self {
        Self::with_transport(Arc::new(RpcClient::new(settings.url.clone())), settings)
    }

    /// Use `rpc` instead of an HTTP client for `settings.url`.
    #[must_use]
    pub fn with_transport(rpc: Arc<dyn RpcTransport>, settings: RpcSettings) -> Self {
        Self { rpc, settings }
    }

    async fn account(&self) -> Result<Address, ConnectionError> {
        if let Some(account) = self.settings.account {
            return Ok(account);
        }

        let accounts: Vec<Address> = self.rpc.call("eth_accounts", json!([])).await?;

        accounts.first().copied().ok_or(ConnectionError::NoAccount)
    }
}

#[async_trait]
impl Connector for RpcConnector {
    async fn connect(&self) -> Result<Connection, ConnectionError> {
        let chain_id: String = self.rpc.call("eth_chainId", json!([])).await?;
        let chain_id = parse_u64(&chain_id).map_err(ConnectionError::from)?;
        let account = self.account().await?;

        debug!(url = %self.settings.url, contract = %self.settings.contract, "rpc connected");

        Ok(Connection {
            account,
            chain_id,
            gateway: Arc::new(RpcGateway {
                rpc: Arc::clone(&self.rpc),
                contract: self.settings.contract,
                account,
                poll_interval: self.settings.poll_interval,
            }),
        })
    }

    async fn request_network_switch(&self, chain_id: u64) -> Result<(), ConnectionError> {
        let params = json!([{ "chainId": format!("0x{chain_id:x}") }]);

        self.rpc
            .call::<Value>("wallet_switchEthereumChain", params)
            .await
            .map(|_| ())
            .map_err(|error| match error {
                RpcError::Node(object) => ConnectionError::SwitchRefused(object.message),
                error => error.into(),
            })
    }
}

pub struct RpcGateway {
    rpc: Arc<dyn RpcTransport>,
    contract: Address,
    account: Address,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    #[serde(default)]
    status: Option<String>,
    block_number: String,
    gas_used: String,
}

/// Fields of a sent transaction needed to replay it with `eth_call`.
#[derive(Debug, Deserialize)]
struct SentTransaction {
    from: String,

    #[serde(default)]
    to: Option<String>,

    input: String,

    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum ReceiptStatus {
    Pending,
    Included(Inclusion),
    Reverted { block_number: u64 },
}

impl RpcGateway {
    async fn eth_call(&self, data: Vec<u8>) -> Result<Vec<u8>, ReadError> {
        let params = json!([
            {
                "to": self.contract,
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest",
        ]);

        let result: String = self.rpc.call("eth_call", params).await?;

        Ok(decode_hex(&result)?)
    }

    async fn receipt_status(&self, handle: &SubmissionHandle) -> Result<ReceiptStatus, RpcError> {
        let receipt: Option<Receipt> = self
            .rpc
            .call("eth_getTransactionReceipt", json!([handle.as_str()]))
            .await?;

        let Some(receipt) = receipt else {
            return Ok(ReceiptStatus::Pending);
        };

        let block_number = parse_u64(&receipt.block_number)?;

        if receipt.status.as_deref() == Some("0x0") {
            return Ok(ReceiptStatus::Reverted { block_number });
        }

        Ok(ReceiptStatus::Included(Inclusion {
            block_number,
            gas_used: parse_quantity(&receipt.gas_used)?,
        }))
    }

    /// Replay a reverted transaction at its block to recover the revert reason.
    async fn revert_failure(&self, handle: &SubmissionHandle, block_number: u64) -> Failure {
        let fallback =
            || Failure::from_message(format!("transaction reverted in block {block_number}"));

        let transaction: Option<SentTransaction> = match self
            .rpc
            .call("eth_getTransactionByHash", json!([handle.as_str()]))
            .await
        {
            Ok(transaction) => transaction,
            Err(error) => {
                debug!(transaction = %handle, "could not load reverted transaction: {error}");
                return fallback();
            }
        };

        let Some(transaction) = transaction else {
            return fallback();
        };

        let params = json!([
            {
                "from": transaction.from,
                "to": transaction.to,
                "data": transaction.input,
                "value": transaction.value,
            },
            format!("0x{block_number:x}"),
        ]);

        match self.rpc.call::<Value>("eth_call", params).await {
            Err(error @ RpcError::Node(_)) => Failure::from(error),
            Err(error) => {
                debug!(transaction = %handle, "could not replay reverted transaction: {error}");
                fallback()
            }
            Ok(_) => fallback(),
        }
    }
}

#[async_trait]
impl ContractGateway for RpcGateway {
    async fn read_equipment(&self, equipment_id: &str) -> Result<Equipment, ReadError> {
        let data = self.eth_call(contract::equipment_call(equipment_id)).await?;

        contract::decode_equipment(equipment_id, &data)
    }

    async fn read_booking(&self, booking_id: BookingId) -> Result<Booking, ReadError> {
        let data = self.eth_call(contract::booking_call(booking_id)).await?;

        contract::decode_booking(&data)
    }

    async fn read_booking_counter(&self) -> Result<u64, ReadError> {
        let data = self.eth_call(contract::booking_counter_call()).await?;

        Ok(Decoder::new(&data).u64(0)?)
    }

    async fn read_payment(&self, booking_id: BookingId) -> Result<U256, ReadError> {
        let data = self.eth_call(contract::payment_call(booking_id)).await?;

        Ok(Decoder::new(&data).uint(0)?)
    }

    async fn read_balance(&self, account: Address) -> Result<U256, ReadError> {
        let balance: String = self
            .rpc
            .call("eth_getBalance", json!([account, "latest"]))
            .await?;

        Ok(parse_quantity(&balance)?)
    }

    async fn submit(
        &self,
        call: ContractCall,
        value: Option<U256>,
    ) -> Result<SubmissionHandle, Failure> {
        let mut transaction = json!({
            "from": self.account,
            "to": self.contract,
            "data": format!("0x{}", hex::encode(contract::calldata(&call))),
        });

        if let (Some(value), Some(fields)) = (value, transaction.as_object_mut()) {
            fields.insert("value".to_string(), json!(format!("0x{value:x}")));
        }

        let hash: String = self
            .rpc
            .call("eth_sendTransaction", json!([transaction]))
            .await?;

        info!(operation = %call.kind(), transaction = %hash, "transaction sent");

        Ok(SubmissionHandle::new(hash))
    }

    /// Poll for the receipt until the transaction is mined. Failed polls are retried; only a
    /// reverted receipt ends the wait with an error.
    async fn await_inclusion(&self, handle: &SubmissionHandle) -> Result<Inclusion, Failure> {
        loop {
            match self.receipt_status(handle).await {
                Ok(ReceiptStatus::Included(inclusion)) => return Ok(inclusion),
                Ok(ReceiptStatus::Reverted { block_number }) => {
                    return Err(self.revert_failure(handle, block_number).await);
                }
                Ok(ReceiptStatus::Pending) => {
                    debug!(transaction = %handle, "receipt not available yet");
                }
                Err(error) => {
                    warn!(transaction = %handle, "receipt poll failed, retrying: {error}");
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn decode_hex(value: &str) -> Result<Vec<u8>, RpcError> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value))
        .map_err(|error| RpcError::UnexpectedResponse(format!("invalid hex {value:?}: {error}")))
}

fn parse_quantity(value: &str) -> Result<U256, RpcError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);

    U256::from_str_radix(digits, 16)
        .map_err(|error| RpcError::UnexpectedResponse(format!("invalid quantity {value:?}: {error:?}")))
}

fn parse_u64(value: &str) -> Result<u64, RpcError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);

    u64::from_str_radix(digits, 16)
        .map_err(|error| RpcError::UnexpectedResponse(format!("invalid quantity {value:?}: {error}")))
}

#[cfg(test)]
mod tests {
    use sciquip::failures::{ErrorKind, classify};
    use testresult::TestResult;

    use crate::rpc::client::{MockRpcTransport, RpcErrorObject};

    use super::*;

    const ALREADY_CONFIRMED: &str = concat!(
        "0x08c379a0",
        "0000000000000000000000000000000000000000000000000000000000000020",
        "0000000000000000000000000000000000000000000000000000000000000011",
        "416c726561647920636f6e6669726d6564000000000000000000000000000000",
    );

    fn gateway(rpc: MockRpcTransport) -> RpcGateway {
        RpcGateway {
            rpc: Arc::new(rpc),
            contract: Address::from_bytes([0x5d; 20]),
            account: Address::from_bytes([0xab; 20]),
            poll_interval: Duration::ZERO,
        }
    }

    fn handle() -> SubmissionHandle {
        SubmissionHandle::new(format!("0x{:064x}", 7))
    }

    fn reverted_receipt() -> Value {
        json!({ "status": "0x0", "blockNumber": "0x10", "gasUsed": "0x5208" })
    }

    #[tokio::test]
    async fn await_inclusion_retries_failed_polls() {
        let mut rpc = MockRpcTransport::new();
        let mut polls = 0;

        rpc.expect_request().times(3).returning(move |method, _| {
            assert_eq!(method, "eth_getTransactionReceipt");
            polls += 1;

            match polls {
                1 => Err(RpcError::UnexpectedResponse(
                    "eth_getTransactionReceipt failed with status 503 Service Unavailable: busy"
                        .to_string(),
                )),
                2 => Ok(Value::Null),
                _ => Ok(json!({ "status": "0x1", "blockNumber": "0x10", "gasUsed": "0x5208" })),
            }
        });

        let inclusion = gateway(rpc).await_inclusion(&handle()).await;

        assert_eq!(
            inclusion,
            Ok(Inclusion {
                block_number: 16,
                gas_used: U256::from(21_000),
            })
        );
    }

    #[tokio::test]
    async fn reverted_receipt_is_replayed_for_its_reason() {
        let mut rpc = MockRpcTransport::new();

        rpc.expect_request().times(3).returning(|method, params| match method {
            "eth_getTransactionReceipt" => Ok(reverted_receipt()),
            "eth_getTransactionByHash" => Ok(json!({
                "from": "0xabababababababababababababababababababab",
                "to": "0x5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d",
                "input": "0x12345678",
                "value": "0x0",
            })),
            "eth_call" => {
                assert_eq!(params[1], json!("0x10"));
                assert_eq!(params[0]["data"], json!("0x12345678"));

                Err(RpcError::Node(RpcErrorObject {
                    code: 3,
                    message: "execution reverted: Already confirmed".to_string(),
                    data: Some(json!(ALREADY_CONFIRMED)),
                }))
            }
            other => panic!("unexpected call {other}"),
        });

        let failure = gateway(rpc)
            .await_inclusion(&handle())
            .await
            .expect_err("reverted receipt should fail");

        assert_eq!(
            classify(&failure),
            ErrorKind::ContractReverted("Already confirmed".to_string())
        );
    }

    #[tokio::test]
    async fn reverted_receipt_without_replay_keeps_block_message() {
        let mut rpc = MockRpcTransport::new();

        rpc.expect_request().times(2).returning(|method, _| match method {
            "eth_getTransactionReceipt" => Ok(reverted_receipt()),
            "eth_getTransactionByHash" => Ok(Value::Null),
            other => panic!("unexpected call {other}"),
        });

        let failure = gateway(rpc)
            .await_inclusion(&handle())
            .await
            .expect_err("reverted receipt should fail");

        assert_eq!(
            failure.message.as_deref(),
            Some("transaction reverted in block 16")
        );
        assert_eq!(
            classify(&failure),
            ErrorKind::UnknownFailure("transaction reverted in block 16".to_string())
        );
    }

    #[test]
    fn parses_hex_quantities() -> TestResult {
        assert_eq!(parse_u64("0xaa36a7")?, 11_155_111);
        assert_eq!(parse_quantity("0xde0b6b3a7640000")?, U256::exp10(18));
        assert_eq!(parse_quantity("0x0")?, U256::zero());

        Ok(())
    }

    #[test]
    fn rejects_garbage_quantities() {
        assert!(matches!(
            parse_u64("0xnope"),
            Err(RpcError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            decode_hex("0xabc"),
            Err(RpcError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn receipts_deserialize_from_node_json() -> TestResult {
        let receipt: Receipt = serde_json::from_value(json!({
            "status": "0x1",
            "blockNumber": "0x10",
            "gasUsed": "0x5208",
            "transactionHash": "0x01",
        }))?;

        assert_eq!(parse_u64(&receipt.block_number)?, 16);
        assert_eq!(parse_quantity(&receipt.gas_used)?, U256::from(21_000));

        Ok(())
    }
}
