// Path: crates/execution/src/deadline.rs

//! Wall-clock bound for a run, for hosts that want one on top of gas.

use crate::interpreter::{Contract, ContractExecutor, ExecutionOutput};
use cvm_types::error::{ExecutionError, VmError};
use std::sync::Arc;
use std::time::Duration;

/// Runs `contract` on the blocking pool and gives up after `timeout`.
///
/// On completion `contract` is updated exactly as [`ContractExecutor::run`] would.
/// On timeout the whole gas budget is consumed and [`ExecutionError::Timeout`] is
/// returned. The abandoned run keeps its blocking thread until the VM returns, which
/// the gas ceiling bounds.
pub async fn run_with_deadline(
    executor: Arc<ContractExecutor>,
    contract: &mut Contract,
    input: Option<Vec<u8>>,
    timeout: Duration,
) -> Result<ExecutionOutput, ExecutionError> {
    let mut task_contract = contract.clone();
    let handle = tokio::task::spawn_blocking(move || {
        let result = executor.run(&mut task_contract, input.as_deref());
        (task_contract, result)
    });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok((finished, result))) => {
            *contract = finished;
            result
        }
        Ok(Err(join_err)) => {
            let err = ExecutionError::Fault(VmError::HostError(format!(
                "execution task failed: {join_err}"
            )));
            contract.settle_failure(&err);
            Err(err)
        }
        Err(_) => {
            let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            let err = ExecutionError::Timeout(millis);
            contract.settle_failure(&err);
            tracing::warn!(
                target: "interpreter",
                address = %hex::encode(&contract.address),
                timeout_ms = millis,
                "run abandoned after deadline"
            );
            Err(err)
        }
    }
}
