// Path: crates/execution/src/interpreter.rs

//! The execution driver.
//!
//! A run decodes the contract's stored bundle, resolves and type-checks the call,
//! instantiates the bytecode, stages arguments, invokes the entry point under the
//! contract's gas budget and encodes the result. Failures before instantiation charge
//! nothing. After it, a revert charges only the gas used and every other failure
//! consumes the whole budget.

use crate::abi_input::{log_decode_failure, prepare_call};
use crate::abi_output::encode_return;
use crate::depth::CallDepth;
use cvm_api::{EntryId, ExecutionContext, LogSink, TracingLogSink, VirtualMachine, VmInstance};
use cvm_types::abi::{AbiRegistry, AbiType};
use cvm_types::bundle::ContractBundle;
use cvm_types::config::InterpreterConfig;
use cvm_types::error::{ErrorCode, ExecutionError, GasPolicy, VmError};
use std::sync::Arc;

/// The host's view of the contract being run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contract {
    /// The contract address.
    pub address: Vec<u8>,
    /// The stored bundle. Empty for accounts without code.
    pub code: Vec<u8>,
    /// The remaining gas budget, debited by every run.
    pub gas: u64,
}

impl Contract {
    /// Creates a contract with `gas` available.
    pub fn new(address: Vec<u8>, code: Vec<u8>, gas: u64) -> Self {
        Self {
            address,
            code,
            gas,
        }
    }

    /// Settles the gas budget after a failed run.
    pub fn settle_failure(&mut self, err: &ExecutionError) {
        match err.gas_policy() {
            GasPolicy::NoCharge => {}
            GasPolicy::RefundRemaining => {
                if let ExecutionError::Reverted { gas_used, .. } = err {
                    self.gas = self.gas.saturating_sub(*gas_used);
                }
            }
            GasPolicy::ConsumeAll => self.gas = 0,
        }
    }
}

/// What a successful run hands back to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// The encoded return value, or the bundle itself for a deployment.
    pub return_data: Vec<u8>,
    /// The gas consumed by the run.
    pub gas_used: u64,
}

/// The raw outcome of invoking one entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    /// The word returned by the entry point.
    pub raw_word: i64,
    /// Gas consumed by the instance, including instantiation and staging.
    pub gas_used: u64,
}

/// The entry point a run resolves to.
struct Invocation {
    entry: String,
    args: Vec<i64>,
    return_type: Option<AbiType>,
}

/// Runs contract bundles on a [`VirtualMachine`].
pub struct ContractExecutor {
    vm: Arc<dyn VirtualMachine>,
    config: InterpreterConfig,
    call_depth: Arc<CallDepth>,
    log: Arc<dyn LogSink>,
}

impl ContractExecutor {
    /// Creates an executor sharing the process-wide call-depth counter.
    pub fn new(vm: Arc<dyn VirtualMachine>, config: InterpreterConfig) -> Self {
        Self {
            vm,
            config,
            call_depth: CallDepth::global(),
            log: Arc::new(TracingLogSink),
        }
    }

    /// Uses `call_depth` instead of the process-wide counter.
    pub fn with_call_depth(mut self, call_depth: Arc<CallDepth>) -> Self {
        self.call_depth = call_depth;
        self
    }

    /// Routes contract diagnostics to `log`.
    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// The interpreter configuration.
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// The call-depth counter this executor enters.
    pub fn call_depth(&self) -> &Arc<CallDepth> {
        &self.call_depth
    }

    /// Runs `contract` with `input`, or deploys it when `input` is `None`.
    ///
    /// On success `contract.gas` is debited by the gas used. On failure it is settled
    /// by the error's [`GasPolicy`]. A contract with empty code succeeds with empty
    /// output and no charge.
    pub fn run(
        &self,
        contract: &mut Contract,
        input: Option<&[u8]>,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let result = self
            .call_depth
            .enter(self.config.max_call_depth)
            .and_then(|guard| {
                tracing::trace!(target: "interpreter", depth = guard.depth(), "enter");
                let result = self.execute(contract, input);
                drop(guard);
                result
            });

        match &result {
            Ok(output) => {
                tracing::debug!(
                    target: "interpreter",
                    address = %hex::encode(&contract.address),
                    gas_used = output.gas_used,
                    gas_left = contract.gas,
                    "run completed"
                );
            }
            Err(err) => {
                contract.settle_failure(err);
                tracing::warn!(
                    target: "interpreter",
                    address = %hex::encode(&contract.address),
                    code = err.code(),
                    error = %err,
                    gas_left = contract.gas,
                    "run failed"
                );
            }
        }
        result
    }

    fn execute(
        &self,
        contract: &mut Contract,
        input: Option<&[u8]>,
    ) -> Result<ExecutionOutput, ExecutionError> {
        if contract.code.is_empty() {
            return Ok(ExecutionOutput::default());
        }

        let bundle = ContractBundle::decode(&contract.code).map_err(log_decode_failure)?;
        let prepared = match input {
            None => None,
            Some(input) => {
                let abi = AbiRegistry::parse(&bundle.abi_json).map_err(log_decode_failure)?;
                Some(prepare_call(input, &abi).map_err(log_decode_failure)?)
            }
        };

        let context = ExecutionContext::new(contract.address.clone(), contract.gas)
            .with_log_sink(Arc::clone(&self.log));
        let mut instance = self
            .vm
            .instantiate(&bundle.bytecode, context)
            .map_err(ExecutionError::Instantiation)?;

        let invocation = match prepared {
            None => Invocation {
                entry: self.config.init_entry.clone(),
                args: Vec::new(),
                return_type: None,
            },
            Some(prepared) => {
                let call = prepared
                    .marshal(&mut *instance)
                    .map_err(ExecutionError::Fault)?;
                Invocation {
                    entry: call.func_name,
                    args: call.args,
                    return_type: Some(call.return_type),
                }
            }
        };

        let entry = instance
            .export(&invocation.entry)
            .ok_or_else(|| ExecutionError::EntryNotFound(invocation.entry.clone()))?;
        tracing::debug!(
            target: "interpreter",
            entry = %invocation.entry,
            args = invocation.args.len(),
            gas_limit = contract.gas,
            "invoking entry point"
        );
        let result = execute_entry(&mut *instance, entry, contract.gas, &invocation.args)?;

        // The engine meters gas itself; the reported total must still fit the budget.
        if result.gas_used > contract.gas {
            return Err(ExecutionError::OutOfGas {
                gas_used: result.gas_used,
                gas_limit: contract.gas,
            });
        }
        contract.gas -= result.gas_used;

        let return_data = match invocation.return_type {
            None => contract.code.clone(),
            Some(return_type) => encode_return(&return_type, result.raw_word, &*instance)
                .unwrap_or_else(|err| {
                    tracing::error!(
                        target: "interpreter",
                        entry = %invocation.entry,
                        code = err.code(),
                        error = %err,
                        "return value not encodable, returning empty data"
                    );
                    Vec::new()
                }),
        };

        Ok(ExecutionOutput {
            return_data,
            gas_used: result.gas_used,
        })
    }
}

/// Invokes `entry` and separates an intentional revert from every other fault.
fn execute_entry(
    instance: &mut dyn VmInstance,
    entry: EntryId,
    gas_limit: u64,
    args: &[i64],
) -> Result<ExecutionResult, ExecutionError> {
    match instance.run_with_gas_limit(entry, gas_limit, args) {
        Ok(raw_word) => Ok(ExecutionResult {
            raw_word,
            gas_used: instance.context().gas_used,
        }),
        Err(VmError::Reverted(reason)) => Err(ExecutionError::Reverted {
            reason,
            gas_used: instance.context().gas_used.min(gas_limit),
        }),
        Err(err) => Err(ExecutionError::Fault(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockVm, Outcome};
    use cvm_types::call::CallInput;
    use cvm_types::error::DecodeError;

    const ABI: &str = r#"[
        {"method": "add", "args": [
            {"name": "a", "realTypeName": "int64"},
            {"name": "b", "realTypeName": "int32"}
        ], "return": "int64"},
        {"method": "greet", "args": [{"name": "who", "realTypeName": "string"}], "return": "string"},
        {"method": "withdraw", "args": [], "return": "int"},
        {"method": "crash", "args": [], "return": "int"},
        {"method": "ratio", "args": [], "return": "float64"},
        {"method": "ghost", "args": [], "return": "void"}
    ]"#;

    fn bundle() -> Vec<u8> {
        ContractBundle {
            tx_type: 1,
            bytecode: b"\0asm-mock".to_vec(),
            abi_json: ABI.as_bytes().to_vec(),
        }
        .encode()
    }

    fn call(name: &str, args: Vec<Vec<u8>>) -> Vec<u8> {
        CallInput {
            tx_type: 1,
            func_name: name.into(),
            args,
        }
        .encode()
    }

    fn scripted_vm() -> MockVm {
        MockVm::new()
            .with_instantiation_gas(10)
            .with_export("init", Outcome::Word(0), 40)
            .with_export("add", Outcome::Word(42), 100)
            .with_export("greet", Outcome::Text("hi"), 100)
            .with_export("withdraw", Outcome::Revert("no funds"), 300)
            .with_export("crash", Outcome::Trap, 300)
            .with_export("ratio", Outcome::Word(1), 5)
    }

    fn executor(vm: Arc<MockVm>) -> ContractExecutor {
        ContractExecutor::new(vm, InterpreterConfig::default())
            .with_call_depth(Arc::new(CallDepth::new()))
    }

    #[test]
    fn test_empty_code_is_a_no_op() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], Vec::new(), 1000);
        let out = executor(vm.clone())
            .run(&mut contract, Some(&call("add", vec![])))
            .unwrap();
        assert_eq!(out, ExecutionOutput::default());
        assert_eq!(contract.gas, 1000);
        assert_eq!(vm.instantiations(), 0);
    }

    #[test]
    fn test_deploy_runs_init_and_returns_bundle() {
        let vm = Arc::new(scripted_vm());
        let code = bundle();
        let mut contract = Contract::new(vec![1; 20], code.clone(), 1000);
        let out = executor(vm.clone()).run(&mut contract, None).unwrap();

        assert_eq!(out.return_data, code);
        assert_eq!(out.gas_used, 50);
        assert_eq!(contract.gas, 950);
        assert_eq!(vm.recorded_calls(), vec![("init".to_string(), vec![])]);
    }

    #[test]
    fn test_deploy_without_init_export_consumes_all_gas() {
        let vm = Arc::new(
            MockVm::new()
                .with_instantiation_gas(700)
                .with_export("add", Outcome::Word(1), 1),
        );
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let err = executor(vm).run(&mut contract, None).unwrap_err();
        assert_eq!(err, ExecutionError::EntryNotFound("init".into()));
        assert_eq!(contract.gas, 0);
    }

    #[test]
    fn test_call_marshals_arguments_and_encodes_word() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let input = call(
            "ADD",
            vec![(-2i64).to_be_bytes().to_vec(), 5i32.to_be_bytes().to_vec()],
        );
        let out = executor(vm.clone()).run(&mut contract, Some(&input)).unwrap();

        assert_eq!(out.return_data.len(), 32);
        assert_eq!(out.return_data[31], 42);
        assert_eq!(out.gas_used, 110);
        assert_eq!(contract.gas, 890);
        assert_eq!(vm.recorded_calls(), vec![("ADD".to_string(), vec![-2, 5])]);
    }

    #[test]
    fn test_string_argument_and_return() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let out = executor(vm.clone())
            .run(&mut contract, Some(&call("greet", vec![b"bob".to_vec()])))
            .unwrap();

        let mut expected = vec![0u8; 96];
        expected[31] = 32;
        expected[63] = 2;
        expected[64..66].copy_from_slice(b"hi");
        assert_eq!(out.return_data, expected);

        let calls = vm.recorded_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1[0] > 0);
    }

    #[test]
    fn test_unknown_method_fails_before_instantiation() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let err = executor(vm.clone())
            .run(&mut contract, Some(&call("nope", vec![])))
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::Decode(DecodeError::MethodNotFound("nope".into()))
        );
        assert_eq!(contract.gas, 1000);
        assert_eq!(vm.instantiations(), 0);
    }

    #[test]
    fn test_argument_count_mismatch_is_a_decode_error() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let err = executor(vm)
            .run(&mut contract, Some(&call("add", vec![vec![0; 8]])))
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Decode(DecodeError::ArgumentCount { expected: 2, got: 1, .. })
        ));
        assert_eq!(contract.gas, 1000);
    }

    #[test]
    fn test_malformed_bundle_is_a_decode_error() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], vec![0xc2, 0x01], 1000);
        let err = executor(vm).run(&mut contract, None).unwrap_err();
        assert!(matches!(err, ExecutionError::Decode(_)));
        assert_eq!(contract.gas, 1000);
    }

    #[test]
    fn test_abi_method_missing_from_module() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let err = executor(vm)
            .run(&mut contract, Some(&call("ghost", vec![])))
            .unwrap_err();
        assert_eq!(err, ExecutionError::EntryNotFound("ghost".into()));
        assert_eq!(contract.gas, 0);
    }

    #[test]
    fn test_staging_failure_is_a_fault() {
        let vm = Arc::new(scripted_vm().failing_allocations(VmError::OutOfGas));
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let err = executor(vm.clone())
            .run(&mut contract, Some(&call("greet", vec![b"bob".to_vec()])))
            .unwrap_err();
        assert_eq!(err, ExecutionError::Fault(VmError::OutOfGas));
        assert_eq!(contract.gas, 0);
        assert!(vm.recorded_calls().is_empty());
    }

    #[test]
    fn test_malformed_string_argument_rejected_before_instantiation() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let err = executor(vm.clone())
            .run(&mut contract, Some(&call("greet", vec![vec![0x61, 0xff, 0x62]])))
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::Decode(DecodeError::InvalidStringArg {
                index: 0,
                reason: "not valid utf-8"
            })
        );
        assert_eq!(contract.gas, 1000);
        assert_eq!(vm.instantiations(), 0);
    }

    #[test]
    fn test_revert_charges_only_gas_used() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let err = executor(vm)
            .run(&mut contract, Some(&call("withdraw", vec![])))
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::Reverted {
                reason: "no funds".into(),
                gas_used: 310
            }
        );
        assert_eq!(contract.gas, 690);
    }

    #[test]
    fn test_fault_consumes_all_gas() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let err = executor(vm)
            .run(&mut contract, Some(&call("crash", vec![])))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Fault(VmError::ExecutionTrap(_))));
        assert_eq!(contract.gas, 0);
    }

    #[test]
    fn test_engine_out_of_gas_consumes_all_gas() {
        let vm = Arc::new(scripted_vm().with_export("add", Outcome::OutOfGas, 0));
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let input = call("add", vec![vec![0; 8], vec![0; 4]]);
        let err = executor(vm).run(&mut contract, Some(&input)).unwrap_err();
        assert_eq!(err, ExecutionError::Fault(VmError::OutOfGas));
        assert_eq!(contract.gas, 0);
    }

    #[test]
    fn test_post_check_rejects_gas_over_budget() {
        let vm = Arc::new(scripted_vm().with_export("add", Outcome::Word(1), 5000));
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let input = call("add", vec![vec![0; 8], vec![0; 4]]);
        let err = executor(vm).run(&mut contract, Some(&input)).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::OutOfGas {
                gas_used: 5010,
                gas_limit: 1000
            }
        );
        assert_eq!(contract.gas, 0);
    }

    #[test]
    fn test_gas_exactly_at_budget_succeeds() {
        let vm = Arc::new(scripted_vm().with_export("add", Outcome::Word(1), 990));
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let input = call("add", vec![vec![0; 8], vec![0; 4]]);
        let out = executor(vm).run(&mut contract, Some(&input)).unwrap();
        assert_eq!(out.gas_used, 1000);
        assert_eq!(contract.gas, 0);
    }

    #[test]
    fn test_instantiation_failure_consumes_all_gas() {
        let vm = Arc::new(scripted_vm().rejecting_bytecode());
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let err = executor(vm).run(&mut contract, None).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Instantiation(VmError::InvalidBytecode(_))
        ));
        assert_eq!(contract.gas, 0);
    }

    #[test]
    fn test_unsupported_return_type_yields_empty_data() {
        let vm = Arc::new(scripted_vm());
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let out = executor(vm)
            .run(&mut contract, Some(&call("ratio", vec![])))
            .unwrap();
        assert!(out.return_data.is_empty());
        assert_eq!(out.gas_used, 15);
        assert_eq!(contract.gas, 985);
    }

    #[test]
    fn test_call_depth_restored_on_every_path() {
        let vm = Arc::new(scripted_vm());
        let exec = executor(vm);
        let inputs = [
            Some(call("add", vec![vec![0; 8], vec![0; 4]])),
            Some(call("withdraw", vec![])),
            Some(call("crash", vec![])),
            Some(call("nope", vec![])),
            None,
        ];
        for input in &inputs {
            let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
            let _ = exec.run(&mut contract, input.as_deref());
            assert_eq!(exec.call_depth().current(), 0);
        }
    }

    #[test]
    fn test_max_call_depth_exceeded() {
        let vm = Arc::new(scripted_vm());
        let config = InterpreterConfig {
            max_call_depth: 2,
            ..InterpreterConfig::default()
        };
        let depth = Arc::new(CallDepth::new());
        let exec = ContractExecutor::new(vm, config).with_call_depth(depth.clone());

        let _outer = depth.enter(2).unwrap();
        let _inner = depth.enter(2).unwrap();
        let mut contract = Contract::new(vec![1; 20], bundle(), 1000);
        let err = exec.run(&mut contract, None).unwrap_err();
        assert_eq!(err, ExecutionError::CallDepthExceeded { max: 2 });
        assert_eq!(contract.gas, 1000);
        assert_eq!(depth.current(), 2);
    }
}
