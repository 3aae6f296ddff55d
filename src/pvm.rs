//! The PVM core: instruction interpreter, `Ψ_M` (marshalling invocation), and
//! `Ψ_A` (accumulate invocation), as a single owned [`Machine`].
//!
//! There is no process-wide state here — every caller constructs and owns its
//! own `Machine`, and can run as many concurrently as it likes (one per
//! service invocation, say). That is the whole of the concurrency story: the
//! interpreter loop itself is a plain synchronous function over `&mut self`.

use crate::codec::{
    decode_accumulate_args, decode_blob, decode_implications_pair, decode_program_from_preimage,
    encode_fixed_length, encode_implications_pair, AccountEntry, CompleteServiceAccount,
    DeferredTransfer, Implications, ImplicationsPair, PartialState, ProvisionEntry,
};
use crate::config::{
    FetchSystemConstantsConfig, ARGS_SEGMENT_START, HALT_ADDRESS, MIN_PUBLIC_INDEX, REG_WHAT,
    RESULT_CODE_FAULT, RESULT_CODE_HALT, RESULT_CODE_HOST, RESULT_CODE_OOG, RESULT_CODE_PANIC,
    STACK_SEGMENT_END,
};
use crate::crypto::blake2b256;
use crate::errors::PvmSetupError;
use crate::host_functions::base::HostFunctionContext;
use crate::host_functions::get_host_function;
use crate::instructions::registry::InstructionRegistry;
use crate::instructions::registry_instructions::register_all_instructions;
use crate::mock_ram::MockRam;
use crate::parser::PvmParser;
use crate::ram::PvmRam;
use crate::simple_ram::SimpleRam;
use crate::types::{
    AccumulateInvocationResult, ExecutionResult, InstructionContext, InstructionResult,
    MemoryAccessType, Ram, RegisterState, RunProgramResult,
};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Execution status of a [`Machine`] (Gray Paper Ψ outcomes, plus `Ok` for
/// "not yet terminated").
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok = 0,
    Halt = 1,
    Panic = 2,
    Fault = 3,
    Host = 4,
    Oog = 5,
}

/// Which [`Ram`] backend a [`Machine`] is built on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RamKind {
    /// Production paged backend (lazy page table, fault tracking).
    Pvm,
    /// Flat byte-vector backend; lighter weight, used where page-fault
    /// fidelity is not needed.
    Simple,
    /// Fixed-size backend for unit tests that hand-construct small programs.
    Mock,
}

enum RamEnum {
    Pvm(PvmRam),
    Simple(SimpleRam),
    Mock(MockRam),
}

impl Ram for RamEnum {
    fn read_octets(&mut self, address: u32, count: u32) -> crate::types::ReadResult {
        match self {
            RamEnum::Pvm(r) => r.read_octets(address, count),
            RamEnum::Simple(r) => r.read_octets(address, count),
            RamEnum::Mock(r) => r.read_octets(address, count),
        }
    }
    fn write_octets(&mut self, address: u32, values: &[u8]) -> crate::types::WriteResult {
        match self {
            RamEnum::Pvm(r) => r.write_octets(address, values),
            RamEnum::Simple(r) => r.write_octets(address, values),
            RamEnum::Mock(r) => r.write_octets(address, values),
        }
    }
    fn current_heap_pointer(&self) -> u32 {
        match self {
            RamEnum::Pvm(r) => r.current_heap_pointer(),
            RamEnum::Simple(r) => r.current_heap_pointer(),
            RamEnum::Mock(r) => r.current_heap_pointer(),
        }
    }
    fn set_current_heap_pointer(&mut self, value: u32) {
        match self {
            RamEnum::Pvm(r) => r.set_current_heap_pointer(value),
            RamEnum::Simple(r) => r.set_current_heap_pointer(value),
            RamEnum::Mock(r) => r.set_current_heap_pointer(value),
        }
    }
    fn allocate_pages(&mut self, start_page: u32, count: u32) {
        match self {
            RamEnum::Pvm(r) => r.allocate_pages(start_page, count),
            RamEnum::Simple(r) => r.allocate_pages(start_page, count),
            RamEnum::Mock(r) => r.allocate_pages(start_page, count),
        }
    }
    fn is_readable_with_fault(&self, address: u32, size: u32) -> crate::types::FaultCheckResult {
        match self {
            RamEnum::Pvm(r) => r.is_readable_with_fault(address, size),
            RamEnum::Simple(r) => r.is_readable_with_fault(address, size),
            RamEnum::Mock(r) => r.is_readable_with_fault(address, size),
        }
    }
    fn initialize_memory_layout(
        &mut self,
        argument_data: &[u8],
        read_only_data: &[u8],
        read_write_data: &[u8],
        stack_size: u32,
        heap_zero_padding_size: u32,
    ) {
        match self {
            RamEnum::Pvm(r) => r.initialize_memory_layout(
                argument_data,
                read_only_data,
                read_write_data,
                stack_size,
                heap_zero_padding_size,
            ),
            RamEnum::Simple(r) => r.initialize_memory_layout(
                argument_data,
                read_only_data,
                read_write_data,
                stack_size,
                heap_zero_padding_size,
            ),
            RamEnum::Mock(r) => r.initialize_memory_layout(
                argument_data,
                read_only_data,
                read_write_data,
                stack_size,
                heap_zero_padding_size,
            ),
        }
    }
    fn is_writable_with_fault(&self, address: u32, size: u32) -> crate::types::FaultCheckResult {
        match self {
            RamEnum::Pvm(r) => r.is_writable_with_fault(address, size),
            RamEnum::Simple(r) => r.is_writable_with_fault(address, size),
            RamEnum::Mock(r) => r.is_writable_with_fault(address, size),
        }
    }
    fn set_page_access_rights(&mut self, address: u32, length: u32, access_type: MemoryAccessType) {
        match self {
            RamEnum::Pvm(r) => r.set_page_access_rights(address, length, access_type),
            RamEnum::Simple(r) => r.set_page_access_rights(address, length, access_type),
            RamEnum::Mock(r) => r.set_page_access_rights(address, length, access_type),
        }
    }
    fn init_page(&mut self, address: u32, length: u32, access_type: MemoryAccessType) {
        match self {
            RamEnum::Pvm(r) => r.init_page(address, length, access_type),
            RamEnum::Simple(r) => r.init_page(address, length, access_type),
            RamEnum::Mock(r) => r.init_page(address, length, access_type),
        }
    }
    fn write_octets_during_initialization(&mut self, address: u32, values: &[u8]) {
        match self {
            RamEnum::Pvm(r) => r.write_octets_during_initialization(address, values),
            RamEnum::Simple(r) => r.write_octets_during_initialization(address, values),
            RamEnum::Mock(r) => r.write_octets_during_initialization(address, values),
        }
    }
    fn get_page_dump(&self, page_index: u32) -> Vec<u8> {
        match self {
            RamEnum::Pvm(r) => r.get_page_dump(page_index),
            RamEnum::Simple(r) => r.get_page_dump(page_index),
            RamEnum::Mock(r) => r.get_page_dump(page_index),
        }
    }
    fn reset(&mut self) {
        match self {
            RamEnum::Pvm(r) => r.reset(),
            RamEnum::Simple(r) => r.reset(),
            RamEnum::Mock(r) => r.reset(),
        }
    }
    fn last_load_address(&self) -> u32 {
        match self {
            RamEnum::Pvm(r) => r.last_load_address(),
            RamEnum::Simple(r) => r.last_load_address(),
            RamEnum::Mock(r) => r.last_load_address(),
        }
    }
    fn last_load_value(&self) -> u64 {
        match self {
            RamEnum::Pvm(r) => r.last_load_value(),
            RamEnum::Simple(r) => r.last_load_value(),
            RamEnum::Mock(r) => r.last_load_value(),
        }
    }
    fn last_store_address(&self) -> u32 {
        match self {
            RamEnum::Pvm(r) => r.last_store_address(),
            RamEnum::Simple(r) => r.last_store_address(),
            RamEnum::Mock(r) => r.last_store_address(),
        }
    }
    fn last_store_value(&self) -> u64 {
        match self {
            RamEnum::Pvm(r) => r.last_store_value(),
            RamEnum::Simple(r) => r.last_store_value(),
            RamEnum::Mock(r) => r.last_store_value(),
        }
    }
    fn clear_last_memory_op(&mut self) {
        match self {
            RamEnum::Pvm(r) => r.clear_last_memory_op(),
            RamEnum::Simple(r) => r.clear_last_memory_op(),
            RamEnum::Mock(r) => r.clear_last_memory_op(),
        }
    }
}

fn registry() -> &'static InstructionRegistry {
    static REGISTRY: OnceLock<InstructionRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut r = InstructionRegistry::new();
        register_all_instructions(&mut r);
        r
    })
}

/// Parameters for [`Machine::setup_accumulate`] (the `Ψ_A` prologue).
pub struct SetupAccumulateParams<'a> {
    /// Preimage-encoded program (deblob-able code + metadata), already
    /// resolved by the caller from the service account's codehash.
    pub program: &'a [u8],
    pub args: &'a [u8],
    /// Encoded implications pair `(imX, imY)`.
    pub encoded_context: &'a [u8],
    pub gas_limit: u32,
    pub num_cores: u32,
    pub num_validators: u32,
    pub auth_queue_size: u32,
    pub entropy_accumulator: &'a [u8],
    /// Per-item pre-encoded `AccumulateInput`s, for FETCH selectors 14/15.
    pub encoded_accumulate_inputs: Option<Vec<Vec<u8>>>,
    pub config: FetchSystemConstantsConfig,
}

/// An owned PVM instance: registers, paged RAM, loaded code, and (when
/// running inside `Ψ_A`) the accumulate implications it is mutating.
pub struct Machine {
    pub program_counter: u32,
    pub gas_left: u32,
    pub status: Status,
    pub exit_arg: u32,
    pub result_code: u8,
    pub registers: RegisterState,
    pub code: Vec<u8>,
    pub bitmask: Vec<u8>,
    pub jump_table: Vec<u32>,
    ram: RamEnum,
    pub last_load_address: u32,
    pub last_load_value: u64,
    pub last_store_address: u32,
    pub last_store_value: u64,
    /// Opcode of the last-executed instruction (for trace dumps).
    pub last_opcode: u8,
    pub has_accumulation_context: bool,
    /// Set by the YIELD host call (26) during accumulation.
    pub yield_hash: Option<Vec<u8>>,
    /// Set by ECALLI when it returns `RESULT_CODE_HOST` (Gray Paper: immed_X).
    pub host_call_id: u32,
    checkpoint_requested: bool,
    pub accumulate_inputs_encoded: Vec<Vec<u8>>,
    pub work_package_encoded: Option<Vec<u8>>,
    pub auth_config: Option<Vec<u8>>,
    pub auth_token: Option<Vec<u8>>,
    pub refine_context_encoded: Option<Vec<u8>>,
    pub work_item_summaries: Option<Vec<Vec<u8>>>,
    pub work_item_payloads: Option<Vec<Vec<u8>>>,
    pub log_messages: Vec<String>,
    pub entropy_accumulator: Option<Vec<u8>>,
    accumulation_num_cores: u32,
    accumulation_num_validators: u32,
    accumulation_fetch_config: Option<FetchSystemConstantsConfig>,
    pub timeslot: Option<u64>,
    accumulation_service_id: Option<u64>,
    accumulation_accounts: Option<HashMap<u64, CompleteServiceAccount>>,
    accumulation_implications_regular: Option<Implications>,
    accumulation_implications_exceptional: Option<Implications>,
    accumulation_pending_xfers: Vec<DeferredTransfer>,
    accumulation_regular_state: PartialState,
    accumulation_nextfreeid: u32,
    accumulation_provisions: Vec<ProvisionEntry>,
}

impl Machine {
    #[must_use]
    pub fn new(ram_kind: RamKind) -> Self {
        let ram = match ram_kind {
            RamKind::Pvm => RamEnum::Pvm(PvmRam::new()),
            RamKind::Simple => RamEnum::Simple(SimpleRam::new()),
            RamKind::Mock => RamEnum::Mock(MockRam::new()),
        };
        Self {
            program_counter: 0,
            gas_left: crate::config::DEFAULT_GAS_LIMIT,
            status: Status::Ok,
            exit_arg: 0,
            result_code: RESULT_CODE_HALT,
            registers: [0u64; 13],
            code: vec![],
            bitmask: vec![],
            jump_table: vec![],
            ram,
            last_load_address: 0,
            last_load_value: 0,
            last_store_address: 0,
            last_store_value: 0,
            last_opcode: 0,
            has_accumulation_context: false,
            yield_hash: None,
            host_call_id: 0,
            checkpoint_requested: false,
            accumulate_inputs_encoded: vec![],
            work_package_encoded: None,
            auth_config: None,
            auth_token: None,
            refine_context_encoded: None,
            work_item_summaries: None,
            work_item_payloads: None,
            log_messages: vec![],
            entropy_accumulator: None,
            accumulation_num_cores: 0,
            accumulation_num_validators: 0,
            accumulation_fetch_config: None,
            timeslot: None,
            accumulation_service_id: None,
            accumulation_accounts: None,
            accumulation_implications_regular: None,
            accumulation_implications_exceptional: None,
            accumulation_pending_xfers: vec![],
            accumulation_regular_state: PartialState::default(),
            accumulation_nextfreeid: 0,
            accumulation_provisions: vec![],
        }
    }

    /// Reset the program-visible state (registers, gas, PC, accumulate
    /// context) but keep the RAM backend chosen at construction.
    pub fn reset(&mut self) {
        self.program_counter = 0;
        self.gas_left = crate::config::DEFAULT_GAS_LIMIT;
        self.status = Status::Ok;
        self.exit_arg = 0;
        self.result_code = RESULT_CODE_HALT;
        self.registers = [0u64; 13];
        self.ram.reset();
        self.last_opcode = 0;
        self.host_call_id = 0;
        self.has_accumulation_context = false;
        self.yield_hash = None;
        self.checkpoint_requested = false;
        self.accumulate_inputs_encoded.clear();
        self.work_package_encoded = None;
        self.auth_config = None;
        self.auth_token = None;
        self.refine_context_encoded = None;
        self.work_item_summaries = None;
        self.work_item_payloads = None;
        self.log_messages.clear();
        self.entropy_accumulator = None;
        self.accumulation_num_cores = 0;
        self.accumulation_num_validators = 0;
        self.timeslot = None;
        self.accumulation_fetch_config = None;
        self.accumulation_service_id = None;
        self.accumulation_accounts = None;
        self.accumulation_implications_regular = None;
        self.accumulation_implications_exceptional = None;
        self.accumulation_pending_xfers.clear();
        self.accumulation_regular_state = PartialState::default();
        self.accumulation_nextfreeid = 0;
        self.accumulation_provisions.clear();
    }

    /// Build the current regular implications (`imX`) by folding live
    /// account/transfer/provision/yield state back into the snapshot decoded
    /// at setup. Used both for CHECKPOINT's `imY' = imX` snapshot and for
    /// exposing the updated context to the caller after a run.
    fn build_current_regular_implications(&self) -> Option<Implications> {
        let mut regular = self.accumulation_implications_regular.clone()?;
        let mut accounts_vec: Vec<AccountEntry> = self
            .accumulation_accounts
            .as_ref()?
            .iter()
            .map(|(id, acc)| AccountEntry {
                service_id: *id as u32,
                account: acc.clone(),
            })
            .collect();
        accounts_vec.sort_by_key(|e| e.service_id);

        regular.nextfreeid = self.accumulation_nextfreeid;
        regular.state = self.accumulation_regular_state.clone();
        regular.state.accounts = accounts_vec;
        regular.xfers.extend(self.accumulation_pending_xfers.clone());
        regular.provisions = self.accumulation_provisions.clone();
        regular.yield_hash = self.yield_hash.clone();
        Some(regular)
    }

    /// Encode the updated implications pair `(imX', imY')` after a run, for
    /// a caller that wants to thread accumulate state across steps without
    /// reaching into the `Machine`'s private fields.
    #[must_use]
    pub fn accumulation_context_encoded(
        &self,
        num_cores: i32,
        num_validators: i32,
        auth_queue_size: i32,
    ) -> Option<Vec<u8>> {
        if !self.has_accumulation_context {
            return None;
        }
        let mut regular = self.build_current_regular_implications()?;
        let exceptional = self.accumulation_implications_exceptional.clone()?;
        regular.yield_hash = self.yield_hash.clone();
        let pair = ImplicationsPair { regular, exceptional };
        Some(encode_implications_pair(&pair, num_cores, num_validators, auth_queue_size))
    }

    /// Gray Paper §4.5 step 4: the deterministic initial `nextFreeId`,
    /// `Cminpublicindex + (BE_u32(Blake2b(enc4(serviceId) ‖ entropy(32) ‖ enc4(timeslot)))[0..4] mod (2^32 - Cminpublicindex - 2^8))`.
    /// Falls back to the caller-supplied `nextfreeid` when entropy or the
    /// timeslot aren't available to derive it from (e.g. re-entering an
    /// already-running accumulate invocation rather than priming a fresh one).
    fn derive_next_free_id(
        service_id: u32,
        entropy_accumulator: Option<&[u8]>,
        timeslot: Option<u64>,
        fallback: u32,
    ) -> u32 {
        const MODULUS: u64 = 4_294_967_296 - 256 - MIN_PUBLIC_INDEX as u64;
        let (Some(entropy), Some(timeslot)) = (entropy_accumulator, timeslot) else {
            return fallback;
        };
        if entropy.len() != 32 {
            return fallback;
        }
        let mut preimage = Vec::with_capacity(4 + 32 + 4);
        preimage.extend_from_slice(&encode_fixed_length(u64::from(service_id), 4));
        preimage.extend_from_slice(entropy);
        preimage.extend_from_slice(&encode_fixed_length(timeslot, 4));
        let digest = blake2b256(&preimage);
        let first_four = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        (u64::from(MIN_PUBLIC_INDEX) + (u64::from(first_four) % MODULUS)) as u32
    }

    /// Prime the machine to run a `Ψ_A` invocation: decode the preimage,
    /// deblob the code, lay out memory per the argument ABI, and decode the
    /// implications pair. Leaves the machine at PC=5 ready to step.
    pub fn setup_accumulate(&mut self, params: SetupAccumulateParams<'_>) -> Result<(), PvmSetupError> {
        // Gray Paper Ψ_A prologue: the resolved service code is checked for
        // length before anything else runs. Empty code is BAD (the account
        // somehow points at an empty preimage); oversized code is BIG. Both
        // are reported before the interpreter is primed, so gasUsed stays 0
        // and the caller's pre-existing state is never touched.
        if params.program.is_empty() {
            return Err(PvmSetupError::MissingCode);
        }
        if params.program.len() > crate::config::MAX_SERVICE_CODE_SIZE as usize {
            return Err(PvmSetupError::CodeTooLarge);
        }
        let decoded =
            decode_program_from_preimage(params.program).ok_or(PvmSetupError::MalformedBlob)?;
        let decoded_blob = decode_blob(&decoded.code).ok_or(PvmSetupError::MalformedBlob)?;

        let code_len = decoded_blob.code.len();
        let ext_len = code_len + 16;
        let mut extended_code = vec![0u8; ext_len];
        extended_code[..code_len].copy_from_slice(&decoded_blob.code);
        let mut extended_bitmask = vec![1u8; ext_len + 25];
        extended_bitmask[..decoded_blob.bitmask.len().min(ext_len)]
            .copy_from_slice(&decoded_blob.bitmask);
        self.code = extended_code;
        self.bitmask = extended_bitmask;
        self.jump_table = decoded_blob.jump_table;
        self.ram.reset();
        self.ram.initialize_memory_layout(
            params.args,
            &decoded.ro_data,
            &decoded.rw_data,
            decoded.stack_size,
            decoded.heap_zero_padding_size,
        );
        self.program_counter = 5;
        self.gas_left = params.gas_limit;
        self.status = Status::Ok;
        self.result_code = RESULT_CODE_HALT;
        self.registers = [0u64; 13];
        self.registers[0] = u64::from(HALT_ADDRESS);
        self.registers[1] = u64::from(STACK_SEGMENT_END);
        self.registers[7] = u64::from(ARGS_SEGMENT_START);
        self.registers[8] = params.args.len() as u64;
        self.exit_arg = 0;
        self.host_call_id = 0;
        self.has_accumulation_context = true;
        self.entropy_accumulator = (params.entropy_accumulator.len() == 32)
            .then(|| params.entropy_accumulator.to_vec());
        self.accumulation_num_cores = params.num_cores;
        self.accumulation_num_validators = params.num_validators;
        self.timeslot = decode_accumulate_args(params.args).map(|r| r.value.timeslot);
        self.accumulation_fetch_config = Some(params.config);

        let num_cores_i = params.num_cores as i32;
        let num_validators_i = params.num_validators as i32;
        let auth_queue_size_i = params.auth_queue_size as i32;
        let pair_result = decode_implications_pair(
            params.encoded_context,
            num_cores_i,
            num_validators_i,
            auth_queue_size_i,
        )
        .ok_or(PvmSetupError::MalformedImplications)?;

        let pair = pair_result.value;
        self.accumulation_implications_regular = Some(pair.regular.clone());
        self.accumulation_implications_exceptional = Some(pair.exceptional);
        let regular = &pair.regular;
        self.accumulation_service_id = Some(regular.id as u64);
        let mut accounts = HashMap::new();
        for entry in &regular.state.accounts {
            accounts
                .entry(entry.service_id as u64)
                .or_insert_with(|| entry.account.clone());
        }
        self.accumulation_accounts = Some(accounts);
        self.accumulation_pending_xfers.clear();
        self.accumulation_regular_state = regular.state.clone();
        self.accumulation_nextfreeid = Self::derive_next_free_id(
            regular.id as u32,
            self.entropy_accumulator.as_deref(),
            self.timeslot,
            regular.nextfreeid,
        );
        self.accumulation_provisions = regular.provisions.clone();

        if let Some(inputs) = params.encoded_accumulate_inputs {
            self.accumulate_inputs_encoded = inputs;
        }

        tracing::debug!(
            accounts = self.accumulation_accounts.as_ref().map_or(0, HashMap::len),
            "accumulate invocation primed"
        );
        Ok(())
    }

    /// Parse a raw program blob (code + bitmask + jump table framing),
    /// load it, and reset program-visible state. Does not run it.
    pub fn prepare_blob(&mut self, program: &[u8]) -> Result<(), PvmSetupError> {
        let parser = PvmParser::new();
        let parse_result = parser.parse_program(program);
        if !parse_result.success {
            self.status = Status::Panic;
            self.result_code = RESULT_CODE_PANIC;
            return Err(PvmSetupError::MalformedBlob);
        }
        self.code = parse_result.extended_code;
        self.bitmask = parse_result.bitmask;
        self.jump_table = parse_result.jump_table;
        self.reset_after_load();
        Ok(())
    }

    /// `prepare_blob`, then run to termination (`Ψ_M`).
    pub fn run_blob(&mut self, program: &[u8]) -> Result<RunProgramResult, PvmSetupError> {
        self.prepare_blob(program)?;
        Ok(self.run())
    }

    fn reset_after_load(&mut self) {
        self.program_counter = 0;
        self.gas_left = crate::config::DEFAULT_GAS_LIMIT;
        self.status = Status::Ok;
        self.exit_arg = 0;
        self.result_code = RESULT_CODE_HALT;
        self.registers = [0u64; 13];
        self.ram.reset();
        self.last_opcode = 0;
        self.host_call_id = 0;
    }

    /// Run to termination, consuming steps one at a time.
    pub fn run(&mut self) -> RunProgramResult {
        let gas_initial = self.gas_left;
        while self.step() {}
        let gas_consumed = gas_initial.saturating_sub(self.gas_left);
        let result = match self.status {
            Status::Halt => ExecutionResult::from_data(self.result_bytes()),
            Status::Oog => ExecutionResult::from_oog(),
            // PANIC and FAULT both carry no output; only their gas/status distinction matters
            // to the caller, which reads `Machine::status`/`result_code` directly.
            _ => ExecutionResult::from_panic(),
        };
        RunProgramResult { gas_consumed, result }
    }

    /// Execute a single instruction (fetch/decode/dispatch). Returns `false`
    /// once the machine has reached a terminal state (HALT/PANIC/FAULT/OOG).
    pub fn step(&mut self) -> bool {
        self.host_call_id = 0;
        if self.code.is_empty() {
            self.status = Status::Halt;
            return false;
        }
        let pc = self.program_counter;
        if pc as usize >= self.code.len() {
            self.status = Status::Halt;
            self.result_code = RESULT_CODE_HALT;
            return false;
        }
        if self.gas_left == 0 {
            self.status = Status::Oog;
            self.result_code = RESULT_CODE_OOG;
            return false;
        }

        let parser = PvmParser::new();
        let fskip = parser.skip(pc as i32, &self.bitmask);
        let instruction_length = 1 + fskip;
        let opcode = self.code[pc as usize] as i32;
        let operands_end = (pc as usize + instruction_length as usize).min(self.code.len());
        let operands = &self.code[(pc as usize + 1)..operands_end];

        let Some(handler) = registry().get_handler(opcode) else {
            self.status = Status::Panic;
            self.result_code = RESULT_CODE_PANIC;
            return false;
        };

        self.last_opcode = opcode as u8;
        self.gas_left = self.gas_left.saturating_sub(1);

        let pc_before = self.program_counter;
        let mut host_call_id_out = self.host_call_id;
        let mut context = InstructionContext {
            code: &self.code,
            bitmask: &self.bitmask,
            registers: &mut self.registers,
            program_counter: self.program_counter,
            gas_remaining: self.gas_left,
            operands,
            fskip,
            jump_table: &self.jump_table,
            ram: &mut self.ram,
            host_call_id_out: Some(&mut host_call_id_out),
        };
        let result = handler.execute(&mut context);
        let last_load_address = context.ram.last_load_address();
        let last_load_value = context.ram.last_load_value();
        let last_store_address = context.ram.last_store_address();
        let last_store_value = context.ram.last_store_value();
        let program_counter_after = context.program_counter;
        drop(context);
        self.host_call_id = host_call_id_out;
        self.last_load_address = last_load_address;
        self.last_load_value = last_load_value;
        self.last_store_address = last_store_address;
        self.last_store_value = last_store_value;

        if result.result_code == RESULT_CODE_HOST as i32 {
            return self.dispatch_host_call(pc, instruction_length);
        }

        if result.result_code != InstructionResult::CONTINUE {
            self.status = match result.result_code as u8 {
                x if x == RESULT_CODE_HALT => Status::Halt,
                x if x == RESULT_CODE_PANIC => Status::Panic,
                x if x == RESULT_CODE_FAULT => Status::Fault,
                x if x == RESULT_CODE_HOST => Status::Host,
                x if x == RESULT_CODE_OOG => Status::Oog,
                _ => Status::Panic,
            };
            self.result_code = result.result_code as u8;
            self.exit_arg = if result.has_fault_address { result.fault_address } else { 0 };
            return false;
        }

        if program_counter_after != pc_before {
            self.program_counter = program_counter_after;
        } else {
            self.program_counter = pc + instruction_length as u32;
        }
        true
    }

    /// ECALLI produced `RESULT_CODE_HOST`: dispatch to the identified host
    /// function (general 0-13, accumulate 14-26, or LOG 100), charging base
    /// gas and applying the accumulate-context id restriction (Gray Paper
    /// pvm_invocations.tex 206-210: ids outside the allowed set are a no-op
    /// `WHAT` rather than a panic, so untrusted code can probe safely).
    fn dispatch_host_call(&mut self, pc: u32, instruction_length: i32) -> bool {
        const HOST_BASE_GAS: u32 = 10;

        if self.has_accumulation_context {
            let id = self.host_call_id as u64;
            let allowed = (id <= 5) || (id == 100) || (14..=26).contains(&id);
            if !allowed {
                if self.gas_left < HOST_BASE_GAS {
                    self.status = Status::Oog;
                    self.result_code = RESULT_CODE_OOG;
                    return false;
                }
                self.gas_left -= HOST_BASE_GAS;
                self.registers[7] = REG_WHAT;
                self.program_counter = pc + instruction_length as u32;
                return true;
            }
        }

        let Some(handler) = get_host_function(self.host_call_id) else {
            self.registers[7] = REG_WHAT;
            self.program_counter = pc + instruction_length as u32;
            return true;
        };

        if self.gas_left < HOST_BASE_GAS {
            self.status = Status::Oog;
            self.result_code = RESULT_CODE_OOG;
            return false;
        }
        self.gas_left -= HOST_BASE_GAS;

        let has_ctx = self.has_accumulation_context;
        let mut host_ctx = HostFunctionContext {
            registers: &mut self.registers,
            ram: &mut self.ram,
            gas_remaining: &mut self.gas_left,
            service_id: self.accumulation_service_id,
            service_account: None,
            accounts: self.accumulation_accounts.as_mut(),
            manager_id: has_ctx.then_some(self.accumulation_regular_state.manager as u64),
            registrar_id: has_ctx.then_some(self.accumulation_regular_state.registrar as u64),
            nextfreeid: has_ctx.then_some(&mut self.accumulation_nextfreeid),
            lookup_timeslot: None,
            timeslot: self.timeslot,
            expunge_period: self
                .accumulation_fetch_config
                .as_ref()
                .map(|c| c.preimage_expunge_period as u64),
            refine_context: None,
            yield_hash: has_ctx.then_some(&mut self.yield_hash),
            provisions: has_ctx.then_some(&mut self.accumulation_provisions),
            delegator_id: has_ctx.then_some(self.accumulation_regular_state.delegator as u64),
            num_validators: (self.accumulation_num_validators > 0)
                .then_some(self.accumulation_num_validators),
            accumulation_state: has_ctx.then_some(&mut self.accumulation_regular_state),
            xfers: has_ctx.then_some(&mut self.accumulation_pending_xfers),
            checkpoint_requested: has_ctx.then_some(&mut self.checkpoint_requested),
            num_cores: (self.accumulation_num_cores > 0).then_some(self.accumulation_num_cores),
            fetch_entropy_accumulator: self.entropy_accumulator.as_deref(),
            fetch_authorizer_trace: None,
            fetch_export_segments: None,
            fetch_import_segments: None,
            fetch_work_item_index: None,
            fetch_accumulate_inputs: (!self.accumulate_inputs_encoded.is_empty())
                .then_some(self.accumulate_inputs_encoded.as_slice()),
            fetch_work_package_encoded: self.work_package_encoded.as_deref(),
            fetch_auth_config: self.auth_config.as_deref(),
            fetch_auth_token: self.auth_token.as_deref(),
            fetch_refine_context_encoded: self.refine_context_encoded.as_deref(),
            fetch_work_item_summaries: self.work_item_summaries.as_deref(),
            fetch_work_item_payloads: self.work_item_payloads.as_deref(),
            log_messages: Some(&mut self.log_messages),
            fetch_system_constants_config: self.accumulation_fetch_config.as_ref(),
        };
        let host_result = handler.execute(&mut host_ctx);

        #[cfg(feature = "log_host_calls")]
        tracing::trace!(id = self.host_call_id, result = host_result.result_code, "host call");

        // Gray Paper line 752: imY' = imX. CHECKPOINT (17) set checkpoint_requested;
        // snapshot current regular into exceptional so a later panic/OOG reverts here.
        if self.checkpoint_requested {
            if let Some(snapshot) = self.build_current_regular_implications() {
                self.accumulation_implications_exceptional = Some(snapshot);
            }
            self.checkpoint_requested = false;
        }

        if host_result.should_continue() {
            self.program_counter = pc + instruction_length as u32;
            return true;
        }
        self.status = match host_result.result_code {
            x if x == RESULT_CODE_HALT => Status::Halt,
            x if x == RESULT_CODE_PANIC => Status::Panic,
            x if x == RESULT_CODE_FAULT => Status::Fault,
            x if x == RESULT_CODE_OOG => Status::Oog,
            _ => Status::Panic,
        };
        self.result_code = host_result.result_code;
        false
    }

    /// Gray Paper eq. 831: on HALT, the invocation's output is the memory
    /// range `[registers[7], registers[7] + registers[8])`.
    #[must_use]
    pub fn result_bytes(&mut self) -> Vec<u8> {
        let offset = self.registers[7] as u32;
        let length = self.registers[8] as u32;
        if length == 0 {
            return Vec::new();
        }
        let read_result = self.ram.read_octets(offset, length);
        if read_result.fault_address != 0 {
            return Vec::new();
        }
        read_result.data.unwrap_or_default()
    }

    pub fn take_log_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.log_messages)
    }

    #[must_use]
    pub fn page_dump(&self, page_index: u32) -> Vec<u8> {
        self.ram.get_page_dump(page_index)
    }

    pub fn init_page(&mut self, address: u32, length: u32, access_type: MemoryAccessType) {
        self.ram.init_page(address, length, access_type);
    }

    pub fn init_memory_layout(
        &mut self,
        argument_data: &[u8],
        read_only_data: &[u8],
        read_write_data: &[u8],
        stack_size: u32,
        heap_zero_padding_size: u32,
    ) {
        self.ram.initialize_memory_layout(
            argument_data,
            read_only_data,
            read_write_data,
            stack_size,
            heap_zero_padding_size,
        );
    }

    /// Write octets directly into RAM, bypassing access-rights checks (for
    /// test-vector setup, matching the jamtestnet harness convention of
    /// seeding initial memory regardless of declared page permissions).
    pub fn set_memory(&mut self, address: u32, data: &[u8]) {
        self.ram.write_octets_during_initialization(address, data);
    }

    #[must_use]
    pub fn has_accumulation_context(&self) -> bool {
        self.has_accumulation_context
    }
}

/// Run a complete `Ψ_A` invocation: set up the machine from the resolved
/// preimage and encoded implications pair, run to termination, and collapse
/// the dual implications context per the Gray Paper's regular/exceptional
/// rule — HALT keeps `imX` (all of this invocation's mutations), anything
/// else (PANIC/FAULT/OOG) rolls back to the last CHECKPOINT snapshot `imY`.
pub fn accumulate_invocation(
    machine: &mut Machine,
    params: SetupAccumulateParams<'_>,
    num_cores: i32,
    num_validators: i32,
    auth_queue_size: i32,
) -> Result<AccumulateInvocationResult, PvmSetupError> {
    machine.setup_accumulate(params)?;
    let run = machine.run();

    // Collapse: PANIC/FAULT/OOG select the exceptional dimension (imY, the
    // last CHECKPOINT snapshot); HALT selects the regular dimension (imX)
    // folded with every mutation made this run.
    let winning = match machine.status {
        Status::Halt => machine.build_current_regular_implications(),
        _ => machine.accumulation_implications_exceptional.clone(),
    }
    .unwrap_or_default();

    let halt_blob = match machine.status {
        Status::Halt => machine.result_bytes(),
        _ => Vec::new(),
    };
    // A non-empty halt blob replaces imX.yield in the observable output;
    // otherwise the winning dimension's own yield hash (if any) stands.
    let yield_hash = if !halt_blob.is_empty() {
        Some(halt_blob.clone())
    } else {
        winning.yield_hash.clone()
    };
    let output = yield_hash.clone().unwrap_or_default();

    tracing::debug!(
        result_code = machine.result_code,
        xfers = winning.xfers.len(),
        provisions = winning.provisions.len(),
        "accumulate invocation collapsed implications"
    );

    // The collapsed dimension stands for both halves of the pair in the
    // caller-facing encoding: there is nothing left to roll back to once
    // Ψ_A has returned.
    let pair = ImplicationsPair { regular: winning.clone(), exceptional: winning.clone() };
    let encoded_context = encode_implications_pair(&pair, num_cores, num_validators, auth_queue_size);

    Ok(AccumulateInvocationResult {
        gas_consumed: run.gas_consumed,
        result_code: machine.result_code,
        result: run.result,
        output,
        post_state: winning.state,
        deferred_transfers: winning.xfers,
        yield_hash,
        provisions: winning.provisions,
        encoded_context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_machine_has_no_accumulation_context() {
        let m = Machine::new(RamKind::Mock);
        assert!(!m.has_accumulation_context());
        assert_eq!(m.gas_left, crate::config::DEFAULT_GAS_LIMIT);
    }

    #[test]
    fn empty_code_halts_immediately() {
        let mut m = Machine::new(RamKind::Mock);
        m.code = vec![];
        assert!(!m.step());
        assert_eq!(m.status as i32, Status::Halt as i32);
    }

    #[test]
    fn zero_gas_is_out_of_gas() {
        let mut m = Machine::new(RamKind::Mock);
        m.code = vec![0u8; 8];
        m.bitmask = vec![1u8; 8];
        m.gas_left = 0;
        assert!(!m.step());
        assert_eq!(m.status as i32, Status::Oog as i32);
        assert_eq!(m.result_code, RESULT_CODE_OOG);
    }

    fn accumulate_params(program: &[u8]) -> SetupAccumulateParams<'_> {
        SetupAccumulateParams {
            program,
            args: &[],
            encoded_context: &[],
            gas_limit: 1_000,
            num_cores: 1,
            num_validators: 1,
            auth_queue_size: 1,
            entropy_accumulator: &[0u8; 32],
            encoded_accumulate_inputs: None,
            config: FetchSystemConstantsConfig::default(),
        }
    }

    // Gray Paper Ψ_A step 2 / this spec's §8 scenario 2: a resolved service
    // code of zero length is BAD, reported before the interpreter runs.
    #[test]
    fn empty_service_code_is_missing_code_before_decode() {
        let mut m = Machine::new(RamKind::Mock);
        let err = m.setup_accumulate(accumulate_params(&[])).unwrap_err();
        assert_eq!(err, PvmSetupError::MissingCode);
    }

    // §8 scenario 3: service code over MAX_SERVICE_CODE_SIZE is BIG, also
    // reported before the interpreter runs (gasUsed stays 0 since `run` is
    // never reached).
    #[test]
    fn oversized_service_code_is_code_too_large_before_decode() {
        let oversized = vec![0u8; crate::config::MAX_SERVICE_CODE_SIZE as usize + 1];
        let mut m = Machine::new(RamKind::Mock);
        let err = m.setup_accumulate(accumulate_params(&oversized)).unwrap_err();
        assert_eq!(err, PvmSetupError::CodeTooLarge);
    }
}
