//! The survey ledger: a state machine that accepts one set of encrypted answers per address,
//! folds them into per-option encrypted tallies, and lets any question be switched to public
//! results.
//!
//! The ledger never sees a cleartext answer. Each answer is expanded into one encrypted 0/1
//! increment per option with `select(eq(answer, option), 1, 0)` and added to that option's tally,
//! so the sequence of operations is the same whatever the answers are.
//!
//! Every submission replaces each tally with a new handle that the ledger and the submitter may
//! decrypt. Earlier respondents keep access to the handles they were granted, which are snapshots
//! of the counts as of their own submission; only the latest submitter can read the current
//! tallies before a question is made public.
use std::{collections::HashSet, sync::Arc};

use crate::{
    acl::DecryptionAcl,
    address::Address,
    config,
    error::{FheError, LedgerError},
    fhe::{Euint32, Handle, Homomorphic, InputContext, InputVerifier},
};

pub mod events;
pub mod questions;

pub use events::SurveyEvent;
pub use questions::{Question, MAX_OPTIONS, OPTION_COUNTS, QUESTIONS, QUESTION_COUNT};

type Tallies = [[Euint32; MAX_OPTIONS]; QUESTION_COUNT];

/// Where and by whom the ledger is deployed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub chain_id: u64,
    pub deployer: Address,
    pub nonce: u64,
}

/// The authenticated caller of a mutating operation and the time it executes at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxContext {
    pub sender: Address,
    pub timestamp: u64,
}

/// A question's tally handles. Slots at or past `option_count` are padding and always hold an
/// encrypted zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTallies {
    pub tallies: [Euint32; MAX_OPTIONS],
    pub option_count: u8,
    pub is_public: bool,
}

pub struct SurveyLedger<E, A> {
    executor: Arc<E>,
    acl: Arc<A>,
    address: Address,
    protocol_id: u64,
    tallies: Tallies,
    public: [bool; QUESTION_COUNT],
    respondents: HashSet<Address>,
    latest: Option<Address>,
    events: Vec<SurveyEvent>,
}

impl<E, A> SurveyLedger<E, A>
where
    E: Homomorphic + InputVerifier,
    A: DecryptionAcl,
{
    /// Deploy a new ledger. Every tally slot starts as an encrypted zero the ledger itself may
    /// use.
    pub fn deploy(
        deployment: Deployment,
        executor: Arc<E>,
        acl: Arc<A>,
    ) -> Result<Self, LedgerError> {
        let protocol_id = config::confidential_protocol_id(deployment.chain_id).ok_or(
            LedgerError::ProtocolUnsupported {
                chain_id: deployment.chain_id,
            },
        )?;
        let address = Address::for_deployment(&deployment.deployer, deployment.nonce);

        let zero = executor.trivial_encrypt(0)?;
        acl.allow(zero.handle(), &address);

        tracing::info!(
            %address,
            chain_id = deployment.chain_id,
            protocol_id,
            "survey ledger deployed"
        );
        Ok(Self {
            executor,
            acl,
            address,
            protocol_id,
            tallies: [[zero; MAX_OPTIONS]; QUESTION_COUNT],
            public: [false; QUESTION_COUNT],
            respondents: HashSet::new(),
            latest: None,
            events: vec![],
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn confidential_protocol_id(&self) -> u64 {
        self.protocol_id
    }

    pub fn question_count(&self) -> u64 {
        QUESTION_COUNT as u64
    }

    /// Submit one encrypted answer per question, each an option index, together with the proof
    /// that binds them to the sender and this ledger.
    ///
    /// Either everything is applied or nothing is: the new tallies are computed on the side and
    /// only installed, together with the respondent record, the access grants and the event, once
    /// every homomorphic step has succeeded.
    pub fn submit_responses(
        &mut self,
        tx: &TxContext,
        encrypted_choices: &[Handle; QUESTION_COUNT],
        input_proof: &[u8],
    ) -> Result<(), LedgerError> {
        if self.respondents.contains(&tx.sender) {
            tracing::warn!(respondent = %tx.sender, "duplicate submission rejected");
            return Err(LedgerError::AlreadyParticipated);
        }

        let context = InputContext {
            contract: self.address,
            user: tx.sender,
        };
        let choices = self
            .executor
            .verify_input(encrypted_choices, input_proof, &context)
            .map_err(|err| {
                tracing::warn!(respondent = %tx.sender, %err, "input verification failed");
                err
            })?;
        if choices.len() != QUESTION_COUNT {
            return Err(FheError::HandleCountMismatch {
                expected: QUESTION_COUNT,
                got: choices.len(),
            }
            .into());
        }

        let tallies = self.accumulate(&choices)?;

        self.tallies = tallies;
        self.respondents.insert(tx.sender);
        self.latest = Some(tx.sender);
        for (question_id, row) in self.tallies.iter().enumerate() {
            for tally in &row[..usize::from(OPTION_COUNTS[question_id])] {
                self.acl.allow(tally.handle(), &self.address);
                self.acl.allow(tally.handle(), &tx.sender);
                if self.public[question_id] {
                    self.acl.make_publicly_decryptable(tally.handle());
                }
            }
        }
        self.events.push(SurveyEvent::SurveySubmitted {
            respondent: tx.sender,
            timestamp: tx.timestamp,
        });
        tracing::info!(
            respondent = %tx.sender,
            timestamp = tx.timestamp,
            respondents = self.respondents.len(),
            "survey submitted"
        );
        Ok(())
    }

    /// Compute the tallies that result from adding one respondent's answers. The inputs and every
    /// intermediate are released afterwards; on failure so are the tallies computed so far.
    fn accumulate(&self, choices: &[Euint32]) -> Result<Tallies, FheError> {
        let mut tallies = self.tallies;
        let mut fresh = vec![];
        let outcome = self.fold_choices(choices, &mut tallies, &mut fresh);
        self.discard(choices.iter().map(|choice| *choice.handle()));
        match outcome {
            Ok(()) => Ok(tallies),
            Err(err) => {
                self.discard(fresh);
                Err(err)
            }
        }
    }

    fn fold_choices(
        &self,
        choices: &[Euint32],
        tallies: &mut Tallies,
        fresh: &mut Vec<Handle>,
    ) -> Result<(), FheError> {
        let one = self.executor.trivial_encrypt(1)?;
        let zero = self.executor.trivial_encrypt(0)?;
        for (question_id, choice) in choices.iter().enumerate() {
            let options = usize::from(OPTION_COUNTS[question_id]);
            for (option, tally) in tallies[question_id][..options].iter_mut().enumerate() {
                let candidate = self.executor.trivial_encrypt(option as u32)?;
                let selected = self.executor.eq(choice, &candidate)?;
                let increment = self.executor.select(&selected, &one, &zero);
                self.discard([*selected.handle()]);
                let increment = increment?;
                let sum = self.executor.add(tally, &increment);
                self.discard([*increment.handle()]);
                *tally = sum?;
                fresh.push(*tally.handle());
            }
        }
        Ok(())
    }

    fn discard(&self, handles: impl IntoIterator<Item = Handle>) {
        for handle in handles {
            if let Err(err) = self.executor.release(&handle) {
                tracing::warn!(%handle, %err, "could not release ciphertext");
            }
        }
    }

    /// Make a question's results publicly decryptable. Calling it again is harmless and emits
    /// another event.
    pub fn request_public_results(
        &mut self,
        tx: &TxContext,
        question_id: u64,
    ) -> Result<(), LedgerError> {
        let index = Self::index(question_id)?;
        self.public[index] = true;
        for tally in &self.tallies[index] {
            self.acl.make_publicly_decryptable(tally.handle());
        }
        self.events.push(SurveyEvent::QuestionResultsRevealed {
            question_id,
            requester: tx.sender,
        });
        tracing::info!(question_id, requester = %tx.sender, "question results revealed");
        Ok(())
    }

    pub fn get_question_tallies(&self, question_id: u64) -> Result<QuestionTallies, LedgerError> {
        let index = Self::index(question_id)?;
        Ok(QuestionTallies {
            tallies: self.tallies[index],
            option_count: OPTION_COUNTS[index],
            is_public: self.public[index],
        })
    }

    pub fn get_option_count(&self, question_id: u64) -> Result<u8, LedgerError> {
        Ok(OPTION_COUNTS[Self::index(question_id)?])
    }

    pub fn has_submitted(&self, account: &Address) -> bool {
        self.respondents.contains(account)
    }

    /// Whether the requester may read a question's current results: anyone once it is public,
    /// otherwise only the latest submitter, who holds the grant on the current handles.
    pub fn is_authorized(
        &self,
        question_id: u64,
        requester: &Address,
    ) -> Result<bool, LedgerError> {
        let index = Self::index(question_id)?;
        Ok(self.public[index] || self.latest.as_ref() == Some(requester))
    }

    pub fn events(&self) -> &[SurveyEvent] {
        &self.events
    }

    fn index(question_id: u64) -> Result<usize, LedgerError> {
        match usize::try_from(question_id) {
            Ok(index) if index < QUESTION_COUNT => Ok(index),
            _ => Err(LedgerError::InvalidQuestion(question_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{acl::AccessList, fhe::Ebool};
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicU64, AtomicUsize, Ordering},
            Mutex,
        },
    };

    /// Executes the homomorphic operations on cleartext values. Inputs are accepted when the proof
    /// names the ledger and the user they were prepared for.
    #[derive(Default)]
    struct Cleartext {
        values: Mutex<HashMap<Handle, u32>>,
        counter: AtomicU64,
        fail_after: Mutex<Option<usize>>,
        ops: AtomicUsize,
        released: Mutex<HashSet<Handle>>,
    }

    impl Cleartext {
        fn value(&self, handle: &Handle) -> Result<u32, FheError> {
            self.values
                .lock()
                .unwrap()
                .get(handle)
                .copied()
                .ok_or(FheError::UnknownHandle(*handle))
        }

        fn put(&self, value: u32) -> Result<Handle, FheError> {
            let ops = self.ops.fetch_add(1, Ordering::SeqCst);
            if let Some(limit) = *self.fail_after.lock().unwrap() {
                if ops >= limit {
                    return Err(FheError::StorePoisoned);
                }
            }
            let sequence = self.counter.fetch_add(1, Ordering::SeqCst);
            let handle = Handle::for_result("mock", &[], sequence);
            self.values.lock().unwrap().insert(handle, value);
            Ok(handle)
        }

        fn prepare(
            &self,
            contract: Address,
            user: Address,
            answers: [u32; QUESTION_COUNT],
        ) -> ([Handle; QUESTION_COUNT], Vec<u8>) {
            let handles = answers.map(|answer| self.put(answer).unwrap());
            let mut proof = contract.as_bytes().to_vec();
            proof.extend_from_slice(user.as_bytes());
            (handles, proof)
        }
    }

    impl Homomorphic for Cleartext {
        fn trivial_encrypt(&self, value: u32) -> Result<Euint32, FheError> {
            self.put(value).map(Euint32::from_handle)
        }

        fn add(&self, lhs: &Euint32, rhs: &Euint32) -> Result<Euint32, FheError> {
            let sum = self.value(lhs.handle())? + self.value(rhs.handle())?;
            self.put(sum).map(Euint32::from_handle)
        }

        fn eq(&self, lhs: &Euint32, rhs: &Euint32) -> Result<Ebool, FheError> {
            let same = self.value(lhs.handle())? == self.value(rhs.handle())?;
            self.put(u32::from(same)).map(Ebool::from_handle)
        }

        fn select(
            &self,
            condition: &Ebool,
            if_true: &Euint32,
            if_false: &Euint32,
        ) -> Result<Euint32, FheError> {
            let chosen = if self.value(condition.handle())? != 0 {
                if_true
            } else {
                if_false
            };
            self.put(self.value(chosen.handle())?).map(Euint32::from_handle)
        }

        // values stay readable so tests can resubmit the same inputs
        fn release(&self, handle: &Handle) -> Result<(), FheError> {
            self.released.lock().unwrap().insert(*handle);
            Ok(())
        }
    }

    impl InputVerifier for Cleartext {
        fn verify_input(
            &self,
            handles: &[Handle],
            proof: &[u8],
            context: &InputContext,
        ) -> Result<Vec<Euint32>, FheError> {
            let mut expected = context.contract.as_bytes().to_vec();
            expected.extend_from_slice(context.user.as_bytes());
            if proof != expected.as_slice() {
                return Err(FheError::InvalidInputProof("wrong binding".to_string()));
            }
            for handle in handles {
                self.value(handle)?;
            }
            Ok(handles.iter().copied().map(Euint32::from_handle).collect())
        }
    }

    struct Fixture {
        ledger: SurveyLedger<Cleartext, AccessList>,
        executor: Arc<Cleartext>,
        acl: Arc<AccessList>,
    }

    impl Fixture {
        fn new() -> Self {
            let executor = Arc::new(Cleartext::default());
            let acl = Arc::new(AccessList::new());
            let deployment = Deployment {
                chain_id: config::LOCAL_CHAIN_ID,
                deployer: Address::derive(b"deployer"),
                nonce: 0,
            };
            let ledger = SurveyLedger::deploy(deployment, executor.clone(), acl.clone()).unwrap();
            Self {
                ledger,
                executor,
                acl,
            }
        }

        fn submit(
            &mut self,
            name: &[u8],
            answers: [u32; QUESTION_COUNT],
        ) -> Result<(), LedgerError> {
            let sender = Address::derive(name);
            let (handles, proof) = self.executor.prepare(self.ledger.address(), sender, answers);
            let tx = TxContext {
                sender,
                timestamp: 1_700_000_000,
            };
            self.ledger.submit_responses(&tx, &handles, &proof)
        }

        fn counts(&self, question_id: u64) -> [u32; MAX_OPTIONS] {
            let tallies = self.ledger.get_question_tallies(question_id).unwrap().tallies;
            tallies.map(|tally| self.executor.value(tally.handle()).unwrap())
        }
    }

    fn tx(name: &[u8]) -> TxContext {
        TxContext {
            sender: Address::derive(name),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_fresh_ledger() {
        let fixture = Fixture::new();
        let ledger = &fixture.ledger;
        assert_eq!(ledger.question_count(), 6);
        assert_eq!(ledger.confidential_protocol_id(), config::LOCAL_CHAIN_ID);
        for question_id in 0..6 {
            let tallies = ledger.get_question_tallies(question_id).unwrap();
            assert!(!tallies.is_public);
            assert_eq!(tallies.option_count, OPTION_COUNTS[question_id as usize]);
            assert_eq!(fixture.counts(question_id), [0; MAX_OPTIONS]);
        }
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_unsupported_chain() {
        let deployment = Deployment {
            chain_id: 1,
            deployer: Address::derive(b"deployer"),
            nonce: 0,
        };
        let result = SurveyLedger::deploy(
            deployment,
            Arc::new(Cleartext::default()),
            Arc::new(AccessList::new()),
        );
        assert!(matches!(
            result,
            Err(LedgerError::ProtocolUnsupported { chain_id: 1 })
        ));
    }

    #[test]
    fn test_submission_updates_selected_options() {
        let mut fixture = Fixture::new();
        fixture.submit(b"alice", [0, 1, 2, 3, 1, 0]).unwrap();
        assert_eq!(fixture.counts(0), [1, 0, 0, 0]);
        assert_eq!(fixture.counts(1), [0, 1, 0, 0]);
        assert_eq!(fixture.counts(2), [0, 0, 1, 0]);
        assert_eq!(fixture.counts(3), [0, 0, 0, 1]);
        assert_eq!(fixture.counts(4), [0, 1, 0, 0]);
        assert_eq!(fixture.counts(5), [1, 0, 0, 0]);
        assert!(fixture.ledger.has_submitted(&Address::derive(b"alice")));
        assert_eq!(
            fixture.ledger.events(),
            &[SurveyEvent::SurveySubmitted {
                respondent: Address::derive(b"alice"),
                timestamp: 1_700_000_000
            }]
        );
    }

    #[test]
    fn test_tallies_sum_to_respondents() {
        let mut fixture = Fixture::new();
        let answers = [
            [0, 1, 2, 3, 1, 0],
            [2, 0, 1, 0, 0, 1],
            [0, 0, 0, 0, 0, 0],
            [3, 2, 2, 1, 2, 2],
        ];
        for (index, answer) in answers.iter().enumerate() {
            fixture.submit(&[index as u8], *answer).unwrap();
        }
        for question_id in 0..6u64 {
            let total: u32 = fixture.counts(question_id).iter().sum();
            assert_eq!(total, answers.len() as u32);
        }
        assert_eq!(fixture.counts(0), [2, 0, 1, 1]);
    }

    #[test]
    fn test_out_of_range_answer_counts_nowhere() {
        let mut fixture = Fixture::new();
        fixture.submit(b"carol", [0, 3, 3, 0, 0, 0]).unwrap();
        assert_eq!(fixture.counts(1), [0; MAX_OPTIONS]);
        assert_eq!(fixture.counts(2), [0; MAX_OPTIONS]);
    }

    #[test]
    fn test_second_submission_rejected() {
        let mut fixture = Fixture::new();
        fixture.submit(b"alice", [0, 1, 2, 3, 1, 0]).unwrap();
        let before = fixture.ledger.get_question_tallies(0).unwrap();
        assert_eq!(
            fixture.submit(b"alice", [1, 1, 1, 1, 1, 1]),
            Err(LedgerError::AlreadyParticipated)
        );
        assert_eq!(fixture.ledger.get_question_tallies(0).unwrap(), before);
        assert_eq!(fixture.counts(0), [1, 0, 0, 0]);
        assert_eq!(fixture.ledger.events().len(), 1);
    }

    #[test]
    fn test_invalid_proof_changes_nothing() {
        let mut fixture = Fixture::new();
        let alice = Address::derive(b"alice");
        let contract = fixture.ledger.address();
        let (handles, proof) = fixture.executor.prepare(contract, alice, [0; QUESTION_COUNT]);
        let result = fixture.ledger.submit_responses(&tx(b"bob"), &handles, &proof);
        assert!(matches!(
            result,
            Err(LedgerError::Fhe(FheError::InvalidInputProof(_)))
        ));
        assert!(!fixture.ledger.has_submitted(&Address::derive(b"bob")));
        assert_eq!(fixture.counts(0), [0; MAX_OPTIONS]);
        assert!(fixture.ledger.events().is_empty());
    }

    #[test]
    fn test_failure_midway_is_atomic() {
        let mut fixture = Fixture::new();
        let sender = Address::derive(b"alice");
        let contract = fixture.ledger.address();
        let (handles, proof) = fixture.executor.prepare(contract, sender, [1; QUESTION_COUNT]);
        let before = fixture.ledger.get_question_tallies(3).unwrap();
        let budget = fixture.executor.ops.load(Ordering::SeqCst) + 30;
        *fixture.executor.fail_after.lock().unwrap() = Some(budget);

        assert!(fixture
            .ledger
            .submit_responses(&tx(b"alice"), &handles, &proof)
            .is_err());
        assert!(!fixture.ledger.has_submitted(&sender));
        assert_eq!(fixture.counts(0), [0; MAX_OPTIONS]);
        assert_eq!(fixture.ledger.get_question_tallies(3).unwrap(), before);
        assert!(fixture.ledger.events().is_empty());

        *fixture.executor.fail_after.lock().unwrap() = None;
        fixture
            .ledger
            .submit_responses(&tx(b"alice"), &handles, &proof)
            .unwrap();
        assert_eq!(fixture.counts(0), [0, 1, 0, 0]);
    }

    #[test]
    fn test_reveal_is_monotonic_and_idempotent() {
        let mut fixture = Fixture::new();
        fixture.ledger.request_public_results(&tx(b"anyone"), 1).unwrap();
        fixture.ledger.request_public_results(&tx(b"anyone"), 1).unwrap();
        let tallies = fixture.ledger.get_question_tallies(1).unwrap();
        assert!(tallies.is_public);
        assert_eq!(tallies.option_count, 3);
        assert!(!fixture.ledger.get_question_tallies(0).unwrap().is_public);
        assert_eq!(fixture.ledger.events().len(), 2);
        assert_eq!(
            fixture.ledger.events()[0],
            SurveyEvent::QuestionResultsRevealed {
                question_id: 1,
                requester: Address::derive(b"anyone")
            }
        );
        for tally in tallies.tallies {
            assert!(fixture.acl.is_publicly_decryptable(tally.handle()));
        }

        // submissions keep flowing into a public question
        fixture.submit(b"bob", [2, 0, 1, 0, 0, 1]).unwrap();
        let tallies = fixture.ledger.get_question_tallies(1).unwrap();
        assert!(tallies.is_public);
        assert_eq!(fixture.counts(1), [1, 0, 0, 0]);
        assert!(fixture.acl.is_publicly_decryptable(tallies.tallies[0].handle()));
        let private = fixture.ledger.get_question_tallies(0).unwrap().tallies[2];
        assert!(!fixture.acl.is_publicly_decryptable(private.handle()));
    }

    #[test]
    fn test_submitter_and_ledger_are_granted_access() {
        let mut fixture = Fixture::new();
        fixture.submit(b"alice", [0, 1, 2, 3, 1, 0]).unwrap();
        let alice = Address::derive(b"alice");
        let bob = Address::derive(b"bob");
        let snapshot = fixture.ledger.get_question_tallies(0).unwrap().tallies;
        for tally in &snapshot {
            assert!(fixture.acl.is_allowed(tally.handle(), &alice));
            assert!(fixture.acl.is_allowed(tally.handle(), &fixture.ledger.address()));
            assert!(!fixture.acl.is_allowed(tally.handle(), &bob));
        }

        fixture.submit(b"bob", [1, 1, 1, 1, 1, 1]).unwrap();
        let current = fixture.ledger.get_question_tallies(0).unwrap().tallies;
        for (option, tally) in current[..4].iter().enumerate() {
            assert!(fixture.acl.is_allowed(tally.handle(), &bob));
            assert!(!fixture.acl.is_allowed(tally.handle(), &alice));
            assert!(fixture.acl.is_allowed(snapshot[option].handle(), &alice));
        }
    }

    #[test]
    fn test_intermediates_are_released() {
        let mut fixture = Fixture::new();
        let alice = Address::derive(b"alice");
        let contract = fixture.ledger.address();
        let (handles, proof) = fixture.executor.prepare(contract, alice, [0, 1, 2, 3, 1, 0]);
        fixture
            .ledger
            .submit_responses(&tx(b"alice"), &handles, &proof)
            .unwrap();
        let snapshot = fixture.ledger.get_question_tallies(3).unwrap().tallies;
        fixture.submit(b"bob", [1, 1, 1, 1, 1, 1]).unwrap();

        let released = fixture.executor.released.lock().unwrap();
        // six inputs plus one eq and one select per real option, per respondent
        assert_eq!(released.len(), 2 * (6 + 2 * 20));
        for handle in &handles {
            assert!(released.contains(handle));
        }
        for question_id in 0..6 {
            for tally in fixture.ledger.get_question_tallies(question_id).unwrap().tallies {
                assert!(!released.contains(tally.handle()));
            }
        }
        for tally in snapshot {
            assert!(!released.contains(tally.handle()));
        }
    }

    #[test]
    fn test_failed_submission_releases_partial_tallies() {
        let mut fixture = Fixture::new();
        let alice = Address::derive(b"alice");
        let contract = fixture.ledger.address();
        let (handles, proof) = fixture.executor.prepare(contract, alice, [1; QUESTION_COUNT]);
        let budget = fixture.executor.ops.load(Ordering::SeqCst) + 30;
        *fixture.executor.fail_after.lock().unwrap() = Some(budget);
        assert!(fixture
            .ledger
            .submit_responses(&tx(b"alice"), &handles, &proof)
            .is_err());

        let released = fixture.executor.released.lock().unwrap();
        for handle in &handles {
            assert!(released.contains(handle));
        }
        for question_id in 0..6 {
            for tally in fixture.ledger.get_question_tallies(question_id).unwrap().tallies {
                assert!(!released.contains(tally.handle()));
            }
        }
    }

    #[test]
    fn test_question_ids_are_range_checked() {
        let mut fixture = Fixture::new();
        assert_eq!(
            fixture.ledger.get_question_tallies(6),
            Err(LedgerError::InvalidQuestion(6))
        );
        assert_eq!(
            fixture.ledger.request_public_results(&tx(b"alice"), 10),
            Err(LedgerError::InvalidQuestion(10))
        );
        assert_eq!(
            fixture.ledger.get_option_count(u64::MAX),
            Err(LedgerError::InvalidQuestion(u64::MAX))
        );
        assert_eq!(fixture.ledger.get_option_count(3), Ok(4));
        assert!(fixture.ledger.events().is_empty());
    }

    #[test]
    fn test_authorization_follows_latest_submission_and_reveal() {
        let mut fixture = Fixture::new();
        let alice = Address::derive(b"alice");
        let bob = Address::derive(b"bob");
        let carol = Address::derive(b"carol");
        fixture.submit(b"alice", [0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(fixture.ledger.is_authorized(2, &alice), Ok(true));
        assert_eq!(fixture.ledger.is_authorized(2, &bob), Ok(false));

        fixture.submit(b"bob", [1, 1, 1, 1, 1, 1]).unwrap();
        assert_eq!(fixture.ledger.is_authorized(2, &bob), Ok(true));
        assert_eq!(fixture.ledger.is_authorized(2, &alice), Ok(false));
        let current = fixture.ledger.get_question_tallies(2).unwrap().tallies[0];
        assert!(!fixture.acl.is_allowed(current.handle(), &alice));

        fixture.ledger.request_public_results(&tx(b"carol"), 2).unwrap();
        assert_eq!(fixture.ledger.is_authorized(2, &carol), Ok(true));
        assert_eq!(fixture.ledger.is_authorized(2, &alice), Ok(true));
        assert_eq!(fixture.ledger.is_authorized(3, &alice), Ok(false));
        assert_eq!(
            fixture.ledger.is_authorized(6, &bob),
            Err(LedgerError::InvalidQuestion(6))
        );
    }
}
