//! Run a complete survey locally: deploy a ledger, submit encrypted answers, let the last
//! respondent read the current results privately, then reveal every question and print the
//! tallies.
//!
//! Each argument is one respondent's six comma-separated answers, e.g. `survey 0,1,2,3,1,0
//! 2,0,1,0,0,1`. Without arguments a built-in set of respondents is used. Parameters come from
//! `SURVEY_*` environment variables or a `.env` file.
use std::{
    error::Error,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use confidential_survey::{
    acl::AccessList,
    client::EncryptedInputBuilder,
    config::Config,
    fhe::Coprocessor,
    ledger::{questions, Deployment, SurveyLedger, TxContext, QUESTION_COUNT},
    relayer::{Relayer, UserDecryptRequest},
    Address,
};
use ed25519_dalek::SigningKey;
use sha3::{Digest, Sha3_256};
use tracing_subscriber::EnvFilter;

const SAMPLE_ANSWERS: [[u32; QUESTION_COUNT]; 5] = [
    [0, 1, 2, 3, 1, 0],
    [2, 0, 1, 0, 0, 1],
    [0, 0, 0, 1, 2, 2],
    [1, 2, 1, 3, 0, 0],
    [0, 1, 0, 0, 1, 1],
];

fn parse_answers(arg: &str) -> Result<[u32; QUESTION_COUNT], Box<dyn Error>> {
    let answers = arg
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse::<u32>)
        .collect::<Result<Vec<u32>, _>>()?;
    answers.as_slice().try_into().map_err(|_| {
        format!(
            "expected {QUESTION_COUNT} answers matching the questionnaire, got {}",
            answers.len()
        )
        .into()
    })
}

/// A deterministic key per respondent, so repeated runs use the same accounts
fn respondent_key(index: usize) -> SigningKey {
    SigningKey::from_bytes(&Sha3_256::digest(format!("respondent-{index}")).into())
}

fn now() -> Result<u64, Box<dyn Error>> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let respondents = std::env::args()
        .skip(1)
        .map(|arg| parse_answers(&arg))
        .collect::<Result<Vec<_>, _>>()?;
    let respondents = if respondents.is_empty() {
        SAMPLE_ANSWERS.to_vec()
    } else {
        respondents
    };

    let config = Config::from_env()?;
    let coprocessor = Arc::new(Coprocessor::generate(&config)?);
    let acl = Arc::new(AccessList::new());
    let relayer = Relayer::new(coprocessor.clone(), acl.clone());
    let deployment = Deployment {
        chain_id: config.chain_id,
        deployer: Address::derive(b"deployer"),
        nonce: 0,
    };
    let mut ledger = SurveyLedger::deploy(deployment, coprocessor.clone(), acl)?;
    println!("Survey ledger deployed at {}", ledger.address());

    let mut accounts = vec![];
    for (index, answers) in respondents.iter().enumerate() {
        let key = respondent_key(index);
        let sender = Address::from_verifying_key(&key.verifying_key());
        let mut builder =
            EncryptedInputBuilder::new(coprocessor.public_params(), ledger.address(), sender);
        for answer in answers {
            builder = builder.add32(*answer);
        }
        let input = builder.encrypt()?;
        let tx = TxContext {
            sender,
            timestamp: now()?,
        };
        ledger.submit_responses(&tx, &input.handle_array()?, &input.input_proof)?;
        println!("{sender} submitted ({} proof bytes)", input.input_proof.len());
        accounts.push(key);
    }

    // Only the latest respondent holds a grant on the current tallies
    if let Some(last) = accounts.last() {
        let tallies = ledger.get_question_tallies(0)?;
        let handles = tallies.tallies[..usize::from(tallies.option_count)]
            .iter()
            .map(|tally| *tally.handle())
            .collect();
        let start = now()?;
        let request = UserDecryptRequest::sign(last, handles, ledger.address(), start, 1);
        let counts = relayer.user_decrypt(&request, now()?)?;
        println!("{} privately reads question 0: {counts:?}", request.user);
    }

    let operator = TxContext {
        sender: Address::derive(b"deployer"),
        timestamp: now()?,
    };
    for question_id in 0..ledger.question_count() {
        let question = questions::question(question_id)
            .ok_or_else(|| format!("question {question_id} is missing from the catalogue"))?;
        ledger.request_public_results(&operator, question_id)?;
        let tallies = ledger.get_question_tallies(question_id)?;
        let handles = tallies.tallies[..usize::from(tallies.option_count)]
            .iter()
            .map(|tally| *tally.handle())
            .collect::<Vec<_>>();
        let counts = relayer.public_decrypt(&handles)?;

        println!();
        println!("Q{}. {}", question_id + 1, question.title);
        for (option, count) in question.options.iter().zip(counts) {
            println!("    {count:>3}  {option}");
        }
    }
    Ok(())
}
