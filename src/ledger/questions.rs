//! The fixed question catalogue. Questions are identified by their zero-based position.

pub const QUESTION_COUNT: usize = 6;

/// Every question is stored with this many tally slots, whether or not it uses all of them
pub const MAX_OPTIONS: usize = 4;

pub const OPTION_COUNTS: [u8; QUESTION_COUNT] = [4, 3, 3, 4, 3, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub options: &'static [&'static str],
}

impl Question {
    pub fn option_count(&self) -> u8 {
        self.options.len() as u8
    }
}

pub const QUESTIONS: [Question; QUESTION_COUNT] = [
    Question {
        title: "Which FHEVM capability do you want to ship first?",
        subtitle: "Pick the encrypted workflow that matters most to your roadmap.",
        options: &[
            "Private governance or DAO voting",
            "Encrypted on-chain analytics",
            "Confidential identity checks without document uploads",
            "Composable encrypted application state",
        ],
    },
    Question {
        title: "How familiar are you with the Relayer SDK?",
        subtitle: "We rely on it for encryption, ACL, and public decrypt flows.",
        options: &[
            "Using it in production builds",
            "Trying it in sandboxes",
            "Reading docs but not integrated",
        ],
    },
    Question {
        title: "What tooling do you pair with FHEVM?",
        subtitle: "Helps us focus examples on the stacks you already trust.",
        options: &["Hardhat with TypeChain", "Foundry/Anvil", "Custom node tooling"],
    },
    Question {
        title: "What slows you down today?",
        subtitle: "Select the blocker you most want us to improve.",
        options: &[
            "Gas and performance costs",
            "More examples and docs",
            "SDK stability",
            "Testnet reliability",
        ],
    },
    Question {
        title: "When do you expect to ship an FHE feature?",
        subtitle: "Rough timing helps us prioritize support and guides.",
        options: &["This quarter", "Within two quarters", "Just experimenting for now"],
    },
    Question {
        title: "Preferred frontend stack for FHE apps?",
        subtitle: "Tell us how you wire in encryption on the client.",
        options: &[
            "Viem + React",
            "Ethers with a custom relayer client",
            "Other frameworks or languages",
        ],
    },
];

/// Look up a question by id, if it exists
pub fn question(question_id: u64) -> Option<&'static Question> {
    usize::try_from(question_id)
        .ok()
        .and_then(|index| QUESTIONS.get(index))
}
