use anyhow::Context as _;
use powercard_core::{CardError, POWER_RANGE, PowerStats, Rank};
use powercard_protocol::{GeneratePowerRequest, GeneratePowerResponse};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use std::time::Duration;

use crate::upstream;

pub const HIDDEN_POWERS: [&str; 20] = [
    "Turns all users into data scientists for 10 glorious seconds",
    "Secretly teaches users how to whistle while working",
    "Adds a +10 charisma boost to every product pitch",
    "Doubles as a snack detector when left open for too long",
    "Transforms bugs into \"features\" with just the right spin",
    "Auto-generates hilarious memes when no one's looking",
    "Improves Wi-Fi strength by exactly 0.0001%",
    "Grants a temporary aura of invincibility after every login",
    "Increases your chance of finding lost socks by 42%",
    "Empowers introverts to write 10% sassier emails",
    "Hides one Easter egg that can predict the weather (sometimes)",
    "Turns every meeting note into a haiku (hidden feature)",
    "Temporarily disables gravity in your workspace",
    "Grants founders the ability to \"read minds\" (of users who agree)",
    "Every successful API call is a hug for your server",
    "Inspires users to finally finish their \"About Us\" page",
    "Casts a spell to make deadlines seem less intimidating",
    "Auto-translates your product name into Klingon (on request)",
    "Adds a 1% chance your SaaS name will trend on Twitter",
    "Randomly plays a victory fanfare when you least expect it",
];

/// Ranks the built-in roller hands out, every site deserves a good one.
const ROLLED_RANKS: [Rank; 3] = [Rank::S, Rank::A, Rank::B];

/// Helper function to use JavaScript's Math.random
pub fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    u64::from_be_bytes(std::array::from_fn(|_| (256. * random()) as u8))
}

pub fn roll_stats(rng: &mut impl Rng) -> Result<PowerStats, CardError> {
    let rank = ROLLED_RANKS[rng.random_range(0..ROLLED_RANKS.len())];
    let attack_power = rng.random_range(POWER_RANGE);
    let defence_power = rng.random_range(POWER_RANGE);
    let hidden_advantage = HIDDEN_POWERS[rng.random_range(0..HIDDEN_POWERS.len())];
    PowerStats::new(rank, attack_power, defence_power, hidden_advantage)
}

pub fn to_wire(stats: &PowerStats) -> GeneratePowerResponse {
    GeneratePowerResponse {
        rank: stats.rank().to_string(),
        attack_power: i64::from(stats.attack_power()),
        defence_power: i64::from(stats.defence_power()),
        hidden_advantage: stats.hidden_advantage().to_string(),
    }
}

/// Where stats come from, picked by whether a remote generator is configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatsSource {
    Roller,
    Remote { url: String, timeout: Duration },
}

impl StatsSource {
    pub async fn generate(&self, request: &GeneratePowerRequest) -> anyhow::Result<PowerStats> {
        match self {
            Self::Roller => {
                let mut rng = SmallRng::seed_from_u64(js_random_seed());
                Ok(roll_stats(&mut rng)?)
            }
            Self::Remote { url, timeout } => {
                let mut response = upstream::send(upstream::post_json(url, request)?, *timeout)
                    .await
                    .context("stats generator request failed")?;
                let raw: GeneratePowerResponse = response
                    .json()
                    .await
                    .map_err(|err| anyhow::anyhow!("{err}"))
                    .context("stats generator returned malformed JSON")?;
                validate(raw).context("stats generator returned an invalid record")
            }
        }
    }
}

pub fn validate(raw: GeneratePowerResponse) -> Result<PowerStats, CardError> {
    PowerStats::from_parts(&raw.rank, raw.attack_power, raw.defence_power, raw.hidden_advantage)
}
