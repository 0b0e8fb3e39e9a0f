use petname::Petnames;
use thiserror::Error;

/// Word lists for memorable room names, drawn one word each and joined with
/// hyphens, e.g. `Azure-Brave-Ant`.
const COLORS: &str = "Azure Bronze Cobalt Denim Emerald Fuchsia Green Indigo Jade Lilac \
                      Maroon Orange Pink Quartz Ruby Sapphire Tangerine Violet White Yellow";
const TRAITS: &str = "Active Brave Calm Dreamer Enthusiastic Friendly Gentle Heroic Industrious \
                      Joyful Kind Lucky Mysterious Neat Organized Polite Quick Respectful Smart \
                      Tough Understanding Vivacious Wise";
const ANIMALS: &str = "Ant Bear Cat Dog Eel Fox Goat Hyena Ibis Jellyfish Kiwi Lion Mink Newt \
                      Octopus Pug Quail Reindeer Seal Tuna Uguisu Vulture Wolf Xerus Yak Zebu";

const MAX_NAME_ATTEMPTS: usize = 10;

/// Every drawn name collided with an existing one. With ~12k combinations
/// this is practically unreachable, but callers must still handle it.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("ran out of free room names")]
pub struct CapacityExhausted;

/// Produces human-memorable, collision-checked room identifiers.
pub struct NameGenerator {
    petnames: Petnames<'static>,
}

impl NameGenerator {
    pub fn new() -> Self {
        // petname emits adverb-adjective-name for a three-word phrase;
        // slotting the lists in this order yields color-trait-animal.
        Self {
            petnames: Petnames::init(TRAITS, COLORS, ANIMALS),
        }
    }

    /// Draws names from the process-wide RNG until one passes the
    /// `is_taken` check, giving up after a bounded number of attempts.
    pub fn generate(&self, is_taken: impl Fn(&str) -> bool) -> Result<String, CapacityExhausted> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = self.petnames.generate_one(3, "-");
            if !is_taken(&candidate) {
                return Ok(candidate);
            }
        }
        Err(CapacityExhausted)
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}
