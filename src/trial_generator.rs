use crate::error::{Error, Result};
use crate::palette::ColorName;
use crate::session::Trial;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the word/ink sequence for a session
#[derive(Debug, Clone)]
pub struct TrialGenerator {
    rng: StdRng,
}

impl TrialGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Same seed, same sequence of sessions
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    pub fn generate(&mut self, n: usize, palette: &[ColorName]) -> Result<Vec<Trial>> {
        generate_with(&mut self.rng, n, palette)
    }
}

impl Default for TrialGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Draw `n` trials with word and ink picked independently and uniformly from `palette`.
///
/// Congruent pairs (word == ink) are allowed. Repeated palette entries are collapsed first so
/// they do not bias the draw.
pub fn generate_with<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    palette: &[ColorName],
) -> Result<Vec<Trial>> {
    if n == 0 {
        return Err(Error::InvalidConfiguration(
            "number of trials must be positive".into(),
        ));
    }

    let colors = palette.iter().copied().unique().collect_vec();
    if colors.is_empty() {
        return Err(Error::InvalidConfiguration("palette is empty".into()));
    }

    let trials = (0..n)
        .map(|_| {
            let word = colors[rng.gen_range(0..colors.len())];
            let ink = colors[rng.gen_range(0..colors.len())];
            Trial::new(word, ink)
        })
        .collect();

    Ok(trials)
}
