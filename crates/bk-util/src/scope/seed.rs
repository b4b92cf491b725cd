use bk_core::Result;

use super::{Override, Scoped};
use crate::rng::{self, RngState};

/// Reseeds the process-wide generator; restores its full prior state.
///
/// Restoring reinstalls the captured state rather than reseeding, so a
/// generator that had already been advanced resumes exactly where it was.
#[derive(Debug, Clone, Copy)]
pub struct SeedOverride {
    seed: Option<u64>,
}

impl SeedOverride {
    /// Seed installed on entry; `None` means operating-system entropy.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Override for SeedOverride {
    type Snapshot = RngState;
    const KIND: &'static str = "random seed";

    fn capture(&mut self) -> Result<RngState> {
        Ok(rng::get_state())
    }

    fn install(&mut self, _captured: &RngState) -> Result<()> {
        log::debug!("seeding process generator with {:?}", self.seed());
        match self.seed {
            Some(seed) => rng::seed(seed),
            None => rng::seed_from_entropy(),
        }
        Ok(())
    }

    fn restore(&mut self, snapshot: RngState) -> Result<()> {
        rng::set_state(snapshot);
        Ok(())
    }
}

/// Scope that runs a block with a deterministically seeded process generator.
pub type RandomSeedScope = Scoped<SeedOverride>;

impl RandomSeedScope {
    /// Seed the generator with `seed` while the scope is active.
    pub fn new(seed: u64) -> Self {
        Scoped::from_override(SeedOverride { seed: Some(seed) })
    }

    /// Seed the generator from operating-system entropy while the scope is active.
    pub fn from_entropy() -> Self {
        Scoped::from_override(SeedOverride { seed: None })
    }

    /// Seed this scope installs; `None` for an entropy-seeded scope.
    pub fn seed(&self) -> Option<u64> {
        self.resource().seed()
    }
}
