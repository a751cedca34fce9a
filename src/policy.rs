use crate::envs::Environment;
use crate::spaces::{Space, SpaceItem};
use rand::rngs::ThreadRng;
use rand::Rng;

pub trait Policy {
    fn policy(&mut self, act_space: &Space, s: &[SpaceItem]) -> Vec<SpaceItem>;
}

/// Samples uniformly from the action space, ignoring the observation.
pub struct RandomPolicy<R: Rng> {
    rng: R,
}

impl RandomPolicy<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomPolicy<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomPolicy<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Policy for RandomPolicy<R> {
    fn policy(&mut self, act_space: &Space, _s: &[SpaceItem]) -> Vec<SpaceItem> {
        act_space.sample(&mut self.rng)
    }
}

/// One random action valid for `env`'s action space.
pub fn random_action<E: Environment + ?Sized>(env: &E) -> Vec<SpaceItem> {
    env.action_space().sample(&mut rand::thread_rng())
}
