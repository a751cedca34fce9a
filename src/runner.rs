use crate::envs::Environment;
use crate::error::Result;
use crate::policy::Policy;
use std::io::Write;
use std::ops::{Deref, DerefMut};
use tracing::{debug, info, warn};

pub const COMPLETION_MESSAGE: &str = "Done";

/// Closes the wrapped environment when dropped, so release happens on every exit path.
pub struct EnvGuard<E: Environment> {
    env: E,
}

impl<E: Environment> EnvGuard<E> {
    pub fn new(env: E) -> Self {
        Self { env }
    }

    pub fn close(&mut self) -> Result<()> {
        self.env.close()
    }
}

impl<E: Environment> Deref for EnvGuard<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.env
    }
}

impl<E: Environment> DerefMut for EnvGuard<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.env
    }
}

impl<E: Environment> Drop for EnvGuard<E> {
    fn drop(&mut self) {
        if let Err(e) = self.env.close() {
            warn!(error = %e, "closing environment on drop failed");
        }
    }
}

/// Resets `env` and steps it with actions from `policy` until the game is over.
/// Returns the number of steps taken.
pub fn run_episode<E, P>(env: &mut E, policy: &mut P) -> Result<usize>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
{
    let mut s = env.reset()?;
    let mut steps = 0;
    while !env.game_over() {
        let action = policy.policy(env.action_space(), &s);
        s = env.step(&action)?.observation;
        steps += 1;
    }
    debug!(steps, "episode finished");

    Ok(steps)
}

/// Acquires an environment, plays one episode, releases the environment and reports on `out`.
/// Nothing is reported when any of these fail.
pub fn run<E, F, P, W>(acquire: F, policy: &mut P, out: &mut W) -> Result<usize>
where
    E: Environment,
    F: FnOnce() -> Result<E>,
    P: Policy + ?Sized,
    W: Write + ?Sized,
{
    let mut env = EnvGuard::new(acquire()?);
    let steps = run_episode(&mut *env, policy)?;
    // the guard would close it anyway
    env.close()?;
    info!(steps, "episode complete");

    writeln!(out, "{COMPLETION_MESSAGE}")?;
    Ok(steps)
}
