use crate::client::Client;
use crate::common::utils::deserialize_binary_stream;
use crate::engine::{EngineLocator, EngineProcess};
use crate::error::{Error, Result};
use crate::params::LaunchParams;
use crate::spaces::{Space, SpaceItem};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct StepInfo {
    pub observation: Vec<SpaceItem>,
    pub reward: f32,
    pub done: bool,
    pub info: Value,
}

/// What an agent can do with an environment: `reset`, then `step` until `game_over`, then `close`.
pub trait Environment {
    /// All valid actions are contained in this space. A `Discrete { n: 2 }` action space means the
    /// valid actions are `0` and `1`.
    fn action_space(&self) -> &Space;

    fn observation_space(&self) -> &Space;

    fn reset(&mut self) -> Result<Vec<SpaceItem>>;

    fn step(&mut self, action: &[SpaceItem]) -> Result<StepInfo>;

    /// True once the current episode has ended.
    fn game_over(&self) -> bool;

    /// Releases the engine connection and any engine process owned by this environment.
    /// Calling it more than once is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// The engine projects that can be driven as environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    ActionRpg,
    ShooterGame,
}

impl EnvKind {
    pub const ALL: [EnvKind; 2] = [EnvKind::ActionRpg, EnvKind::ShooterGame];

    /// Project launched for this environment.
    pub fn project_name(&self) -> &'static str {
        match self {
            EnvKind::ActionRpg => "ActionRPG",
            EnvKind::ShooterGame => "ShooterGame",
        }
    }

    /// With `params` an engine instance gets launched and reached on `port`, otherwise an already
    /// running instance listening on `port` is used.
    pub fn make(
        self,
        params: Option<LaunchParams>,
        port: u16,
        locator: &EngineLocator,
    ) -> Result<RemoteEnvironment> {
        match params {
            Some(params) => RemoteEnvironment::launch(self, params, port, locator),
            None => RemoteEnvironment::connect(self, port),
        }
    }
}

impl fmt::Display for EnvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.project_name())
    }
}

impl FromStr for EnvKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EnvKind::ALL
            .into_iter()
            .find(|k| k.project_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Protocol(format!("unknown environment '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EpisodeState {
    NotReset,
    Running,
    Done,
    Closed,
}

/// An environment living in an engine instance, driven over its control port.
#[derive(Debug)]
pub struct RemoteEnvironment {
    kind: EnvKind,
    port: u16,
    client: Client,
    obs_space: Space,
    act_space: Space,
    state: EpisodeState,
    process: Option<EngineProcess>,
}

impl RemoteEnvironment {
    pub fn connect(kind: EnvKind, port: u16) -> Result<Self> {
        info!(env = %kind, port, "connecting to running engine");
        let client = Client::new(port)?;
        Self::from_client(kind, port, client, None)
    }

    pub fn launch(
        kind: EnvKind,
        params: LaunchParams,
        port: u16,
        locator: &EngineLocator,
    ) -> Result<Self> {
        let client = Client::new(port)?;
        let process = EngineProcess::launch(locator, kind.project_name(), &params, &client, port)?;
        info!(env = %kind, port, pid = process.id(), "engine launched");
        Self::from_client(kind, port, client, Some(process))
    }

    /// Attaches to an engine already answering on `port` and takes ownership of its process,
    /// which is killed on `close` or drop.
    pub fn adopt(kind: EnvKind, port: u16, process: EngineProcess) -> Result<Self> {
        info!(env = %kind, port, pid = process.id(), "adopting engine");
        let client = Client::new(port)?;
        Self::from_client(kind, port, client, Some(process))
    }

    fn from_client(
        kind: EnvKind,
        port: u16,
        client: Client,
        process: Option<EngineProcess>,
    ) -> Result<Self> {
        let obj = client.http_get("observation_space/")?;
        let obs_space = Space::from_json(field(&obj, "info")?)?;

        let obj = client.http_get("action_space/")?;
        let act_space = Space::from_json(field(&obj, "info")?)?;
        debug!(?obs_space, ?act_space, "spaces");

        Ok(Self {
            kind,
            port,
            client,
            obs_space,
            act_space,
            state: EpisodeState::NotReset,
            process,
        })
    }

    pub fn kind(&self) -> EnvKind {
        self.kind
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_base_url(&self) -> &str {
        self.client.base_url()
    }

    /// True when this environment launched, and so owns, its engine process.
    pub fn owns_engine(&self) -> bool {
        self.process.is_some()
    }

    pub fn name(&self) -> Result<String> {
        let obj = self.client.http_get("")?;
        field(&obj, "name")?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Protocol("name is not a string".into()))
    }

    fn observation_from_json(&self, obs: &Value) -> Result<Vec<SpaceItem>> {
        match obs {
            Value::Array(vals) => self.obs_space.items_from_json(vals),
            Value::Object(obj) if obj.contains_key("dtype") => {
                let dtype = field(obs, "dtype")?.as_str().unwrap_or_default();
                let data = field(obs, "data")?
                    .as_str()
                    .ok_or_else(|| Error::Decode("data is not a string".into()))?;
                let vals = deserialize_binary_stream(dtype, data)?;
                self.obs_space.items_from_json(&vals)
            }
            Value::Number(_) => self.obs_space.items_from_json(std::slice::from_ref(obs)),
            _ => Err(Error::Protocol(format!("unexpected observation {obs}"))),
        }
    }
}

impl Environment for RemoteEnvironment {
    fn action_space(&self) -> &Space {
        &self.act_space
    }

    fn observation_space(&self) -> &Space {
        &self.obs_space
    }

    fn reset(&mut self) -> Result<Vec<SpaceItem>> {
        if self.state == EpisodeState::Closed {
            return Err(Error::InvalidState("reset after close"));
        }
        let obj = self
            .client
            .http_post("reset/", &HashMap::<&str, Value>::new())?;
        let observation = self.observation_from_json(field(&obj, "observation")?)?;
        self.state = EpisodeState::Running;

        Ok(observation)
    }

    fn step(&mut self, action: &[SpaceItem]) -> Result<StepInfo> {
        match self.state {
            EpisodeState::Running => {}
            EpisodeState::NotReset => return Err(Error::InvalidState("step before reset")),
            EpisodeState::Done => return Err(Error::InvalidState("step after episode end")),
            EpisodeState::Closed => return Err(Error::InvalidState("step after close")),
        }
        self.act_space.validate(action)?;

        let req = HashMap::from([("action", action.to_vec())]);
        let obj = self.client.http_post("step/", &req)?;

        let observation = self.observation_from_json(field(&obj, "observation")?)?;
        let reward = field(&obj, "reward")?
            .as_f64()
            .ok_or_else(|| Error::Protocol("reward is not a number".into()))?
            as f32;
        let done = field(&obj, "done")?
            .as_bool()
            .ok_or_else(|| Error::Protocol("done is not a bool".into()))?;
        if done {
            self.state = EpisodeState::Done;
        }

        Ok(StepInfo {
            observation,
            reward,
            done,
            info: obj.get("info").cloned().unwrap_or(Value::Null),
        })
    }

    fn game_over(&self) -> bool {
        self.state == EpisodeState::Done
    }

    fn close(&mut self) -> Result<()> {
        if self.state == EpisodeState::Closed {
            debug!(env = %self.kind, "already closed");
            return Ok(());
        }
        self.state = EpisodeState::Closed;

        if let Err(e) = self
            .client
            .http_post("close/", &HashMap::<&str, Value>::new())
        {
            warn!(env = %self.kind, error = %e, "engine did not acknowledge close");
        }
        if let Some(mut process) = self.process.take() {
            process.terminate();
        }
        info!(env = %self.kind, "closed");

        Ok(())
    }
}

fn field<'a>(obj: &'a Value, name: &str) -> Result<&'a Value> {
    obj.get(name)
        .ok_or_else(|| Error::Protocol(format!("response has no '{name}'")))
}
