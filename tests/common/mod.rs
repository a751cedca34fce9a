use base64::prelude::*;
use enginerl::*;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::cell::Cell;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;

/// In-process environment that ends its episode after a fixed number of steps.
#[allow(dead_code)]
pub struct ScriptedEnv {
    act_space: Space,
    obs_space: Space,
    episode_len: usize,
    fail_at_step: Option<usize>,
    steps: Rc<Cell<usize>>,
    closes: Rc<Cell<usize>>,
    done: bool,
}

#[allow(dead_code)]
impl ScriptedEnv {
    pub fn new(episode_len: usize) -> Self {
        Self {
            act_space: Space::MultiDiscrete { options: vec![3, 2] },
            obs_space: Space::Discrete { n: 10 },
            episode_len,
            fail_at_step: None,
            steps: Rc::default(),
            closes: Rc::default(),
            done: false,
        }
    }

    pub fn failing_at(mut self, step: usize) -> Self {
        self.fail_at_step = Some(step);
        self
    }

    pub fn steps(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.steps)
    }

    pub fn closes(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.closes)
    }
}

impl Environment for ScriptedEnv {
    fn action_space(&self) -> &Space {
        &self.act_space
    }

    fn observation_space(&self) -> &Space {
        &self.obs_space
    }

    fn reset(&mut self) -> Result<Vec<SpaceItem>> {
        self.steps.set(0);
        self.done = self.episode_len == 0;
        Ok(vec![SpaceItem::Discrete(0)])
    }

    fn step(&mut self, action: &[SpaceItem]) -> Result<StepInfo> {
        self.act_space.validate(action)?;
        let n = self.steps.get() + 1;
        if Some(n) == self.fail_at_step {
            return Err(Error::Protocol("engine went away".into()));
        }
        self.steps.set(n);
        self.done = n >= self.episode_len;

        Ok(StepInfo {
            observation: vec![SpaceItem::Discrete(n as i64 % 10)],
            reward: 0.,
            done: self.done,
            info: Value::Null,
        })
    }

    fn game_over(&self) -> bool {
        self.done
    }

    fn close(&mut self) -> Result<()> {
        self.closes.set(self.closes.get() + 1);
        Ok(())
    }
}

/// Answers the engine's control endpoints on an ephemeral port. Episodes end after `episode_len` steps.
#[allow(dead_code)]
pub struct MockEngine {
    pub port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockEngine {
    pub fn start(act_space: Value, obs_space: Value, episode_len: usize) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        thread::spawn(move || {
            let mut steps = 0;
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let Some((method, path, body)) = read_request(&stream) else {
                    continue;
                };
                log.lock().unwrap().push(format!("{method} {path}"));

                let reply = match (method.as_str(), path.as_str()) {
                    ("GET", "/v1/") => Some(json!({"name": "ActionRPG"})),
                    ("GET", "/v1/action_space/") => Some(json!({ "info": act_space.clone() })),
                    ("GET", "/v1/observation_space/") => Some(json!({ "info": obs_space.clone() })),
                    ("POST", "/v1/reset/") => {
                        steps = 0;
                        Some(json!({ "observation": binary_observation(&[0.5, -0.5]) }))
                    }
                    ("POST", "/v1/step/") => {
                        let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
                        if body["action"].is_array() {
                            steps += 1;
                            let progress = steps as f64 / 100.;
                            let done = steps >= episode_len;
                            Some(json!({
                                "observation": [0.25, progress],
                                "reward": 1.0,
                                "done": done,
                                "info": {"step": steps},
                            }))
                        } else {
                            None
                        }
                    }
                    ("POST", "/v1/close/") => Some(json!({})),
                    _ => None,
                };
                write_response(stream, reply);
            }
        });

        Self { port, requests }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, request: &str) -> usize {
        self.requests().iter().filter(|r| *r == request).count()
    }
}

fn read_request(stream: &TcpStream) -> Option<(String, String, String)> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some((method, path, String::from_utf8_lossy(&body).into_owned()))
}

fn write_response(mut stream: TcpStream, reply: Option<Value>) {
    let (status, body) = match reply {
        Some(v) => ("200 OK", v.to_string()),
        None => ("404 Not Found", String::new()),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn binary_observation(vals: &[f32]) -> Value {
    let bytes: Vec<u8> = vals.iter().flat_map(|x| x.to_le_bytes()).collect();
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(&bytes).unwrap();
    json!({
        "dtype": "float32",
        "data": BASE64_STANDARD.encode(enc.finish().unwrap()),
    })
}

/// A port nothing listens on.
#[allow(dead_code)]
pub fn unused_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
    listener.local_addr().unwrap().port()
}
