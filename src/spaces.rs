use crate::error::{Error, Result};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

pub type Discrete = i64;
pub type Continuous = f32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SpaceItem {
    Discrete(Discrete),
    Continuous(Continuous),
}

impl SpaceItem {
    pub fn discrete_value(&self) -> Option<Discrete> {
        if let Self::Discrete(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    pub fn continuous_value(&self) -> Option<Continuous> {
        if let Self::Continuous(x) = self {
            Some(*x)
        } else {
            None
        }
    }
}

/// Description of the actions an agent may take, or of the observations it receives.
/// Actions and observations are always flat: a `Tuple` contributes its sub-spaces' items in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Space {
    /// `n` choices, `0..n`.
    Discrete { n: Discrete },

    /// One independent discrete choice per entry, entry `i` ranging over `0..options[i]`.
    MultiDiscrete { options: Vec<Discrete> },

    /// Continuous values in `[low, high]` laid out in `shape`.
    Box {
        low: Continuous,
        high: Continuous,
        shape: Vec<usize>,
    },

    Tuple { spaces: Vec<Space> },
}

impl Space {
    /// Parses the engine's description format, e.g. `{"Discrete":4}`, `{"MultiDiscrete":[3,3]}`,
    /// `{"Box":[-1.0,1.0,2,3]}` or `{"Tuple":[{"Discrete":2},{"Box":[0.0,1.0,4]}]}`.
    pub fn from_json(info: &Value) -> Result<Self> {
        let obj = info
            .as_object()
            .ok_or_else(|| Error::Protocol(format!("space is not an object: {info}")))?;
        let mut entries = obj.iter();
        let (kind, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(Error::Protocol(format!(
                    "space must have exactly one kind: {info}"
                )))
            }
        };

        match kind.as_str() {
            "Discrete" => {
                let n = as_count(body)?;
                Ok(Space::Discrete { n })
            }
            "MultiDiscrete" => {
                let options = as_array(body)?
                    .iter()
                    .map(as_count)
                    .collect::<Result<Vec<_>>>()?;
                if options.is_empty() {
                    return Err(Error::Protocol("MultiDiscrete without options".into()));
                }
                Ok(Space::MultiDiscrete { options })
            }
            "Box" => {
                let vals = as_array(body)?;
                if vals.len() < 3 {
                    return Err(Error::Protocol(format!(
                        "Box needs low, high and at least one dimension: {body}"
                    )));
                }
                let low = as_continuous(&vals[0])?;
                let high = as_continuous(&vals[1])?;
                if low > high {
                    return Err(Error::Protocol(format!(
                        "Box low {low} is above high {high}"
                    )));
                }
                let shape = vals[2..]
                    .iter()
                    .map(|v| as_count(v).map(|n| n as usize))
                    .collect::<Result<Vec<_>>>()?;
                let space = Space::Box { low, high, shape };
                space.checked_num()?;
                Ok(space)
            }
            "Tuple" => {
                let spaces = as_array(body)?
                    .iter()
                    .map(Space::from_json)
                    .collect::<Result<Vec<_>>>()?;
                let space = Space::Tuple { spaces };
                space.checked_num()?;
                Ok(space)
            }
            e => Err(Error::Protocol(format!("unrecognized space kind: {e}"))),
        }
    }

    /// Number of flat items an action or observation of this space has.
    pub fn num(&self) -> usize {
        match self {
            Space::Discrete { .. } => 1,
            Space::MultiDiscrete { options } => options.len(),
            Space::Box { shape, .. } => shape.iter().product(),
            Space::Tuple { spaces } => spaces.iter().map(Space::num).sum(),
        }
    }

    fn checked_num(&self) -> Result<usize> {
        let num = match self {
            Space::Discrete { .. } => Some(1),
            Space::MultiDiscrete { options } => Some(options.len()),
            Space::Box { shape, .. } => shape
                .iter()
                .try_fold(1usize, |acc, &d| acc.checked_mul(d)),
            Space::Tuple { spaces } => spaces.iter().try_fold(0usize, |acc, space| {
                space.checked_num().ok().and_then(|n| acc.checked_add(n))
            }),
        };
        num.ok_or_else(|| Error::Protocol(format!("space is too large: {self:?}")))
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<SpaceItem> {
        let mut ret = Vec::with_capacity(self.num());
        self.sample_into(rng, &mut ret);
        ret
    }

    fn sample_into<R: Rng>(&self, rng: &mut R, out: &mut Vec<SpaceItem>) {
        match self {
            Space::Discrete { n } => out.push(SpaceItem::Discrete(rng.gen_range(0..*n))),
            Space::MultiDiscrete { options } => {
                out.extend(
                    options
                        .iter()
                        .map(|&o| SpaceItem::Discrete(rng.gen_range(0..o))),
                );
            }
            Space::Box { low, high, shape } => {
                let count: usize = shape.iter().product();
                out.extend(
                    (0..count).map(|_| SpaceItem::Continuous(sample_between(rng, *low, *high))),
                );
            }
            Space::Tuple { spaces } => {
                for space in spaces {
                    space.sample_into(rng, out);
                }
            }
        }
    }

    /// Checks that `items` is a well formed flat action for this space.
    pub fn validate(&self, items: &[SpaceItem]) -> Result<()> {
        if items.len() != self.num() {
            return Err(Error::InvalidAction(format!(
                "expected {} items, got {}",
                self.num(),
                items.len()
            )));
        }
        self.validate_flat(items)
    }

    fn validate_flat(&self, items: &[SpaceItem]) -> Result<()> {
        match self {
            Space::Discrete { n } => check_discrete(&items[0], *n),
            Space::MultiDiscrete { options } => options
                .iter()
                .zip(items)
                .try_for_each(|(&o, item)| check_discrete(item, o)),
            Space::Box { .. } => items.iter().try_for_each(|item| match item {
                SpaceItem::Continuous(x) if x.is_finite() => Ok(()),
                SpaceItem::Continuous(x) => {
                    Err(Error::InvalidAction(format!("non-finite Box value {x}")))
                }
                SpaceItem::Discrete(_) => Err(Error::InvalidAction(
                    "Box values must be continuous".into(),
                )),
            }),
            Space::Tuple { spaces } => {
                let mut rest = items;
                for space in spaces {
                    let (head, tail) = rest.split_at(space.num());
                    space.validate_flat(head)?;
                    rest = tail;
                }
                Ok(())
            }
        }
    }

    /// Converts a flat list of numbers into items of this space.
    pub fn items_from_json(&self, vals: &[Value]) -> Result<Vec<SpaceItem>> {
        if vals.len() != self.num() {
            return Err(Error::Protocol(format!(
                "expected {} observation values, got {}",
                self.num(),
                vals.len()
            )));
        }
        let mut ret = Vec::with_capacity(vals.len());
        self.items_into(vals, &mut ret)?;
        Ok(ret)
    }

    fn items_into(&self, vals: &[Value], out: &mut Vec<SpaceItem>) -> Result<()> {
        match self {
            Space::Discrete { .. } | Space::MultiDiscrete { .. } => {
                for v in vals {
                    out.push(SpaceItem::Discrete(as_integral(v)?));
                }
            }
            Space::Box { .. } => {
                for v in vals {
                    out.push(SpaceItem::Continuous(as_continuous(v)?));
                }
            }
            Space::Tuple { spaces } => {
                let mut rest = vals;
                for space in spaces {
                    let (head, tail) = rest.split_at(space.num());
                    space.items_into(head, out)?;
                    rest = tail;
                }
            }
        }
        Ok(())
    }
}

fn check_discrete(item: &SpaceItem, n: Discrete) -> Result<()> {
    match item {
        SpaceItem::Discrete(k) if (0..n).contains(k) => Ok(()),
        SpaceItem::Discrete(k) => Err(Error::InvalidAction(format!(
            "discrete value {k} outside 0..{n}"
        ))),
        SpaceItem::Continuous(_) => Err(Error::InvalidAction(
            "discrete values must be integers".into(),
        )),
    }
}

/// Uniform in `[low, high]`, finite for any finite bounds.
fn sample_between<R: Rng>(rng: &mut R, low: Continuous, high: Continuous) -> Continuous {
    let u: Continuous = rng.gen();
    (low * (1. - u) + high * u).clamp(low, high)
}

/// Integers, or floats without a fractional part.
fn as_integral(val: &Value) -> Result<Discrete> {
    if let Some(n) = val.as_i64() {
        return Ok(n);
    }
    match val.as_f64() {
        Some(x) if x.fract() == 0. && x >= i64::MIN as f64 && x < i64::MAX as f64 => {
            Ok(x as Discrete)
        }
        _ => Err(Error::Protocol(format!("not an integer: {val}"))),
    }
}

fn as_array(val: &Value) -> Result<&Vec<Value>> {
    val.as_array()
        .ok_or_else(|| Error::Protocol(format!("expected an array: {val}")))
}

fn as_count(val: &Value) -> Result<Discrete> {
    match val.as_i64() {
        Some(n) if n > 0 => Ok(n),
        _ => Err(Error::Protocol(format!("expected a positive count: {val}"))),
    }
}

fn as_continuous(val: &Value) -> Result<Continuous> {
    val.as_f64()
        .map(|x| x as Continuous)
        .ok_or_else(|| Error::Protocol(format!("expected a number: {val}")))
}
