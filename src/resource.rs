use std::{fmt, sync::Arc};

use anyhow::{Context, Result};
use tracing as log;

use crate::{
    config::{DesiredPool, Ensure},
    tooling::ZpoolPort,
    topology::{Field, FieldValue, PoolState, compile_vdevs, parse_status_tokens},
};

/// The one pool property that may change after creation.
pub const TUNABLE: &str = "ashift";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("zpool {field} can't be changed: should be {requested}, currently is {current}")]
pub struct ImmutableFieldError {
    pub field: Field,
    pub requested: FieldValue,
    pub current: FieldValue,
}

/// Fails unless `requested` matches what the pool already has.
pub fn assert_unchanged(
    field: Field,
    requested: &FieldValue,
    current: &FieldValue,
) -> Result<(), ImmutableFieldError> {
    if requested == current {
        return Ok(());
    }
    Err(ImmutableFieldError {
        field,
        requested: requested.clone(),
        current: current.clone(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create { pool: String, vdevs: Vec<String> },
    Destroy { pool: String },
    SetTunable {
        pool: String,
        from: Option<String>,
        to: String,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create { pool, vdevs } => {
                write!(f, "zpool create {pool} {}", vdevs.join(" "))
            }
            Action::Destroy { pool } => write!(f, "zpool destroy {pool}"),
            Action::SetTunable { pool, from, to } => {
                let from = from.as_deref().unwrap_or("<default>");
                write!(f, "zpool set {TUNABLE}={to} {pool} (was {from})")
            }
        }
    }
}

/// Converges one pool towards its desired state.
///
/// Inspection results are memoized for the lifetime of the resource and
/// dropped after every mutating call.
pub struct PoolResource<'a> {
    desired: &'a DesiredPool,
    zpool: Arc<dyn ZpoolPort>,
    cache: Option<PoolState>,
}

impl<'a> PoolResource<'a> {
    pub fn new(desired: &'a DesiredPool, zpool: Arc<dyn ZpoolPort>) -> Self {
        Self {
            desired,
            zpool,
            cache: None,
        }
    }

    #[inline]
    fn name(&self) -> &str {
        &self.desired.name
    }

    pub fn inspect(&mut self) -> Result<&PoolState> {
        let state = match self.cache.take() {
            Some(st) => st,
            None => inspect_pool(self.zpool.as_ref(), self.name())?,
        };
        Ok(self.cache.insert(state))
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn exists(&mut self) -> Result<bool> {
        Ok(self.inspect()?.exists())
    }

    pub fn get(&mut self, field: Field) -> Result<FieldValue> {
        Ok(self.inspect()?.field(field))
    }

    /// Structural fields are fixed at creation; only a no-op "change" passes.
    pub fn set(&mut self, field: Field, should: &FieldValue) -> Result<()> {
        let current = self.get(field)?;
        assert_unchanged(field, should, &current)?;
        Ok(())
    }

    pub fn tunable(&self) -> Result<String> {
        self.zpool.get_property(self.name(), TUNABLE)
    }

    pub fn set_tunable(&mut self, value: &str) -> Result<()> {
        let res = self.zpool.set_property(self.name(), TUNABLE, value);
        self.invalidate();
        res
    }

    pub fn create(&mut self) -> Result<()> {
        let vdevs = compile_vdevs(&self.desired.topology());
        let res = self.zpool.create(self.name(), &vdevs);
        self.invalidate();
        res
    }

    pub fn destroy(&mut self) -> Result<()> {
        let res = self.zpool.destroy(self.name());
        self.invalidate();
        res
    }

    /// Works out what `apply` would do without changing anything.
    pub fn plan(&mut self) -> Result<Vec<Action>> {
        let pool = self.name().to_string();
        let exists = self.exists()?;
        let mut actions = Vec::new();

        match (self.desired.ensure, exists) {
            (Ensure::Absent, false) => {}
            (Ensure::Absent, true) => actions.push(Action::Destroy { pool }),
            (Ensure::Present, false) => {
                actions.push(Action::Create {
                    pool: pool.clone(),
                    vdevs: compile_vdevs(&self.desired.topology()),
                });
                if let Some(a) = self.desired.ashift {
                    actions.push(Action::SetTunable {
                        pool,
                        from: None,
                        to: a.to_string(),
                    });
                }
            }
            (Ensure::Present, true) => {
                for field in self.desired.managed_fields() {
                    if let Some(should) = self.desired.field(field) {
                        self.set(field, &should)
                            .with_context(|| format!("pool {pool}"))?;
                    }
                }
                self.warn_parity_drift()?;
                if let Some(a) = self.desired.ashift {
                    let current = self.tunable()?;
                    let to = a.to_string();
                    if current != to {
                        actions.push(Action::SetTunable {
                            pool,
                            from: Some(current),
                            to,
                        });
                    }
                }
            }
        }
        Ok(actions)
    }

    pub fn apply(&mut self) -> Result<Vec<Action>> {
        let actions = self.plan()?;
        if actions.is_empty() {
            log::info!("[apply] {}: in sync", self.name());
            return Ok(actions);
        }
        for action in &actions {
            log::info!("[apply] {}: {action}", self.name());
            match action {
                Action::Create { .. } => self.create()?,
                Action::Destroy { .. } => self.destroy()?,
                Action::SetTunable { to, .. } => self.set_tunable(to)?,
            }
        }
        Ok(actions)
    }

    fn warn_parity_drift(&mut self) -> Result<()> {
        let Some(want) = self.desired.raid_parity else {
            return Ok(());
        };
        let name = self.name().to_string();
        if let Some(topo) = self.inspect()?.topology()
            && !topo.raidz.is_empty()
            && topo.raid_parity != Some(want)
        {
            log::warn!(
                "[apply] {name}: raid_parity is {}, config asks for {want}; parity cannot change",
                topo.effective_parity()
            );
        }
        Ok(())
    }
}

/// Fresh, uncached inspection of one pool.
pub fn inspect_pool(zpool: &dyn ZpoolPort, name: &str) -> Result<PoolState> {
    let tokens = zpool.status_tokens(name)?;
    log::debug!("[zpool] {name}: {} status tokens", tokens.len());
    parse_status_tokens(name, &tokens).with_context(|| format!("parse zpool status of {name}"))
}
