use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use config as cfg;
use serde::{Deserialize, Serialize};

use crate::topology::{Field, FieldValue, PoolTopology, RaidParity};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    pub pools: BTreeMap<String, DesiredPool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ensure::Present => f.write_str("present"),
            Ensure::Absent => f.write_str("absent"),
        }
    }
}

/// Desired state of one pool. Unset fields are not managed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DesiredPool {
    #[serde(skip)]
    pub name: String,
    pub ensure: Ensure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raidz: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raid_parity: Option<RaidParity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spare: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ashift: Option<u8>,
}

impl DesiredPool {
    /// Topology handed to the vdev compiler on creation.
    pub fn topology(&self) -> PoolTopology {
        PoolTopology {
            name: self.name.clone(),
            disks: self.disk.clone().unwrap_or_default(),
            mirrors: self.mirror.clone().unwrap_or_default(),
            raidz: self.raidz.clone().unwrap_or_default(),
            raid_parity: self.raid_parity,
            logs: self.log.clone().unwrap_or_default(),
            spares: self.spare.clone().unwrap_or_default(),
        }
    }

    pub fn field(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Disk => self.disk.clone().map(FieldValue::Groups),
            Field::Mirror => self.mirror.clone().map(FieldValue::Groups),
            Field::Raidz => self.raidz.clone().map(FieldValue::Groups),
            Field::Log => self.log.clone().map(FieldValue::Devices),
            Field::Spare => self.spare.clone().map(FieldValue::Devices),
        }
    }

    /// Structural fields compared against an existing pool: the one vdev
    /// type creation uses, then log and spare when set.
    pub fn managed_fields(&self) -> Vec<Field> {
        self.vdev_types()
            .into_iter()
            .take(1)
            .chain([Field::Log, Field::Spare])
            .filter(|f| self.field(*f).is_some())
            .collect()
    }

    fn vdev_types(&self) -> Vec<Field> {
        [
            (Field::Disk, &self.disk),
            (Field::Mirror, &self.mirror),
            (Field::Raidz, &self.raidz),
        ]
        .into_iter()
        .filter_map(|(f, g)| g.as_ref().is_some_and(|g| !g.is_empty()).then_some(f))
        .collect()
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw: RawConfig = cfg::Config::builder()
            .add_source(cfg::File::from(path))
            .build()
            .with_context(|| format!("load {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("deserialize {}", path.display()))?;

        let mut pools = BTreeMap::new();
        for (raw_name, raw_pool) in raw.pools {
            let name = raw_name.trim().to_string();
            if !Self::valid_pool_name(&name) {
                bail!(
                    "bad pool name '{}': start with a letter, use [A-Za-z0-9_.:-], \
                     and avoid the reserved vdev keywords",
                    name
                );
            }
            let pool = Self::build_pool(&name, raw_pool)?;
            if pools.insert(name.clone(), pool).is_some() {
                bail!("duplicate pool entry '{}'", name);
            }
        }
        if pools.is_empty() {
            bail!("define at least one pool under [pools.<name>]");
        }
        Ok(Self { pools })
    }

    pub fn pool(&self, name: &str) -> Result<&DesiredPool> {
        self.pools.get(name).ok_or_else(|| {
            anyhow!(
                "unknown pool '{}'; configured: {}",
                name,
                self.pools.keys().cloned().collect::<Vec<_>>().join("|")
            )
        })
    }

    /// Pools selected on the command line, or all of them.
    pub fn select(&self, name: Option<&str>) -> Result<Vec<&DesiredPool>> {
        match name {
            Some(n) => Ok(vec![self.pool(n)?]),
            None => Ok(self.pools.values().collect()),
        }
    }

    fn build_pool(name: &str, raw: RawPool) -> Result<DesiredPool> {
        let ctx = format!("[pools.{name}]");
        let ensure = match raw.ensure.as_deref().map(str::trim) {
            None | Some("present") => Ensure::Present,
            Some("absent") => Ensure::Absent,
            Some(other) => bail!("{ctx} ensure must be present|absent, got '{other}'"),
        };
        let raid_parity = match raw.raid_parity.as_deref().map(str::trim) {
            None => None,
            Some("raidz1" | "single") => Some(RaidParity::Single),
            Some("raidz2" | "double") => Some(RaidParity::Double),
            Some(other) => bail!("{ctx} raid_parity must be raidz1|raidz2, got '{other}'"),
        };

        let pool = DesiredPool {
            name: name.to_string(),
            ensure,
            disk: normalize_groups(&ctx, "disk", raw.disk)?,
            mirror: normalize_groups(&ctx, "mirror", raw.mirror)?,
            raidz: normalize_groups(&ctx, "raidz", raw.raidz)?,
            raid_parity,
            log: normalize_devices(&ctx, "log", raw.log)?,
            spare: normalize_devices(&ctx, "spare", raw.spare)?,
            ashift: raw.ashift,
        };

        // plain disks come back from zpool status as a single group
        if let Some(disk) = &pool.disk
            && disk.len() > 1
        {
            bail!("{ctx} disk takes a single group, e.g. disk = [[\"/dev/sda\", \"/dev/sdb\"]]");
        }
        if pool.raid_parity.is_some() && pool.raidz.is_none() {
            bail!("{ctx} raid_parity requires raidz");
        }
        if let Some(a) = pool.ashift
            && !(9..=16).contains(&a)
        {
            bail!("{ctx} ashift must be within 9..=16, got {a}");
        }
        ensure_unique_devices(&ctx, &pool)?;

        let types = pool.vdev_types();
        match types.as_slice() {
            [] if pool.ensure == Ensure::Present => {
                bail!("{ctx} ensure = \"present\" needs one of disk, mirror or raidz")
            }
            [] | [_] => {}
            several => {
                let names: Vec<&str> = several.iter().map(|f| f.as_str()).collect();
                bail!("{ctx} a pool uses one vdev type, got {}", names.join(", "));
            }
        }
        Ok(pool)
    }

    fn valid_pool_name(name: &str) -> bool {
        const RESERVED: &[&str] = &["mirror", "raidz", "draid", "spare"];
        let Some(first) = name.chars().next() else {
            return false;
        };
        first.is_ascii_alphabetic()
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':'))
            && name != "log"
            && !RESERVED.iter().any(|r| name.starts_with(r))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn normalize_devices(ctx: &str, key: &str, raw: Option<Vec<String>>) -> Result<Option<Vec<String>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.is_empty() {
        bail!("{ctx} {key} must not be empty");
    }
    let mut out = Vec::with_capacity(raw.len());
    for d in raw {
        let d = d.trim();
        if d.is_empty() || d.contains(char::is_whitespace) {
            bail!("{ctx} {key} has a blank or space-separated device entry '{d}'");
        }
        out.push(d.to_string());
    }
    Ok(Some(out))
}

fn normalize_groups(
    ctx: &str,
    key: &str,
    raw: Option<Vec<Vec<String>>>,
) -> Result<Option<Vec<Vec<String>>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.is_empty() {
        bail!("{ctx} {key} must not be empty");
    }
    let mut out = Vec::with_capacity(raw.len());
    for (i, g) in raw.into_iter().enumerate() {
        let group = normalize_devices(ctx, &format!("{key}[{i}]"), Some(g))?.unwrap_or_default();
        out.push(group);
    }
    Ok(Some(out))
}

fn ensure_unique_devices(ctx: &str, pool: &DesiredPool) -> Result<()> {
    let mut seen: HashMap<&str, Field> = HashMap::new();
    let groups = [
        (Field::Disk, &pool.disk),
        (Field::Mirror, &pool.mirror),
        (Field::Raidz, &pool.raidz),
    ];
    let flat = [(Field::Log, &pool.log), (Field::Spare, &pool.spare)];

    let all = groups
        .iter()
        .flat_map(|(f, g)| g.iter().flatten().flatten().map(move |d| (*f, d)))
        .chain(
            flat.iter()
                .flat_map(|(f, g)| g.iter().flatten().map(move |d| (*f, d))),
        );
    for (field, dev) in all {
        if let Some(prev) = seen.insert(dev.as_str(), field) {
            bail!("{ctx} device '{dev}' listed twice (in {prev} and {field})");
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    pools: BTreeMap<String, RawPool>,
}

#[derive(Debug, Deserialize)]
struct RawPool {
    ensure: Option<String>,
    disk: Option<Vec<Vec<String>>>,
    mirror: Option<Vec<Vec<String>>>,
    raidz: Option<Vec<Vec<String>>>,
    raid_parity: Option<String>,
    log: Option<Vec<String>>,
    spare: Option<Vec<String>>,
    ashift: Option<u8>,
}
